// ==========================================
// Exam Planner - Engine Storage Seams
// ==========================================
// The engine talks to storage only through these two traits. Reads
// are independent of each other and safe to issue concurrently;
// writes happen once per run (create, batch insert, final update).
// ==========================================

use crate::domain::planning::{AssignmentItem, PlanningRun};
use crate::domain::resources::{Department, Enrollment, ExamModule, Invigilator, Program, Room, Slot};
use crate::repository::error::RepositoryError;
use async_trait::async_trait;

/// Read access to the pools and the academic catalog.
///
/// "Not found" collections come back empty, never as errors; only
/// transport/storage failures surface as `Err`.
#[async_trait]
pub trait ReferenceReader: Send + Sync {
    async fn fetch_rooms(&self) -> Result<Vec<Room>, RepositoryError>;
    async fn fetch_slots(&self) -> Result<Vec<Slot>, RepositoryError>;
    async fn fetch_invigilators(&self) -> Result<Vec<Invigilator>, RepositoryError>;
    async fn fetch_departments(&self) -> Result<Vec<Department>, RepositoryError>;
    async fn fetch_programs(&self) -> Result<Vec<Program>, RepositoryError>;
    async fn fetch_modules(&self) -> Result<Vec<ExamModule>, RepositoryError>;
    async fn fetch_enrollments(&self) -> Result<Vec<Enrollment>, RepositoryError>;
}

/// Write access for a generation run.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Persists the fresh `RUNNING` row before generation starts.
    async fn create_run(&self, run: &PlanningRun) -> Result<(), RepositoryError>;

    /// Rewrites the run row (status, metrics, workflow fields).
    async fn update_run(&self, run: &PlanningRun) -> Result<(), RepositoryError>;

    /// Inserts the whole item batch atomically.
    async fn insert_items(&self, items: &[AssignmentItem]) -> Result<(), RepositoryError>;
}
