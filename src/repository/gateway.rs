// ==========================================
// Exam Planner - Engine Storage Gateway
// ==========================================
// Async adapters between the engine traits and the SQLite
// repositories. Reads return empty collections when a table has
// no rows; only real database faults surface as errors.
// ==========================================

use crate::domain::planning::{AssignmentItem, PlanningRun};
use crate::domain::resources::{
    Department, Enrollment, ExamModule, Invigilator, Program, Room, Slot,
};
use crate::engine::reference::{ReferenceReader, RunStore};
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::reference_repo::ReferenceRepository;
use crate::repository::run_repo::{AssignmentItemRepository, PlanningRunRepository};
use async_trait::async_trait;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

// ==========================================
// SqliteReferenceReader
// ==========================================
pub struct SqliteReferenceReader {
    reference: ReferenceRepository,
    catalog: CatalogRepository,
}

impl SqliteReferenceReader {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        Ok(Self {
            reference: ReferenceRepository::from_connection(conn.clone())?,
            catalog: CatalogRepository::from_connection(conn)?,
        })
    }
}

#[async_trait]
impl ReferenceReader for SqliteReferenceReader {
    async fn fetch_rooms(&self) -> Result<Vec<Room>, RepositoryError> {
        self.reference.list_rooms()
    }

    async fn fetch_slots(&self) -> Result<Vec<Slot>, RepositoryError> {
        self.reference.list_slots()
    }

    async fn fetch_invigilators(&self) -> Result<Vec<Invigilator>, RepositoryError> {
        self.reference.list_invigilators()
    }

    async fn fetch_departments(&self) -> Result<Vec<Department>, RepositoryError> {
        self.catalog.list_departments()
    }

    async fn fetch_programs(&self) -> Result<Vec<Program>, RepositoryError> {
        self.catalog.list_programs()
    }

    async fn fetch_modules(&self) -> Result<Vec<ExamModule>, RepositoryError> {
        self.catalog.list_modules()
    }

    async fn fetch_enrollments(&self) -> Result<Vec<Enrollment>, RepositoryError> {
        self.catalog.list_enrollments()
    }
}

// ==========================================
// SqliteRunStore
// ==========================================
pub struct SqliteRunStore {
    runs: PlanningRunRepository,
    items: AssignmentItemRepository,
}

impl SqliteRunStore {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        Ok(Self {
            runs: PlanningRunRepository::from_connection(conn.clone())?,
            items: AssignmentItemRepository::from_connection(conn)?,
        })
    }
}

#[async_trait]
impl RunStore for SqliteRunStore {
    async fn create_run(&self, run: &PlanningRun) -> Result<(), RepositoryError> {
        self.runs.create(run).map(|_| ())
    }

    async fn update_run(&self, run: &PlanningRun) -> Result<(), RepositoryError> {
        self.runs.update(run)
    }

    async fn insert_items(&self, items: &[AssignmentItem]) -> Result<(), RepositoryError> {
        self.items.batch_insert(items).map(|_| ())
    }
}
