// ==========================================
// Exam Planner - Planning Config Reader Trait
// ==========================================
// Read-only view of the tuning knobs the generation and KPI
// layers consume. No writes, no business logic.
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// PlanningConfigReader Trait
// ==========================================
// Implemented by ConfigManager (reads the config_kv table).
#[async_trait]
pub trait PlanningConfigReader: Send + Sync {
    /// Invigilators wanted per exam.
    ///
    /// # Default
    /// - 1
    async fn get_invigilators_per_exam(&self) -> Result<u32, Box<dyn Error>>;

    /// Duty cap per invigilator per calendar day.
    ///
    /// # Default
    /// - 3
    async fn get_invigilator_max_per_day(&self) -> Result<u32, Box<dyn Error>>;

    /// Planning window length in days when no end date is given.
    ///
    /// # Default
    /// - 7
    async fn get_default_window_days(&self) -> Result<i64, Box<dyn Error>>;

    /// Row cap for the top-N KPI lists.
    ///
    /// # Default
    /// - 5
    async fn get_kpi_top_n(&self) -> Result<usize, Box<dyn Error>>;

    /// Row cap for the upcoming-exams projection.
    ///
    /// # Default
    /// - 5
    async fn get_kpi_upcoming_limit(&self) -> Result<usize, Box<dyn Error>>;
}
