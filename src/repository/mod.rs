// ==========================================
// Exam Planner - Data Repository Layer
// ==========================================
// Data access only; no scheduling rules live here. All queries
// are parameterized.
// ==========================================

pub mod catalog_repo;
pub mod error;
pub mod gateway;
pub mod reference_repo;
pub mod run_repo;

pub use catalog_repo::CatalogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use gateway::{SqliteReferenceReader, SqliteRunStore};
pub use reference_repo::ReferenceRepository;
pub use run_repo::{AssignmentItemRepository, PlanningRunRepository};
