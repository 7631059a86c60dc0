// ==========================================
// Exam Planner - API Layer
// ==========================================
// Facade the outer surfaces call: generation, approval workflow,
// published planning, KPIs, reference data and imports.
// ==========================================

pub mod error;
pub mod planning_api;
pub mod approval_api;
pub mod kpi_api;
pub mod reference_api;
pub mod import_api;

// Re-exports
pub use error::{ApiError, ApiResult};
pub use planning_api::{PlanningApi, PublishedPlanning};
pub use approval_api::{ApprovalApi, DeanRunFilter};
pub use kpi_api::KpiApi;
pub use reference_api::ReferenceApi;
pub use import_api::{ImportApi, ImportKind};
