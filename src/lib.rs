// ==========================================
// Exam Planner - Core Library
// ==========================================
// Exam session planning: generation engine, approval workflow,
// KPI dashboards and reference-data management over SQLite.
// ==========================================

// i18n initialization
rust_i18n::i18n!("locales", fallback = "fr");

// ==========================================
// Module declarations
// ==========================================

// Domain layer: entities and types
pub mod domain;

// Repository layer: data access
pub mod repository;

// Engine layer: planning rules
pub mod engine;

// Import layer: external data
pub mod importer;

// Configuration layer
pub mod config;

// Database infrastructure (connection setup, PRAGMAs)
pub mod db;

// Logging
pub mod logging;

// Internationalization
pub mod i18n;

// API layer
pub mod api;

// Application layer: wiring for the binaries
pub mod app;

// ==========================================
// Re-exports
// ==========================================

// Domain types
pub use domain::types::{
    AdminStatus, ApprovalStatus, ConflictKind, ConflictSeverity, Role, RoomKind, RunScope,
    RunStatus,
};

// Domain entities
pub use domain::planning::{AssignmentItem, PlanningRun, RunMetrics};
pub use domain::resources::{
    Department, Enrollment, ExamModule, Invigilator, Program, RoleContext, Room, Slot,
};

// Engine
pub use engine::{
    ApprovalWorkflow, ConflictDetector, GenerationOrchestrator, GenerationRequest,
    InvigilatorAssigner, KpiBuilder, RoomSlotAllocator,
};

// API
pub use api::{ApprovalApi, ImportApi, KpiApi, PlanningApi, ReferenceApi};

// ==========================================
// Constants
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "exam-planner";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
