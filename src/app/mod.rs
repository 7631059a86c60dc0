// ==========================================
// Exam Planner - Application Layer
// ==========================================
// Wires repositories and API facades for the binaries.
// ==========================================

pub mod state;

// Re-exports
pub use state::{get_default_db_path, AppState};
