// ==========================================
// Exam Planner - Config Layer
// ==========================================
// Tuning knobs for generation and KPI display.
// Storage: config_kv table, global scope.
// ==========================================

pub mod config_manager;
pub mod planning_config_trait;

pub use config_manager::{config_keys, defaults, ConfigManager};
pub use planning_config_trait::PlanningConfigReader;
