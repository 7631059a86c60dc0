// ==========================================
// Exam Planner - Domain Model Layer
// ==========================================
// Entities, enums and value objects only. No data access, no
// engine logic.
// ==========================================

pub mod conflict;
pub mod kpi;
pub mod planning;
pub mod resources;
pub mod types;

// Re-export core types
pub use conflict::{Conflict, ConflictItemRef, ConflictReport, ConflictTotals};
pub use kpi::{
    DayCount, DayFillRate, DepartmentConflicts, DepartmentLoad, KpiBase, KpiView,
    OverCapacityEntry, ProgramLoad, UnderUsedEntry, UpcomingExam,
};
pub use planning::{
    AssignedInvigilator, AssignmentItem, PlanningRun, RunMetrics, NOTE_CAPACITY_EXCEEDED,
    NOTE_INVIGILATOR_MISSING,
};
pub use resources::{
    Department, Enrollment, ExamModule, Invigilator, Program, RoleContext, Room, Slot,
};
pub use types::{
    AdminStatus, ApprovalStatus, ConflictKind, ConflictSeverity, Role, RoomKind, RunScope,
    RunStatus,
};
