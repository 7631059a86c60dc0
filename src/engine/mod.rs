// ==========================================
// Exam Planner - Engine Layer
// ==========================================
// Pure scheduling logic: placement, invigilation, conflict
// detection, KPIs, approval workflow. No SQL lives here; the
// orchestrator talks to storage through the reader/store traits.
// ==========================================

pub mod allocator;
pub mod conflict;
pub mod demand;
pub mod error;
pub mod invigilation;
pub mod kpi;
pub mod orchestrator;
pub mod reference;
pub mod workflow;

pub use allocator::{resolve_window, slots_within, PlacementResult, RoomSlotAllocator};
pub use conflict::ConflictDetector;
pub use demand::DemandLoader;
pub use error::{EngineError, EngineResult, WorkflowError};
pub use invigilation::InvigilatorAssigner;
pub use kpi::KpiBuilder;
pub use orchestrator::{
    GenerationOrchestrator, GenerationOutcome, GenerationRequest,
};
pub use reference::{ReferenceReader, RunStore};
pub use workflow::ApprovalWorkflow;
