// ==========================================
// Exam Planner - Engine Error Types
// ==========================================
// Allocation and assignment are best-effort: soft gaps become
// annotations, never errors. Only the two pool preconditions and
// upstream fetch failures abort a run.
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// Engine-level failures. Any of these aborts the run before
/// persistence; no partial item batch is ever written.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("no room available for allocation")]
    EmptyRoomPool,

    #[error("no slot available in the requested window")]
    EmptySlotPool,

    #[error("invalid planning window: {0}")]
    InvalidWindow(String),

    #[error("reference data fetch failed: {0}")]
    Fetch(#[from] RepositoryError),
}

/// Result alias
pub type EngineResult<T> = Result<T, EngineError>;

/// Guard violations in the submit → decide → publish chain. These
/// map to client errors at the boundary, never to aborts.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("run is not finished")]
    NotDone,

    #[error("run already submitted and awaiting decision")]
    AlreadySubmitted,

    #[error("run is not awaiting a decision")]
    NotAwaitingDecision,

    #[error("rejection reason is required")]
    MissingReason,

    #[error("run is not approved for publication")]
    NotApproved,
}
