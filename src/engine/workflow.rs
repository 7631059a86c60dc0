// ==========================================
// Exam Planner - Approval Workflow
// ==========================================
// Single place that owns the submit → decide → publish transitions.
// Callers never set workflow fields directly; every guard lives
// here so the same rules hold from any entry point.
// ==========================================

use crate::domain::planning::PlanningRun;
use crate::domain::types::{AdminStatus, ApprovalStatus, RunStatus};
use crate::engine::error::WorkflowError;
use chrono::NaiveDateTime;
use tracing::{info, instrument};

pub struct ApprovalWorkflow;

impl ApprovalWorkflow {
    pub fn new() -> Self {
        Self
    }

    /// Hands a finished run to the dean.
    ///
    /// Resubmitting after a rejection is allowed and wipes the
    /// previous rejection trace; submitting while a decision is
    /// already pending is not.
    #[instrument(skip(self, run), fields(run_id = %run.run_id))]
    pub fn submit(&self, run: &mut PlanningRun, now: NaiveDateTime) -> Result<(), WorkflowError> {
        if run.status != RunStatus::Done {
            return Err(WorkflowError::NotDone);
        }
        if run.is_awaiting_decision() {
            return Err(WorkflowError::AlreadySubmitted);
        }

        run.admin_status = AdminStatus::Submitted;
        run.approval_status = ApprovalStatus::Pending;
        run.submitted_at = Some(now);
        run.rejected_at = None;
        run.rejected_by = None;
        run.rejection_reason = None;

        info!("run submitted for approval");
        Ok(())
    }

    /// Dean approval. Only a submitted, still-pending run qualifies.
    #[instrument(skip(self, run), fields(run_id = %run.run_id, dean_id))]
    pub fn approve(
        &self,
        run: &mut PlanningRun,
        dean_id: &str,
        now: NaiveDateTime,
    ) -> Result<(), WorkflowError> {
        if !run.is_awaiting_decision() {
            return Err(WorkflowError::NotAwaitingDecision);
        }

        run.approval_status = ApprovalStatus::Approved;
        run.decided_at = Some(now);
        run.decided_by = Some(dean_id.to_string());
        run.rejected_at = None;
        run.rejected_by = None;
        run.rejection_reason = None;

        info!("run approved");
        Ok(())
    }

    /// Dean rejection. The reason is mandatory; whitespace does not
    /// count.
    #[instrument(skip(self, run, reason), fields(run_id = %run.run_id, dean_id))]
    pub fn reject(
        &self,
        run: &mut PlanningRun,
        dean_id: &str,
        reason: &str,
        now: NaiveDateTime,
    ) -> Result<(), WorkflowError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(WorkflowError::MissingReason);
        }
        if !run.is_awaiting_decision() {
            return Err(WorkflowError::NotAwaitingDecision);
        }

        run.approval_status = ApprovalStatus::Rejected;
        run.rejected_at = Some(now);
        run.rejected_by = Some(dean_id.to_string());
        run.rejection_reason = Some(reason.to_string());

        info!("run rejected");
        Ok(())
    }

    /// Makes an approved run visible to end users.
    ///
    /// # Returns
    /// `true` when the run was published by this call, `false` when
    /// it already was (publishing twice is a no-op, not an error).
    #[instrument(skip(self, run), fields(run_id = %run.run_id))]
    pub fn publish(&self, run: &mut PlanningRun, now: NaiveDateTime) -> Result<bool, WorkflowError> {
        if run.approval_status != ApprovalStatus::Approved {
            return Err(WorkflowError::NotApproved);
        }
        if run.published {
            return Ok(false);
        }

        run.published = true;
        run.published_at = Some(now);
        if run.ended_at.is_none() {
            run.ended_at = Some(now);
        }
        run.status = RunStatus::Done;

        info!("run published");
        Ok(true)
    }
}

impl Default for ApprovalWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// Tests
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::RunScope;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn create_done_run() -> PlanningRun {
        let mut run = PlanningRun::new_running("run-1", RunScope::Global, None, None, None, "admin");
        run.status = RunStatus::Done;
        run.ended_at = Some(now());
        run
    }

    #[test]
    fn test_submit_requires_done_run() {
        let workflow = ApprovalWorkflow::new();
        let mut run = PlanningRun::new_running("run-1", RunScope::Global, None, None, None, "admin");

        assert_eq!(workflow.submit(&mut run, now()), Err(WorkflowError::NotDone));
        assert_eq!(run.admin_status, AdminStatus::Draft);
    }

    #[test]
    fn test_submit_twice_is_rejected() {
        let workflow = ApprovalWorkflow::new();
        let mut run = create_done_run();

        workflow.submit(&mut run, now()).unwrap();
        assert_eq!(
            workflow.submit(&mut run, now()),
            Err(WorkflowError::AlreadySubmitted)
        );
    }

    #[test]
    fn test_approve_then_publish() {
        let workflow = ApprovalWorkflow::new();
        let mut run = create_done_run();

        workflow.submit(&mut run, now()).unwrap();
        workflow.approve(&mut run, "dean-1", now()).unwrap();
        assert!(run.is_approved());
        assert_eq!(run.decided_by.as_deref(), Some("dean-1"));

        assert_eq!(workflow.publish(&mut run, now()), Ok(true));
        assert!(run.published);
        assert_eq!(run.published_at, Some(now()));
    }

    #[test]
    fn test_publish_is_idempotent() {
        let workflow = ApprovalWorkflow::new();
        let mut run = create_done_run();

        workflow.submit(&mut run, now()).unwrap();
        workflow.approve(&mut run, "dean-1", now()).unwrap();
        assert_eq!(workflow.publish(&mut run, now()), Ok(true));
        assert_eq!(workflow.publish(&mut run, now()), Ok(false));
        assert!(run.published);
    }

    #[test]
    fn test_publish_requires_approval() {
        let workflow = ApprovalWorkflow::new();
        let mut run = create_done_run();

        assert_eq!(
            workflow.publish(&mut run, now()),
            Err(WorkflowError::NotApproved)
        );

        workflow.submit(&mut run, now()).unwrap();
        assert_eq!(
            workflow.publish(&mut run, now()),
            Err(WorkflowError::NotApproved)
        );
    }

    #[test]
    fn test_publish_backfills_ended_at() {
        let workflow = ApprovalWorkflow::new();
        let mut run = create_done_run();
        run.ended_at = None;

        workflow.submit(&mut run, now()).unwrap();
        workflow.approve(&mut run, "dean-1", now()).unwrap();
        workflow.publish(&mut run, now()).unwrap();

        assert_eq!(run.ended_at, Some(now()));
    }

    #[test]
    fn test_reject_requires_reason() {
        let workflow = ApprovalWorkflow::new();
        let mut run = create_done_run();
        workflow.submit(&mut run, now()).unwrap();

        assert_eq!(
            workflow.reject(&mut run, "dean-1", "   ", now()),
            Err(WorkflowError::MissingReason)
        );
        assert!(run.is_awaiting_decision());
    }

    #[test]
    fn test_reject_then_resubmit_clears_trace() {
        let workflow = ApprovalWorkflow::new();
        let mut run = create_done_run();

        workflow.submit(&mut run, now()).unwrap();
        workflow
            .reject(&mut run, "dean-1", "salles surchargées", now())
            .unwrap();
        assert_eq!(run.approval_status, ApprovalStatus::Rejected);
        assert_eq!(run.rejection_reason.as_deref(), Some("salles surchargées"));

        workflow.submit(&mut run, now()).unwrap();
        assert!(run.is_awaiting_decision());
        assert!(run.rejection_reason.is_none());
        assert!(run.rejected_at.is_none());
        assert!(run.rejected_by.is_none());
    }

    #[test]
    fn test_decide_requires_submission() {
        let workflow = ApprovalWorkflow::new();
        let mut run = create_done_run();

        assert_eq!(
            workflow.approve(&mut run, "dean-1", now()),
            Err(WorkflowError::NotAwaitingDecision)
        );
        assert_eq!(
            workflow.reject(&mut run, "dean-1", "raison", now()),
            Err(WorkflowError::NotAwaitingDecision)
        );
    }

    #[test]
    fn test_decided_run_cannot_be_decided_again() {
        let workflow = ApprovalWorkflow::new();
        let mut run = create_done_run();

        workflow.submit(&mut run, now()).unwrap();
        workflow.approve(&mut run, "dean-1", now()).unwrap();

        assert_eq!(
            workflow.approve(&mut run, "dean-2", now()),
            Err(WorkflowError::NotAwaitingDecision)
        );
        assert_eq!(
            workflow.reject(&mut run, "dean-2", "raison", now()),
            Err(WorkflowError::NotAwaitingDecision)
        );
    }
}
