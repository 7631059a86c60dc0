// ==========================================
// Exam Planner - Approval Workflow API
// ==========================================
// Admin submission, dean decision and publication. Every state
// change loads the run, lets the workflow guards rule on it, then
// persists the mutated row.
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::planning::PlanningRun;
use crate::domain::types::ApprovalStatus;
use crate::engine::workflow::ApprovalWorkflow;
use crate::repository::run_repo::PlanningRunRepository;

/// Dean-side listing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeanRunFilter {
    All,       // every run
    Submitted, // submitted and still undecided
    Pending,   // approval status PENDING, submitted or not
    Approved,
    Rejected,
}

impl DeanRunFilter {
    /// Parses the query-string filter; unknown values mean All.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(|v| v.to_lowercase()).as_deref() {
            Some("submitted") => DeanRunFilter::Submitted,
            Some("pending") => DeanRunFilter::Pending,
            Some("approved") => DeanRunFilter::Approved,
            Some("rejected") => DeanRunFilter::Rejected,
            _ => DeanRunFilter::All,
        }
    }
}

// ==========================================
// ApprovalApi
// ==========================================
pub struct ApprovalApi {
    run_repo: Arc<PlanningRunRepository>,
    workflow: ApprovalWorkflow,
}

impl ApprovalApi {
    pub fn new(run_repo: Arc<PlanningRunRepository>) -> Self {
        Self {
            run_repo,
            workflow: ApprovalWorkflow::new(),
        }
    }

    fn load_run(&self, run_id: &str) -> ApiResult<PlanningRun> {
        self.run_repo
            .find_by_id(run_id)?
            .ok_or_else(|| ApiError::NotFound("Run introuvable".to_string()))
    }

    // ==========================================
    // Admin side
    // ==========================================

    /// Hands a finished run to the dean.
    pub fn submit(&self, run_id: &str) -> ApiResult<PlanningRun> {
        let mut run = self.load_run(run_id)?;
        self.workflow.submit(&mut run, Utc::now().naive_utc())?;
        self.run_repo.update(&run)?;

        info!(run_id = %run.run_id, "run submitted for approval");
        Ok(run)
    }

    /// Publishes an approved run.
    ///
    /// # Returns
    /// - `Ok((run, true))`: newly published
    /// - `Ok((run, false))`: was already published, nothing changed
    pub fn publish(&self, run_id: &str) -> ApiResult<(PlanningRun, bool)> {
        let mut run = self.load_run(run_id)?;
        let newly_published = self.workflow.publish(&mut run, Utc::now().naive_utc())?;
        if newly_published {
            self.run_repo.update(&run)?;
            info!(run_id = %run.run_id, "run published");
        }
        Ok((run, newly_published))
    }

    // ==========================================
    // Dean side
    // ==========================================

    /// Approves a submitted run.
    pub fn approve(&self, run_id: &str, dean_id: &str) -> ApiResult<PlanningRun> {
        if dean_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("Identifiant doyen requis".to_string()));
        }

        let mut run = self.load_run(run_id)?;
        self.workflow
            .approve(&mut run, dean_id, Utc::now().naive_utc())?;
        self.run_repo.update(&run)?;

        info!(run_id = %run.run_id, dean_id, "run approved");
        Ok(run)
    }

    /// Rejects a submitted run. The reason is mandatory.
    pub fn reject(&self, run_id: &str, dean_id: &str, reason: &str) -> ApiResult<PlanningRun> {
        if dean_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("Identifiant doyen requis".to_string()));
        }

        let mut run = self.load_run(run_id)?;
        self.workflow
            .reject(&mut run, dean_id, reason, Utc::now().naive_utc())?;
        self.run_repo.update(&run)?;

        info!(run_id = %run.run_id, dean_id, "run rejected");
        Ok(run)
    }

    /// Runs for the dean's validation screen.
    pub fn list_for_dean(&self, filter: DeanRunFilter) -> ApiResult<Vec<PlanningRun>> {
        let runs = match filter {
            DeanRunFilter::All => self.run_repo.list_all()?,
            DeanRunFilter::Submitted => self.run_repo.list_awaiting_decision()?,
            DeanRunFilter::Pending => self.run_repo.list_by_approval(ApprovalStatus::Pending)?,
            DeanRunFilter::Approved => self.run_repo.list_by_approval(ApprovalStatus::Approved)?,
            DeanRunFilter::Rejected => self.run_repo.list_by_approval(ApprovalStatus::Rejected)?,
        };
        Ok(runs)
    }
}
