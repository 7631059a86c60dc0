// ==========================================
// Approval Workflow Integration Tests
// ==========================================
// Submit / approve / reject / publish through ApprovalApi, with
// every transition re-read from storage. Runs are written directly
// through the repository so each test controls its starting state.
// ==========================================


use std::sync::Arc;

use exam_planner::api::error::ApiError;
use exam_planner::api::{ApprovalApi, DeanRunFilter};
use exam_planner::domain::planning::PlanningRun;
use exam_planner::domain::types::{AdminStatus, ApprovalStatus, RunScope, RunStatus};
use exam_planner::repository::PlanningRunRepository;

use test_helpers::{create_test_db, open_shared_connection};

fn setup() -> (tempfile::NamedTempFile, Arc<PlanningRunRepository>, ApprovalApi) {
    let (temp, db_path) = create_test_db().unwrap();
    let conn = open_shared_connection(&db_path);
    let run_repo = Arc::new(PlanningRunRepository::from_connection(conn).unwrap());
    let api = ApprovalApi::new(run_repo.clone());
    (temp, run_repo, api)
}

fn create_done_run(run_repo: &PlanningRunRepository, run_id: &str) -> PlanningRun {
    let mut run = PlanningRun::new_running(run_id, RunScope::Global, None, None, None, "admin");
    run.status = RunStatus::Done;
    run.ended_at = Some(run.started_at);
    run_repo.create(&run).unwrap();
    run
}

#[test]
fn test_full_lifecycle_submit_approve_publish() {
    let (_temp, run_repo, api) = setup();
    create_done_run(&run_repo, "RUN1");

    let submitted = api.submit("RUN1").unwrap();
    assert_eq!(submitted.admin_status, AdminStatus::Submitted);
    assert_eq!(submitted.approval_status, ApprovalStatus::Pending);
    assert!(submitted.submitted_at.is_some());

    let approved = api.approve("RUN1", "dean-1").unwrap();
    assert_eq!(approved.approval_status, ApprovalStatus::Approved);
    assert_eq!(approved.decided_by.as_deref(), Some("dean-1"));

    let (published, newly) = api.publish("RUN1").unwrap();
    assert!(newly);
    assert!(published.published);
    assert!(published.published_at.is_some());

    // the whole trace survives a reload
    let stored = run_repo.find_by_id("RUN1").unwrap().unwrap();
    assert!(stored.published);
    assert_eq!(stored.decided_by.as_deref(), Some("dean-1"));
    assert_eq!(stored.submitted_at, submitted.submitted_at);
}

#[test]
fn test_publish_twice_reports_no_change() {
    let (_temp, run_repo, api) = setup();
    create_done_run(&run_repo, "RUN1");

    api.submit("RUN1").unwrap();
    api.approve("RUN1", "dean-1").unwrap();
    let (_, first) = api.publish("RUN1").unwrap();
    let (run, second) = api.publish("RUN1").unwrap();

    assert!(first);
    assert!(!second);
    assert!(run.published);
}

#[test]
fn test_submit_refused_while_running() {
    let (_temp, run_repo, api) = setup();
    let run = PlanningRun::new_running("RUN1", RunScope::Global, None, None, None, "admin");
    run_repo.create(&run).unwrap();

    let result = api.submit("RUN1");
    match result {
        Err(ApiError::WorkflowViolation(msg)) => {
            assert_eq!(msg, "Le run doit être terminé avant soumission")
        }
        other => panic!("Expected WorkflowViolation, got {:?}", other),
    }

    // storage untouched
    let stored = run_repo.find_by_id("RUN1").unwrap().unwrap();
    assert_eq!(stored.admin_status, AdminStatus::Draft);
}

#[test]
fn test_double_submit_refused() {
    let (_temp, run_repo, api) = setup();
    create_done_run(&run_repo, "RUN1");

    api.submit("RUN1").unwrap();
    assert!(matches!(
        api.submit("RUN1"),
        Err(ApiError::WorkflowViolation(_))
    ));
}

#[test]
fn test_decision_requires_submission() {
    let (_temp, run_repo, api) = setup();
    create_done_run(&run_repo, "RUN1");

    assert!(matches!(
        api.approve("RUN1", "dean-1"),
        Err(ApiError::WorkflowViolation(_))
    ));
    assert!(matches!(
        api.reject("RUN1", "dean-1", "raison"),
        Err(ApiError::WorkflowViolation(_))
    ));
    assert!(matches!(
        api.publish("RUN1"),
        Err(ApiError::WorkflowViolation(_))
    ));
}

#[test]
fn test_reject_then_resubmit_clears_the_trace() {
    let (_temp, run_repo, api) = setup();
    create_done_run(&run_repo, "RUN1");

    api.submit("RUN1").unwrap();
    let rejected = api.reject("RUN1", "dean-1", "Salles surchargées").unwrap();
    assert_eq!(rejected.approval_status, ApprovalStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Salles surchargées"));
    assert_eq!(rejected.rejected_by.as_deref(), Some("dean-1"));

    let resubmitted = api.submit("RUN1").unwrap();
    assert!(resubmitted.is_awaiting_decision());
    assert!(resubmitted.rejection_reason.is_none());

    let stored = run_repo.find_by_id("RUN1").unwrap().unwrap();
    assert!(stored.rejected_at.is_none());
    assert!(stored.rejected_by.is_none());
}

#[test]
fn test_reject_requires_reason_and_dean() {
    let (_temp, run_repo, api) = setup();
    create_done_run(&run_repo, "RUN1");
    api.submit("RUN1").unwrap();

    assert!(matches!(
        api.reject("RUN1", "dean-1", "  "),
        Err(ApiError::WorkflowViolation(_))
    ));
    assert!(matches!(
        api.reject("RUN1", "", "raison"),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.approve("RUN1", ""),
        Err(ApiError::InvalidInput(_))
    ));
}

#[test]
fn test_unknown_run_is_not_found() {
    let (_temp, _run_repo, api) = setup();

    assert!(matches!(api.submit("nope"), Err(ApiError::NotFound(_))));
    assert!(matches!(
        api.approve("nope", "dean-1"),
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(api.publish("nope"), Err(ApiError::NotFound(_))));
}

#[test]
fn test_dean_listing_filters() {
    let (_temp, run_repo, api) = setup();
    create_done_run(&run_repo, "RUN-A");
    create_done_run(&run_repo, "RUN-B");
    create_done_run(&run_repo, "RUN-C");

    api.submit("RUN-A").unwrap();
    api.submit("RUN-B").unwrap();
    api.approve("RUN-A", "dean-1").unwrap();
    api.submit("RUN-C").unwrap();
    api.reject("RUN-C", "dean-1", "fenêtre trop courte").unwrap();

    let all = api.list_for_dean(DeanRunFilter::All).unwrap();
    assert_eq!(all.len(), 3);

    let submitted = api.list_for_dean(DeanRunFilter::Submitted).unwrap();
    let ids: Vec<&str> = submitted.iter().map(|r| r.run_id.as_str()).collect();
    assert_eq!(ids, vec!["RUN-B"]);

    let approved = api.list_for_dean(DeanRunFilter::Approved).unwrap();
    assert_eq!(approved[0].run_id, "RUN-A");

    let rejected = api.list_for_dean(DeanRunFilter::Rejected).unwrap();
    assert_eq!(rejected[0].run_id, "RUN-C");

    // PENDING covers the still-undecided submission
    let pending = api.list_for_dean(DeanRunFilter::Pending).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].run_id, "RUN-B");
}

#[test]
fn test_filter_parsing_from_query() {
    assert_eq!(DeanRunFilter::from_query(Some("approved")), DeanRunFilter::Approved);
    assert_eq!(DeanRunFilter::from_query(Some("SUBMITTED")), DeanRunFilter::Submitted);
    assert_eq!(DeanRunFilter::from_query(Some("whatever")), DeanRunFilter::All);
    assert_eq!(DeanRunFilter::from_query(None), DeanRunFilter::All);
}
