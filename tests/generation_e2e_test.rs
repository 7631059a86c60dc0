// ==========================================
// Generation End-to-End Tests
// ==========================================
// Full pipeline over a real database file: seed the campus,
// launch a run through PlanningApi, then check the persisted run,
// its items and the conflict re-check.
// ==========================================


use std::collections::HashSet;

use exam_planner::api::error::ApiError;
use exam_planner::app::AppState;
use exam_planner::domain::planning::{NOTE_CAPACITY_EXCEEDED, NOTE_INVIGILATOR_MISSING};
use exam_planner::domain::types::{RunScope, RunStatus};
use exam_planner::engine::GenerationRequest;
use exam_planner::repository::{CatalogRepository, ReferenceRepository};

use test_helpers::{create_test_db, create_test_room, create_test_slot, day, enroll, seed_campus};

fn global_request() -> GenerationRequest {
    GenerationRequest {
        scope: RunScope::Global,
        scope_id: None,
        window_start: None,
        window_end: None,
        created_by: "admin".to_string(),
    }
}

#[tokio::test]
async fn test_global_run_places_every_module() {
    let (_temp, db_path) = create_test_db().unwrap();
    seed_campus(&db_path);
    let state = AppState::new(db_path).unwrap();

    let outcome = state.planning_api.generate(global_request()).await.unwrap();

    let run = &outcome.run;
    assert_eq!(run.status, RunStatus::Done);
    assert!(run.ended_at.is_some());
    assert!(!run.published);

    let metrics = run.metrics.as_ref().expect("metrics snapshot");
    assert_eq!(metrics.exams_generated, 3);
    assert_eq!(metrics.room_collisions, 0);
    assert_eq!(metrics.capacity_exceeded, 0);
    assert_eq!(metrics.invigilators_missing, 0);
    // 50 -> R2 (60), 30 -> R1 (40), 10 -> R3 (20)
    assert!((metrics.avg_room_fill_rate - 90.0 / 120.0).abs() < 1e-9);

    // every module placed once, no pair reused
    let modules: HashSet<&str> = outcome.items.iter().map(|i| i.module_id.as_str()).collect();
    assert_eq!(modules, HashSet::from(["M1", "M2", "M3"]));
    let mut pairs = HashSet::new();
    for item in &outcome.items {
        assert!(pairs.insert((item.slot_id.clone(), item.room_id.clone())));
        assert!(item.annotation.is_none());
        assert_eq!(item.invigilators.len(), 1); // default per_exam
    }

    // the largest exam got the smallest sufficient room
    let analyse = outcome
        .items
        .iter()
        .find(|i| i.module_id == "M3")
        .unwrap();
    assert_eq!(analyse.expected_students, 50);
    assert_eq!(analyse.room_id, "R2");
}

#[tokio::test]
async fn test_run_and_items_are_persisted() {
    let (_temp, db_path) = create_test_db().unwrap();
    seed_campus(&db_path);
    let state = AppState::new(db_path).unwrap();

    let outcome = state.planning_api.generate(global_request()).await.unwrap();

    let runs = state.planning_api.list_runs().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_id, outcome.run.run_id);
    assert_eq!(runs[0].metrics, outcome.run.metrics);

    let stored = state.planning_api.get_run_items(&outcome.run.run_id).unwrap();
    assert_eq!(stored.len(), 3);
    let stored_ids: Vec<&str> = stored.iter().map(|i| i.item_id.as_str()).collect();
    let outcome_ids: Vec<&str> = outcome.items.iter().map(|i| i.item_id.as_str()).collect();
    assert_eq!(stored_ids, outcome_ids); // placement order survives storage

    let report = state
        .planning_api
        .detect_conflicts(&outcome.run.run_id)
        .unwrap();
    assert_eq!(report.totals.critical, 0);
    assert_eq!(report.totals.high, 0);
    assert!(report.conflicts.is_empty());
}

#[tokio::test]
async fn test_program_scope_narrows_the_module_set() {
    let (_temp, db_path) = create_test_db().unwrap();
    seed_campus(&db_path);
    let state = AppState::new(db_path).unwrap();

    let outcome = state
        .planning_api
        .generate(GenerationRequest {
            scope: RunScope::Program,
            scope_id: Some("P1".to_string()),
            window_start: None,
            window_end: None,
            created_by: "admin".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(outcome.run.scope, RunScope::Program);
    assert_eq!(outcome.run.scope_id.as_deref(), Some("P1"));
    let modules: HashSet<&str> = outcome.items.iter().map(|i| i.module_id.as_str()).collect();
    assert_eq!(modules, HashSet::from(["M1", "M2"]));
}

#[tokio::test]
async fn test_department_scope_follows_program_ownership() {
    let (_temp, db_path) = create_test_db().unwrap();
    seed_campus(&db_path);
    let state = AppState::new(db_path).unwrap();

    let outcome = state
        .planning_api
        .generate(GenerationRequest {
            scope: RunScope::Department,
            scope_id: Some("D2".to_string()),
            window_start: None,
            window_end: None,
            created_by: "admin".to_string(),
        })
        .await
        .unwrap();

    let modules: HashSet<&str> = outcome.items.iter().map(|i| i.module_id.as_str()).collect();
    assert_eq!(modules, HashSet::from(["M3"]));
}

#[tokio::test]
async fn test_oversized_exam_is_placed_and_flagged() {
    // One room of 20 for a 50-head exam, no invigilators: the exam
    // still lands, carrying the over-capacity note, and the metrics
    // count both soft gaps.
    let (_temp, db_path) = create_test_db().unwrap();
    {
        let conn = test_helpers::open_shared_connection(&db_path);
        let reference_repo = ReferenceRepository::from_connection(conn.clone()).unwrap();
        let catalog_repo = CatalogRepository::from_connection(conn).unwrap();

        catalog_repo
            .upsert_department(&exam_planner::domain::resources::Department {
                department_id: "D1".to_string(),
                name: "Informatique".to_string(),
                location: String::new(),
            })
            .unwrap();
        catalog_repo
            .upsert_program(&exam_planner::domain::resources::Program {
                program_id: "P1".to_string(),
                name: "Licence Informatique".to_string(),
                level: "L".to_string(),
                department_id: "D1".to_string(),
            })
            .unwrap();
        catalog_repo
            .upsert_module(&exam_planner::domain::resources::ExamModule {
                module_id: "M1".to_string(),
                name: "Algorithmique".to_string(),
                program_id: "P1".to_string(),
            })
            .unwrap();
        enroll(&catalog_repo, "M1", 50);

        reference_repo
            .upsert_room(&create_test_room("R-PETITE", "Salle B-001", 20))
            .unwrap();
        reference_repo
            .upsert_slot(&create_test_slot("S1", day(2), 8, 0))
            .unwrap();
    }
    let state = AppState::new(db_path).unwrap();

    let outcome = state.planning_api.generate(global_request()).await.unwrap();

    assert_eq!(outcome.items.len(), 1);
    let item = &outcome.items[0];
    assert!(item.has_annotation(NOTE_CAPACITY_EXCEEDED));
    assert!(!item.has_annotation(NOTE_INVIGILATOR_MISSING)); // empty pool adds no note
    assert!(item.invigilators.is_empty());

    let metrics = outcome.run.metrics.as_ref().unwrap();
    assert_eq!(metrics.capacity_exceeded, 1);
    assert_eq!(metrics.invigilators_missing, 1);
    assert!((metrics.avg_room_fill_rate - 1.0).abs() < 1e-9); // 50/20 capped

    // the re-check sees the same gap as a HIGH conflict
    let report = state
        .planning_api
        .detect_conflicts(&outcome.run.run_id)
        .unwrap();
    assert_eq!(report.totals.high, 1);
    assert_eq!(report.totals.critical, 0);
}

#[tokio::test]
async fn test_window_without_slots_fails_before_writing_items() {
    let (_temp, db_path) = create_test_db().unwrap();
    seed_campus(&db_path);
    let state = AppState::new(db_path).unwrap();

    let result = state
        .planning_api
        .generate(GenerationRequest {
            scope: RunScope::Global,
            scope_id: None,
            window_start: Some(day(20)),
            window_end: Some(day(25)),
            created_by: "admin".to_string(),
        })
        .await;

    assert!(matches!(result, Err(ApiError::EmptyPool(_))));

    // the aborted run stays visible as RUNNING, with no items
    let runs = state.planning_api.list_runs().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Running);
    assert!(state
        .planning_api
        .get_run_items(&runs[0].run_id)
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_generate_requires_a_creator() {
    let (_temp, db_path) = create_test_db().unwrap();
    seed_campus(&db_path);
    let state = AppState::new(db_path).unwrap();

    let result = state
        .planning_api
        .generate(GenerationRequest {
            created_by: "   ".to_string(),
            ..global_request()
        })
        .await;

    assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    assert!(state.planning_api.list_runs().unwrap().is_empty());
}
