// Dev driver: run one generation against a database file, then print
// the run metrics and the conflict totals the detector reports.
//
// Usage:
//   cargo run --bin run_generation -- [db_path] [scope] [scope_id] [start] [end]
//
// Scope is global, department or program; department and program need
// the scope_id argument. Dates are YYYY-MM-DD, both optional.

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use exam_planner::app::{get_default_db_path, AppState};
use exam_planner::domain::types::RunScope;
use exam_planner::engine::GenerationRequest;
use exam_planner::logging;

fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let db_path = args.first().cloned().unwrap_or_else(get_default_db_path);
    let scope = RunScope::from_str(args.get(1).map(String::as_str).unwrap_or("global"));

    let mut rest = args.iter().skip(2);
    let scope_id = match scope {
        RunScope::Global => None,
        _ => Some(
            rest.next()
                .cloned()
                .ok_or_else(|| anyhow!("scope_id requis pour le scope {}", scope))?,
        ),
    };
    let window_start = parse_date(rest.next())?;
    let window_end = parse_date(rest.next())?;

    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    let request = GenerationRequest {
        scope,
        scope_id,
        window_start,
        window_end,
        created_by: "run_generation bin".to_string(),
    };

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(state.planning_api.generate(request))?;

    let run = &outcome.run;
    println!("run_id={}", run.run_id);
    if let Some(metrics) = &run.metrics {
        println!("exams_generated={}", metrics.exams_generated);
        println!("room_collisions={}", metrics.room_collisions);
        println!("capacity_exceeded={}", metrics.capacity_exceeded);
        println!("invigilators_missing={}", metrics.invigilators_missing);
        println!("avg_room_fill_rate={:.3}", metrics.avg_room_fill_rate);
        println!("duration_ms={}", metrics.duration_ms);
    }

    let report = state.planning_api.detect_conflicts(&run.run_id)?;
    println!(
        "conflicts: critical={} high={} medium={}",
        report.totals.critical, report.totals.high, report.totals.medium
    );

    Ok(())
}

fn parse_date(value: Option<&String>) -> Result<Option<NaiveDate>> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .map_err(|_| anyhow!("date invalide: {} (attendu YYYY-MM-DD)", v))
        })
        .transpose()
}
