// ==========================================
// Exam Planner - CLI Entry Point
// ==========================================
// Usage:
//   exam-planner <command> [args]
//
// Commands:
//   generate [scope] [scope_id] [start] [end]   launch a generation run
//   list-runs                                   list runs, newest first
//   submit <run_id>                             hand a run to the dean
//   approve <run_id> <dean_id>                  approve a submitted run
//   reject <run_id> <dean_id> <reason>          reject with a reason
//   publish <run_id>                            publish an approved run
//   import <kind> <path>                        load a CSV file
//   kpis <role> [user_id] [scope_id]            role dashboard as JSON
//   published <role> [user_id] [scope_id]       published planning as JSON
//
// The database path comes from EXAM_PLANNER_DB_PATH or the
// platform data directory.
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use exam_planner::app::{get_default_db_path, AppState};
use exam_planner::domain::planning::PlanningRun;
use exam_planner::domain::resources::RoleContext;
use exam_planner::domain::types::{Role, RunScope};
use exam_planner::engine::GenerationRequest;
use exam_planner::{i18n, logging};

fn main() -> Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("Exam Planner");
    tracing::info!("version: {}", exam_planner::VERSION);
    tracing::info!("==================================================");

    let mut args = std::env::args().skip(1);
    let command = match args.next() {
        Some(c) => c,
        None => {
            print_usage();
            return Ok(());
        }
    };

    let db_path = get_default_db_path();
    tracing::info!("database: {}", db_path);

    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    match command.as_str() {
        "generate" => cmd_generate(&state, &mut args),
        "list-runs" => cmd_list_runs(&state),
        "submit" => {
            let run_id = require_arg(&mut args, "run_id")?;
            let run = state.approval_api.submit(&run_id)?;
            print_run_line(&run);
            println!("{}", i18n::t("common.success"));
            Ok(())
        }
        "approve" => {
            let run_id = require_arg(&mut args, "run_id")?;
            let dean_id = require_arg(&mut args, "dean_id")?;
            let run = state.approval_api.approve(&run_id, &dean_id)?;
            print_run_line(&run);
            println!("{}", i18n::t("common.success"));
            Ok(())
        }
        "reject" => {
            let run_id = require_arg(&mut args, "run_id")?;
            let dean_id = require_arg(&mut args, "dean_id")?;
            let reason = require_arg(&mut args, "reason")?;
            let run = state.approval_api.reject(&run_id, &dean_id, &reason)?;
            print_run_line(&run);
            println!("{}", i18n::t("common.success"));
            Ok(())
        }
        "publish" => {
            let run_id = require_arg(&mut args, "run_id")?;
            let (run, already) = state.approval_api.publish(&run_id)?;
            if already {
                println!("Planning déjà publié");
            }
            print_run_line(&run);
            println!("{}", i18n::t("common.success"));
            Ok(())
        }
        "import" => cmd_import(&state, &mut args),
        "kpis" => cmd_kpis(&state, &mut args),
        "published" => cmd_published(&state, &mut args),
        other => {
            print_usage();
            bail!("commande inconnue: {}", other);
        }
    }
}

fn print_usage() {
    println!("Usage: exam-planner <command> [args]");
    println!();
    println!("  generate [scope] [scope_id] [start] [end]");
    println!("  list-runs");
    println!("  submit <run_id>");
    println!("  approve <run_id> <dean_id>");
    println!("  reject <run_id> <dean_id> <reason>");
    println!("  publish <run_id>");
    println!("  import <kind> <path>");
    println!("  kpis <role> [user_id] [scope_id]");
    println!("  published <role> [user_id] [scope_id]");
}

fn require_arg(args: &mut impl Iterator<Item = String>, name: &str) -> Result<String> {
    args.next()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| anyhow!("argument manquant: {}", name))
}

fn parse_date_arg(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("date invalide: {} (attendu YYYY-MM-DD)", value))
}

// ==========================================
// generate
// ==========================================
fn cmd_generate(state: &AppState, args: &mut impl Iterator<Item = String>) -> Result<()> {
    let scope_str = args.next().unwrap_or_else(|| "global".to_string());
    let scope = RunScope::from_str(&scope_str);

    let scope_id = match scope {
        RunScope::Global => None,
        _ => Some(require_arg(args, "scope_id")?),
    };
    let window_start = args.next().map(|v| parse_date_arg(&v)).transpose()?;
    let window_end = args.next().map(|v| parse_date_arg(&v)).transpose()?;

    let request = GenerationRequest {
        scope,
        scope_id,
        window_start,
        window_end,
        created_by: "admin".to_string(),
    };

    // APIs are async, bins are not; same bridge as the engine uses.
    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(state.planning_api.generate(request))?;

    let run = &outcome.run;
    print_run_line(run);
    if let Some(metrics) = &run.metrics {
        println!(
            "{}",
            i18n::t_with_args(
                "generation.done",
                &[("count", &metrics.exams_generated.to_string())],
            )
        );
        println!(
            "  collisions: {}  capacité dépassée: {}  surveillants manquants: {}",
            metrics.room_collisions, metrics.capacity_exceeded, metrics.invigilators_missing
        );
        println!(
            "  taux de remplissage moyen: {:.1}%  durée: {} ms",
            metrics.avg_room_fill_rate * 100.0,
            metrics.duration_ms
        );
    }
    Ok(())
}

// ==========================================
// list-runs
// ==========================================
fn cmd_list_runs(state: &AppState) -> Result<()> {
    let runs = state.planning_api.list_runs()?;
    if runs.is_empty() {
        println!("Aucun run");
        return Ok(());
    }
    for run in &runs {
        print_run_line(run);
    }
    Ok(())
}

fn print_run_line(run: &PlanningRun) {
    let published = if run.published { "PUBLISHED" } else { "-" };
    let exams = run
        .metrics
        .as_ref()
        .map(|m| m.exams_generated.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{}  {}  {}  {}/{}  {}  examens: {}  lancé: {}",
        run.run_id,
        run.scope,
        run.status,
        run.admin_status,
        run.approval_status,
        published,
        exams,
        run.started_at.format("%Y-%m-%d %H:%M:%S")
    );
}

// ==========================================
// import
// ==========================================
fn cmd_import(state: &AppState, args: &mut impl Iterator<Item = String>) -> Result<()> {
    let kind = require_arg(args, "kind")?;
    let path = require_arg(args, "path")?;

    let summary = state.import_api.import_named(&kind, &path)?;
    println!(
        "{}",
        i18n::t_with_args(
            "import.summary",
            &[
                ("inserted", &summary.inserted.to_string()),
                ("rejected", &summary.rejected.to_string()),
            ],
        )
    );
    for error in &summary.errors {
        println!("  ligne {}: {}: {}", error.line, error.field, error.message);
    }
    Ok(())
}

// ==========================================
// kpis / published
// ==========================================
fn parse_role_context(args: &mut impl Iterator<Item = String>) -> Result<RoleContext> {
    let role_str = require_arg(args, "role")?;
    let role = Role::from_str(&role_str).ok_or_else(|| anyhow!("rôle inconnu: {}", role_str))?;
    let user_id = args.next().unwrap_or_else(|| "cli".to_string());
    let ctx = RoleContext::new(&user_id, role);
    Ok(match (role, args.next()) {
        (Role::Student, Some(id)) => ctx.with_program(&id),
        (Role::Professor | Role::DeptHead, Some(id)) => ctx.with_department(&id),
        _ => ctx,
    })
}

fn cmd_kpis(state: &AppState, args: &mut impl Iterator<Item = String>) -> Result<()> {
    let ctx = parse_role_context(args)?;
    let rt = tokio::runtime::Runtime::new()?;
    let view = rt.block_on(state.kpi_api.dashboard(&ctx, None))?;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

fn cmd_published(state: &AppState, args: &mut impl Iterator<Item = String>) -> Result<()> {
    let ctx = parse_role_context(args)?;
    let planning = state.planning_api.published_planning(&ctx)?;
    match &planning.run {
        Some(run) => {
            print_run_line(run);
            println!("{}", serde_json::to_string_pretty(&planning.items)?);
        }
        None => println!("Aucun planning publié"),
    }
    Ok(())
}
