// ==========================================
// Exam Planner - Generation Orchestrator
// ==========================================
// Drives one full generation run: create the run row, fetch the
// pools, resolve the window, place exams, assign invigilators,
// persist the batch, close the run with its metrics. The run row
// is written first; a failure later leaves it RUNNING on purpose
// so aborted generations stay visible.
// ==========================================

use crate::config::{defaults, PlanningConfigReader};
use crate::domain::planning::{
    AssignmentItem, PlanningRun, RunMetrics, NOTE_CAPACITY_EXCEEDED,
};
use crate::domain::resources::{ExamModule, Program};
use crate::domain::types::{RunScope, RunStatus};
use crate::engine::allocator::{resolve_window, slots_within, RoomSlotAllocator};
use crate::engine::demand::DemandLoader;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::invigilation::InvigilatorAssigner;
use crate::engine::reference::{ReferenceReader, RunStore};
use chrono::{NaiveDate, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// GenerationRequest
// ==========================================
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub scope: RunScope,               // GLOBAL / DEPARTMENT / PROGRAM
    pub scope_id: Option<String>,      // department or program id when narrowed
    pub window_start: Option<NaiveDate>, // explicit window start
    pub window_end: Option<NaiveDate>,   // explicit window end
    pub created_by: String,            // admin launching the run
}

impl GenerationRequest {
    pub fn global(created_by: &str) -> Self {
        Self {
            scope: RunScope::Global,
            scope_id: None,
            window_start: None,
            window_end: None,
            created_by: created_by.to_string(),
        }
    }
}

// ==========================================
// GenerationOutcome
// ==========================================
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub run: PlanningRun,            // closed run row, metrics included
    pub items: Vec<AssignmentItem>,  // persisted items, placement order
}

// ==========================================
// GenerationOrchestrator
// ==========================================
pub struct GenerationOrchestrator<R, S, C>
where
    R: ReferenceReader,
    S: RunStore,
    C: PlanningConfigReader,
{
    reference: Arc<R>,
    store: Arc<S>,
    config: Arc<C>,
    demand: DemandLoader,
    assigner: InvigilatorAssigner,
}

impl<R, S, C> GenerationOrchestrator<R, S, C>
where
    R: ReferenceReader,
    S: RunStore,
    C: PlanningConfigReader,
{
    pub fn new(reference: Arc<R>, store: Arc<S>, config: Arc<C>) -> Self {
        Self {
            reference,
            store,
            config,
            demand: DemandLoader::new(),
            assigner: InvigilatorAssigner::new(),
        }
    }

    /// Runs the whole generation pipeline for one request.
    ///
    /// # Returns
    /// The closed run plus its items. Any error aborts before the
    /// item batch is written; the run row then stays `RUNNING`.
    #[instrument(skip(self, request), fields(scope = %request.scope, created_by = %request.created_by))]
    pub async fn generate(&self, request: GenerationRequest) -> EngineResult<GenerationOutcome> {
        let started = Instant::now();
        info!(
            scope = %request.scope,
            scope_id = request.scope_id.as_deref().unwrap_or("-"),
            created_by = %request.created_by,
            "generation run starting"
        );

        // ==========================================
        // Step 1: create the RUNNING row
        // ==========================================
        let run_id = Uuid::new_v4().to_string();
        let mut run = PlanningRun::new_running(
            &run_id,
            request.scope,
            request.scope_id.clone(),
            request.window_start,
            request.window_end,
            &request.created_by,
        );
        self.store.create_run(&run).await?;

        // ==========================================
        // Step 2: academic catalog, narrowed to scope
        // ==========================================
        debug!("step 2: resolving module scope");

        let programs = self.reference.fetch_programs().await?;
        let all_modules = self.reference.fetch_modules().await?;
        let modules = modules_in_scope(
            request.scope,
            request.scope_id.as_deref(),
            &all_modules,
            &programs,
        );

        info!(
            modules_total = all_modules.len(),
            modules_in_scope = modules.len(),
            "module scope resolved"
        );

        // ==========================================
        // Step 3: pools, fetched concurrently
        // ==========================================
        debug!("step 3: fetching room/slot/invigilator pools");

        let (rooms, all_slots, invigilators) = tokio::try_join!(
            self.reference.fetch_rooms(),
            self.reference.fetch_slots(),
            self.reference.fetch_invigilators()
        )?;

        if rooms.is_empty() {
            return Err(EngineError::EmptyRoomPool);
        }
        if all_slots.is_empty() {
            return Err(EngineError::EmptySlotPool);
        }

        info!(
            rooms_count = rooms.len(),
            slots_count = all_slots.len(),
            invigilators_count = invigilators.len(),
            "pools fetched"
        );

        // ==========================================
        // Step 4: resolve and apply the date window
        // ==========================================
        debug!("step 4: resolving planning window");

        let default_days = match self.config.get_default_window_days().await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "window config read failed, using default");
                defaults::DEFAULT_WINDOW_DAYS
            }
        };
        let (window_start, window_end) = resolve_window(
            &all_slots,
            request.window_start,
            request.window_end,
            default_days,
        )?;
        let slots = slots_within(&all_slots, window_start, window_end);

        info!(
            window_start = %window_start,
            window_end = %window_end,
            slots_in_window = slots.len(),
            "planning window resolved"
        );

        if slots.is_empty() {
            return Err(EngineError::EmptySlotPool);
        }

        // ==========================================
        // Step 5: expected attendance per module
        // ==========================================
        debug!("step 5: loading expected attendance");

        let enrollments = self.reference.fetch_enrollments().await?;
        let module_ids: Vec<String> = modules.iter().map(|m| m.module_id.clone()).collect();
        let expected = self.demand.expected_attendance(&module_ids, &enrollments);

        // ==========================================
        // Step 6: room/slot placement
        // ==========================================
        debug!("step 6: placing exams");

        let mut allocator = RoomSlotAllocator::new();
        let placement = allocator.allocate(&modules, &rooms, &slots, &expected, &run_id)?;
        let mut items = placement.items;

        info!(
            placed = items.len(),
            dropped = modules.len() - items.len(),
            occupancy = placement.occupancy,
            "placement finished"
        );

        // ==========================================
        // Step 7: invigilator assignment
        // ==========================================
        debug!("step 7: assigning invigilators");

        let per_exam = match self.config.get_invigilators_per_exam().await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "per-exam config read failed, using default");
                defaults::INVIGILATORS_PER_EXAM
            }
        };
        let max_per_day = match self.config.get_invigilator_max_per_day().await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "daily-cap config read failed, using default");
                defaults::INVIGILATOR_MAX_PER_DAY
            }
        };
        self.assigner
            .assign(&mut items, &invigilators, &slots, per_exam, max_per_day);

        // ==========================================
        // Step 8: duplicate pair audit
        // ==========================================
        // The allocator already guarantees uniqueness; this recount
        // feeds the metrics snapshot rather than trusting it.
        let duplicate_pairs = count_duplicate_pairs(&items);
        if duplicate_pairs > 0 {
            warn!(duplicate_pairs, "duplicate (room, slot) pairs in batch");
        }

        // ==========================================
        // Step 9: persist the batch
        // ==========================================
        if !items.is_empty() {
            self.store.insert_items(&items).await?;
        }

        // ==========================================
        // Step 10: close the run with its metrics
        // ==========================================
        let metrics = RunMetrics {
            exams_generated: items.len() as u32,
            room_collisions: duplicate_pairs,
            capacity_exceeded: items
                .iter()
                .filter(|i| i.annotation.as_deref() == Some(NOTE_CAPACITY_EXCEEDED))
                .count() as u32,
            invigilators_missing: items.iter().filter(|i| i.invigilators.is_empty()).count()
                as u32,
            avg_room_fill_rate: placement.occupancy,
            duration_ms: started.elapsed().as_millis() as u64,
        };

        run.status = RunStatus::Done;
        run.ended_at = Some(Utc::now().naive_utc());
        run.metrics = Some(metrics);
        self.store.update_run(&run).await?;

        info!(
            run_id = %run.run_id,
            exams_generated = run.metrics.as_ref().map(|m| m.exams_generated).unwrap_or(0),
            duration_ms = run.metrics.as_ref().map(|m| m.duration_ms).unwrap_or(0),
            "generation run finished"
        );

        Ok(GenerationOutcome { run, items })
    }
}

/// Narrows the module catalog to the requested scope. A scoped
/// request missing its id degrades to the full catalog rather than
/// an empty run.
pub fn modules_in_scope(
    scope: RunScope,
    scope_id: Option<&str>,
    modules: &[ExamModule],
    programs: &[Program],
) -> Vec<ExamModule> {
    match (scope, scope_id) {
        (RunScope::Program, Some(program_id)) => modules
            .iter()
            .filter(|m| m.program_id == program_id)
            .cloned()
            .collect(),
        (RunScope::Department, Some(dept_id)) => {
            let owned: HashSet<&str> = programs
                .iter()
                .filter(|p| p.department_id == dept_id)
                .map(|p| p.program_id.as_str())
                .collect();
            modules
                .iter()
                .filter(|m| owned.contains(m.program_id.as_str()))
                .cloned()
                .collect()
        }
        _ => modules.to_vec(),
    }
}

/// Counts items claiming a (room, slot) pair already taken within
/// the same run.
pub fn count_duplicate_pairs(items: &[AssignmentItem]) -> u32 {
    let mut seen: HashSet<(&str, &str, &str)> = HashSet::new();
    let mut duplicates = 0u32;
    for item in items {
        if !seen.insert((
            item.run_id.as_str(),
            item.slot_id.as_str(),
            item.room_id.as_str(),
        )) {
            duplicates += 1;
        }
    }
    duplicates
}
