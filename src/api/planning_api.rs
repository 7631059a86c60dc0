// ==========================================
// Exam Planner - Planning API
// ==========================================
// Run management: launch a generation, browse runs and their
// items, re-check conflicts, serve the published planning.
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::conflict::ConflictReport;
use crate::domain::planning::{AssignmentItem, PlanningRun};
use crate::domain::resources::RoleContext;
use crate::domain::types::Role;
use crate::engine::conflict::ConflictDetector;
use crate::engine::orchestrator::{
    GenerationOrchestrator, GenerationOutcome, GenerationRequest,
};
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::gateway::{SqliteReferenceReader, SqliteRunStore};
use crate::repository::reference_repo::ReferenceRepository;
use crate::repository::run_repo::{AssignmentItemRepository, PlanningRunRepository};

/// Published planning projection: the run end users see, with its
/// items narrowed to the caller's horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedPlanning {
    pub run: Option<PlanningRun>,    // None when nothing is published yet
    pub items: Vec<AssignmentItem>,  // chronological, role-filtered
}

// ==========================================
// PlanningApi
// ==========================================
pub struct PlanningApi {
    run_repo: Arc<PlanningRunRepository>,
    item_repo: Arc<AssignmentItemRepository>,
    reference_repo: Arc<ReferenceRepository>,
    catalog_repo: Arc<CatalogRepository>,
    orchestrator: GenerationOrchestrator<SqliteReferenceReader, SqliteRunStore, ConfigManager>,
    detector: ConflictDetector,
}

impl PlanningApi {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        run_repo: Arc<PlanningRunRepository>,
        item_repo: Arc<AssignmentItemRepository>,
        reference_repo: Arc<ReferenceRepository>,
        catalog_repo: Arc<CatalogRepository>,
        reference_reader: Arc<SqliteReferenceReader>,
        run_store: Arc<SqliteRunStore>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            run_repo,
            item_repo,
            reference_repo,
            catalog_repo,
            orchestrator: GenerationOrchestrator::new(reference_reader, run_store, config_manager),
            detector: ConflictDetector::new(),
        }
    }

    // ==========================================
    // Generation
    // ==========================================

    /// Launches a generation run.
    ///
    /// # Arguments
    /// - `request`: scope, optional window and the launching admin
    ///
    /// # Returns
    /// - `Ok(GenerationOutcome)`: closed run plus its items
    pub async fn generate(&self, request: GenerationRequest) -> ApiResult<GenerationOutcome> {
        if request.created_by.trim().is_empty() {
            return Err(ApiError::InvalidInput("Créateur requis".to_string()));
        }

        self.orchestrator
            .generate(request)
            .await
            .map_err(ApiError::from)
    }

    // ==========================================
    // Run queries
    // ==========================================

    /// All runs, newest first.
    pub fn list_runs(&self) -> ApiResult<Vec<PlanningRun>> {
        Ok(self.run_repo.list_all()?)
    }

    pub fn get_run(&self, run_id: &str) -> ApiResult<PlanningRun> {
        self.run_repo
            .find_by_id(run_id)?
            .ok_or_else(|| ApiError::NotFound("Run introuvable".to_string()))
    }

    /// Items of one run, in placement order.
    pub fn get_run_items(&self, run_id: &str) -> ApiResult<Vec<AssignmentItem>> {
        self.get_run(run_id)?;
        Ok(self.item_repo.find_by_run(run_id)?)
    }

    /// Re-runs conflict detection on a stored run.
    pub fn detect_conflicts(&self, run_id: &str) -> ApiResult<ConflictReport> {
        self.get_run(run_id)?;
        let items = self.item_repo.find_by_run(run_id)?;
        let rooms = self.reference_repo.list_rooms()?;
        Ok(self.detector.detect(run_id, &items, &rooms))
    }

    // ==========================================
    // Published planning
    // ==========================================

    /// The latest published planning, narrowed to what the caller
    /// may see: students their program, professors their
    /// department, staff roles everything.
    ///
    /// # Returns
    /// - `Ok(PublishedPlanning)` with `run: None` when nothing has
    ///   been published yet
    pub fn published_planning(&self, ctx: &RoleContext) -> ApiResult<PublishedPlanning> {
        let Some(run) = self.run_repo.most_recently_published()? else {
            return Ok(PublishedPlanning {
                run: None,
                items: Vec::new(),
            });
        };

        let mut items = self.item_repo.find_by_run(&run.run_id)?;

        // Chronological ordering via the slot table; items pointing
        // at a deleted slot sink to the end.
        let slots = self.reference_repo.list_slots()?;
        let slot_keys: HashMap<&str, (chrono::NaiveDate, chrono::NaiveTime)> = slots
            .iter()
            .map(|s| (s.slot_id.as_str(), s.sort_key()))
            .collect();
        items.sort_by_key(|item| {
            let key = slot_keys.get(item.slot_id.as_str()).copied();
            (key.is_none(), key)
        });

        let items = self.filter_items_for_role(ctx, items)?;

        Ok(PublishedPlanning {
            run: Some(run),
            items,
        })
    }

    fn filter_items_for_role(
        &self,
        ctx: &RoleContext,
        items: Vec<AssignmentItem>,
    ) -> ApiResult<Vec<AssignmentItem>> {
        match ctx.role {
            Role::Student => {
                let Some(program_id) = ctx.program_id.as_deref() else {
                    return Ok(Vec::new());
                };
                let module_program = self.module_program_map()?;
                Ok(items
                    .into_iter()
                    .filter(|item| {
                        module_program.get(item.module_id.as_str()).map(String::as_str)
                            == Some(program_id)
                    })
                    .collect())
            }
            Role::Professor => {
                let Some(department_id) = ctx.department_id.as_deref() else {
                    return Ok(Vec::new());
                };
                let module_program = self.module_program_map()?;
                let program_department: HashMap<String, String> = self
                    .catalog_repo
                    .list_programs()?
                    .into_iter()
                    .map(|p| (p.program_id, p.department_id))
                    .collect();
                Ok(items
                    .into_iter()
                    .filter(|item| {
                        module_program
                            .get(item.module_id.as_str())
                            .and_then(|program_id| program_department.get(program_id))
                            .map(String::as_str)
                            == Some(department_id)
                    })
                    .collect())
            }
            Role::ExamAdmin | Role::DeptHead | Role::Dean => Ok(items),
        }
    }

    fn module_program_map(&self) -> ApiResult<HashMap<String, String>> {
        Ok(self
            .catalog_repo
            .list_modules()?
            .into_iter()
            .map(|m| (m.module_id, m.program_id))
            .collect())
    }
}
