// ==========================================
// Exam Planner - KPI Dashboard API
// ==========================================
// Resolves the run to report on, then builds the role-shaped
// dashboard view. Run resolution: explicit id, else the latest
// published run, else the last finished one.
// ==========================================

use std::sync::Arc;

use chrono::Local;
use tracing::{debug, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::{defaults, ConfigManager, PlanningConfigReader};
use crate::domain::kpi::KpiView;
use crate::domain::planning::PlanningRun;
use crate::domain::resources::RoleContext;
use crate::engine::kpi::KpiBuilder;
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::reference_repo::ReferenceRepository;
use crate::repository::run_repo::{AssignmentItemRepository, PlanningRunRepository};

// ==========================================
// KpiApi
// ==========================================
pub struct KpiApi {
    run_repo: Arc<PlanningRunRepository>,
    item_repo: Arc<AssignmentItemRepository>,
    reference_repo: Arc<ReferenceRepository>,
    catalog_repo: Arc<CatalogRepository>,
    config_manager: Arc<ConfigManager>,
}

impl KpiApi {
    pub fn new(
        run_repo: Arc<PlanningRunRepository>,
        item_repo: Arc<AssignmentItemRepository>,
        reference_repo: Arc<ReferenceRepository>,
        catalog_repo: Arc<CatalogRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            run_repo,
            item_repo,
            reference_repo,
            catalog_repo,
            config_manager,
        }
    }

    /// Picks the run the dashboard reports on.
    ///
    /// # Arguments
    /// - `run_id`: explicit run, or None for the freshest one
    fn resolve_run(&self, run_id: Option<&str>) -> ApiResult<PlanningRun> {
        if let Some(id) = run_id {
            return self
                .run_repo
                .find_by_id(id)?
                .ok_or_else(|| ApiError::NotFound("Run introuvable".to_string()));
        }

        if let Some(published) = self.run_repo.latest_published()? {
            return Ok(published);
        }

        self.run_repo
            .latest_done()?
            .ok_or_else(|| ApiError::NotFound("Aucun run disponible".to_string()))
    }

    /// Builds the dashboard for the caller's role.
    ///
    /// # Arguments
    /// - `ctx`: resolved caller identity and scope
    /// - `run_id`: explicit run to report on, usually None
    pub async fn dashboard(
        &self,
        ctx: &RoleContext,
        run_id: Option<&str>,
    ) -> ApiResult<KpiView> {
        let run = self.resolve_run(run_id)?;
        debug!(run_id = %run.run_id, role = %ctx.role, "building dashboard");

        let items = self.item_repo.find_by_run(&run.run_id)?;
        let rooms = self.reference_repo.list_rooms()?;
        let slots = self.reference_repo.list_slots()?;
        let modules = self.catalog_repo.list_modules()?;
        let programs = self.catalog_repo.list_programs()?;
        let departments = self.catalog_repo.list_departments()?;

        let top_n = match self.config_manager.get_kpi_top_n().await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "kpi top_n config read failed, using default");
                defaults::KPI_TOP_N
            }
        };
        let upcoming_limit = match self.config_manager.get_kpi_upcoming_limit().await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "kpi upcoming limit config read failed, using default");
                defaults::KPI_UPCOMING_LIMIT
            }
        };

        let builder = KpiBuilder::new(&rooms, &slots, &modules, &programs, &departments)
            .with_limits(top_n, upcoming_limit);

        let today = Local::now().date_naive();
        Ok(builder.build_view(ctx, &items, &run, today))
    }
}
