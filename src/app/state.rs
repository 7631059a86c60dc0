// ==========================================
// Exam Planner - Application State
// ==========================================
// Builds the whole object graph once: one shared connection, the
// repositories on top of it, then the API facades. Binaries hold
// an AppState and never touch repositories directly.
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{ApprovalApi, ImportApi, KpiApi, PlanningApi, ReferenceApi};
use crate::config::config_manager::ConfigManager;
use crate::db::open_sqlite_connection;
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::gateway::{SqliteReferenceReader, SqliteRunStore};
use crate::repository::reference_repo::ReferenceRepository;
use crate::repository::run_repo::{AssignmentItemRepository, PlanningRunRepository};

/// Shared application state holding every API facade.
pub struct AppState {
    pub db_path: String,
    pub planning_api: Arc<PlanningApi>,
    pub approval_api: Arc<ApprovalApi>,
    pub kpi_api: Arc<KpiApi>,
    pub reference_api: Arc<ReferenceApi>,
    pub import_api: Arc<ImportApi>,
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// Builds the full state for one database file.
    ///
    /// # Arguments
    /// - `db_path`: SQLite database file path
    ///
    /// # Returns
    /// - `Err(String)`: which part of the graph failed to build
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, "initializing AppState");

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("cannot open database {}: {}", db_path, e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // Repositories
        // ==========================================
        let run_repo = Arc::new(
            PlanningRunRepository::from_connection(conn.clone())
                .map_err(|e| format!("cannot create PlanningRunRepository: {}", e))?,
        );
        let item_repo = Arc::new(
            AssignmentItemRepository::from_connection(conn.clone())
                .map_err(|e| format!("cannot create AssignmentItemRepository: {}", e))?,
        );
        let reference_repo = Arc::new(
            ReferenceRepository::from_connection(conn.clone())
                .map_err(|e| format!("cannot create ReferenceRepository: {}", e))?,
        );
        let catalog_repo = Arc::new(
            CatalogRepository::from_connection(conn.clone())
                .map_err(|e| format!("cannot create CatalogRepository: {}", e))?,
        );

        // Engine-facing gateways over the same connection
        let reference_reader = Arc::new(
            SqliteReferenceReader::from_connection(conn.clone())
                .map_err(|e| format!("cannot create SqliteReferenceReader: {}", e))?,
        );
        let run_store = Arc::new(
            SqliteRunStore::from_connection(conn.clone())
                .map_err(|e| format!("cannot create SqliteRunStore: {}", e))?,
        );

        // ==========================================
        // Configuration
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("cannot create ConfigManager: {}", e))?,
        );

        // ==========================================
        // API facades
        // ==========================================
        let planning_api = Arc::new(PlanningApi::new(
            run_repo.clone(),
            item_repo.clone(),
            reference_repo.clone(),
            catalog_repo.clone(),
            reference_reader,
            run_store,
            config_manager.clone(),
        ));

        let approval_api = Arc::new(ApprovalApi::new(run_repo.clone()));

        let kpi_api = Arc::new(KpiApi::new(
            run_repo,
            item_repo.clone(),
            reference_repo.clone(),
            catalog_repo.clone(),
            config_manager.clone(),
        ));

        let reference_api = Arc::new(ReferenceApi::new(
            reference_repo.clone(),
            catalog_repo.clone(),
            item_repo,
        ));

        let import_api = Arc::new(ImportApi::new(reference_repo, catalog_repo));

        tracing::info!("AppState ready");

        Ok(Self {
            db_path,
            planning_api,
            approval_api,
            kpi_api,
            reference_api,
            import_api,
            config_manager,
        })
    }

    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// Default database path
// ==========================================

/// Resolves the database file path.
///
/// Priority: `EXAM_PLANNER_DB_PATH` env var, then the user data
/// directory (a `-dev` suffixed one in debug builds), then the
/// working directory as last resort.
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("EXAM_PLANNER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./exam_planner.db");

    if let Some(data_dir) = dirs::data_dir() {
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("exam-planner-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("exam-planner");
        }

        std::fs::create_dir_all(&path).ok();
        path = path.join("exam_planner.db");
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_app_state_builds_on_fresh_file() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("planner.db");

        let state = AppState::new(db_path.to_string_lossy().to_string()).unwrap();
        assert!(state.get_db_path().ends_with("planner.db"));

        // repositories created their tables; listing must not fail
        assert!(state.reference_api.list_rooms().unwrap().is_empty());
        assert!(state.planning_api.list_runs().unwrap().is_empty());
    }
}
