// ==========================================
// Exam Planner - Config Manager
// ==========================================
// Tuning knobs live in the config_kv table (key-value, global
// scope). Missing keys fall back to compiled defaults so a fresh
// database behaves like the documented baseline.
// ==========================================

use crate::config::planning_config_trait::PlanningConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// Opens the database at `db_path` and ensures the config table.
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        let manager = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        manager.ensure_table();
        Ok(manager)
    }

    /// Wraps an existing connection. Re-applies the unified PRAGMAs
    /// so behavior does not depend on who opened the connection.
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("lock poisoned: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }
        let manager = Self { conn };
        manager.ensure_table();
        Ok(manager)
    }

    fn ensure_table(&self) {
        let Ok(conn) = self.conn.lock() else {
            tracing::warn!("config_kv table check skipped, lock poisoned");
            return;
        };
        if let Err(e) = conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS config_kv (
                scope_id TEXT NOT NULL,
                key      TEXT NOT NULL,
                value    TEXT NOT NULL,
                PRIMARY KEY (scope_id, key)
            );",
        ) {
            tracing::warn!(error = %e, "config_kv table creation failed");
        }
    }

    /// Reads one value from the global scope.
    ///
    /// # Returns
    /// - `Some(String)`: stored value
    /// - `None`: key not configured
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("lock poisoned: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// Public read for other modules.
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Upserts one key in the global scope.
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("lock poisoned: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    /// Snapshot of every global key as a JSON object string.
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("lock poisoned: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

// ==========================================
// PlanningConfigReader implementation
// ==========================================
#[async_trait]
impl PlanningConfigReader for ConfigManager {
    async fn get_invigilators_per_exam(&self) -> Result<u32, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::INVIGILATORS_PER_EXAM, "1")?;
        Ok(value.parse::<u32>().unwrap_or(defaults::INVIGILATORS_PER_EXAM))
    }

    async fn get_invigilator_max_per_day(&self) -> Result<u32, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::INVIGILATOR_MAX_PER_DAY, "3")?;
        Ok(value.parse::<u32>().unwrap_or(defaults::INVIGILATOR_MAX_PER_DAY))
    }

    async fn get_default_window_days(&self) -> Result<i64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::DEFAULT_WINDOW_DAYS, "7")?;
        Ok(value.parse::<i64>().unwrap_or(defaults::DEFAULT_WINDOW_DAYS))
    }

    async fn get_kpi_top_n(&self) -> Result<usize, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::KPI_TOP_N, "5")?;
        Ok(value.parse::<usize>().unwrap_or(defaults::KPI_TOP_N))
    }

    async fn get_kpi_upcoming_limit(&self) -> Result<usize, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::KPI_UPCOMING_LIMIT, "5")?;
        Ok(value.parse::<usize>().unwrap_or(defaults::KPI_UPCOMING_LIMIT))
    }
}

// ==========================================
// Config keys
// ==========================================
pub mod config_keys {
    // Generation
    pub const INVIGILATORS_PER_EXAM: &str = "planning.invigilators_per_exam";
    pub const INVIGILATOR_MAX_PER_DAY: &str = "planning.invigilator_max_per_day";
    pub const DEFAULT_WINDOW_DAYS: &str = "planning.default_window_days";

    // KPI display
    pub const KPI_TOP_N: &str = "kpi.top_n";
    pub const KPI_UPCOMING_LIMIT: &str = "kpi.upcoming_limit";
}

// ==========================================
// Compiled defaults
// ==========================================
pub mod defaults {
    pub const INVIGILATORS_PER_EXAM: u32 = 1;
    pub const INVIGILATOR_MAX_PER_DAY: u32 = 3;
    pub const DEFAULT_WINDOW_DAYS: i64 = 7;
    pub const KPI_TOP_N: usize = 5;
    pub const KPI_UPCOMING_LIMIT: usize = 5;
}
