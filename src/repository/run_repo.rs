// ==========================================
// Exam Planner - Planning Run Repository
// ==========================================
// Manages the planning_run and assignment_item tables. Runs carry
// the whole workflow trace (submission, decision, publication) in
// one row; items are immutable placement snapshots per run.
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::planning::{AssignedInvigilator, AssignmentItem, PlanningRun, RunMetrics};
use crate::domain::types::{AdminStatus, ApprovalStatus, RunScope, RunStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

const RUN_COLUMNS: &str = r#"run_id, scope, scope_id, window_start, window_end,
           status, admin_status, approval_status, published, created_by,
           started_at, ended_at, submitted_at, decided_at, decided_by,
           rejected_at, rejected_by, rejection_reason, published_at, metrics_json"#;

// ==========================================
// PlanningRunRepository
// ==========================================
pub struct PlanningRunRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlanningRunRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_table()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS planning_run (
              run_id TEXT PRIMARY KEY,
              scope TEXT NOT NULL DEFAULT 'GLOBAL',
              scope_id TEXT,
              window_start TEXT,
              window_end TEXT,
              status TEXT NOT NULL DEFAULT 'RUNNING',
              admin_status TEXT NOT NULL DEFAULT 'DRAFT',
              approval_status TEXT NOT NULL DEFAULT 'PENDING',
              published INTEGER NOT NULL DEFAULT 0,
              created_by TEXT NOT NULL,
              started_at TEXT NOT NULL,
              ended_at TEXT,
              submitted_at TEXT,
              decided_at TEXT,
              decided_by TEXT,
              rejected_at TEXT,
              rejected_by TEXT,
              rejection_reason TEXT,
              published_at TEXT,
              metrics_json TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_planning_run_started_at
              ON planning_run(started_at DESC);
            CREATE INDEX IF NOT EXISTS idx_planning_run_published
              ON planning_run(published, ended_at DESC);
            CREATE INDEX IF NOT EXISTS idx_planning_run_approval
              ON planning_run(approval_status);
            "#,
        )?;
        Ok(())
    }

    /// Creates a run row.
    ///
    /// # Returns
    /// - `Ok(run_id)` on success
    pub fn create(&self, run: &PlanningRun) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO planning_run (
                run_id, scope, scope_id, window_start, window_end,
                status, admin_status, approval_status, published, created_by,
                started_at, ended_at, submitted_at, decided_at, decided_by,
                rejected_at, rejected_by, rejection_reason, published_at, metrics_json
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &run.run_id,
                run.scope.to_db_str(),
                &run.scope_id,
                &run.window_start.map(|d| d.format(DATE_FORMAT).to_string()),
                &run.window_end.map(|d| d.format(DATE_FORMAT).to_string()),
                run.status.to_db_str(),
                run.admin_status.to_db_str(),
                run.approval_status.to_db_str(),
                if run.published { 1 } else { 0 },
                &run.created_by,
                &run.started_at.format(TIMESTAMP_FORMAT).to_string(),
                &run.ended_at.map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
                &run.submitted_at.map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
                &run.decided_at.map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
                &run.decided_by,
                &run.rejected_at.map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
                &run.rejected_by,
                &run.rejection_reason,
                &run.published_at.map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
                &metrics_to_json(&run.metrics),
            ],
        )?;

        Ok(run.run_id.clone())
    }

    /// Rewrites every mutable column of an existing run row.
    pub fn update(&self, run: &PlanningRun) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"UPDATE planning_run
               SET scope = ?, scope_id = ?, window_start = ?, window_end = ?,
                   status = ?, admin_status = ?, approval_status = ?,
                   published = ?, ended_at = ?, submitted_at = ?,
                   decided_at = ?, decided_by = ?, rejected_at = ?,
                   rejected_by = ?, rejection_reason = ?, published_at = ?,
                   metrics_json = ?
               WHERE run_id = ?"#,
            params![
                run.scope.to_db_str(),
                &run.scope_id,
                &run.window_start.map(|d| d.format(DATE_FORMAT).to_string()),
                &run.window_end.map(|d| d.format(DATE_FORMAT).to_string()),
                run.status.to_db_str(),
                run.admin_status.to_db_str(),
                run.approval_status.to_db_str(),
                if run.published { 1 } else { 0 },
                &run.ended_at.map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
                &run.submitted_at.map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
                &run.decided_at.map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
                &run.decided_by,
                &run.rejected_at.map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
                &run.rejected_by,
                &run.rejection_reason,
                &run.published_at.map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
                &metrics_to_json(&run.metrics),
                &run.run_id,
            ],
        )?;

        Ok(())
    }

    pub fn find_by_id(&self, run_id: &str) -> RepositoryResult<Option<PlanningRun>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("SELECT {} FROM planning_run WHERE run_id = ?", RUN_COLUMNS),
            params![run_id],
            |row| self.map_row(row),
        ) {
            Ok(run) => Ok(Some(run)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All runs, newest first.
    pub fn list_all(&self) -> RepositoryResult<Vec<PlanningRun>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM planning_run ORDER BY started_at DESC",
            RUN_COLUMNS
        ))?;

        let runs = stmt
            .query_map([], |row| self.map_row(row))?
            .collect::<Result<Vec<PlanningRun>, _>>()?;

        Ok(runs)
    }

    /// Runs submitted and still undecided, newest submission first.
    pub fn list_awaiting_decision(&self) -> RepositoryResult<Vec<PlanningRun>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            r#"SELECT {} FROM planning_run
               WHERE admin_status = 'SUBMITTED' AND approval_status = 'PENDING'
               ORDER BY submitted_at DESC"#,
            RUN_COLUMNS
        ))?;

        let runs = stmt
            .query_map([], |row| self.map_row(row))?
            .collect::<Result<Vec<PlanningRun>, _>>()?;

        Ok(runs)
    }

    pub fn list_by_approval(
        &self,
        status: ApprovalStatus,
    ) -> RepositoryResult<Vec<PlanningRun>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            r#"SELECT {} FROM planning_run
               WHERE approval_status = ?
               ORDER BY started_at DESC"#,
            RUN_COLUMNS
        ))?;

        let runs = stmt
            .query_map(params![status.to_db_str()], |row| self.map_row(row))?
            .collect::<Result<Vec<PlanningRun>, _>>()?;

        Ok(runs)
    }

    /// Most recently finished published run, if any.
    pub fn latest_published(&self) -> RepositoryResult<Option<PlanningRun>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!(
                r#"SELECT {} FROM planning_run
                   WHERE published = 1
                   ORDER BY ended_at DESC
                   LIMIT 1"#,
                RUN_COLUMNS
            ),
            [],
            |row| self.map_row(row),
        ) {
            Ok(run) => Ok(Some(run)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Latest publication, ordered by publication timestamp. This
    /// is the run end users see as "the" planning.
    pub fn most_recently_published(&self) -> RepositoryResult<Option<PlanningRun>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!(
                r#"SELECT {} FROM planning_run
                   WHERE published = 1
                   ORDER BY published_at DESC
                   LIMIT 1"#,
                RUN_COLUMNS
            ),
            [],
            |row| self.map_row(row),
        ) {
            Ok(run) => Ok(Some(run)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Most recently finished DONE run, published or not.
    pub fn latest_done(&self) -> RepositoryResult<Option<PlanningRun>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!(
                r#"SELECT {} FROM planning_run
                   WHERE status = 'DONE'
                   ORDER BY ended_at DESC
                   LIMIT 1"#,
                RUN_COLUMNS
            ),
            [],
            |row| self.map_row(row),
        ) {
            Ok(run) => Ok(Some(run)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn map_row(&self, row: &rusqlite::Row) -> rusqlite::Result<PlanningRun> {
        Ok(PlanningRun {
            run_id: row.get(0)?,
            scope: RunScope::from_str(&row.get::<_, String>(1)?),
            scope_id: row.get(2)?,
            window_start: row
                .get::<_, Option<String>>(3)?
                .and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok()),
            window_end: row
                .get::<_, Option<String>>(4)?
                .and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok()),
            status: RunStatus::from_str(&row.get::<_, String>(5)?),
            admin_status: AdminStatus::from_str(&row.get::<_, String>(6)?),
            approval_status: ApprovalStatus::from_str(&row.get::<_, String>(7)?),
            published: row.get::<_, i64>(8)? != 0,
            created_by: row.get(9)?,
            started_at: parse_timestamp(row, 10)?,
            ended_at: parse_optional_timestamp(row, 11)?,
            submitted_at: parse_optional_timestamp(row, 12)?,
            decided_at: parse_optional_timestamp(row, 13)?,
            decided_by: row.get(14)?,
            rejected_at: parse_optional_timestamp(row, 15)?,
            rejected_by: row.get(16)?,
            rejection_reason: row.get(17)?,
            published_at: parse_optional_timestamp(row, 18)?,
            metrics: row
                .get::<_, Option<String>>(19)?
                .and_then(|s| serde_json::from_str::<RunMetrics>(&s).ok()),
        })
    }
}

// ==========================================
// AssignmentItemRepository
// ==========================================
pub struct AssignmentItemRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AssignmentItemRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_table()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS assignment_item (
              item_id TEXT PRIMARY KEY,
              run_id TEXT NOT NULL,
              module_id TEXT NOT NULL,
              room_id TEXT NOT NULL,
              slot_id TEXT NOT NULL,
              expected_students INTEGER NOT NULL DEFAULT 0,
              invigilators_json TEXT NOT NULL DEFAULT '[]',
              annotation TEXT,
              FOREIGN KEY (run_id) REFERENCES planning_run(run_id) ON DELETE CASCADE,
              UNIQUE(run_id, slot_id, room_id)
            );

            CREATE INDEX IF NOT EXISTS idx_assignment_item_run
              ON assignment_item(run_id);
            "#,
        )?;
        Ok(())
    }

    /// Inserts a whole item batch in one transaction.
    ///
    /// # Returns
    /// - `Ok(count)`: number of rows written
    pub fn batch_insert(&self, items: &[AssignmentItem]) -> RepositoryResult<usize> {
        if items.is_empty() {
            return Ok(0);
        }

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO assignment_item (
                    item_id, run_id, module_id, room_id, slot_id,
                    expected_students, invigilators_json, annotation
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            )?;

            for item in items {
                stmt.execute(params![
                    &item.item_id,
                    &item.run_id,
                    &item.module_id,
                    &item.room_id,
                    &item.slot_id,
                    item.expected_students,
                    &invigilators_to_json(&item.invigilators),
                    &item.annotation,
                ])?;
            }
        }

        tx.commit()?;
        Ok(items.len())
    }

    /// Number of items referencing a room, across every run.
    pub fn count_by_room(&self, room_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM assignment_item WHERE room_id = ?",
            params![room_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Number of items referencing a slot, across every run.
    pub fn count_by_slot(&self, slot_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM assignment_item WHERE slot_id = ?",
            params![slot_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Items of one run, in placement order.
    pub fn find_by_run(&self, run_id: &str) -> RepositoryResult<Vec<AssignmentItem>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT item_id, run_id, module_id, room_id, slot_id,
                      expected_students, invigilators_json, annotation
               FROM assignment_item
               WHERE run_id = ?
               ORDER BY rowid"#,
        )?;

        let items = stmt
            .query_map(params![run_id], |row| self.map_row(row))?
            .collect::<Result<Vec<AssignmentItem>, _>>()?;

        Ok(items)
    }

    fn map_row(&self, row: &rusqlite::Row) -> rusqlite::Result<AssignmentItem> {
        Ok(AssignmentItem {
            item_id: row.get(0)?,
            run_id: row.get(1)?,
            module_id: row.get(2)?,
            room_id: row.get(3)?,
            slot_id: row.get(4)?,
            expected_students: row.get(5)?,
            invigilators: serde_json::from_str::<Vec<AssignedInvigilator>>(
                &row.get::<_, String>(6)?,
            )
            .unwrap_or_default(),
            annotation: row.get(7)?,
        })
    }
}

fn metrics_to_json(metrics: &Option<RunMetrics>) -> Option<String> {
    metrics
        .as_ref()
        .and_then(|m| serde_json::to_string(m).ok())
}

fn invigilators_to_json(invigilators: &[AssignedInvigilator]) -> String {
    serde_json::to_string(invigilators).unwrap_or_else(|_| "[]".to_string())
}

fn parse_timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&row.get::<_, String>(idx)?, TIMESTAMP_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_optional_timestamp(
    row: &rusqlite::Row,
    idx: usize,
) -> rusqlite::Result<Option<NaiveDateTime>> {
    Ok(row
        .get::<_, Option<String>>(idx)?
        .and_then(|s| NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).ok()))
}
