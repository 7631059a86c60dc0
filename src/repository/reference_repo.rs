// ==========================================
// Exam Planner - Resource Reference Repository
// ==========================================
// Manages the room, slot and invigilator tables. These are the
// physical pools the generator draws from; imports upsert by
// natural key so re-running a file never duplicates rows.
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::resources::{Invigilator, Room, Slot};
use crate::domain::types::RoomKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

pub struct ReferenceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReferenceRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_tables()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_tables(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS room (
              room_id TEXT PRIMARY KEY,
              name TEXT NOT NULL,
              building TEXT NOT NULL,
              kind TEXT NOT NULL DEFAULT 'STANDARD',
              normal_capacity INTEGER,
              exam_capacity INTEGER
            );

            CREATE TABLE IF NOT EXISTS slot (
              slot_id TEXT PRIMARY KEY,
              date TEXT NOT NULL,
              start_time TEXT NOT NULL,
              end_time TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS invigilator (
              invigilator_id TEXT PRIMARY KEY,
              full_name TEXT NOT NULL,
              department_id TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_slot_date
              ON slot(date, start_time);
            CREATE INDEX IF NOT EXISTS idx_invigilator_department
              ON invigilator(department_id);
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // Rooms
    // ==========================================

    pub fn upsert_room(&self, room: &Room) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO room (
                room_id, name, building, kind, normal_capacity, exam_capacity
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(room_id) DO UPDATE SET
                name = excluded.name,
                building = excluded.building,
                kind = excluded.kind,
                normal_capacity = excluded.normal_capacity,
                exam_capacity = excluded.exam_capacity"#,
            params![
                &room.room_id,
                &room.name,
                &room.building,
                room.kind.to_db_str(),
                &room.normal_capacity,
                &room.exam_capacity,
            ],
        )?;
        Ok(())
    }

    pub fn list_rooms(&self) -> RepositoryResult<Vec<Room>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT room_id, name, building, kind, normal_capacity, exam_capacity
               FROM room
               ORDER BY name"#,
        )?;

        let rooms = stmt
            .query_map([], |row| map_room(row))?
            .collect::<Result<Vec<Room>, _>>()?;

        Ok(rooms)
    }

    pub fn find_room(&self, room_id: &str) -> RepositoryResult<Option<Room>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT room_id, name, building, kind, normal_capacity, exam_capacity
               FROM room
               WHERE room_id = ?"#,
            params![room_id],
            |row| map_room(row),
        ) {
            Ok(room) => Ok(Some(room)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn delete_room(&self, room_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM room WHERE room_id = ?", params![room_id])?;
        Ok(())
    }

    // ==========================================
    // Slots
    // ==========================================

    pub fn upsert_slot(&self, slot: &Slot) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO slot (slot_id, date, start_time, end_time)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(slot_id) DO UPDATE SET
                date = excluded.date,
                start_time = excluded.start_time,
                end_time = excluded.end_time"#,
            params![
                &slot.slot_id,
                &slot.date.format(DATE_FORMAT).to_string(),
                &slot.start_time.format(TIME_FORMAT).to_string(),
                &slot.end_time.format(TIME_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// All slots in chronological order.
    pub fn list_slots(&self) -> RepositoryResult<Vec<Slot>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT slot_id, date, start_time, end_time
               FROM slot
               ORDER BY date, start_time"#,
        )?;

        let slots = stmt
            .query_map([], |row| map_slot(row))?
            .collect::<Result<Vec<Slot>, _>>()?;

        Ok(slots)
    }

    pub fn find_slot(&self, slot_id: &str) -> RepositoryResult<Option<Slot>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT slot_id, date, start_time, end_time
               FROM slot
               WHERE slot_id = ?"#,
            params![slot_id],
            |row| map_slot(row),
        ) {
            Ok(slot) => Ok(Some(slot)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn delete_slot(&self, slot_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM slot WHERE slot_id = ?", params![slot_id])?;
        Ok(())
    }

    // ==========================================
    // Invigilators
    // ==========================================

    pub fn upsert_invigilator(&self, invigilator: &Invigilator) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO invigilator (invigilator_id, full_name, department_id)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(invigilator_id) DO UPDATE SET
                full_name = excluded.full_name,
                department_id = excluded.department_id"#,
            params![
                &invigilator.invigilator_id,
                &invigilator.full_name,
                &invigilator.department_id,
            ],
        )?;
        Ok(())
    }

    pub fn list_invigilators(&self) -> RepositoryResult<Vec<Invigilator>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT invigilator_id, full_name, department_id
               FROM invigilator
               ORDER BY full_name"#,
        )?;

        let invigilators = stmt
            .query_map([], |row| map_invigilator(row))?
            .collect::<Result<Vec<Invigilator>, _>>()?;

        Ok(invigilators)
    }
}

fn map_room(row: &rusqlite::Row) -> rusqlite::Result<Room> {
    Ok(Room {
        room_id: row.get(0)?,
        name: row.get(1)?,
        building: row.get(2)?,
        kind: RoomKind::from_str(&row.get::<_, String>(3)?),
        normal_capacity: row.get(4)?,
        exam_capacity: row.get(5)?,
    })
}

fn map_slot(row: &rusqlite::Row) -> rusqlite::Result<Slot> {
    Ok(Slot {
        slot_id: row.get(0)?,
        date: parse_date(row, 1)?,
        start_time: parse_time(row, 2)?,
        end_time: parse_time(row, 3)?,
    })
}

fn map_invigilator(row: &rusqlite::Row) -> rusqlite::Result<Invigilator> {
    Ok(Invigilator {
        invigilator_id: row.get(0)?,
        full_name: row.get(1)?,
        department_id: row.get(2)?,
    })
}

fn parse_date(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&row.get::<_, String>(idx)?, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_time(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveTime> {
    NaiveTime::parse_from_str(&row.get::<_, String>(idx)?, TIME_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
