// ==========================================
// Exam Planner - Reference Data Importer
// ==========================================
// CSV import for rooms, slots and invigilators. Each file is
// validated row by row; valid rows are upserted, invalid rows are
// reported with their line number and skipped. A row error never
// aborts the file.
// ==========================================

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::info;
use uuid::Uuid;

use crate::domain::resources::{Invigilator, Room, Slot};
use crate::domain::types::RoomKind;
use crate::importer::csv_file::{CsvFile, CsvRow};
use crate::importer::error::ImportResult;
use crate::importer::report::{ImportSummary, RowError};
use crate::repository::reference_repo::ReferenceRepository;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

// ==========================================
// ReferenceImporter
// ==========================================
pub struct ReferenceImporter {
    reference_repo: Arc<ReferenceRepository>,
}

impl ReferenceImporter {
    pub fn new(reference_repo: Arc<ReferenceRepository>) -> Self {
        Self { reference_repo }
    }

    /// Imports rooms from a CSV file.
    ///
    /// # Columns
    /// - `name` (required)
    /// - `room_id` (generated when empty)
    /// - `building`
    /// - `kind`: STANDARD/SALLE or LARGE_HALL/AMPHI
    /// - `normal_capacity`, `exam_capacity`: positive integers
    pub fn import_rooms(&self, path: &str) -> ImportResult<ImportSummary> {
        let file = CsvFile::open(path)?;
        file.require_columns(&["name"])?;

        let mut errors = Vec::new();
        let mut rooms = Vec::new();
        for row in &file.rows {
            match parse_room_row(row) {
                Ok(room) => rooms.push(room),
                Err(mut row_errors) => errors.append(&mut row_errors),
            }
        }

        for room in &rooms {
            self.reference_repo.upsert_room(room)?;
        }

        let summary = ImportSummary::new(path, file.rows.len(), rooms.len(), errors);
        info!(
            file = %summary.file,
            inserted = summary.inserted,
            rejected = summary.rejected,
            "rooms imported"
        );
        Ok(summary)
    }

    /// Imports exam slots from a CSV file.
    ///
    /// # Columns
    /// - `date` (required, YYYY-MM-DD)
    /// - `start_time`, `end_time` (required, HH:MM, end after start)
    /// - `slot_id` (generated when empty)
    pub fn import_slots(&self, path: &str) -> ImportResult<ImportSummary> {
        let file = CsvFile::open(path)?;
        file.require_columns(&["date", "start_time", "end_time"])?;

        let mut errors = Vec::new();
        let mut slots = Vec::new();
        for row in &file.rows {
            match parse_slot_row(row) {
                Ok(slot) => slots.push(slot),
                Err(mut row_errors) => errors.append(&mut row_errors),
            }
        }

        for slot in &slots {
            self.reference_repo.upsert_slot(slot)?;
        }

        let summary = ImportSummary::new(path, file.rows.len(), slots.len(), errors);
        info!(
            file = %summary.file,
            inserted = summary.inserted,
            rejected = summary.rejected,
            "slots imported"
        );
        Ok(summary)
    }

    /// Imports invigilators from a CSV file.
    ///
    /// # Columns
    /// - `full_name` (required)
    /// - `invigilator_id` (generated when empty)
    /// - `department_id`
    pub fn import_invigilators(&self, path: &str) -> ImportResult<ImportSummary> {
        let file = CsvFile::open(path)?;
        file.require_columns(&["full_name"])?;

        let mut errors = Vec::new();
        let mut invigilators = Vec::new();
        for row in &file.rows {
            match parse_invigilator_row(row) {
                Ok(invigilator) => invigilators.push(invigilator),
                Err(mut row_errors) => errors.append(&mut row_errors),
            }
        }

        for invigilator in &invigilators {
            self.reference_repo.upsert_invigilator(invigilator)?;
        }

        let summary = ImportSummary::new(path, file.rows.len(), invigilators.len(), errors);
        info!(
            file = %summary.file,
            inserted = summary.inserted,
            rejected = summary.rejected,
            "invigilators imported"
        );
        Ok(summary)
    }
}

// ==========================================
// Row parsers
// ==========================================

fn parse_room_row(row: &CsvRow) -> Result<Room, Vec<RowError>> {
    let mut errors = Vec::new();

    let name = row.require("name", &mut errors);

    let kind = match row.get("kind") {
        None => RoomKind::Standard,
        Some(value) => match RoomKind::parse(value) {
            Some(kind) => kind,
            None => {
                errors.push(RowError::new(
                    row.line,
                    "kind",
                    format!("type de salle inconnu: {}", value),
                ));
                RoomKind::Standard
            }
        },
    };

    let normal_capacity = parse_capacity(row, "normal_capacity", &mut errors);
    let exam_capacity = parse_capacity(row, "exam_capacity", &mut errors);

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(Room {
        room_id: generated_id(row.get("room_id")),
        name,
        building: row.get("building").unwrap_or_default().to_string(),
        kind,
        normal_capacity,
        exam_capacity,
    })
}

fn parse_slot_row(row: &CsvRow) -> Result<Slot, Vec<RowError>> {
    let mut errors = Vec::new();

    let date = parse_date(row, "date", &mut errors);
    let start_time = parse_time(row, "start_time", &mut errors);
    let end_time = parse_time(row, "end_time", &mut errors);

    if let (Some(start), Some(end)) = (start_time, end_time) {
        if end <= start {
            errors.push(RowError::new(
                row.line,
                "end_time",
                "heure de fin avant heure de début".to_string(),
            ));
        }
    }

    match (date, start_time, end_time) {
        (Some(date), Some(start_time), Some(end_time)) if errors.is_empty() => Ok(Slot {
            slot_id: generated_id(row.get("slot_id")),
            date,
            start_time,
            end_time,
        }),
        _ => Err(errors),
    }
}

fn parse_invigilator_row(row: &CsvRow) -> Result<Invigilator, Vec<RowError>> {
    let mut errors = Vec::new();

    let full_name = row.require("full_name", &mut errors);

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(Invigilator {
        invigilator_id: generated_id(row.get("invigilator_id")),
        full_name,
        department_id: row.get("department_id").map(str::to_string),
    })
}

// ==========================================
// Cell parsers
// ==========================================

fn parse_capacity(row: &CsvRow, field: &str, errors: &mut Vec<RowError>) -> Option<u32> {
    let value = row.get(field)?;
    match value.parse::<u32>() {
        Ok(0) => {
            errors.push(RowError::new(
                row.line,
                field,
                format!("capacité non positive: {}", value),
            ));
            None
        }
        Ok(capacity) => Some(capacity),
        Err(_) => {
            errors.push(RowError::new(
                row.line,
                field,
                format!("capacité invalide: {}", value),
            ));
            None
        }
    }
}

fn parse_date(row: &CsvRow, field: &str, errors: &mut Vec<RowError>) -> Option<NaiveDate> {
    let value = match row.get(field) {
        Some(value) => value,
        None => {
            errors.push(RowError::new(row.line, field, "champ requis".to_string()));
            return None;
        }
    };
    match NaiveDate::parse_from_str(value, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(RowError::new(
                row.line,
                field,
                format!("date invalide: {}", value),
            ));
            None
        }
    }
}

fn parse_time(row: &CsvRow, field: &str, errors: &mut Vec<RowError>) -> Option<NaiveTime> {
    let value = match row.get(field) {
        Some(value) => value,
        None => {
            errors.push(RowError::new(row.line, field, "champ requis".to_string()));
            return None;
        }
    };
    match NaiveTime::parse_from_str(value, TIME_FORMAT) {
        Ok(time) => Some(time),
        Err(_) => {
            errors.push(RowError::new(
                row.line,
                field,
                format!("heure invalide: {}", value),
            ));
            None
        }
    }
}

fn generated_id(cell: Option<&str>) -> String {
    cell.map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

// ==========================================
// Tests
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use std::io::Write;
    use std::sync::Mutex;

    fn create_test_importer() -> ReferenceImporter {
        let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let repo = Arc::new(ReferenceRepository::from_connection(conn).unwrap());
        ReferenceImporter::new(repo)
    }

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_import_rooms_upserts_valid_rows() {
        let importer = create_test_importer();
        let file = write_csv(
            "room_id,name,building,kind,normal_capacity,exam_capacity\n\
             R1,Salle-1,B1,salle,40,30\n\
             R2,Amphi A,B2,amphi,200,\n",
        );

        let summary = importer
            .import_rooms(file.path().to_str().unwrap())
            .unwrap();
        assert_eq!(summary.total_rows, 2);
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.rejected, 0);
        assert!(summary.errors.is_empty());

        let rooms = importer.reference_repo.list_rooms().unwrap();
        assert_eq!(rooms.len(), 2);
        let amphi = rooms.iter().find(|r| r.room_id == "R2").unwrap();
        assert_eq!(amphi.kind, RoomKind::LargeHall);
        assert_eq!(amphi.exam_capacity, None);
    }

    #[test]
    fn test_import_rooms_rejects_bad_rows_with_line_numbers() {
        let importer = create_test_importer();
        let file = write_csv(
            "name,kind,normal_capacity\n\
             Salle-1,salle,40\n\
             ,salle,40\n\
             Salle-3,igloo,0\n",
        );

        let summary = importer
            .import_rooms(file.path().to_str().unwrap())
            .unwrap();
        assert_eq!(summary.total_rows, 3);
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.rejected, 2);

        let lines: Vec<usize> = summary.errors.iter().map(|e| e.line).collect();
        assert!(lines.contains(&3)); // missing name
        assert!(lines.contains(&4)); // unknown kind + zero capacity
        assert_eq!(
            summary.errors.iter().filter(|e| e.line == 4).count(),
            2
        );
    }

    #[test]
    fn test_import_rooms_missing_required_column() {
        let importer = create_test_importer();
        let file = write_csv("building,kind\nB1,salle\n");

        let result = importer.import_rooms(file.path().to_str().unwrap());
        assert!(matches!(
            result,
            Err(crate::importer::error::ImportError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_import_slots_validates_times() {
        let importer = create_test_importer();
        let file = write_csv(
            "slot_id,date,start_time,end_time\n\
             S1,2026-01-05,08:00,10:00\n\
             S2,2026-01-05,10:00,09:00\n\
             S3,not-a-date,08:00,10:00\n",
        );

        let summary = importer
            .import_slots(file.path().to_str().unwrap())
            .unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.rejected, 2);

        let slots = importer.reference_repo.list_slots().unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].slot_id, "S1");
    }

    #[test]
    fn test_import_invigilators_generates_missing_ids() {
        let importer = create_test_importer();
        let file = write_csv(
            "invigilator_id,full_name,department_id\n\
             ,Marie Martin,D1\n\
             P2,Jean Dupont,\n",
        );

        let summary = importer
            .import_invigilators(file.path().to_str().unwrap())
            .unwrap();
        assert_eq!(summary.inserted, 2);

        let invigilators = importer.reference_repo.list_invigilators().unwrap();
        assert_eq!(invigilators.len(), 2);
        assert!(invigilators.iter().all(|i| !i.invigilator_id.is_empty()));
        let p2 = invigilators
            .iter()
            .find(|i| i.invigilator_id == "P2")
            .unwrap();
        assert_eq!(p2.department_id, None);
    }
}
