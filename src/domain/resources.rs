// ==========================================
// Exam Planner - Reference Data Entities
// ==========================================
// Rooms, slots, invigilators and the academic catalog are
// externally managed, long-lived inputs. The engine never
// mutates them; it only reads them at the start of a run.
// ==========================================

use crate::domain::planning::AssignedInvigilator;
use crate::domain::types::{Role, RoomKind};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Department
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub department_id: String, // department ID
    pub name: String,          // display name
    pub location: String,      // building / campus site
}

// ==========================================
// Program (formation)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub program_id: String,    // program ID
    pub name: String,          // display name
    pub level: String,         // cycle code (L/M/D)
    pub department_id: String, // owning department
}

// ==========================================
// ExamModule
// ==========================================
// One module sits one exam per session. Expected attendance is
// derived from enrollment at run time, never stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamModule {
    pub module_id: String,  // module ID
    pub name: String,       // display name
    pub program_id: String, // owning program
}

// ==========================================
// Enrollment
// ==========================================
// Only the (student, module) pairing matters to the planner;
// student identity is never joined back in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub student_id: String, // enrolled student
    pub module_id: String,  // target module
}

// ==========================================
// Room
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub room_id: String,            // room ID
    pub name: String,               // display name (e.g. "B-204", "Amphi A")
    pub building: String,           // building name
    pub kind: RoomKind,             // STANDARD / LARGE_HALL
    pub normal_capacity: Option<u32>, // seating capacity in normal layout
    pub exam_capacity: Option<u32>,   // reduced capacity in exam layout
}

impl Room {
    /// Effective capacity used for exam placement.
    ///
    /// Precedence: exam capacity, else normal capacity, else 0.
    /// Every capacity read in the crate goes through here so the
    /// precedence rule lives in exactly one place.
    pub fn resolved_exam_capacity(&self) -> u32 {
        self.exam_capacity.or(self.normal_capacity).unwrap_or(0)
    }
}

// ==========================================
// Slot
// ==========================================
// Slots order by (date, start time); that ordering drives both
// the allocation cursor and every calendar-facing listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub slot_id: String,      // slot ID
    pub date: NaiveDate,      // calendar date
    pub start_time: NaiveTime, // window start
    pub end_time: NaiveTime,   // window end
}

impl Slot {
    /// Chronological sort key.
    pub fn sort_key(&self) -> (NaiveDate, NaiveTime) {
        (self.date, self.start_time)
    }

    /// Display label, e.g. "08:00-10:00".
    pub fn label(&self) -> String {
        format!(
            "{}-{}",
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }
}

// ==========================================
// Invigilator
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invigilator {
    pub invigilator_id: String,        // staff ID
    pub full_name: String,             // display name
    pub department_id: Option<String>, // owning department, if attached to one
}

impl Invigilator {
    /// Snapshot stored on an assignment item roster.
    pub fn as_assigned(&self) -> AssignedInvigilator {
        AssignedInvigilator {
            invigilator_id: self.invigilator_id.clone(),
            full_name: self.full_name.clone(),
        }
    }
}

// ==========================================
// RoleContext
// ==========================================
// Caller identity as resolved by the surrounding service. Scope
// ids are optional because staff roles carry neither.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleContext {
    pub user_id: String,               // caller ID
    pub role: Role,                    // resolved role
    pub department_id: Option<String>, // department scope (professor, dept head)
    pub program_id: Option<String>,    // program scope (student)
}

impl RoleContext {
    pub fn new(user_id: &str, role: Role) -> Self {
        Self {
            user_id: user_id.to_string(),
            role,
            department_id: None,
            program_id: None,
        }
    }

    pub fn with_department(mut self, department_id: &str) -> Self {
        self.department_id = Some(department_id.to_string());
        self
    }

    pub fn with_program(mut self, program_id: &str) -> Self {
        self.program_id = Some(program_id.to_string());
        self
    }
}

// ==========================================
// Tests
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn room_with_capacities(normal: Option<u32>, exam: Option<u32>) -> Room {
        Room {
            room_id: "R1".to_string(),
            name: "B-101".to_string(),
            building: "B".to_string(),
            kind: RoomKind::Standard,
            normal_capacity: normal,
            exam_capacity: exam,
        }
    }

    #[test]
    fn test_resolved_capacity_prefers_exam_capacity() {
        let room = room_with_capacities(Some(60), Some(40));
        assert_eq!(room.resolved_exam_capacity(), 40);
    }

    #[test]
    fn test_resolved_capacity_falls_back_to_normal() {
        let room = room_with_capacities(Some(60), None);
        assert_eq!(room.resolved_exam_capacity(), 60);
    }

    #[test]
    fn test_resolved_capacity_defaults_to_zero() {
        let room = room_with_capacities(None, None);
        assert_eq!(room.resolved_exam_capacity(), 0);
    }

    #[test]
    fn test_slot_ordering_by_date_then_start() {
        let morning = Slot {
            slot_id: "S1".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        };
        let afternoon = Slot {
            slot_id: "S2".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        };
        let next_day = Slot {
            slot_id: "S3".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        };

        assert!(morning.sort_key() < afternoon.sort_key());
        assert!(afternoon.sort_key() < next_day.sort_key());
        assert_eq!(morning.label(), "08:00-10:00");
    }
}
