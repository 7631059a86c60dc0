// ==========================================
// Exam Planner - KPI Read Models
// ==========================================
// Pure read-side shapes. The base block is computed once over a
// run's items; role projections narrow or reshape it without
// touching storage.
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// Per-day rollups
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayCount {
    pub date: NaiveDate, // calendar day
    pub count: u32,      // exams that day
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayFillRate {
    pub date: NaiveDate, // calendar day
    pub fill_rate: f64,  // mean expected/capacity over that day's items
}

// ==========================================
// Top-N display rows
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverCapacityEntry {
    pub module: String,    // module name
    pub program: String,   // program name
    pub room: String,      // room name
    pub date: NaiveDate,   // slot date
    pub slot: String,      // slot label
    pub expected: u32,     // attendance snapshot
    pub capacity: u32,     // resolved room capacity
    pub diff: i64,         // expected - capacity, always > 0 here
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderUsedEntry {
    pub module: String,  // module name
    pub program: String, // program name
    pub room: String,    // room name
    pub date: NaiveDate, // slot date
    pub slot: String,    // slot label
    pub fill_rate: f64,  // expected/capacity for this item
}

// ==========================================
// KpiBase
// ==========================================
// The full aggregate over one run's items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiBase {
    pub exams_count: u32,                       // items in the run
    pub days_covered: u32,                      // distinct slot dates
    pub slots_used: u32,                        // distinct slots
    pub rooms_used: u32,                        // distinct rooms
    pub avg_room_fill_rate: f64,                // mean fill over items with capacity > 0
    pub capacity_exceeded_count: u32,           // items over positive capacity
    pub room_collision_count: u32,              // sum of (occurrences - 1) per shared pair
    pub exams_per_day: Vec<DayCount>,           // ascending by date
    pub occupancy_per_day: Vec<DayFillRate>,    // ascending by date
    pub top_over_capacity: Vec<OverCapacityEntry>, // worst 5, diff descending
    pub top_underused_rooms: Vec<UnderUsedEntry>,  // emptiest 5, fill ascending
    pub rooms_used_ratio: Option<f64>,          // rooms_used / total rooms, None if unknown
}

// ==========================================
// Department / program rollups
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentLoad {
    pub department_id: String,        // department
    pub department_name: String,      // display name
    pub exams_count: u32,             // items owned by the department's programs
    pub capacity_exceeded_count: u32, // over-capacity items among them
    pub avg_room_fill_rate: f64,      // mean fill, 0 when no measurable item
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentConflicts {
    pub department_id: String,        // department
    pub department_name: String,      // display name
    pub capacity_exceeded_count: u32, // over-capacity items
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramLoad {
    pub program_id: String,   // program
    pub program_name: String, // display name
    pub exams_count: u32,     // items owned by the program
}

// ==========================================
// UpcomingExam
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingExam {
    pub module: String,  // module name
    pub program: String, // program name
    pub date: NaiveDate, // slot date
    pub slot: String,    // slot label
    pub room: String,    // room name
}

// ==========================================
// KpiView
// ==========================================
// One variant per caller role, produced by a single dispatch
// function. Staff variants carry the generation duration taken
// from the run (snapshot first, ended-started as fallback).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KpiView {
    ExamAdmin {
        #[serde(flatten)]
        base: KpiBase,
        generation_duration_ms: Option<u64>,
    },
    Dean {
        exams_count: u32,
        avg_room_fill_rate: f64,
        capacity_exceeded_count: u32,
        room_collision_count: u32,
        rooms_used_ratio: Option<f64>,
        occupancy_by_department: Vec<DepartmentLoad>,
        conflicts_by_department: Vec<DepartmentConflicts>,
        generation_duration_ms: Option<u64>,
    },
    DeptHead {
        #[serde(flatten)]
        base: KpiBase,
        most_loaded_programs: Vec<ProgramLoad>,
        generation_duration_ms: Option<u64>,
    },
    Professor {
        surveillances_count: u32,
        upcoming_exams: Vec<UpcomingExam>,
        todo: String,
    },
    Student {
        exams_count: u32,
        upcoming_exams: Vec<UpcomingExam>,
        exams_per_day: Vec<DayCount>,
    },
}
