// ==========================================
// Exam Planner - Domain Type Definitions
// ==========================================
// Status enums are stored as SCREAMING_SNAKE_CASE strings,
// matching the database encoding exactly.
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Run Lifecycle Status
// ==========================================
// A run is RUNNING while the engine works, DONE once its
// item batch and metrics snapshot are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running, // generation in progress
    Done,    // batch persisted, metrics recorded
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Running => write!(f, "RUNNING"),
            RunStatus::Done => write!(f, "DONE"),
        }
    }
}

impl RunStatus {
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "DONE" => RunStatus::Done,
            _ => RunStatus::Running,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "RUNNING",
            RunStatus::Done => "DONE",
        }
    }
}

// ==========================================
// Admin-side Workflow Status
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminStatus {
    Draft,     // not yet handed to the dean
    Submitted, // waiting for (or past) the dean's decision
}

impl fmt::Display for AdminStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminStatus::Draft => write!(f, "DRAFT"),
            AdminStatus::Submitted => write!(f, "SUBMITTED"),
        }
    }
}

impl AdminStatus {
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "SUBMITTED" => AdminStatus::Submitted,
            _ => AdminStatus::Draft,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            AdminStatus::Draft => "DRAFT",
            AdminStatus::Submitted => "SUBMITTED",
        }
    }
}

// ==========================================
// Dean-side Approval Status
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,  // submitted, undecided
    Approved, // cleared for publication
    Rejected, // returned with a reason
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalStatus::Pending => write!(f, "PENDING"),
            ApprovalStatus::Approved => write!(f, "APPROVED"),
            ApprovalStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

impl ApprovalStatus {
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "APPROVED" => ApprovalStatus::Approved,
            "REJECTED" => ApprovalStatus::Rejected,
            _ => ApprovalStatus::Pending,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "PENDING",
            ApprovalStatus::Approved => "APPROVED",
            ApprovalStatus::Rejected => "REJECTED",
        }
    }
}

// ==========================================
// Run Scope
// ==========================================
// GLOBAL covers every program; DEPARTMENT and PROGRAM narrow the
// module set, with the target id carried next to the scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunScope {
    Global,
    Department,
    Program,
}

impl fmt::Display for RunScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunScope::Global => write!(f, "GLOBAL"),
            RunScope::Department => write!(f, "DEPARTMENT"),
            RunScope::Program => write!(f, "PROGRAM"),
        }
    }
}

impl RunScope {
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "DEPARTMENT" => RunScope::Department,
            "PROGRAM" => RunScope::Program,
            _ => RunScope::Global,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            RunScope::Global => "GLOBAL",
            RunScope::Department => "DEPARTMENT",
            RunScope::Program => "PROGRAM",
        }
    }
}

// ==========================================
// Room Kind
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomKind {
    Standard,  // ordinary teaching room
    LargeHall, // amphitheater
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomKind::Standard => write!(f, "STANDARD"),
            RoomKind::LargeHall => write!(f, "LARGE_HALL"),
        }
    }
}

impl RoomKind {
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "LARGE_HALL" | "AMPHI" => RoomKind::LargeHall,
            _ => RoomKind::Standard,
        }
    }

    /// Strict variant for external input. `from_str` stays lenient
    /// for values this crate already persisted.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "STANDARD" | "SALLE" => Some(RoomKind::Standard),
            "LARGE_HALL" | "AMPHI" => Some(RoomKind::LargeHall),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            RoomKind::Standard => "STANDARD",
            RoomKind::LargeHall => "LARGE_HALL",
        }
    }
}

// ==========================================
// Conflict Severity
// ==========================================
// Order: Medium < High < Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictSeverity {
    Medium,
    High,
    Critical,
}

impl fmt::Display for ConflictSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictSeverity::Medium => write!(f, "MEDIUM"),
            ConflictSeverity::High => write!(f, "HIGH"),
            ConflictSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

// ==========================================
// Conflict Kind
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    RoomCollision,    // same (room, slot) claimed more than once
    CapacityExceeded, // expected attendance above resolved capacity
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::RoomCollision => write!(f, "ROOM_COLLISION"),
            ConflictKind::CapacityExceeded => write!(f, "CAPACITY_EXCEEDED"),
        }
    }
}

// ==========================================
// Caller Role
// ==========================================
// Selects the KPI projection and the published-planning filter.
// The crate performs no authentication; the role arrives resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Student,
    Professor,
    ExamAdmin,
    DeptHead,
    Dean,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => write!(f, "STUDENT"),
            Role::Professor => write!(f, "PROFESSOR"),
            Role::ExamAdmin => write!(f, "EXAM_ADMIN"),
            Role::DeptHead => write!(f, "DEPT_HEAD"),
            Role::Dean => write!(f, "DEAN"),
        }
    }
}

impl Role {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "STUDENT" => Some(Role::Student),
            "PROFESSOR" => Some(Role::Professor),
            "EXAM_ADMIN" => Some(Role::ExamAdmin),
            "DEPT_HEAD" => Some(Role::DeptHead),
            "DEAN" => Some(Role::Dean),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Professor => "PROFESSOR",
            Role::ExamAdmin => "EXAM_ADMIN",
            Role::DeptHead => "DEPT_HEAD",
            Role::Dean => "DEAN",
        }
    }
}
