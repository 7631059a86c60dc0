// ==========================================
// Exam Planner - Conflict Read Model
// ==========================================

use crate::domain::planning::AssignmentItem;
use crate::domain::types::{ConflictKind, ConflictSeverity};
use serde::{Deserialize, Serialize};

// ==========================================
// ConflictItemRef
// ==========================================
// Just enough of an item to render a conflict row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictItemRef {
    pub item_id: String,        // offending item
    pub module_id: String,      // examined module
    pub expected_students: u32, // attendance snapshot
}

impl ConflictItemRef {
    pub fn from_item(item: &AssignmentItem) -> Self {
        Self {
            item_id: item.item_id.clone(),
            module_id: item.module_id.clone(),
            expected_students: item.expected_students,
        }
    }
}

// ==========================================
// Conflict
// ==========================================
// One detected violation. Collisions group every item claiming
// the same (room, slot) pair into a single entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Conflict {
    RoomCollision {
        room_id: String,
        slot_id: String,
        items: Vec<ConflictItemRef>,
    },
    CapacityExceeded {
        item: ConflictItemRef,
        room_id: String,
        capacity: u32,
    },
}

impl Conflict {
    pub fn kind(&self) -> ConflictKind {
        match self {
            Conflict::RoomCollision { .. } => ConflictKind::RoomCollision,
            Conflict::CapacityExceeded { .. } => ConflictKind::CapacityExceeded,
        }
    }

    pub fn severity(&self) -> ConflictSeverity {
        match self {
            Conflict::RoomCollision { .. } => ConflictSeverity::Critical,
            Conflict::CapacityExceeded { .. } => ConflictSeverity::High,
        }
    }
}

// ==========================================
// ConflictTotals
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictTotals {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
}

impl ConflictTotals {
    pub fn add(&mut self, severity: ConflictSeverity) {
        match severity {
            ConflictSeverity::Critical => self.critical += 1,
            ConflictSeverity::High => self.high += 1,
            ConflictSeverity::Medium => self.medium += 1,
        }
    }
}

// ==========================================
// ConflictReport
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictReport {
    pub run_id: String,
    pub conflicts: Vec<Conflict>,
    pub totals: ConflictTotals,
}
