// ==========================================
// Exam Planner - Planning Run Domain Model
// ==========================================
// A run owns its assignment items 1:N. Items are written once,
// as a single batch, and never mutated afterwards; corrections
// go through a fresh run.
// ==========================================

use crate::domain::types::{AdminStatus, ApprovalStatus, RunScope, RunStatus};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// Annotation values are fixed machine strings; display text is
// localized at the view layer, never in stored data.
pub const NOTE_CAPACITY_EXCEEDED: &str = "capacity_exceeded";
pub const NOTE_INVIGILATOR_MISSING: &str = "invigilator_missing";

// ==========================================
// PlanningRun
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningRun {
    pub run_id: String,                    // run ID
    pub scope: RunScope,                   // GLOBAL / DEPARTMENT / PROGRAM
    pub scope_id: Option<String>,          // department or program id when narrowed
    pub window_start: Option<NaiveDate>,   // inclusive window start
    pub window_end: Option<NaiveDate>,     // inclusive window end
    pub status: RunStatus,                 // RUNNING / DONE
    pub admin_status: AdminStatus,         // DRAFT / SUBMITTED
    pub approval_status: ApprovalStatus,   // PENDING / APPROVED / REJECTED
    pub published: bool,                   // visible to end users
    pub created_by: String,                // admin who launched the run
    pub started_at: NaiveDateTime,         // creation timestamp
    pub ended_at: Option<NaiveDateTime>,   // generation finish timestamp

    // ===== Workflow timestamps and actors =====
    pub submitted_at: Option<NaiveDateTime>, // last submission
    pub decided_at: Option<NaiveDateTime>,   // dean approval timestamp
    pub decided_by: Option<String>,          // dean who approved
    pub rejected_at: Option<NaiveDateTime>,  // dean rejection timestamp
    pub rejected_by: Option<String>,         // dean who rejected
    pub rejection_reason: Option<String>,    // mandatory on rejection
    pub published_at: Option<NaiveDateTime>, // publication timestamp

    pub metrics: Option<RunMetrics>, // snapshot computed at generation time
}

impl PlanningRun {
    /// Fresh run row, created before generation starts so a crash
    /// mid-generation leaves a visible `RUNNING` trace.
    pub fn new_running(
        run_id: &str,
        scope: RunScope,
        scope_id: Option<String>,
        window_start: Option<NaiveDate>,
        window_end: Option<NaiveDate>,
        created_by: &str,
    ) -> Self {
        Self {
            run_id: run_id.to_string(),
            scope,
            scope_id,
            window_start,
            window_end,
            status: RunStatus::Running,
            admin_status: AdminStatus::Draft,
            approval_status: ApprovalStatus::Pending,
            published: false,
            created_by: created_by.to_string(),
            started_at: Utc::now().naive_utc(),
            ended_at: None,
            submitted_at: None,
            decided_at: None,
            decided_by: None,
            rejected_at: None,
            rejected_by: None,
            rejection_reason: None,
            published_at: None,
            metrics: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == RunStatus::Done
    }

    /// Submitted to the dean and still undecided.
    pub fn is_awaiting_decision(&self) -> bool {
        self.admin_status == AdminStatus::Submitted
            && self.approval_status == ApprovalStatus::Pending
    }

    pub fn is_approved(&self) -> bool {
        self.approval_status == ApprovalStatus::Approved
    }
}

// ==========================================
// RunMetrics
// ==========================================
// Frozen at generation time; the read-side KPI engine recomputes
// richer figures on demand, this snapshot is what the run itself
// reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub exams_generated: u32,       // items persisted
    pub room_collisions: u32,       // duplicate (room, slot) pairs
    pub capacity_exceeded: u32,     // items flagged capacity_exceeded
    pub invigilators_missing: u32,  // items flagged invigilator_missing
    pub avg_room_fill_rate: f64,    // occupancy over chosen rooms, capped at 1.0
    pub duration_ms: u64,           // wall-clock generation time
}

// ==========================================
// AssignedInvigilator
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedInvigilator {
    pub invigilator_id: String, // staff reference
    pub full_name: String,      // display name snapshot
}

// ==========================================
// AssignmentItem
// ==========================================
// Snapshot of one placement decision. (room_id, slot_id) is
// unique within a run; the allocator enforces that at placement
// time and the conflict detector re-checks it afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentItem {
    pub item_id: String,                       // item ID
    pub run_id: String,                        // owning run
    pub module_id: String,                     // examined module
    pub room_id: String,                       // placed room
    pub slot_id: String,                       // placed slot
    pub expected_students: u32,                // attendance snapshot
    pub invigilators: Vec<AssignedInvigilator>, // assigned staff, may be empty
    pub annotation: Option<String>,            // soft-gap notes, "; " separated
}

impl AssignmentItem {
    /// Appends a note, joining with "; " when one is already present.
    pub fn push_annotation(&mut self, note: &str) {
        match &mut self.annotation {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(note);
            }
            None => self.annotation = Some(note.to_string()),
        }
    }

    pub fn has_annotation(&self, note: &str) -> bool {
        self.annotation
            .as_deref()
            .map(|a| a.split("; ").any(|part| part == note))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_annotation_joins_with_semicolon() {
        let mut item = AssignmentItem {
            item_id: "I1".to_string(),
            run_id: "R1".to_string(),
            module_id: "M1".to_string(),
            room_id: "ROOM1".to_string(),
            slot_id: "S1".to_string(),
            expected_students: 30,
            invigilators: vec![],
            annotation: None,
        };

        item.push_annotation(NOTE_CAPACITY_EXCEEDED);
        assert_eq!(item.annotation.as_deref(), Some("capacity_exceeded"));

        item.push_annotation(NOTE_INVIGILATOR_MISSING);
        assert_eq!(
            item.annotation.as_deref(),
            Some("capacity_exceeded; invigilator_missing")
        );
        assert!(item.has_annotation(NOTE_CAPACITY_EXCEEDED));
        assert!(item.has_annotation(NOTE_INVIGILATOR_MISSING));
    }
}
