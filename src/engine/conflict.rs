// ==========================================
// Exam Planner - Conflict Detection
// ==========================================
// Read-only diagnosis over the persisted items of one run. The
// detector never mutates items or runs, so calling it twice on the
// same run yields the same report.
// ==========================================

use crate::domain::conflict::{Conflict, ConflictItemRef, ConflictReport, ConflictTotals};
use crate::domain::planning::AssignmentItem;
use crate::domain::resources::Room;
use std::collections::HashMap;
use tracing::{debug, instrument};

// ==========================================
// ConflictDetector
// ==========================================
pub struct ConflictDetector;

impl ConflictDetector {
    pub fn new() -> Self {
        Self
    }

    /// Builds the conflict report for one run.
    ///
    /// # Arguments
    /// - `run_id`: run being diagnosed
    /// - `items`: the run's persisted items
    /// - `rooms`: full room pool; an item whose room is unknown
    ///   reads as capacity 0
    ///
    /// # Returns
    /// Collisions first (one entry per overbooked pair, in first
    /// occurrence order), then capacity overruns in item order.
    #[instrument(skip(self, items, rooms), fields(run_id = %run_id, items_count = items.len()))]
    pub fn detect(&self, run_id: &str, items: &[AssignmentItem], rooms: &[Room]) -> ConflictReport {
        let room_map: HashMap<&str, &Room> =
            rooms.iter().map(|r| (r.room_id.as_str(), r)).collect();

        let mut conflicts: Vec<Conflict> = Vec::new();
        let mut totals = ConflictTotals::default();

        // Same (room, slot) pair booked more than once.
        let mut group_index: HashMap<(&str, &str), usize> = HashMap::new();
        let mut groups: Vec<((&str, &str), Vec<&AssignmentItem>)> = Vec::new();
        for item in items {
            let key = (item.room_id.as_str(), item.slot_id.as_str());
            match group_index.get(&key) {
                Some(&idx) => groups[idx].1.push(item),
                None => {
                    group_index.insert(key, groups.len());
                    groups.push((key, vec![item]));
                }
            }
        }
        for ((room_id, slot_id), members) in groups {
            if members.len() > 1 {
                let conflict = Conflict::RoomCollision {
                    room_id: room_id.to_string(),
                    slot_id: slot_id.to_string(),
                    items: members.iter().map(|i| ConflictItemRef::from_item(i)).collect(),
                };
                totals.add(conflict.severity());
                conflicts.push(conflict);
            }
        }

        // Seating demand over the room's effective capacity.
        for item in items {
            let capacity = room_map
                .get(item.room_id.as_str())
                .map(|r| r.resolved_exam_capacity())
                .unwrap_or(0);
            if item.expected_students > capacity {
                let conflict = Conflict::CapacityExceeded {
                    item: ConflictItemRef::from_item(item),
                    room_id: item.room_id.clone(),
                    capacity,
                };
                totals.add(conflict.severity());
                conflicts.push(conflict);
            }
        }

        debug!(
            critical = totals.critical,
            high = totals.high,
            "conflict detection finished"
        );

        ConflictReport {
            run_id: run_id.to_string(),
            conflicts,
            totals,
        }
    }
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// Tests
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{ConflictKind, ConflictSeverity, RoomKind};

    fn create_test_room(room_id: &str, exam_capacity: u32) -> Room {
        Room {
            room_id: room_id.to_string(),
            name: room_id.to_string(),
            building: "B".to_string(),
            kind: RoomKind::Standard,
            normal_capacity: None,
            exam_capacity: Some(exam_capacity),
        }
    }

    fn create_test_item(item_id: &str, room_id: &str, slot_id: &str, expected: u32) -> AssignmentItem {
        AssignmentItem {
            item_id: item_id.to_string(),
            run_id: "run-1".to_string(),
            module_id: format!("M-{}", item_id),
            room_id: room_id.to_string(),
            slot_id: slot_id.to_string(),
            expected_students: expected,
            invigilators: vec![],
            annotation: None,
        }
    }

    #[test]
    fn test_clean_run_yields_empty_report() {
        let detector = ConflictDetector::new();
        let rooms = vec![create_test_room("R1", 50)];
        let items = vec![
            create_test_item("I1", "R1", "S1", 30),
            create_test_item("I2", "R1", "S2", 40),
        ];

        let report = detector.detect("run-1", &items, &rooms);

        assert!(report.conflicts.is_empty());
        assert_eq!(report.totals.critical, 0);
        assert_eq!(report.totals.high, 0);
        assert_eq!(report.totals.medium, 0);
    }

    #[test]
    fn test_double_booking_is_one_critical_entry() {
        // Three items on the same pair still produce a single
        // collision entry carrying all three.
        let detector = ConflictDetector::new();
        let rooms = vec![create_test_room("R1", 90)];
        let items = vec![
            create_test_item("I1", "R1", "S1", 30),
            create_test_item("I2", "R1", "S1", 20),
            create_test_item("I3", "R1", "S1", 10),
        ];

        let report = detector.detect("run-1", &items, &rooms);

        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].kind(), ConflictKind::RoomCollision);
        assert_eq!(report.conflicts[0].severity(), ConflictSeverity::Critical);
        match &report.conflicts[0] {
            Conflict::RoomCollision { items, .. } => assert_eq!(items.len(), 3),
            other => panic!("unexpected conflict: {:?}", other),
        }
        assert_eq!(report.totals.critical, 1);
    }

    #[test]
    fn test_capacity_overrun_is_high() {
        let detector = ConflictDetector::new();
        let rooms = vec![create_test_room("R1", 25)];
        let items = vec![create_test_item("I1", "R1", "S1", 40)];

        let report = detector.detect("run-1", &items, &rooms);

        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].severity(), ConflictSeverity::High);
        match &report.conflicts[0] {
            Conflict::CapacityExceeded { capacity, item, .. } => {
                assert_eq!(*capacity, 25);
                assert_eq!(item.expected_students, 40);
            }
            other => panic!("unexpected conflict: {:?}", other),
        }
        assert_eq!(report.totals.high, 1);
    }

    #[test]
    fn test_exact_fit_is_not_a_conflict() {
        let detector = ConflictDetector::new();
        let rooms = vec![create_test_room("R1", 40)];
        let items = vec![create_test_item("I1", "R1", "S1", 40)];

        let report = detector.detect("run-1", &items, &rooms);
        assert!(report.conflicts.is_empty());
    }

    #[test]
    fn test_unknown_room_reads_as_zero_capacity() {
        let detector = ConflictDetector::new();
        let items = vec![create_test_item("I1", "R-gone", "S1", 5)];

        let report = detector.detect("run-1", &items, &[]);

        assert_eq!(report.conflicts.len(), 1);
        match &report.conflicts[0] {
            Conflict::CapacityExceeded { capacity, .. } => assert_eq!(*capacity, 0),
            other => panic!("unexpected conflict: {:?}", other),
        }
    }

    #[test]
    fn test_item_can_raise_both_kinds() {
        // Pair overlap and overrun on the same item: one critical
        // entry for the pair plus one high entry per oversized item.
        let detector = ConflictDetector::new();
        let rooms = vec![create_test_room("R1", 20)];
        let items = vec![
            create_test_item("I1", "R1", "S1", 30),
            create_test_item("I2", "R1", "S1", 25),
        ];

        let report = detector.detect("run-1", &items, &rooms);

        assert_eq!(report.totals.critical, 1);
        assert_eq!(report.totals.high, 2);
        assert_eq!(report.conflicts.len(), 3);
    }

    #[test]
    fn test_detection_is_idempotent() {
        let detector = ConflictDetector::new();
        let rooms = vec![create_test_room("R1", 20)];
        let items = vec![
            create_test_item("I1", "R1", "S1", 30),
            create_test_item("I2", "R1", "S1", 25),
        ];

        let first = detector.detect("run-1", &items, &rooms);
        let second = detector.detect("run-1", &items, &rooms);

        assert_eq!(first.conflicts.len(), second.conflicts.len());
        assert_eq!(first.totals.critical, second.totals.critical);
        assert_eq!(first.totals.high, second.totals.high);
    }
}
