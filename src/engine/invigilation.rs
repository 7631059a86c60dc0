// ==========================================
// Exam Planner - Invigilator Assignment
// ==========================================
// Load-levelled assignment over a shared per-day counter. The pool
// is re-ranked before every exam so the least-loaded staff for that
// day always comes first; ties keep their order from the previous
// ranking, which spreads duty evenly across a long run.
// ==========================================

use crate::domain::planning::{AssignmentItem, NOTE_INVIGILATOR_MISSING};
use crate::domain::resources::{Invigilator, Slot};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, instrument};

// ==========================================
// InvigilatorAssigner
// ==========================================
pub struct InvigilatorAssigner;

impl InvigilatorAssigner {
    pub fn new() -> Self {
        Self
    }

    /// Assigns invigilators to every item in place.
    ///
    /// # Arguments
    /// - `items`: placed items, mutated with their duty roster
    /// - `pool`: available invigilators
    /// - `slots`: slot pool, used to resolve each item's exam day
    /// - `per_exam`: invigilators wanted per exam
    /// - `max_per_day`: duty cap per invigilator per day
    ///
    /// An empty pool leaves every roster empty and adds no
    /// annotation. A partially filled roster gets flagged.
    #[instrument(skip(self, items, pool, slots), fields(
        items_count = items.len(),
        pool_size = pool.len(),
        per_exam,
        max_per_day
    ))]
    pub fn assign(
        &self,
        items: &mut [AssignmentItem],
        pool: &[Invigilator],
        slots: &[Slot],
        per_exam: u32,
        max_per_day: u32,
    ) {
        if pool.is_empty() {
            debug!("invigilator pool empty, rosters left blank");
            return;
        }

        let slot_dates: HashMap<&str, NaiveDate> =
            slots.iter().map(|s| (s.slot_id.as_str(), s.date)).collect();

        // Duty counter shared across the whole run.
        let mut daily_count: HashMap<(String, Option<NaiveDate>), u32> = HashMap::new();
        let mut ranked: Vec<&Invigilator> = pool.iter().collect();
        let mut flagged = 0usize;

        for item in items.iter_mut() {
            let date = slot_dates.get(item.slot_id.as_str()).copied();

            // Least loaded for this day first; stable, so ties keep
            // their order from the previous exam.
            ranked.sort_by_key(|p| {
                daily_count
                    .get(&(p.invigilator_id.clone(), date))
                    .copied()
                    .unwrap_or(0)
            });

            for candidate in &ranked {
                if item.invigilators.len() >= per_exam as usize {
                    break;
                }
                let key = (candidate.invigilator_id.clone(), date);
                let count = daily_count.get(&key).copied().unwrap_or(0);
                if count >= max_per_day {
                    continue;
                }
                item.invigilators.push(candidate.as_assigned());
                daily_count.insert(key, count + 1);
            }

            if item.invigilators.len() < per_exam as usize {
                item.push_annotation(NOTE_INVIGILATOR_MISSING);
                flagged += 1;
            }
        }

        debug!(flagged, "invigilator assignment finished");
    }
}

impl Default for InvigilatorAssigner {
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
    use crate::domain::planning::NOTE_CAPACITY_EXCEEDED;
    use chrono::NaiveTime;

    fn create_test_invigilator(id: &str) -> Invigilator {
        Invigilator {
            invigilator_id: id.to_string(),
            full_name: format!("Prof {}", id),
            department_id: Some("D1".to_string()),
        }
    }

    fn create_test_slot(slot_id: &str, d: u32, hour: u32) -> Slot {
        Slot {
            slot_id: slot_id.to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, d).unwrap(),
            start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(hour + 2, 0, 0).unwrap(),
        }
    }

    fn create_test_item(item_id: &str, slot_id: &str) -> AssignmentItem {
        AssignmentItem {
            item_id: item_id.to_string(),
            run_id: "run-1".to_string(),
            module_id: format!("M-{}", item_id),
            room_id: "R1".to_string(),
            slot_id: slot_id.to_string(),
            expected_students: 30,
            invigilators: vec![],
            annotation: None,
        }
    }

    #[test]
    fn test_empty_pool_leaves_rosters_blank() {
        let assigner = InvigilatorAssigner::new();
        let slots = vec![create_test_slot("S1", 2, 8)];
        let mut items = vec![create_test_item("I1", "S1")];

        assigner.assign(&mut items, &[], &slots, 1, 3);

        assert!(items[0].invigilators.is_empty());
        assert!(items[0].annotation.is_none());
    }

    #[test]
    fn test_duty_spread_over_pool() {
        // Two invigilators, four same-day exams: each ends up with
        // two duties. Ties keep the ranking from the previous exam.
        let assigner = InvigilatorAssigner::new();
        let pool = vec![create_test_invigilator("P1"), create_test_invigilator("P2")];
        let slots: Vec<Slot> = (0..4)
            .map(|i| create_test_slot(&format!("S{}", i), 2, 8 + 2 * i))
            .collect();
        let mut items: Vec<AssignmentItem> = (0..4)
            .map(|i| create_test_item(&format!("I{}", i), &format!("S{}", i)))
            .collect();

        assigner.assign(&mut items, &pool, &slots, 1, 4);

        let picked: Vec<&str> = items
            .iter()
            .map(|i| i.invigilators[0].invigilator_id.as_str())
            .collect();
        assert_eq!(picked, vec!["P1", "P2", "P2", "P1"]);
        assert_eq!(picked.iter().filter(|p| **p == "P1").count(), 2);
    }

    #[test]
    fn test_daily_cap_blocks_and_flags() {
        // One invigilator, cap 1/day, two same-day exams: the second
        // roster stays empty and gets flagged.
        let assigner = InvigilatorAssigner::new();
        let pool = vec![create_test_invigilator("P1")];
        let slots = vec![create_test_slot("S1", 2, 8), create_test_slot("S2", 2, 10)];
        let mut items = vec![create_test_item("I1", "S1"), create_test_item("I2", "S2")];

        assigner.assign(&mut items, &pool, &slots, 1, 1);

        assert_eq!(items[0].invigilators.len(), 1);
        assert!(items[1].invigilators.is_empty());
        assert_eq!(
            items[1].annotation.as_deref(),
            Some(NOTE_INVIGILATOR_MISSING)
        );
    }

    #[test]
    fn test_cap_resets_across_days() {
        let assigner = InvigilatorAssigner::new();
        let pool = vec![create_test_invigilator("P1")];
        let slots = vec![create_test_slot("S1", 2, 8), create_test_slot("S2", 3, 8)];
        let mut items = vec![create_test_item("I1", "S1"), create_test_item("I2", "S2")];

        assigner.assign(&mut items, &pool, &slots, 1, 1);

        assert_eq!(items[0].invigilators.len(), 1);
        assert_eq!(items[1].invigilators.len(), 1);
        assert!(items[1].annotation.is_none());
    }

    #[test]
    fn test_partial_roster_appends_to_existing_note() {
        // Item already flagged for capacity keeps both annotations.
        let assigner = InvigilatorAssigner::new();
        let pool = vec![create_test_invigilator("P1")];
        let slots = vec![create_test_slot("S1", 2, 8)];
        let mut items = vec![create_test_item("I1", "S1")];
        items[0].annotation = Some(NOTE_CAPACITY_EXCEEDED.to_string());

        assigner.assign(&mut items, &pool, &slots, 2, 3);

        assert_eq!(items[0].invigilators.len(), 1);
        assert_eq!(
            items[0].annotation.as_deref(),
            Some("capacity_exceeded; invigilator_missing")
        );
        assert!(items[0].has_annotation(NOTE_CAPACITY_EXCEEDED));
        assert!(items[0].has_annotation(NOTE_INVIGILATOR_MISSING));
    }

    #[test]
    fn test_multiple_invigilators_per_exam() {
        let assigner = InvigilatorAssigner::new();
        let pool = vec![
            create_test_invigilator("P1"),
            create_test_invigilator("P2"),
            create_test_invigilator("P3"),
        ];
        let slots = vec![create_test_slot("S1", 2, 8)];
        let mut items = vec![create_test_item("I1", "S1")];

        assigner.assign(&mut items, &pool, &slots, 2, 3);

        assert_eq!(items[0].invigilators.len(), 2);
        assert!(items[0].annotation.is_none());
    }
}
