// ==========================================
// Exam Planner - Room/Slot Allocator
// ==========================================
// Greedy best-fit placement. Exams are placed largest first; a
// single slot cursor rotates across the whole run so load spreads
// over the period instead of packing the first slot.
// Hard guard: one exam per (room, slot) pair within a run.
// ==========================================

use crate::domain::planning::{AssignmentItem, NOTE_CAPACITY_EXCEEDED};
use crate::domain::resources::{ExamModule, Room, Slot};
use crate::engine::error::{EngineError, EngineResult};
use chrono::{Duration, NaiveDate};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

// ==========================================
// PlacementResult
// ==========================================
#[derive(Debug, Clone)]
pub struct PlacementResult {
    pub items: Vec<AssignmentItem>,
    /// Ratio of placed attendance to chosen capacity, capped at 1.0;
    /// 0.0 when nothing was placed.
    pub occupancy: f64,
}

// ==========================================
// RoomSlotAllocator
// ==========================================
// One instance per run. The cursor is instance state so rotation
// is reproducible in tests and never leaks across runs.
pub struct RoomSlotAllocator {
    slot_cursor: usize,
}

impl RoomSlotAllocator {
    pub fn new() -> Self {
        Self { slot_cursor: 0 }
    }

    /// Current cursor position over the ordered slot list.
    pub fn cursor(&self) -> usize {
        self.slot_cursor
    }

    /// Places every module onto a (room, slot) pair.
    ///
    /// # Arguments
    /// - `modules`: modules in scope, any order
    /// - `rooms`: full room pool
    /// - `slots`: slot pool, already window-filtered and sorted
    /// - `expected`: attendance per module id (missing id reads as 0)
    /// - `run_id`: owning run
    ///
    /// # Returns
    /// Placed items in placement order plus the occupancy ratio.
    /// Modules that fit nowhere are dropped without an item.
    #[instrument(skip(self, modules, rooms, slots, expected), fields(
        run_id = %run_id,
        modules_count = modules.len(),
        rooms_count = rooms.len(),
        slots_count = slots.len()
    ))]
    pub fn allocate(
        &mut self,
        modules: &[ExamModule],
        rooms: &[Room],
        slots: &[Slot],
        expected: &HashMap<String, u32>,
        run_id: &str,
    ) -> EngineResult<PlacementResult> {
        if rooms.is_empty() {
            return Err(EngineError::EmptyRoomPool);
        }
        if slots.is_empty() {
            return Err(EngineError::EmptySlotPool);
        }

        // 1. Largest exams first
        let mut ordered: Vec<&ExamModule> = modules.iter().collect();
        ordered.sort_by_key(|m| Reverse(Self::expected_for(expected, &m.module_id)));

        let mut occupied: HashSet<(&str, &str)> = HashSet::new();
        let mut items: Vec<AssignmentItem> = Vec::new();
        let mut chosen_capacities: Vec<u32> = Vec::new();
        let mut dropped = 0usize;

        for module in ordered {
            let expected_students = Self::expected_for(expected, &module.module_id);

            // 2. Primary sweep: smallest sufficient room, cursor onwards
            let mut best: Option<(usize, &Slot, &Room, Option<&'static str>)> = None;
            'primary: for attempt in 0..slots.len() {
                let slot = &slots[(self.slot_cursor + attempt) % slots.len()];
                let mut free = Self::free_rooms(rooms, slot, &occupied);
                free.sort_by_key(|r| r.resolved_exam_capacity());
                for room in free {
                    if room.resolved_exam_capacity() >= expected_students {
                        best = Some((attempt, slot, room, None));
                        break 'primary;
                    }
                }
            }

            // 3. Fallback sweep: largest free room anywhere, flagged
            if best.is_none() {
                for attempt in 0..slots.len() {
                    let slot = &slots[(self.slot_cursor + attempt) % slots.len()];
                    let mut free = Self::free_rooms(rooms, slot, &occupied);
                    free.sort_by_key(|r| Reverse(r.resolved_exam_capacity()));
                    if let Some(room) = free.first() {
                        best = Some((attempt, slot, room, Some(NOTE_CAPACITY_EXCEEDED)));
                        break;
                    }
                }
            }

            // 4. Every pair taken for the whole sweep: drop, no error
            let Some((attempt, slot, room, note)) = best else {
                dropped += 1;
                warn!(
                    module_id = %module.module_id,
                    expected_students,
                    "no free (room, slot) pair left, exam dropped"
                );
                continue;
            };

            self.slot_cursor = (self.slot_cursor + attempt + 1) % slots.len();
            occupied.insert((slot.slot_id.as_str(), room.room_id.as_str()));
            chosen_capacities.push(room.resolved_exam_capacity());
            items.push(AssignmentItem {
                item_id: Uuid::new_v4().to_string(),
                run_id: run_id.to_string(),
                module_id: module.module_id.clone(),
                room_id: room.room_id.clone(),
                slot_id: slot.slot_id.clone(),
                expected_students,
                invigilators: vec![],
                annotation: note.map(|n| n.to_string()),
            });
        }

        let occupancy = Self::occupancy(&items, &chosen_capacities);

        debug!(
            placed = items.len(),
            dropped,
            occupancy,
            cursor = self.slot_cursor,
            "placement finished"
        );

        Ok(PlacementResult { items, occupancy })
    }

    fn expected_for(expected: &HashMap<String, u32>, module_id: &str) -> u32 {
        expected.get(module_id).copied().unwrap_or(0)
    }

    fn free_rooms<'a>(
        rooms: &'a [Room],
        slot: &Slot,
        occupied: &HashSet<(&str, &str)>,
    ) -> Vec<&'a Room> {
        rooms
            .iter()
            .filter(|r| !occupied.contains(&(slot.slot_id.as_str(), r.room_id.as_str())))
            .collect()
    }

    fn occupancy(items: &[AssignmentItem], chosen_capacities: &[u32]) -> f64 {
        if items.is_empty() {
            return 0.0;
        }
        let total_expected: u64 = items.iter().map(|i| u64::from(i.expected_students)).sum();
        let total_capacity: u64 = chosen_capacities.iter().map(|c| u64::from(*c)).sum();
        if total_capacity == 0 {
            if total_expected > 0 {
                return 1.0;
            }
            return 0.0;
        }
        (total_expected as f64 / total_capacity as f64).min(1.0)
    }
}

impl Default for RoomSlotAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// Date window resolution
// ==========================================

/// Resolves the planning window over the available slot dates.
///
/// Explicit bounds win; otherwise the window starts at the earliest
/// slot date and ends `default_days` later, clamped to the latest
/// slot date.
pub fn resolve_window(
    slots: &[Slot],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    default_days: i64,
) -> EngineResult<(NaiveDate, NaiveDate)> {
    let min_date = slots.iter().map(|s| s.date).min();
    let max_date = slots.iter().map(|s| s.date).max();

    let start = match start.or(min_date) {
        Some(d) => d,
        None => return Err(EngineError::EmptySlotPool),
    };

    // Only a defaulted end is clamped to the pool; an explicit end
    // is honored even when it overshoots (the window then simply
    // contains no slots).
    let end = match end {
        Some(d) => d,
        None => {
            let mut d = start + Duration::days(default_days);
            if let Some(max) = max_date {
                if d > max {
                    d = max;
                }
            }
            d
        }
    };

    if end < start {
        return Err(EngineError::InvalidWindow(format!(
            "window end {} before start {}",
            end, start
        )));
    }

    Ok((start, end))
}

/// Slots inside the window, sorted by (date, start time).
pub fn slots_within(slots: &[Slot], start: NaiveDate, end: NaiveDate) -> Vec<Slot> {
    let mut filtered: Vec<Slot> = slots
        .iter()
        .filter(|s| s.date >= start && s.date <= end)
        .cloned()
        .collect();
    filtered.sort_by_key(|s| s.sort_key());
    filtered
}
