// ==========================================
// Exam Planner - KPI Aggregation
// ==========================================
// Pure computation over one run's items joined against reference
// data. The builder resolves lookups once; every projection after
// that is total over well-formed input.
// ==========================================

use crate::domain::kpi::{
    DayCount, DayFillRate, DepartmentConflicts, DepartmentLoad, KpiBase, KpiView,
    OverCapacityEntry, ProgramLoad, UnderUsedEntry, UpcomingExam,
};
use crate::domain::planning::{AssignmentItem, PlanningRun};
use crate::domain::resources::{Department, ExamModule, Program, RoleContext, Room, Slot};
use crate::domain::types::Role;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, instrument};

const TOP_N: usize = 5;
const UPCOMING_LIMIT: usize = 5;

// ==========================================
// KpiBuilder
// ==========================================
pub struct KpiBuilder<'a> {
    rooms: HashMap<&'a str, &'a Room>,
    slots: HashMap<&'a str, &'a Slot>,
    modules: HashMap<&'a str, &'a ExamModule>,
    programs: HashMap<&'a str, &'a Program>,
    departments: HashMap<&'a str, &'a Department>,
    total_rooms: usize,
    top_n: usize,          // cap for over/under-capacity and program rankings
    upcoming_limit: usize, // cap for upcoming exam lists
}

impl<'a> KpiBuilder<'a> {
    pub fn new(
        rooms: &'a [Room],
        slots: &'a [Slot],
        modules: &'a [ExamModule],
        programs: &'a [Program],
        departments: &'a [Department],
    ) -> Self {
        Self {
            rooms: rooms.iter().map(|r| (r.room_id.as_str(), r)).collect(),
            slots: slots.iter().map(|s| (s.slot_id.as_str(), s)).collect(),
            modules: modules.iter().map(|m| (m.module_id.as_str(), m)).collect(),
            programs: programs.iter().map(|p| (p.program_id.as_str(), p)).collect(),
            departments: departments
                .iter()
                .map(|d| (d.department_id.as_str(), d))
                .collect(),
            total_rooms: rooms.len(),
            top_n: TOP_N,
            upcoming_limit: UPCOMING_LIMIT,
        }
    }

    /// Overrides the ranking caps, usually from configuration.
    pub fn with_limits(mut self, top_n: usize, upcoming_limit: usize) -> Self {
        self.top_n = top_n;
        self.upcoming_limit = upcoming_limit;
        self
    }

    // ==========================================
    // Lookups
    // ==========================================

    fn capacity_of(&self, item: &AssignmentItem) -> u32 {
        self.rooms
            .get(item.room_id.as_str())
            .map(|r| r.resolved_exam_capacity())
            .unwrap_or(0)
    }

    /// Fill rate for one item, `None` when capacity is not measurable.
    fn fill_of(&self, item: &AssignmentItem) -> Option<f64> {
        let cap = self.capacity_of(item);
        if cap > 0 {
            Some(f64::from(item.expected_students) / f64::from(cap))
        } else {
            None
        }
    }

    fn slot_of(&self, item: &AssignmentItem) -> Option<&'a Slot> {
        self.slots.get(item.slot_id.as_str()).copied()
    }

    fn program_of(&self, item: &AssignmentItem) -> Option<&'a Program> {
        let module = self.modules.get(item.module_id.as_str())?;
        self.programs.get(module.program_id.as_str()).copied()
    }

    fn module_name(&self, item: &AssignmentItem) -> String {
        self.modules
            .get(item.module_id.as_str())
            .map(|m| m.name.clone())
            .unwrap_or_else(|| item.module_id.clone())
    }

    fn program_name(&self, item: &AssignmentItem) -> String {
        self.program_of(item)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "-".to_string())
    }

    fn room_name(&self, item: &AssignmentItem) -> String {
        self.rooms
            .get(item.room_id.as_str())
            .map(|r| r.name.clone())
            .unwrap_or_else(|| item.room_id.clone())
    }

    // ==========================================
    // Base aggregate
    // ==========================================

    /// Full aggregate over the given items.
    #[instrument(skip(self, items), fields(items_count = items.len()))]
    pub fn compute_base(&self, items: &[AssignmentItem]) -> KpiBase {
        let mut slots_used: HashSet<&str> = HashSet::new();
        let mut rooms_used: HashSet<&str> = HashSet::new();
        let mut days: HashSet<NaiveDate> = HashSet::new();
        let mut fills: Vec<f64> = Vec::new();
        let mut exceeded = 0u32;
        let mut exams_per_day: BTreeMap<NaiveDate, u32> = BTreeMap::new();
        let mut fills_per_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        let mut pair_counter: HashMap<(&str, &str), u32> = HashMap::new();

        for item in items {
            let cap = self.capacity_of(item);
            let fill = self.fill_of(item);
            let slot = self.slot_of(item);

            if self.rooms.contains_key(item.room_id.as_str()) {
                rooms_used.insert(item.room_id.as_str());
            }
            if let Some(slot) = slot {
                slots_used.insert(slot.slot_id.as_str());
                days.insert(slot.date);
                *exams_per_day.entry(slot.date).or_insert(0) += 1;
                if let Some(fill) = fill {
                    fills_per_day.entry(slot.date).or_default().push(fill);
                }
            }
            if let Some(fill) = fill {
                fills.push(fill);
            }
            if cap > 0 && item.expected_students > cap {
                exceeded += 1;
            }
            *pair_counter
                .entry((item.room_id.as_str(), item.slot_id.as_str()))
                .or_insert(0) += 1;
        }

        let room_collision_count: u32 = pair_counter.values().map(|v| v.saturating_sub(1)).sum();
        let avg_room_fill_rate = mean(&fills);

        let exams_per_day: Vec<DayCount> = exams_per_day
            .into_iter()
            .map(|(date, count)| DayCount { date, count })
            .collect();
        let occupancy_per_day: Vec<DayFillRate> = fills_per_day
            .into_iter()
            .map(|(date, fills)| DayFillRate {
                date,
                fill_rate: mean(&fills),
            })
            .collect();

        let base = KpiBase {
            exams_count: items.len() as u32,
            days_covered: days.len() as u32,
            slots_used: slots_used.len() as u32,
            rooms_used: rooms_used.len() as u32,
            avg_room_fill_rate,
            capacity_exceeded_count: exceeded,
            room_collision_count,
            exams_per_day,
            occupancy_per_day,
            top_over_capacity: self.top_over_capacity(items),
            top_underused_rooms: self.top_underused_rooms(items),
            rooms_used_ratio: if self.total_rooms > 0 {
                Some(rooms_used.len() as f64 / self.total_rooms as f64)
            } else {
                None
            },
        };

        debug!(
            exams = base.exams_count,
            avg_fill = base.avg_room_fill_rate,
            "base aggregate computed"
        );
        base
    }

    fn top_over_capacity(&self, items: &[AssignmentItem]) -> Vec<OverCapacityEntry> {
        let mut over: Vec<(i64, &AssignmentItem)> = items
            .iter()
            .filter_map(|item| {
                let cap = self.capacity_of(item);
                if cap == 0 {
                    return None;
                }
                let diff = i64::from(item.expected_students) - i64::from(cap);
                if diff > 0 {
                    Some((diff, item))
                } else {
                    None
                }
            })
            .collect();
        over.sort_by(|a, b| b.0.cmp(&a.0));

        over.into_iter()
            .take(self.top_n)
            .filter_map(|(diff, item)| {
                let slot = self.slot_of(item)?;
                Some(OverCapacityEntry {
                    module: self.module_name(item),
                    program: self.program_name(item),
                    room: self.room_name(item),
                    date: slot.date,
                    slot: slot.label(),
                    expected: item.expected_students,
                    capacity: self.capacity_of(item),
                    diff,
                })
            })
            .collect()
    }

    fn top_underused_rooms(&self, items: &[AssignmentItem]) -> Vec<UnderUsedEntry> {
        let mut rated: Vec<(f64, &AssignmentItem)> = items
            .iter()
            .filter_map(|item| self.fill_of(item).map(|fill| (fill, item)))
            .collect();
        rated.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        rated
            .into_iter()
            .take(self.top_n)
            .filter_map(|(fill, item)| {
                let slot = self.slot_of(item)?;
                Some(UnderUsedEntry {
                    module: self.module_name(item),
                    program: self.program_name(item),
                    room: self.room_name(item),
                    date: slot.date,
                    slot: slot.label(),
                    fill_rate: fill,
                })
            })
            .collect()
    }

    // ==========================================
    // Role projections
    // ==========================================

    /// Per-department load, in first-appearance order over the items.
    pub fn department_rollup(&self, items: &[AssignmentItem]) -> Vec<DepartmentLoad> {
        struct Acc {
            exams: u32,
            exceeded: u32,
            fills: Vec<f64>,
        }
        let mut order: Vec<String> = Vec::new();
        let mut by_dept: HashMap<String, Acc> = HashMap::new();

        for item in items {
            let Some(dept_id) = self.program_of(item).map(|p| p.department_id.clone()) else {
                continue;
            };
            let cap = self.capacity_of(item);
            let acc = by_dept.entry(dept_id.clone()).or_insert_with(|| {
                order.push(dept_id.clone());
                Acc {
                    exams: 0,
                    exceeded: 0,
                    fills: Vec::new(),
                }
            });
            acc.exams += 1;
            if let Some(fill) = self.fill_of(item) {
                acc.fills.push(fill);
            }
            if cap > 0 && item.expected_students > cap {
                acc.exceeded += 1;
            }
        }

        order
            .into_iter()
            .filter_map(|dept_id| {
                let acc = by_dept.remove(&dept_id)?;
                let name = self
                    .departments
                    .get(dept_id.as_str())
                    .map(|d| d.name.clone())
                    .unwrap_or_else(|| format!("Dept {}", dept_id));
                Some(DepartmentLoad {
                    department_id: dept_id,
                    department_name: name,
                    exams_count: acc.exams,
                    capacity_exceeded_count: acc.exceeded,
                    avg_room_fill_rate: mean(&acc.fills),
                })
            })
            .collect()
    }

    /// Exam count per program, busiest first, capped at five.
    pub fn most_loaded_programs(&self, items: &[AssignmentItem]) -> Vec<ProgramLoad> {
        let mut order: Vec<&str> = Vec::new();
        let mut counts: HashMap<&str, (String, u32)> = HashMap::new();

        for item in items {
            let Some(program) = self.program_of(item) else {
                continue;
            };
            let entry = counts
                .entry(program.program_id.as_str())
                .or_insert_with(|| {
                    order.push(program.program_id.as_str());
                    (program.name.clone(), 0)
                });
            entry.1 += 1;
        }

        let mut loads: Vec<ProgramLoad> = order
            .into_iter()
            .filter_map(|program_id| {
                let (name, count) = counts.remove(program_id)?;
                Some(ProgramLoad {
                    program_id: program_id.to_string(),
                    program_name: name,
                    exams_count: count,
                })
            })
            .collect();
        loads.sort_by(|a, b| b.exams_count.cmp(&a.exams_count));
        loads.truncate(self.top_n);
        loads
    }

    /// Exams dated today or later, soonest first, capped at five.
    ///
    /// # Arguments
    /// - `program_id`: when set, keep only that program's exams
    pub fn upcoming_exams(
        &self,
        items: &[AssignmentItem],
        today: NaiveDate,
        program_id: Option<&str>,
    ) -> Vec<UpcomingExam> {
        let mut upcoming: Vec<(NaiveDate, &AssignmentItem)> = items
            .iter()
            .filter_map(|item| {
                if let Some(wanted) = program_id {
                    let owner = self.program_of(item)?;
                    if owner.program_id != wanted {
                        return None;
                    }
                }
                let slot = self.slot_of(item)?;
                if slot.date >= today {
                    Some((slot.date, item))
                } else {
                    None
                }
            })
            .collect();
        upcoming.sort_by_key(|(date, _)| *date);

        upcoming
            .into_iter()
            .take(self.upcoming_limit)
            .filter_map(|(date, item)| {
                let slot = self.slot_of(item)?;
                Some(UpcomingExam {
                    module: self.module_name(item),
                    program: self.program_name(item),
                    date,
                    slot: slot.label(),
                    room: self.room_name(item),
                })
            })
            .collect()
    }

    // ==========================================
    // Dispatch
    // ==========================================

    /// Builds the projection the caller's role is entitled to see.
    #[instrument(skip(self, items, run), fields(role = %ctx.role, run_id = %run.run_id))]
    pub fn build_view(
        &self,
        ctx: &RoleContext,
        items: &[AssignmentItem],
        run: &PlanningRun,
        today: NaiveDate,
    ) -> KpiView {
        let duration = generation_duration_ms(run);

        match ctx.role {
            Role::ExamAdmin => KpiView::ExamAdmin {
                base: self.compute_base(items),
                generation_duration_ms: duration,
            },
            Role::Dean => {
                let base = self.compute_base(items);
                let rollup = self.department_rollup(items);
                let conflicts = rollup
                    .iter()
                    .map(|d| DepartmentConflicts {
                        department_id: d.department_id.clone(),
                        department_name: d.department_name.clone(),
                        capacity_exceeded_count: d.capacity_exceeded_count,
                    })
                    .collect();
                KpiView::Dean {
                    exams_count: base.exams_count,
                    avg_room_fill_rate: base.avg_room_fill_rate,
                    capacity_exceeded_count: base.capacity_exceeded_count,
                    room_collision_count: base.room_collision_count,
                    rooms_used_ratio: base.rooms_used_ratio,
                    occupancy_by_department: rollup,
                    conflicts_by_department: conflicts,
                    generation_duration_ms: duration,
                }
            }
            Role::DeptHead => {
                let scoped: Vec<AssignmentItem> = match ctx.department_id.as_deref() {
                    Some(dept_id) => items
                        .iter()
                        .filter(|item| {
                            self.program_of(item)
                                .map(|p| p.department_id == dept_id)
                                .unwrap_or(false)
                        })
                        .cloned()
                        .collect(),
                    None => Vec::new(),
                };
                KpiView::DeptHead {
                    base: self.compute_base(&scoped),
                    most_loaded_programs: self.most_loaded_programs(&scoped),
                    generation_duration_ms: duration,
                }
            }
            Role::Professor => KpiView::Professor {
                surveillances_count: 0,
                upcoming_exams: Vec::new(),
                todo: "Suivi des surveillances à implémenter".to_string(),
            },
            Role::Student => {
                let upcoming = self.upcoming_exams(items, today, ctx.program_id.as_deref());
                let base = self.compute_base(items);
                KpiView::Student {
                    exams_count: upcoming.len() as u32,
                    upcoming_exams: upcoming,
                    exams_per_day: base.exams_per_day,
                }
            }
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Generation duration: metrics snapshot first, timestamp spread as
/// fallback, `None` when neither is usable.
pub fn generation_duration_ms(run: &PlanningRun) -> Option<u64> {
    if let Some(metrics) = &run.metrics {
        if metrics.duration_ms > 0 {
            return Some(metrics.duration_ms);
        }
    }
    run.ended_at
        .and_then(|ended| u64::try_from((ended - run.started_at).num_milliseconds()).ok())
}
