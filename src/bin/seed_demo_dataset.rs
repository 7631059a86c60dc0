// Resets a database file and fills it with a generated demo dataset:
// departments, programs, modules, rooms, a slot grid, invigilators
// and student enrollments.
//
// Usage:
//   cargo run --bin seed_demo_dataset -- [db_path] [small|medium] [start_date] [days]
//
// The generator is seeded, so two runs produce the same names, counts
// and relationships. Row ids are fresh UUIDs on every run.

use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use exam_planner::app::get_default_db_path;
use exam_planner::config::{config_keys, ConfigManager};
use exam_planner::db::open_sqlite_connection;
use exam_planner::domain::resources::{
    Department, Enrollment, ExamModule, Invigilator, Program, Room, Slot,
};
use exam_planner::domain::types::RoomKind;
use exam_planner::i18n;
use exam_planner::repository::{CatalogRepository, ReferenceRepository};

const RNG_SEED: u32 = 42;
const DEFAULT_START_DATE: &str = "2026-01-01";
const DEFAULT_DAYS: usize = 5;

// 3 exam slots per day.
const SLOT_GRID: [(&str, &str); 3] = [
    ("08:00", "10:00"),
    ("10:30", "12:30"),
    ("14:00", "16:00"),
];

const DEPARTMENT_NAMES: [&str; 6] = [
    "Informatique",
    "Mathematiques",
    "Physique",
    "Electronique",
    "Gestion",
    "Chimie",
];

// Cycle codes, one character (L/M/D).
const PROGRAM_LEVELS: [&str; 3] = ["L", "M", "D"];

const MODULE_SUBJECTS: [&str; 30] = [
    "Programmation",
    "Bases de donnees",
    "Reseaux",
    "Systemes",
    "Compilation",
    "Algebre",
    "Analyse",
    "Probabilites",
    "Statistiques",
    "Physique quantique",
    "Electronique analogique",
    "Electronique numerique",
    "Management",
    "Finance",
    "Comptabilite",
    "Marketing",
    "Developpement web",
    "DevOps",
    "Cloud",
    "IA",
    "Apprentissage automatique",
    "Vision par ordinateur",
    "Cybersecurite",
    "Cryptographie",
    "Structure de donnees",
    "Algorithmes avances",
    "IOT",
    "Robotique",
    "Simulation numerique",
    "Methode numerique",
];

const FIRST_NAMES: [&str; 25] = [
    "Alex", "Marie", "Sofia", "Lucas", "Emma", "Noah", "Lina", "Adam", "Sarah", "Yanis", "Nora",
    "Elias", "Jade", "Hugo", "Lou", "Liam", "Manon", "Chloe", "Lea", "Nina", "Omar", "Rayan",
    "Maya", "Ilyes", "Luna",
];

const LAST_NAMES: [&str; 25] = [
    "Martin", "Bernard", "Thomas", "Petit", "Robert", "Richard", "Durand", "Dubois", "Moreau",
    "Laurent", "Simon", "Michel", "Garcia", "David", "Bertrand", "Roux", "Vincent", "Fournier",
    "Morel", "Girard", "Andre", "Lefebvre", "Mercier", "Dupont", "Lambert",
];

// ==========================================
// Dataset sizing
// ==========================================
struct SizeConfig {
    departments: usize,
    programs_per_department: usize,
    modules: (u32, u32),
    rooms: (u32, u32),
    invigilators: (u32, u32),
    students: (u32, u32),
    modules_per_student: (u32, u32),
}

const SMALL: SizeConfig = SizeConfig {
    departments: 3,
    programs_per_department: 2,
    modules: (30, 40),
    rooms: (12, 14),
    invigilators: (20, 25),
    students: (200, 250),
    modules_per_student: (6, 7),
};

const MEDIUM: SizeConfig = SizeConfig {
    departments: 3,
    programs_per_department: 2,
    modules: (50, 60),
    rooms: (15, 18),
    invigilators: (28, 35),
    students: (280, 350),
    modules_per_student: (7, 9),
};

// ==========================================
// Seeded RNG (mulberry32)
// ==========================================
// Small deterministic generator, enough for demo data. Not for
// anything security sensitive.
struct SeededRng {
    state: u32,
}

impl SeededRng {
    fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x6d2b_79f5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        f64::from(t ^ (t >> 14)) / 4_294_967_296.0
    }

    /// Uniform integer in [min, max], both inclusive.
    fn int_in(&mut self, min: u32, max: u32) -> u32 {
        (self.next_f64() * f64::from(max - min + 1)) as u32 + min
    }

    fn pick<'a, T>(&mut self, list: &'a [T]) -> &'a T {
        &list[self.int_in(0, list.len() as u32 - 1) as usize]
    }

    /// Fisher-Yates over a copied list.
    fn shuffled<T: Clone>(&mut self, list: &[T]) -> Vec<T> {
        let mut copy = list.to_vec();
        for i in (1..copy.len()).rev() {
            let j = self.int_in(0, i as u32) as usize;
            copy.swap(i, j);
        }
        copy
    }
}

fn main() -> Result<()> {
    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);

    let size_name = std::env::args().nth(2).unwrap_or_else(|| "small".to_string());
    let size = match size_name.as_str() {
        "medium" => MEDIUM,
        _ => SMALL,
    };

    let start_date = std::env::args()
        .nth(3)
        .unwrap_or_else(|| DEFAULT_START_DATE.to_string());
    let start_date = NaiveDate::parse_from_str(&start_date, "%Y-%m-%d")?;

    let days = std::env::args()
        .nth(4)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_DAYS)
        .max(1);

    backup_and_reset_db(&db_path)?;

    let conn = Arc::new(Mutex::new(open_sqlite_connection(&db_path)?));
    let reference_repo = ReferenceRepository::from_connection(conn.clone())?;
    let catalog_repo = CatalogRepository::from_connection(conn.clone())?;
    let config_manager =
        ConfigManager::from_connection(conn).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    seed_config_defaults(&config_manager)?;

    let mut rng = SeededRng::new(RNG_SEED);

    // ===== Academic catalog =====
    let departments = build_departments(&size);
    for d in &departments {
        catalog_repo.upsert_department(d)?;
    }

    let programs = build_programs(&departments, size.programs_per_department);
    for p in &programs {
        catalog_repo.upsert_program(p)?;
    }

    let module_total = rng.int_in(size.modules.0, size.modules.1);
    let modules = build_modules(&mut rng, &programs, module_total);
    for m in &modules {
        catalog_repo.upsert_module(m)?;
    }

    // ===== Rooms, slots, invigilators =====
    let room_count = rng.int_in(size.rooms.0, size.rooms.1);
    let rooms = build_rooms(&mut rng, room_count);
    for r in &rooms {
        reference_repo.upsert_room(r)?;
    }

    let slots = build_slot_grid(start_date, days);
    for s in &slots {
        reference_repo.upsert_slot(s)?;
    }

    let invigilator_count = rng.int_in(size.invigilators.0, size.invigilators.1);
    let invigilators = build_invigilators(&mut rng, &departments, invigilator_count);
    for inv in &invigilators {
        reference_repo.upsert_invigilator(inv)?;
    }

    // ===== Enrollments =====
    let student_count = rng.int_in(size.students.0, size.students.1);
    let enrollments = build_enrollments(
        &mut rng,
        &programs,
        &modules,
        student_count,
        size.modules_per_student,
    );
    let inserted = catalog_repo.batch_upsert_enrollments(&enrollments)?;

    println!("departements: {}", departments.len());
    println!("formations: {}", programs.len());
    println!("modules: {}", modules.len());
    println!("salles: {}", rooms.len());
    println!("creneaux: {}", slots.len());
    println!("surveillants: {}", invigilators.len());
    println!("inscriptions: {}", inserted);
    println!("{}", i18n::t_with_args("seed.done", &[("path", &db_path)]));

    Ok(())
}

/// Keeps the previous file next to the new one before wiping it.
fn backup_and_reset_db(db_path: &str) -> Result<()> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;
    // WAL sidecars belong to the removed file.
    fs::remove_file(format!("{}-wal", db_path)).ok();
    fs::remove_file(format!("{}-shm", db_path)).ok();

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed_config_defaults(config_manager: &ConfigManager) -> Result<()> {
    let pairs = [
        (config_keys::INVIGILATORS_PER_EXAM, "1"),
        (config_keys::INVIGILATOR_MAX_PER_DAY, "3"),
        (config_keys::DEFAULT_WINDOW_DAYS, "7"),
        (config_keys::KPI_TOP_N, "5"),
        (config_keys::KPI_UPCOMING_LIMIT, "5"),
    ];
    for (key, value) in pairs {
        config_manager
            .set_global_config_value(key, value)
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    }
    Ok(())
}

fn build_departments(size: &SizeConfig) -> Vec<Department> {
    DEPARTMENT_NAMES
        .iter()
        .take(size.departments)
        .enumerate()
        .map(|(idx, name)| Department {
            department_id: Uuid::new_v4().to_string(),
            name: (*name).to_string(),
            location: format!("Batiment {}", (b'A' + idx as u8) as char),
        })
        .collect()
}

fn build_programs(departments: &[Department], per_department: usize) -> Vec<Program> {
    let mut programs = Vec::new();
    for (dept_idx, dept) in departments.iter().enumerate() {
        for i in 0..per_department {
            let level = PROGRAM_LEVELS[(dept_idx + i) % PROGRAM_LEVELS.len()];
            programs.push(Program {
                program_id: Uuid::new_v4().to_string(),
                name: format!("{} {} {}", level, dept.name, i + 1),
                level: level.to_string(),
                department_id: dept.department_id.clone(),
            });
        }
    }
    programs
}

/// Spreads `target_total` modules over the programs, at least 5 each,
/// leftovers landing on random programs.
fn build_modules(rng: &mut SeededRng, programs: &[Program], target_total: u32) -> Vec<ExamModule> {
    let mut modules = Vec::new();
    let mut remaining = target_total;

    for program in programs {
        let base = (target_total as usize / programs.len()).max(5) as u32;
        let count = base.min(remaining);
        remaining -= count;
        for i in 0..count {
            let subject = rng.pick(&MODULE_SUBJECTS);
            modules.push(ExamModule {
                module_id: Uuid::new_v4().to_string(),
                name: format!("{} {}", subject, i + 1),
                program_id: program.program_id.clone(),
            });
        }
    }

    while remaining > 0 {
        let program = rng.pick(programs);
        let subject = rng.pick(&MODULE_SUBJECTS);
        modules.push(ExamModule {
            module_id: Uuid::new_v4().to_string(),
            name: format!("{} {}", subject, rng.int_in(100, 999)),
            program_id: program.program_id.clone(),
        });
        remaining -= 1;
    }

    modules
}

/// Every third room is an amphitheater; the rest are standard rooms.
fn build_rooms(rng: &mut SeededRng, count: u32) -> Vec<Room> {
    let mut rooms = Vec::new();
    for i in 1..=count {
        let kind = if i % 3 == 0 {
            RoomKind::LargeHall
        } else {
            RoomKind::Standard
        };
        let capacity = match kind {
            RoomKind::LargeHall => rng.int_in(120, 300),
            RoomKind::Standard => rng.int_in(30, 80),
        };
        rooms.push(Room {
            room_id: Uuid::new_v4().to_string(),
            name: format!("Salle-{}", i),
            building: format!("B{}", rng.int_in(1, 4)),
            kind,
            normal_capacity: Some(capacity),
            exam_capacity: None,
        });
    }
    rooms
}

/// 3 slots per working day, weekends skipped.
fn build_slot_grid(start_date: NaiveDate, days: usize) -> Vec<Slot> {
    let mut slots = Vec::new();
    let mut date = start_date;
    let mut taken = 0;
    while taken < days {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            for (start, end) in SLOT_GRID {
                slots.push(Slot {
                    slot_id: Uuid::new_v4().to_string(),
                    date,
                    start_time: NaiveTime::parse_from_str(start, "%H:%M").expect("grid literal"),
                    end_time: NaiveTime::parse_from_str(end, "%H:%M").expect("grid literal"),
                });
            }
            taken += 1;
        }
        date += Duration::days(1);
    }
    slots
}

fn build_invigilators(
    rng: &mut SeededRng,
    departments: &[Department],
    count: u32,
) -> Vec<Invigilator> {
    (0..count)
        .map(|_| {
            let first = rng.pick(&FIRST_NAMES);
            let last = rng.pick(&LAST_NAMES);
            let dept = rng.pick(departments);
            Invigilator {
                invigilator_id: Uuid::new_v4().to_string(),
                full_name: format!("{} {}", first, last),
                department_id: Some(dept.department_id.clone()),
            }
        })
        .collect()
}

/// Each student enrolls in 6-7 modules of their own program. The
/// (student, module) pair set is deduplicated before insert.
fn build_enrollments(
    rng: &mut SeededRng,
    programs: &[Program],
    modules: &[ExamModule],
    student_count: u32,
    per_student: (u32, u32),
) -> Vec<Enrollment> {
    let mut enrollments = Vec::new();
    for i in 0..student_count {
        let student_id = format!("ETU-{:04}", i + 1);
        let program = rng.pick(programs);
        let own_modules: Vec<&ExamModule> = modules
            .iter()
            .filter(|m| m.program_id == program.program_id)
            .collect();
        if own_modules.is_empty() {
            continue;
        }
        let desired = rng
            .int_in(per_student.0, per_student.1)
            .min(own_modules.len() as u32) as usize;
        let shuffled = rng.shuffled(&own_modules);
        for module in shuffled.into_iter().take(desired) {
            enrollments.push(Enrollment {
                student_id: student_id.clone(),
                module_id: module.module_id.clone(),
            });
        }
    }
    enrollments
}
