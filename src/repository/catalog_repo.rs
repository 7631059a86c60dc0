// ==========================================
// Exam Planner - Academic Catalog Repository
// ==========================================
// Manages the department, program, exam_module and enrollment
// tables. The catalog drives scope resolution and the expected
// attendance counts; enrollment rows are the raw (student, module)
// pairs the demand loader aggregates.
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::resources::{Department, Enrollment, ExamModule, Program};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct CatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_tables()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_tables(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS department (
              department_id TEXT PRIMARY KEY,
              name TEXT NOT NULL,
              location TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS program (
              program_id TEXT PRIMARY KEY,
              name TEXT NOT NULL,
              level TEXT NOT NULL DEFAULT '',
              department_id TEXT NOT NULL,
              FOREIGN KEY (department_id) REFERENCES department(department_id)
            );

            CREATE TABLE IF NOT EXISTS exam_module (
              module_id TEXT PRIMARY KEY,
              name TEXT NOT NULL,
              program_id TEXT NOT NULL,
              FOREIGN KEY (program_id) REFERENCES program(program_id)
            );

            CREATE TABLE IF NOT EXISTS enrollment (
              student_id TEXT NOT NULL,
              module_id TEXT NOT NULL,
              PRIMARY KEY (student_id, module_id),
              FOREIGN KEY (module_id) REFERENCES exam_module(module_id)
            );

            CREATE INDEX IF NOT EXISTS idx_program_department
              ON program(department_id);
            CREATE INDEX IF NOT EXISTS idx_exam_module_program
              ON exam_module(program_id);
            CREATE INDEX IF NOT EXISTS idx_enrollment_module
              ON enrollment(module_id);
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // Departments
    // ==========================================

    pub fn upsert_department(&self, department: &Department) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO department (department_id, name, location)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(department_id) DO UPDATE SET
                name = excluded.name,
                location = excluded.location"#,
            params![
                &department.department_id,
                &department.name,
                &department.location,
            ],
        )?;
        Ok(())
    }

    pub fn list_departments(&self) -> RepositoryResult<Vec<Department>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT department_id, name, location
               FROM department
               ORDER BY name"#,
        )?;

        let departments = stmt
            .query_map([], |row| {
                Ok(Department {
                    department_id: row.get(0)?,
                    name: row.get(1)?,
                    location: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<Department>, _>>()?;

        Ok(departments)
    }

    // ==========================================
    // Programs
    // ==========================================

    pub fn upsert_program(&self, program: &Program) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO program (program_id, name, level, department_id)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(program_id) DO UPDATE SET
                name = excluded.name,
                level = excluded.level,
                department_id = excluded.department_id"#,
            params![
                &program.program_id,
                &program.name,
                &program.level,
                &program.department_id,
            ],
        )?;
        Ok(())
    }

    pub fn list_programs(&self) -> RepositoryResult<Vec<Program>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT program_id, name, level, department_id
               FROM program
               ORDER BY name"#,
        )?;

        let programs = stmt
            .query_map([], |row| map_program(row))?
            .collect::<Result<Vec<Program>, _>>()?;

        Ok(programs)
    }

    pub fn list_programs_by_department(
        &self,
        department_id: &str,
    ) -> RepositoryResult<Vec<Program>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT program_id, name, level, department_id
               FROM program
               WHERE department_id = ?
               ORDER BY name"#,
        )?;

        let programs = stmt
            .query_map(params![department_id], |row| map_program(row))?
            .collect::<Result<Vec<Program>, _>>()?;

        Ok(programs)
    }

    // ==========================================
    // Modules
    // ==========================================

    pub fn upsert_module(&self, module: &ExamModule) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO exam_module (module_id, name, program_id)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(module_id) DO UPDATE SET
                name = excluded.name,
                program_id = excluded.program_id"#,
            params![&module.module_id, &module.name, &module.program_id],
        )?;
        Ok(())
    }

    pub fn list_modules(&self) -> RepositoryResult<Vec<ExamModule>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT module_id, name, program_id
               FROM exam_module
               ORDER BY name"#,
        )?;

        let modules = stmt
            .query_map([], |row| map_module(row))?
            .collect::<Result<Vec<ExamModule>, _>>()?;

        Ok(modules)
    }

    pub fn list_modules_by_program(&self, program_id: &str) -> RepositoryResult<Vec<ExamModule>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT module_id, name, program_id
               FROM exam_module
               WHERE program_id = ?
               ORDER BY name"#,
        )?;

        let modules = stmt
            .query_map(params![program_id], |row| map_module(row))?
            .collect::<Result<Vec<ExamModule>, _>>()?;

        Ok(modules)
    }

    // ==========================================
    // Enrollments
    // ==========================================

    /// Inserts a whole enrollment batch in one transaction,
    /// skipping pairs that already exist.
    pub fn batch_upsert_enrollments(
        &self,
        enrollments: &[Enrollment],
    ) -> RepositoryResult<usize> {
        if enrollments.is_empty() {
            return Ok(0);
        }

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        {
            let mut stmt = tx.prepare(
                r#"INSERT OR IGNORE INTO enrollment (student_id, module_id)
                VALUES (?1, ?2)"#,
            )?;

            for enrollment in enrollments {
                stmt.execute(params![&enrollment.student_id, &enrollment.module_id])?;
            }
        }

        tx.commit()?;
        Ok(enrollments.len())
    }

    pub fn list_enrollments(&self) -> RepositoryResult<Vec<Enrollment>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT student_id, module_id
               FROM enrollment
               ORDER BY module_id, student_id"#,
        )?;

        let enrollments = stmt
            .query_map([], |row| {
                Ok(Enrollment {
                    student_id: row.get(0)?,
                    module_id: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<Enrollment>, _>>()?;

        Ok(enrollments)
    }
}

fn map_program(row: &rusqlite::Row) -> rusqlite::Result<Program> {
    Ok(Program {
        program_id: row.get(0)?,
        name: row.get(1)?,
        level: row.get(2)?,
        department_id: row.get(3)?,
    })
}

fn map_module(row: &rusqlite::Row) -> rusqlite::Result<ExamModule> {
    Ok(ExamModule {
        module_id: row.get(0)?,
        name: row.get(1)?,
        program_id: row.get(2)?,
    })
}
