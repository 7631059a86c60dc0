// ==========================================
// Exam Planner - Academic Catalog Importer
// ==========================================
// CSV import for departments, programs, modules and enrollments.
// Catalog rows cross-reference each other by id, so ids are
// required here instead of generated.
// ==========================================

use std::sync::Arc;

use tracing::info;

use crate::domain::resources::{Department, Enrollment, ExamModule, Program};
use crate::importer::csv_file::{CsvFile, CsvRow};
use crate::importer::error::ImportResult;
use crate::importer::report::{ImportSummary, RowError};
use crate::repository::catalog_repo::CatalogRepository;

// ==========================================
// CatalogImporter
// ==========================================
pub struct CatalogImporter {
    catalog_repo: Arc<CatalogRepository>,
}

impl CatalogImporter {
    pub fn new(catalog_repo: Arc<CatalogRepository>) -> Self {
        Self { catalog_repo }
    }

    /// Imports departments from a CSV file.
    ///
    /// # Columns
    /// - `department_id`, `name` (required)
    /// - `location`
    pub fn import_departments(&self, path: &str) -> ImportResult<ImportSummary> {
        let file = CsvFile::open(path)?;
        file.require_columns(&["department_id", "name"])?;

        let mut errors = Vec::new();
        let mut departments = Vec::new();
        for row in &file.rows {
            match parse_department_row(row) {
                Ok(department) => departments.push(department),
                Err(mut row_errors) => errors.append(&mut row_errors),
            }
        }

        for department in &departments {
            self.catalog_repo.upsert_department(department)?;
        }

        let summary = ImportSummary::new(path, file.rows.len(), departments.len(), errors);
        info!(
            file = %summary.file,
            inserted = summary.inserted,
            rejected = summary.rejected,
            "departments imported"
        );
        Ok(summary)
    }

    /// Imports programs from a CSV file.
    ///
    /// # Columns
    /// - `program_id`, `name`, `department_id` (required)
    /// - `level`: cycle code, e.g. L/M/D
    pub fn import_programs(&self, path: &str) -> ImportResult<ImportSummary> {
        let file = CsvFile::open(path)?;
        file.require_columns(&["program_id", "name", "department_id"])?;

        let mut errors = Vec::new();
        let mut programs = Vec::new();
        for row in &file.rows {
            match parse_program_row(row) {
                Ok(program) => programs.push(program),
                Err(mut row_errors) => errors.append(&mut row_errors),
            }
        }

        for program in &programs {
            self.catalog_repo.upsert_program(program)?;
        }

        let summary = ImportSummary::new(path, file.rows.len(), programs.len(), errors);
        info!(
            file = %summary.file,
            inserted = summary.inserted,
            rejected = summary.rejected,
            "programs imported"
        );
        Ok(summary)
    }

    /// Imports exam modules from a CSV file.
    ///
    /// # Columns
    /// - `module_id`, `name`, `program_id` (required)
    pub fn import_modules(&self, path: &str) -> ImportResult<ImportSummary> {
        let file = CsvFile::open(path)?;
        file.require_columns(&["module_id", "name", "program_id"])?;

        let mut errors = Vec::new();
        let mut modules = Vec::new();
        for row in &file.rows {
            match parse_module_row(row) {
                Ok(module) => modules.push(module),
                Err(mut row_errors) => errors.append(&mut row_errors),
            }
        }

        for module in &modules {
            self.catalog_repo.upsert_module(module)?;
        }

        let summary = ImportSummary::new(path, file.rows.len(), modules.len(), errors);
        info!(
            file = %summary.file,
            inserted = summary.inserted,
            rejected = summary.rejected,
            "modules imported"
        );
        Ok(summary)
    }

    /// Imports enrollments from a CSV file.
    ///
    /// # Columns
    /// - `student_id`, `module_id` (required)
    ///
    /// Duplicate pairs are ignored by the store, so re-importing
    /// the same file is harmless.
    pub fn import_enrollments(&self, path: &str) -> ImportResult<ImportSummary> {
        let file = CsvFile::open(path)?;
        file.require_columns(&["student_id", "module_id"])?;

        let mut errors = Vec::new();
        let mut enrollments = Vec::new();
        for row in &file.rows {
            match parse_enrollment_row(row) {
                Ok(enrollment) => enrollments.push(enrollment),
                Err(mut row_errors) => errors.append(&mut row_errors),
            }
        }

        self.catalog_repo.batch_upsert_enrollments(&enrollments)?;

        let summary = ImportSummary::new(path, file.rows.len(), enrollments.len(), errors);
        info!(
            file = %summary.file,
            inserted = summary.inserted,
            rejected = summary.rejected,
            "enrollments imported"
        );
        Ok(summary)
    }
}

// ==========================================
// Row parsers
// ==========================================

fn parse_department_row(row: &CsvRow) -> Result<Department, Vec<RowError>> {
    let mut errors = Vec::new();

    let department_id = row.require("department_id", &mut errors);
    let name = row.require("name", &mut errors);

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(Department {
        department_id,
        name,
        location: row.get("location").unwrap_or_default().to_string(),
    })
}

fn parse_program_row(row: &CsvRow) -> Result<Program, Vec<RowError>> {
    let mut errors = Vec::new();

    let program_id = row.require("program_id", &mut errors);
    let name = row.require("name", &mut errors);
    let department_id = row.require("department_id", &mut errors);

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(Program {
        program_id,
        name,
        level: row.get("level").unwrap_or_default().to_string(),
        department_id,
    })
}

fn parse_module_row(row: &CsvRow) -> Result<ExamModule, Vec<RowError>> {
    let mut errors = Vec::new();

    let module_id = row.require("module_id", &mut errors);
    let name = row.require("name", &mut errors);
    let program_id = row.require("program_id", &mut errors);

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ExamModule {
        module_id,
        name,
        program_id,
    })
}

fn parse_enrollment_row(row: &CsvRow) -> Result<Enrollment, Vec<RowError>> {
    let mut errors = Vec::new();

    let student_id = row.require("student_id", &mut errors);
    let module_id = row.require("module_id", &mut errors);

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(Enrollment {
        student_id,
        module_id,
    })
}

// ==========================================
// Tests
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use std::io::Write;
    use std::sync::Mutex;

    fn create_test_importer() -> CatalogImporter {
        let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let repo = Arc::new(CatalogRepository::from_connection(conn).unwrap());
        CatalogImporter::new(repo)
    }

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_import_departments_and_programs() {
        let importer = create_test_importer();

        let departments = write_csv(
            "department_id,name,location\n\
             D1,Informatique,Batiment A\n",
        );
        let summary = importer
            .import_departments(departments.path().to_str().unwrap())
            .unwrap();
        assert_eq!(summary.inserted, 1);

        let programs = write_csv(
            "program_id,name,level,department_id\n\
             F1,L Informatique 1,L,D1\n\
             ,Sans id,L,D1\n",
        );
        let summary = importer
            .import_programs(programs.path().to_str().unwrap())
            .unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.errors[0].field, "program_id");

        let stored = importer.catalog_repo.list_programs().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].department_id, "D1");
    }

    #[test]
    fn test_import_enrollments_ignores_duplicate_pairs() {
        let importer = create_test_importer();

        let enrollments = write_csv(
            "student_id,module_id\n\
             E1,M1\n\
             E1,M1\n\
             E2,M1\n",
        );
        importer
            .import_enrollments(enrollments.path().to_str().unwrap())
            .unwrap();

        let stored = importer.catalog_repo.list_enrollments().unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[test]
    fn test_import_modules_requires_program_id() {
        let importer = create_test_importer();

        let modules = write_csv(
            "module_id,name,program_id\n\
             M1,Algorithmique 1,\n",
        );
        let summary = importer
            .import_modules(modules.path().to_str().unwrap())
            .unwrap();
        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.errors[0].line, 2);
    }
}
