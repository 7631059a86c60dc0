// ==========================================
// Exam Planner - CSV File Reader
// ==========================================
// Loads a CSV file into header-keyed rows. Headers are matched
// case-insensitively after trimming; fully blank lines are
// skipped. Line numbers count from the top of the file, so the
// first data row is line 2.
// ==========================================

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::ReaderBuilder;

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::report::RowError;

// ==========================================
// CsvRow
// ==========================================
#[derive(Debug, Clone)]
pub struct CsvRow {
    pub line: usize,                 // 1-based file line
    fields: HashMap<String, String>, // keyed by normalized header
}

impl CsvRow {
    /// Trimmed cell value for a column, `None` when empty or the
    /// column is absent.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .get(&normalize(column))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Required cell value; records a row error when missing and
    /// returns an empty placeholder so parsing can continue.
    pub fn require(&self, column: &str, errors: &mut Vec<RowError>) -> String {
        match self.get(column) {
            Some(value) => value.to_string(),
            None => {
                errors.push(RowError::new(self.line, column, "champ requis".to_string()));
                String::new()
            }
        }
    }
}

// ==========================================
// CsvFile
// ==========================================
#[derive(Debug)]
pub struct CsvFile {
    pub path: String,
    headers: Vec<String>, // normalized
    pub rows: Vec<CsvRow>,
}

impl CsvFile {
    /// Opens and fully reads a CSV file.
    ///
    /// # Arguments
    /// - `path`: file path; the extension must be `.csv`
    pub fn open(path: &str) -> ImportResult<CsvFile> {
        let file_path = Path::new(path);

        if !file_path.exists() {
            return Err(ImportError::FileNotFound(path.to_string()));
        }
        if let Some(ext) = file_path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers: Vec<String> = reader.headers()?.iter().map(normalize).collect();

        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            let mut fields = HashMap::new();
            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    fields.insert(header.clone(), value.trim().to_string());
                }
            }

            if fields.values().all(|v| v.is_empty()) {
                continue;
            }

            rows.push(CsvRow {
                line: row_idx + 2, // header occupies line 1
                fields,
            });
        }

        Ok(CsvFile {
            path: path.to_string(),
            headers,
            rows,
        })
    }

    /// Fails with the first required column the header row lacks.
    pub fn require_columns(&self, columns: &[&str]) -> ImportResult<()> {
        for column in columns {
            if !self.headers.contains(&normalize(column)) {
                return Err(ImportError::MissingColumn(column.to_string()));
            }
        }
        Ok(())
    }
}

fn normalize(header: &str) -> String {
    header.trim().to_lowercase()
}

// ==========================================
// Tests
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

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
    fn test_open_maps_headers_case_insensitively() {
        let file = write_csv("Name, Building\nSalle-1,B1\n");
        let csv = CsvFile::open(file.path().to_str().unwrap()).unwrap();

        assert_eq!(csv.rows.len(), 1);
        assert_eq!(csv.rows[0].get("name"), Some("Salle-1"));
        assert_eq!(csv.rows[0].get("BUILDING"), Some("B1"));
        assert_eq!(csv.rows[0].line, 2);
    }

    #[test]
    fn test_open_skips_blank_rows_and_blank_cells() {
        let file = write_csv("name,building\nSalle-1,\n,\nSalle-2,B2\n");
        let csv = CsvFile::open(file.path().to_str().unwrap()).unwrap();

        assert_eq!(csv.rows.len(), 2);
        assert_eq!(csv.rows[0].get("building"), None);
        assert_eq!(csv.rows[1].line, 4);
    }

    #[test]
    fn test_open_missing_file() {
        let result = CsvFile::open("/nonexistent/rooms.csv");
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_open_rejects_non_csv_extension() {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let result = CsvFile::open(file.path().to_str().unwrap());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_require_columns_reports_first_missing() {
        let file = write_csv("name,building\nSalle-1,B1\n");
        let csv = CsvFile::open(file.path().to_str().unwrap()).unwrap();

        assert!(csv.require_columns(&["name", "building"]).is_ok());
        match csv.require_columns(&["name", "kind"]) {
            Err(ImportError::MissingColumn(col)) => assert_eq!(col, "kind"),
            other => panic!("Expected MissingColumn, got {:?}", other),
        }
    }
}
