// ==========================================
// Exam Planner - Import Report Types
// ==========================================

use serde::Serialize;

/// One rejected value, pinned to its file line.
#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    pub line: usize,     // 1-based file line
    pub field: String,   // offending column
    pub message: String, // reason, in application language
}

impl RowError {
    pub fn new(line: usize, field: &str, message: String) -> Self {
        Self {
            line,
            field: field.to_string(),
            message,
        }
    }
}

/// Outcome of importing one file. A row is either inserted or
/// rejected; a rejected row may carry several errors.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub file: String,
    pub total_rows: usize,
    pub inserted: usize,
    pub rejected: usize,
    pub errors: Vec<RowError>,
}

impl ImportSummary {
    pub fn new(file: &str, total_rows: usize, inserted: usize, errors: Vec<RowError>) -> Self {
        Self {
            file: file.to_string(),
            total_rows,
            inserted,
            rejected: total_rows - inserted,
            errors,
        }
    }
}
