// ==========================================
// Exam Planner - Import Layer
// ==========================================
// CSV-based loading of reference data and the academic catalog.
// All writes go through the repositories.
// ==========================================

pub mod catalog_importer;
pub mod csv_file;
pub mod error;
pub mod reference_importer;
pub mod report;

pub use catalog_importer::CatalogImporter;
pub use csv_file::{CsvFile, CsvRow};
pub use error::{ImportError, ImportResult};
pub use reference_importer::ReferenceImporter;
pub use report::{ImportSummary, RowError};
