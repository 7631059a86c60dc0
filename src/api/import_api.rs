// ==========================================
// Exam Planner - Import API
// ==========================================
// One entry point for loading any reference or catalog CSV file.
// The file kind selects the importer; the caller gets the per-file
// summary back, row errors included.
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::error::{ApiError, ApiResult};
use crate::importer::{CatalogImporter, ImportSummary, ReferenceImporter};
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::reference_repo::ReferenceRepository;

// ==========================================
// ImportKind
// ==========================================
/// What a CSV file contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    Rooms,
    Slots,
    Invigilators,
    Departments,
    Programs,
    Modules,
    Enrollments,
}

impl ImportKind {
    /// Parses a CLI/query value, e.g. "rooms".
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "rooms" => Some(ImportKind::Rooms),
            "slots" => Some(ImportKind::Slots),
            "invigilators" => Some(ImportKind::Invigilators),
            "departments" => Some(ImportKind::Departments),
            "programs" => Some(ImportKind::Programs),
            "modules" => Some(ImportKind::Modules),
            "enrollments" => Some(ImportKind::Enrollments),
            _ => None,
        }
    }
}

// ==========================================
// ImportApi
// ==========================================
pub struct ImportApi {
    reference_importer: ReferenceImporter,
    catalog_importer: CatalogImporter,
}

impl ImportApi {
    pub fn new(
        reference_repo: Arc<ReferenceRepository>,
        catalog_repo: Arc<CatalogRepository>,
    ) -> Self {
        Self {
            reference_importer: ReferenceImporter::new(reference_repo),
            catalog_importer: CatalogImporter::new(catalog_repo),
        }
    }

    /// Imports one CSV file of the given kind.
    ///
    /// # Returns
    /// - `Ok(ImportSummary)`: inserted/rejected counts plus row errors
    pub fn import_file(&self, kind: ImportKind, path: &str) -> ApiResult<ImportSummary> {
        let summary = match kind {
            ImportKind::Rooms => self.reference_importer.import_rooms(path),
            ImportKind::Slots => self.reference_importer.import_slots(path),
            ImportKind::Invigilators => self.reference_importer.import_invigilators(path),
            ImportKind::Departments => self.catalog_importer.import_departments(path),
            ImportKind::Programs => self.catalog_importer.import_programs(path),
            ImportKind::Modules => self.catalog_importer.import_modules(path),
            ImportKind::Enrollments => self.catalog_importer.import_enrollments(path),
        }?;

        if summary.rejected > 0 {
            warn!(
                file = %summary.file,
                rejected = summary.rejected,
                "import finished with rejected rows"
            );
        }
        Ok(summary)
    }

    /// `import_file` with a string kind, for CLI and query callers.
    pub fn import_named(&self, kind: &str, path: &str) -> ApiResult<ImportSummary> {
        let kind = ImportKind::parse(kind)
            .ok_or_else(|| ApiError::InvalidInput(format!("type d'import inconnu: {}", kind)))?;
        self.import_file(kind, path)
    }
}
