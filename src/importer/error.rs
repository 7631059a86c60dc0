// ==========================================
// Exam Planner - Import Error Types
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// File-level import failures. Value-level problems never abort a
/// file; they land in the summary as row errors instead.
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== File errors =====
    #[error("Fichier introuvable: {0}")]
    FileNotFound(String),

    #[error("Format de fichier non supporté: {0} (seul .csv est accepté)")]
    UnsupportedFormat(String),

    #[error("Lecture du fichier échouée: {0}")]
    FileReadError(String),

    #[error("Analyse CSV échouée: {0}")]
    CsvParseError(String),

    // ===== Header errors =====
    #[error("Colonne requise absente: {0}")]
    MissingColumn(String),

    // ===== Persistence errors =====
    #[error("Écriture en base échouée: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

/// Result alias for import operations.
pub type ImportResult<T> = Result<T, ImportError>;
