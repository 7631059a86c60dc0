// ==========================================
// Exam Planner - API Error Types
// ==========================================
// Converts engine, workflow and repository errors into the
// user-facing messages the frontends display. Messages are in
// French, the application language.
// ==========================================

use crate::engine::error::{EngineError, WorkflowError};
use crate::importer::error::ImportError as ImporterError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API-level errors. Every message carries an explicit reason.
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // Input and lookup errors
    // ==========================================
    #[error("Paramètre invalide: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    // ==========================================
    // Generation errors
    // ==========================================
    #[error("{0}")]
    EmptyPool(String),

    #[error("Fenêtre de planification invalide: {0}")]
    InvalidWindow(String),

    // ==========================================
    // Workflow guard errors
    // ==========================================
    #[error("{0}")]
    WorkflowViolation(String),

    // ==========================================
    // Referential integrity
    // ==========================================
    #[error("{0}")]
    ResourceInUse(String),

    // ==========================================
    // Data access errors
    // ==========================================
    #[error("Erreur base de données: {0}")]
    DatabaseError(String),

    #[error("Connexion base de données impossible: {0}")]
    DatabaseConnectionError(String),

    #[error("Transaction base de données échouée: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // Import errors
    // ==========================================
    #[error("Import échoué: {0}")]
    ImportError(String),

    #[error("Validation échouée: {0}")]
    ValidationError(String),

    // ==========================================
    // Fallback
    // ==========================================
    #[error("Erreur serveur: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// From RepositoryError
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} introuvable (id={})", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => {
                ApiError::DatabaseConnectionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("verrou base de données: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::ValidationError(format!("contrainte d'unicité: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::ValidationError(format!("contrainte de clé étrangère: {}", msg))
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// From EngineError
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::EmptyRoomPool => {
                ApiError::EmptyPool("Aucune salle disponible pour la génération".to_string())
            }
            EngineError::EmptySlotPool => {
                ApiError::EmptyPool("Aucun créneau disponible pour la génération".to_string())
            }
            EngineError::InvalidWindow(msg) => ApiError::InvalidWindow(msg),
            EngineError::Fetch(repo_err) => repo_err.into(),
        }
    }
}

// ==========================================
// From ImportError
// ==========================================
// Row-level problems travel inside the summary; only file-level
// failures surface here.
impl From<ImporterError> for ApiError {
    fn from(err: ImporterError) -> Self {
        match err {
            ImporterError::Repository(repo_err) => repo_err.into(),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

// ==========================================
// From WorkflowError
// ==========================================
// Guard messages mirror the admin and dean screens.
impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        let message = match err {
            WorkflowError::NotDone => "Le run doit être terminé avant soumission",
            WorkflowError::AlreadySubmitted => "Run déjà soumis au doyen",
            WorkflowError::NotAwaitingDecision => "Run non soumis ou déjà traité",
            WorkflowError::MissingReason => "Raison de rejet requise",
            WorkflowError::NotApproved => "Publication impossible sans validation du doyen",
        };
        ApiError::WorkflowViolation(message.to_string())
    }
}

/// Result alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_not_found_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "PlanningRun".to_string(),
            id: "R001".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("PlanningRun"));
                assert!(msg.contains("R001"));
            }
            _ => panic!("Expected NotFound"),
        }
    }

    #[test]
    fn test_engine_pool_conversion() {
        let api_err: ApiError = EngineError::EmptyRoomPool.into();
        match api_err {
            ApiError::EmptyPool(msg) => assert!(msg.contains("salle")),
            _ => panic!("Expected EmptyPool"),
        }

        let api_err: ApiError = EngineError::EmptySlotPool.into();
        match api_err {
            ApiError::EmptyPool(msg) => assert!(msg.contains("créneau")),
            _ => panic!("Expected EmptyPool"),
        }
    }

    #[test]
    fn test_workflow_guard_messages() {
        let api_err: ApiError = WorkflowError::MissingReason.into();
        assert_eq!(api_err.to_string(), "Raison de rejet requise");

        let api_err: ApiError = WorkflowError::NotApproved.into();
        assert_eq!(
            api_err.to_string(),
            "Publication impossible sans validation du doyen"
        );
    }
}
