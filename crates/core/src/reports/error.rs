//! Report error types.

use budgetaire_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::storage::StorageError;

/// Errors that can occur around report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Budget not found.
    #[error("Budget introuvable.")]
    BudgetNotFound(Uuid),

    /// Report not found.
    #[error("Rapport introuvable.")]
    ReportNotFound(Uuid),

    /// Report has no generated artifact.
    #[error("Aucun fichier généré pour ce rapport.")]
    NoArtifact(Uuid),

    /// A generated artifact pins the report's metadata.
    #[error("Ce rapport a déjà été généré et ne peut plus être modifié.")]
    ArtifactLocked,

    /// Artifact storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::Storage(inner) => inner.into(),
            ReportError::BudgetNotFound(_)
            | ReportError::ReportNotFound(_)
            | ReportError::NoArtifact(_) => Self::NotFound(err.to_string()),
            ReportError::ArtifactLocked => Self::InvalidState(err.to_string()),
        }
    }
}
