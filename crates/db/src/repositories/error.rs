//! Repository error type.

use budgetaire_core::budget::BudgetError;
use budgetaire_core::reports::ReportError;
use budgetaire_core::workflow::WorkflowError;
use budgetaire_shared::AppError;
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// Errors returned by repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Referenced record is absent.
    #[error("{what} introuvable.")]
    NotFound {
        /// Record kind.
        what: &'static str,
        /// Requested ID.
        id: Uuid,
    },

    /// A unique field is already taken.
    #[error("{0}")]
    Duplicate(String),

    /// Input refused before touching the ledger.
    #[error("{0}")]
    Invalid(String),

    /// Record still referenced elsewhere.
    #[error("{0}")]
    InUse(String),

    /// Balance guard refused the move.
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// Workflow transition refused.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Report lifecycle error.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl RepositoryError {
    /// Shorthand for a missing record.
    #[must_use]
    pub const fn not_found(what: &'static str, id: Uuid) -> Self {
        Self::NotFound { what, id }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { .. } => Self::NotFound(err.to_string()),
            RepositoryError::Duplicate(msg) => Self::Conflict(msg),
            RepositoryError::Invalid(msg) => Self::Validation(msg),
            RepositoryError::InUse(msg) => Self::InvalidState(msg),
            RepositoryError::Budget(inner) => inner.into(),
            RepositoryError::Workflow(inner) => inner.into(),
            RepositoryError::Report(inner) => inner.into(),
            RepositoryError::Database(inner) => Self::Database(inner.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(RepositoryError, u16)> = vec![
            (RepositoryError::not_found("Budget", Uuid::nil()), 404),
            (RepositoryError::Duplicate("exercice".into()), 409),
            (RepositoryError::Invalid("x".into()), 400),
            (RepositoryError::InUse("x".into()), 409),
            (RepositoryError::Budget(BudgetError::BudgetClosed), 409),
            (RepositoryError::Workflow(WorkflowError::NotSupervised), 409),
            (RepositoryError::Report(ReportError::ArtifactLocked), 409),
            (RepositoryError::Database(DbErr::Custom("boom".into())), 500),
        ];
        for (err, status) in cases {
            let app: AppError = err.into();
            assert_eq!(app.status_code(), status, "{app}");
        }
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            RepositoryError::not_found("Dépense", Uuid::nil()).to_string(),
            "Dépense introuvable."
        );
    }
}
