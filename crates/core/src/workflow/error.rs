//! Workflow error types.

use budgetaire_shared::AppError;
use thiserror::Error;

use crate::auth::Role;
use crate::budget::BudgetError;

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The acting role may not perform this step.
    #[error("Le rôle {role} n'est pas autorisé à {action}.")]
    NotPermitted {
        /// Acting user's role.
        role: Role,
        /// Attempted step.
        action: &'static str,
    },

    /// Expense already carries a supervisor.
    #[error("Cette dépense a déjà été supervisée.")]
    AlreadySupervised,

    /// Expense not supervised yet.
    #[error("La dépense doit d'abord être supervisée.")]
    NotSupervised,

    /// Record already left the pending status.
    #[error("{what} déjà traitée.")]
    AlreadyProcessed {
        /// Record kind.
        what: &'static str,
    },

    /// Record can no longer be edited or deleted.
    #[error("{what} n'est plus modifiable.")]
    NotEditable {
        /// Record kind.
        what: &'static str,
    },

    /// Only the submitter or an accountant may change a request.
    #[error("Seul l'auteur de la demande ou un comptable peut la modifier.")]
    NotOwner,

    /// Decision label not recognised.
    #[error("Statut invalide : {0}")]
    UnknownDecision(String),

    /// Funds check failed.
    #[error(transparent)]
    Budget(#[from] BudgetError),
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Budget(inner) => inner.into(),
            WorkflowError::NotPermitted { .. } | WorkflowError::NotOwner => {
                Self::Forbidden(err.to_string())
            }
            WorkflowError::AlreadySupervised
            | WorkflowError::NotSupervised
            | WorkflowError::AlreadyProcessed { .. }
            | WorkflowError::NotEditable { .. } => Self::InvalidState(err.to_string()),
            WorkflowError::UnknownDecision(_) => Self::Validation(err.to_string()),
        }
    }
}
