//! Budget error types.

use budgetaire_shared::AppError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Budget balance errors.
#[derive(Debug, Error)]
pub enum BudgetError {
    /// Amount must be strictly positive.
    #[error("Le montant doit être supérieur à 0.")]
    NonPositiveAmount,

    /// Amount cannot be negative.
    #[error("Le montant ne peut pas être négatif.")]
    NegativeAmount,

    /// Order quantity must be strictly positive.
    #[error("La quantité doit être supérieure à 0.")]
    NonPositiveQuantity,

    /// Arithmetic overflow on a money amount.
    #[error("Montant hors limites.")]
    Overflow,

    /// The budget is closed.
    #[error("Ce budget est clôturé. Vous ne pouvez plus y ajouter de dépense.")]
    BudgetClosed,

    /// The budget line belongs to another budget.
    #[error("La ligne budgétaire n'appartient pas à ce budget.")]
    LineBudgetMismatch,

    /// Cumulative line allocations would exceed the available balance.
    #[error("Montant alloué dépasse le budget disponible ({available} F)")]
    AllocationExceedsAvailable {
        /// Budget available balance.
        available: Decimal,
    },

    /// Expense amount exceeds the available balance.
    #[error("Fonds insuffisants : {requested} F demandés, {available} F disponibles.")]
    InsufficientFunds {
        /// Requested amount.
        requested: Decimal,
        /// Available balance.
        available: Decimal,
    },

    /// Order total exceeds the line's remaining allocation.
    #[error("Montant de la commande ({requested} F) dépasse la ligne budgétaire ({available} F).")]
    LineExhausted {
        /// Order total.
        requested: Decimal,
        /// Remaining line allocation.
        available: Decimal,
    },

    /// A total cut would leave a negative available balance.
    #[error("Le nouveau montant total laisserait un disponible négatif.")]
    TotalBelowCommitted,

    /// A line still referenced by orders or expenses cannot be removed.
    #[error("Cette ligne budgétaire est utilisée par des commandes ou des dépenses.")]
    LineInUse,
}

impl From<BudgetError> for AppError {
    fn from(err: BudgetError) -> Self {
        let message = err.to_string();
        match err {
            BudgetError::NonPositiveAmount
            | BudgetError::NegativeAmount
            | BudgetError::NonPositiveQuantity
            | BudgetError::Overflow
            | BudgetError::LineBudgetMismatch => Self::Validation(message),
            BudgetError::BudgetClosed | BudgetError::LineInUse => Self::InvalidState(message),
            BudgetError::AllocationExceedsAvailable { .. }
            | BudgetError::InsufficientFunds { .. }
            | BudgetError::LineExhausted { .. }
            | BudgetError::TotalBelowCommitted => Self::InsufficientFunds(message),
        }
    }
}
