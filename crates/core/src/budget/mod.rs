//! Budget balance bookkeeping.
//!
//! Money leaves `montant_disponible` when a line is allocated or an expense is
//! validated, and leaves a line's allocation when an order is validated. The
//! functions here decide whether such a move is allowed and compute the
//! resulting balances; persisting them is the caller's job.

pub mod error;
pub mod ledger;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::BudgetError;
pub use ledger::LedgerService;
pub use types::{BudgetBalance, BudgetStatus};
