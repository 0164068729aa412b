//! Budget data types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Budget lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    /// Accepts new lines and expenses.
    Ouvert,
    /// Closed: no new expense or line may attach.
    Cloture,
}

impl BudgetStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ouvert => "ouvert",
            Self::Cloture => "cloture",
        }
    }

    /// Parses a status, accepting the accented spelling of `clôturé`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ouvert" => Some(Self::Ouvert),
            "cloture" | "clôturé" | "cloturé" | "clôture" => Some(Self::Cloture),
            _ => None,
        }
    }

    /// Returns true if the budget still accepts new commitments.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Ouvert)
    }
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two balances tracked on a budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetBalance {
    /// Total funds the budget has received.
    pub montant_total: Decimal,
    /// Funds not yet committed to lines or validated expenses.
    pub montant_disponible: Decimal,
}

impl BudgetBalance {
    /// A fresh budget whose whole total is available.
    #[must_use]
    pub const fn opening(montant_total: Decimal) -> Self {
        Self {
            montant_total,
            montant_disponible: montant_total,
        }
    }

    /// Checks `0 <= montant_disponible <= montant_total`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.montant_disponible >= Decimal::ZERO && self.montant_disponible <= self.montant_total
    }
}
