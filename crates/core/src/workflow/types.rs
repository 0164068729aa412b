//! Workflow domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::auth::Role;
use crate::budget::BudgetBalance;

/// Status shared by expenses and purchase orders.
///
/// Valid transitions:
/// - EnAttente → Validee
/// - EnAttente → Rejettee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    /// Awaiting a decision.
    #[serde(rename = "en_attente")]
    EnAttente,
    /// Accepted; funds were moved.
    #[serde(rename = "validee")]
    Validee,
    /// Refused; no funds moved.
    #[serde(rename = "rejettee")]
    Rejettee,
}

impl ValidationStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EnAttente => "en_attente",
            Self::Validee => "validee",
            Self::Rejettee => "rejettee",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "en_attente" => Some(Self::EnAttente),
            "validee" => Some(Self::Validee),
            "rejettee" => Some(Self::Rejettee),
            _ => None,
        }
    }

    /// Returns true while the record can still be edited or decided.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::EnAttente)
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expense request status.
///
/// Valid transitions:
/// - EnAttente → Approuvee
/// - EnAttente → Refusee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Awaiting the director.
    #[serde(rename = "en_attente")]
    EnAttente,
    /// Approved.
    #[serde(rename = "approuvee")]
    Approuvee,
    /// Refused.
    #[serde(rename = "refusee")]
    Refusee,
}

impl RequestStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EnAttente => "en_attente",
            Self::Approuvee => "approuvee",
            Self::Refusee => "refusee",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "en_attente" => Some(Self::EnAttente),
            "approuvee" | "approuvée" => Some(Self::Approuvee),
            "refusee" | "refusée" => Some(Self::Refusee),
            _ => None,
        }
    }

    /// Returns true while the request can still be edited or decided.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::EnAttente)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision on an expense or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationDecision {
    /// Validate and move funds.
    Validate,
    /// Reject.
    Reject,
}

impl ValidationDecision {
    /// Parses `validee` / `rejettee`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "validee" => Some(Self::Validate),
            "rejettee" => Some(Self::Reject),
            _ => None,
        }
    }

    /// The status the record ends in.
    #[must_use]
    pub const fn target(&self) -> ValidationStatus {
        match self {
            Self::Validate => ValidationStatus::Validee,
            Self::Reject => ValidationStatus::Rejettee,
        }
    }
}

/// Decision on an expense request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDecision {
    /// Approve.
    Approve,
    /// Refuse.
    Refuse,
}

impl RequestDecision {
    /// Parses `approuvee` / `refusee`, with or without accents.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match RequestStatus::parse(s)? {
            RequestStatus::Approuvee => Some(Self::Approve),
            RequestStatus::Refusee => Some(Self::Refuse),
            RequestStatus::EnAttente => None,
        }
    }

    /// The status the request ends in.
    #[must_use]
    pub const fn target(&self) -> RequestStatus {
        match self {
            Self::Approve => RequestStatus::Approuvee,
            Self::Refuse => RequestStatus::Refusee,
        }
    }
}

/// Who a notification goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Every active user holding the role.
    Role(Role),
    /// One user.
    User(Uuid),
}

/// A notification to persist alongside a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Recipient(s).
    pub recipient: Recipient,
    /// Message text.
    pub message: String,
}

/// Balance change implied by a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceEffect {
    /// Nothing moves.
    None,
    /// New budget balances after an expense debit.
    DebitBudget(BudgetBalance),
    /// New remaining allocation of the order's line.
    ConsumeLine {
        /// Remaining allocation after the order.
        remaining: Decimal,
    },
}

/// Result of a decision: new status plus everything to persist with it.
#[derive(Debug, Clone)]
pub struct WorkflowAction<S> {
    /// Status to write.
    pub new_status: S,
    /// Deciding user.
    pub decided_by: Uuid,
    /// Decision instant.
    pub decided_at: DateTime<Utc>,
    /// Journal text.
    pub audit: String,
    /// Notifications to create.
    pub notices: Vec<Notice>,
    /// Balance move to apply.
    pub effect: BalanceEffect,
}

/// Result of supervising an expense.
#[derive(Debug, Clone)]
pub struct SupervisionAction {
    /// Supervising user.
    pub supervised_by: Uuid,
    /// Supervision instant.
    pub supervised_at: DateTime<Utc>,
    /// Journal text.
    pub audit: String,
    /// Notifications to create.
    pub notices: Vec<Notice>,
}

/// What the workflow needs to know about an expense.
#[derive(Debug, Clone)]
pub struct ExpenseSnapshot {
    /// Expense ID.
    pub id: Uuid,
    /// Current status.
    pub status: ValidationStatus,
    /// Supervisor, once supervised.
    pub supervised_by: Option<Uuid>,
    /// Amount.
    pub montant: Decimal,
    /// Free-text description.
    pub description: String,
}

/// What the workflow needs to know about an expense request.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    /// Request ID.
    pub id: Uuid,
    /// Current status.
    pub status: RequestStatus,
    /// Submitting user.
    pub submitted_by: Uuid,
    /// Subject.
    pub objet: String,
    /// Estimated amount.
    pub montant_estime: Decimal,
}

/// What the workflow needs to know about a purchase order.
#[derive(Debug, Clone)]
pub struct OrderSnapshot {
    /// Order ID.
    pub id: Uuid,
    /// Unique reference.
    pub reference: String,
    /// Current status.
    pub status: ValidationStatus,
    /// Quantity.
    pub quantite: i32,
    /// Unit price.
    pub prix_unitaire: Decimal,
}
