//! Roles, capabilities and credential handling.
//!
//! This module provides:
//! - The closed set of user roles and what each may do
//! - The acting user passed to every workflow decision
//! - Password hashing with Argon2id
//! - Six-digit one-time login codes

mod otp;
mod password;

pub use otp::{OneTimeCode, generate_code, hash_code, verify_code};
pub use password::{PasswordError, hash_password, verify_password};

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// User roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Accountant: manages budgets and the purchasing chain.
    #[serde(rename = "Comptable")]
    Accountant,
    /// Director: validates expenses and decides on requests.
    #[serde(rename = "Directeur")]
    Director,
    /// Supervisory committee agent: supervises expenses.
    #[serde(rename = "CSA")]
    SupervisoryAgent,
}

/// Operations gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Create, update and delete budgets, recettes, lines, expenses,
    /// suppliers and orders.
    ManageFinance,
    /// Validate or reject a purchase order.
    ValidateOrder,
    /// List users and register new accounts.
    ManageUsers,
    /// Supervise a pending expense.
    SuperviseExpense,
    /// Validate or reject a supervised expense.
    ValidateExpense,
    /// Approve or refuse an expense request.
    DecideRequest,
    /// Read finance records, submit requests, generate reports, read the journal.
    Participate,
}

impl Role {
    /// All roles, in display order.
    pub const ALL: [Self; 3] = [Self::Accountant, Self::Director, Self::SupervisoryAgent];

    /// Returns the wire label of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Accountant => "Comptable",
            Self::Director => "Directeur",
            Self::SupervisoryAgent => "CSA",
        }
    }

    /// Parses a role label.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Comptable" => Some(Self::Accountant),
            "Directeur" => Some(Self::Director),
            "CSA" => Some(Self::SupervisoryAgent),
            _ => None,
        }
    }

    /// Returns true if this role holds the capability.
    #[must_use]
    pub const fn can(&self, capability: Capability) -> bool {
        match capability {
            Capability::ManageFinance | Capability::ValidateOrder | Capability::ManageUsers => {
                matches!(self, Self::Accountant)
            }
            Capability::SuperviseExpense => matches!(self, Self::SupervisoryAgent),
            Capability::ValidateExpense | Capability::DecideRequest => {
                matches!(self, Self::Director)
            }
            Capability::Participate => true,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActingUser {
    /// User ID.
    pub id: Uuid,
    /// User role.
    pub role: Role,
    /// Display name, used in report footers.
    pub nom: String,
}

impl ActingUser {
    /// Creates an acting user.
    #[must_use]
    pub fn new(id: Uuid, role: Role, nom: impl Into<String>) -> Self {
        Self {
            id,
            role,
            nom: nom.into(),
        }
    }

    /// Returns true if the user's role holds the capability.
    #[must_use]
    pub const fn can(&self, capability: Capability) -> bool {
        self.role.can(capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Capability::ManageFinance, [true, false, false])]
    #[case(Capability::ValidateOrder, [true, false, false])]
    #[case(Capability::ManageUsers, [true, false, false])]
    #[case(Capability::SuperviseExpense, [false, false, true])]
    #[case(Capability::ValidateExpense, [false, true, false])]
    #[case(Capability::DecideRequest, [false, true, false])]
    #[case(Capability::Participate, [true, true, true])]
    fn test_capability_table(#[case] capability: Capability, #[case] expected: [bool; 3]) {
        for (role, allowed) in Role::ALL.iter().zip(expected) {
            assert_eq!(role.can(capability), allowed, "{role} / {capability:?}");
        }
    }

    #[test]
    fn test_role_labels_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("comptable"), None);
        assert_eq!(Role::parse("admin"), None);
    }

    #[test]
    fn test_role_serde_uses_labels() {
        assert_eq!(
            serde_json::to_string(&Role::SupervisoryAgent).unwrap(),
            "\"CSA\""
        );
        let role: Role = serde_json::from_str("\"Directeur\"").unwrap();
        assert_eq!(role, Role::Director);
    }
}
