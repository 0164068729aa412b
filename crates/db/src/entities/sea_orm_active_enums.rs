//! `SeaORM` active enums.
//!
//! Stored as short strings so the same schema runs on PostgreSQL and SQLite.

use budgetaire_core::auth::Role;
use budgetaire_core::budget::BudgetStatus as CoreBudgetStatus;
use budgetaire_core::workflow::{
    RequestStatus as CoreRequestStatus, ValidationStatus as CoreValidationStatus,
};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User role column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum UserRole {
    /// Accountant.
    #[sea_orm(string_value = "Comptable")]
    #[serde(rename = "Comptable")]
    Comptable,
    /// Director.
    #[sea_orm(string_value = "Directeur")]
    #[serde(rename = "Directeur")]
    Directeur,
    /// Supervisory committee agent.
    #[sea_orm(string_value = "CSA")]
    #[serde(rename = "CSA")]
    Csa,
}

impl From<UserRole> for Role {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Comptable => Self::Accountant,
            UserRole::Directeur => Self::Director,
            UserRole::Csa => Self::SupervisoryAgent,
        }
    }
}

impl From<Role> for UserRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Accountant => Self::Comptable,
            Role::Director => Self::Directeur,
            Role::SupervisoryAgent => Self::Csa,
        }
    }
}

/// Budget status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    /// Open.
    #[sea_orm(string_value = "ouvert")]
    Ouvert,
    /// Closed.
    #[sea_orm(string_value = "cloture")]
    Cloture,
}

impl From<BudgetStatus> for CoreBudgetStatus {
    fn from(status: BudgetStatus) -> Self {
        match status {
            BudgetStatus::Ouvert => Self::Ouvert,
            BudgetStatus::Cloture => Self::Cloture,
        }
    }
}

impl From<CoreBudgetStatus> for BudgetStatus {
    fn from(status: CoreBudgetStatus) -> Self {
        match status {
            CoreBudgetStatus::Ouvert => Self::Ouvert,
            CoreBudgetStatus::Cloture => Self::Cloture,
        }
    }
}

/// Status of expenses and purchase orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Awaiting decision.
    #[sea_orm(string_value = "en_attente")]
    EnAttente,
    /// Validated.
    #[sea_orm(string_value = "validee")]
    Validee,
    /// Rejected.
    #[sea_orm(string_value = "rejettee")]
    Rejettee,
}

impl From<ValidationStatus> for CoreValidationStatus {
    fn from(status: ValidationStatus) -> Self {
        match status {
            ValidationStatus::EnAttente => Self::EnAttente,
            ValidationStatus::Validee => Self::Validee,
            ValidationStatus::Rejettee => Self::Rejettee,
        }
    }
}

impl From<CoreValidationStatus> for ValidationStatus {
    fn from(status: CoreValidationStatus) -> Self {
        match status {
            CoreValidationStatus::EnAttente => Self::EnAttente,
            CoreValidationStatus::Validee => Self::Validee,
            CoreValidationStatus::Rejettee => Self::Rejettee,
        }
    }
}

/// Expense request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Awaiting the director.
    #[sea_orm(string_value = "en_attente")]
    EnAttente,
    /// Approved.
    #[sea_orm(string_value = "approuvee")]
    Approuvee,
    /// Refused.
    #[sea_orm(string_value = "refusee")]
    Refusee,
}

impl From<RequestStatus> for CoreRequestStatus {
    fn from(status: RequestStatus) -> Self {
        match status {
            RequestStatus::EnAttente => Self::EnAttente,
            RequestStatus::Approuvee => Self::Approuvee,
            RequestStatus::Refusee => Self::Refusee,
        }
    }
}

impl From<CoreRequestStatus> for RequestStatus {
    fn from(status: CoreRequestStatus) -> Self {
        match status {
            CoreRequestStatus::EnAttente => Self::EnAttente,
            CoreRequestStatus::Approuvee => Self::Approuvee,
            CoreRequestStatus::Refusee => Self::Refusee,
        }
    }
}
