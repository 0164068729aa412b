//! Approval pipeline for expenses, expense requests and purchase orders.
//!
//! All three state machines have the same shape: a record starts pending and
//! leaves it exactly once, for a terminal status. Expenses additionally need a
//! supervision step before the decision.
//!
//! # Modules
//!
//! - `types` - Statuses, decisions and the actions a decision produces
//! - `error` - Workflow-specific error types
//! - `service` - Transition logic

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::WorkflowError;
pub use service::WorkflowService;
pub use types::{
    BalanceEffect, ExpenseSnapshot, Notice, OrderSnapshot, Recipient, RequestDecision,
    RequestSnapshot, RequestStatus, SupervisionAction, ValidationDecision, ValidationStatus,
    WorkflowAction,
};
