//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - The schema migration
//! - Repositories that apply the core ledger and workflow decisions inside
//!   database transactions

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    AuditRepository, BudgetLineRepository, BudgetRepository, ExpenseRepository, ExpenseRequestRepository,
    NotificationRepository, PurchaseOrderRepository, ReportRepository, RepositoryError,
    SupplierRepository, TwoFactorRepository, UserRepository,
};

use std::time::Duration;

use budgetaire_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection pool sized from configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}
