//! Shared types, errors, and configuration for Budgetaire.
//!
//! This crate provides common types used across all other crates:
//! - Pagination types for list endpoints
//! - Application-wide error taxonomy
//! - Configuration management
//! - JWT claims and token service
//! - SMTP delivery of one-time login codes

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod jwt;
pub mod types;

#[cfg(test)]
mod jwt_tests;

pub use auth::{Claims, TokenKind, TokenPair};
pub use config::{AppConfig, EmailConfig, JwtSettings, StorageSettings, TwoFactorConfig};
pub use email::{EmailError, EmailService};
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
