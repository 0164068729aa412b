//! Core business logic for Budgetaire.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `auth` - Roles, capabilities, password hashing and one-time codes
//! - `budget` - Balance guards for recettes, lines, expenses and orders
//! - `workflow` - Supervision, validation and approval state machines
//! - `reports` - Financial report snapshot and PDF rendering
//! - `storage` - Report artifact storage

pub mod auth;
pub mod budget;
pub mod reports;
pub mod storage;
pub mod workflow;
