//! Financial report generation.
//!
//! A report is a snapshot of one budget (its recettes, validated expenses and
//! orders) laid out on a single A4 page and rendered to PDF bytes.

pub mod error;
pub mod pdf;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::ReportError;
pub use service::ReportService;
pub use types::*;
