//! Report artifact storage using Apache OpenDAL.
//!
//! Provides vendor-agnostic object storage with support for:
//! - S3-compatible buckets (AWS S3, Cloudflare R2, MinIO)
//! - Local filesystem
//! - In-process memory (tests)
//!
//! Keys follow `rapports/{budget_id}/{rapport_id}/{nom_fichier}`.

mod config;
mod error;
mod service;

pub use config::StorageProvider;
pub use error::StorageError;
pub use service::{StorageService, StoredObject, sanitize_filename};
