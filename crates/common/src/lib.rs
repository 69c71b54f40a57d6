//! Auditbase Common Library
//!
//! Shared code for the Auditbase services including:
//! - Database models and repository pattern
//! - Attachment store (disk-backed upload storage)
//! - Error types and handling
//! - Configuration management
//! - Authentication utilities
//! - Metrics and observability

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod storage;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::Repository;
pub use errors::{AppError, Result};
pub use storage::AttachmentStore;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Multipart field name carrying uploaded files
pub const UPLOAD_FIELD: &str = "attachments";
