//! Docpreview Core Library
//!
//! This crate provides the domain models, configuration, and key helpers
//! shared by every docpreview component.

pub mod config;
pub mod constants;
pub mod keys;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use keys::{preview_key, source_file_name};
pub use models::{JobRequest, JobResult, PreviewMetadata, Thumbnails};
pub use storage_types::StorageBackend;
