//! Docpreview Storage Library
//!
//! Object store client used by the conversion pipeline: download an object
//! into a local file, upload a local file under a key. Objects are addressed
//! by `(bucket, key)`; the bucket is chosen per request.
//!
//! Two backends are provided: S3 (and S3-compatible providers) and a local
//! filesystem layout of `{base_path}/{bucket}/{key}` for development.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use docpreview_core::StorageBackend;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
