//! Domain models

pub mod job;

pub use job::{JobRequest, JobResult, PreviewMetadata, Thumbnails};
