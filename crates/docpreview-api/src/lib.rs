//! Docpreview API Library
//!
//! HTTP endpoint, job execution and application setup for the document
//! preview service.

pub mod error;
pub mod executor;
mod handlers;
pub mod job_queue;
pub mod setup;
pub mod state;

// Re-exports
pub use error::ApiError;
pub use executor::{JobError, JobExecutor};
pub use job_queue::{JobQueue, QueueError};
pub use state::AppState;
