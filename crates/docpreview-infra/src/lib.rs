//! Docpreview Infrastructure Library
//!
//! Outbound plumbing shared by the service: tracing setup, caller callbacks
//! and crash reporting.

pub mod callback;
pub mod failure;
pub mod telemetry;

pub use callback::{CallbackError, CallbackNotifier};
pub use failure::{
    BugsnagFailureSink, CompositeFailureSink, FailureReport, FailureSink, TracingFailureSink,
};
pub use telemetry::{init_telemetry, shutdown_telemetry};
