//! Failure sink - crash reporting for job failures
//!
//! Sinks are fire-and-forget: `notify` returns immediately and a sink's own
//! delivery problems are logged, never surfaced to the job.

use docpreview_core::JobRequest;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const BUGSNAG_PAYLOAD_VERSION: &str = "5";
const BUGSNAG_TIMEOUT: Duration = Duration::from_secs(10);

/// A failed job, as reported to crash reporters
#[derive(Debug, Clone)]
pub struct FailureReport {
    /// Pipeline stage that failed (e.g. "download")
    pub stage: String,
    pub error: String,
    pub request: JobRequest,
}

impl FailureReport {
    pub fn new(stage: impl Into<String>, error: impl ToString, request: JobRequest) -> Self {
        Self {
            stage: stage.into(),
            error: error.to_string(),
            request,
        }
    }
}

pub trait FailureSink: Send + Sync {
    fn notify(&self, report: &FailureReport);
}

/// Logs failures through `tracing`
#[derive(Debug, Clone, Default)]
pub struct TracingFailureSink;

impl FailureSink for TracingFailureSink {
    fn notify(&self, report: &FailureReport) {
        tracing::error!(
            stage = %report.stage,
            error = %report.error,
            bucket = %report.request.bucket,
            key = %report.request.key,
            callback_url = %report.request.callback_url,
            callback_method = %report.request.callback_method(),
            "Job failed"
        );
    }
}

/// Sends failures to Bugsnag's notify API in the background
#[derive(Clone)]
pub struct BugsnagFailureSink {
    http_client: Client,
    api_key: String,
    notify_url: String,
    release_stage: String,
}

impl BugsnagFailureSink {
    pub fn new(
        api_key: impl Into<String>,
        notify_url: impl Into<String>,
        release_stage: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(BUGSNAG_TIMEOUT).build()?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
            notify_url: notify_url.into(),
            release_stage: release_stage.into(),
        })
    }

    fn payload(&self, report: &FailureReport) -> serde_json::Value {
        json!({
            "apiKey": self.api_key,
            "notifier": {
                "name": "docpreview",
                "version": env!("CARGO_PKG_VERSION"),
                "url": env!("CARGO_PKG_REPOSITORY"),
            },
            "events": [{
                "payloadVersion": BUGSNAG_PAYLOAD_VERSION,
                "exceptions": [{
                    "errorClass": format!("{}_error", report.stage),
                    "message": report.error,
                    "stacktrace": [],
                }],
                "context": format!("{}/{}", report.request.bucket, report.request.key),
                "severity": "error",
                "unhandled": false,
                "app": {
                    "releaseStage": self.release_stage,
                    "version": env!("CARGO_PKG_VERSION"),
                },
                "metaData": {
                    "request": {
                        "bucket": report.request.bucket,
                        "key": report.request.key,
                        "callback_url": report.request.callback_url,
                        "callback_method": report.request.callback_method(),
                    },
                    "job": {
                        "stage": report.stage,
                    },
                },
            }],
        })
    }
}

impl FailureSink for BugsnagFailureSink {
    fn notify(&self, report: &FailureReport) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(stage = %report.stage, "No runtime available, crash report dropped");
            return;
        };

        let request = self
            .http_client
            .post(&self.notify_url)
            .header("Bugsnag-Api-Key", &self.api_key)
            .header("Bugsnag-Payload-Version", BUGSNAG_PAYLOAD_VERSION)
            .json(&self.payload(report));

        handle.spawn(async move {
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!("Crash report delivered");
                }
                Ok(response) => {
                    tracing::warn!(
                        status_code = response.status().as_u16(),
                        "Crash reporter rejected report"
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to deliver crash report");
                }
            }
        });
    }
}

/// Fans a report out to several sinks
#[derive(Clone, Default)]
pub struct CompositeFailureSink {
    sinks: Vec<Arc<dyn FailureSink>>,
}

impl CompositeFailureSink {
    pub fn new(sinks: Vec<Arc<dyn FailureSink>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Arc<dyn FailureSink>) {
        self.sinks.push(sink);
    }
}

impl FailureSink for CompositeFailureSink {
    fn notify(&self, report: &FailureReport) {
        for sink in &self.sinks {
            sink.notify(report);
        }
    }
}
