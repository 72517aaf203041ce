//! Job executor - the download, render, upload, describe, call back pipeline
//!
//! Stages run strictly in order and the first failure ends the job. Every
//! failure goes to the failure sink with the full request attached. Nothing
//! is retried and an already uploaded preview is left in place.

use docpreview_core::constants::PREVIEW_CONTENT_TYPE;
use docpreview_core::{preview_key, source_file_name, Config, JobRequest, JobResult};
use docpreview_infra::{CallbackError, CallbackNotifier, FailureReport, FailureSink};
use docpreview_processing::{
    CommandRunner, DocumentConverter, MetadataError, MetadataExtractor, ProcessError,
};
use docpreview_storage::{Storage, StorageError};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Subdirectory of the job workspace the renderer writes into
const OUTPUT_DIR: &str = "out";
const WORKSPACE_PREFIX: &str = "docpreview-";

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Failed to create working directory: {0}")]
    Workspace(#[source] std::io::Error),

    #[error(transparent)]
    Download(StorageError),

    #[error(transparent)]
    Conversion(ProcessError),

    #[error(transparent)]
    Upload(StorageError),

    #[error(transparent)]
    Metadata(MetadataError),

    #[error(transparent)]
    Callback(#[from] CallbackError),

    #[error("Job cancelled before completion")]
    Cancelled,
}

impl JobError {
    /// Pipeline stage label used in logs and crash reports
    pub fn stage(&self) -> &'static str {
        match self {
            JobError::Workspace(_) => "workspace",
            JobError::Download(_) => "download",
            JobError::Conversion(_) => "conversion",
            JobError::Upload(_) => "upload",
            JobError::Metadata(_) => "metadata",
            JobError::Callback(_) => "callback",
            JobError::Cancelled => "cancelled",
        }
    }
}

pub struct JobExecutor {
    storage: Arc<dyn Storage>,
    converter: DocumentConverter,
    metadata: MetadataExtractor,
    callbacks: CallbackNotifier,
    failures: Arc<dyn FailureSink>,
    work_dir: PathBuf,
}

impl JobExecutor {
    pub fn new(
        config: &Config,
        storage: Arc<dyn Storage>,
        runner: Arc<dyn CommandRunner>,
        failures: Arc<dyn FailureSink>,
    ) -> Result<Self, CallbackError> {
        Ok(Self {
            storage,
            converter: DocumentConverter::new(config.converter_path.clone(), runner.clone()),
            metadata: MetadataExtractor::new(config.pdf_info_path.clone(), runner),
            callbacks: CallbackNotifier::new(config.callback_timeout())?,
            failures,
            work_dir: config.work_dir.clone(),
        })
    }

    /// Run one job to completion or first failure.
    ///
    /// Failures are reported before being returned.
    #[tracing::instrument(skip(self, request), fields(
        job.id = %Uuid::new_v4(),
        bucket = %request.bucket,
        key = %request.key,
        job.status = tracing::field::Empty
    ))]
    pub async fn execute(&self, request: &JobRequest) -> Result<JobResult, JobError> {
        let start = std::time::Instant::now();
        tracing::info!("Starting conversion job");

        let outcome = self.run_pipeline(request).await;
        let span = tracing::Span::current();

        match &outcome {
            Ok(result) => {
                span.record("job.status", "completed");
                tracing::info!(
                    content_hash = %result.preview().content_hash,
                    size_bytes = result.preview().content_size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Conversion job completed"
                );
            }
            Err(e) => {
                span.record("job.status", "failed");
                self.report_failure(request, e);
            }
        }

        outcome
    }

    /// Send a failure to the crash reporters
    pub fn report_failure(&self, request: &JobRequest, error: &JobError) {
        self.failures
            .notify(&FailureReport::new(error.stage(), error, request.clone()));
    }

    async fn run_pipeline(&self, request: &JobRequest) -> Result<JobResult, JobError> {
        // Removed on drop, whichever stage ends the job
        let workspace = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(&self.work_dir)
            .map_err(JobError::Workspace)?;

        let source = workspace.path().join(source_file_name(&request.key));
        self.storage
            .download(&request.bucket, &request.key, &source)
            .await
            .map_err(JobError::Download)?;

        let rendered = self
            .converter
            .convert(&source, &workspace.path().join(OUTPUT_DIR))
            .await
            .map_err(JobError::Conversion)?;

        let destination = preview_key(&request.key);
        self.storage
            .upload(&request.bucket, &destination, PREVIEW_CONTENT_TYPE, &rendered)
            .await
            .map_err(JobError::Upload)?;

        let preview = self
            .metadata
            .extract(&rendered)
            .await
            .map_err(JobError::Metadata)?;
        let result = JobResult::completed(preview);

        self.callbacks
            .notify(&request.callback_url, request.callback_method(), &result)
            .await?;

        Ok(result)
    }
}
