//! Service wiring: storage, external tools, failure sinks and the job queue

use anyhow::{Context, Result};
use docpreview_core::Config;
use docpreview_infra::{
    BugsnagFailureSink, CompositeFailureSink, FailureSink, TracingFailureSink,
};
use docpreview_processing::SystemCommandRunner;
use std::sync::Arc;

use crate::executor::JobExecutor;
use crate::job_queue::JobQueue;
use crate::state::AppState;

pub async fn initialize_services(config: &Config) -> Result<Arc<AppState>> {
    tokio::fs::create_dir_all(&config.work_dir)
        .await
        .with_context(|| format!("Failed to create WORK_DIR {}", config.work_dir.display()))?;

    let storage = docpreview_storage::create_storage(config)
        .await
        .context("Failed to initialize storage")?;
    tracing::info!(backend = %storage.backend_type(), "Storage initialized");

    let failures = failure_sink(config)?;

    let executor = JobExecutor::new(
        config,
        storage,
        Arc::new(SystemCommandRunner::new()),
        failures,
    )
    .context("Failed to build job executor")?;

    let job_queue = JobQueue::new(
        Arc::new(executor),
        config.max_concurrent_jobs,
        config.job_queue_size,
    );

    Ok(Arc::new(AppState {
        job_queue: Arc::new(job_queue),
    }))
}

/// Tracing always; Bugsnag when an API key is configured
pub fn failure_sink(config: &Config) -> Result<Arc<dyn FailureSink>> {
    let mut sinks = CompositeFailureSink::default();
    sinks.push(Arc::new(TracingFailureSink));

    if let Some(api_key) = &config.crash_reporter.api_key {
        let bugsnag = BugsnagFailureSink::new(
            api_key.clone(),
            config.crash_reporter.notify_url.clone(),
            config.environment.clone(),
        )
        .context("Failed to build crash reporter client")?;
        sinks.push(Arc::new(bugsnag));
        tracing::info!(release_stage = %config.environment, "Crash reporting enabled");
    }

    Ok(Arc::new(sinks))
}
