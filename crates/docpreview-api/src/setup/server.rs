//! Server startup and graceful shutdown

use anyhow::Result;
use axum::Router;
use docpreview_core::Config;
use std::sync::Arc;

use crate::job_queue::JobQueue;

/// Start the server with graceful shutdown
///
/// Once the listener stops, admitted jobs are drained before returning.
pub async fn start_server(config: &Config, app: Router, job_queue: Arc<JobQueue>) -> Result<()> {
    let addr = format!("0.0.0.0:{}", config.server_port);
    tracing::info!(addr = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        converter_path = %config.converter_path,
        pdf_info_path = %config.pdf_info_path,
        work_dir = %config.work_dir.display(),
        max_concurrent_jobs = config.max_concurrent_jobs,
        job_queue_size = config.job_queue_size,
        "Server ready and accepting connections"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    job_queue.shutdown(config.shutdown_grace()).await;

    docpreview_infra::shutdown_telemetry().await;

    Ok(())
}

/// Signal handler for graceful shutdown
///
/// Listens for Ctrl+C (SIGINT) and SIGTERM signals to initiate graceful shutdown.
///
/// # Panics
/// - Panics if Ctrl+C signal handler cannot be installed (unrecoverable system error)
/// - On Unix systems, panics if SIGTERM signal handler cannot be installed (unrecoverable system error)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }

    tracing::info!("Shutting down gracefully...");
}
