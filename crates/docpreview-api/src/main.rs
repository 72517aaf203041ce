use docpreview_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (storage, tools, job queue, routes)
    let (state, router) = docpreview_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    docpreview_api::setup::server::start_server(&config, router, state.job_queue.clone()).await?;

    Ok(())
}
