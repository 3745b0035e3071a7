use gateway::{AppState, config::get_configuration, logging::setup_logging, router};
use inference::{DetectionPipeline, load_backend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = get_configuration()?;

    let _telemetry = setup_logging(&config)?;

    tracing::info!(config = ?config, "Loaded configuration");

    tracing::info!(backend = ?config.model.backend, "Loading detection backend");
    let backend = load_backend(&config.model)?;
    tracing::info!(
        backend = backend.name(),
        labels = backend.labels().len(),
        "Detection backend loaded"
    );

    let pipeline = DetectionPipeline::new(backend, config.image_decoder());
    let app = router(AppState::new(pipeline), config.max_body_bytes());

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
