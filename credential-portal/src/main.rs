use credential_portal::AppState;
use credential_portal::config::get_configuration;
use credential_portal::orchestrator::LifecycleOrchestrator;
use credential_portal::services::credential_client::CredentialClient;
use credential_portal::startup::build_router;
use dotenvy::dotenv;
use portal_core::observability::init_tracing;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "credential-portal",
        &configuration.telemetry.log_level,
        &configuration.telemetry.otlp_endpoint,
    );

    credential_portal::services::metrics::init_metrics();

    let client = Arc::new(CredentialClient::new(
        configuration.credential_service.clone(),
    ));
    let orchestrator = Arc::new(LifecycleOrchestrator::new(client));

    let app = build_router(AppState::new(orchestrator));

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!("Starting credential-portal on {}", address);
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
