use farfit::{
    lookup::{CredentialPool, NutritionLookup, SpoonacularClient},
    load_data, prepare_data_dir, router, AppConfig, AppState,
};
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = AppConfig::from_env();
    prepare_data_dir(&config.data_path).await?;
    let data = load_data(&config.data_path).await;

    if config.lookup.api_keys.is_empty() {
        warn!("SPOONACULAR_API_KEYS is not set; food lookups will be rejected");
    }
    let source = SpoonacularClient::new(config.lookup.base_url.clone())?;
    let lookup = NutritionLookup::new(
        Arc::new(source),
        CredentialPool::new(config.lookup.api_keys.clone()),
        config.lookup.image_base_url.clone(),
    );

    let state = AppState::new(config.data_path.clone(), data, lookup, config.accounting);
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
