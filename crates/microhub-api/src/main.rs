use std::sync::Arc;

use microhub_api::{app_router, ApiConfig, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only load .env in development; deployments inject the environment.
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("microhub_api=info".parse()?))
        .init();

    let config = Arc::new(ApiConfig::from_env()?);
    tracing::info!("Starting microhub-api with config: {:?}", config);

    let state = AppState::from_config(config).await?;
    let bind_addr = state.config.bind_addr.clone();
    let router = app_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("microhub-api listening on {}", bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}
