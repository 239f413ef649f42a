use anyhow::Context;
use eversvoz_usage::{
    config::Config,
    create_app,
    handlers::AppState,
    services::entitlement::create_entitlement_provider,
    storage::create_store,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eversvoz_usage=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install metrics recorder")?;

    let store = create_store(&config)
        .await
        .context("Failed to initialise usage store")?;
    let entitlements = create_entitlement_provider(&config.entitlement)
        .context("Failed to initialise entitlement provider")?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(config, store, entitlements, metrics_handle);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Usage service listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
