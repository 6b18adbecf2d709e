mod api;
mod config;
mod error;
mod models;
mod services;
mod store;

use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{create_rest_router, AppState};
use config::{Config, StoreConfig, StoreKind};
use services::{StatsAggregator, StatsCache, SwapFilter, SwapLister};
use store::{GatewayStore, MemoryStore, StoreError, SwapStore};

fn build_store(config: &StoreConfig) -> Result<Arc<dyn SwapStore>, StoreError> {
    match config.kind {
        StoreKind::Memory => {
            let path = config.data_file.as_deref().unwrap_or("./data/swaps.json");
            Ok(Arc::new(MemoryStore::load(path)?))
        }
        StoreKind::Gateway => {
            let url = config.url.as_deref().unwrap_or_default();
            Ok(Arc::new(GatewayStore::new(
                url,
                config.api_key.clone(),
                Duration::from_secs(config.timeout_secs),
            )?))
        }
    }
}

#[tokio::main(worker_threads = 4)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,swap_ledger_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = args.iter()
        .position(|a| a == "--config" || a == "-c")
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
        .unwrap_or("config.toml");

    let config = Config::load(config_path)?;
    tracing::info!(
        "Configuration loaded from {} ({} assets, {} excluded, {} chains)",
        config_path,
        config.swaps.assets.len(),
        config.swaps.exclude_assets.len(),
        config.swaps.chains.len(),
    );

    let store = build_store(&config.store)?;
    tracing::info!("Swap store ready: {}", store.name());

    let aggregator = StatsAggregator::new(store.clone(), &config.swaps);
    let state = Arc::new(AppState {
        filter: SwapFilter::new(&config.swaps),
        lister: SwapLister::new(store, config.swaps.default_chain.clone()),
        stats: StatsCache::new(aggregator, config.stats.cache_ttl_secs),
    });

    let app = create_rest_router(state).layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Server ready on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
