use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use diveops_pricing::cache::{self, AppCache};
use diveops_pricing::config::Config;
use diveops_pricing::pricing::{self, LocalBackend, PricingBackend, PricingEngine, RemoteBackend};
use diveops_pricing::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,diveops_pricing=debug")),
        )
        .init();

    let config = Config::from_env()?;

    let db = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .context("failed to connect to reference store")?;

    let app_cache = AppCache::new();
    tokio::spawn(cache::start_cache_warmer(app_cache.clone(), db.clone()));

    let local: Arc<dyn PricingBackend> = Arc::new(LocalBackend::new(db.clone(), app_cache.clone()));
    let remote: Option<Arc<dyn PricingBackend>> = match &config.engine.remote_url {
        Some(url) => {
            tracing::info!("Delegating pricing to remote engine at {}", url);
            Some(Arc::new(RemoteBackend::new(
                url.clone(),
                config.engine.remote_timeout,
            )?))
        }
        None => None,
    };
    let engine = Arc::new(PricingEngine::new(local, remote));

    let state = AppState {
        db,
        cache: app_cache,
        engine,
    };

    let app = pricing::router()
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        );

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Pricing engine listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
