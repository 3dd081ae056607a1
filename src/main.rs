use std::sync::Arc;

use biblio_api::config::{Config, EngineTuning};
use biblio_api::db;
use biblio_api::routes::{create_router, AppState};
use biblio_api::services::engine::RecommendationEngine;
use biblio_api::stores::{PgCatalogStore, PgLoanStore, PgRecommendationStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "biblio_api=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    sqlx::migrate!().run(&pool).await?;

    let redis_client = db::create_redis_client(&config.redis_url)?;
    let (cache, _cache_writer) = db::Cache::new(redis_client).await;

    let loans = Arc::new(PgLoanStore::new(pool.clone()));
    let catalog = Arc::new(PgCatalogStore::new(pool.clone()));
    let engine = Arc::new(RecommendationEngine::new(
        loans,
        catalog,
        EngineTuning::default(),
    ));

    let state = AppState {
        engine,
        recommendations: Arc::new(PgRecommendationStore::new(pool)),
        cache: Some(cache),
        cache_ttl: config.recommendation_cache_ttl,
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(host = %config.host, port = config.port, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
