use std::sync::Arc;

use savor_api::{
    config::{Config, DataSourceKind},
    db::{self, Cache, CacheWriterHandle, PostgresSource},
    routes::{create_router, AppState},
    services::{
        sources::{FileSource, RestaurantSource},
        ModelStore, RecommendationEngine,
    },
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "savor_api=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let source: Arc<dyn RestaurantSource> = match config.data_source {
        DataSourceKind::Postgres => {
            let pool = db::create_pool(&config.database_url).await?;
            Arc::new(PostgresSource::new(pool))
        }
        DataSourceKind::File => Arc::new(FileSource::new(&config.data_dir)),
    };

    let mut params = ModelStore::load_or_default(ModelStore::from_config(&config).as_ref()).await;
    if config.svd_seed.is_some() {
        params.seed = config.svd_seed;
    }

    let mut engine = RecommendationEngine::new(params, config.max_recommendations);
    let mut cache_handle: Option<CacheWriterHandle> = None;
    if let Some(redis_url) = &config.redis_url {
        let client = db::create_redis_client(redis_url)?;
        let (cache, handle) = Cache::connect(client).await?;
        engine = engine.with_cache(cache, config.recommendation_cache_ttl);
        cache_handle = Some(handle);
        tracing::info!("Recommendation cache enabled");
    }

    let state = AppState::new(source, engine, config.session_ttl_secs).await?;
    let app = create_router(Arc::new(state));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
