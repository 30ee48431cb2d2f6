mod config;
mod crypto;
mod domain;
mod error;
mod services;
mod state;
mod store;
#[cfg(test)]
mod test_support;
mod time_utils;
mod web;

use crate::config::Config;
use crate::services::completion::{CompletionClient, MemoizedCompletion, TextCompletion};
use crate::services::emotion::HuggingFaceClassifier;
use crate::services::generator::PlanGenerator;
use crate::services::http::ReqwestTransport;
use crate::services::parser::TextPlanParser;
use crate::state::{AppState, SharedState};
use crate::store::document::{DocumentStore, MemoryDocumentStore, PgDocumentStore};
use crate::store::local::LocalCache;
use crate::store::plan_store::PlanStore;
use crate::store::records::Records;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let crypto = Arc::new(crypto::Crypto::from_base64_key(&config.app_enc_key)?);

    let docs = document_store(&config).await?;
    let cache = Arc::new(LocalCache::open(&config.cache_path, crypto).await?);

    let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(60))?);
    let completion: Arc<dyn TextCompletion> = Arc::new(CompletionClient::new(
        transport.clone(),
        &config.openai_base_url,
        config.openai_api_key.clone(),
        config.openai_model.clone(),
    ));
    let emotions = HuggingFaceClassifier::new(
        transport,
        config.emotion_model_url.clone(),
        config.hf_api_key.clone(),
    );
    let generator = PlanGenerator::new(completion.clone(), Arc::new(TextPlanParser))
        .with_chunk_days(config.plan_chunk_days);

    let shared: SharedState = Arc::new(AppState {
        zone: config.zone,
        generator,
        completion: completion.clone(),
        summarizer: Arc::new(MemoizedCompletion::new(completion)),
        emotions: Arc::new(emotions),
        plans: PlanStore::new(docs.clone(), cache.clone()),
        records: Records::new(docs),
        cache,
    });
    tracing::info!(
        "Plan generation via {} ({} day chunks)",
        config.openai_model,
        config.plan_chunk_days
    );

    let app = web::routes(shared)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    tracing::info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn document_store(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set, documents are kept in memory only");
        return Ok(Arc::new(MemoryDocumentStore::default()));
    };

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to run database migrations: {}", e);
            e
        })?;
    tracing::info!("Database migrations completed");

    Ok(Arc::new(PgDocumentStore::new(pool)))
}
