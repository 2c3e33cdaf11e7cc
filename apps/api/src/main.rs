mod analysis;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod resumes;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::Store;
use crate::llm_client::{CompletionClient, LlmClient};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Ranker API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the in-memory store from its on-disk image
    let store = Store::open(Some(&config.database_path)).await?;
    let (resumes, jds) = (
        store.count_resumes().await?,
        store.count_job_descriptions().await?,
    );
    info!(
        "Store ready (image: {}): {resumes} resume(s), {jds} job description(s)",
        config.database_path.display()
    );

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    info!("Spooling uploads under {}", config.upload_dir.display());

    // Initialize LLM client; analysis endpoints fail until a key is configured
    let llm: Option<Arc<dyn CompletionClient>> = match &config.openrouter_api_key {
        Some(key) => {
            let client = LlmClient::new(key.clone(), config.llm_timeout)?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(Arc::new(client))
        }
        None => {
            warn!("OPENROUTER_API_KEY not set; analysis endpoints will return errors");
            None
        }
    };
    info!("Schema policy: {}", config.schema_policy);

    let state = AppState {
        store: store.clone(),
        llm,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
