use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod integrations;
pub mod report;
pub mod steps;
pub mod storage;
pub mod workflow;

use api::AppState;
use config::Config;
use integrations::{ContentIndexer, DisabledMediaScanner, MediaScanProvider, MediaScanner, WebSearch};
use steps::llm::LlmSteps;
use storage::{DossierStore, PostgresStore};
use workflow::Orchestrator;
use workflow::notifier::ProgressNotifier;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "venture_orchestrator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Venture Orchestrator...");

    let config = Config::from_env().expect("Failed to load configuration");
    config.validate().expect("Invalid configuration");

    tracing::info!("Connecting to database...");

    let store = PostgresStore::connect(&config.database_url)
        .await
        .expect("Failed to create database pool");

    store
        .initialize()
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database ready");

    let store: Arc<dyn DossierStore> = Arc::new(store);

    // Analysis steps, with web search attached when configured
    let mut steps = LlmSteps::new(&config.llm_api_url, &config.llm_api_key, &config.llm_model);
    if let (Some(url), Some(key)) = (&config.search_api_url, &config.search_api_key) {
        tracing::info!("Web search enabled");
        steps = steps.with_search(Arc::new(WebSearch::new(url, key)));
    }

    let media: Arc<dyn MediaScanProvider> = match (&config.media_api_url, &config.media_api_key) {
        (Some(url), Some(key)) => {
            tracing::info!("Media scan enabled");
            Arc::new(MediaScanner::new(url, key))
        }
        _ => Arc::new(DisabledMediaScanner),
    };

    let mut orchestrator = Orchestrator::new(Arc::clone(&store), Arc::new(steps), media);
    if let (Some(url), Some(key)) = (&config.indexer_api_url, &config.indexer_api_key) {
        tracing::info!("Dossier indexing enabled");
        orchestrator = orchestrator.with_indexer(Arc::new(ContentIndexer::new(url, key)));
    }
    let orchestrator = Arc::new(orchestrator);

    let notifier = Arc::new(ProgressNotifier::new(
        Arc::clone(&store),
        config.notifier_poll_interval,
        config.notifier_max_polls,
    ));

    // Build router with all API endpoints
    let app = api::create_router(AppState {
        store,
        orchestrator: Arc::clone(&orchestrator),
        notifier,
    });

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    // Let in-flight runs reach a terminal status before exiting
    tracing::info!("Shutting down; waiting for in-flight runs...");
    orchestrator.shutdown().await;
    tracing::info!("All runs settled");
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("Failed to listen for shutdown signal");
    }
}
