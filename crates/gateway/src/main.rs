//! Runweave API Gateway
//!
//! The entry point for external requests. Handles:
//! - Retrieval tool invocations for the generation step
//! - Observability (logging, metrics, request tracing)
//! - Health and readiness probes

mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use runweave_common::{config::AppConfig, embeddings, errors::AppError, metrics, telemetry};
use runweave_retrieval::model::OpenAICompatibleModel;
use runweave_retrieval::store::create_knowledge_store;
use runweave_retrieval::RetrievalPipeline;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub embedder: Arc<dyn embeddings::Embedder>,
    pub pipeline: RetrievalPipeline,
    pub metrics_handle: PrometheusHandle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    telemetry::init_tracing("gateway", std::env::var("LOG_FORMAT").as_deref() == Ok("json"));

    info!("Starting Runweave API Gateway v{}", runweave_common::VERSION);

    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        e
    })?;
    let config = Arc::new(config);

    // Initialize metrics
    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| AppError::Configuration {
            message: format!("Failed to install metrics recorder: {}", e),
        })?;
    metrics::register_metrics();

    // Wire the pipeline collaborators from configuration
    let embedder = embeddings::create_embedder(&config.embedding)?;
    let store = create_knowledge_store(&config.knowledge_store)?;
    let model = Arc::new(OpenAICompatibleModel::new(&config.model)?);

    let pipeline = RetrievalPipeline::builder()
        .embedder(embedder.clone())
        .store(store)
        .model(model)
        .expansion_model(config.model.expansion_model.clone())
        .grading_model(config.model.grading_model.clone())
        .config(config.retrieval.clone())
        .build()?;

    let state = AppState {
        config: config.clone(),
        embedder,
        pipeline,
        metrics_handle,
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        // Retrieval tool invocation
        .route("/v1/retrieve", post(handlers::retrieve::retrieve))
        // Delta stream replay
        .route("/v1/view-state", post(handlers::view::replay))
        // Prometheus scrape
        .route("/metrics", get(handlers::health::metrics))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_id)
        .layer(request_id)
        .layer(cors)
        .with_state(state)
}

/// Wait for ctrl-c or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
