//! Sheetload API Server implementation
//!
//! HTTP REST API server using Axum. Accepts workbook uploads and exposes the
//! table catalog (list, describe, export, delete).

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;
use crate::config::AppConfig;
use crate::ingest::IngestService;
use crate::store::Store;

/// Room for multipart framing on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// API Server configuration
#[derive(Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub version: String,
    pub service: IngestService,
}

impl AppState {
    pub fn new(service: IngestService) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            service,
        }
    }
}

/// Build the router; separate from [`run_api_server`] so tests can call it directly
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = usize::try_from(state.service.config().max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        // Ingestion and catalog endpoints
        .route("/api/v1/upload", post(handlers::upload))
        .route("/api/v1/tables", get(handlers::list_tables))
        .route(
            "/api/v1/tables/:name",
            get(handlers::table_metadata).delete(handlers::delete_table),
        )
        .route("/api/v1/tables/:name/export", get(handlers::export_table))
        // State and middleware
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the API server
pub async fn run_api_server(config: ApiConfig, app_config: AppConfig) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sheetload=info,tower_http=info".into()),
        )
        .init();

    let store = Store::connect(&app_config.store).await?;
    let service = IngestService::new(store.clone(), app_config.ingest);
    let app = build_router(Arc::new(AppState::new(service)));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Sheetload API Server starting on http://{}", addr);
    info!("   Endpoints: /api/v1/upload, /api/v1/tables, /api/v1/tables/:name");
    info!("   Health: /health, Version: /version");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Sheetload API Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping server...");
}
