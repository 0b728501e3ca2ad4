//! Web layer module
//!
//! HTTP interface of the stream resolver. Handlers are thin and delegate to
//! the resolver and catalog services.
//!
//! - **Handlers**: HTTP request handlers organized by domain
//! - **Responses**: Standard error envelope and error-to-status mapping
//! - **Middleware**: Request logging and the overall request deadline

use anyhow::Result;
use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    catalog::CatalogService, config::Config, resolver::VideoResolver, upstream::UpstreamApi,
};

pub mod handlers;
pub mod middleware;
pub mod responses;

pub use responses::{ApiResponse, handle_error};

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: Config, api: Arc<dyn UpstreamApi>) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;
        let app = Self::create_router(AppState::new(config, api));
        Ok(Self { app, addr })
    }

    /// Create the router with all routes and middleware
    pub fn create_router(state: AppState) -> Router {
        let request_timeout = state.config.web.request_timeout;

        Router::new()
            .route("/health", get(handlers::health::health_check))
            .nest("/api", Self::api_routes())
            // Middleware (applied in reverse order)
            .layer(axum::middleware::from_fn_with_state(
                request_timeout,
                middleware::request_timeout_middleware,
            ))
            .layer(axum::middleware::from_fn(middleware::request_logging_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    fn api_routes() -> Router<AppState> {
        Router::new()
            .route("/video", get(handlers::video::get_video))
            .route("/video-url-details", get(handlers::video::get_bundled_video))
            .route(
                "/video-url-details-external",
                get(handlers::video::get_video_url_details),
            )
            .route("/hls", get(handlers::hls::get_hls))
            .route("/batches", get(handlers::catalog::list_batches))
            .route("/batch/{batch_id}/details", get(handlers::catalog::get_batch_details))
            .route("/jwt", get(handlers::jwt::decode_jwt_query))
            .route("/jwt/{token}", get(handlers::jwt::decode_jwt_path))
    }

    /// Start the web server, stopping on Ctrl-C or SIGTERM
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        info!("Listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub api: Arc<dyn UpstreamApi>,
    pub resolver: Arc<VideoResolver>,
    pub catalog: Arc<CatalogService>,
}

impl AppState {
    pub fn new(config: Config, api: Arc<dyn UpstreamApi>) -> Self {
        let resolver = VideoResolver::new(api.clone(), config.resolution.clone());
        let catalog = CatalogService::new(api.clone(), config.catalog.clone());
        Self {
            config: Arc::new(config),
            api,
            resolver: Arc::new(resolver),
            catalog: Arc::new(catalog),
        }
    }
}
