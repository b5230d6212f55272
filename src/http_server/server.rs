//! # HTTP Server
//!
//! Combines the page, data and health routers into one axum app. Every
//! route is served under `/api`; `/health` is also exposed at the root.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::config::HttpServerConfig;
use super::data_routes::data_routes;
use super::health_routes::health_routes;
use super::page_routes::page_routes;
use crate::data::GenericDataService;
use crate::observability::{log_event_with_fields, Event};

/// State shared across handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: GenericDataService,
}

impl AppState {
    pub fn new(service: GenericDataService) -> Self {
        Self { service }
    }
}

/// HTTP server for the page engine
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, service: GenericDataService) -> Self {
        let router = build_router(&config, Arc::new(AppState::new(service)));
        Self { config, router }
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Binds and serves until the process is stopped.
    pub async fn start(self) -> Result<(), io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid socket address '{}': {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        log_event_with_fields(Event::HttpListening, &[("addr", &addr.to_string())]);
        axum::serve(listener, self.router).await?;

        Ok(())
    }
}

/// Build the combined router with all endpoints
pub fn build_router(config: &HttpServerConfig, state: Arc<AppState>) -> Router {
    let cors = if config.allows_any_origin() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let api = Router::new()
        .merge(health_routes())
        .merge(page_routes(state.clone()))
        .merge(data_routes(state));

    Router::new()
        .merge(health_routes())
        .nest("/api", api)
        .layer(cors)
}
