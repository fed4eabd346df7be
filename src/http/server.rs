//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the route table from configuration
//! - Create the Axum Router: default handling plus the routing layer
//! - Wire up middleware (tracing, request ID, timeout)
//! - Swap in rebuilt route tables on configuration updates
//! - Serve until shutdown is signalled

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::RoutingConfig;
use crate::routing::{HandlerRegistry, RouteTable, RouteTableError, SharedRouteTable, UrlRoutingLayer, UrlRoutingModule};

pub const X_REQUEST_ID: &str = "x-request-id";

/// HTTP server that resolves requests through the URL routing layer.
pub struct RoutingServer {
    app: Router,
    config: RoutingConfig,
    routes: SharedRouteTable,
    registry: HandlerRegistry,
}

impl RoutingServer {
    /// Build the server. Fails if a route cannot be built from `config`.
    pub fn new(config: RoutingConfig, registry: HandlerRegistry) -> Result<Self, RouteTableError> {
        let table = RouteTable::from_config(&config.routes, &registry)?;
        tracing::info!(routes = table.len(), "Route table loaded");

        let routes = SharedRouteTable::new(table);
        let app = Self::build_router(&config, routes.clone());
        Ok(Self {
            app,
            config,
            routes,
            registry,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Requests no route handles fall through to static files when enabled,
    /// 404 otherwise.
    #[allow(deprecated)]
    fn build_router(config: &RoutingConfig, routes: SharedRouteTable) -> Router {
        let router = if config.static_files.enabled {
            Router::new().fallback_service(ServeDir::new(&config.static_files.root))
        } else {
            Router::new().fallback(not_found)
        };

        router
            .layer(UrlRoutingLayer::new(UrlRoutingModule::new(routes)))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The assembled application, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub fn routes(&self) -> &SharedRouteTable {
        &self.routes
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Rebuild the route table from `config` and swap it in.
    ///
    /// On error the current table stays in place.
    pub fn reload(&self, config: &RoutingConfig) -> Result<(), RouteTableError> {
        rebuild(&self.routes, &self.registry, config)
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<RoutingConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let routes = self.routes.clone();
        let registry = self.registry.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                if let Err(e) = rebuild(&routes, &registry, &config) {
                    tracing::error!(error = %e, "Rejected route configuration, keeping current routes");
                }
            }
        });

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn rebuild(
    routes: &SharedRouteTable,
    registry: &HandlerRegistry,
    config: &RoutingConfig,
) -> Result<(), RouteTableError> {
    let table = RouteTable::from_config(&config.routes, registry)?;
    routes.replace(table);
    Ok(())
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "No matching route found")
}
