//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::service_fn;

use url_routing::config::{RouteConfig, RoutingConfig};
use url_routing::routing::{HandlerRegistry, HttpHandler, RouteHandler};
use url_routing::{RoutingServer, Shutdown};

/// A handler that always answers `body`.
pub fn text_handler(body: &'static str) -> HttpHandler {
    HttpHandler::new(service_fn(move |_req: Request<Body>| async move {
        Ok::<_, Infallible>(body.into_response())
    }))
}

pub fn text_route_handler(body: &'static str) -> RouteHandler {
    RouteHandler::service(text_handler(body))
}

pub fn route(url: &str, handler: Option<&str>) -> RouteConfig {
    RouteConfig {
        name: None,
        url: url.to_string(),
        handler: handler.map(str::to_string),
        host: None,
        defaults: Default::default(),
        constraints: Default::default(),
        methods: Vec::new(),
        data_tokens: Default::default(),
        headers: Default::default(),
    }
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// A running server bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<RoutingConfig>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn start_server(mut config: RoutingConfig, registry: HandlerRegistry) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let server = RoutingServer::new(config, registry).unwrap();
    let shutdown = Shutdown::new();
    let (config_updates, rx) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, rx, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        addr,
        shutdown,
        config_updates,
    }
}
