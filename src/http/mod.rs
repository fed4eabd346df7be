//! HTTP server subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → routing layer (route handler, if a route matches)
//!     → fallback (static files or 404) otherwise
//!     → Send to client
//! ```

pub mod server;

pub use server::{RoutingServer, X_REQUEST_ID};
