//! # viewc-server: HTTP Service for the Materialized View Compiler
//!
//! Exposes the schema pass as a service for engines whose DDL front end runs
//! elsewhere. The caller sends the database, the views to compile and the parsed
//! form of each view query; the service returns the database with every view's
//! maintenance metadata filled in.
//!
//! ```text
//! DDL front end
//!   |
//!   | HTTP POST /compile (JSON: database, views, parsed statements)
//!   v
//! viewc-server (this binary)
//!   |
//!   +-> validate each view definition
//!   +-> build grouping, aggregate and partitioning metadata
//!   +-> pick MIN/MAX maintenance indexes
//!   |
//!   | HTTP response (JSON: database, warnings)
//!   v
//! DDL front end
//! ```
//!
//! ## Endpoints
//!
//! - `GET  /health`   - Health check
//! - `GET  /config`   - Active compiler configuration
//! - `POST /compile`  - Compile a schema's materialized views
//!
//! ## Configuration
//!
//! The server listens on `0.0.0.0:3000` unless `VIEWC_BIND_ADDR` says otherwise.
//! Logging is controlled by the `RUST_LOG` environment variable (defaults to
//! `viewc=debug`).

mod routes;
mod state;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "viewc=debug".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = state::ServerConfig::from_env();
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(state::AppState::new(config));

    let app = Router::new()
        .route("/health", get(routes::health))
        .route("/config", get(routes::get_config))
        .route("/compile", post(routes::compile))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("viewc-server listening on http://{bind_addr}");
    axum::serve(listener, app).await
}
