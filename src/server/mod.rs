//! Dashboard API server.
//!
//! Serves the analyzed rows and summaries as JSON; the desktop dashboard is
//! a consumer of these endpoints, not part of this crate.

mod handlers;
mod state;

pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/records", get(handlers::records))
        .route("/api/summary/neighborhoods", get(handlers::summary_neighborhoods))
        .route("/api/summary/categories", get(handlers::summary_categories))
        .route("/api/neighborhoods", get(handlers::neighborhoods))
        .route("/api/resolve", get(handlers::resolve_probe))
        .route("/api/refresh", post(handlers::refresh))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, state: Arc<AppState>) {
    let app = build_router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Error: Cannot bind to {}: {}", addr, e);
            std::process::exit(1);
        });

    eprintln!("  Muhtar server listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Server error: {}", e);
            std::process::exit(1);
        });
}
