mod handlers;
mod state;

use axum::routing::{get, put};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

pub use state::{AppState, MapSession};

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/resolve", get(handlers::resolve))
        .route("/api/position", get(handlers::position))
        .route("/api/offset", get(handlers::offset))
        .route("/api/map", get(handlers::map_snapshot))
        .route("/api/map/options", put(handlers::update_options))
        .route("/api/map/center", put(handlers::center_on_position))
        .route(
            "/api/markers",
            get(handlers::list_markers).post(handlers::add_marker),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, state: Arc<AppState>) -> std::io::Result<()> {
    let app = build_router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("place finder listening on http://{}", addr);
    eprintln!("  Place Finder server listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app).await
}
