use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::scrape::Scraper;

pub mod handlers;
pub mod models;

pub fn create_router(scraper: Arc<Scraper>) -> Router {
    // CORS configuration for the frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route(
            "/api/search",
            post(handlers::search_handler).get(handlers::search_get_handler),
        )
        .route("/api/download", post(handlers::download_handler))
        .with_state(scraper)
        .layer(cors)
}
