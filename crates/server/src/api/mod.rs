pub mod titles;

use axum::{
    routing::{get, post},
    Json, Router,
};

use crate::state::{AppState, HealthResponse};

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/titles/missing", get(titles::check_missing))
        .route("/titles/missing/:artist", get(titles::get_missing))
        .route("/titles/catalog/:artist", get(titles::get_catalog))
        .route("/titles/update", post(titles::update_missing))
        .route("/titles/scrape/:artist", post(titles::scrape_artist))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
