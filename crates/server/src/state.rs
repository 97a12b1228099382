use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::Json;
use common::TitleCatalog;
use library::{ArtistOutcome, Library};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RwLock<ServerConfig>>,
    pub library: Library,
    /// Set on shutdown; long scrape runs stop between codes.
    pub shutdown: Arc<AtomicBool>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct UpdateRequest {
    pub artist: Option<String>,
    pub placeholder: Option<String>,
    pub scrape_real: Option<bool>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ScrapeRequest {
    pub codes: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct UpdateResponse {
    pub updated: usize,
    pub artists: BTreeMap<String, ArtistOutcome>,
}

#[derive(Serialize)]
pub struct ScrapeResponse {
    pub artist: String,
    pub found: usize,
    pub titles: BTreeMap<String, Option<String>>,
}

#[derive(Serialize)]
pub struct CatalogResponse {
    pub artist: String,
    pub titles: TitleCatalog,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type JsonResult<T> = Result<Json<T>, ApiError>;
