use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use library::{ArtistMissing, ArtistOutcome, Library, MissingSummary, ReconciliationService};
use scrape::MetadataAggregator;
use tracing::info;

use crate::config::ScrapeConfig;
use crate::state::{
    ApiError, AppState, CatalogResponse, JsonResult, ScrapeRequest, ScrapeResponse, UpdateRequest,
    UpdateResponse,
};
use crate::utils::{body_or_default, json_error, reconcile_error, run_blocking};

pub async fn check_missing(
    State(state): State<AppState>,
) -> JsonResult<BTreeMap<String, MissingSummary>> {
    let library = state.library.clone();
    let summary = run_blocking(move || library.summary().map_err(reconcile_error)).await?;
    Ok(Json(summary))
}

pub async fn get_missing(
    State(state): State<AppState>,
    Path(artist): Path<String>,
) -> JsonResult<ArtistMissing> {
    let library = state.library.clone();
    let missing = run_blocking(move || library.missing(&artist).map_err(reconcile_error)).await?;
    Ok(Json(missing))
}

pub async fn get_catalog(
    State(state): State<AppState>,
    Path(artist): Path<String>,
) -> JsonResult<CatalogResponse> {
    let library = state.library.clone();
    let response = run_blocking(move || {
        library.require_artist(&artist).map_err(reconcile_error)?;
        let titles = library.catalog().load(&artist);
        Ok(CatalogResponse { artist, titles })
    })
    .await?;
    Ok(Json(response))
}

pub async fn update_missing(
    State(state): State<AppState>,
    body: Result<Json<UpdateRequest>, JsonRejection>,
) -> JsonResult<UpdateResponse> {
    let request = body_or_default(body)?;
    let artist = request
        .artist
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    let scrape_real = request.scrape_real.unwrap_or(false);
    let placeholder = request.placeholder;

    let library = state.library.clone();
    let scrape = state.config.read().scrape.clone();
    let cancel = Arc::clone(&state.shutdown);
    let response = run_blocking(move || {
        let service = reconciliation(library, &scrape, cancel)?;
        let artists = match artist {
            Some(artist) => {
                let outcome = service
                    .update_artist(&artist, placeholder.as_deref(), scrape_real)
                    .map_err(reconcile_error)?;
                BTreeMap::from([(artist, ArtistOutcome::Updated(outcome))])
            }
            None => service
                .update_all(placeholder.as_deref(), scrape_real)
                .map_err(reconcile_error)?,
        };
        let updated = artists
            .values()
            .map(|outcome| match outcome {
                ArtistOutcome::Updated(outcome) => outcome.updated_count(),
                ArtistOutcome::Failed { .. } => 0,
            })
            .sum();
        Ok(UpdateResponse { updated, artists })
    })
    .await?;
    info!("Title update stored {} entries", response.updated);
    Ok(Json(response))
}

pub async fn scrape_artist(
    State(state): State<AppState>,
    Path(artist): Path<String>,
    body: Result<Json<ScrapeRequest>, JsonRejection>,
) -> JsonResult<ScrapeResponse> {
    let request = body_or_default(body)?;
    let library = state.library.clone();
    let scrape = state.config.read().scrape.clone();
    let cancel = Arc::clone(&state.shutdown);
    let response = run_blocking(move || {
        let service = reconciliation(library, &scrape, cancel)?;
        let titles = service
            .scrape_artist(&artist, request.codes)
            .map_err(reconcile_error)?;
        let found = titles.values().filter(|title| title.is_some()).count();
        Ok(ScrapeResponse {
            artist,
            found,
            titles,
        })
    })
    .await?;
    Ok(Json(response))
}

/// The blocking HTTP client lives inside the aggregator, so this must be
/// called from a blocking task.
fn reconciliation(
    library: Library,
    scrape: &ScrapeConfig,
    cancel: Arc<AtomicBool>,
) -> Result<ReconciliationService<MetadataAggregator>, ApiError> {
    let aggregator = MetadataAggregator::from_settings(
        &scrape.client_settings(),
        &scrape.source_order(),
        scrape.policy(),
    )
    .map_err(|err| {
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("scrape client error: {}", err),
        )
    })?
    .with_cancel(cancel);
    Ok(ReconciliationService::new(library, aggregator))
}
