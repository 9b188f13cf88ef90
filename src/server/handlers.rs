use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::format::utc_offset_to_string;
use crate::location::{current_position, Location, LocationError, Position};
use crate::map::{place_marker, update_map, MapOptions, MapSnapshot, MarkerHandle};

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

#[derive(Debug)]
pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

fn status_for(err: &LocationError) -> StatusCode {
    match err {
        LocationError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        LocationError::Unsupported => StatusCode::NOT_IMPLEMENTED,
        LocationError::NoResult(_) => StatusCode::NOT_FOUND,
        LocationError::SearchFailed(_)
        | LocationError::IncompleteResult(_)
        | LocationError::DetailsFailed(_)
        | LocationError::IncompleteDetails(_)
        | LocationError::PositionError(_) => StatusCode::BAD_GATEWAY,
    }
}

impl From<LocationError> for ApiError {
    fn from(err: LocationError) -> Self {
        ApiError(status_for(&err), err.to_string())
    }
}

// ─── GET /api/resolve ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResolveQuery {
    pub query: Option<String>,
}

/// Only presence is checked; what an empty or blank query means is up to the
/// places service.
fn required_query(params: &ResolveQuery) -> Result<&str, ApiError> {
    params
        .query
        .as_deref()
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing 'query' parameter"))
}

pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveQuery>,
) -> Result<Json<Location>, ApiError> {
    let start = Instant::now();
    let query = required_query(&params)?;

    let location = state.resolver.resolve(query).await?;

    info!(
        query,
        id = %location.id,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /api/resolve"
    );
    Ok(Json(location))
}

// ─── GET /api/position ───────────────────────────────────────────

pub async fn position(State(state): State<Arc<AppState>>) -> Result<Json<Position>, ApiError> {
    let pos = current_position(state.geolocator.as_deref()).await?;
    Ok(Json(pos))
}

// ─── GET /api/offset ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct OffsetQuery {
    pub minutes: i32,
}

#[derive(Serialize)]
pub struct OffsetResponse {
    pub minutes: i32,
    pub formatted: String,
}

pub async fn offset(Query(params): Query<OffsetQuery>) -> Json<OffsetResponse> {
    Json(OffsetResponse {
        minutes: params.minutes,
        formatted: utc_offset_to_string(params.minutes),
    })
}

// ─── Map ─────────────────────────────────────────────────────────

pub async fn map_snapshot(State(state): State<Arc<AppState>>) -> Json<MapSnapshot> {
    let session = state.session.lock().await;
    Json(session.map.snapshot())
}

pub async fn update_options(
    State(state): State<Arc<AppState>>,
    Json(options): Json<MapOptions>,
) -> Json<MapSnapshot> {
    let mut session = state.session.lock().await;
    update_map(&mut session.map, &options);
    Json(session.map.snapshot())
}

/// Center the map on the host's current position.
pub async fn center_on_position(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MapSnapshot>, ApiError> {
    let pos = current_position(state.geolocator.as_deref()).await?;
    let mut session = state.session.lock().await;
    update_map(
        &mut session.map,
        &MapOptions {
            center: Some(pos.into()),
            ..MapOptions::default()
        },
    );
    Ok(Json(session.map.snapshot()))
}

// ─── Markers ─────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct MarkerResponse {
    pub location: Location,
    pub marker: MarkerHandle,
    /// Marker that previously represented this location and was removed.
    pub replaced: Option<MarkerHandle>,
}

#[derive(Serialize)]
pub struct MarkerEntry {
    pub id: String,
    pub marker: MarkerHandle,
}

pub async fn add_marker(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveQuery>,
) -> Result<(StatusCode, Json<MarkerResponse>), ApiError> {
    let query = required_query(&params)?;
    let location = state.resolver.resolve(query).await?;

    let mut session = state.session.lock().await;
    let session = &mut *session;
    let replaced = place_marker(&mut session.map, &location, &mut session.markers);
    let marker = session.markers.get(&location.id).ok_or_else(|| {
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "marker was not recorded")
    })?;

    info!(id = %location.id, %marker, replaced = replaced.is_some(), "POST /api/markers");
    Ok((
        StatusCode::CREATED,
        Json(MarkerResponse {
            location,
            marker,
            replaced,
        }),
    ))
}

pub async fn list_markers(State(state): State<Arc<AppState>>) -> Json<Vec<MarkerEntry>> {
    let session = state.session.lock().await;
    let mut entries: Vec<MarkerEntry> = session
        .markers
        .iter()
        .map(|(id, marker)| MarkerEntry {
            id: id.to_string(),
            marker,
        })
        .collect();
    entries.sort_by_key(|e| e.marker);
    Json(entries)
}
