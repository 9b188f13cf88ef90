//! Boundary with the external places and geolocation capabilities.
//!
//! The resolver only ever talks to these traits. Live HTTP adapters live in
//! [`super::providers`]; tests substitute in-memory fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::{LatLng, Position};

/// Place fields that can be requested from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceField {
    Name,
    Geometry,
    PlaceId,
    UtcOffsetMinutes,
}

impl PlaceField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Geometry => "geometry",
            Self::PlaceId => "place_id",
            Self::UtcOffsetMinutes => "utc_offset_minutes",
        }
    }
}

/// Fields requested by the candidate search stage.
pub const SEARCH_FIELDS: [PlaceField; 3] =
    [PlaceField::Name, PlaceField::Geometry, PlaceField::PlaceId];

/// Fields requested by the details stage.
pub const DETAILS_FIELDS: [PlaceField; 1] = [PlaceField::UtcOffsetMinutes];

/// Status reported by the places service for each request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlacesStatus {
    Ok,
    ZeroResults,
    InvalidRequest,
    OverQueryLimit,
    RequestDenied,
    UnknownError,
    NotFound,
    #[serde(other)]
    Other,
}

impl PlacesStatus {
    pub fn is_ok(&self) -> bool {
        *self == Self::Ok
    }
}

impl fmt::Display for PlacesStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "OK",
            Self::ZeroResults => "ZERO_RESULTS",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::OverQueryLimit => "OVER_QUERY_LIMIT",
            Self::RequestDenied => "REQUEST_DENIED",
            Self::UnknownError => "UNKNOWN_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Other => "OTHER",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub fields: Vec<PlaceField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireSearchResponse")]
pub struct SearchResponse {
    pub status: PlacesStatus,
    pub results: Option<Vec<Candidate>>,
}

/// The web service answers with `candidates`; other clients use `results`.
/// Both may appear, `results` wins.
#[derive(Deserialize)]
struct WireSearchResponse {
    status: PlacesStatus,
    #[serde(default)]
    results: Option<Vec<Candidate>>,
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
}

impl From<WireSearchResponse> for SearchResponse {
    fn from(w: WireSearchResponse) -> Self {
        Self {
            status: w.status,
            results: w.results.or(w.candidates),
        }
    }
}

/// A place returned by the search stage. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub place_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(default)]
    pub location: Option<LatLng>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailsRequest {
    pub place_id: String,
    pub fields: Vec<PlaceField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailsResponse {
    pub status: PlacesStatus,
    #[serde(default, rename = "result")]
    pub details: Option<PlaceDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "WirePlaceDetails")]
pub struct PlaceDetails {
    pub utc_offset_minutes: Option<i32>,
}

/// Older payloads name the offset `utc_offset`. Both may appear,
/// `utc_offset_minutes` wins.
#[derive(Deserialize)]
struct WirePlaceDetails {
    #[serde(default)]
    utc_offset_minutes: Option<i32>,
    #[serde(default)]
    utc_offset: Option<i32>,
}

impl From<WirePlaceDetails> for PlaceDetails {
    fn from(w: WirePlaceDetails) -> Self {
        Self {
            utc_offset_minutes: w.utc_offset_minutes.or(w.utc_offset),
        }
    }
}

/// A failure to reach the service at all, as opposed to a non-OK status.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportError(pub String);

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TransportError {}

/// The external places capability.
#[async_trait]
pub trait PlacesService: Send + Sync {
    /// Find candidate places matching a free-text query.
    async fn find_place(&self, request: SearchRequest) -> Result<SearchResponse, TransportError>;

    /// Fetch additional attributes for a known place.
    async fn place_details(
        &self,
        request: DetailsRequest,
    ) -> Result<DetailsResponse, TransportError>;
}

/// The host environment's location capability.
#[async_trait]
pub trait Geolocator: Send + Sync {
    /// Current position, or the host-reported reason it is unavailable.
    async fn current_position(&self) -> Result<Position, String>;
}
