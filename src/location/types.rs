//! Core types for the location subsystem.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A plain latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// A fully resolved place. Only ever built with every field validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Place identifier assigned by the places service.
    pub id: String,
    pub name: String,
    pub position: LatLng,
    /// Minutes east of UTC. `None` only for locations resolved in legacy mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,
}

impl Location {
    /// The location's fixed UTC offset, if known and representable.
    pub fn fixed_offset(&self) -> Option<FixedOffset> {
        let minutes = self.utc_offset_minutes?;
        FixedOffset::east_opt(minutes.checked_mul(60)?)
    }

    /// Wall-clock time at the location for the given UTC instant.
    pub fn local_time(&self, now: DateTime<Utc>) -> Option<DateTime<FixedOffset>> {
        self.fixed_offset().map(|offset| now.with_timezone(&offset))
    }

    pub fn display_line(&self) -> String {
        let coords = crate::format::format_coords(self.position.lat, self.position.lng);
        match self.utc_offset_minutes {
            Some(minutes) => format!(
                "\u{1F4CD} {}\n  \u{1F552} UTC{}\n  \u{1F4D0} {}",
                self.name,
                crate::format::utc_offset_to_string(minutes),
                coords
            ),
            None => format!("\u{1F4CD} {}\n  \u{1F4D0} {}", self.name, coords),
        }
    }
}

/// A position reported by the host's geolocation capability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Position> for LatLng {
    fn from(p: Position) -> Self {
        LatLng::new(p.latitude, p.longitude)
    }
}

/// Which stages of the lookup pipeline a resolve call runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveMode {
    /// Candidate search followed by a details fetch for the UTC offset.
    #[default]
    Detailed,
    /// Candidate search only. The resulting location carries no UTC offset.
    Legacy,
}

/// How a single candidate is chosen from the search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidatePolicy {
    /// Take the first candidate the service returns; no disambiguation.
    FirstResult,
}

/// Selection policy used by [`super::PlaceResolver`].
pub const CANDIDATE_POLICY: CandidatePolicy = CandidatePolicy::FirstResult;

/// Location resolution errors.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationError {
    /// No places service is configured.
    ServiceUnavailable,
    /// The candidate search returned a non-OK status or could not be reached.
    SearchFailed(String),
    /// The search succeeded but returned no candidates.
    NoResult(String),
    /// The chosen candidate lacks a required field.
    IncompleteResult(&'static str),
    /// The details fetch returned a non-OK status, no payload, or could not be reached.
    DetailsFailed(String),
    /// The details payload has no UTC offset.
    IncompleteDetails(String),
    /// No geolocation capability is available.
    Unsupported,
    /// The geolocation capability reported an error.
    PositionError(String),
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServiceUnavailable => write!(f, "Places service is not available"),
            Self::SearchFailed(reason) => write!(f, "Place search failed: {}", reason),
            Self::NoResult(q) => write!(f, "No place found for '{}'", q),
            Self::IncompleteResult(field) => {
                write!(f, "Search result is incomplete: missing {}", field)
            }
            Self::DetailsFailed(reason) => write!(f, "Place details request failed: {}", reason),
            Self::IncompleteDetails(id) => {
                write!(f, "Place details for '{}' have no UTC offset", id)
            }
            Self::Unsupported => write!(f, "Geolocation not supported"),
            Self::PositionError(msg) => write!(f, "Geolocation error: {}", msg),
        }
    }
}

impl std::error::Error for LocationError {}
