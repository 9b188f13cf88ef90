//! Live providers: Google Places web service and IP-based geolocation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::service::{
    DetailsRequest, DetailsResponse, Geolocator, PlaceField, PlacesService, SearchRequest,
    SearchResponse, TransportError,
};
use super::types::Position;
use crate::config::PlacesConfig;

const USER_AGENT: &str = concat!("PlaceFinder/", env!("CARGO_PKG_VERSION"));

fn build_client(timeout: Duration) -> Result<Client, TransportError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| TransportError(e.to_string()))
}

// ─── Places provider ────────────────────────────────────────────

/// Places service backed by the Google Places web API.
pub struct GooglePlaces {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GooglePlaces {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Build from configuration. `None` when no API key is configured.
    pub fn from_config(config: &PlacesConfig) -> Result<Option<Self>, TransportError> {
        match config.api_key.as_deref() {
            Some(key) if !key.is_empty() => {
                Self::new(&config.places_url, key, config.timeout()).map(Some)
            }
            _ => Ok(None),
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, TransportError> {
        let url = format!("{}/{}/json", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError(format!("HTTP {}", status.as_u16())));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| TransportError(format!("invalid response: {}", e)))
    }
}

/// The web service names the offset field `utc_offset`; the request side
/// must use that name even though the response is decoded into minutes.
fn wire_field(field: &PlaceField) -> &'static str {
    match field {
        PlaceField::UtcOffsetMinutes => "utc_offset",
        other => other.as_str(),
    }
}

fn join_fields(fields: &[PlaceField]) -> String {
    fields.iter().map(wire_field).collect::<Vec<_>>().join(",")
}

#[async_trait]
impl PlacesService for GooglePlaces {
    #[instrument(skip(self))]
    async fn find_place(&self, request: SearchRequest) -> Result<SearchResponse, TransportError> {
        let fields = join_fields(&request.fields);
        let response: SearchResponse = self
            .get_json(
                "findplacefromtext",
                &[
                    ("input", request.query.as_str()),
                    ("inputtype", "textquery"),
                    ("fields", fields.as_str()),
                ],
            )
            .await?;
        debug!(status = %response.status, "findplacefromtext answered");
        Ok(response)
    }

    #[instrument(skip(self))]
    async fn place_details(
        &self,
        request: DetailsRequest,
    ) -> Result<DetailsResponse, TransportError> {
        let fields = join_fields(&request.fields);
        let response: DetailsResponse = self
            .get_json(
                "details",
                &[
                    ("place_id", request.place_id.as_str()),
                    ("fields", fields.as_str()),
                ],
            )
            .await?;
        debug!(status = %response.status, "details answered");
        Ok(response)
    }
}

// ─── IP-based geolocation ───────────────────────────────────────

#[derive(Deserialize)]
struct IpApiResult {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    error: Option<bool>,
    #[serde(default)]
    reason: Option<String>,
}

/// Geolocation via an IP lookup service.
pub struct IpGeolocator {
    client: Client,
    url: String,
}

impl IpGeolocator {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.to_string(),
        })
    }

    pub fn from_config(config: &PlacesConfig) -> Result<Self, TransportError> {
        Self::new(&config.geolocation_url, config.timeout())
    }
}

fn position_from(r: IpApiResult) -> Result<Position, String> {
    if r.error.unwrap_or(false) {
        return Err(r.reason.unwrap_or_else(|| "Position unavailable".into()));
    }
    let latitude = r.latitude.ok_or("no latitude in response")?;
    let longitude = r.longitude.ok_or("no longitude in response")?;
    Ok(Position {
        latitude,
        longitude,
    })
}

#[async_trait]
impl Geolocator for IpGeolocator {
    #[instrument(skip(self))]
    async fn current_position(&self) -> Result<Position, String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let r: IpApiResult = response
            .json()
            .await
            .map_err(|e| format!("invalid response: {}", e))?;

        position_from(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::service::{DETAILS_FIELDS, SEARCH_FIELDS};

    #[test]
    fn test_wire_field_names() {
        assert_eq!(join_fields(&SEARCH_FIELDS), "name,geometry,place_id");
        assert_eq!(join_fields(&DETAILS_FIELDS), "utc_offset");
    }

    #[test]
    fn test_from_config_without_key() {
        let config = PlacesConfig::default();
        assert!(GooglePlaces::from_config(&config).unwrap().is_none());

        let config = PlacesConfig {
            api_key: Some(String::new()),
            ..PlacesConfig::default()
        };
        assert!(GooglePlaces::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_from_config_trims_base_url() {
        let config = PlacesConfig {
            api_key: Some("k".into()),
            places_url: "http://localhost:9000/place/".into(),
            ..PlacesConfig::default()
        };
        let places = GooglePlaces::from_config(&config).unwrap().unwrap();
        assert_eq!(places.base_url, "http://localhost:9000/place");
    }

    #[test]
    fn test_ip_position() {
        let r: IpApiResult =
            serde_json::from_str(r#"{"latitude": 59.33, "longitude": 18.07, "city": "Stockholm"}"#)
                .unwrap();
        let pos = position_from(r).unwrap();
        assert_eq!(pos.latitude, 59.33);
        assert_eq!(pos.longitude, 18.07);
    }

    #[test]
    fn test_ip_error_reason() {
        let r: IpApiResult =
            serde_json::from_str(r#"{"error": true, "reason": "RateLimited"}"#).unwrap();
        assert_eq!(position_from(r), Err("RateLimited".to_string()));
    }

    #[test]
    fn test_ip_missing_coordinates() {
        let r: IpApiResult = serde_json::from_str(r#"{"latitude": 10.0}"#).unwrap();
        assert_eq!(position_from(r), Err("no longitude in response".to_string()));
    }
}
