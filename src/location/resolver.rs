//! Place resolver: runs the lookup pipeline against a places service.
//!
//! Detailed flow:  candidate search → first candidate → details fetch → Location
//! Legacy flow:    candidate search → first candidate → Location (no UTC offset)

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use super::service::{
    Candidate, DetailsRequest, Geolocator, PlacesService, SearchRequest, DETAILS_FIELDS,
    SEARCH_FIELDS,
};
use super::types::{
    CandidatePolicy, LatLng, Location, LocationError, Position, ResolveMode, CANDIDATE_POLICY,
};

/// The place resolver with its two-stage pipeline.
#[derive(Clone, Default)]
pub struct PlaceResolver {
    service: Option<Arc<dyn PlacesService>>,
    mode: ResolveMode,
}

impl PlaceResolver {
    pub fn new(service: Arc<dyn PlacesService>) -> Self {
        Self {
            service: Some(service),
            mode: ResolveMode::Detailed,
        }
    }

    /// A resolver with no service attached. Every resolve fails with
    /// [`LocationError::ServiceUnavailable`].
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: ResolveMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn is_available(&self) -> bool {
        self.service.is_some()
    }

    /// Resolve a free-text query into a validated location.
    pub async fn resolve(&self, query: &str) -> Result<Location, LocationError> {
        match self.mode {
            ResolveMode::Detailed => resolve(self.service.as_deref(), query).await,
            ResolveMode::Legacy => resolve_legacy(self.service.as_deref(), query).await,
        }
    }
}

/// Resolve `query` through candidate search and details fetch.
#[instrument(skip(service))]
pub async fn resolve(
    service: Option<&dyn PlacesService>,
    query: &str,
) -> Result<Location, LocationError> {
    let service = service.ok_or(LocationError::ServiceUnavailable)?;
    let (place_id, name, position) = search_stage(service, query).await?;

    let response = service
        .place_details(DetailsRequest {
            place_id: place_id.clone(),
            fields: DETAILS_FIELDS.to_vec(),
        })
        .await
        .map_err(|e| LocationError::DetailsFailed(e.to_string()))?;

    if !response.status.is_ok() {
        warn!(%place_id, status = %response.status, "details request rejected");
        return Err(LocationError::DetailsFailed(format!(
            "status {}",
            response.status
        )));
    }
    let details = response
        .details
        .ok_or_else(|| LocationError::DetailsFailed("empty response".into()))?;

    // Zero is a real offset (UTC itself); only absence is rejected.
    let utc_offset_minutes = details
        .utc_offset_minutes
        .ok_or_else(|| LocationError::IncompleteDetails(place_id.clone()))?;

    debug!(%place_id, utc_offset_minutes, "place resolved");
    Ok(Location {
        id: place_id,
        name,
        position,
        utc_offset_minutes: Some(utc_offset_minutes),
    })
}

/// Resolve `query` with the candidate search alone.
#[instrument(skip(service))]
pub async fn resolve_legacy(
    service: Option<&dyn PlacesService>,
    query: &str,
) -> Result<Location, LocationError> {
    let service = service.ok_or(LocationError::ServiceUnavailable)?;
    let (id, name, position) = search_stage(service, query).await?;
    Ok(Location {
        id,
        name,
        position,
        utc_offset_minutes: None,
    })
}

async fn search_stage(
    service: &dyn PlacesService,
    query: &str,
) -> Result<(String, String, LatLng), LocationError> {
    let response = service
        .find_place(SearchRequest {
            query: query.to_string(),
            fields: SEARCH_FIELDS.to_vec(),
        })
        .await
        .map_err(|e| LocationError::SearchFailed(e.to_string()))?;

    if !response.status.is_ok() {
        warn!(query, status = %response.status, "search request rejected");
        return Err(LocationError::SearchFailed(format!(
            "status {}",
            response.status
        )));
    }

    let candidates = response.results.unwrap_or_default();
    debug!(query, count = candidates.len(), "search returned candidates");
    let candidate = select_candidate(candidates, CANDIDATE_POLICY)
        .ok_or_else(|| LocationError::NoResult(query.to_string()))?;

    validate_candidate(candidate)
}

fn select_candidate(candidates: Vec<Candidate>, policy: CandidatePolicy) -> Option<Candidate> {
    match policy {
        CandidatePolicy::FirstResult => candidates.into_iter().next(),
    }
}

fn validate_candidate(candidate: Candidate) -> Result<(String, String, LatLng), LocationError> {
    let position = candidate
        .geometry
        .and_then(|g| g.location)
        .ok_or(LocationError::IncompleteResult("geometry.location"))?;
    if !position.is_finite() {
        return Err(LocationError::IncompleteResult("geometry.location"));
    }
    let name = candidate
        .name
        .filter(|n| !n.is_empty())
        .ok_or(LocationError::IncompleteResult("name"))?;
    let place_id = candidate
        .place_id
        .filter(|id| !id.is_empty())
        .ok_or(LocationError::IncompleteResult("place_id"))?;
    Ok((place_id, name, position))
}

/// Ask the host for its current position.
pub async fn current_position(
    geolocator: Option<&dyn Geolocator>,
) -> Result<Position, LocationError> {
    let geolocator = geolocator.ok_or(LocationError::Unsupported)?;
    geolocator
        .current_position()
        .await
        .map_err(LocationError::PositionError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::service::{
        DetailsResponse, Geometry, PlaceDetails, PlacesStatus, SearchResponse, TransportError,
    };
    use approx::assert_relative_eq;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted places service that counts calls and records requests.
    struct FakePlaces {
        search: Result<SearchResponse, TransportError>,
        details: Result<DetailsResponse, TransportError>,
        search_calls: AtomicUsize,
        details_calls: AtomicUsize,
        details_requests: Mutex<Vec<DetailsRequest>>,
    }

    impl FakePlaces {
        fn new(search: SearchResponse, details: DetailsResponse) -> Self {
            Self {
                search: Ok(search),
                details: Ok(details),
                search_calls: AtomicUsize::new(0),
                details_calls: AtomicUsize::new(0),
                details_requests: Mutex::new(Vec::new()),
            }
        }

        fn details_calls(&self) -> usize {
            self.details_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PlacesService for FakePlaces {
        async fn find_place(
            &self,
            request: SearchRequest,
        ) -> Result<SearchResponse, TransportError> {
            assert_eq!(request.fields, SEARCH_FIELDS.to_vec());
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            self.search.clone()
        }

        async fn place_details(
            &self,
            request: DetailsRequest,
        ) -> Result<DetailsResponse, TransportError> {
            self.details_calls.fetch_add(1, Ordering::SeqCst);
            self.details_requests.lock().unwrap().push(request);
            self.details.clone()
        }
    }

    fn candidate() -> Candidate {
        Candidate {
            name: Some("Reykjavík".into()),
            geometry: Some(Geometry {
                location: Some(LatLng::new(64.1466, -21.9426)),
            }),
            place_id: Some("place-rvk".into()),
        }
    }

    fn ok_search(results: Vec<Candidate>) -> SearchResponse {
        SearchResponse {
            status: PlacesStatus::Ok,
            results: Some(results),
        }
    }

    fn ok_details(offset: Option<i32>) -> DetailsResponse {
        DetailsResponse {
            status: PlacesStatus::Ok,
            details: Some(PlaceDetails {
                utc_offset_minutes: offset,
            }),
        }
    }

    async fn run(fake: &FakePlaces) -> Result<Location, LocationError> {
        resolve(Some(fake), "reykjavik").await
    }

    #[tokio::test]
    async fn test_resolve_success() {
        let fake = FakePlaces::new(ok_search(vec![candidate()]), ok_details(Some(0)));
        let loc = run(&fake).await.unwrap();
        assert_eq!(loc.id, "place-rvk");
        assert_eq!(loc.name, "Reykjavík");
        assert_relative_eq!(loc.position.lat, 64.1466);
        assert_relative_eq!(loc.position.lng, -21.9426);
        assert_eq!(loc.utc_offset_minutes, Some(0));

        let requests = fake.details_requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].place_id, "place-rvk");
        assert_eq!(requests[0].fields, DETAILS_FIELDS.to_vec());
    }

    #[tokio::test]
    async fn test_first_candidate_wins() {
        let mut second = candidate();
        second.place_id = Some("place-other".into());
        let fake = FakePlaces::new(ok_search(vec![candidate(), second]), ok_details(Some(0)));
        assert_eq!(run(&fake).await.unwrap().id, "place-rvk");
    }

    #[tokio::test]
    async fn test_missing_service() {
        assert_eq!(
            resolve(None, "anywhere").await,
            Err(LocationError::ServiceUnavailable)
        );
        assert_eq!(
            PlaceResolver::unavailable().resolve("anywhere").await,
            Err(LocationError::ServiceUnavailable)
        );
    }

    #[tokio::test]
    async fn test_search_status_not_ok_skips_details() {
        let search = SearchResponse {
            status: PlacesStatus::OverQueryLimit,
            results: Some(vec![candidate()]),
        };
        let fake = FakePlaces::new(search, ok_details(Some(60)));
        assert!(matches!(run(&fake).await, Err(LocationError::SearchFailed(_))));
        assert_eq!(fake.search_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fake.details_calls(), 0);
    }

    #[tokio::test]
    async fn test_search_transport_error() {
        let mut fake = FakePlaces::new(ok_search(vec![]), ok_details(Some(60)));
        fake.search = Err(TransportError("connection reset".into()));
        assert_eq!(
            run(&fake).await,
            Err(LocationError::SearchFailed("connection reset".into()))
        );
        assert_eq!(fake.details_calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_results() {
        let fake = FakePlaces::new(ok_search(vec![]), ok_details(Some(60)));
        assert_eq!(
            run(&fake).await,
            Err(LocationError::NoResult("reykjavik".into()))
        );
    }

    #[tokio::test]
    async fn test_absent_results() {
        let search = SearchResponse {
            status: PlacesStatus::Ok,
            results: None,
        };
        let fake = FakePlaces::new(search, ok_details(Some(60)));
        assert!(matches!(run(&fake).await, Err(LocationError::NoResult(_))));
        assert_eq!(fake.details_calls(), 0);
    }

    #[tokio::test]
    async fn test_candidate_missing_geometry() {
        let mut c = candidate();
        c.geometry = None;
        let fake = FakePlaces::new(ok_search(vec![c]), ok_details(Some(60)));
        assert_eq!(
            run(&fake).await,
            Err(LocationError::IncompleteResult("geometry.location"))
        );
        assert_eq!(fake.details_calls(), 0);
    }

    #[tokio::test]
    async fn test_candidate_geometry_without_location() {
        let mut c = candidate();
        c.geometry = Some(Geometry { location: None });
        let fake = FakePlaces::new(ok_search(vec![c]), ok_details(Some(60)));
        assert_eq!(
            run(&fake).await,
            Err(LocationError::IncompleteResult("geometry.location"))
        );
    }

    #[tokio::test]
    async fn test_candidate_non_finite_coordinates() {
        let mut c = candidate();
        c.geometry = Some(Geometry {
            location: Some(LatLng::new(f64::NAN, 10.0)),
        });
        let fake = FakePlaces::new(ok_search(vec![c]), ok_details(Some(60)));
        assert!(matches!(
            run(&fake).await,
            Err(LocationError::IncompleteResult(_))
        ));
    }

    #[tokio::test]
    async fn test_candidate_missing_name() {
        let mut c = candidate();
        c.name = None;
        let fake = FakePlaces::new(ok_search(vec![c]), ok_details(Some(60)));
        assert_eq!(run(&fake).await, Err(LocationError::IncompleteResult("name")));
        assert_eq!(fake.details_calls(), 0);
    }

    #[tokio::test]
    async fn test_candidate_missing_place_id() {
        let mut c = candidate();
        c.place_id = None;
        let fake = FakePlaces::new(ok_search(vec![c]), ok_details(Some(60)));
        assert_eq!(
            run(&fake).await,
            Err(LocationError::IncompleteResult("place_id"))
        );
        assert_eq!(fake.details_calls(), 0);
    }

    #[tokio::test]
    async fn test_details_status_not_ok() {
        let details = DetailsResponse {
            status: PlacesStatus::NotFound,
            details: Some(PlaceDetails {
                utc_offset_minutes: Some(60),
            }),
        };
        let fake = FakePlaces::new(ok_search(vec![candidate()]), details);
        assert!(matches!(run(&fake).await, Err(LocationError::DetailsFailed(_))));
    }

    #[tokio::test]
    async fn test_details_payload_absent() {
        let details = DetailsResponse {
            status: PlacesStatus::Ok,
            details: None,
        };
        let fake = FakePlaces::new(ok_search(vec![candidate()]), details);
        assert!(matches!(run(&fake).await, Err(LocationError::DetailsFailed(_))));
    }

    #[tokio::test]
    async fn test_details_missing_offset() {
        let fake = FakePlaces::new(ok_search(vec![candidate()]), ok_details(None));
        assert_eq!(
            run(&fake).await,
            Err(LocationError::IncompleteDetails("place-rvk".into()))
        );
    }

    #[tokio::test]
    async fn test_details_negative_offset() {
        let fake = FakePlaces::new(ok_search(vec![candidate()]), ok_details(Some(-210)));
        assert_eq!(run(&fake).await.unwrap().utc_offset_minutes, Some(-210));
    }

    #[tokio::test]
    async fn test_legacy_mode_skips_details() {
        let fake = Arc::new(FakePlaces::new(
            ok_search(vec![candidate()]),
            ok_details(None),
        ));
        let resolver = PlaceResolver::new(fake.clone()).with_mode(ResolveMode::Legacy);
        let loc = resolver.resolve("reykjavik").await.unwrap();
        assert_eq!(loc.id, "place-rvk");
        assert_eq!(loc.utc_offset_minutes, None);
        assert_eq!(fake.details_calls(), 0);
    }

    #[tokio::test]
    async fn test_repeated_queries_call_service_each_time() {
        let fake = Arc::new(FakePlaces::new(
            ok_search(vec![candidate()]),
            ok_details(Some(0)),
        ));
        let resolver = PlaceResolver::new(fake.clone());
        resolver.resolve("reykjavik").await.unwrap();
        resolver.resolve("reykjavik").await.unwrap();
        assert_eq!(fake.search_calls.load(Ordering::SeqCst), 2);
        assert_eq!(fake.details_calls(), 2);
    }

    /// Answers each query with a place derived from it; offsets depend on the id.
    struct PerQueryPlaces {
        details_calls: AtomicUsize,
    }

    #[async_trait]
    impl PlacesService for PerQueryPlaces {
        async fn find_place(
            &self,
            request: SearchRequest,
        ) -> Result<SearchResponse, TransportError> {
            tokio::task::yield_now().await;
            Ok(ok_search(vec![Candidate {
                name: Some(request.query.clone()),
                geometry: Some(Geometry {
                    location: Some(LatLng::new(0.0, 0.0)),
                }),
                place_id: Some(format!("id-{}", request.query)),
            }]))
        }

        async fn place_details(
            &self,
            request: DetailsRequest,
        ) -> Result<DetailsResponse, TransportError> {
            self.details_calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            let offset = if request.place_id == "id-Tokyo" { 540 } else { -300 };
            Ok(ok_details(Some(offset)))
        }
    }

    #[tokio::test]
    async fn test_concurrent_resolves_stay_independent() {
        let places = Arc::new(PerQueryPlaces {
            details_calls: AtomicUsize::new(0),
        });
        let resolver = PlaceResolver::new(places.clone());

        let (tokyo, lima) = tokio::join!(resolver.resolve("Tokyo"), resolver.resolve("Lima"));
        let tokyo = tokyo.unwrap();
        let lima = lima.unwrap();

        assert_eq!(tokyo.id, "id-Tokyo");
        assert_eq!(tokyo.name, "Tokyo");
        assert_eq!(tokyo.utc_offset_minutes, Some(540));
        assert_eq!(lima.id, "id-Lima");
        assert_eq!(lima.name, "Lima");
        assert_eq!(lima.utc_offset_minutes, Some(-300));
        assert_eq!(places.details_calls.load(Ordering::SeqCst), 2);
    }

    struct FakeGeolocator(Result<Position, String>);

    #[async_trait]
    impl Geolocator for FakeGeolocator {
        async fn current_position(&self) -> Result<Position, String> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn test_current_position() {
        let geo = FakeGeolocator(Ok(Position {
            latitude: 1.5,
            longitude: 2.5,
        }));
        let pos = current_position(Some(&geo)).await.unwrap();
        assert_relative_eq!(pos.latitude, 1.5);
    }

    #[tokio::test]
    async fn test_current_position_unsupported() {
        assert_eq!(current_position(None).await, Err(LocationError::Unsupported));
    }

    #[tokio::test]
    async fn test_current_position_error_carries_reason() {
        let geo = FakeGeolocator(Err("User denied Geolocation".into()));
        assert_eq!(
            current_position(Some(&geo)).await,
            Err(LocationError::PositionError("User denied Geolocation".into()))
        );
    }
}
