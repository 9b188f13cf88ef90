//! Place lookup for the finder.
//!
//! Provides the two-stage place resolver, the service boundary it talks
//! through, live providers for the hosted places API and IP geolocation,
//! and the domain types they produce.

pub mod providers;
pub mod resolver;
pub mod service;
pub mod types;

pub use providers::{GooglePlaces, IpGeolocator};
pub use resolver::{current_position, resolve, resolve_legacy, PlaceResolver};
pub use service::{Geolocator, PlacesService};
pub use types::{LatLng, Location, LocationError, Position, ResolveMode};
