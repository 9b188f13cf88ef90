use std::sync::Arc;

use tokio::sync::Mutex;

use crate::location::{Geolocator, PlaceResolver};
use crate::map::{HeadlessMap, MarkerRegistry};

/// The map and the registry of markers placed on it. Locked together so the
/// registry never points at a marker the map no longer has.
#[derive(Default)]
pub struct MapSession {
    pub map: HeadlessMap,
    pub markers: MarkerRegistry,
}

pub struct AppState {
    pub resolver: PlaceResolver,
    pub geolocator: Option<Arc<dyn Geolocator>>,
    pub session: Mutex<MapSession>,
}

impl AppState {
    pub fn new(resolver: PlaceResolver, geolocator: Option<Arc<dyn Geolocator>>) -> Self {
        Self {
            resolver,
            geolocator,
            session: Mutex::new(MapSession::default()),
        }
    }
}
