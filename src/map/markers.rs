//! Marker registry keyed by location id.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use super::{MapSurface, MarkerHandle};
use crate::location::Location;

/// Caller-owned mapping from `Location::id` to the marker drawn for it.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct MarkerRegistry {
    markers: HashMap<String, MarkerHandle>,
}

impl MarkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, location_id: &str) -> Option<MarkerHandle> {
        self.markers.get(location_id).copied()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, MarkerHandle)> {
        self.markers.iter().map(|(id, h)| (id.as_str(), *h))
    }

    /// Remove the entry for `location_id` and detach its marker from `map`.
    pub fn release<M: MapSurface + ?Sized>(
        &mut self,
        map: &mut M,
        location_id: &str,
    ) -> Option<MarkerHandle> {
        let handle = self.markers.remove(location_id)?;
        map.remove_marker(handle);
        Some(handle)
    }
}

/// Draw a marker for `location` and record it in `registry`.
///
/// An id that is already registered has its old marker removed from the map
/// first; the released handle is returned so the caller can drop any state it
/// keeps for it.
pub fn place_marker<M: MapSurface + ?Sized>(
    map: &mut M,
    location: &Location,
    registry: &mut MarkerRegistry,
) -> Option<MarkerHandle> {
    let released = registry.release(map, &location.id);
    if let Some(old) = released {
        debug!(id = %location.id, %old, "replacing marker");
    }
    let handle = map.add_marker(location.position, &location.name);
    registry.markers.insert(location.id.clone(), handle);
    released
}
