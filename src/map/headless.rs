//! In-memory map surface. Holds options and markers without drawing anything.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{MapOptions, MapSurface, MarkerHandle};
use crate::location::LatLng;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedMarker {
    pub handle: MarkerHandle,
    pub position: LatLng,
    pub title: String,
}

/// Serializable view of a [`HeadlessMap`].
#[derive(Debug, Clone, Serialize)]
pub struct MapSnapshot {
    pub options: MapOptions,
    pub markers: Vec<PlacedMarker>,
}

#[derive(Debug, Default)]
pub struct HeadlessMap {
    options: MapOptions,
    markers: BTreeMap<MarkerHandle, PlacedMarker>,
    next_handle: u64,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: MapOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn marker(&self, handle: MarkerHandle) -> Option<&PlacedMarker> {
        self.markers.get(&handle)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn snapshot(&self) -> MapSnapshot {
        MapSnapshot {
            options: self.options.clone(),
            markers: self.markers.values().cloned().collect(),
        }
    }
}

impl MapSurface for HeadlessMap {
    fn set_options(&mut self, options: &MapOptions) {
        self.options.merge(options);
    }

    fn add_marker(&mut self, position: LatLng, title: &str) -> MarkerHandle {
        self.next_handle += 1;
        let handle = MarkerHandle(self.next_handle);
        self.markers.insert(
            handle,
            PlacedMarker {
                handle,
                position,
                title: title.to_string(),
            },
        );
        handle
    }

    fn remove_marker(&mut self, handle: MarkerHandle) -> bool {
        self.markers.remove(&handle).is_some()
    }
}
