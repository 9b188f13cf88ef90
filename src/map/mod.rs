//! Map-side bookkeeping: option updates and marker placement.
//!
//! Rendering is owned by whatever implements [`MapSurface`]; this module only
//! forwards options and tracks which marker belongs to which location.

pub mod headless;
pub mod markers;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::location::LatLng;

pub use headless::{HeadlessMap, MapSnapshot, PlacedMarker};
pub use markers::{place_marker, MarkerRegistry};

/// Opaque handle to a marker created by a [`MapSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerHandle(pub u64);

impl fmt::Display for MarkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marker#{}", self.0)
    }
}

/// A partial set of map options. Unset fields leave the current value alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<LatLng>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_zoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_default_ui: Option<bool>,
}

impl MapOptions {
    /// Overlay `other` on top of `self`.
    pub fn merge(&mut self, other: &MapOptions) {
        if other.center.is_some() {
            self.center = other.center;
        }
        if other.zoom.is_some() {
            self.zoom = other.zoom;
        }
        if other.min_zoom.is_some() {
            self.min_zoom = other.min_zoom;
        }
        if other.max_zoom.is_some() {
            self.max_zoom = other.max_zoom;
        }
        if other.map_type_id.is_some() {
            self.map_type_id = other.map_type_id.clone();
        }
        if other.disable_default_ui.is_some() {
            self.disable_default_ui = other.disable_default_ui;
        }
    }
}

/// A map that can take options and host markers.
pub trait MapSurface {
    fn set_options(&mut self, options: &MapOptions);

    /// Create a marker at `position` and attach it to the map.
    fn add_marker(&mut self, position: LatLng, title: &str) -> MarkerHandle;

    /// Detach a marker. Returns false if the handle is unknown.
    fn remove_marker(&mut self, handle: MarkerHandle) -> bool;
}

/// Apply options to a map.
pub fn update_map<M: MapSurface + ?Sized>(map: &mut M, options: &MapOptions) {
    map.set_options(options);
}
