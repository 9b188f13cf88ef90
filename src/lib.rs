//! Place Finder: resolves free-text place queries through a hosted places
//! API, reads the host's position, and keeps track of markers placed on a map.

pub mod config;
pub mod format;
pub mod location;
pub mod map;
pub mod server;
