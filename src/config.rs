//! Runtime configuration for the live providers.

use std::time::Duration;

use clap::Args;

pub const DEFAULT_PLACES_URL: &str = "https://maps.googleapis.com/maps/api/place";
pub const DEFAULT_GEOLOCATION_URL: &str = "https://ipapi.co/json/";

/// Provider settings, read from flags with environment fallbacks.
#[derive(Debug, Clone, Args)]
pub struct PlacesConfig {
    /// API key for the places service. Without it, searches fail as unavailable.
    #[arg(long, env = "PLACE_FINDER_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Base URL of the places web service.
    #[arg(long, env = "PLACE_FINDER_PLACES_URL", default_value = DEFAULT_PLACES_URL, global = true)]
    pub places_url: String,

    /// IP geolocation endpoint.
    #[arg(long, env = "PLACE_FINDER_GEOLOCATION_URL", default_value = DEFAULT_GEOLOCATION_URL, global = true)]
    pub geolocation_url: String,

    /// HTTP timeout for provider calls, in seconds.
    #[arg(long, default_value_t = 10, global = true)]
    pub timeout_secs: u64,
}

impl PlacesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            places_url: DEFAULT_PLACES_URL.to_string(),
            geolocation_url: DEFAULT_GEOLOCATION_URL.to_string(),
            timeout_secs: 10,
        }
    }
}
