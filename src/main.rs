use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use place_finder::config::PlacesConfig;
use place_finder::format::{format_coords, utc_offset_to_string};
use place_finder::location::{
    current_position, Geolocator, GooglePlaces, IpGeolocator, Location, PlaceResolver,
    ResolveMode,
};
use place_finder::server::{self, AppState};

/// Place Finder — resolve free-text place queries through a hosted places API.
///
/// Examples:
///   placefinder search "Eiffel Tower"
///   placefinder search Kathmandu --legacy
///   placefinder locate
///   placefinder offset -- -330
///   placefinder serve --port 3000
#[derive(Parser)]
#[command(name = "placefinder", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: PlacesConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a query to a place with coordinates and UTC offset.
    Search {
        query: String,

        /// Skip the details fetch; the result carries no UTC offset.
        #[arg(long)]
        legacy: bool,
    },
    /// Print the current position from IP geolocation.
    Locate {
        /// Run without a geolocation capability.
        #[arg(long)]
        offline: bool,
    },
    /// Format a UTC offset given in minutes.
    Offset {
        #[arg(allow_hyphen_values = true)]
        minutes: i32,
    },
    /// Serve the HTTP API.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, short = 'p', default_value_t = 3000)]
        port: u16,

        /// Run without a geolocation capability.
        #[arg(long)]
        offline: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Search { ref query, legacy } => {
            let mode = if legacy {
                ResolveMode::Legacy
            } else {
                ResolveMode::Detailed
            };
            let resolver = build_resolver(&cli.config).with_mode(mode);
            let location = resolver.resolve(query).await.unwrap_or_else(|e| fail(e));
            print_location(&location);
        }
        Command::Locate { offline } => {
            let geolocator = build_geolocator(&cli.config, offline);
            let pos = current_position(geolocator.as_deref())
                .await
                .unwrap_or_else(|e| fail(e));
            eprintln!("  \u{1F4CD} {}", format_coords(pos.latitude, pos.longitude));
            print_json(&pos);
        }
        Command::Offset { minutes } => {
            println!("{}", utc_offset_to_string(minutes));
        }
        Command::Serve {
            ref host,
            port,
            offline,
        } => {
            let state = Arc::new(AppState::new(
                build_resolver(&cli.config),
                build_geolocator(&cli.config, offline),
            ));
            if !state.resolver.is_available() {
                eprintln!("  Warning: no API key configured; searches will fail as unavailable.");
            }
            if let Err(e) = server::start(host, port, state).await {
                fail(e);
            }
        }
    }
}

fn build_resolver(config: &PlacesConfig) -> PlaceResolver {
    match GooglePlaces::from_config(config) {
        Ok(Some(places)) => PlaceResolver::new(Arc::new(places)),
        Ok(None) => PlaceResolver::unavailable(),
        Err(e) => fail(e),
    }
}

fn build_geolocator(config: &PlacesConfig, offline: bool) -> Option<Arc<dyn Geolocator>> {
    if offline {
        return None;
    }
    match IpGeolocator::from_config(config) {
        Ok(geo) => Some(Arc::new(geo)),
        Err(e) => fail(e),
    }
}

fn print_location(location: &Location) {
    eprintln!("  {}", location.display_line());
    if let Some(local) = location.local_time(Utc::now()) {
        eprintln!("  \u{1F550} {} (Local Time)", local.format("%Y-%m-%d %H:%M"));
    }
    print_json(location);
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(e),
    }
}

fn fail(err: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", err);
    std::process::exit(1);
}
