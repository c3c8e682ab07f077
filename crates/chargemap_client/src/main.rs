use chargemap_client::{Poller, RestStationSearch, SearchConfig};
use chargemap_core::{SearchContext, StationStatus};
use chargemap_session::SessionState;
use clap::Parser;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Command line arguments for the chargemap client
#[derive(Parser, Debug)]
#[command(name = "chargemap")]
#[command(about = "EV charging station locator client")]
struct Args {
    /// Base URL of the station backend
    #[arg(long)]
    api_url: String,

    /// Latitude of the search center
    #[arg(long)]
    lat: f64,

    /// Longitude of the search center
    #[arg(long)]
    lon: f64,

    /// Search radius in meters
    #[arg(short, long, default_value = "5000")]
    radius: u32,

    /// Only request stations in this status (AVAILABLE, BUSY, OUT_OF_ORDER)
    #[arg(long)]
    status: Option<String>,

    /// Maximum number of stations to request
    #[arg(long, default_value = "50")]
    limit: u32,

    /// Seconds between refreshes
    #[arg(short, long, default_value = "300")]
    interval_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt().pretty().init();

    let mut context = SearchContext::new(args.lat, args.lon, args.radius)?;
    if let Some(raw) = &args.status {
        context = context.with_status_filter(StationStatus::from_raw(raw));
    }

    let search = RestStationSearch::new(SearchConfig::new(&args.api_url).with_limit(args.limit))?;

    let mut state = SessionState::new();
    state.begin_search(context);
    let session = Arc::new(Mutex::new(state));

    tracing::info!(
        api_url = %args.api_url,
        latitude = args.lat,
        longitude = args.lon,
        radius_meters = args.radius,
        interval_secs = args.interval_secs,
        "Starting station poller"
    );

    let poller = Poller::new(search, session, Duration::from_secs(args.interval_secs));
    poller.run().await;

    Ok(())
}
