use chrono::Utc;
use clap::{Parser, Subcommand};
use client::{
    InputField, TripError, TripSession,
    api::{Geocoder, HoriBackend, HttpHoriBackend, NominatimGeocoder},
    config::ClientConfig,
    render::{Camera, RenderFrame},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Plan a trip and inspect the HORI health risk along the way"
)]
struct Args {
    /// Base URL of the HORI backend (overrides HORI_API_ROOT)
    #[arg(long, global = true)]
    api_root: Option<String>,

    /// Nominatim-compatible search endpoint (overrides GEOCODER_URL)
    #[arg(long, global = true)]
    geocoder_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List address suggestions for a query
    Search { query: String },
    /// Resolve a place and show its HORI popup
    Point { query: String },
    /// Compute a route and show risk at every waypoint
    Route {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// Intermediate stop, in visit order; may be repeated
        #[arg(long = "stop")]
        stops: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = ClientConfig::from_env();
    if let Some(url) = &args.api_root {
        config = config.with_api_root(url);
    }
    if let Some(url) = &args.geocoder_url {
        config = config.with_geocoder_url(url);
    }
    tracing::info!("using HORI backend at {}", config.api_root);

    let backend = HttpHoriBackend::new(&config)?;
    let geocoder = NominatimGeocoder::new(&config)?;
    let mut session = TripSession::new(backend, geocoder);

    match args.command {
        Command::Search { query } => {
            let suggestions = session.search_address(InputField::Search, &query).await?;
            if suggestions.is_empty() {
                println!("no suggestions (queries need at least 3 characters)");
            }
            for (idx, place) in suggestions.iter().enumerate() {
                println!("{idx}: {} ({:.5}, {:.5})", place.place_name, place.lat, place.lon);
            }
        }
        Command::Point { query } => {
            resolve_first(&mut session, InputField::Search, &query).await?;
            print_frame(&session.frame());
        }
        Command::Route { from, to, stops } => {
            resolve_first(&mut session, InputField::Search, &to).await?;
            session.request_directions()?;
            resolve_first(&mut session, InputField::Source, &from).await?;
            for stop in &stops {
                let slot = session.add_stop_slot()?;
                resolve_first(&mut session, InputField::Stop(slot), stop).await?;
            }
            session.submit_route(Utc::now()).await?;
            print_frame(&session.frame());
        }
    }

    Ok(())
}

async fn resolve_first<B: HoriBackend, G: Geocoder>(
    session: &mut TripSession<B, G>,
    field: InputField,
    query: &str,
) -> Result<(), TripError> {
    if session.search_address(field, query).await?.is_empty() {
        return Err(TripError::Validation(format!("no address found for `{query}`")));
    }
    session.choose_suggestion(field, 0).await
}

fn print_frame(frame: &RenderFrame) {
    if let Some(summary) = &frame.summary {
        println!("Trip Summary");
        println!("  Distance: {}", summary.distance);
        println!("  Duration: {}", summary.duration);
        if let Some(risk) = &summary.risk {
            println!(
                "  HORI avg {:.1}, worst {} (segment {}), max AQI {}",
                risk.avg_hori, risk.worst_hori, risk.worst_idx, risk.max_aqi
            );
        }
        if let (Some(depart), Some(arrive)) = (&summary.depart_iso, &summary.arrive_iso) {
            println!("  {depart} -> {arrive}");
        }
        println!();
    }

    for marker in &frame.markers {
        println!(
            "[{:?}] ({:.5}, {:.5})",
            marker.color, marker.position.lat, marker.position.lon
        );
        for line in marker.popup.lines() {
            println!("  {line}");
        }
    }

    if let Some(path) = &frame.path {
        println!("path: {} point(s)", path.len());
    }
    if let Camera::FitBounds(b) = &frame.camera {
        println!(
            "bounds: [{:.3}..{:.3}] lat / [{:.3}..{:.3}] lon",
            b.min_lat, b.max_lat, b.min_lon, b.max_lon
        );
    }
    if let Some(error) = &frame.error {
        eprintln!("error: {error}");
    }
}
