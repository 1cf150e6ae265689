use anyhow::Context;
use clap::{value_parser, Arg, ArgMatches, Command};
use road_detect::{detect_road, DetectionParams, GoogleRoadResolver, LatLon, RoadsConfig};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = parse_cmdline()?;
    if args.roads.api_key.is_empty() {
        warn!("no API key given; road lookups will most likely fail");
    }

    let resolver = GoogleRoadResolver::new(args.roads)
        .with_context(|| "failed to create the road resolver")?;
    let detection = detect_road(args.previous, args.current, &resolver, &args.params);

    info!("detection finished");
    println!("Moved Current: {}", detection.moved);
    println!("Point 1: {}", detection.search_points.0);
    println!("Point 2: {}", detection.search_points.1);
    println!("{}", detection.outcome);

    Ok(())
}

struct CmdlineArgs {
    current: LatLon,
    previous: LatLon,
    params: DetectionParams,
    roads: RoadsConfig,
}

fn parse_cmdline() -> anyhow::Result<CmdlineArgs> {
    args_from_matches(&command().get_matches())
}

fn command() -> Command {
    Command::new("road_detect")
        .version("0.1.0")
        .about("Extrapolates the direction of travel from two GPS fixes and looks up the road ahead.")
        .arg(
            Arg::new("current")
                .long("current")
                .required(true)
                .value_name("LAT,LON")
                .allow_hyphen_values(true)
                .help("The current position, e.g. \"38.247250, 21.738974\"."),
        )
        .arg(
            Arg::new("previous")
                .long("previous")
                .required(true)
                .value_name("LAT,LON")
                .allow_hyphen_values(true)
                .help("The previous position."),
        )
        .arg(
            Arg::new("api_key")
                .long("api-key")
                .env("GOOGLE_MAPS_API_KEY")
                .hide_env_values(true)
                .value_name("KEY")
                .help("Google Maps API key used for the Roads and Geocoding APIs."),
        )
        .arg(
            Arg::new("step")
                .long("step")
                .value_name("METERS")
                .value_parser(value_parser!(f64))
                .default_value("25")
                .allow_hyphen_values(true)
                .help("How far to extrapolate past the current position."),
        )
        .arg(
            Arg::new("search_radius")
                .long("search-radius")
                .value_name("METERS")
                .value_parser(value_parser!(f64))
                .default_value("25")
                .help("Distance of the search points from the extrapolated position."),
        )
        .arg(
            Arg::new("offset")
                .long("offset")
                .value_name("DEGREES")
                .value_parser(value_parser!(f64))
                .default_value("30")
                .allow_hyphen_values(true)
                .help("Angle either side of the heading at which to search."),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECONDS")
                .value_parser(value_parser!(u64).range(1..))
                .default_value("10")
                .help("Timeout for each HTTP request."),
        )
}

fn args_from_matches(m: &ArgMatches) -> anyhow::Result<CmdlineArgs> {
    let api_key = m.get_one::<String>("api_key").cloned().unwrap_or_default();
    let timeout = Duration::from_secs(required::<u64>(m, "timeout")?);

    Ok(CmdlineArgs {
        current: parse_position(m, "current")?,
        previous: parse_position(m, "previous")?,
        params: DetectionParams {
            step_m: required(m, "step")?,
            search_radius_m: required(m, "search_radius")?,
            offset_deg: required(m, "offset")?,
        },
        roads: RoadsConfig::new(api_key).with_timeout(timeout),
    })
}

fn required<T: Clone + Send + Sync + 'static>(m: &ArgMatches, id: &str) -> anyhow::Result<T> {
    m.get_one::<T>(id)
        .cloned()
        .with_context(|| format!("missing value for '{id}'"))
}

fn parse_position(m: &ArgMatches, id: &str) -> anyhow::Result<LatLon> {
    let value = required::<String>(m, id)?;
    value
        .parse::<LatLon>()
        .with_context(|| format!("invalid {id} position '{value}'"))
}
