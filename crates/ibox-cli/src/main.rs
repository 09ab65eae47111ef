mod commands;

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use ibox_core::{GeoPoint, ServiceFlow};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ibox-cli")]
#[command(about = "iBox route, pricing and form tooling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Decode a route and print its points, length and map region
    #[command(group(ArgGroup::new("source").required(true).args(["polyline", "directions"])))]
    Route {
        /// Encoded polyline
        #[arg(long)]
        polyline: Option<String>,

        /// Directions API response saved as JSON
        #[arg(long)]
        directions: Option<PathBuf>,
    },
    /// Encode `lat,lng` pairs into a polyline
    Encode {
        #[arg(required = true, value_parser = parse_point, allow_hyphen_values = true)]
        points: Vec<GeoPoint>,
    },
    /// Price a service selection
    #[command(group(ArgGroup::new("input").required(true).args(["selection", "selection_file"])))]
    Quote {
        /// shipping, moving, standard, storage or express
        flow: ServiceFlow,

        /// Selection as an inline JSON object
        #[arg(long)]
        selection: Option<String>,

        /// Selection read from a JSON file
        #[arg(long)]
        selection_file: Option<PathBuf>,
    },
    /// Validate a form given as repeated `--field key=value`
    Validate {
        form: FormKind,

        #[arg(long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
    },
    /// Simulate drivers around a pickup point
    Drivers {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        /// Overrides IBOX_DRIVER_COUNT
        #[arg(long)]
        count: Option<usize>,

        /// Seed for repeatable output
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Convert a coordinate delta in degrees to kilometres
    Estimate {
        #[arg(allow_hyphen_values = true)]
        delta_degrees: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormKind {
    Address,
    Measurement,
    Contact,
}

fn parse_point(raw: &str) -> Result<GeoPoint, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected lat,lng but got '{raw}'"))?;
    let lat = lat
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid latitude '{lat}': {e}"))?;
    let lng = lng
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid longitude '{lng}': {e}"))?;
    Ok(GeoPoint::new(lat, lng))
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value but got '{raw}'"))?;
    if key.trim().is_empty() {
        return Err(format!("empty field name in '{raw}'"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ibox_core::load_app_config()?;
    init_tracing(&config.log_level);
    tracing::debug!(env = %config.env, "configuration loaded");

    let output = match cli.command {
        Commands::Route {
            polyline,
            directions,
        } => commands::route(polyline.as_deref(), directions.as_deref())?,
        Commands::Encode { points } => commands::encode(&points)?,
        Commands::Quote {
            flow,
            selection,
            selection_file,
        } => commands::quote(
            &config,
            flow,
            selection.as_deref(),
            selection_file.as_deref(),
        )?,
        Commands::Validate { form, fields } => commands::validate(form, fields),
        Commands::Drivers {
            lat,
            lng,
            count,
            seed,
        } => commands::drivers(&config, GeoPoint::new(lat, lng), count, seed)?,
        Commands::Estimate { delta_degrees } => commands::estimate(delta_degrees)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests;
