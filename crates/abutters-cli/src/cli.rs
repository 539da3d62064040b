use abutters_core::config::parse_buffer_distance;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Abutters - Parcel buffer queries and mailing lists
#[derive(Parser, Debug)]
#[command(name = "abutters")]
#[command(about = "Find the parcels abutting a selected parcel", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (TOML). Defaults to ./abutters.toml when present
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Parcel FeatureServer layer URL
    #[arg(long, global = true, value_name = "URL")]
    pub service_url: Option<String>,

    /// Parcel identifier field
    #[arg(long, global = true, value_name = "FIELD")]
    pub pid_field: Option<String>,

    /// Query a local GeoJSON FeatureCollection instead of the remote service
    #[arg(long, global = true, value_name = "GEOJSON")]
    pub memory: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Select the parcel containing a location
    Locate(LocateArgs),

    /// Select a parcel by its identifier
    Search(SearchArgs),

    /// Show the effective configuration and where each value came from
    Config,
}

/// Buffer and export options shared by the selection commands
#[derive(clap::Args, Debug, Clone)]
pub struct BufferArgs {
    /// Buffer distance in feet (0 to 100000)
    #[arg(long, value_name = "FEET", value_parser = parse_feet)]
    pub buffer: Option<f64>,

    /// Export the abutters mailing list to this CSV file
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct LocateArgs {
    /// Longitude (WGS84)
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Latitude (WGS84)
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    #[command(flatten)]
    pub buffer: BufferArgs,
}

#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Parcel identifier, e.g. 0100200300
    pub pid: String,

    #[command(flatten)]
    pub buffer: BufferArgs,
}

fn parse_feet(s: &str) -> Result<f64, String> {
    parse_buffer_distance(s).map_err(|e| e.to_string())
}
