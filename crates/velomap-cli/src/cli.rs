use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use velomap_core::models::DemographicCategory;

/// velomap - Nextbike station analytics for the city of Lucerne
#[derive(Parser, Debug)]
#[command(name = "velomap")]
#[command(about = "Nextbike station analytics for the city of Lucerne", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./velomap.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the exported datasets
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// EPSG code of the projected CRS used for measurements
    #[arg(long, global = true, value_name = "EPSG")]
    pub metric_crs: Option<u32>,

    /// Minutes a loaded snapshot stays fresh
    #[arg(long, global = true, value_name = "MINUTES")]
    pub cache_ttl_minutes: Option<i64>,

    /// Segments per quarter circle when buffering stations
    #[arg(long, global = true, value_name = "N")]
    pub buffer_quadrant_segments: Option<u32>,

    /// Station snapshot day (YYYY-MM-DD, defaults to today)
    #[arg(long, global = true)]
    pub day: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List stations
    Stations(StationsArgs),

    /// Station counts and demographics per district
    Districts(DistrictsArgs),

    /// Share of the city within walking distance of a station
    Coverage(CoverageArgs),

    /// Closest stations to a location
    Nearest(NearestArgs),

    /// Stations close to a river
    Rivers(RiversArgs),

    /// Average bikes available per district at one hour of the day
    Availability(AvailabilityArgs),

    /// Free-floating bikes
    Bikes(LayerArgs),

    /// Distance and elevation profile between two locations
    Trip(TripArgs),

    /// Show the loaded datasets
    Status,

    /// Show the effective configuration and where each value comes from
    Config,
}

#[derive(Parser, Debug)]
pub struct LayerArgs {
    /// Write the map layer as GeoJSON to this file
    #[arg(long, value_name = "FILE")]
    pub geojson: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct StationsArgs {
    /// Include stations outside the city boundary
    #[arg(long)]
    pub all: bool,

    #[command(flatten)]
    pub layer: LayerArgs,
}

#[derive(Parser, Debug)]
pub struct DistrictsArgs {
    /// Demographic value to show per district (e.g. total, age_65_plus, density_per_ha)
    #[arg(long)]
    pub category: Option<DemographicCategory>,

    #[command(flatten)]
    pub layer: LayerArgs,
}

#[derive(Parser, Debug)]
pub struct CoverageArgs {
    /// Walking radius around each station in meters
    #[arg(long, short = 'r')]
    pub radius: Option<f64>,

    #[command(flatten)]
    pub layer: LayerArgs,
}

#[derive(Parser, Debug)]
pub struct NearestArgs {
    /// Latitude of the location
    #[arg(allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude of the location
    #[arg(allow_negative_numbers = true)]
    pub lon: f64,

    /// Number of stations to return
    #[arg(long, short = 'k')]
    pub k: Option<usize>,

    #[command(flatten)]
    pub layer: LayerArgs,
}

#[derive(Parser, Debug)]
pub struct RiversArgs {
    /// Maximum distance to the closest river in meters
    #[arg(long, short = 'd')]
    pub distance: Option<f64>,

    #[command(flatten)]
    pub layer: LayerArgs,
}

#[derive(Parser, Debug)]
pub struct AvailabilityArgs {
    /// Hour of the day (0-23)
    #[arg(long, default_value = "8")]
    pub hour: u8,

    /// Show the hourly profile of one station instead
    #[arg(long, value_name = "STATION_ID")]
    pub station: Option<String>,

    #[command(flatten)]
    pub layer: LayerArgs,
}

#[derive(Parser, Debug)]
pub struct TripArgs {
    #[arg(allow_negative_numbers = true)]
    pub from_lat: f64,

    #[arg(allow_negative_numbers = true)]
    pub from_lon: f64,

    #[arg(allow_negative_numbers = true)]
    pub to_lat: f64,

    #[arg(allow_negative_numbers = true)]
    pub to_lon: f64,

    /// Altitude cache file (defaults to altitude_cache.json in the data directory)
    #[arg(long, value_name = "FILE")]
    pub altitude_cache: Option<PathBuf>,
}
