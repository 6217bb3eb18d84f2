//! Trip command implementation

use anyhow::{Context, Result};
use velomap_core::models::QueryPoint;
use velomap_geo::profile::trip_profile;
use velomap_store::AltitudeCache;

use super::RunContext;
use crate::cli::TripArgs;
use crate::output::{opt_number, OutputWriter};

const ALTITUDE_CACHE_FILE: &str = "altitude_cache.json";

pub async fn execute(args: TripArgs, ctx: &RunContext, output: &OutputWriter) -> Result<()> {
    let cache_path = args
        .altitude_cache
        .clone()
        .unwrap_or_else(|| ctx.config.data_dir.value.join(ALTITUDE_CACHE_FILE));
    let cache = AltitudeCache::load(&cache_path)
        .await
        .with_context(|| format!("Failed to read altitude cache {}", cache_path.display()))?;

    let start = QueryPoint::from_lat_lon(args.from_lat, args.from_lon)?;
    let end = QueryPoint::from_lat_lon(args.to_lat, args.to_lon)?;
    let profile = trip_profile(
        &start,
        &end,
        cache.get(args.from_lat, args.from_lon),
        cache.get(args.to_lat, args.to_lon),
    )?;

    if profile.altitude_difference_m.is_none() {
        output.warning("Altitude not cached for both ends of the trip");
    }

    if output.is_json() {
        return output.result(&profile);
    }

    output.section("Trip profile");
    output.kv("Distance", format!("{:.0} m", profile.distance_m));
    output.kv("Start altitude", format!("{} m", opt_number(profile.start_altitude_m, 0)));
    output.kv("End altitude", format!("{} m", opt_number(profile.end_altitude_m, 0)));
    output.kv("Climb", format!("{} m", opt_number(profile.altitude_difference_m, 0)));
    output.kv("Gradient", format!("{} %", opt_number(profile.gradient_percent, 1)));

    Ok(())
}
