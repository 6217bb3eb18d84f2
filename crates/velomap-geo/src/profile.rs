//! Elevation profile of a single trip between two WGS 84 locations.

use geo::{Distance, Haversine};
use serde::Serialize;
use velomap_core::error::{Result, VelomapError};
use velomap_core::models::QueryPoint;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripProfile {
    /// Great-circle distance between start and end
    pub distance_m: f64,
    pub start_altitude_m: Option<f64>,
    pub end_altitude_m: Option<f64>,
    /// End minus start; None when either altitude is unknown
    pub altitude_difference_m: Option<f64>,
    /// Average gradient in percent; None for unknown altitudes or zero distance
    pub gradient_percent: Option<f64>,
}

pub fn trip_profile(
    start: &QueryPoint,
    end: &QueryPoint,
    start_altitude_m: Option<f64>,
    end_altitude_m: Option<f64>,
) -> Result<TripProfile> {
    for point in [start, end] {
        if !point.crs.is_geographic() {
            return Err(VelomapError::CrsMismatch {
                expected: "EPSG:4326".to_string(),
                found: point.crs.label(),
            });
        }
    }

    let distance_m = Haversine.distance(start.point(), end.point());
    let altitude_difference_m = match (start_altitude_m, end_altitude_m) {
        (Some(a), Some(b)) => Some(b - a),
        _ => None,
    };
    let gradient_percent = altitude_difference_m
        .filter(|_| distance_m > 0.0)
        .map(|diff| diff / distance_m * 100.0);

    Ok(TripProfile {
        distance_m,
        start_altitude_m,
        end_altitude_m,
        altitude_difference_m,
        gradient_percent,
    })
}
