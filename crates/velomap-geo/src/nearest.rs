//! K-nearest station search around a user supplied location.

use geo::{Distance, Euclidean, Point};
use velomap_core::error::{Result, VelomapError};
use velomap_core::models::{Crs, GeoCollection, PointFeature, QueryPoint};

use crate::transform::{reproject, reproject_point};

/// A station together with its planar distance to the query point
#[derive(Debug, Clone, PartialEq)]
pub struct RankedStation<P> {
    pub station: P,
    pub distance_m: f64,
}

/// Query point plus up to K stations, closest first
#[derive(Debug, Clone, PartialEq)]
pub struct NearestQuery<P> {
    pub query: QueryPoint,
    pub ranked: Vec<RankedStation<P>>,
}

/// Find the `k` stations closest to `query`.
///
/// Distances are planar in `metric_crs`, which must be projected. Ties keep
/// the input order. The returned records are the caller's own, in the CRS the
/// caller passed them in.
pub fn nearest<P: PointFeature>(
    query: &QueryPoint,
    stations: &GeoCollection<P>,
    k: usize,
    metric_crs: &Crs,
) -> Result<NearestQuery<P>> {
    if k == 0 {
        return Err(VelomapError::invalid_parameter("k", "must be at least 1"));
    }
    if stations.is_empty() {
        return Err(VelomapError::invalid_parameter(
            "stations",
            format!("collection '{}' has no stations to rank", stations.name),
        ));
    }
    if metric_crs.is_geographic() {
        return Err(VelomapError::CrsMismatch {
            expected: "a projected CRS in meters".to_string(),
            found: metric_crs.label(),
        });
    }
    if query.crs.is_geographic() {
        // Re-validate ranges for points built without from_lat_lon
        QueryPoint::from_lat_lon(query.y, query.x)?;
    }

    let origin: Point<f64> = reproject_point(query.point(), &query.crs, metric_crs)?;
    let projected = reproject(stations, metric_crs)?;

    let mut distances: Vec<(usize, f64)> = projected
        .iter()
        .enumerate()
        .map(|(idx, station)| (idx, Euclidean.distance(origin, station.point())))
        .collect();

    // sort_by is stable, so equal distances keep input order
    distances.sort_by(|a, b| a.1.total_cmp(&b.1));
    distances.truncate(k);

    let ranked = distances
        .into_iter()
        .map(|(idx, distance_m)| RankedStation {
            station: stations.features[idx].clone(),
            distance_m,
        })
        .collect();

    Ok(NearestQuery { query: query.clone(), ranked })
}
