//! Service-area coverage of the station network.

use geo::algorithm::buffer::{Buffer, BufferStyle, LineCap};
use geo::{unary_union, Area, BooleanOps, MultiPolygon};
use serde::Serialize;
use velomap_core::error::{Result, VelomapError};
use velomap_core::models::{Crs, GeoCollection, PointFeature, PolygonFeature};

use crate::transform::{reproject_geometry, require_projected, require_same_crs};

/// Circle resolution used unless configured otherwise
pub const DEFAULT_QUADRANT_SEGMENTS: u32 = 16;

/// Area of the city within `radius_m` of at least one station
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageResult {
    /// Union of the station disks clipped to the city
    pub footprint: MultiPolygon<f64>,
    /// CRS of `footprint`
    pub crs: Crs,
    pub area_m2: f64,
    pub city_area_m2: f64,
    /// Covered share of the city, in [0, 1]
    pub ratio: f64,
    pub radius_m: f64,
}

/// Scalar part of a [`CoverageResult`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageSummary {
    pub radius_m: f64,
    pub area_m2: f64,
    pub city_area_m2: f64,
    pub ratio: f64,
}

impl CoverageResult {
    pub fn summary(&self) -> CoverageSummary {
        CoverageSummary {
            radius_m: self.radius_m,
            area_m2: self.area_m2,
            city_area_m2: self.city_area_m2,
            ratio: self.ratio,
        }
    }

    /// The footprint expressed in another CRS, typically WGS 84 for display
    pub fn footprint_in(&self, target: &Crs) -> Result<MultiPolygon<f64>> {
        reproject_geometry(&self.footprint, &self.crs, target)
    }
}

/// Coverage with the default circle resolution
pub fn coverage<P: PointFeature, G: PolygonFeature>(
    stations: &GeoCollection<P>,
    radius_m: f64,
    city: &GeoCollection<G>,
) -> Result<CoverageResult> {
    coverage_with_resolution(stations, radius_m, city, DEFAULT_QUADRANT_SEGMENTS)
}

/// Buffer every station by `radius_m`, union the disks, clip the union to the
/// city once and measure it.
pub fn coverage_with_resolution<P: PointFeature, G: PolygonFeature>(
    stations: &GeoCollection<P>,
    radius_m: f64,
    city: &GeoCollection<G>,
    quadrant_segments: u32,
) -> Result<CoverageResult> {
    if !radius_m.is_finite() || radius_m <= 0.0 {
        return Err(VelomapError::invalid_parameter(
            "radius_m",
            format!("must be a positive distance, got {}", radius_m),
        ));
    }
    if quadrant_segments == 0 {
        return Err(VelomapError::invalid_parameter(
            "quadrant_segments",
            "must be at least 1",
        ));
    }

    let crs = require_projected(city)?.clone();
    require_same_crs(&crs, stations.require_crs()?)?;

    if city.is_empty() {
        return Err(VelomapError::invalid_parameter(
            "city",
            format!("city collection '{}' is empty", city.name),
        ));
    }

    let city_union = unary_union(city.iter().flat_map(|b| b.polygon().iter()));
    let city_area_m2 = city_union.unsigned_area();
    if city_area_m2 <= 0.0 {
        return Err(VelomapError::invalid_parameter(
            "city",
            format!("city collection '{}' has zero area", city.name),
        ));
    }

    if stations.is_empty() {
        return Ok(CoverageResult {
            footprint: MultiPolygon::new(vec![]),
            crs,
            area_m2: 0.0,
            city_area_m2,
            ratio: 0.0,
            radius_m,
        });
    }

    let angle = std::f64::consts::FRAC_PI_2 / f64::from(quadrant_segments);
    let disks: Vec<MultiPolygon<f64>> = stations
        .iter()
        .map(|s| s.point().buffer_with_style(BufferStyle::new(radius_m).line_cap(LineCap::Round(angle))))
        .collect();

    let footprint = unary_union(disks.iter()).intersection(&city_union);
    let area_m2 = footprint.unsigned_area();
    let ratio = (area_m2 / city_area_m2).clamp(0.0, 1.0);

    tracing::debug!(
        "Coverage of {} stations at {} m: {:.0} of {:.0} m2 ({:.4})",
        stations.len(),
        radius_m,
        area_m2,
        city_area_m2,
        ratio
    );

    Ok(CoverageResult { footprint, crs, area_m2, city_area_m2, ratio, radius_m })
}
