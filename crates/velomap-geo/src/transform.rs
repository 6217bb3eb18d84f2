//! CRS transformation and normalization

use geo::{Coord, Point};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use velomap_core::error::{Result, VelomapError};
use velomap_core::models::{Crs, GeoCollection, Georeferenced};

/// PROJ.4 definition for the reference systems velomap knows about
pub fn proj_definition(crs: &Crs) -> Result<&'static str> {
    let definition = match crs.epsg {
        4326 => "+proj=longlat +datum=WGS84 +no_defs",
        2056 => {
            "+proj=somerc +lat_0=46.9524055555556 +lon_0=7.43958333333333 +k_0=1 \
             +x_0=2600000 +y_0=1200000 +ellps=bessel \
             +towgs84=674.374,15.056,405.346,0,0,0,0 +units=m +no_defs"
        }
        21781 => {
            "+proj=somerc +lat_0=46.9524055555556 +lon_0=7.43958333333333 +k_0=1 \
             +x_0=600000 +y_0=200000 +ellps=bessel \
             +towgs84=674.374,15.056,405.346,0,0,0,0 +units=m +no_defs"
        }
        32632 => "+proj=utm +zone=32 +datum=WGS84 +units=m +no_defs",
        3857 => {
            "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 \
             +units=m +no_defs"
        }
        _ => {
            return Err(VelomapError::UnknownCrs {
                context: format!("no projection definition for {}", crs.label()),
            })
        }
    };
    Ok(definition)
}

/// Check if two CRS are the same
pub fn crs_match(crs1: &Crs, crs2: &Crs) -> bool {
    crs1.epsg == crs2.epsg
}

/// Fail with `CrsMismatch` unless both tags name the same CRS
pub fn require_same_crs(expected: &Crs, found: &Crs) -> Result<()> {
    if !crs_match(expected, found) {
        return Err(VelomapError::CrsMismatch {
            expected: expected.label(),
            found: found.label(),
        });
    }
    Ok(())
}

/// Measurement guard: the collection must be tagged with a projected CRS
pub fn require_projected<T>(collection: &GeoCollection<T>) -> Result<&Crs> {
    let crs = collection.require_crs()?;
    if crs.is_geographic() {
        return Err(VelomapError::CrsMismatch {
            expected: "a projected CRS in meters".to_string(),
            found: format!("{} for '{}'", crs.label(), collection.name),
        });
    }
    Ok(crs)
}

/// A compiled transformation between two reference systems
pub struct Reprojector {
    from: Proj,
    to: Proj,
    from_geographic: bool,
    to_geographic: bool,
    label: String,
}

impl Reprojector {
    pub fn new(from: &Crs, to: &Crs) -> Result<Self> {
        Ok(Self {
            from: build_proj(from)?,
            to: build_proj(to)?,
            from_geographic: from.is_geographic(),
            to_geographic: to.is_geographic(),
            label: format!("{} -> {}", from, to),
        })
    }

    /// Transform one coordinate; geographic CRS are in degrees on both sides
    pub fn convert(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        let (x, y) = if self.from_geographic {
            (coord.x.to_radians(), coord.y.to_radians())
        } else {
            (coord.x, coord.y)
        };

        let mut point = (x, y, 0.0);
        transform(&self.from, &self.to, &mut point).map_err(|e| {
            VelomapError::Projection(format!(
                "{} failed at ({}, {}): {}",
                self.label, coord.x, coord.y, e
            ))
        })?;

        let (x, y) = if self.to_geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };

        if !x.is_finite() || !y.is_finite() {
            return Err(VelomapError::Projection(format!(
                "{} produced a non-finite coordinate for ({}, {})",
                self.label, coord.x, coord.y
            )));
        }

        Ok(Coord { x, y })
    }
}

fn build_proj(crs: &Crs) -> Result<Proj> {
    let definition = proj_definition(crs)?;
    Proj::from_proj_string(definition).map_err(|e| {
        VelomapError::Projection(format!("Failed to build projection for {}: {}", crs.label(), e))
    })
}

/// Reproject every feature of a collection into `target`.
///
/// The source tag is mandatory; reprojecting into the CRS the collection is
/// already in returns an equal copy.
pub fn reproject<T: Georeferenced>(
    collection: &GeoCollection<T>,
    target: &Crs,
) -> Result<GeoCollection<T>> {
    let source = collection.require_crs()?;
    if crs_match(source, target) {
        return Ok(collection.clone());
    }

    let reprojector = Reprojector::new(source, target)?;
    let convert = |c: Coord<f64>| reprojector.convert(c);
    let features = collection
        .iter()
        .map(|feature| feature.try_map_coords(&convert))
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        "Reprojected {} features of '{}' from {} to {}",
        features.len(),
        collection.name,
        source,
        target
    );

    Ok(GeoCollection::new(collection.name.clone(), target.clone(), features))
}

/// Reproject a single geometry value
pub fn reproject_geometry<G: Georeferenced>(geometry: &G, from: &Crs, to: &Crs) -> Result<G> {
    if crs_match(from, to) {
        return Ok(geometry.clone());
    }
    let reprojector = Reprojector::new(from, to)?;
    geometry.try_map_coords(&|c: Coord<f64>| reprojector.convert(c))
}

/// Reproject a single point
pub fn reproject_point(point: Point<f64>, from: &Crs, to: &Crs) -> Result<Point<f64>> {
    reproject_geometry(&point, from, to)
}
