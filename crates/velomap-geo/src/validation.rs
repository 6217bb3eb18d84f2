use geo::{LineString, MultiPolygon, Point, Polygon, Validation};
use velomap_core::error::{Result, VelomapError};
use velomap_core::models::{
    Boundary, FreeBike, GeoCollection, Identified, RiverSegment, Station,
};

/// Validation result with details
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, location: String, reason: String) {
        self.is_valid = false;
        self.errors.push(ValidationError { location, reason });
    }

    fn absorb(&mut self, prefix: &str, other: ValidationResult) {
        for error in other.errors {
            self.add_error(format!("{}.{}", prefix, error.location), error.reason);
        }
    }
}

/// Records whose geometry can be checked before it enters the store
pub trait ValidGeometry: Identified {
    fn validate(&self) -> ValidationResult;
}

impl ValidGeometry for Station {
    fn validate(&self) -> ValidationResult {
        validate_point(&self.location)
    }
}

impl ValidGeometry for FreeBike {
    fn validate(&self) -> ValidationResult {
        validate_point(&self.location)
    }
}

impl ValidGeometry for Boundary {
    fn validate(&self) -> ValidationResult {
        validate_multipolygon(&self.geometry)
    }
}

impl ValidGeometry for RiverSegment {
    fn validate(&self) -> ValidationResult {
        validate_linestring(&self.geometry)
    }
}

pub fn validate_point(point: &Point<f64>) -> ValidationResult {
    let mut result = ValidationResult::valid();
    if !point.x().is_finite() || !point.y().is_finite() {
        result.add_error(
            format!("Point({}, {})", point.x(), point.y()),
            "Coordinates must be finite".to_string(),
        );
    }
    result
}

pub fn validate_linestring(linestring: &LineString<f64>) -> ValidationResult {
    let mut result = ValidationResult::valid();

    if linestring.0.len() < 2 {
        result.add_error(
            "LineString".to_string(),
            format!("LineString must have at least 2 points, found {}", linestring.0.len()),
        );
        return result;
    }

    for (i, coord) in linestring.0.iter().enumerate() {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            result
                .add_error(format!("LineString[{}]", i), "Coordinates must be finite".to_string());
        }
    }

    result
}

fn validate_ring(ring: &LineString<f64>, location: &str, result: &mut ValidationResult) {
    if ring.0.len() < 4 {
        result.add_error(
            location.to_string(),
            format!("Ring must have at least 4 points, found {}", ring.0.len()),
        );
    }

    if let (Some(first), Some(last)) = (ring.0.first(), ring.0.last()) {
        if first != last {
            result.add_error(
                location.to_string(),
                "Ring must be closed (first point == last point)".to_string(),
            );
        }
    }

    if ring.0.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        result.add_error(location.to_string(), "Coordinates must be finite".to_string());
    }
}

pub fn validate_polygon(polygon: &Polygon<f64>) -> ValidationResult {
    let mut result = ValidationResult::valid();

    validate_ring(polygon.exterior(), "Polygon exterior", &mut result);
    for (i, interior) in polygon.interiors().iter().enumerate() {
        validate_ring(interior, &format!("Polygon interior[{}]", i), &mut result);
    }

    // Topology is only meaningful once every ring is well formed
    if result.is_valid {
        if let Err(err) = polygon.check_validation() {
            result.add_error("Polygon".to_string(), err.to_string());
        }
    }

    result
}

pub fn validate_multipolygon(multipolygon: &MultiPolygon<f64>) -> ValidationResult {
    let mut result = ValidationResult::valid();

    if multipolygon.0.is_empty() {
        result.add_error("MultiPolygon".to_string(), "MultiPolygon has no parts".to_string());
    }

    for (i, polygon) in multipolygon.0.iter().enumerate() {
        result.absorb(&format!("MultiPolygon[{}]", i), validate_polygon(polygon));
    }

    result
}

/// Fail with `InvalidGeometry` on the first feature that does not validate
pub fn ensure_valid<T: ValidGeometry>(collection: &GeoCollection<T>) -> Result<()> {
    for feature in collection.iter() {
        let validation = feature.validate();
        if let Some(error) = validation.errors.first() {
            return Err(VelomapError::InvalidGeometry {
                feature_id: format!("{}/{}", collection.name, feature.feature_id()),
                reason: format!("{}: {}", error.location, error.reason),
            });
        }
    }
    Ok(())
}

/// Count invalid geometries in a collection
pub fn count_invalid<T: ValidGeometry>(collection: &GeoCollection<T>) -> usize {
    collection.iter().filter(|f| !f.validate().is_valid).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Coord};
    use velomap_core::models::{BoundaryKind, Crs};

    #[test]
    fn test_valid_boundary() {
        let poly = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        let city = GeoCollection::new(
            "city",
            Crs::wgs84(),
            vec![Boundary::new("Luzern", BoundaryKind::City, MultiPolygon::new(vec![poly]))],
        );
        assert!(ensure_valid(&city).is_ok());
        assert_eq!(count_invalid(&city), 0);
    }

    #[test]
    fn test_unclosed_ring_is_invalid() {
        // Built directly so the ring stays open
        let ring = LineString(vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 1.0, y: 0.0 },
            Coord { x: 1.0, y: 1.0 },
            Coord { x: 0.0, y: 1.0 },
        ]);
        let mut result = ValidationResult::valid();
        validate_ring(&ring, "ring", &mut result);
        assert!(!result.is_valid);
    }

    #[test]
    fn test_degenerate_river_is_reported_with_id() {
        let rivers = GeoCollection::new(
            "rivers",
            Crs::lv95(),
            vec![RiverSegment::new("kleine-emme", LineString::from(vec![(0.0, 0.0)]))],
        );
        let err = ensure_valid(&rivers).unwrap_err();
        match err {
            VelomapError::InvalidGeometry { feature_id, .. } => {
                assert_eq!(feature_id, "rivers/kleine-emme")
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_station() {
        let station = Station::new("nextbike_1", "Broken", f64::NAN, 8.3);
        assert!(!station.validate().is_valid);
    }

    #[test]
    fn test_self_intersecting_district_is_rejected() {
        let bowtie = polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 10.0, y: 0.0),
            (x: 0.0, y: 10.0),
        ];
        assert!(!validate_polygon(&bowtie).is_valid);

        let districts = GeoCollection::new(
            "districts",
            Crs::lv95(),
            vec![Boundary::new("Schleife", BoundaryKind::District, MultiPolygon::new(vec![bowtie]))],
        );
        match ensure_valid(&districts).unwrap_err() {
            VelomapError::InvalidGeometry { feature_id, .. } => {
                assert_eq!(feature_id, "districts/Schleife")
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(count_invalid(&districts), 1);
    }

    #[test]
    fn test_polygon_with_hole_is_valid() {
        let with_hole = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [[(x: 4.0, y: 4.0), (x: 6.0, y: 4.0), (x: 6.0, y: 6.0), (x: 4.0, y: 6.0)]],
        );
        assert!(validate_polygon(&with_hole).is_valid);
    }

    #[test]
    fn test_empty_multipolygon_is_invalid() {
        assert!(!validate_multipolygon(&MultiPolygon::new(vec![])).is_valid);
    }
}
