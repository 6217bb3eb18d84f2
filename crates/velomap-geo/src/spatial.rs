//! Spatial joins between point, polygon and line collections.
//!
//! Containment is strict: a point lying exactly on a polygon boundary is not
//! "within" that polygon. Every join requires both inputs to carry the same
//! CRS tag; nothing is reprojected implicitly.

use std::collections::{BTreeMap, HashSet};

use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::{Distance, Euclidean, MultiPolygon, Point, Rect};
use velomap_core::error::{Result, VelomapError};
use velomap_core::models::{GeoCollection, LineFeature, PointFeature, PolygonFeature};

use crate::transform::{require_projected, require_same_crs};

/// Polygon with its bounding box, used to skip most containment tests
struct IndexedPolygon<'a> {
    id: &'a str,
    geometry: &'a MultiPolygon<f64>,
    bbox: Option<Rect<f64>>,
}

impl IndexedPolygon<'_> {
    fn contains(&self, point: &Point<f64>) -> bool {
        match self.bbox {
            Some(bbox) => bbox_holds(&bbox, point) && self.geometry.contains(point),
            None => false,
        }
    }
}

fn bbox_holds(bbox: &Rect<f64>, point: &Point<f64>) -> bool {
    point.x() >= bbox.min().x
        && point.x() <= bbox.max().x
        && point.y() >= bbox.min().y
        && point.y() <= bbox.max().y
}

fn index_polygons<G: PolygonFeature>(polygons: &GeoCollection<G>) -> Result<Vec<IndexedPolygon<'_>>> {
    let mut seen = HashSet::new();
    polygons
        .iter()
        .map(|feature| {
            let id = feature.feature_id();
            if !seen.insert(id) {
                return Err(VelomapError::invalid_parameter(
                    "polygons",
                    format!("duplicate polygon id '{}' in '{}'", id, polygons.name),
                ));
            }
            Ok(IndexedPolygon {
                id,
                geometry: feature.polygon(),
                bbox: feature.polygon().bounding_rect(),
            })
        })
        .collect()
}

fn check_same_crs<A, B>(a: &GeoCollection<A>, b: &GeoCollection<B>) -> Result<()> {
    require_same_crs(b.require_crs()?, a.require_crs()?)
}

/// Count the points strictly inside each polygon.
///
/// The result has exactly one entry per polygon, zero when nothing falls
/// inside. Overlapping polygons each count a shared point.
pub fn count_points_in_polygons<P: PointFeature, G: PolygonFeature>(
    points: &GeoCollection<P>,
    polygons: &GeoCollection<G>,
) -> Result<BTreeMap<String, usize>> {
    check_same_crs(points, polygons)?;
    let index = index_polygons(polygons)?;

    let mut counts: BTreeMap<String, usize> =
        index.iter().map(|p| (p.id.to_string(), 0)).collect();

    for feature in points.iter() {
        let point = feature.point();
        for polygon in index.iter().filter(|p| p.contains(&point)) {
            if let Some(count) = counts.get_mut(polygon.id) {
                *count += 1;
            }
        }
    }

    tracing::debug!(
        "Counted {} points of '{}' in {} polygons of '{}'",
        points.len(),
        points.name,
        polygons.len(),
        polygons.name
    );

    Ok(counts)
}

/// Assign each point to the first polygon that strictly contains it
pub fn assign_to_polygons<P: PointFeature, G: PolygonFeature>(
    points: &GeoCollection<P>,
    polygons: &GeoCollection<G>,
) -> Result<Vec<(String, Option<String>)>> {
    check_same_crs(points, polygons)?;
    let index = index_polygons(polygons)?;

    Ok(points
        .iter()
        .map(|feature| {
            let point = feature.point();
            let owner = index.iter().find(|p| p.contains(&point)).map(|p| p.id.to_string());
            (feature.feature_id().to_string(), owner)
        })
        .collect())
}

/// Keep the points strictly inside any feature of `boundary`
pub fn filter_within_boundary<P: PointFeature, G: PolygonFeature>(
    points: &GeoCollection<P>,
    boundary: &GeoCollection<G>,
) -> Result<GeoCollection<P>> {
    check_same_crs(points, boundary)?;
    if boundary.is_empty() {
        return Err(VelomapError::invalid_parameter(
            "boundary",
            format!("boundary collection '{}' is empty", boundary.name),
        ));
    }

    let polygons: Vec<_> = boundary
        .iter()
        .map(|b| IndexedPolygon {
            id: b.feature_id(),
            geometry: b.polygon(),
            bbox: b.polygon().bounding_rect(),
        })
        .collect();

    let inside = points.filtered(|p| {
        let point = p.point();
        polygons.iter().any(|polygon| polygon.contains(&point))
    });

    tracing::debug!(
        "{} of {} points of '{}' lie within '{}'",
        inside.len(),
        points.len(),
        points.name,
        boundary.name
    );

    Ok(inside)
}

/// Minimum planar distance from `point` to any of `lines`, None without lines
pub fn min_distance_to_lines<L: LineFeature>(point: &Point<f64>, lines: &[L]) -> Option<f64> {
    lines
        .iter()
        .filter_map(|feature| {
            let line = feature.line();
            match line.0.len() {
                0 => None,
                1 => Some(Euclidean.distance(*point, Point::from(line.0[0]))),
                _ => Some(Euclidean.distance(point, line)),
            }
        })
        .min_by(f64::total_cmp)
}

/// Keep the points whose distance to the nearest line is at most `max_distance`.
///
/// Both collections must share one projected CRS so that `max_distance` is in
/// meters. Every point is measured against every line.
pub fn filter_by_proximity_to_lines<P: PointFeature, L: LineFeature>(
    points: &GeoCollection<P>,
    lines: &GeoCollection<L>,
    max_distance: f64,
) -> Result<GeoCollection<P>> {
    if !max_distance.is_finite() || max_distance < 0.0 {
        return Err(VelomapError::invalid_parameter(
            "max_distance",
            format!("must be a finite distance >= 0, got {}", max_distance),
        ));
    }

    let crs = require_projected(points)?;
    require_same_crs(crs, require_projected(lines)?)?;

    tracing::debug!(
        "Brute-force proximity: {} points x {} lines",
        points.len(),
        lines.len()
    );

    Ok(points.filtered(|p| {
        min_distance_to_lines(&p.point(), &lines.features)
            .is_some_and(|distance| distance <= max_distance)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, LineString};
    use velomap_core::models::{Boundary, BoundaryKind, Crs, RiverSegment, Station};

    fn square(name: &str, x0: f64, y0: f64, size: f64) -> Boundary {
        let poly = polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
        ];
        Boundary::new(name, BoundaryKind::District, MultiPolygon::new(vec![poly]))
    }

    fn stations(coords: &[(f64, f64)]) -> GeoCollection<Station> {
        GeoCollection::new(
            "stations",
            Crs::lv95(),
            coords
                .iter()
                .enumerate()
                .map(|(i, (x, y))| Station::at(format!("nextbike_{}", i), "s", *x, *y))
                .collect(),
        )
    }

    #[test]
    fn test_count_one_entry_per_polygon() {
        let districts = GeoCollection::new(
            "districts",
            Crs::lv95(),
            vec![square("A", 0.0, 0.0, 10.0), square("B", 20.0, 0.0, 10.0)],
        );
        let points = stations(&[(5.0, 5.0), (6.0, 6.0), (50.0, 50.0)]);

        let counts = count_points_in_polygons(&points, &districts).unwrap();

        assert_eq!(counts.len(), 2);
        assert_eq!(counts["A"], 2);
        assert_eq!(counts["B"], 0);
    }

    #[test]
    fn test_boundary_point_is_not_within() {
        let districts =
            GeoCollection::new("districts", Crs::lv95(), vec![square("A", 0.0, 0.0, 10.0)]);
        let points = stations(&[(0.0, 5.0), (10.0, 10.0)]);

        let counts = count_points_in_polygons(&points, &districts).unwrap();
        assert_eq!(counts["A"], 0);
    }

    #[test]
    fn test_duplicate_polygon_ids_are_rejected() {
        let districts = GeoCollection::new(
            "districts",
            Crs::lv95(),
            vec![square("A", 0.0, 0.0, 10.0), square("A", 20.0, 0.0, 10.0)],
        );
        let err = count_points_in_polygons(&stations(&[]), &districts).unwrap_err();
        assert!(matches!(err, VelomapError::InvalidParameter { .. }));
    }

    #[test]
    fn test_mixed_crs_is_rejected() {
        let districts =
            GeoCollection::new("districts", Crs::wgs84(), vec![square("A", 0.0, 0.0, 10.0)]);
        let err = count_points_in_polygons(&stations(&[(1.0, 1.0)]), &districts).unwrap_err();
        assert!(matches!(err, VelomapError::CrsMismatch { .. }));
    }

    #[test]
    fn test_assign_to_polygons() {
        let districts = GeoCollection::new(
            "districts",
            Crs::lv95(),
            vec![square("A", 0.0, 0.0, 10.0), square("B", 20.0, 0.0, 10.0)],
        );
        let assigned =
            assign_to_polygons(&stations(&[(25.0, 5.0), (15.0, 5.0)]), &districts).unwrap();

        assert_eq!(assigned[0], ("nextbike_0".to_string(), Some("B".to_string())));
        assert_eq!(assigned[1], ("nextbike_1".to_string(), None));
    }

    #[test]
    fn test_filter_within_boundary() {
        let city = GeoCollection::new("city", Crs::lv95(), vec![square("Luzern", 0.0, 0.0, 100.0)]);
        let inside = filter_within_boundary(&stations(&[(50.0, 50.0), (150.0, 50.0)]), &city)
            .unwrap();

        assert_eq!(inside.len(), 1);
        assert_eq!(inside.features[0].id.as_str(), "nextbike_0");

        let empty: GeoCollection<Boundary> = GeoCollection::new("city", Crs::lv95(), vec![]);
        assert!(filter_within_boundary(&stations(&[(1.0, 1.0)]), &empty).is_err());
    }

    #[test]
    fn test_proximity_threshold_is_inclusive() {
        let rivers = GeoCollection::new(
            "rivers",
            Crs::lv95(),
            vec![RiverSegment::new("reuss", LineString::from(vec![(0.0, 0.0), (1000.0, 0.0)]))],
        );
        let points = stations(&[(500.0, 100.0), (500.0, 100.5), (-50.0, 0.0)]);

        let near = filter_by_proximity_to_lines(&points, &rivers, 100.0).unwrap();
        let ids: Vec<_> = near.iter().map(|s| s.id.as_str()).collect();

        assert_eq!(ids, vec!["nextbike_0", "nextbike_2"]);
    }

    #[test]
    fn test_proximity_requires_projected_crs() {
        let rivers: GeoCollection<RiverSegment> = GeoCollection::new("rivers", Crs::wgs84(), vec![]);
        let points = GeoCollection::new("stations", Crs::wgs84(), vec![]);
        let err = filter_by_proximity_to_lines::<Station, _>(&points, &rivers, 10.0).unwrap_err();
        assert!(matches!(err, VelomapError::CrsMismatch { .. }));
    }

    #[test]
    fn test_proximity_rejects_negative_distance() {
        let rivers: GeoCollection<RiverSegment> = GeoCollection::new("rivers", Crs::lv95(), vec![]);
        let err = filter_by_proximity_to_lines(&stations(&[]), &rivers, -1.0).unwrap_err();
        assert!(matches!(err, VelomapError::InvalidParameter { .. }));

        let err = filter_by_proximity_to_lines(&stations(&[]), &rivers, f64::NAN).unwrap_err();
        assert!(matches!(err, VelomapError::InvalidParameter { .. }));
    }

    #[test]
    fn test_min_distance_without_lines() {
        let lines: Vec<RiverSegment> = vec![];
        assert_eq!(min_distance_to_lines(&Point::new(0.0, 0.0), &lines), None);
    }
}
