//! Property tests for the spatial derivations
//!
//! Coordinates are generated around Lucerne: degrees for the reprojection
//! checks, LV95 meters for everything that measures.

use geo::{polygon, LineString, MultiPolygon, Point};
use proptest::prelude::*;
use velomap_core::models::{
    Boundary, BoundaryKind, Crs, GeoCollection, QueryPoint, RiverSegment, Station,
};
use velomap_geo::coverage::coverage_with_resolution;
use velomap_geo::nearest::nearest;
use velomap_geo::spatial::{
    count_points_in_polygons, filter_by_proximity_to_lines, min_distance_to_lines,
};
use velomap_geo::transform::reproject_point;

const E0: f64 = 2_664_000.0;
const N0: f64 = 1_209_000.0;

fn lv95_stations(offsets: &[(f64, f64)]) -> GeoCollection<Station> {
    GeoCollection::new(
        "stations",
        Crs::lv95(),
        offsets
            .iter()
            .enumerate()
            .map(|(i, (dx, dy))| Station::at(format!("nextbike_{}", i), "station", E0 + dx, N0 + dy))
            .collect(),
    )
}

fn square(name: &str, x0: f64, y0: f64, size: f64) -> Boundary {
    let poly = polygon![
        (x: x0, y: y0),
        (x: x0 + size, y: y0),
        (x: x0 + size, y: y0 + size),
        (x: x0, y: y0 + size),
    ];
    Boundary::new(name, BoundaryKind::District, MultiPolygon::new(vec![poly]))
}

fn city() -> GeoCollection<Boundary> {
    GeoCollection::new("city", Crs::lv95(), vec![square("Luzern", E0, N0, 4_000.0)])
}

proptest! {
    #[test]
    fn wgs84_lv95_round_trip(lat in 46.8f64..47.3, lon in 7.9f64..8.7) {
        let there = reproject_point(Point::new(lon, lat), &Crs::wgs84(), &Crs::lv95()).unwrap();
        let back = reproject_point(there, &Crs::lv95(), &Crs::wgs84()).unwrap();

        prop_assert!((back.x() - lon).abs() < 1e-6, "lon {} -> {}", lon, back.x());
        prop_assert!((back.y() - lat).abs() < 1e-6, "lat {} -> {}", lat, back.y());
    }

    #[test]
    fn wgs84_utm_round_trip(lat in 46.8f64..47.3, lon in 7.9f64..8.7) {
        let there = reproject_point(Point::new(lon, lat), &Crs::wgs84(), &Crs::utm32n()).unwrap();
        let back = reproject_point(there, &Crs::utm32n(), &Crs::wgs84()).unwrap();

        prop_assert!((back.x() - lon).abs() < 1e-6);
        prop_assert!((back.y() - lat).abs() < 1e-6);
    }

    #[test]
    fn nearest_is_sorted_top_k(
        offsets in prop::collection::vec((-3_000.0f64..3_000.0, -3_000.0f64..3_000.0), 1..30),
        query in (-3_000.0f64..3_000.0, -3_000.0f64..3_000.0),
        k in 1usize..12,
    ) {
        let stations = lv95_stations(&offsets);
        let query = QueryPoint::projected(E0 + query.0, N0 + query.1, Crs::lv95());

        let result = nearest(&query, &stations, k, &Crs::lv95()).unwrap();

        prop_assert_eq!(result.ranked.len(), k.min(offsets.len()));
        for pair in result.ranked.windows(2) {
            prop_assert!(pair[0].distance_m <= pair[1].distance_m);
        }

        // Nothing left out is closer than the last station kept
        let worst_kept = result.ranked.last().map(|r| r.distance_m).unwrap_or(0.0);
        let kept: Vec<&str> = result.ranked.iter().map(|r| r.station.id.as_str()).collect();
        for station in stations.iter().filter(|s| !kept.contains(&s.id.as_str())) {
            let dx = station.location.x() - query.x;
            let dy = station.location.y() - query.y;
            prop_assert!((dx * dx + dy * dy).sqrt() >= worst_kept - 1e-9);
        }
    }

    #[test]
    fn join_is_complete(
        offsets in prop::collection::vec((0.0f64..4_000.0, 0.0f64..4_000.0), 0..60),
    ) {
        let districts = GeoCollection::new(
            "districts",
            Crs::lv95(),
            vec![
                square("NW", E0, N0 + 2_000.0, 2_000.0),
                square("NE", E0 + 2_000.0, N0 + 2_000.0, 2_000.0),
                square("SW", E0, N0, 2_000.0),
                square("SE", E0 + 2_000.0, N0, 2_000.0),
                square("Outside", E0 + 10_000.0, N0, 500.0),
            ],
        );
        let stations = lv95_stations(&offsets);

        let counts = count_points_in_polygons(&stations, &districts).unwrap();

        prop_assert_eq!(counts.len(), 5);
        prop_assert!(counts.values().sum::<usize>() <= offsets.len());
        prop_assert_eq!(counts["Outside"], 0);
    }

    #[test]
    fn proximity_threshold_is_exact(
        offsets in prop::collection::vec((-500.0f64..1_500.0, -300.0f64..300.0), 1..25),
        threshold in 0.0f64..250.0,
    ) {
        let rivers = GeoCollection::new(
            "rivers",
            Crs::lv95(),
            vec![
                RiverSegment::new("reuss", LineString::from(vec![(E0, N0), (E0 + 1_000.0, N0)])),
                RiverSegment::new(
                    "krienbach",
                    LineString::from(vec![(E0, N0 + 200.0), (E0, N0 + 600.0)]),
                ),
            ],
        );
        let stations = lv95_stations(&offsets);

        let kept = filter_by_proximity_to_lines(&stations, &rivers, threshold).unwrap();

        for station in stations.iter() {
            let distance = min_distance_to_lines(&station.location, &rivers.features).unwrap();
            let is_kept = kept.iter().any(|s| s.id == station.id);
            prop_assert_eq!(is_kept, distance <= threshold);

            // The threshold itself is inclusive
            let at_threshold = filter_by_proximity_to_lines(
                &stations.filtered(|s| s.id == station.id),
                &rivers,
                distance,
            )
            .unwrap();
            prop_assert_eq!(at_threshold.len(), 1);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn coverage_is_monotonic_in_radius(
        offsets in prop::collection::vec((0.0f64..4_000.0, 0.0f64..4_000.0), 1..12),
        r1 in 50.0f64..600.0,
        extra in 0.0f64..400.0,
    ) {
        let stations = lv95_stations(&offsets);
        let r2 = r1 + extra;

        let small = coverage_with_resolution(&stations, r1, &city(), 8).unwrap();
        let large = coverage_with_resolution(&stations, r2, &city(), 8).unwrap();

        prop_assert!(small.area_m2 <= large.area_m2 + 1e-6 * large.city_area_m2);
        for result in [&small, &large] {
            prop_assert!((0.0..=1.0).contains(&result.ratio));
            prop_assert!(result.area_m2 <= result.city_area_m2 * (1.0 + 1e-6));
        }
    }
}
