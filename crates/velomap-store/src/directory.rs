//! Data source backed by exported GeoJSON/JSON files in a data directory.
//!
//! Expected layout:
//!
//! ```text
//! data/
//!   stations.geojson     points with station_id, name and optional crawl_time
//!   city.geojson         (multi)polygons
//!   canton.geojson
//!   districts.geojson    (multi)polygons with the district statistics
//!   rivers.geojson       (multi)linestrings
//!   free_bikes.geojson   points or lat/lon properties
//!   availability.json    [{station_id, hour_of_day, avg_num_bikes_available}]
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use geo::{Geometry, MultiPolygon, Point};
use velomap_core::error::{Result, VelomapError};
use velomap_core::formats::{FormatDataset, FormatFeature, FormatReader, GeoJsonReader};
use velomap_core::models::{
    BikeAvailabilityRecord, Boundary, BoundaryKind, Crs, Demographics, FreeBike, GeoCollection,
    RiverSegment, Station,
};
use velomap_core::ports::DataSource;

pub struct DirectorySource {
    root: PathBuf,
    reader: GeoJsonReader,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), reader: GeoJsonReader }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn fetch_error(&self, file: &str, reason: impl std::fmt::Display) -> VelomapError {
        let path = self.root.join(file);
        VelomapError::data_fetch(self.name(), format!("{}: {}", path.display(), reason))
    }

    async fn read(&self, file: &str) -> Result<(FormatDataset, Crs)> {
        let dataset = self
            .reader
            .read(&self.root.join(file))
            .await
            .map_err(|e| self.fetch_error(file, e))?;

        let crs = Crs::from_epsg(dataset.crs)
            .unwrap_or_else(|| Crs::new(dataset.crs, format!("EPSG:{}", dataset.crs)));
        tracing::debug!("Read {} features from {} ({})", dataset.features.len(), file, crs);

        Ok((dataset, crs))
    }
}

#[async_trait]
impl DataSource for DirectorySource {
    fn name(&self) -> &str {
        "directory"
    }

    async fn stations(&self, day: NaiveDate) -> Result<GeoCollection<Station>> {
        const FILE: &str = "stations.geojson";
        let (dataset, crs) = self.read(FILE).await?;

        let mut stations = Vec::new();
        let mut days = Vec::new();
        for feature in &dataset.features {
            let Some(location) = point_of(feature) else {
                tracing::warn!("Skipping station {} without a point", feature.id);
                continue;
            };
            let id = feature.property_str("station_id").unwrap_or_else(|| feature.id.clone());
            let name = feature.property_str("name").unwrap_or_else(|| id.clone());
            stations.push(Station::at(id, name, location.x(), location.y()));
            days.push(crawl_day(feature));
        }

        let selected = select_day(day, &days);
        let stations = stations
            .into_iter()
            .zip(days)
            .filter(|(_, crawled)| crawled.is_none() || *crawled == selected)
            .map(|(station, _)| station)
            .collect();

        Ok(GeoCollection::new("stations", crs, stations))
    }

    async fn boundaries(&self, kind: BoundaryKind) -> Result<GeoCollection<Boundary>> {
        let file = match kind {
            BoundaryKind::City => "city.geojson",
            BoundaryKind::Canton => "canton.geojson",
            BoundaryKind::District => "districts.geojson",
        };
        let (dataset, crs) = self.read(file).await?;

        let boundaries = dataset
            .features
            .iter()
            .map(|feature| {
                let geometry = match &feature.geometry {
                    Some(Geometry::Polygon(p)) => MultiPolygon::new(vec![p.clone()]),
                    Some(Geometry::MultiPolygon(mp)) => mp.clone(),
                    _ => {
                        return Err(self.fetch_error(
                            file,
                            format!("feature {} is not a polygon", feature.id),
                        ))
                    }
                };
                let name = feature.property_str("name").unwrap_or_else(|| feature.id.clone());
                let boundary = Boundary::new(name, kind, geometry);
                Ok(match kind {
                    BoundaryKind::District => match demographics_of(feature) {
                        Some(d) => boundary.with_demographics(d),
                        None => boundary,
                    },
                    _ => boundary,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(GeoCollection::new(kind.as_str(), crs, boundaries))
    }

    async fn rivers(&self) -> Result<GeoCollection<RiverSegment>> {
        const FILE: &str = "rivers.geojson";
        let (dataset, crs) = self.read(FILE).await?;

        let mut segments = Vec::new();
        for feature in &dataset.features {
            let id = feature.property_str("id").unwrap_or_else(|| feature.id.clone());
            let name = feature.property_str("name");
            let lines = match &feature.geometry {
                Some(Geometry::LineString(line)) => vec![(id, line.clone())],
                // Parts are measured separately so the gap between them never counts
                Some(Geometry::MultiLineString(lines)) => lines
                    .iter()
                    .enumerate()
                    .map(|(idx, line)| (format!("{}/{}", id, idx), line.clone()))
                    .collect(),
                _ => {
                    tracing::warn!("Skipping river feature {} without a line", feature.id);
                    continue;
                }
            };
            for (segment_id, line) in lines {
                let segment = RiverSegment::new(segment_id, line);
                segments.push(match &name {
                    Some(name) => segment.named(name.clone()),
                    None => segment,
                });
            }
        }

        Ok(GeoCollection::new("rivers", crs, segments))
    }

    async fn hourly_availability(&self) -> Result<Vec<BikeAvailabilityRecord>> {
        const FILE: &str = "availability.json";
        let content = tokio::fs::read_to_string(self.root.join(FILE))
            .await
            .map_err(|e| self.fetch_error(FILE, e))?;

        serde_json::from_str(&content).map_err(|e| self.fetch_error(FILE, e))
    }

    async fn free_bikes(&self) -> Result<GeoCollection<FreeBike>> {
        const FILE: &str = "free_bikes.geojson";
        let (dataset, crs) = self.read(FILE).await?;

        let mut bikes = Vec::new();
        let mut crawls = Vec::new();
        for feature in &dataset.features {
            let location = point_of(feature).or_else(|| {
                let lat = feature.property_f64("lat")?;
                let lon = feature.property_f64("lon")?;
                Some(Point::new(lon, lat))
            });
            let Some(location) = location else {
                tracing::warn!("Skipping free bike {} without a location", feature.id);
                continue;
            };
            bikes.push(FreeBike {
                bike_id: feature.property_str("bike_id").unwrap_or_else(|| feature.id.clone()),
                location,
                is_reserved: feature.property_bool("is_reserved").unwrap_or(false),
                is_disabled: feature.property_bool("is_disabled").unwrap_or(false),
            });
            crawls.push(crawl_timestamp(feature));
        }

        // Most recent crawl only; rows without a crawl time stay
        let latest = crawls.iter().flatten().max().copied();
        let total = bikes.len();
        let bikes: Vec<FreeBike> = bikes
            .into_iter()
            .zip(crawls)
            .filter(|(_, crawled)| crawled.is_none() || *crawled == latest)
            .map(|(bike, _)| bike)
            .collect();
        if let Some(latest) = latest {
            tracing::debug!(
                "Kept {} of {} free bike rows from crawl {}",
                bikes.len(),
                total,
                latest
            );
        }

        Ok(GeoCollection::new("free_bikes", crs, bikes))
    }
}

fn point_of(feature: &FormatFeature) -> Option<Point<f64>> {
    match &feature.geometry {
        Some(Geometry::Point(p)) => Some(*p),
        _ => None,
    }
}

/// Day part of an ISO `crawl_time` property
fn crawl_day(feature: &FormatFeature) -> Option<NaiveDate> {
    let crawl_time = feature.property_str("crawl_time")?;
    NaiveDate::parse_from_str(crawl_time.get(..10)?, "%Y-%m-%d").ok()
}

/// Full `crawl_time` timestamp, RFC 3339 or `YYYY-MM-DD HH:MM:SS[.f][ UTC]`
fn crawl_timestamp(feature: &FormatFeature) -> Option<NaiveDateTime> {
    let crawl_time = feature.property_str("crawl_time")?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&crawl_time) {
        return Some(ts.naive_utc());
    }
    let trimmed = crawl_time.trim_end_matches(" UTC");
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

/// The requested day when crawled, otherwise the latest crawl in the file
fn select_day(requested: NaiveDate, days: &[Option<NaiveDate>]) -> Option<NaiveDate> {
    let crawled: BTreeSet<NaiveDate> = days.iter().flatten().copied().collect();
    if crawled.is_empty() || crawled.contains(&requested) {
        return Some(requested);
    }

    let latest = crawled.last().copied();
    if let Some(latest) = latest {
        tracing::warn!("No station crawl for {}, using latest crawl {}", requested, latest);
    }
    latest
}

fn demographics_of(feature: &FormatFeature) -> Option<Demographics> {
    let count = |key: &str| {
        feature.property_f64(key).filter(|v| *v >= 0.0).map(|v| v.round() as u64)
    };

    let demographics = Demographics {
        district_id: feature
            .property_str("quartier_id")
            .or_else(|| feature.property_str("district_id")),
        total: count("total"),
        age_0_19: count("z0_19").or_else(|| count("age_0_19")),
        age_20_64: count("z20_64").or_else(|| count("age_20_64")),
        age_65_plus: count("u65").or_else(|| count("age_65_plus")),
        foreign_residents: count("auslaender").or_else(|| count("foreign_residents")),
        density_per_ha: feature
            .property_f64("diche_per_ha")
            .or_else(|| feature.property_f64("density_per_ha")),
    };

    (demographics != Demographics::default()).then_some(demographics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn feature(properties: serde_json::Value) -> FormatFeature {
        let properties: HashMap<String, serde_json::Value> = properties
            .as_object()
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        FormatFeature { id: "0".to_string(), geometry: None, properties }
    }

    #[test]
    fn test_demographics_from_district_columns() {
        let f = feature(json!({
            "name": "Altstadt",
            "quartier_id": 3,
            "total": 3200,
            "z0_19": 400,
            "u65": 700,
            "diche_per_ha": 41.5
        }));

        let d = demographics_of(&f).unwrap();
        assert_eq!(d.district_id.as_deref(), Some("3"));
        assert_eq!(d.total, Some(3200));
        assert_eq!(d.age_0_19, Some(400));
        assert_eq!(d.age_20_64, None);
        assert_eq!(d.age_65_plus, Some(700));
        assert_eq!(d.density_per_ha, Some(41.5));
    }

    #[test]
    fn test_no_demographics() {
        assert_eq!(demographics_of(&feature(json!({"name": "Luzern"}))), None);
    }

    #[test]
    fn test_select_day() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        let days = vec![Some(d("2024-05-13")), Some(d("2024-05-14")), None];

        assert_eq!(select_day(d("2024-05-13"), &days), Some(d("2024-05-13")));
        assert_eq!(select_day(d("2024-06-01"), &days), Some(d("2024-05-14")));
        assert_eq!(select_day(d("2024-06-01"), &[None]), Some(d("2024-06-01")));
    }

    #[test]
    fn test_crawl_day() {
        let f = feature(json!({"crawl_time": "2024-05-14T07:00:00Z"}));
        assert_eq!(crawl_day(&f), NaiveDate::from_ymd_opt(2024, 5, 14));
        assert_eq!(crawl_day(&feature(json!({}))), None);
    }

    #[test]
    fn test_crawl_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 14).and_then(|d| d.and_hms_opt(7, 30, 0));

        for raw in ["2024-05-14T07:30:00Z", "2024-05-14 07:30:00 UTC", "2024-05-14 07:30:00"] {
            let f = feature(json!({ "crawl_time": raw }));
            assert_eq!(crawl_timestamp(&f), expected, "{}", raw);
        }
        assert_eq!(crawl_timestamp(&feature(json!({"crawl_time": "yesterday"}))), None);
    }
}
