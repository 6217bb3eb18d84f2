//! GeoJSON format reader implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Result, VelomapError};
use crate::formats::{FormatDataset, FormatFeature, FormatReader};

/// GeoJSON format reader
pub struct GeoJsonReader;

#[async_trait]
impl FormatReader for GeoJsonReader {
    async fn read(&self, path: &Path) -> Result<FormatDataset> {
        let content = fs::read_to_string(path)?;

        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed");

        self.parse_str(name, &content)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json", "geojson"]
    }

    fn format_name(&self) -> &str {
        "GeoJSON"
    }
}

impl GeoJsonReader {
    /// Parse GeoJSON text into a dataset called `name`
    pub fn parse_str(&self, name: &str, content: &str) -> Result<FormatDataset> {
        let geojson: geojson::GeoJson = content.parse().map_err(|e| {
            VelomapError::Serialization(format!("Failed to parse GeoJSON {}: {}", name, e))
        })?;

        let (features, crs) = self.extract_features_and_crs(&geojson)?;

        Ok(FormatDataset { name: name.to_string(), crs, features })
    }

    /// Extract features and CRS from GeoJSON
    fn extract_features_and_crs(
        &self,
        geojson: &geojson::GeoJson,
    ) -> Result<(Vec<FormatFeature>, u32)> {
        match geojson {
            geojson::GeoJson::FeatureCollection(fc) => {
                let features = fc
                    .features
                    .iter()
                    .enumerate()
                    .map(|(idx, feature)| self.convert_feature(feature, idx))
                    .collect::<Result<Vec<_>>>()?;

                // RFC 7946 files carry no crs member and are WGS 84
                let crs = fc
                    .foreign_members
                    .as_ref()
                    .and_then(|fm| fm.get("crs"))
                    .and_then(extract_epsg_from_crs)
                    .unwrap_or(4326);

                Ok((features, crs))
            }
            geojson::GeoJson::Feature(feature) => {
                Ok((vec![self.convert_feature(feature, 0)?], 4326))
            }
            geojson::GeoJson::Geometry(geom) => {
                let feature = FormatFeature {
                    id: "0".to_string(),
                    geometry: Some(decode_geometry("0", geom)?),
                    properties: HashMap::new(),
                };
                Ok((vec![feature], 4326))
            }
        }
    }

    /// Convert a GeoJSON feature to FormatFeature
    fn convert_feature(&self, feature: &geojson::Feature, idx: usize) -> Result<FormatFeature> {
        let id = feature
            .id
            .as_ref()
            .map(|id| match id {
                geojson::feature::Id::String(s) => s.clone(),
                geojson::feature::Id::Number(n) => n.to_string(),
            })
            .unwrap_or_else(|| idx.to_string());

        let geometry = feature.geometry.as_ref().map(|g| decode_geometry(&id, g)).transpose()?;

        let properties = feature
            .properties
            .as_ref()
            .map(|props| props.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();

        Ok(FormatFeature { id, geometry, properties })
    }
}

fn decode_geometry(feature_id: &str, geometry: &geojson::Geometry) -> Result<geo::Geometry<f64>> {
    geo::Geometry::<f64>::try_from(&geometry.value).map_err(|e| VelomapError::InvalidGeometry {
        feature_id: feature_id.to_string(),
        reason: e.to_string(),
    })
}

/// Extract EPSG code from a legacy CRS object
fn extract_epsg_from_crs(crs: &serde_json::Value) -> Option<u32> {
    let name = crs.get("properties")?.get("name")?.as_str()?;
    // "EPSG:2056" or "urn:ogc:def:crs:EPSG::2056"
    match name.rsplit(':').next()? {
        "CRS84" => Some(4326),
        code => code.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_geojson_reader_feature_collection() {
        let reader = GeoJsonReader;

        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("stations.geojson");

        let geojson_content = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "id": "nextbike_1",
                    "geometry": { "type": "Point", "coordinates": [8.3102, 47.0502] },
                    "properties": { "name": "Bahnhof" }
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [8.30, 47.05] },
                    "properties": null
                }
            ]
        }"#;

        fs::write(&file_path, geojson_content).unwrap();

        let result = reader.read(&file_path).await.unwrap();

        assert_eq!(result.name, "stations");
        assert_eq!(result.crs, 4326);
        assert_eq!(result.features.len(), 2);
        assert_eq!(result.features[0].id, "nextbike_1");
        assert_eq!(result.features[1].id, "1");
        assert!(matches!(result.features[0].geometry, Some(geo::Geometry::Point(_))));
        assert!(result.features[1].properties.is_empty());
    }

    #[test]
    fn test_declared_crs_is_read() {
        let content = r#"{
            "type": "FeatureCollection",
            "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::2056" } },
            "features": []
        }"#;

        let dataset = GeoJsonReader.parse_str("rivers", content).unwrap();
        assert_eq!(dataset.crs, 2056);
    }

    #[test]
    fn test_single_geometry_is_wrapped() {
        let content = r#"{ "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] }"#;

        let dataset = GeoJsonReader.parse_str("line", content).unwrap();
        assert_eq!(dataset.features.len(), 1);
        assert!(matches!(dataset.features[0].geometry, Some(geo::Geometry::LineString(_))));
    }

    #[test]
    fn test_invalid_json_is_serialization_error() {
        let err = GeoJsonReader.parse_str("broken", "not valid json").unwrap_err();
        assert!(matches!(err, VelomapError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = GeoJsonReader.read(&temp_dir.path().join("nope.geojson")).await.unwrap_err();
        assert!(matches!(err, VelomapError::Io(_)));
    }

    #[test]
    fn test_supported_extensions() {
        let reader = GeoJsonReader;
        assert_eq!(reader.supported_extensions(), &["json", "geojson"]);
        assert_eq!(reader.format_name(), "GeoJSON");
    }
}
