//! File format readers for the local data snapshots.
//!
//! Readers turn a file into a [`FormatDataset`]: untyped features with decoded
//! geometry and the CRS declared by the file. Mapping features onto domain
//! records is the job of the data source that owns the files.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;

pub mod geojson;

pub use self::geojson::GeoJsonReader;

/// Format reader trait that all format implementations must implement
#[async_trait]
pub trait FormatReader: Send + Sync {
    /// Read a dataset from the given path
    async fn read(&self, path: &Path) -> Result<FormatDataset>;

    /// Get supported file extensions (e.g., ["geojson"])
    fn supported_extensions(&self) -> &[&str];

    /// Get human-readable format name
    fn format_name(&self) -> &str;
}

/// Dataset representation returned by format readers
#[derive(Debug, Clone)]
pub struct FormatDataset {
    /// Dataset name, taken from the file stem
    pub name: String,

    /// CRS EPSG code declared by the file (WGS 84 when absent)
    pub crs: u32,

    pub features: Vec<FormatFeature>,
}

/// Feature extracted from a format
#[derive(Debug, Clone)]
pub struct FormatFeature {
    /// Feature identifier (position in the file when the feature has none)
    pub id: String,

    /// Decoded geometry, None for features without one
    pub geometry: Option<geo::Geometry<f64>>,

    pub properties: HashMap<String, serde_json::Value>,
}

impl FormatFeature {
    /// String property; numbers are rendered as text
    pub fn property_str(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn property_f64(&self, key: &str) -> Option<f64> {
        match self.properties.get(key)? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean property; the 0/1 encoding of GBFS feeds is accepted
    pub fn property_bool(&self, key: &str) -> Option<bool> {
        match self.properties.get(key)? {
            serde_json::Value::Bool(b) => Some(*b),
            serde_json::Value::Number(n) => n.as_i64().map(|v| v != 0),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(properties: serde_json::Value) -> FormatFeature {
        let properties = properties
            .as_object()
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        FormatFeature { id: "0".to_string(), geometry: None, properties }
    }

    #[test]
    fn test_property_accessors() {
        let f = feature(json!({
            "name": "Bahnhof",
            "quartier_id": 12,
            "lat": "47.05",
            "is_reserved": 1,
            "is_disabled": false
        }));

        assert_eq!(f.property_str("name").as_deref(), Some("Bahnhof"));
        assert_eq!(f.property_str("quartier_id").as_deref(), Some("12"));
        assert_eq!(f.property_f64("lat"), Some(47.05));
        assert_eq!(f.property_bool("is_reserved"), Some(true));
        assert_eq!(f.property_bool("is_disabled"), Some(false));
        assert_eq!(f.property_str("missing"), None);
    }
}
