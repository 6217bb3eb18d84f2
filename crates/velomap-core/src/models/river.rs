use geo::LineString;

use super::geometry::{CoordMap, Georeferenced, Identified, LineFeature};
use crate::error::Result;

/// One polyline of the river network clipped to the region
#[derive(Debug, Clone, PartialEq)]
pub struct RiverSegment {
    pub id: String,
    pub name: Option<String>,
    pub geometry: LineString<f64>,
}

impl RiverSegment {
    pub fn new(id: impl Into<String>, geometry: LineString<f64>) -> Self {
        Self { id: id.into(), name: None, geometry }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Identified for RiverSegment {
    fn feature_id(&self) -> &str {
        &self.id
    }
}

impl Georeferenced for RiverSegment {
    fn try_map_coords(&self, f: CoordMap<'_>) -> Result<Self> {
        Ok(Self { geometry: self.geometry.try_map_coords(f)?, ..self.clone() })
    }
}

impl LineFeature for RiverSegment {
    fn line(&self) -> &LineString<f64> {
        &self.geometry
    }
}
