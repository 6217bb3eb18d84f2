//! CRS-tagged geometry collections shared across all velomap crates.
//!
//! Every collection carries its coordinate reference system as part of its
//! value. Measurement code asks for the tag through [`GeoCollection::require_crs`]
//! so that untagged coordinates are never mistaken for meters.

use std::fmt;

use geo::{Coord, LineString, MapCoords, MultiPolygon, Point};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VelomapError};

/// Coordinate Reference System identified by EPSG code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: u32,
    pub name: String,
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Crs {
    pub fn new(epsg: u32, name: impl Into<String>) -> Self {
        Self { epsg, name: name.into() }
    }

    /// WGS 84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::new(4326, "WGS 84")
    }

    /// CH1903+ / LV95 (EPSG:2056), the Swiss metric grid
    pub fn lv95() -> Self {
        Self::new(2056, "CH1903+ / LV95")
    }

    /// CH1903 / LV03 (EPSG:21781)
    pub fn lv03() -> Self {
        Self::new(21781, "CH1903 / LV03")
    }

    /// WGS 84 / UTM zone 32N (EPSG:32632)
    pub fn utm32n() -> Self {
        Self::new(32632, "WGS 84 / UTM zone 32N")
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::new(3857, "Web Mercator")
    }

    /// Look up one of the supported reference systems by EPSG code
    pub fn from_epsg(epsg: u32) -> Option<Self> {
        match epsg {
            4326 => Some(Self::wgs84()),
            2056 => Some(Self::lv95()),
            21781 => Some(Self::lv03()),
            32632 => Some(Self::utm32n()),
            3857 => Some(Self::web_mercator()),
            _ => None,
        }
    }

    /// Geographic CRS use degrees; everything else here is projected in meters
    pub fn is_geographic(&self) -> bool {
        self.epsg == 4326
    }

    /// Human readable label, e.g. `EPSG:2056 (CH1903+ / LV95)`
    pub fn label(&self) -> String {
        format!("EPSG:{} ({})", self.epsg, self.name)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

/// Fallible coordinate transform applied to every vertex of a geometry
pub type CoordMap<'a> = &'a dyn Fn(Coord<f64>) -> Result<Coord<f64>>;

/// A record whose coordinates can be rewritten, e.g. by a reprojection.
pub trait Georeferenced: Clone {
    fn try_map_coords(&self, f: CoordMap<'_>) -> Result<Self>;
}

impl Georeferenced for Point<f64> {
    fn try_map_coords(&self, f: CoordMap<'_>) -> Result<Self> {
        MapCoords::try_map_coords(self, f)
    }
}

impl Georeferenced for LineString<f64> {
    fn try_map_coords(&self, f: CoordMap<'_>) -> Result<Self> {
        MapCoords::try_map_coords(self, f)
    }
}

impl Georeferenced for MultiPolygon<f64> {
    fn try_map_coords(&self, f: CoordMap<'_>) -> Result<Self> {
        MapCoords::try_map_coords(self, f)
    }
}

/// Records with a stable identifier inside their collection
pub trait Identified {
    fn feature_id(&self) -> &str;
}

/// Point-like records (stations, free bikes)
pub trait PointFeature: Identified + Georeferenced {
    fn point(&self) -> Point<f64>;
}

/// Areal records (city, canton, districts)
pub trait PolygonFeature: Identified + Georeferenced {
    fn polygon(&self) -> &MultiPolygon<f64>;
}

/// Linear records (river segments)
pub trait LineFeature: Identified + Georeferenced {
    fn line(&self) -> &LineString<f64>;
}

/// A named set of records tagged with the CRS their coordinates are in
#[derive(Debug, Clone, PartialEq)]
pub struct GeoCollection<T> {
    pub name: String,
    crs: Option<Crs>,
    pub features: Vec<T>,
}

impl<T> GeoCollection<T> {
    /// Create a tagged collection
    pub fn new(name: impl Into<String>, crs: Crs, features: Vec<T>) -> Self {
        Self { name: name.into(), crs: Some(crs), features }
    }

    /// Create a collection whose CRS is not known yet
    pub fn untagged(name: impl Into<String>, features: Vec<T>) -> Self {
        Self { name: name.into(), crs: None, features }
    }

    /// Tag (or re-tag) the collection without touching coordinates
    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    /// The CRS tag, or `UnknownCrs` when the collection was never tagged
    pub fn require_crs(&self) -> Result<&Crs> {
        self.crs.as_ref().ok_or_else(|| VelomapError::UnknownCrs {
            context: format!("collection '{}' has no CRS tag", self.name),
        })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.features.iter()
    }

    /// Replace the features while keeping name and CRS tag
    pub fn with_features<U>(&self, features: Vec<U>) -> GeoCollection<U> {
        GeoCollection { name: self.name.clone(), crs: self.crs.clone(), features }
    }

    /// Keep only the features matching `predicate`
    pub fn filtered(&self, predicate: impl Fn(&T) -> bool) -> Self
    where
        T: Clone,
    {
        self.with_features(self.features.iter().filter(|f| predicate(f)).cloned().collect())
    }
}

/// A user-supplied query location (map click or device geolocation).
///
/// Both sources arrive as latitude/longitude and are treated identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPoint {
    pub x: f64,
    pub y: f64,
    pub crs: Crs,
}

impl QueryPoint {
    /// Query point in WGS 84 degrees
    pub fn from_lat_lon(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(VelomapError::invalid_parameter(
                "lat",
                format!("latitude {} outside [-90, 90]", lat),
            ));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(VelomapError::invalid_parameter(
                "lon",
                format!("longitude {} outside [-180, 180]", lon),
            ));
        }
        Ok(Self { x: lon, y: lat, crs: Crs::wgs84() })
    }

    /// Query point already expressed in a projected CRS
    pub fn projected(x: f64, y: f64, crs: Crs) -> Self {
        Self { x, y, crs }
    }

    pub fn point(&self) -> Point<f64> {
        Point::new(self.x, self.y)
    }
}
