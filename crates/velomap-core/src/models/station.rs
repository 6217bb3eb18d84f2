use geo::Point;
use serde::{Deserialize, Serialize};

use super::geometry::{CoordMap, Georeferenced, Identified, PointFeature};
use crate::error::Result;

/// Unique identifier for a station within a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StationId(pub String);

impl StationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bike-share station.
///
/// `location` is x = longitude, y = latitude while the owning collection is in
/// WGS 84, and easting/northing once it has been reprojected.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub location: Point<f64>,
}

impl Station {
    /// Create a station from WGS 84 degrees
    pub fn new(id: impl Into<String>, name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self { id: StationId(id.into()), name: name.into(), location: Point::new(lon, lat) }
    }

    /// Create a station from projected coordinates
    pub fn at(id: impl Into<String>, name: impl Into<String>, x: f64, y: f64) -> Self {
        Self { id: StationId(id.into()), name: name.into(), location: Point::new(x, y) }
    }

    pub fn latitude(&self) -> f64 {
        self.location.y()
    }

    pub fn longitude(&self) -> f64 {
        self.location.x()
    }
}

impl Identified for Station {
    fn feature_id(&self) -> &str {
        self.id.as_str()
    }
}

impl Georeferenced for Station {
    fn try_map_coords(&self, f: CoordMap<'_>) -> Result<Self> {
        Ok(Self { location: self.location.try_map_coords(f)?, ..self.clone() })
    }
}

impl PointFeature for Station {
    fn point(&self) -> Point<f64> {
        self.location
    }
}

/// A free-floating bike reported by the bike status feed
#[derive(Debug, Clone, PartialEq)]
pub struct FreeBike {
    pub bike_id: String,
    pub location: Point<f64>,
    pub is_reserved: bool,
    pub is_disabled: bool,
}

impl FreeBike {
    /// Bikes that can be rented right now
    pub fn is_available(&self) -> bool {
        !self.is_reserved && !self.is_disabled
    }
}

impl Identified for FreeBike {
    fn feature_id(&self) -> &str {
        &self.bike_id
    }
}

impl Georeferenced for FreeBike {
    fn try_map_coords(&self, f: CoordMap<'_>) -> Result<Self> {
        Ok(Self { location: self.location.try_map_coords(f)?, ..self.clone() })
    }
}

impl PointFeature for FreeBike {
    fn point(&self) -> Point<f64> {
        self.location
    }
}

/// Average number of bikes available at a station for one hour of the day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BikeAvailabilityRecord {
    pub station_id: StationId,
    #[serde(alias = "hour_of_day")]
    pub hour: u8,
    #[serde(alias = "avg_num_bikes_available")]
    pub avg_bikes_available: f64,
}

impl BikeAvailabilityRecord {
    pub fn new(station_id: impl Into<String>, hour: u8, avg_bikes_available: f64) -> Self {
        Self { station_id: StationId(station_id.into()), hour, avg_bikes_available }
    }
}
