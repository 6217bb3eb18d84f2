use chrono::{DateTime, NaiveDate, Utc};

use super::boundary::Boundary;
use super::geometry::GeoCollection;
use super::river::RiverSegment;
use super::station::{BikeAvailabilityRecord, FreeBike, Station};

/// The base datasets of one session, fetched together and then read-only
#[derive(Debug, Clone)]
pub struct BaseCollections {
    pub stations: GeoCollection<Station>,
    pub city: GeoCollection<Boundary>,
    pub canton: GeoCollection<Boundary>,
    pub districts: GeoCollection<Boundary>,
    pub rivers: GeoCollection<RiverSegment>,
    pub free_bikes: GeoCollection<FreeBike>,
    pub availability: Vec<BikeAvailabilityRecord>,

    /// Day the station snapshot belongs to
    pub snapshot_day: NaiveDate,

    /// When the collections were fetched from the data source
    pub fetched_at: DateTime<Utc>,
}

impl BaseCollections {
    /// Feature counts per dataset, for status output
    pub fn summary(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("stations", self.stations.len()),
            ("city", self.city.len()),
            ("canton", self.canton.len()),
            ("districts", self.districts.len()),
            ("rivers", self.rivers.len()),
            ("free_bikes", self.free_bikes.len()),
            ("availability", self.availability.len()),
        ]
    }
}
