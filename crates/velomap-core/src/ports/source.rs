use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{
    BikeAvailabilityRecord, Boundary, BoundaryKind, FreeBike, GeoCollection, RiverSegment, Station,
};

/// Port for the external data warehouse the base datasets come from.
///
/// Every failure is reported as `DataFetch`; callers decide whether to fall
/// back to cached data. Implementations must not retry on their own.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Name used in log lines and `DataFetch` errors
    fn name(&self) -> &str;

    /// Stations crawled on `day`, tagged with their CRS
    async fn stations(&self, day: NaiveDate) -> Result<GeoCollection<Station>>;

    /// City, canton or district polygons
    async fn boundaries(&self, kind: BoundaryKind) -> Result<GeoCollection<Boundary>>;

    /// River segments clipped to the canton
    async fn rivers(&self) -> Result<GeoCollection<RiverSegment>>;

    /// Average bikes available per station and hour of day
    async fn hourly_availability(&self) -> Result<Vec<BikeAvailabilityRecord>>;

    /// Latest free bike status
    async fn free_bikes(&self) -> Result<GeoCollection<FreeBike>>;
}
