//! In-memory data source for development and testing.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use velomap_core::error::{Result, VelomapError};
use velomap_core::models::{
    BaseCollections, BikeAvailabilityRecord, Boundary, BoundaryKind, FreeBike, GeoCollection,
    RiverSegment, Station,
};
use velomap_core::ports::DataSource;

/// Serves a fixed set of base collections.
///
/// Clones share the failure switch and the fetch counter, so a test can keep
/// a handle after moving the source into a store.
#[derive(Debug, Clone)]
pub struct StaticSource {
    base: Arc<BaseCollections>,
    failing: Arc<AtomicBool>,
    fetches: Arc<AtomicUsize>,
}

impl StaticSource {
    pub fn new(base: BaseCollections) -> Self {
        Self {
            base: Arc::new(base),
            failing: Arc::new(AtomicBool::new(false)),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make every following call fail with `DataFetch` (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of station fetches served so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn check(&self, dataset: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(VelomapError::data_fetch(
                self.name(),
                format!("{} unavailable", dataset),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DataSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn stations(&self, _day: NaiveDate) -> Result<GeoCollection<Station>> {
        self.check("stations")?;
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.base.stations.clone())
    }

    async fn boundaries(&self, kind: BoundaryKind) -> Result<GeoCollection<Boundary>> {
        self.check(kind.as_str())?;
        Ok(match kind {
            BoundaryKind::City => self.base.city.clone(),
            BoundaryKind::Canton => self.base.canton.clone(),
            BoundaryKind::District => self.base.districts.clone(),
        })
    }

    async fn rivers(&self) -> Result<GeoCollection<RiverSegment>> {
        self.check("rivers")?;
        Ok(self.base.rivers.clone())
    }

    async fn hourly_availability(&self) -> Result<Vec<BikeAvailabilityRecord>> {
        self.check("availability")?;
        Ok(self.base.availability.clone())
    }

    async fn free_bikes(&self) -> Result<GeoCollection<FreeBike>> {
        self.check("free bikes")?;
        Ok(self.base.free_bikes.clone())
    }
}
