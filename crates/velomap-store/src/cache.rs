//! Session-shared snapshot of the base collections.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use tokio::sync::RwLock;
use velomap_core::config::LayeredConfig;
use velomap_core::error::Result;
use velomap_core::models::{BaseCollections, BoundaryKind, GeoCollection, Station};
use velomap_core::ports::DataSource;
use velomap_geo::validation::{count_invalid, ensure_valid, ValidGeometry};

/// Station names the operator uses for test installations
const TEST_STATION_MARKER: &str = "Teststation";

/// How the store refreshes and sanitizes its snapshot
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Age after which the snapshot is fetched again
    pub ttl: Duration,

    /// Substring a station id must contain to be kept
    pub provider: String,

    /// Station day to fetch; today (UTC) when unset
    pub day: Option<NaiveDate>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { ttl: Duration::minutes(60), provider: "nextbike".to_string(), day: None }
    }
}

impl StoreOptions {
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            ttl: Duration::minutes(config.cache_ttl_minutes.value),
            provider: config.provider.value.clone(),
            day: None,
        }
    }

    pub fn with_day(mut self, day: NaiveDate) -> Self {
        self.day = Some(day);
        self
    }
}

/// Caches the base collections fetched from `S`.
///
/// Readers get an `Arc` to an immutable snapshot; a refresh swaps in a new
/// one without touching snapshots already handed out.
pub struct GeometryStore<S> {
    source: S,
    options: StoreOptions,
    cached: Arc<RwLock<Option<Arc<BaseCollections>>>>,
}

impl<S: DataSource> GeometryStore<S> {
    pub fn new(source: S, options: StoreOptions) -> Self {
        Self { source, options, cached: Arc::new(RwLock::new(None)) }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The current snapshot, fetching it when missing or stale.
    ///
    /// A failed fetch falls back to a stale snapshot when there is one.
    pub async fn snapshot(&self) -> Result<Arc<BaseCollections>> {
        if let Some(fresh) = self.fresh().await {
            return Ok(fresh);
        }

        let mut cached = self.cached.write().await;
        // Another caller may have refreshed while we waited for the lock
        if let Some(current) = cached.as_ref() {
            if !self.is_stale(current) {
                return Ok(Arc::clone(current));
            }
        }

        match self.fetch().await {
            Ok(base) => {
                let base = Arc::new(base);
                *cached = Some(Arc::clone(&base));
                Ok(base)
            }
            Err(e) if e.is_data_fetch() => match cached.as_ref() {
                Some(stale) => {
                    tracing::warn!(
                        "Refresh from {} failed, serving snapshot fetched at {}: {}",
                        self.source.name(),
                        stale.fetched_at,
                        e
                    );
                    Ok(Arc::clone(stale))
                }
                None => Err(e),
            },
            Err(e) => Err(e),
        }
    }

    /// Drop the cached snapshot; the next `snapshot()` fetches again
    pub async fn invalidate(&self) {
        let mut cached = self.cached.write().await;
        if cached.take().is_some() {
            tracing::debug!("Invalidated snapshot from {}", self.source.name());
        }
    }

    /// Whether a snapshot is cached, fresh or not
    pub async fn is_populated(&self) -> bool {
        self.cached.read().await.is_some()
    }

    async fn fresh(&self) -> Option<Arc<BaseCollections>> {
        let cached = self.cached.read().await;
        cached.as_ref().filter(|base| !self.is_stale(base)).map(Arc::clone)
    }

    fn is_stale(&self, base: &BaseCollections) -> bool {
        Utc::now() - base.fetched_at >= self.options.ttl
    }

    async fn fetch(&self) -> Result<BaseCollections> {
        let day = self.options.day.unwrap_or_else(|| Utc::now().date_naive());
        tracing::info!("Fetching base collections from {} for {}", self.source.name(), day);

        let stations = self.source.stations(day).await?;
        let city = self.source.boundaries(BoundaryKind::City).await?;
        let canton = self.source.boundaries(BoundaryKind::Canton).await?;
        let districts = self.source.boundaries(BoundaryKind::District).await?;
        let rivers = self.source.rivers().await?;
        let availability = self.source.hourly_availability().await?;
        let free_bikes = self.source.free_bikes().await?;

        for boundaries in [&city, &canton, &districts] {
            ensure_valid(boundaries)?;
        }
        ensure_valid(&rivers)?;

        let base = BaseCollections {
            stations: sanitize_stations(&drop_invalid(stations), &self.options.provider),
            city,
            canton,
            districts,
            rivers,
            free_bikes: drop_invalid(free_bikes),
            availability,
            snapshot_day: day,
            fetched_at: Utc::now(),
        };

        for (dataset, count) in base.summary() {
            tracing::debug!("  {}: {}", dataset, count);
        }

        Ok(base)
    }
}

/// Drop point records with unusable coordinates
fn drop_invalid<T: ValidGeometry + Clone>(collection: GeoCollection<T>) -> GeoCollection<T> {
    let invalid = count_invalid(&collection);
    if invalid == 0 {
        return collection;
    }
    tracing::warn!("Dropping {} invalid features of '{}'", invalid, collection.name);
    collection.filtered(|feature| feature.validate().is_valid)
}

/// Keep the operator's stations, dropping test installations and repeated ids
pub fn sanitize_stations(
    stations: &GeoCollection<Station>,
    provider: &str,
) -> GeoCollection<Station> {
    let mut seen = HashSet::new();
    let mut dropped = 0usize;

    let kept = stations
        .iter()
        .filter(|s| {
            let keep = s.id.as_str().contains(provider) && !s.name.contains(TEST_STATION_MARKER);
            if !keep {
                dropped += 1;
            }
            keep
        })
        .filter(|s| {
            if seen.insert(s.id.as_str().to_string()) {
                true
            } else {
                tracing::warn!("Dropping duplicate station id {}", s.id);
                false
            }
        })
        .cloned()
        .collect();

    if dropped > 0 {
        tracing::debug!("Dropped {} stations of other providers or test sites", dropped);
    }

    stations.with_features(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use velomap_core::models::Crs;

    #[test]
    fn test_sanitize_stations() {
        let stations = GeoCollection::new(
            "stations",
            Crs::wgs84(),
            vec![
                Station::new("nextbike_1", "Bahnhof", 47.0502, 8.3102),
                Station::new("publibike_7", "Bahnhof", 47.0503, 8.3101),
                Station::new("nextbike_9", "Teststation Werkhof", 47.04, 8.30),
                Station::new("nextbike_1", "Bahnhof (copy)", 47.0502, 8.3102),
                Station::new("nextbike_2", "Kapellplatz", 47.0518, 8.3063),
            ],
        );

        let kept = sanitize_stations(&stations, "nextbike");

        let names: Vec<_> = kept.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Bahnhof", "Kapellplatz"]);
        assert_eq!(kept.crs(), Some(&Crs::wgs84()));
    }

    #[test]
    fn test_options_from_config() {
        let mut config = LayeredConfig::with_defaults();
        config.cache_ttl_minutes.value = 5;

        let options = StoreOptions::from_config(&config);
        assert_eq!(options.ttl, Duration::minutes(5));
        assert_eq!(options.provider, "nextbike");
        assert_eq!(options.day, None);
    }
}
