//! Cached terrain altitudes for trip endpoints.
//!
//! The cache file is a JSON object mapping `"lat,lon"` to meters above sea
//! level. Keys are parsed on load so `47.05,8.3` and `47.050,8.30` resolve to
//! the same entry.

use std::collections::HashMap;
use std::path::Path;

use velomap_core::error::{Result, VelomapError};

#[derive(Debug, Clone, Default)]
pub struct AltitudeCache {
    entries: HashMap<(u64, u64), f64>,
}

impl AltitudeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a cache file. A missing or unreadable file gives an empty cache.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No altitude cache at {}", path.display());
                return Ok(Self::new());
            }
            Err(e) => return Err(VelomapError::Io(e)),
        };

        let raw: HashMap<String, f64> = match serde_json::from_str(&content) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Ignoring corrupt altitude cache {}: {}", path.display(), e);
                return Ok(Self::new());
            }
        };

        let mut cache = Self::new();
        for (key, altitude) in raw {
            match parse_key(&key) {
                Some((lat, lon)) => cache.insert(lat, lon, altitude),
                None => tracing::warn!("Skipping altitude cache key '{}'", key),
            }
        }
        tracing::info!("{} cached altitude entries loaded", cache.len());

        Ok(cache)
    }

    pub fn insert(&mut self, lat: f64, lon: f64, altitude_m: f64) {
        self.entries.insert(key(lat, lon), altitude_m);
    }

    /// Altitude at exactly `(lat, lon)`, None when it was never looked up
    pub fn get(&self, lat: f64, lon: f64) -> Option<f64> {
        let altitude = self.entries.get(&key(lat, lon)).copied();
        if altitude.is_none() {
            tracing::debug!("No cached altitude for {},{}", lat, lon);
        }
        altitude
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn key(lat: f64, lon: f64) -> (u64, u64) {
    // +0.0 and -0.0 are the same location
    ((lat + 0.0).to_bits(), (lon + 0.0).to_bits())
}

fn parse_key(key: &str) -> Option<(f64, f64)> {
    let (lat, lon) = key.split_once(',')?;
    Some((lat.trim().parse().ok()?, lon.trim().parse().ok()?))
}
