use crate::error::{Result, VelomapError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for velomap
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// EPSG code of the projected CRS used for all measurements
    pub metric_crs: ConfigValue<u32>,
    pub data_dir: ConfigValue<PathBuf>,
    pub coverage_radius_m: ConfigValue<f64>,
    pub nearest_k: ConfigValue<usize>,
    pub river_distance_m: ConfigValue<f64>,
    pub cache_ttl_minutes: ConfigValue<i64>,
    pub buffer_quadrant_segments: ConfigValue<u32>,
    /// Substring a station id must contain to belong to the operator
    pub provider: ConfigValue<String>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            metric_crs: ConfigValue::new(2056, ConfigSource::Default),
            data_dir: ConfigValue::new(PathBuf::from("data"), ConfigSource::Default),
            coverage_radius_m: ConfigValue::new(300.0, ConfigSource::Default),
            nearest_k: ConfigValue::new(5, ConfigSource::Default),
            river_distance_m: ConfigValue::new(100.0, ConfigSource::Default),
            cache_ttl_minutes: ConfigValue::new(60, ConfigSource::Default),
            buffer_quadrant_segments: ConfigValue::new(16, ConfigSource::Default),
            provider: ConfigValue::new("nextbike".to_string(), ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| VelomapError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| VelomapError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(metric_crs) = file_config.metric_crs {
            self.metric_crs.update(metric_crs, ConfigSource::File);
        }
        if let Some(data_dir) = file_config.data_dir {
            self.data_dir.update(data_dir, ConfigSource::File);
        }
        if let Some(radius) = file_config.coverage_radius_m {
            self.coverage_radius_m.update(radius, ConfigSource::File);
        }
        if let Some(k) = file_config.nearest_k {
            self.nearest_k.update(k, ConfigSource::File);
        }
        if let Some(distance) = file_config.river_distance_m {
            self.river_distance_m.update(distance, ConfigSource::File);
        }
        if let Some(ttl) = file_config.cache_ttl_minutes {
            self.cache_ttl_minutes.update(ttl, ConfigSource::File);
        }
        if let Some(segments) = file_config.buffer_quadrant_segments {
            self.buffer_quadrant_segments.update(segments, ConfigSource::File);
        }
        if let Some(provider) = file_config.provider {
            self.provider.update(provider, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from `VELOMAP_*` environment variables.
    ///
    /// Unparseable values are logged and ignored.
    pub fn load_from_env(mut self) -> Self {
        if let Some(crs) = env_parsed::<u32>("VELOMAP_METRIC_CRS", "integer EPSG code") {
            self.metric_crs.update(crs, ConfigSource::Environment);
        }

        if let Ok(data_dir) = env::var("VELOMAP_DATA_DIR") {
            self.data_dir.update(PathBuf::from(data_dir), ConfigSource::Environment);
        }

        if let Some(radius) = env_parsed::<f64>("VELOMAP_COVERAGE_RADIUS_M", "meters") {
            self.coverage_radius_m.update(radius, ConfigSource::Environment);
        }

        if let Some(k) = env_parsed::<usize>("VELOMAP_NEAREST_K", "positive integer") {
            self.nearest_k.update(k, ConfigSource::Environment);
        }

        if let Some(distance) = env_parsed::<f64>("VELOMAP_RIVER_DISTANCE_M", "meters") {
            self.river_distance_m.update(distance, ConfigSource::Environment);
        }

        if let Some(ttl) = env_parsed::<i64>("VELOMAP_CACHE_TTL_MINUTES", "minutes") {
            self.cache_ttl_minutes.update(ttl, ConfigSource::Environment);
        }

        if let Some(segments) =
            env_parsed::<u32>("VELOMAP_BUFFER_QUADRANT_SEGMENTS", "positive integer")
        {
            self.buffer_quadrant_segments.update(segments, ConfigSource::Environment);
        }

        if let Ok(provider) = env::var("VELOMAP_PROVIDER") {
            self.provider.update(provider, ConfigSource::Environment);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(crs) = overrides.metric_crs {
            self.metric_crs.update(crs, ConfigSource::Cli);
        }
        if let Some(data_dir) = overrides.data_dir {
            self.data_dir.update(data_dir, ConfigSource::Cli);
        }
        if let Some(radius) = overrides.coverage_radius_m {
            self.coverage_radius_m.update(radius, ConfigSource::Cli);
        }
        if let Some(k) = overrides.nearest_k {
            self.nearest_k.update(k, ConfigSource::Cli);
        }
        if let Some(distance) = overrides.river_distance_m {
            self.river_distance_m.update(distance, ConfigSource::Cli);
        }
        if let Some(ttl) = overrides.cache_ttl_minutes {
            self.cache_ttl_minutes.update(ttl, ConfigSource::Cli);
        }
        if let Some(segments) = overrides.buffer_quadrant_segments {
            self.buffer_quadrant_segments.update(segments, ConfigSource::Cli);
        }
        if let Some(provider) = overrides.provider {
            self.provider.update(provider, ConfigSource::Cli);
        }
    }

    /// Check values that cannot be expressed by their types alone
    pub fn validate(&self) -> Result<()> {
        if self.coverage_radius_m.value <= 0.0 || !self.coverage_radius_m.value.is_finite() {
            return Err(VelomapError::ConfigInvalid {
                key: "coverage_radius_m".to_string(),
                reason: format!("must be positive, got {}", self.coverage_radius_m.value),
            });
        }
        if self.nearest_k.value == 0 {
            return Err(VelomapError::ConfigInvalid {
                key: "nearest_k".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.river_distance_m.value < 0.0 || !self.river_distance_m.value.is_finite() {
            return Err(VelomapError::ConfigInvalid {
                key: "river_distance_m".to_string(),
                reason: format!("must not be negative, got {}", self.river_distance_m.value),
            });
        }
        if self.cache_ttl_minutes.value < 0 {
            return Err(VelomapError::ConfigInvalid {
                key: "cache_ttl_minutes".to_string(),
                reason: format!("must not be negative, got {}", self.cache_ttl_minutes.value),
            });
        }
        if self.buffer_quadrant_segments.value == 0 {
            return Err(VelomapError::ConfigInvalid {
                key: "buffer_quadrant_segments".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.provider.value.trim().is_empty() {
            return Err(VelomapError::ConfigMissing { key: "provider".to_string() });
        }
        Ok(())
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "metric_crs".to_string(),
            (format!("EPSG:{}", self.metric_crs.value), self.metric_crs.source),
        );
        map.insert(
            "data_dir".to_string(),
            (self.data_dir.value.display().to_string(), self.data_dir.source),
        );
        map.insert(
            "coverage_radius_m".to_string(),
            (self.coverage_radius_m.value.to_string(), self.coverage_radius_m.source),
        );
        map.insert(
            "nearest_k".to_string(),
            (self.nearest_k.value.to_string(), self.nearest_k.source),
        );
        map.insert(
            "river_distance_m".to_string(),
            (self.river_distance_m.value.to_string(), self.river_distance_m.source),
        );
        map.insert(
            "cache_ttl_minutes".to_string(),
            (self.cache_ttl_minutes.value.to_string(), self.cache_ttl_minutes.source),
        );
        map.insert(
            "buffer_quadrant_segments".to_string(),
            (self.buffer_quadrant_segments.value.to_string(), self.buffer_quadrant_segments.source),
        );
        map.insert("provider".to_string(), (self.provider.value.clone(), self.provider.source));

        map
    }
}

fn env_parsed<T: FromStr>(key: &str, expected: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Invalid {} value '{}': expected {}", key, raw, expected);
            None
        }
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    metric_crs: Option<u32>,
    data_dir: Option<PathBuf>,
    coverage_radius_m: Option<f64>,
    nearest_k: Option<usize>,
    river_distance_m: Option<f64>,
    cache_ttl_minutes: Option<i64>,
    buffer_quadrant_segments: Option<u32>,
    provider: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub metric_crs: Option<u32>,
    pub data_dir: Option<PathBuf>,
    pub coverage_radius_m: Option<f64>,
    pub nearest_k: Option<usize>,
    pub river_distance_m: Option<f64>,
    pub cache_ttl_minutes: Option<i64>,
    pub buffer_quadrant_segments: Option<u32>,
    pub provider: Option<String>,
}
