//! Integration tests for layered configuration
//!
//! Precedence: CLI arguments > Environment variables > Config file > Defaults

use serial_test::serial;
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};
use velomap_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig};

const ENV_KEYS: [&str; 8] = [
    "VELOMAP_METRIC_CRS",
    "VELOMAP_DATA_DIR",
    "VELOMAP_COVERAGE_RADIUS_M",
    "VELOMAP_NEAREST_K",
    "VELOMAP_RIVER_DISTANCE_M",
    "VELOMAP_CACHE_TTL_MINUTES",
    "VELOMAP_BUFFER_QUADRANT_SEGMENTS",
    "VELOMAP_PROVIDER",
];

fn clear_env() {
    for key in ENV_KEYS {
        env::remove_var(key);
    }
}

#[test]
fn test_partial_file_configuration() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
coverage_radius_m = 500.0
# Only override the radius, leave others as defaults
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

    assert_eq!(config.coverage_radius_m.value, 500.0);
    assert_eq!(config.coverage_radius_m.source, ConfigSource::File);
    assert_eq!(config.metric_crs.value, 2056);
    assert_eq!(config.metric_crs.source, ConfigSource::Default);
    assert_eq!(config.provider.source, ConfigSource::Default);
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    env::set_var("VELOMAP_METRIC_CRS", "32632");
    env::set_var("VELOMAP_NEAREST_K", "7");
    env::set_var("VELOMAP_PROVIDER", "publibike");

    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
metric_crs = 21781
nearest_k = 2
provider = "nextbike"
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(config.metric_crs.value, 32632);
    assert_eq!(config.metric_crs.source, ConfigSource::Environment);
    assert_eq!(config.nearest_k.value, 7);
    assert_eq!(config.provider.value, "publibike");
    assert_eq!(config.provider.source, ConfigSource::Environment);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_environment_value_is_ignored() {
    clear_env();
    env::set_var("VELOMAP_COVERAGE_RADIUS_M", "wide");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.coverage_radius_m.value, 300.0);
    assert_eq!(config.coverage_radius_m.source, ConfigSource::Default);

    clear_env();
}

#[test]
#[serial]
fn test_configuration_precedence_order() {
    clear_env();
    env::set_var("VELOMAP_RIVER_DISTANCE_M", "250");

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "river_distance_m = 50.0").unwrap();

    let mut config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(config.river_distance_m.value, 250.0);
    assert_eq!(config.river_distance_m.source, ConfigSource::Environment);

    config.update_from_cli(CliConfigOverrides {
        river_distance_m: Some(75.0),
        ..Default::default()
    });

    assert_eq!(config.river_distance_m.value, 75.0);
    assert_eq!(config.river_distance_m.source, ConfigSource::Cli);

    assert!(ConfigSource::Cli.precedence() > ConfigSource::Environment.precedence());
    assert!(ConfigSource::Environment.precedence() > ConfigSource::File.precedence());
    assert!(ConfigSource::File.precedence() > ConfigSource::Default.precedence());

    clear_env();
}

#[test]
fn test_configuration_source_tracking() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "metric_crs = 21781\ncache_ttl_minutes = 15").unwrap();

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();
    let inspection_map = config.to_inspection_map();

    let (crs_value, crs_source) = &inspection_map["metric_crs"];
    assert_eq!(crs_value, "EPSG:21781");
    assert_eq!(*crs_source, ConfigSource::File);

    let (ttl_value, ttl_source) = &inspection_map["cache_ttl_minutes"];
    assert_eq!(ttl_value, "15");
    assert_eq!(*ttl_source, ConfigSource::File);

    let (provider_value, provider_source) = &inspection_map["provider"];
    assert_eq!(provider_value, "nextbike");
    assert_eq!(*provider_source, ConfigSource::Default);
}

#[test]
fn test_invalid_toml_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "invalid toml content [[[").unwrap();

    let result = LayeredConfig::with_defaults().load_from_file(file.path());

    assert!(result.is_err());
}

#[test]
fn test_missing_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let non_existent = temp_dir.path().join("does_not_exist.toml");

    let result = LayeredConfig::with_defaults().load_from_file(&non_existent);

    assert!(result.is_err());
}

#[test]
#[serial]
fn test_full_configuration_workflow() {
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("velomap.toml");
    fs::write(
        &config_path,
        r#"
metric_crs = 2056
data_dir = "snapshots"
coverage_radius_m = 400.0
buffer_quadrant_segments = 8
"#,
    )
    .unwrap();

    env::set_var("VELOMAP_DATA_DIR", "/var/lib/velomap");
    env::set_var("VELOMAP_COVERAGE_RADIUS_M", "350");

    let mut config = LayeredConfig::with_defaults()
        .load_from_file(&config_path)
        .unwrap()
        .load_from_env();

    assert_eq!(config.data_dir.value, PathBuf::from("/var/lib/velomap"));
    assert_eq!(config.data_dir.source, ConfigSource::Environment);
    assert_eq!(config.coverage_radius_m.value, 350.0);
    assert_eq!(config.buffer_quadrant_segments.value, 8);
    assert_eq!(config.buffer_quadrant_segments.source, ConfigSource::File);

    config.update_from_cli(CliConfigOverrides {
        data_dir: Some(PathBuf::from("fixtures")),
        ..Default::default()
    });

    assert_eq!(config.data_dir.value, PathBuf::from("fixtures"));
    assert_eq!(config.data_dir.source, ConfigSource::Cli);
    assert_eq!(config.coverage_radius_m.source, ConfigSource::Environment);
    assert!(config.validate().is_ok());

    clear_env();
}
