//! Integration tests for layered configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! CLI arguments > Environment variables > Config file > Defaults

use abutters_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig, DEFAULT_PID_FIELD};
use abutters_core::models::DistanceUnit;
use serial_test::serial;
use std::env;
use std::io::Write;
use tempfile::NamedTempFile;

fn clear_env() {
    env::remove_var("ABUTTERS_SERVICE_URL");
    env::remove_var("ABUTTERS_PID_FIELD");
    env::remove_var("ABUTTERS_BUFFER_DISTANCE");
    env::remove_var("ABUTTERS_DISTANCE_UNIT");
}

#[test]
fn test_partial_file_configuration() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
buffer_distance = 300.0
# Only override the buffer, leave others as defaults
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

    assert_eq!(config.buffer_distance.value, 300.0);
    assert_eq!(config.buffer_distance.source, ConfigSource::File);
    assert_eq!(config.pid_field.value, DEFAULT_PID_FIELD);
    assert_eq!(config.pid_field.source, ConfigSource::Default);
}

#[test]
fn test_missing_file_is_config_error() {
    let result = LayeredConfig::with_defaults().load_from_file("/nonexistent/abutters.toml");
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();

    env::set_var("ABUTTERS_PID_FIELD", "PID");
    env::set_var("ABUTTERS_BUFFER_DISTANCE", "750");
    env::set_var("ABUTTERS_DISTANCE_UNIT", "meters");

    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
pid_field = "PARCEL"
buffer_distance = 300.0
distance_unit = "Miles"
"#
    )
    .unwrap();

    let config =
        LayeredConfig::with_defaults().load_from_file(file.path()).unwrap().load_from_env();

    assert_eq!(config.pid_field.value, "PID");
    assert_eq!(config.pid_field.source, ConfigSource::Environment);
    assert_eq!(config.buffer_distance.value, 750.0);
    assert_eq!(config.distance_unit.value, DistanceUnit::Meters);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_environment_values_are_ignored() {
    clear_env();

    env::set_var("ABUTTERS_BUFFER_DISTANCE", "-20");
    env::set_var("ABUTTERS_DISTANCE_UNIT", "cubits");
    env::set_var("ABUTTERS_SERVICE_URL", "   ");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.buffer_distance.value, 0.0);
    assert_eq!(config.buffer_distance.source, ConfigSource::Default);
    assert_eq!(config.distance_unit.source, ConfigSource::Default);
    assert_eq!(config.service_url.source, ConfigSource::Default);

    clear_env();
}

#[test]
#[serial]
fn test_configuration_precedence_order() {
    clear_env();
    env::set_var("ABUTTERS_SERVICE_URL", "https://env.example.com/FeatureServer/0");

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"service_url = "https://file.example.com/FeatureServer/0""#).unwrap();

    let mut config =
        LayeredConfig::with_defaults().load_from_file(file.path()).unwrap().load_from_env();

    assert_eq!(config.service_url.value, "https://env.example.com/FeatureServer/0");
    assert_eq!(config.service_url.source, ConfigSource::Environment);

    config.update_from_cli(CliConfigOverrides {
        service_url: Some("https://cli.example.com/FeatureServer/0".to_string()),
        ..Default::default()
    });

    assert_eq!(config.service_url.value, "https://cli.example.com/FeatureServer/0");
    assert_eq!(config.service_url.source, ConfigSource::Cli);

    assert!(ConfigSource::Cli.precedence() > ConfigSource::Environment.precedence());
    assert!(ConfigSource::Environment.precedence() > ConfigSource::File.precedence());
    assert!(ConfigSource::File.precedence() > ConfigSource::Default.precedence());

    clear_env();
}
