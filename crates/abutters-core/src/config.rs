use crate::error::{AbuttersError, Result};
use crate::models::{BufferSpec, DistanceUnit};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Boston assessing parcels layer
pub const DEFAULT_SERVICE_URL: &str =
    "https://services.arcgis.com/sFnw0xNflSi8J0uh/arcgis/rest/services/parcels/FeatureServer/0";

/// Attribute carrying the parcel identifier in the default layer
pub const DEFAULT_PID_FIELD: &str = "PID_LONG";

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

/// Layered configuration for the abutters tools
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub service_url: ConfigValue<String>,
    pub pid_field: ConfigValue<String>,
    pub buffer_distance: ConfigValue<f64>,
    pub distance_unit: ConfigValue<DistanceUnit>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            service_url: ConfigValue::new(DEFAULT_SERVICE_URL.to_string(), ConfigSource::Default),
            pid_field: ConfigValue::new(DEFAULT_PID_FIELD.to_string(), ConfigSource::Default),
            buffer_distance: ConfigValue::new(0.0, ConfigSource::Default),
            distance_unit: ConfigValue::new(DistanceUnit::Feet, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| AbuttersError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| AbuttersError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(service_url) = file_config.service_url {
            self.service_url.update(service_url, ConfigSource::File);
        }

        if let Some(pid_field) = file_config.pid_field {
            self.pid_field.update(pid_field, ConfigSource::File);
        }

        if let Some(buffer_distance) = file_config.buffer_distance {
            BufferSpec::new(buffer_distance).map_err(|e| AbuttersError::ConfigInvalid {
                key: "buffer_distance".to_string(),
                reason: e.to_string(),
            })?;
            self.buffer_distance.update(buffer_distance, ConfigSource::File);
        }

        if let Some(distance_unit) = file_config.distance_unit {
            self.distance_unit.update(distance_unit, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // ABUTTERS_SERVICE_URL
        if let Ok(url) = env::var("ABUTTERS_SERVICE_URL") {
            if url.trim().is_empty() {
                tracing::warn!("Ignoring empty ABUTTERS_SERVICE_URL");
            } else {
                self.service_url.update(url, ConfigSource::Environment);
            }
        }

        // ABUTTERS_PID_FIELD
        if let Ok(field) = env::var("ABUTTERS_PID_FIELD") {
            if field.trim().is_empty() {
                tracing::warn!("Ignoring empty ABUTTERS_PID_FIELD");
            } else {
                self.pid_field.update(field, ConfigSource::Environment);
            }
        }

        // ABUTTERS_BUFFER_DISTANCE
        if let Ok(distance_str) = env::var("ABUTTERS_BUFFER_DISTANCE") {
            match parse_buffer_distance(&distance_str) {
                Ok(distance) => self.buffer_distance.update(distance, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid ABUTTERS_BUFFER_DISTANCE value '{}': expected feet between 0 and 100000",
                    distance_str
                ),
            }
        }

        // ABUTTERS_DISTANCE_UNIT
        if let Ok(unit_str) = env::var("ABUTTERS_DISTANCE_UNIT") {
            match parse_distance_unit(&unit_str) {
                Ok(unit) => self.distance_unit.update(unit, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid ABUTTERS_DISTANCE_UNIT value '{}': expected feet, meters, kilometers, or miles",
                    unit_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(service_url) = overrides.service_url {
            self.service_url.update(service_url, ConfigSource::Cli);
        }

        if let Some(pid_field) = overrides.pid_field {
            self.pid_field.update(pid_field, ConfigSource::Cli);
        }

        if let Some(buffer_distance) = overrides.buffer_distance {
            self.buffer_distance.update(buffer_distance, ConfigSource::Cli);
        }

        if let Some(distance_unit) = overrides.distance_unit {
            self.distance_unit.update(distance_unit, ConfigSource::Cli);
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "service_url".to_string(),
            (self.service_url.value.clone(), self.service_url.source),
        );

        map.insert("pid_field".to_string(), (self.pid_field.value.clone(), self.pid_field.source));

        map.insert(
            "buffer_distance".to_string(),
            (format!("{} ft", self.buffer_distance.value), self.buffer_distance.source),
        );

        map.insert(
            "distance_unit".to_string(),
            (format!("{:?}", self.distance_unit.value), self.distance_unit.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    service_url: Option<String>,
    pid_field: Option<String>,
    buffer_distance: Option<f64>,
    distance_unit: Option<DistanceUnit>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub service_url: Option<String>,
    pub pid_field: Option<String>,
    pub buffer_distance: Option<f64>,
    pub distance_unit: Option<DistanceUnit>,
}

/// Parse distance unit from string
pub fn parse_distance_unit(s: &str) -> Result<DistanceUnit> {
    match s.to_lowercase().as_str() {
        "feet" | "ft" => Ok(DistanceUnit::Feet),
        "meters" | "m" => Ok(DistanceUnit::Meters),
        "kilometers" | "km" => Ok(DistanceUnit::Kilometers),
        "miles" | "mi" => Ok(DistanceUnit::Miles),
        _ => Err(AbuttersError::ConfigInvalid {
            key: "distance_unit".to_string(),
            reason: format!("Invalid distance unit: {}. Use feet, meters, kilometers, or miles", s),
        }),
    }
}

/// Parse a buffer distance in feet, enforcing the accepted range
pub fn parse_buffer_distance(s: &str) -> Result<f64> {
    let value: f64 = s.trim().parse().map_err(|_| AbuttersError::ConfigInvalid {
        key: "buffer_distance".to_string(),
        reason: format!("Not a number: {}", s),
    })?;
    BufferSpec::new(value).map(|spec| spec.feet())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.service_url.value, DEFAULT_SERVICE_URL);
        assert_eq!(config.service_url.source, ConfigSource::Default);
        assert_eq!(config.pid_field.value, "PID_LONG");
        assert_eq!(config.buffer_distance.value, 0.0);
        assert_eq!(config.distance_unit.value, DistanceUnit::Feet);
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(100, ConfigSource::Default);

        // File should override default
        value.update(200, ConfigSource::File);
        assert_eq!(value.value, 200);
        assert_eq!(value.source, ConfigSource::File);

        // Environment should override file
        value.update(300, ConfigSource::Environment);
        assert_eq!(value.value, 300);

        // CLI should override environment
        value.update(400, ConfigSource::Cli);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);

        // Lower precedence should not override
        value.update(500, ConfigSource::File);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
service_url = "https://example.com/arcgis/rest/services/parcels/FeatureServer/0"
pid_field = "PID"
buffer_distance = 300.0
distance_unit = "Miles"
"#
        )
        .unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

        assert_eq!(
            config.service_url.value,
            "https://example.com/arcgis/rest/services/parcels/FeatureServer/0"
        );
        assert_eq!(config.service_url.source, ConfigSource::File);
        assert_eq!(config.pid_field.value, "PID");
        assert_eq!(config.buffer_distance.value, 300.0);
        assert_eq!(config.distance_unit.value, DistanceUnit::Miles);
    }

    #[test]
    fn test_file_rejects_out_of_range_buffer() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "buffer_distance = 250000.0").unwrap();

        let result = LayeredConfig::with_defaults().load_from_file(file.path());
        assert!(matches!(result, Err(AbuttersError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = LayeredConfig::with_defaults();

        let overrides = CliConfigOverrides {
            service_url: None,
            pid_field: Some("PARCEL_ID".to_string()),
            buffer_distance: Some(500.0),
            distance_unit: None,
        };

        config.update_from_cli(overrides);

        assert_eq!(config.pid_field.value, "PARCEL_ID");
        assert_eq!(config.pid_field.source, ConfigSource::Cli);
        assert_eq!(config.buffer_distance.value, 500.0);
        assert_eq!(config.service_url.source, ConfigSource::Default);
    }

    #[test]
    fn test_parse_distance_unit() {
        assert_eq!(parse_distance_unit("feet").unwrap(), DistanceUnit::Feet);
        assert_eq!(parse_distance_unit("FT").unwrap(), DistanceUnit::Feet);
        assert_eq!(parse_distance_unit("km").unwrap(), DistanceUnit::Kilometers);
        assert_eq!(parse_distance_unit("miles").unwrap(), DistanceUnit::Miles);
        assert!(parse_distance_unit("furlongs").is_err());
    }

    #[test]
    fn test_parse_buffer_distance() {
        assert_eq!(parse_buffer_distance("500").unwrap(), 500.0);
        assert_eq!(parse_buffer_distance(" 0 ").unwrap(), 0.0);
        assert!(parse_buffer_distance("-5").is_err());
        assert!(parse_buffer_distance("100001").is_err());
        assert!(parse_buffer_distance("far").is_err());
    }

    #[test]
    fn test_inspection_map() {
        let config = LayeredConfig::with_defaults();
        let map = config.to_inspection_map();

        assert!(map.contains_key("service_url"));
        assert!(map.contains_key("pid_field"));
        assert!(map.contains_key("buffer_distance"));
        assert!(map.contains_key("distance_unit"));

        let (distance, source) = &map["buffer_distance"];
        assert_eq!(distance, "0 ft");
        assert_eq!(*source, ConfigSource::Default);
    }
}
