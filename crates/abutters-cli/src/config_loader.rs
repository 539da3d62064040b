//! Configuration loading utilities for CLI commands

use abutters_core::config::{CliConfigOverrides, LayeredConfig};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::cli::Cli;

/// Configuration file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "abutters.toml";

/// Resolve which configuration file to read, if any.
///
/// An explicit path must exist; the default file is optional.
fn config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Ok(Some(path.to_path_buf()))
        }
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            Ok(default.exists().then_some(default))
        }
    }
}

/// Load layered configuration: defaults, file, environment, then CLI flags
pub fn load_config(cli: &Cli) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    if let Some(path) = config_path(cli.config.as_deref())? {
        config = config
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }

    let mut config = config.load_from_env();
    config.update_from_cli(CliConfigOverrides {
        service_url: cli.service_url.clone(),
        pid_field: cli.pid_field.clone(),
        ..Default::default()
    });

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let result = config_path(Some(Path::new("/nonexistent/abutters.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_file_is_used() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let resolved = config_path(Some(file.path())).unwrap();
        assert_eq!(resolved.as_deref(), Some(file.path()));
    }
}
