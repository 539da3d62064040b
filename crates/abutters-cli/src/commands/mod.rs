//! Command implementations

mod config;
mod lookup;

use crate::cli::{Cli, Commands};
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use abutters_core::config::LayeredConfig;
use abutters_core::AbuttersError;
use abutters_core::models::LngLat;
use abutters_orchestrator::Trigger;
use abutters_service::{
    ArcGisFeatureService, FeatureDecoder, MemoryFeatureService, SpatialQueryClient,
};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Config => config::execute(&config, &output),
        Commands::Locate(args) => {
            let client = build_client(cli.memory.as_deref(), &config)?;
            let trigger = Trigger::Locate(LngLat::new(args.lon, args.lat));
            lookup::execute(trigger, args.buffer, client, &config, &output).await
        }
        Commands::Search(args) => {
            let client = build_client(cli.memory.as_deref(), &config)?;
            let trigger = Trigger::SearchPid(args.pid);
            lookup::execute(trigger, args.buffer, client, &config, &output).await
        }
    }
}

/// Feature service for this run: a local GeoJSON file or the remote layer
fn build_client(
    memory: Option<&Path>,
    config: &LayeredConfig,
) -> Result<Arc<dyn SpatialQueryClient>> {
    let pid_field = config.pid_field.value.clone();

    match memory {
        Some(path) => {
            let geojson = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let service = MemoryFeatureService::from_feature_collection(
                &geojson,
                &FeatureDecoder::new(pid_field),
            )
            .with_context(|| format!("Failed to load parcels from {}", path.display()))?;
            Ok(Arc::new(service))
        }
        None => {
            if config.service_url.value.trim().is_empty() {
                return Err(AbuttersError::ConfigMissing { key: "service_url".to_string() }.into());
            }
            tracing::debug!(url = %config.service_url.value, "Using remote feature service");
            Ok(Arc::new(ArcGisFeatureService::new(config.service_url.value.as_str(), pid_field)))
        }
    }
}
