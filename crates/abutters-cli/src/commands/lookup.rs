//! Locate and search command implementation

use crate::cli::BufferArgs;
use crate::output::OutputWriter;
use crate::output_types::{BufferOutput, LookupOutput, ParcelRow};
use abutters_core::config::{ConfigSource, LayeredConfig};
use abutters_core::models::DistanceUnit;
use abutters_orchestrator::{export_mailing_list, OrchestratorRuntime, Trigger};
use abutters_service::SpatialQueryClient;
use anyhow::{bail, Context, Result};
use std::sync::Arc;

pub async fn execute(
    trigger: Trigger,
    args: BufferArgs,
    client: Arc<dyn SpatialQueryClient>,
    config: &LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    let handle = OrchestratorRuntime::spawn(client, config.pid_field.value.clone());
    let described = trigger.to_string();

    // Resolve the selection
    let state = handle.submit(trigger).await?;
    if let Some(kind) = state.last_error {
        bail!("Could not {}: {}", described, kind);
    }

    let Some(selection) = state.selection.clone() else {
        output.warning(format!("No parcel found ({})", described));
        return output.result(LookupOutput { selection: None, buffer: None, phase: state.phase });
    };

    output.section("Selected Parcel");
    output.kv("PID", &selection.pid);
    for (key, value) in &selection.attributes {
        output.kv(key, value.to_cell());
    }

    // Buffer: explicit flag first, then a configured distance
    let distance = args.buffer.or_else(|| {
        (config.buffer_distance.source != ConfigSource::Default)
            .then_some(config.buffer_distance.value)
    });
    let Some(distance) = distance else {
        if args.csv.is_some() {
            bail!("Exporting a mailing list needs a buffer distance (--buffer FEET)");
        }
        return output.result(LookupOutput {
            selection: Some(selection),
            buffer: None,
            phase: state.phase,
        });
    };

    let state = handle.submit(Trigger::ApplyBuffer(distance)).await?;
    if let Some(kind) = state.last_error {
        bail!("Could not buffer {} by {} ft: {}", selection.pid, distance, kind);
    }

    output.section("Abutters");
    output.kv("Buffer", format_distance(distance, config.distance_unit.value));
    output.kv("Parcels", state.buffer_parcels.len());
    output.table(state.buffer_parcels.iter().map(ParcelRow::from).collect());

    let exported_to = match &args.csv {
        Some(path) if state.has_abutters() => {
            let rows = export_mailing_list(&state, path)
                .with_context(|| format!("Failed to export {}", path.display()))?;
            output.success(format!("Exported {} parcels to {}", rows, path.display()));
            Some(path.display().to_string())
        }
        Some(_) => {
            output.warning("No abutters found; mailing list not exported");
            None
        }
        None => None,
    };

    output.result(LookupOutput {
        selection: Some(selection),
        buffer: Some(BufferOutput {
            distance: state.buffer_distance,
            polygon: state.buffer_polygon.clone(),
            abutters: state.buffer_parcels.clone(),
            exported_to,
        }),
        phase: state.phase,
    })
}

/// Feet, plus the configured display unit when it differs
fn format_distance(feet: f64, unit: DistanceUnit) -> String {
    if unit == DistanceUnit::Feet {
        return format!("{} ft", feet);
    }
    let converted = unit.from_kilometers(DistanceUnit::Feet.to_kilometers(feet));
    format!("{} ft ({:.2} {})", feet, converted, unit.abbreviation())
}
