use abutters_core::models::{Geometry, Parcel};
use abutters_orchestrator::Phase;
use serde::Serialize;
use tabled::Tabled;

/// Attributes shown per row in human output
const PREVIEW_ATTRIBUTES: usize = 3;

/// Output for locate and search commands
#[derive(Debug, Serialize)]
pub struct LookupOutput {
    pub selection: Option<Parcel>,
    pub buffer: Option<BufferOutput>,
    pub phase: Phase,
}

#[derive(Debug, Serialize)]
pub struct BufferOutput {
    /// Distance in feet
    pub distance: f64,
    pub polygon: Option<Geometry>,
    pub abutters: Vec<Parcel>,
    pub exported_to: Option<String>,
}

/// Output for config command
#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    pub entries: Vec<ConfigEntry>,
}

#[derive(Debug, Serialize, Tabled)]
pub struct ConfigEntry {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

/// One parcel in the abutters table
#[derive(Debug, Tabled)]
pub struct ParcelRow {
    #[tabled(rename = "PID")]
    pub pid: String,
    #[tabled(rename = "Attributes")]
    pub attributes: String,
}

impl From<&Parcel> for ParcelRow {
    fn from(parcel: &Parcel) -> Self {
        let mut preview: Vec<String> = parcel
            .attributes
            .iter()
            .take(PREVIEW_ATTRIBUTES)
            .map(|(key, value)| format!("{}={}", key, value.to_cell()))
            .collect();
        if parcel.attributes.len() > PREVIEW_ATTRIBUTES {
            preview.push(format!("(+{} more)", parcel.attributes.len() - PREVIEW_ATTRIBUTES));
        }
        Self { pid: parcel.pid.to_string(), attributes: preview.join(", ") }
    }
}
