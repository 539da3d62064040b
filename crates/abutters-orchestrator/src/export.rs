//! Mailing-list export of buffered parcels.
//!
//! One row per parcel: a `PID` column followed by the union of every
//! parcel's attribute keys in sorted order. Missing attributes are left
//! blank.

use abutters_core::error::{AbuttersError, Result};
use abutters_core::models::Parcel;
use std::collections::BTreeSet;
use std::io;
use std::path::Path;

use crate::publisher::PublishedState;

/// Default file name for exported mailing lists
pub const DEFAULT_EXPORT_FILE: &str = "mailingList.csv";

const PID_COLUMN: &str = "PID";

/// Header row for `parcels`
pub fn mailing_list_columns(parcels: &[Parcel]) -> Vec<String> {
    let keys: BTreeSet<&str> =
        parcels.iter().flat_map(|p| p.attributes.keys().map(String::as_str)).collect();
    std::iter::once(PID_COLUMN).chain(keys).map(str::to_string).collect()
}

/// Write `parcels` as CSV, returning the number of data rows
pub fn write_mailing_list<W: io::Write>(parcels: &[Parcel], writer: W) -> Result<usize> {
    let columns = mailing_list_columns(parcels);
    let mut records = csv::Writer::from_writer(writer);

    records.write_record(&columns).map_err(export_error)?;
    for parcel in parcels {
        let row = std::iter::once(parcel.pid.as_str().to_string()).chain(
            columns[1..]
                .iter()
                .map(|key| parcel.attribute(key).map(|v| v.to_cell()).unwrap_or_default()),
        );
        records.write_record(row).map_err(export_error)?;
    }
    records.flush()?;

    Ok(parcels.len())
}

/// Export the buffered parcels of `state` to `path`.
///
/// Fails when the state holds no buffered parcels.
pub fn export_mailing_list<P: AsRef<Path>>(state: &PublishedState, path: P) -> Result<usize> {
    if !state.has_abutters() {
        return Err(AbuttersError::Export(
            "no buffered parcels to export; apply a buffer first".to_string(),
        ));
    }

    let file = std::fs::File::create(path.as_ref())?;
    let rows = write_mailing_list(&state.buffer_parcels, file)?;
    tracing::info!(path = %path.as_ref().display(), rows = rows, "Exported mailing list");
    Ok(rows)
}

fn export_error(e: csv::Error) -> AbuttersError {
    AbuttersError::Export(e.to_string())
}
