//! Buffer computation around parcel geometries.
//!
//! Distances arrive in any [`DistanceUnit`] and are converted once to
//! kilometres, the only unit used internally. The geometry is projected onto a
//! [`LocalProjection`] plane (kilometres), buffered there, and projected back
//! to WGS84.

use abutters_core::error::{AbuttersError, Result};
use abutters_core::models::DistanceUnit;
use geo::Buffer;

use crate::models::{from_multi_polygon, Geometry, GeometryExt};
use crate::transform::LocalProjection;
use crate::validation::ensure_valid;

/// Compute the buffer polygon of `distance` around `geometry`.
///
/// A zero distance returns the input geometry unchanged. The result is a
/// Polygon when the buffer is a single part, otherwise a MultiPolygon.
///
/// # Errors
/// * [`AbuttersError::InvalidDistance`] for negative or non-finite distances
/// * [`AbuttersError::InvalidGeometry`] for empty or malformed geometry
pub fn compute_buffer(geometry: &Geometry, distance: f64, unit: DistanceUnit) -> Result<Geometry> {
    if !distance.is_finite() || distance < 0.0 {
        return Err(AbuttersError::InvalidDistance {
            value: distance,
            reason: "buffer distance must be finite and non-negative".to_string(),
        });
    }
    ensure_valid(geometry)?;

    let km = unit.to_kilometers(distance);
    if km == 0.0 {
        return Ok(geometry.clone());
    }

    let [lon, lat] = geometry
        .centroid_coords()
        .ok_or_else(|| AbuttersError::invalid_geometry("geometry has no centroid"))?;
    let projection = LocalProjection::centered_on(lon, lat);

    let planar = projection.project(&geometry.to_geo());
    let buffered = projection.unproject(&planar.buffer(km));

    if buffered.0.is_empty() {
        return Err(AbuttersError::invalid_geometry("buffer produced no area"));
    }

    tracing::debug!(
        distance = distance,
        unit = unit.abbreviation(),
        km = km,
        parts = buffered.0.len(),
        "Computed buffer"
    );

    Ok(from_multi_polygon(&buffered))
}
