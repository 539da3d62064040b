//! Decoding GeoJSON features into parcels.

use abutters_core::error::{AbuttersError, Result};
use abutters_core::models::{AttributeValue, Attributes, Geometry, Parcel, ParcelId};
use geojson::{Feature, FeatureCollection};

/// Turns service features into [`Parcel`]s.
///
/// Only the identifier field is interpreted; every other property is carried
/// through as an opaque attribute.
#[derive(Debug, Clone)]
pub struct FeatureDecoder {
    pid_field: String,
}

impl FeatureDecoder {
    pub fn new(pid_field: impl Into<String>) -> Self {
        Self { pid_field: pid_field.into() }
    }

    pub fn pid_field(&self) -> &str {
        &self.pid_field
    }

    /// Decode one feature. Features without an identifier or a usable
    /// geometry are skipped.
    pub fn decode(&self, feature: &Feature) -> Option<Parcel> {
        let properties = feature.properties.as_ref();

        let pid = properties
            .and_then(|props| props.get(&self.pid_field))
            .map(|value| AttributeValue::from(value.clone()))
            .filter(|value| *value != AttributeValue::Null)
            .map(|value| ParcelId::new(value.to_cell()));
        let Some(pid) = pid else {
            tracing::warn!(field = %self.pid_field, "Skipping feature without identifier");
            return None;
        };

        let geometry = feature
            .geometry
            .as_ref()
            .and_then(|g| serde_json::to_value(g).ok())
            .and_then(|value| Geometry::from_geojson(&value));
        let Some(geometry) = geometry else {
            tracing::warn!(pid = %pid, "Skipping feature without usable geometry");
            return None;
        };

        let attributes: Attributes = properties
            .map(|props| {
                props.iter().map(|(k, v)| (k.clone(), AttributeValue::from(v.clone()))).collect()
            })
            .unwrap_or_default();

        Some(Parcel { pid, geometry, attributes })
    }

    /// Decode every usable feature, preserving collection order
    pub fn decode_collection(&self, collection: &FeatureCollection) -> Vec<Parcel> {
        collection.features.iter().filter_map(|f| self.decode(f)).collect()
    }

    /// Parse a GeoJSON FeatureCollection document
    pub fn decode_str(&self, geojson: &str) -> Result<Vec<Parcel>> {
        let collection: FeatureCollection = serde_json::from_str(geojson)
            .map_err(|e| AbuttersError::Serialization(format!("Invalid FeatureCollection: {}", e)))?;
        Ok(self.decode_collection(&collection))
    }
}
