//! In-memory feature service for development and testing.
//!
//! These implementations use `RwLock::unwrap()` intentionally. Lock poisoning
//! only occurs when another thread panicked while holding the lock, which is
//! an unrecoverable state. For real parcel data, use the ArcGIS adapter.

use abutters_core::config::DEFAULT_PID_FIELD;
use abutters_core::error::{AbuttersError, Result};
use abutters_core::models::{Geometry, LngLat, Parcel, QueryKind};
use abutters_geo::index::EnvelopeIndex;
use abutters_geo::spatial::{contains_point, intersects};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::decode::FeatureDecoder;
use crate::ports::{FieldEquals, SpatialQueryClient};

#[derive(Debug, Default)]
struct ParcelTable {
    parcels: Vec<Parcel>,
    index: EnvelopeIndex,
}

/// In-memory implementation of SpatialQueryClient.
///
/// Results come back in insertion order, which keeps intersection results
/// deterministic for a fixed parcel set.
#[derive(Debug, Clone)]
pub struct MemoryFeatureService {
    table: Arc<RwLock<ParcelTable>>,
    failing: Arc<RwLock<HashSet<QueryKind>>>,
    pid_field: String,
}

impl Default for MemoryFeatureService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFeatureService {
    /// Create an empty service keyed by the default identifier field
    pub fn new() -> Self {
        Self::with_pid_field(DEFAULT_PID_FIELD)
    }

    /// Create an empty service keyed by `pid_field`
    pub fn with_pid_field(pid_field: impl Into<String>) -> Self {
        Self {
            table: Arc::new(RwLock::new(ParcelTable::default())),
            failing: Arc::new(RwLock::new(HashSet::new())),
            pid_field: pid_field.into(),
        }
    }

    /// Create a service holding `parcels`
    pub fn from_parcels(parcels: impl IntoIterator<Item = Parcel>) -> Self {
        let service = Self::new();
        service.insert_all(parcels);
        service
    }

    /// Load a service from a GeoJSON FeatureCollection document
    pub fn from_feature_collection(geojson: &str, decoder: &FeatureDecoder) -> Result<Self> {
        let parcels = decoder.decode_str(geojson)?;
        tracing::info!(parcels = parcels.len(), "Loaded in-memory parcel layer");
        let service = Self::with_pid_field(decoder.pid_field());
        service.insert_all(parcels);
        Ok(service)
    }

    /// Append a parcel
    pub fn insert(&self, parcel: Parcel) {
        let mut table = self.table.write().unwrap();
        let slot = table.parcels.len();
        table.index.insert(slot, &parcel.geometry);
        table.parcels.push(parcel);
    }

    /// Append several parcels, preserving their order
    pub fn insert_all(&self, parcels: impl IntoIterator<Item = Parcel>) {
        for parcel in parcels {
            self.insert(parcel);
        }
    }

    pub fn len(&self) -> usize {
        self.table.read().unwrap().parcels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every subsequent query of `kind` fail (or succeed again)
    pub fn set_failing(&self, kind: QueryKind, failing: bool) {
        let mut set = self.failing.write().unwrap();
        if failing {
            set.insert(kind);
        } else {
            set.remove(&kind);
        }
    }

    fn check_failure(&self, kind: QueryKind) -> Result<()> {
        if self.failing.read().unwrap().contains(&kind) {
            return Err(AbuttersError::query_failed(kind, "service unavailable"));
        }
        Ok(())
    }

    fn matching(&self, query: &Geometry, predicate: impl Fn(&Parcel) -> bool) -> Vec<Parcel> {
        let table = self.table.read().unwrap();
        table
            .index
            .candidates(query)
            .into_iter()
            .filter_map(|slot| table.parcels.get(slot))
            .filter(|parcel| predicate(parcel))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SpatialQueryClient for MemoryFeatureService {
    async fn query_contains(&self, point: LngLat) -> Result<Option<Parcel>> {
        self.check_failure(QueryKind::Contains)?;
        let found = self.matching(&point.to_geometry(), |parcel| {
            contains_point(&parcel.geometry, point)
        });
        Ok(found.into_iter().next())
    }

    async fn query_intersects(&self, geometry: &Geometry) -> Result<Vec<Parcel>> {
        self.check_failure(QueryKind::Intersects)?;
        Ok(self.matching(geometry, |parcel| intersects(&parcel.geometry, geometry)))
    }

    async fn query_attribute(&self, predicate: &FieldEquals) -> Result<Option<Parcel>> {
        self.check_failure(QueryKind::Attribute)?;
        let wanted = predicate.value.to_cell();
        let table = self.table.read().unwrap();
        Ok(table
            .parcels
            .iter()
            .find(|parcel| match parcel.attribute(&predicate.field) {
                Some(value) => value.to_cell() == wanted,
                None => predicate.field == self.pid_field && parcel.pid.as_str() == wanted,
            })
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abutters_core::models::{AttributeValue, Attributes};

    fn lot(pid: &str, x: f64, y: f64) -> Parcel {
        let mut attributes = Attributes::new();
        attributes.insert("OWNER".to_string(), AttributeValue::Text(format!("OWNER {}", pid)));
        Parcel::new(
            pid,
            Geometry::polygon(vec![vec![
                [x, y],
                [x + 1.0, y],
                [x + 1.0, y + 1.0],
                [x, y + 1.0],
                [x, y],
            ]]),
            attributes,
        )
    }

    fn row_of_lots() -> MemoryFeatureService {
        MemoryFeatureService::from_parcels(vec![
            lot("C", 2.0, 0.0),
            lot("A", 0.0, 0.0),
            lot("B", 1.0, 0.0),
            lot("FAR", 50.0, 50.0),
        ])
    }

    #[tokio::test]
    async fn test_query_contains() {
        let service = row_of_lots();
        let found = service.query_contains(LngLat::new(0.5, 0.5)).await.unwrap();
        assert_eq!(found.unwrap().pid.as_str(), "A");

        let none = service.query_contains(LngLat::new(20.0, 20.0)).await.unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_query_intersects_keeps_insertion_order() {
        let service = row_of_lots();
        let area = Geometry::polygon(vec![vec![
            [0.5, 0.2],
            [2.5, 0.2],
            [2.5, 0.8],
            [0.5, 0.8],
            [0.5, 0.2],
        ]]);

        let found = service.query_intersects(&area).await.unwrap();
        let pids: Vec<&str> = found.iter().map(|p| p.pid.as_str()).collect();
        assert_eq!(pids, vec!["C", "A", "B"]);

        let again = service.query_intersects(&area).await.unwrap();
        assert_eq!(found, again);
    }

    #[tokio::test]
    async fn test_query_attribute_by_pid_field() {
        let service = row_of_lots();
        let found = service.query_attribute(&FieldEquals::new("PID_LONG", "B")).await.unwrap();
        assert_eq!(found.unwrap().pid.as_str(), "B");

        let by_owner =
            service.query_attribute(&FieldEquals::new("OWNER", "OWNER FAR")).await.unwrap();
        assert_eq!(by_owner.unwrap().pid.as_str(), "FAR");

        let missing = service.query_attribute(&FieldEquals::new("PID_LONG", "Z")).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let service = row_of_lots();
        service.set_failing(QueryKind::Contains, true);

        let result = service.query_contains(LngLat::new(0.5, 0.5)).await;
        assert!(matches!(
            result,
            Err(AbuttersError::QueryFailed { query: QueryKind::Contains, .. })
        ));

        // Other query kinds are unaffected
        assert!(service.query_attribute(&FieldEquals::new("PID_LONG", "A")).await.is_ok());

        service.set_failing(QueryKind::Contains, false);
        assert!(service.query_contains(LngLat::new(0.5, 0.5)).await.unwrap().is_some());
    }
}
