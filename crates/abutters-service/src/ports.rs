use abutters_core::error::Result;
use abutters_core::models::{AttributeValue, Geometry, LngLat, Parcel};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Exact attribute predicate, e.g. `PID_LONG = '0100200300'`
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEquals {
    pub field: String,
    pub value: AttributeValue,
}

impl FieldEquals {
    pub fn new(field: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self { field: field.into(), value: value.into() }
    }
}

impl fmt::Display for FieldEquals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.field, self.value.to_cell())
    }
}

/// Port for the remote parcel feature service.
///
/// All three queries are side-effect-free reads: callers may drop or ignore
/// an in-flight call without affecting the service.
#[async_trait]
pub trait SpatialQueryClient: Send + Sync {
    /// The parcel whose geometry contains `point`, if any
    async fn query_contains(&self, point: LngLat) -> Result<Option<Parcel>>;

    /// Every parcel whose geometry intersects `geometry`, in a stable order
    async fn query_intersects(&self, geometry: &Geometry) -> Result<Vec<Parcel>>;

    /// The parcel matching an exact attribute predicate, if any
    async fn query_attribute(&self, predicate: &FieldEquals) -> Result<Option<Parcel>>;
}

#[async_trait]
impl<T: SpatialQueryClient + ?Sized> SpatialQueryClient for Arc<T> {
    async fn query_contains(&self, point: LngLat) -> Result<Option<Parcel>> {
        (**self).query_contains(point).await
    }

    async fn query_intersects(&self, geometry: &Geometry) -> Result<Vec<Parcel>> {
        (**self).query_intersects(geometry).await
    }

    async fn query_attribute(&self, predicate: &FieldEquals) -> Result<Option<Parcel>> {
        (**self).query_attribute(predicate).await
    }
}
