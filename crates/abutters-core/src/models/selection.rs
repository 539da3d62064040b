use serde::{Deserialize, Serialize};
use std::fmt;

use super::{DistanceUnit, Geometry, Parcel, ParcelId};
use crate::error::{AbuttersError, Result};

/// Largest buffer distance accepted at the input boundary, in feet
pub const MAX_BUFFER_FEET: f64 = 100_000.0;

/// The current selection: nothing, or exactly one parcel
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Selection {
    #[default]
    Empty,
    Parcel(Parcel),
}

impl Selection {
    pub fn parcel(&self) -> Option<&Parcel> {
        match self {
            Selection::Empty => None,
            Selection::Parcel(parcel) => Some(parcel),
        }
    }

    pub fn pid(&self) -> Option<&ParcelId> {
        self.parcel().map(|p| &p.pid)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::Empty)
    }
}

impl From<Option<Parcel>> for Selection {
    fn from(value: Option<Parcel>) -> Self {
        value.map(Selection::Parcel).unwrap_or_default()
    }
}

/// Buffer distance in feet, plus the kilometre value used for geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BufferSpec {
    feet: f64,
    kilometers: f64,
}

impl Default for BufferSpec {
    fn default() -> Self {
        Self { feet: 0.0, kilometers: 0.0 }
    }
}

impl BufferSpec {
    /// Validate a distance in feet against the accepted [0, 100000] range
    pub fn new(feet: f64) -> Result<Self> {
        if !feet.is_finite() {
            return Err(AbuttersError::InvalidDistance {
                value: feet,
                reason: "distance must be a finite number".to_string(),
            });
        }
        if !(0.0..=MAX_BUFFER_FEET).contains(&feet) {
            return Err(AbuttersError::InvalidDistance {
                value: feet,
                reason: format!("distance must be between 0 and {} feet", MAX_BUFFER_FEET),
            });
        }
        Ok(Self { feet, kilometers: DistanceUnit::Feet.to_kilometers(feet) })
    }

    pub fn feet(&self) -> f64 {
        self.feet
    }

    pub fn kilometers(&self) -> f64 {
        self.kilometers
    }
}

/// The buffer polygon and the parcels intersecting it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferResult {
    /// Selection the buffer was computed around
    pub source: ParcelId,
    pub spec: BufferSpec,
    pub polygon: Geometry,
    /// Parcels in the order the service returned them
    pub parcels: Vec<Parcel>,
}

/// Monotonic query generation tag
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which generation counter a query is tagged against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryClass {
    Selection,
    Buffer,
}

impl fmt::Display for QueryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryClass::Selection => write!(f, "selection"),
            QueryClass::Buffer => write!(f, "buffer"),
        }
    }
}

/// The three query shapes the feature service answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryKind {
    Contains,
    Intersects,
    Attribute,
}

impl QueryKind {
    pub fn class(&self) -> QueryClass {
        match self {
            QueryKind::Contains | QueryKind::Attribute => QueryClass::Selection,
            QueryKind::Intersects => QueryClass::Buffer,
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKind::Contains => write!(f, "Containment"),
            QueryKind::Intersects => write!(f, "Intersection"),
            QueryKind::Attribute => write!(f, "Attribute"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_buffer_spec_bounds() {
        assert!(BufferSpec::new(0.0).is_ok());
        assert!(BufferSpec::new(MAX_BUFFER_FEET).is_ok());
        assert!(matches!(BufferSpec::new(-1.0), Err(AbuttersError::InvalidDistance { .. })));
        assert!(matches!(
            BufferSpec::new(100_000.5),
            Err(AbuttersError::InvalidDistance { .. })
        ));
        assert!(BufferSpec::new(f64::NAN).is_err());
        assert!(BufferSpec::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_buffer_spec_kilometers() {
        let spec = BufferSpec::new(500.0).unwrap();
        assert_eq!(spec.feet(), 500.0);
        assert!((spec.kilometers() - 0.1524).abs() < 1e-12);
    }

    #[test]
    fn test_selection_from_option() {
        assert!(Selection::from(None).is_empty());
        let parcel = Parcel::new("1", Geometry::point(0.0, 0.0), Default::default());
        let selection = Selection::from(Some(parcel));
        assert_eq!(selection.pid().map(|p| p.as_str()), Some("1"));
    }

    #[test]
    fn test_query_kind_classes() {
        assert_eq!(QueryKind::Contains.class(), QueryClass::Selection);
        assert_eq!(QueryKind::Attribute.class(), QueryClass::Selection);
        assert_eq!(QueryKind::Intersects.class(), QueryClass::Buffer);
    }

    proptest! {
        #[test]
        fn prop_in_range_distances_accepted(feet in 0.0f64..=MAX_BUFFER_FEET) {
            let spec = BufferSpec::new(feet).unwrap();
            prop_assert!((spec.kilometers() - feet * 0.0003048).abs() < 1e-9);
        }

        #[test]
        fn prop_negative_distances_rejected(feet in -1.0e9f64..-1.0e-9) {
            prop_assert!(BufferSpec::new(feet).is_err());
        }
    }
}
