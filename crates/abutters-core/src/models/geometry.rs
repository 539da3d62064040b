//! Canonical geometry types used across all abutters crates.
//!
//! These types provide a bridge between GeoJSON serialization and the
//! computational geo crate types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kilometres per international foot. The only feet conversion used anywhere.
pub const FEET_TO_KILOMETERS: f64 = 0.0003048;

/// Kilometres per international statute mile
const MILES_TO_KILOMETERS: f64 = 1.609344;

/// A WGS84 longitude/latitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lon: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }

    pub fn to_geometry(self) -> Geometry {
        Geometry::point(self.lon, self.lat)
    }
}

impl fmt::Display for LngLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lon, self.lat)
    }
}

/// Distance units accepted at the boundaries.
///
/// Geometry work happens in kilometres; every unit converts through
/// [`DistanceUnit::to_kilometers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DistanceUnit {
    #[default]
    Feet,
    Meters,
    Kilometers,
    Miles,
}

impl DistanceUnit {
    /// Convert a distance value to kilometres
    pub fn to_kilometers(&self, value: f64) -> f64 {
        match self {
            DistanceUnit::Feet => value * FEET_TO_KILOMETERS,
            DistanceUnit::Meters => value / 1000.0,
            DistanceUnit::Kilometers => value,
            DistanceUnit::Miles => value * MILES_TO_KILOMETERS,
        }
    }

    /// Convert a distance value from kilometres to this unit
    pub fn from_kilometers(&self, km: f64) -> f64 {
        match self {
            DistanceUnit::Feet => km / FEET_TO_KILOMETERS,
            DistanceUnit::Meters => km * 1000.0,
            DistanceUnit::Kilometers => km,
            DistanceUnit::Miles => km / MILES_TO_KILOMETERS,
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            DistanceUnit::Feet => "ft",
            DistanceUnit::Meters => "m",
            DistanceUnit::Kilometers => "km",
            DistanceUnit::Miles => "mi",
        }
    }
}

/// Geometry type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GeometryType {
    #[default]
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

/// GeoJSON-compatible geometry representation
///
/// This enum directly maps to GeoJSON geometry types with coordinate arrays.
/// It can be serialized/deserialized as GeoJSON and converted to/from `geo` crate types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: [f64; 2],
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
    },
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPoint {
        coordinates: Vec<[f64; 2]>,
    },
    MultiLineString {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
}

impl Geometry {
    /// Create a Point geometry
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point { coordinates: [x, y] }
    }

    /// Create a Polygon geometry
    pub fn polygon(rings: Vec<Vec<[f64; 2]>>) -> Self {
        Geometry::Polygon { coordinates: rings }
    }

    /// Create a MultiPolygon geometry
    pub fn multi_polygon(polygons: Vec<Vec<Vec<[f64; 2]>>>) -> Self {
        Geometry::MultiPolygon { coordinates: polygons }
    }

    /// Get the geometry type
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point { .. } => GeometryType::Point,
            Geometry::LineString { .. } => GeometryType::LineString,
            Geometry::Polygon { .. } => GeometryType::Polygon,
            Geometry::MultiPoint { .. } => GeometryType::MultiPoint,
            Geometry::MultiLineString { .. } => GeometryType::MultiLineString,
            Geometry::MultiPolygon { .. } => GeometryType::MultiPolygon,
        }
    }

    /// Whether the geometry is a Polygon or MultiPolygon
    pub fn is_polygonal(&self) -> bool {
        matches!(self, Geometry::Polygon { .. } | Geometry::MultiPolygon { .. })
    }

    /// Iterate over every coordinate position in the geometry
    pub fn positions(&self) -> Box<dyn Iterator<Item = &[f64; 2]> + '_> {
        match self {
            Geometry::Point { coordinates } => Box::new(std::iter::once(coordinates)),
            Geometry::LineString { coordinates } | Geometry::MultiPoint { coordinates } => {
                Box::new(coordinates.iter())
            }
            Geometry::Polygon { coordinates } | Geometry::MultiLineString { coordinates } => {
                Box::new(coordinates.iter().flatten())
            }
            Geometry::MultiPolygon { coordinates } => {
                Box::new(coordinates.iter().flatten().flatten())
            }
        }
    }

    /// True when the geometry carries no coordinates at all
    pub fn is_empty(&self) -> bool {
        self.positions().next().is_none()
    }

    /// Try to parse from a serde_json::Value (GeoJSON)
    pub fn from_geojson(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}
