//! Conversions between the canonical [`Geometry`] and `geo` crate types.

use geo::Geometry as GeoGeometry;

pub use abutters_core::models::{Geometry, GeometryType, LngLat};

type Ring = Vec<[f64; 2]>;

fn to_line_string(coords: &[[f64; 2]]) -> geo::LineString {
    geo::LineString::new(coords.iter().map(|c| geo::Coord { x: c[0], y: c[1] }).collect())
}

fn to_polygon(rings: &[Ring]) -> geo::Polygon {
    match rings.split_first() {
        Some((exterior, interiors)) => geo::Polygon::new(
            to_line_string(exterior),
            interiors.iter().map(|ring| to_line_string(ring)).collect(),
        ),
        None => geo::Polygon::new(geo::LineString::new(vec![]), vec![]),
    }
}

fn polygon_rings(polygon: &geo::Polygon) -> Vec<Ring> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| ring.coords().map(|c| [c.x, c.y]).collect())
        .collect()
}

/// Convert a canonical Geometry to a geo::Geometry
pub fn to_geo_geometry(geom: &Geometry) -> GeoGeometry {
    match geom {
        Geometry::Point { coordinates } => {
            GeoGeometry::Point(geo::Point::new(coordinates[0], coordinates[1]))
        }
        Geometry::LineString { coordinates } => {
            GeoGeometry::LineString(to_line_string(coordinates))
        }
        Geometry::Polygon { coordinates } => GeoGeometry::Polygon(to_polygon(coordinates)),
        Geometry::MultiPoint { coordinates } => {
            let points: Vec<geo::Point> =
                coordinates.iter().map(|c| geo::Point::new(c[0], c[1])).collect();
            GeoGeometry::MultiPoint(geo::MultiPoint::new(points))
        }
        Geometry::MultiLineString { coordinates } => GeoGeometry::MultiLineString(
            geo::MultiLineString::new(coordinates.iter().map(|l| to_line_string(l)).collect()),
        ),
        Geometry::MultiPolygon { coordinates } => GeoGeometry::MultiPolygon(
            geo::MultiPolygon::new(coordinates.iter().map(|p| to_polygon(p)).collect()),
        ),
    }
}

/// Convert a geo::MultiPolygon, collapsing single-part results to a Polygon
pub fn from_multi_polygon(mp: &geo::MultiPolygon) -> Geometry {
    match mp.0.as_slice() {
        [single] => Geometry::Polygon { coordinates: polygon_rings(single) },
        parts => Geometry::MultiPolygon { coordinates: parts.iter().map(polygon_rings).collect() },
    }
}

/// Extension trait for Geometry with geo-crate operations
pub trait GeometryExt {
    /// Convert to geo::Geometry
    fn to_geo(&self) -> GeoGeometry;

    /// Get the centroid as coordinates
    fn centroid_coords(&self) -> Option<[f64; 2]>;

    /// Bounding box as `[min_x, min_y, max_x, max_y]`
    fn bbox(&self) -> Option<[f64; 4]>;
}

impl GeometryExt for Geometry {
    fn to_geo(&self) -> GeoGeometry {
        to_geo_geometry(self)
    }

    fn centroid_coords(&self) -> Option<[f64; 2]> {
        use geo::algorithm::centroid::Centroid;
        let geo_geom = self.to_geo();
        geo_geom.centroid().map(|p| [p.x(), p.y()])
    }

    fn bbox(&self) -> Option<[f64; 4]> {
        use geo::algorithm::bounding_rect::BoundingRect;
        let rect = self.to_geo().bounding_rect()?;
        Some([rect.min().x, rect.min().y, rect.max().x, rect.max().y])
    }
}
