use crate::models::{to_geo_geometry, Geometry, LngLat};
use geo::algorithm::intersects::Intersects;
use geo::Point;

/// Check if a location falls inside (or on the boundary of) a geometry
pub fn contains_point(geometry: &Geometry, location: LngLat) -> bool {
    let geo_geom = to_geo_geometry(geometry);
    let point = Point::new(location.lon, location.lat);

    // Boundary points count: a click on a shared lot line still selects a parcel
    geo_geom.intersects(&point)
}

/// Check if two geometries intersect
pub fn intersects(geometry: &Geometry, other: &Geometry) -> bool {
    let geo_geom = to_geo_geometry(geometry);
    let other_geom = to_geo_geometry(other);

    geo_geom.intersects(&other_geom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_polygon() -> Geometry {
        Geometry::polygon(vec![vec![
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 10.0],
            [0.0, 10.0],
            [0.0, 0.0],
        ]])
    }

    #[test]
    fn test_contains_point() {
        let square = square_polygon();
        assert!(contains_point(&square, LngLat::new(5.0, 5.0)));
        assert!(!contains_point(&square, LngLat::new(15.0, 15.0)));
    }

    #[test]
    fn test_boundary_point_is_contained() {
        assert!(contains_point(&square_polygon(), LngLat::new(10.0, 5.0)));
    }

    #[test]
    fn test_intersects() {
        let poly2 = Geometry::polygon(vec![vec![
            [5.0, 5.0],
            [15.0, 5.0],
            [15.0, 15.0],
            [5.0, 15.0],
            [5.0, 5.0],
        ]]);
        let far = Geometry::polygon(vec![vec![
            [50.0, 50.0],
            [60.0, 50.0],
            [60.0, 60.0],
            [50.0, 50.0],
        ]]);

        assert!(intersects(&square_polygon(), &poly2));
        assert!(!intersects(&square_polygon(), &far));
    }

    #[test]
    fn test_touching_parcels_intersect() {
        let neighbour = Geometry::polygon(vec![vec![
            [10.0, 0.0],
            [20.0, 0.0],
            [20.0, 10.0],
            [10.0, 10.0],
            [10.0, 0.0],
        ]]);
        assert!(intersects(&square_polygon(), &neighbour));
    }
}
