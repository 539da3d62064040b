//! Local planar projection used for buffering.
//!
//! Parcels and buffers span at most a few tens of kilometres, so an
//! equirectangular plane centred on the geometry keeps distortion well under
//! the tolerance the buffer is held to. Plane units are kilometres.

use geo::MapCoords;

/// Mean earth radius in kilometres (same radius `geo::Haversine` uses)
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Equirectangular projection about a fixed origin, in kilometres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalProjection {
    origin_lon: f64,
    origin_lat: f64,
    km_per_degree_lon: f64,
    km_per_degree_lat: f64,
}

impl LocalProjection {
    pub fn centered_on(lon: f64, lat: f64) -> Self {
        let km_per_degree_lat = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;
        Self {
            origin_lon: lon,
            origin_lat: lat,
            km_per_degree_lon: km_per_degree_lat * lat.to_radians().cos(),
            km_per_degree_lat,
        }
    }

    pub fn forward(&self, coord: geo::Coord) -> geo::Coord {
        geo::Coord {
            x: (coord.x - self.origin_lon) * self.km_per_degree_lon,
            y: (coord.y - self.origin_lat) * self.km_per_degree_lat,
        }
    }

    pub fn inverse(&self, coord: geo::Coord) -> geo::Coord {
        geo::Coord {
            x: coord.x / self.km_per_degree_lon + self.origin_lon,
            y: coord.y / self.km_per_degree_lat + self.origin_lat,
        }
    }

    pub fn project<G: MapCoords<f64, f64, Output = G>>(&self, geometry: &G) -> G {
        geometry.map_coords(|c| self.forward(c))
    }

    pub fn unproject<G: MapCoords<f64, f64, Output = G>>(&self, geometry: &G) -> G {
        geometry.map_coords(|c| self.inverse(c))
    }
}
