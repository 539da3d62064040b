//! Abutters Geo - Geometry validation, buffering, and spatial predicates
//!
//! This crate holds the pure geometry work: buffer computation in a single
//! internal unit, geometry validation, and the predicates used to answer
//! containment and intersection queries locally.

pub mod buffer;
pub mod index;
pub mod models;
pub mod spatial;
pub mod transform;
pub mod validation;

pub use buffer::compute_buffer;
pub use models::{from_multi_polygon, to_geo_geometry, GeometryExt};
pub use spatial::{contains_point, intersects};
pub use validation::{ensure_valid, validate_geometry, ValidationError, ValidationResult};
