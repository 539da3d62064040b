use crate::models::Geometry;
use abutters_core::error::{AbuttersError, Result};

/// Validation result with details
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, location: String, reason: String) {
        self.is_valid = false;
        self.errors.push(ValidationError { location, reason });
    }

    fn absorb(&mut self, prefix: &str, other: ValidationResult) {
        for error in other.errors {
            self.add_error(format!("{}.{}", prefix, error.location), error.reason);
        }
    }
}

/// Validate a geometry
pub fn validate_geometry(geometry: &Geometry) -> ValidationResult {
    if geometry.is_empty() {
        let mut result = ValidationResult::valid();
        result.add_error(
            format!("{:?}", geometry.geometry_type()),
            "Geometry has no coordinates".to_string(),
        );
        return result;
    }

    match geometry {
        Geometry::Point { coordinates } => validate_positions("Point", std::slice::from_ref(coordinates)),
        Geometry::LineString { coordinates } => validate_linestring(coordinates),
        Geometry::Polygon { coordinates } => validate_polygon(coordinates),
        Geometry::MultiPoint { coordinates } => validate_positions("MultiPoint", coordinates),
        Geometry::MultiLineString { coordinates } => {
            let mut result = ValidationResult::valid();
            for (i, line) in coordinates.iter().enumerate() {
                result.absorb(&format!("MultiLineString[{}]", i), validate_linestring(line));
            }
            result
        }
        Geometry::MultiPolygon { coordinates } => {
            let mut result = ValidationResult::valid();
            for (i, polygon) in coordinates.iter().enumerate() {
                result.absorb(&format!("MultiPolygon[{}]", i), validate_polygon(polygon));
            }
            result
        }
    }
}

fn validate_positions(label: &str, positions: &[[f64; 2]]) -> ValidationResult {
    let mut result = ValidationResult::valid();
    for (i, [x, y]) in positions.iter().enumerate() {
        if !x.is_finite() || !y.is_finite() {
            result.add_error(format!("{}[{}]", label, i), "Coordinates must be finite".to_string());
        }
    }
    result
}

fn validate_linestring(coords: &[[f64; 2]]) -> ValidationResult {
    // LineString must have at least 2 points
    if coords.len() < 2 {
        let mut result = ValidationResult::valid();
        result.add_error(
            "LineString".to_string(),
            format!("LineString must have at least 2 points, found {}", coords.len()),
        );
        return result;
    }
    validate_positions("LineString", coords)
}

fn validate_ring(label: String, ring: &[[f64; 2]]) -> ValidationResult {
    let mut result = validate_positions(&label, ring);

    if ring.len() < 4 {
        result.add_error(
            label.clone(),
            format!("Ring must have at least 4 points, found {}", ring.len()),
        );
    }

    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if first != last {
            result.add_error(label, "Ring must be closed (first point == last point)".to_string());
        }
    }

    result
}

fn validate_polygon(rings: &[Vec<[f64; 2]>]) -> ValidationResult {
    let mut result = ValidationResult::valid();

    if rings.is_empty() {
        result.add_error("Polygon".to_string(), "Polygon has no rings".to_string());
        return result;
    }

    for (i, ring) in rings.iter().enumerate() {
        let label = if i == 0 {
            "Polygon exterior".to_string()
        } else {
            format!("Polygon interior[{}]", i - 1)
        };
        let ring_result = validate_ring(label, ring);
        result.errors.extend(ring_result.errors);
    }
    result.is_valid = result.errors.is_empty();

    result
}

/// Reject empty or malformed geometry with [`AbuttersError::InvalidGeometry`]
pub fn ensure_valid(geometry: &Geometry) -> Result<()> {
    let validation = validate_geometry(geometry);
    if validation.is_valid {
        return Ok(());
    }

    let reason = validation
        .errors
        .first()
        .map(|e| format!("{}: {}", e.location, e.reason))
        .unwrap_or_else(|| "Invalid geometry".to_string());
    Err(AbuttersError::InvalidGeometry { reason })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_square() {
        let square = Geometry::polygon(vec![vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 1.0],
            [0.0, 0.0],
        ]]);
        assert!(validate_geometry(&square).is_valid);
        assert!(ensure_valid(&square).is_ok());
    }

    #[test]
    fn test_empty_polygon_is_invalid() {
        let result = ensure_valid(&Geometry::polygon(vec![]));
        assert!(matches!(result, Err(AbuttersError::InvalidGeometry { .. })));
    }

    #[test]
    fn test_unclosed_ring() {
        let open = Geometry::polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]]);
        let result = validate_geometry(&open);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.reason.contains("closed")));
    }

    #[test]
    fn test_short_ring() {
        let short = Geometry::polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [0.0, 0.0]]]);
        assert!(!validate_geometry(&short).is_valid);
    }

    #[test]
    fn test_non_finite_point() {
        assert!(ensure_valid(&Geometry::point(f64::NAN, 42.0)).is_err());
    }

    #[test]
    fn test_multipolygon_error_location() {
        let mp = Geometry::multi_polygon(vec![
            vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
            vec![vec![[5.0, 5.0], [6.0, 5.0]]],
        ]);
        let result = validate_geometry(&mp);
        assert!(!result.is_valid);
        assert!(result.errors[0].location.starts_with("MultiPolygon[1]"));
    }
}
