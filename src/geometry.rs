//! Geometric primitives for device descriptions.
//!
//! Scanner logs record positions in millimetres and describe element
//! orientation indirectly, as a reference point the element faces. The
//! standardized device description wants metres and unit vectors; the
//! conversions live here so the vendor adapters stay free of math.

/// Millimetres per metre. Scan logs are in mm, device metadata in m.
pub const MM_PER_M: f64 = 1000.0;

/// Below this length a direction vector is considered degenerate.
const DEGENERATE_LENGTH: f64 = 1e-12;

/// Errors from geometric conversions
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GeometryError {
    /// Position and reference point coincide, so no orientation exists
    #[error(
        "cannot orient element at [{0:?}] m: reference point coincides with element position"
    )]
    DegenerateOrientation([f64; 3]),
}

/// Convert a scalar millimetre value to metres.
pub fn mm_to_m(mm: f64) -> f64 {
    mm / MM_PER_M
}

/// Convert a millimetre point to metres, component-wise.
pub fn point_mm_to_m(point_mm: [f64; 3]) -> [f64; 3] {
    [
        mm_to_m(point_mm[0]),
        mm_to_m(point_mm[1]),
        mm_to_m(point_mm[2]),
    ]
}

/// Euclidean length of a 3-vector.
pub fn norm(v: &[f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Unit vector pointing from `position` toward `reference`, both in metres.
///
/// Returns an error when the two points coincide instead of letting a
/// zero-length division produce NaN components downstream.
pub fn unit_orientation(
    position: [f64; 3],
    reference: [f64; 3],
) -> Result<[f64; 3], GeometryError> {
    let diff = [
        reference[0] - position[0],
        reference[1] - position[1],
        reference[2] - position[2],
    ];
    let length = norm(&diff);
    if length < DEGENERATE_LENGTH {
        return Err(GeometryError::DegenerateOrientation(position));
    }
    Ok([diff[0] / length, diff[1] / length, diff[2] / length])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mm_to_m() {
        assert_eq!(mm_to_m(1000.0), 1.0);
        assert_eq!(mm_to_m(0.0), 0.0);
        assert_eq!(point_mm_to_m([500.0, -250.0, 12.7]), [0.5, -0.25, 0.0127]);
    }

    #[test]
    fn test_known_orientation() {
        // Element at the origin facing a reference point one metre along x
        let position = point_mm_to_m([0.0, 0.0, 0.0]);
        let reference = point_mm_to_m([1000.0, 0.0, 0.0]);
        assert_eq!(position, [0.0, 0.0, 0.0]);
        let orientation = unit_orientation(position, reference).unwrap();
        assert_eq!(orientation, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_orientation_is_unit_length() {
        let orientation = unit_orientation([0.01, -0.02, 0.003], [0.0, 0.0, 0.0]).unwrap();
        assert!((norm(&orientation) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_orientation_is_an_error() {
        let p = [0.5, 0.5, 0.5];
        assert_eq!(
            unit_orientation(p, p),
            Err(GeometryError::DegenerateOrientation(p))
        );
    }

    #[test]
    fn test_conversion_is_linear() {
        let p = [12.0, -7.5, 3.25];
        let doubled = [24.0, -15.0, 6.5];
        let m1 = point_mm_to_m(p);
        let m2 = point_mm_to_m(doubled);
        for axis in 0..3 {
            assert!((m2[axis] - 2.0 * m1[axis]).abs() < 1e-15);
        }
    }
}
