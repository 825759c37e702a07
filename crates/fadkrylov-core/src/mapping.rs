//! Coordinate mappings between physical and logical coordinates.
//!
//! Problem setups use these to place collocation points; they are not part
//! of the solver itself. Mappings are generic over [`Scalar`] so that a
//! coordinate can carry tangents through the change of variables.

use crate::error::{Error, Result};
use crate::scalar::Scalar;

/// An invertible change of variables.
///
/// Implementations must satisfy `inverse(forward(x)) == x` up to rounding.
pub trait CoordinateMapping {
    /// Physical to logical.
    fn forward<T: Scalar>(&self, x: T) -> T;

    /// Logical to physical.
    fn inverse<T: Scalar>(&self, x: T) -> T;
}

/// `forward(x) = a * x + b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearMapping {
    a: f64,
    b: f64,
    a_inv: f64,
}

impl LinearMapping {
    /// Create the mapping `x -> a * x + b`.
    ///
    /// Fails if `a` is zero or either coefficient is not finite.
    pub fn new(a: f64, b: f64) -> Result<Self> {
        if a == 0.0 || !a.is_finite() || !b.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "linear mapping needs finite a != 0 and finite b, got a={a}, b={b}"
            )));
        }
        Ok(Self { a, b, a_inv: 1.0 / a })
    }

    /// Mapping that sends `[lo, hi]` onto `[-1, 1]`.
    pub fn onto_unit_interval(lo: f64, hi: f64) -> Result<Self> {
        let a = 2.0 / (hi - lo);
        Self::new(a, -(hi + lo) / (hi - lo))
    }

    pub fn scale(&self) -> f64 {
        self.a
    }

    pub fn offset(&self) -> f64 {
        self.b
    }
}

impl CoordinateMapping for LinearMapping {
    fn forward<T: Scalar>(&self, x: T) -> T {
        x * self.a + self.b
    }

    fn inverse<T: Scalar>(&self, x: T) -> T {
        (x - self.b) * self.a_inv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::Dual;

    #[test]
    fn round_trip_real() {
        let m = LinearMapping::new(2.5, -1.0).unwrap();
        for &x in &[-3.0, 0.0, 0.7, 12.0] {
            assert!((m.inverse(m.forward(x)) - x).abs() < 1e-14);
        }
    }

    #[test]
    fn round_trip_dual_keeps_tangent() {
        let m = LinearMapping::new(4.0, 0.5).unwrap();
        let x = Dual::<1>::variable(0.3, 0);
        let y = m.forward(x);
        assert_eq!(y.dx(0), 4.0);
        let back = m.inverse(y);
        assert!((back.val() - 0.3).abs() < 1e-15);
        assert!((back.dx(0) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn unit_interval() {
        let m = LinearMapping::onto_unit_interval(2.0, 6.0).unwrap();
        assert!((m.forward(2.0) + 1.0).abs() < 1e-15);
        assert!((m.forward(6.0) - 1.0).abs() < 1e-15);
        assert!((m.inverse(0.0) - 4.0).abs() < 1e-15);
    }

    #[test]
    fn rejects_degenerate_scale() {
        assert!(matches!(
            LinearMapping::new(0.0, 1.0),
            Err(Error::InvalidParameter(_))
        ));
        assert!(LinearMapping::onto_unit_interval(1.0, 1.0).is_err());
    }
}
