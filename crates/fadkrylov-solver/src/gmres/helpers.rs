//! Givens rotation helpers for the GMRES least-squares update.

/// Compute Givens rotation coefficients.
///
/// Returns `(c, s)` such that:
/// ```text
/// [ c  s ] [ a ]   [ r ]
/// [-s  c ] [ b ] = [ 0 ]
/// ```
/// with `r = sqrt(a^2 + b^2)`. When both entries are zero the swap `(0, 1)`
/// is returned, so the rotated least-squares residual keeps its full norm.
pub fn givens_rotation(a: f64, b: f64) -> (f64, f64) {
    let r = (a * a + b * b).sqrt();
    if r == 0.0 {
        return (0.0, 1.0);
    }
    (a / r, b / r)
}

/// Apply the rotation `(c, s)` to the pair `(a, b)`.
///
/// Returns `(c*a + s*b, -s*a + c*b)`.
#[inline]
pub fn apply_rotation(c: f64, s: f64, a: f64, b: f64) -> (f64, f64) {
    (c * a + s * b, -s * a + c * b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_givens_rotation() {
        let (c, s) = givens_rotation(3.0, 4.0);

        // After rotation, b component should be zero
        let (r, zero) = apply_rotation(c, s, 3.0, 4.0);
        assert!(zero.abs() < 1e-10);
        assert!((r - 5.0).abs() < 1e-14);

        // Check normalization: c^2 + s^2 = 1
        assert!((c * c + s * s - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_givens_rotation_zero_pair() {
        assert_eq!(givens_rotation(0.0, 0.0), (0.0, 1.0));
    }

    #[test]
    fn test_zero_pair_keeps_residual_norm() {
        // beta = (3, 0) rotated by a zero column must not lose the 3
        let (c, s) = givens_rotation(0.0, 0.0);
        let (kept, moved) = (c * 3.0, -s * 3.0);
        assert_eq!(kept, 0.0);
        assert_eq!(moved.abs(), 3.0);
    }

    #[test]
    fn test_givens_rotation_negative_pivot() {
        // b == 0 still normalizes the sign of a
        let (c, s) = givens_rotation(-2.0, 0.0);
        assert_eq!((c, s), (-1.0, 0.0));
        let (r, _) = apply_rotation(c, s, -2.0, 0.0);
        assert_eq!(r, 2.0);
    }
}
