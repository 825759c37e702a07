//! Triangular solve for real or dual operands.
//!
//! `A`, `B` and `alpha` may each be real or dual. All three are projected to
//! their value parts, solved with nalgebra's dense triangular kernels, and
//! only the value part of `B` is written back. Tangents of `B` are left as
//! they were on entry; callers that need the derivative of the solution must
//! differentiate around this call.

use fadkrylov_core::{Matrix, Scalar};
use nalgebra::DMatrix;

use crate::error::{Error, Result};

/// Which side of the unknown the triangular matrix is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// `op(A) * X = alpha * B`
    Left,
    /// `X * op(A) = alpha * B`
    Right,
}

/// Which triangle of `A` is referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uplo {
    Upper,
    Lower,
}

/// `op(A)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trans {
    NoTranspose,
    Transpose,
}

/// Whether the diagonal of `A` is read or assumed to be ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diag {
    NonUnit,
    Unit,
}

/// Solve a triangular system in place, overwriting the values of `b`.
///
/// `a` must be square with order matching the rows of `b` (left side) or its
/// columns (right side).
///
/// # Errors
/// - [`fadkrylov_core::Error::NotSquare`] if `a` is not square
/// - [`fadkrylov_core::Error::DimensionMismatch`] if `a` and `b` disagree
/// - [`Error::SingularMatrix`] on a zero pivot
#[allow(clippy::too_many_arguments)]
pub fn trsm<A, B, Al>(
    side: Side,
    uplo: Uplo,
    trans: Trans,
    diag: Diag,
    alpha: &Al,
    a: &Matrix<A>,
    b: &mut Matrix<B>,
) -> Result<()>
where
    A: Scalar,
    B: Scalar,
    Al: Scalar,
{
    let x = shadow_solve(side, uplo, trans, diag, alpha.value(), a, b.shape(), |i, j| {
        b[(i, j)].value()
    })?;
    for j in 0..b.ncols() {
        for i in 0..b.nrows() {
            *b[(i, j)].value_mut() = x[(i, j)];
        }
    }
    Ok(())
}

/// [`trsm`] with a rank-1 right-hand side.
///
/// `b` is treated as a single column for [`Side::Left`] and as a single row
/// for [`Side::Right`].
#[allow(clippy::too_many_arguments)]
pub fn trsm_vec<A, B, Al>(
    side: Side,
    uplo: Uplo,
    trans: Trans,
    diag: Diag,
    alpha: &Al,
    a: &Matrix<A>,
    b: &mut [B],
) -> Result<()>
where
    A: Scalar,
    B: Scalar,
    Al: Scalar,
{
    let shape = match side {
        Side::Left => (b.len(), 1),
        Side::Right => (1, b.len()),
    };
    // One of (i, j) is always zero.
    let x = shadow_solve(side, uplo, trans, diag, alpha.value(), a, shape, |i, j| {
        b[i + j].value()
    })?;
    for (k, bk) in b.iter_mut().enumerate() {
        *bk.value_mut() = x[k];
    }
    Ok(())
}

/// Solve on value shadows and return `X` in the orientation of `B`.
#[allow(clippy::too_many_arguments)]
fn shadow_solve<A: Scalar>(
    side: Side,
    uplo: Uplo,
    trans: Trans,
    diag: Diag,
    alpha: f64,
    a: &Matrix<A>,
    b_shape: (usize, usize),
    b_value: impl Fn(usize, usize) -> f64,
) -> Result<DMatrix<f64>> {
    let (rows, cols) = a.shape();
    if rows != cols {
        return Err(fadkrylov_core::Error::NotSquare { rows, cols }.into());
    }
    let n = rows;
    let (b_rows, b_cols) = b_shape;
    let order = match side {
        Side::Left => b_rows,
        Side::Right => b_cols,
    };
    if order != n {
        return Err(Error::dimension(n, order));
    }

    // Right-side systems are solved as op(A)^T * X^T = alpha * B^T.
    let transpose = (trans == Trans::Transpose) ^ (side == Side::Right);
    let upper = (uplo == Uplo::Upper) ^ transpose;

    let mut m = DMatrix::<f64>::zeros(n, n);
    for j in 0..n {
        for i in 0..n {
            let referenced = match uplo {
                Uplo::Upper => i <= j,
                Uplo::Lower => i >= j,
            };
            if !referenced {
                continue;
            }
            let v = if i == j && diag == Diag::Unit {
                1.0
            } else {
                a[(i, j)].value()
            };
            if transpose {
                m[(j, i)] = v;
            } else {
                m[(i, j)] = v;
            }
        }
    }

    let mut rhs = match side {
        Side::Left => DMatrix::from_fn(b_rows, b_cols, |i, j| alpha * b_value(i, j)),
        Side::Right => DMatrix::from_fn(b_cols, b_rows, |i, j| alpha * b_value(j, i)),
    };

    let solved = if upper {
        m.solve_upper_triangular_mut(&mut rhs)
    } else {
        m.solve_lower_triangular_mut(&mut rhs)
    };
    if !solved {
        return Err(Error::SingularMatrix);
    }

    Ok(match side {
        Side::Left => rhs,
        Side::Right => rhs.transpose(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fadkrylov_core::Dual;

    type D1 = Dual<1>;

    fn upper() -> Matrix<f64> {
        Matrix::from_row_slice(3, 3, &[2.0, 3.0, 1.0, 0.0, 1.0, 4.0, 0.0, 0.0, 2.0]).unwrap()
    }

    fn assert_close(got: &[f64], want: &[f64]) {
        for (g, w) in got.iter().zip(want) {
            assert!((g - w).abs() < 1e-10, "got {got:?}, want {want:?}");
        }
    }

    #[test]
    fn upper_left_real() {
        let a = upper();
        let mut b = vec![5.0, 4.0, 2.0];
        trsm_vec(Side::Left, Uplo::Upper, Trans::NoTranspose, Diag::NonUnit, &2.0, &a, &mut b)
            .unwrap();
        assert_close(&b, &[4.0, 0.0, 2.0]);
    }

    #[test]
    fn upper_left_rank2() {
        let a = upper();
        let mut b = Matrix::from_column_slice(3, 2, &[5.0, 4.0, 2.0, 5.0, 4.0, 2.0]).unwrap();
        trsm(Side::Left, Uplo::Upper, Trans::NoTranspose, Diag::NonUnit, &2.0, &a, &mut b)
            .unwrap();
        assert_close(b.column(0), &[4.0, 0.0, 2.0]);
        assert_close(b.column(1), &[4.0, 0.0, 2.0]);
    }

    #[test]
    fn dual_and_mixed_operands() {
        let a = upper();
        let ad = a.map(|&v| D1::new(v, [1.0]));
        let alpha_d = D1::new(2.0, [3.0]);

        let mut b: Vec<D1> = [5.0, 4.0, 2.0].iter().map(|&v| D1::new(v, [7.0])).collect();
        trsm_vec(Side::Left, Uplo::Upper, Trans::NoTranspose, Diag::NonUnit, &alpha_d, &ad, &mut b)
            .unwrap();
        let values: Vec<f64> = b.iter().map(|d| d.val()).collect();
        assert_close(&values, &[4.0, 0.0, 2.0]);
        // Tangents are not touched.
        assert!(b.iter().all(|d| d.dx(0) == 7.0));

        let mut real_b = vec![5.0, 4.0, 2.0];
        trsm_vec(Side::Left, Uplo::Upper, Trans::NoTranspose, Diag::NonUnit, &2.0, &ad, &mut real_b)
            .unwrap();
        assert_close(&real_b, &[4.0, 0.0, 2.0]);

        let mut dual_b: Matrix<D1> = Matrix::from_fn(3, 1, |i, _| D1::constant([5.0, 4.0, 2.0][i]));
        trsm(Side::Left, Uplo::Upper, Trans::NoTranspose, Diag::NonUnit, &2.0, &a, &mut dual_b)
            .unwrap();
        assert_close(&dual_b.values().as_slice().to_vec(), &[4.0, 0.0, 2.0]);
    }

    #[test]
    fn transposed_and_lower_forms() {
        // A^T x = [2, 4, 8]
        let a = upper();
        let mut b = vec![2.0, 4.0, 8.0];
        trsm_vec(Side::Left, Uplo::Upper, Trans::Transpose, Diag::NonUnit, &1.0, &a, &mut b)
            .unwrap();
        assert_close(&b, &[1.0, 1.0, 1.5]);

        // Same system stored in the lower triangle; the upper one is garbage.
        let lower =
            Matrix::from_row_slice(3, 3, &[2.0, 99.0, 99.0, 3.0, 1.0, 99.0, 1.0, 4.0, 2.0])
                .unwrap();
        let mut b = vec![2.0, 4.0, 8.0];
        trsm_vec(Side::Left, Uplo::Lower, Trans::NoTranspose, Diag::NonUnit, &1.0, &lower, &mut b)
            .unwrap();
        assert_close(&b, &[1.0, 1.0, 1.5]);
    }

    #[test]
    fn right_side_row_vector() {
        // x A = [2, 4, 8]
        let a = upper();
        let mut b = vec![2.0, 4.0, 8.0];
        trsm_vec(Side::Right, Uplo::Upper, Trans::NoTranspose, Diag::NonUnit, &1.0, &a, &mut b)
            .unwrap();
        assert_close(&b, &[1.0, 1.0, 1.5]);

        let mut rows = Matrix::from_row_slice(2, 3, &[2.0, 4.0, 8.0, 4.0, 8.0, 16.0]).unwrap();
        trsm(Side::Right, Uplo::Upper, Trans::NoTranspose, Diag::NonUnit, &1.0, &a, &mut rows)
            .unwrap();
        assert_close(&[rows[(0, 2)], rows[(1, 2)]], &[1.5, 3.0]);
    }

    #[test]
    fn unit_diagonal_ignores_stored_diagonal() {
        let a = Matrix::from_row_slice(3, 3, &[0.0, 3.0, 1.0, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0])
            .unwrap();
        let mut b = vec![5.0, 4.0, 2.0];
        trsm_vec(Side::Left, Uplo::Upper, Trans::NoTranspose, Diag::Unit, &1.0, &a, &mut b)
            .unwrap();
        assert_close(&b, &[15.0, -4.0, 2.0]);
    }

    #[test]
    fn zero_pivot_is_singular() {
        let a = Matrix::from_row_slice(2, 2, &[1.0, 2.0, 0.0, 0.0]).unwrap();
        let mut b = vec![1.0, 1.0];
        let err = trsm_vec(
            Side::Left,
            Uplo::Upper,
            Trans::NoTranspose,
            Diag::NonUnit,
            &1.0,
            &a,
            &mut b,
        )
        .unwrap_err();
        assert_eq!(err, Error::SingularMatrix);
    }

    #[test]
    fn shape_errors() {
        let a: Matrix<f64> = Matrix::zeros(2, 3);
        let mut b = vec![1.0, 1.0];
        let err = trsm_vec(
            Side::Left,
            Uplo::Upper,
            Trans::NoTranspose,
            Diag::NonUnit,
            &1.0,
            &a,
            &mut b,
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::Core(fadkrylov_core::Error::NotSquare { rows: 2, cols: 3 })
        );

        let a = upper();
        assert!(
            trsm_vec(Side::Left, Uplo::Upper, Trans::NoTranspose, Diag::NonUnit, &1.0, &a, &mut b)
                .is_err()
        );
    }
}
