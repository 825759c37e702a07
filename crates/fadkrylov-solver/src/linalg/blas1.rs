//! Scalar-generic BLAS-1 routines.
//!
//! Every routine is generic over the scalar kind of each operand (`f64`,
//! [`Dual<N>`](fadkrylov_core::Dual), [`DynDual`](fadkrylov_core::DynDual))
//! and over the execution space. When every operand is `f64` the call goes
//! to nalgebra's dense vector kernels; otherwise it runs a generic reduction
//! or map on the given [`ExecSpace`]. The choice is made at monomorphization
//! time and does not change results for equivalent inputs.
//!
//! The plain names (`nrm2`, `dot`, ...) run on [`Device`]; the `_in` variants
//! take the space explicitly, which is how a solve confined to a [`Team`]
//! (fadkrylov_core::Team) reaches them.
//!
//! Tangent policy:
//! - `nrm2` and `dot` accumulate value parts only and return `f64`.
//! - [`dot_tangent`] propagates tangents for two vectors of one dual kind.
//! - `scal` and `axpy` propagate tangents whenever the output is dual.

use fadkrylov_core::{Device, ExecSpace, Matrix, Scalar};
use nalgebra::{DVectorView, DVectorViewMut};

use crate::error::{Error, Result};

#[inline]
fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::dimension(expected, actual))
    }
}

/// Euclidean norm of the value parts of `v`.
pub fn nrm2<S: Scalar>(v: &[S]) -> f64 {
    nrm2_in(&Device, v)
}

/// [`nrm2`] on an explicit execution space.
pub fn nrm2_in<E: ExecSpace, S: Scalar>(space: &E, v: &[S]) -> f64 {
    if !S::IS_DUAL {
        if let Some(re) = S::as_reals(v) {
            return DVectorView::from_slice(re, re.len()).norm();
        }
    }
    space
        .reduce_sum(v.len(), |i| {
            let x = v[i].value();
            x * x
        })
        .sqrt()
}

/// Inner product of the value parts of `v` and `w`.
///
/// Symmetric in its arguments for every combination of scalar kinds.
pub fn dot<A: Scalar, B: Scalar>(v: &[A], w: &[B]) -> Result<f64> {
    dot_in(&Device, v, w)
}

/// [`dot`] on an explicit execution space.
pub fn dot_in<E: ExecSpace, A: Scalar, B: Scalar>(space: &E, v: &[A], w: &[B]) -> Result<f64> {
    check_len(v.len(), w.len())?;
    if !(A::IS_DUAL || B::IS_DUAL) {
        if let (Some(a), Some(b)) = (A::as_reals(v), B::as_reals(w)) {
            let a = DVectorView::from_slice(a, a.len());
            let b = DVectorView::from_slice(b, b.len());
            return Ok(a.dot(&b));
        }
    }
    Ok(space.reduce_sum(v.len(), |i| v[i].value() * w[i].value()))
}

/// Inner product with tangent propagation.
///
/// Tangent `k` of the result is `sum(v_i * dw_i[k] + dv_i[k] * w_i)`.
/// Accumulation is sequential in index order.
pub fn dot_tangent<S: Scalar>(v: &[S], w: &[S]) -> Result<S> {
    check_len(v.len(), w.len())?;
    let mut acc = S::zero();
    for (vi, wi) in v.iter().zip(w) {
        acc.accumulate_product(vi, wi);
    }
    Ok(acc)
}

/// `y := alpha * x`.
pub fn scal<Y: Scalar, A: Scalar, X: Scalar>(y: &mut [Y], alpha: &A, x: &[X]) -> Result<()> {
    scal_in(&Device, y, alpha, x)
}

/// [`scal`] on an explicit execution space.
pub fn scal_in<E, Y, A, X>(space: &E, y: &mut [Y], alpha: &A, x: &[X]) -> Result<()>
where
    E: ExecSpace,
    Y: Scalar,
    A: Scalar,
    X: Scalar,
{
    check_len(y.len(), x.len())?;
    if !(Y::IS_DUAL || A::IS_DUAL || X::IS_DUAL) {
        if let (Some(ys), Some(a), Some(xs)) = (Y::as_reals_mut(y), alpha.as_real(), X::as_reals(x))
        {
            let n = ys.len();
            let mut yv = DVectorViewMut::from_slice(ys, n);
            yv.copy_from(&DVectorView::from_slice(xs, n));
            yv *= a;
            return Ok(());
        }
    }
    space.for_each_mut(y, |i, yi| *yi = Y::product_of(alpha, &x[i]));
    Ok(())
}

/// `y := alpha * y`.
///
/// The aliased form of [`scal`], used to normalize a vector where it lives.
pub fn scal_in_place<Y: Scalar, A: Scalar>(alpha: &A, y: &mut [Y]) {
    scal_in_place_in(&Device, alpha, y)
}

/// [`scal_in_place`] on an explicit execution space.
pub fn scal_in_place_in<E: ExecSpace, Y: Scalar, A: Scalar>(space: &E, alpha: &A, y: &mut [Y]) {
    if !(Y::IS_DUAL || A::IS_DUAL) {
        if let (Some(ys), Some(a)) = (Y::as_reals_mut(y), alpha.as_real()) {
            let n = ys.len();
            let mut yv = DVectorViewMut::from_slice(ys, n);
            yv *= a;
            return;
        }
    }
    space.for_each_mut(y, |_, yi| {
        let scaled = Y::product_of(alpha, &*yi);
        *yi = scaled;
    });
}

/// `y := y + alpha * x`.
pub fn axpy<Y: Scalar, A: Scalar, X: Scalar>(alpha: &A, x: &[X], y: &mut [Y]) -> Result<()> {
    axpy_in(&Device, alpha, x, y)
}

/// [`axpy`] on an explicit execution space.
pub fn axpy_in<E, Y, A, X>(space: &E, alpha: &A, x: &[X], y: &mut [Y]) -> Result<()>
where
    E: ExecSpace,
    Y: Scalar,
    A: Scalar,
    X: Scalar,
{
    check_len(y.len(), x.len())?;
    if !(Y::IS_DUAL || A::IS_DUAL || X::IS_DUAL) {
        if let (Some(ys), Some(a), Some(xs)) = (Y::as_reals_mut(y), alpha.as_real(), X::as_reals(x))
        {
            let n = ys.len();
            let mut yv = DVectorViewMut::from_slice(ys, n);
            yv.axpy(a, &DVectorView::from_slice(xs, n), 1.0);
            return Ok(());
        }
    }
    space.for_each_mut(y, |i, yi| yi.accumulate_product(alpha, &x[i]));
    Ok(())
}

/// Column-wise `y[:, j] := alpha[j] * x[:, j]`.
///
/// `alpha` must hold one coefficient per column of `x`.
pub fn scal_columns<Y: Scalar, A: Scalar, X: Scalar>(
    y: &mut Matrix<Y>,
    alpha: &[A],
    x: &Matrix<X>,
) -> Result<()> {
    scal_columns_in(&Device, y, alpha, x)
}

/// [`scal_columns`] on an explicit execution space.
pub fn scal_columns_in<E, Y, A, X>(
    space: &E,
    y: &mut Matrix<Y>,
    alpha: &[A],
    x: &Matrix<X>,
) -> Result<()>
where
    E: ExecSpace,
    Y: Scalar,
    A: Scalar,
    X: Scalar,
{
    y.check_same_shape(x)?;
    check_len(x.ncols(), alpha.len())?;
    for (j, a) in alpha.iter().enumerate() {
        scal_in(space, y.column_mut(j), a, x.column(j))?;
    }
    Ok(())
}

/// Column-wise `y[:, j] := y[:, j] + alpha[j] * x[:, j]`.
pub fn axpy_columns<Y: Scalar, A: Scalar, X: Scalar>(
    alpha: &[A],
    x: &Matrix<X>,
    y: &mut Matrix<Y>,
) -> Result<()> {
    axpy_columns_in(&Device, alpha, x, y)
}

/// [`axpy_columns`] on an explicit execution space.
pub fn axpy_columns_in<E, Y, A, X>(
    space: &E,
    alpha: &[A],
    x: &Matrix<X>,
    y: &mut Matrix<Y>,
) -> Result<()>
where
    E: ExecSpace,
    Y: Scalar,
    A: Scalar,
    X: Scalar,
{
    y.check_same_shape(x)?;
    check_len(x.ncols(), alpha.len())?;
    for (j, a) in alpha.iter().enumerate() {
        axpy_in(space, a, x.column(j), y.column_mut(j))?;
    }
    Ok(())
}
