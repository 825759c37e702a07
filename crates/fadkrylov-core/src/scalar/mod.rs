//! Scalar abstraction shared by the linear-algebra layer.
//!
//! Three scalar kinds implement [`Scalar`]:
//!
//! - `f64`: a plain real, the degenerate zero-derivative case
//! - [`Dual<N>`]: a value with `N` tangent components fixed at compile time
//! - [`DynDual`]: a value with a tangent count chosen at runtime
//!
//! Kernels branch on [`Scalar::IS_DUAL`] and [`Scalar::as_reals`]. Both are
//! resolved when the kernel is monomorphized, so a real-only call never pays
//! for the dual path.

mod dual;
mod dyn_dual;

pub use dual::Dual;
pub use dyn_dual::DynDual;

use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_traits::{One, Zero};

/// A real or dual scalar usable as an element of a vector view.
///
/// Arithmetic between two values of the same kind, and between a value and an
/// `f64`, propagates tangents by the chain rule. Mixed-kind products go through
/// [`Scalar::product_of`] and [`Scalar::accumulate_product`], which read the
/// tangents of both operands through [`Scalar::derivatives`].
///
/// [`Zero`] and [`One`] give constants with no tangent contribution.
pub trait Scalar:
    Clone
    + Debug
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Add<f64, Output = Self>
    + Sub<f64, Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
    + Zero
    + One
{
    /// Whether this kind carries tangent components.
    const IS_DUAL: bool;

    /// Embed a real value with zero tangents.
    fn from_real(value: f64) -> Self;

    /// The value part.
    fn value(&self) -> f64;

    /// Mutable access to the value part; tangents are left as they are.
    fn value_mut(&mut self) -> &mut f64;

    /// Tangent components. Empty for `f64`.
    fn derivatives(&self) -> &[f64];

    /// Build `f(self)` from `f(v)` and `f'(v)`, scaling every tangent by the slope.
    fn chain(&self, value: f64, slope: f64) -> Self;

    /// `alpha * x` expressed in this scalar kind.
    ///
    /// When `Self` is dual, tangent `k` is
    /// `alpha.value * dx_k + dalpha_k * x.value`; tangents missing from an
    /// operand count as zero. When `Self` is real only the values are used.
    fn product_of<A: Scalar, X: Scalar>(alpha: &A, x: &X) -> Self;

    /// `self += alpha * x` with the same tangent rule as [`Scalar::product_of`].
    fn accumulate_product<A: Scalar, X: Scalar>(&mut self, alpha: &A, x: &X);

    /// View a slice as plain reals when this kind is `f64`.
    fn as_reals(values: &[Self]) -> Option<&[f64]> {
        let _ = values;
        None
    }

    /// Mutable counterpart of [`Scalar::as_reals`].
    fn as_reals_mut(values: &mut [Self]) -> Option<&mut [f64]> {
        let _ = values;
        None
    }

    /// The scalar as a plain real when this kind is `f64`.
    fn as_real(&self) -> Option<f64> {
        None
    }

    /// Number of tangent components.
    fn derivative_count(&self) -> usize {
        self.derivatives().len()
    }

    /// At zero the slope is taken as zero, so tangents stay finite.
    fn sqrt(&self) -> Self {
        let s = self.value().sqrt();
        let slope = if s == 0.0 { 0.0 } else { 0.5 / s };
        self.chain(s, slope)
    }

    fn sin(&self) -> Self {
        let v = self.value();
        self.chain(v.sin(), v.cos())
    }

    fn cos(&self) -> Self {
        let v = self.value();
        self.chain(v.cos(), -v.sin())
    }

    fn exp(&self) -> Self {
        let e = self.value().exp();
        self.chain(e, e)
    }

    fn ln(&self) -> Self {
        let v = self.value();
        self.chain(v.ln(), 1.0 / v)
    }

    fn powi(&self, n: i32) -> Self {
        if n == 0 {
            return Self::one();
        }
        let v = self.value();
        self.chain(v.powi(n), f64::from(n) * v.powi(n - 1))
    }

    fn abs(&self) -> Self {
        let v = self.value();
        self.chain(v.abs(), if v < 0.0 { -1.0 } else { 1.0 })
    }
}

impl Scalar for f64 {
    const IS_DUAL: bool = false;

    #[inline]
    fn from_real(value: f64) -> Self {
        value
    }

    #[inline]
    fn value(&self) -> f64 {
        *self
    }

    #[inline]
    fn value_mut(&mut self) -> &mut f64 {
        self
    }

    #[inline]
    fn derivatives(&self) -> &[f64] {
        &[]
    }

    #[inline]
    fn chain(&self, value: f64, _slope: f64) -> Self {
        value
    }

    #[inline]
    fn product_of<A: Scalar, X: Scalar>(alpha: &A, x: &X) -> Self {
        alpha.value() * x.value()
    }

    #[inline]
    fn accumulate_product<A: Scalar, X: Scalar>(&mut self, alpha: &A, x: &X) {
        *self += alpha.value() * x.value();
    }

    #[inline]
    fn as_reals(values: &[Self]) -> Option<&[f64]> {
        Some(values)
    }

    #[inline]
    fn as_reals_mut(values: &mut [Self]) -> Option<&mut [f64]> {
        Some(values)
    }

    #[inline]
    fn as_real(&self) -> Option<f64> {
        Some(*self)
    }
}

/// Tangent `k` of `s`, zero when `s` has fewer components.
#[inline]
pub(crate) fn tangent<S: Scalar>(s: &S, k: usize) -> f64 {
    s.derivatives().get(k).copied().unwrap_or(0.0)
}

/// Project a slice of scalars onto their value parts.
pub fn values_of<S: Scalar>(values: &[S]) -> Vec<f64> {
    values.iter().map(S::value).collect()
}
