//! Forward-mode dual number with a compile-time tangent count.

use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num_traits::{One, Zero};

use super::{Scalar, tangent};

/// A value with `N` tangent components.
///
/// `Dual<N>` is `Copy`; tangents live inline. `Dual<0>` behaves exactly like
/// an `f64` for value semantics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dual<const N: usize> {
    val: f64,
    dx: [f64; N],
}

impl<const N: usize> Dual<N> {
    /// Create a dual number from a value and its tangents.
    pub const fn new(val: f64, dx: [f64; N]) -> Self {
        Self { val, dx }
    }

    /// A constant: all tangents zero.
    pub const fn constant(val: f64) -> Self {
        Self { val, dx: [0.0; N] }
    }

    /// An independent variable seeded along direction `index`.
    ///
    /// # Panics
    /// Panics if `index >= N`.
    pub fn variable(val: f64, index: usize) -> Self {
        assert!(index < N, "seed index {index} out of range for {N} tangents");
        let mut dx = [0.0; N];
        dx[index] = 1.0;
        Self { val, dx }
    }

    /// The value part.
    #[inline]
    pub fn val(&self) -> f64 {
        self.val
    }

    /// Tangent component `i`.
    #[inline]
    pub fn dx(&self, i: usize) -> f64 {
        self.dx[i]
    }

    /// Mutable tangent component `i`.
    #[inline]
    pub fn dx_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.dx[i]
    }

    /// All tangent components.
    #[inline]
    pub fn tangents(&self) -> &[f64; N] {
        &self.dx
    }

    #[inline]
    fn map_dx(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            val: self.val,
            dx: self.dx.map(f),
        }
    }
}

impl<const N: usize> Default for Dual<N> {
    fn default() -> Self {
        Self::constant(0.0)
    }
}

impl<const N: usize> From<f64> for Dual<N> {
    fn from(val: f64) -> Self {
        Self::constant(val)
    }
}

impl<const N: usize> Scalar for Dual<N> {
    const IS_DUAL: bool = true;

    #[inline]
    fn from_real(value: f64) -> Self {
        Self::constant(value)
    }

    #[inline]
    fn value(&self) -> f64 {
        self.val
    }

    #[inline]
    fn value_mut(&mut self) -> &mut f64 {
        &mut self.val
    }

    #[inline]
    fn derivatives(&self) -> &[f64] {
        &self.dx
    }

    #[inline]
    fn chain(&self, value: f64, slope: f64) -> Self {
        Self {
            val: value,
            dx: self.dx.map(|d| slope * d),
        }
    }

    #[inline]
    fn product_of<A: Scalar, X: Scalar>(alpha: &A, x: &X) -> Self {
        let (av, xv) = (alpha.value(), x.value());
        Self {
            val: av * xv,
            dx: std::array::from_fn(|k| av * tangent(x, k) + tangent(alpha, k) * xv),
        }
    }

    #[inline]
    fn accumulate_product<A: Scalar, X: Scalar>(&mut self, alpha: &A, x: &X) {
        let (av, xv) = (alpha.value(), x.value());
        self.val += av * xv;
        for (k, d) in self.dx.iter_mut().enumerate() {
            *d += av * tangent(x, k) + tangent(alpha, k) * xv;
        }
    }
}

impl<const N: usize> Add for Dual<N> {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            val: self.val + rhs.val,
            dx: std::array::from_fn(|k| self.dx[k] + rhs.dx[k]),
        }
    }
}

impl<const N: usize> Sub for Dual<N> {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self {
            val: self.val - rhs.val,
            dx: std::array::from_fn(|k| self.dx[k] - rhs.dx[k]),
        }
    }
}

impl<const N: usize> Mul for Dual<N> {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self {
            val: self.val * rhs.val,
            dx: std::array::from_fn(|k| self.val * rhs.dx[k] + self.dx[k] * rhs.val),
        }
    }
}

impl<const N: usize> Div for Dual<N> {
    type Output = Self;

    #[inline]
    fn div(self, rhs: Self) -> Self {
        let q = self.val / rhs.val;
        Self {
            val: q,
            dx: std::array::from_fn(|k| (self.dx[k] - q * rhs.dx[k]) / rhs.val),
        }
    }
}

impl<const N: usize> Neg for Dual<N> {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self {
            val: -self.val,
            dx: self.dx.map(|d| -d),
        }
    }
}

impl<const N: usize> Add<f64> for Dual<N> {
    type Output = Self;

    #[inline]
    fn add(self, rhs: f64) -> Self {
        Self {
            val: self.val + rhs,
            dx: self.dx,
        }
    }
}

impl<const N: usize> Sub<f64> for Dual<N> {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: f64) -> Self {
        Self {
            val: self.val - rhs,
            dx: self.dx,
        }
    }
}

impl<const N: usize> Mul<f64> for Dual<N> {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self {
            val: self.val * rhs,
            dx: self.dx,
        }
        .map_dx(|d| d * rhs)
    }
}

impl<const N: usize> Div<f64> for Dual<N> {
    type Output = Self;

    #[inline]
    fn div(self, rhs: f64) -> Self {
        Self {
            val: self.val / rhs,
            dx: self.dx,
        }
        .map_dx(|d| d / rhs)
    }
}

impl<const N: usize> Add<Dual<N>> for f64 {
    type Output = Dual<N>;

    #[inline]
    fn add(self, rhs: Dual<N>) -> Dual<N> {
        rhs + self
    }
}

impl<const N: usize> Sub<Dual<N>> for f64 {
    type Output = Dual<N>;

    #[inline]
    fn sub(self, rhs: Dual<N>) -> Dual<N> {
        -rhs + self
    }
}

impl<const N: usize> Mul<Dual<N>> for f64 {
    type Output = Dual<N>;

    #[inline]
    fn mul(self, rhs: Dual<N>) -> Dual<N> {
        rhs * self
    }
}

impl<const N: usize> Div<Dual<N>> for f64 {
    type Output = Dual<N>;

    #[inline]
    fn div(self, rhs: Dual<N>) -> Dual<N> {
        Dual::constant(self) / rhs
    }
}

impl<const N: usize> AddAssign for Dual<N> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<const N: usize> SubAssign for Dual<N> {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<const N: usize> MulAssign for Dual<N> {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl<const N: usize> DivAssign for Dual<N> {
    #[inline]
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl<const N: usize> AddAssign<f64> for Dual<N> {
    #[inline]
    fn add_assign(&mut self, rhs: f64) {
        self.val += rhs;
    }
}

impl<const N: usize> MulAssign<f64> for Dual<N> {
    #[inline]
    fn mul_assign(&mut self, rhs: f64) {
        *self = *self * rhs;
    }
}

impl<const N: usize> Zero for Dual<N> {
    fn zero() -> Self {
        Self::constant(0.0)
    }

    fn is_zero(&self) -> bool {
        self.val == 0.0 && self.dx.iter().all(|&d| d == 0.0)
    }
}

impl<const N: usize> One for Dual<N> {
    fn one() -> Self {
        Self::constant(1.0)
    }
}
