//! Forward-mode dual number with a runtime tangent count.

use std::ops::{Add, Div, Mul, Neg, Sub};

use num_traits::{One, Zero};

use super::{Scalar, tangent};

/// A value with a dynamically sized set of tangents.
///
/// A missing component counts as zero, so a constant (no tangents) combines
/// with a value of any tangent count and the result takes the longer length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DynDual {
    val: f64,
    dx: Vec<f64>,
}

impl DynDual {
    /// Create from a value and its tangents.
    pub fn new(val: f64, dx: Vec<f64>) -> Self {
        Self { val, dx }
    }

    /// A constant with no tangents.
    pub fn constant(val: f64) -> Self {
        Self { val, dx: Vec::new() }
    }

    /// An independent variable: `count` tangents, seeded along `index`.
    ///
    /// # Panics
    /// Panics if `index >= count`.
    pub fn variable(val: f64, count: usize, index: usize) -> Self {
        assert!(index < count, "seed index {index} out of range for {count} tangents");
        let mut dx = vec![0.0; count];
        dx[index] = 1.0;
        Self { val, dx }
    }

    #[inline]
    pub fn val(&self) -> f64 {
        self.val
    }

    /// Tangent component `i`, zero past the stored length.
    #[inline]
    pub fn dx(&self, i: usize) -> f64 {
        self.dx.get(i).copied().unwrap_or(0.0)
    }

    /// Mutable tangent component `i`, growing the tangent vector if needed.
    pub fn dx_mut(&mut self, i: usize) -> &mut f64 {
        if i >= self.dx.len() {
            self.dx.resize(i + 1, 0.0);
        }
        &mut self.dx[i]
    }

    fn zip_with(&self, rhs: &Self, f: impl Fn(f64, f64) -> f64) -> Vec<f64> {
        let len = self.dx.len().max(rhs.dx.len());
        (0..len).map(|k| f(self.dx(k), rhs.dx(k))).collect()
    }
}

impl From<f64> for DynDual {
    fn from(val: f64) -> Self {
        Self::constant(val)
    }
}

impl Scalar for DynDual {
    const IS_DUAL: bool = true;

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

    fn chain(&self, value: f64, slope: f64) -> Self {
        Self {
            val: value,
            dx: self.dx.iter().map(|d| slope * d).collect(),
        }
    }

    fn product_of<A: Scalar, X: Scalar>(alpha: &A, x: &X) -> Self {
        let (av, xv) = (alpha.value(), x.value());
        let len = alpha.derivative_count().max(x.derivative_count());
        Self {
            val: av * xv,
            dx: (0..len)
                .map(|k| av * tangent(x, k) + tangent(alpha, k) * xv)
                .collect(),
        }
    }

    fn accumulate_product<A: Scalar, X: Scalar>(&mut self, alpha: &A, x: &X) {
        let (av, xv) = (alpha.value(), x.value());
        let len = alpha.derivative_count().max(x.derivative_count());
        if len > self.dx.len() {
            self.dx.resize(len, 0.0);
        }
        self.val += av * xv;
        for (k, d) in self.dx.iter_mut().enumerate().take(len) {
            *d += av * tangent(x, k) + tangent(alpha, k) * xv;
        }
    }
}

impl Add for DynDual {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            val: self.val + rhs.val,
            dx: self.zip_with(&rhs, |a, b| a + b),
        }
    }
}

impl Sub for DynDual {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            val: self.val - rhs.val,
            dx: self.zip_with(&rhs, |a, b| a - b),
        }
    }
}

impl Mul for DynDual {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let (u, v) = (self.val, rhs.val);
        Self {
            val: u * v,
            dx: self.zip_with(&rhs, |du, dv| u * dv + du * v),
        }
    }
}

impl Div for DynDual {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        let q = self.val / rhs.val;
        let v = rhs.val;
        Self {
            val: q,
            dx: self.zip_with(&rhs, |du, dv| (du - q * dv) / v),
        }
    }
}

impl Neg for DynDual {
    type Output = Self;

    fn neg(mut self) -> Self {
        self.val = -self.val;
        self.dx.iter_mut().for_each(|d| *d = -*d);
        self
    }
}

impl Add<f64> for DynDual {
    type Output = Self;

    fn add(mut self, rhs: f64) -> Self {
        self.val += rhs;
        self
    }
}

impl Sub<f64> for DynDual {
    type Output = Self;

    fn sub(mut self, rhs: f64) -> Self {
        self.val -= rhs;
        self
    }
}

impl Mul<f64> for DynDual {
    type Output = Self;

    fn mul(mut self, rhs: f64) -> Self {
        self.val *= rhs;
        self.dx.iter_mut().for_each(|d| *d *= rhs);
        self
    }
}

impl Div<f64> for DynDual {
    type Output = Self;

    fn div(mut self, rhs: f64) -> Self {
        self.val /= rhs;
        self.dx.iter_mut().for_each(|d| *d /= rhs);
        self
    }
}

impl Mul<DynDual> for f64 {
    type Output = DynDual;

    fn mul(self, rhs: DynDual) -> DynDual {
        rhs * self
    }
}

impl Zero for DynDual {
    fn zero() -> Self {
        Self::constant(0.0)
    }

    fn is_zero(&self) -> bool {
        self.val == 0.0 && self.dx.iter().all(|&d| d == 0.0)
    }
}

impl One for DynDual {
    fn one() -> Self {
        Self::constant(1.0)
    }
}
