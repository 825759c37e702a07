//! Problem callbacks consumed by the GMRES driver.
//!
//! The driver never sees a matrix. It asks a [`Problem`] for the residual at
//! the initial guess and for Jacobian-vector products along each new Krylov
//! direction. Two adapters cover the common cases:
//!
//! - [`LinearSystem`]: a [`LinearOperator`] plus a right-hand side
//! - [`ForwardJvp`]: a nonlinear [`Residual`] whose JVP comes from one
//!   forward-mode sweep on [`Dual<1>`] inputs

use fadkrylov_core::{Dual, Matrix, Scalar};

use crate::error::{Error, Result};

/// Residual and JVP callbacks for one system of size [`Problem::dim`].
pub trait Problem<S: Scalar>: Send + Sync {
    /// System dimension.
    fn dim(&self) -> usize;

    /// Write `b - A(x)` into `out`.
    fn compute_residual(&self, x: &[S], out: &mut [S]);

    /// Write `A(x) * q` into `out`.
    fn jvp(&self, x: &[S], q: &[S], out: &mut [S]);
}

/// Matrix-free linear operator `y = A * x`.
pub trait LinearOperator<S: Scalar>: Send + Sync {
    /// Operator dimension (square).
    fn dim(&self) -> usize;

    /// Apply the operator: `y = A * x`.
    fn apply(&self, x: &[S], y: &mut [S]);
}

/// Dense real operator backed by a [`Matrix`].
///
/// Applies to vectors of any scalar kind; tangents of `x` are carried into
/// `y`.
#[derive(Debug, Clone)]
pub struct DenseOperator {
    matrix: Matrix<f64>,
}

impl DenseOperator {
    /// Wrap a square matrix.
    pub fn new(matrix: Matrix<f64>) -> Result<Self> {
        let (rows, cols) = matrix.shape();
        if rows != cols {
            return Err(fadkrylov_core::Error::NotSquare { rows, cols }.into());
        }
        Ok(Self { matrix })
    }

    pub fn matrix(&self) -> &Matrix<f64> {
        &self.matrix
    }
}

impl<S: Scalar> LinearOperator<S> for DenseOperator {
    fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    fn apply(&self, x: &[S], y: &mut [S]) {
        let n = self.matrix.nrows();
        debug_assert_eq!(x.len(), n);
        debug_assert_eq!(y.len(), n);

        y.iter_mut().for_each(|yi| *yi = S::zero());
        // Column-major: accumulate A[:, j] * x[j]
        for (j, xj) in x.iter().enumerate() {
            for (yi, aij) in y.iter_mut().zip(self.matrix.column(j)) {
                yi.accumulate_product(aij, xj);
            }
        }
    }
}

/// The linear problem `A x = b`.
///
/// `compute_residual` is `b - A x` and `jvp` is `A q`, independent of `x`.
#[derive(Debug, Clone)]
pub struct LinearSystem<Op, S> {
    op: Op,
    rhs: Vec<S>,
}

impl<Op: LinearOperator<S>, S: Scalar> LinearSystem<Op, S> {
    /// Pair an operator with a right-hand side of matching length.
    pub fn new(op: Op, rhs: Vec<S>) -> Result<Self> {
        if op.dim() != rhs.len() {
            return Err(Error::dimension(op.dim(), rhs.len()));
        }
        Ok(Self { op, rhs })
    }

    pub fn operator(&self) -> &Op {
        &self.op
    }

    pub fn rhs(&self) -> &[S] {
        &self.rhs
    }
}

impl<Op: LinearOperator<S>, S: Scalar> Problem<S> for LinearSystem<Op, S> {
    fn dim(&self) -> usize {
        self.rhs.len()
    }

    fn compute_residual(&self, x: &[S], out: &mut [S]) {
        self.op.apply(x, out);
        for (o, b) in out.iter_mut().zip(&self.rhs) {
            *o = b.clone() - o.clone();
        }
    }

    fn jvp(&self, _x: &[S], q: &[S], out: &mut [S]) {
        self.op.apply(q, out);
    }
}

/// A nonlinear residual `F(u)` written once for every scalar kind.
///
/// Evaluating on dual inputs yields directional derivatives for free, which
/// is what [`ForwardJvp`] relies on.
pub trait Residual: Send + Sync {
    fn dim(&self) -> usize;

    /// Write `F(u)` into `out`.
    fn eval<T: Scalar>(&self, u: &[T], out: &mut [T]);
}

/// Newton-Krylov adapter: solves `J(x) dx = -F(x)` without forming `J`.
///
/// `compute_residual` writes `-F(x)`. `jvp(x, q)` seeds `u_i = x_i + q_i e`
/// on [`Dual<1>`], evaluates `F` once and reads the tangent.
///
/// The driver adds its correction to the guess it was given, so one
/// [`Gmres::solve`](crate::Gmres::solve) from `x` is one inexact Newton step
/// `x <- x + dx`.
#[derive(Debug, Clone)]
pub struct ForwardJvp<F> {
    residual: F,
}

impl<F: Residual> ForwardJvp<F> {
    pub fn new(residual: F) -> Self {
        Self { residual }
    }

    pub fn residual(&self) -> &F {
        &self.residual
    }

    pub fn into_inner(self) -> F {
        self.residual
    }
}

impl<F: Residual> Problem<f64> for ForwardJvp<F> {
    fn dim(&self) -> usize {
        self.residual.dim()
    }

    fn compute_residual(&self, x: &[f64], out: &mut [f64]) {
        self.residual.eval(x, out);
        out.iter_mut().for_each(|o| *o = -*o);
    }

    fn jvp(&self, x: &[f64], q: &[f64], out: &mut [f64]) {
        let seeded: Vec<Dual<1>> = x
            .iter()
            .zip(q)
            .map(|(&xi, &qi)| Dual::new(xi, [qi]))
            .collect();
        let mut f = vec![Dual::<1>::default(); seeded.len()];
        self.residual.eval(&seeded, &mut f);
        for (o, fi) in out.iter_mut().zip(&f) {
            *o = fi.dx(0);
        }
    }
}
