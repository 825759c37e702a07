//! GMRES driver: Krylov state plus the Arnoldi/Givens iteration.

use fadkrylov_core::{Device, ExecSpace, Matrix, Scalar};

use super::helpers::{apply_rotation, givens_rotation};
use super::{BREAKDOWN_EPS, GmresConfig, GmresOutcome, GmresStatus};
use crate::error::{Error, Result};
use crate::linalg::{
    Diag, Side, Trans, Uplo, axpy_in, dot_in, nrm2_in, scal_in, scal_in_place_in, trsm_vec,
};
use crate::problem::Problem;

/// GMRES solver with preallocated Krylov state.
///
/// The basis `Q` holds scalars of kind `S`; the Hessenberg matrix, rotations
/// and least-squares right-hand side are real. All BLAS-1 work runs on the
/// execution space `E`. State is reused across calls and reset at the start
/// of every [`Gmres::solve`].
#[derive(Debug, Clone)]
pub struct Gmres<S: Scalar, E: ExecSpace = Device> {
    config: GmresConfig,
    space: E,
    /// Orthonormal basis, `N x (max_iter + 1)`.
    q: Matrix<S>,
    /// Hessenberg matrix, `(max_iter + 1) x max_iter`.
    h: Matrix<f64>,
    cs: Vec<f64>,
    sn: Vec<f64>,
    /// Rotated `r_norm * e_1`.
    beta: Vec<f64>,
    /// Candidate Arnoldi vector.
    work: Vec<S>,
}

impl<S: Scalar> Gmres<S, Device> {
    /// Driver running on the whole device.
    pub fn new(config: GmresConfig) -> Result<Self> {
        Self::with_space(config, Device)
    }
}

impl<S: Scalar, E: ExecSpace> Gmres<S, E> {
    /// Driver running its kernels on `space`.
    pub fn with_space(config: GmresConfig, space: E) -> Result<Self> {
        config.validate()?;
        let n = config.problem_size;
        let m = config.max_iter;
        Ok(Self {
            q: Matrix::zeros(n, m + 1),
            h: Matrix::zeros(m + 1, m),
            cs: vec![0.0; m],
            sn: vec![0.0; m],
            beta: vec![0.0; m + 1],
            work: vec![S::zero(); n],
            config,
            space,
        })
    }

    pub fn config(&self) -> &GmresConfig {
        &self.config
    }

    pub fn space(&self) -> &E {
        &self.space
    }

    /// Krylov basis from the last solve.
    pub fn basis(&self) -> &Matrix<S> {
        &self.q
    }

    /// Rotated (upper triangular) Hessenberg matrix from the last solve.
    pub fn hessenberg(&self) -> &Matrix<f64> {
        &self.h
    }

    /// Run one Krylov cycle from `x`, updating `x` in place.
    ///
    /// Breakdown and non-convergence are reported through the outcome's
    /// status, not as errors.
    ///
    /// # Errors
    /// [`fadkrylov_core::Error::DimensionMismatch`] if `problem` or `x` does
    /// not match `problem_size`.
    pub fn solve<P>(&mut self, problem: &P, x: &mut [S]) -> Result<GmresOutcome>
    where
        P: Problem<S> + ?Sized,
    {
        let n = self.config.problem_size;
        if problem.dim() != n {
            return Err(Error::dimension(n, problem.dim()));
        }
        if x.len() != n {
            return Err(Error::dimension(n, x.len()));
        }
        let max_iter = self.config.max_iter;
        let tol = self.config.tol;

        log::debug!(
            "GMRES solve: n={}, max_iter={}, tol={:.1e}, space={}",
            n,
            max_iter,
            tol,
            self.space.name()
        );

        self.reset();

        problem.compute_residual(x, self.q.column_mut(0));
        let r_norm = nrm2_in(&self.space, self.q.column(0));
        let b_norm = r_norm;

        if b_norm == 0.0 {
            log::debug!("GMRES: initial residual is zero");
            return Ok(GmresOutcome {
                status: GmresStatus::Converged,
                iterations: 0,
                error: 0.0,
                initial_residual: 0.0,
                cycles: 1,
                tol,
            });
        }

        scal_in_place_in(&self.space, &(1.0 / r_norm), self.q.column_mut(0));
        self.beta[0] = r_norm;

        let mut k = 0;
        let (mut status, error) = loop {
            let breakdown = self.arnoldi_step(problem, x, k)?;
            self.apply_givens(k);
            let error = self.update_residual(k, b_norm);
            log::trace!("GMRES iter {}: error = {:.3e}", k + 1, error);

            if breakdown {
                break (GmresStatus::Breakdown, error);
            }
            if error < tol {
                break (GmresStatus::Converged, error);
            }
            if k + 1 == max_iter {
                break (GmresStatus::MaxIterReached, error);
            }
            k += 1;
        };

        let kept = self.reconstruct(k, x)?;
        // Dropped columns contribute nothing to `x`, so their rotated
        // right-hand side stays in the residual.
        let error = if kept <= k {
            self.beta[kept..=k + 1]
                .iter()
                .map(|b| b * b)
                .sum::<f64>()
                .sqrt()
                / b_norm
        } else {
            error
        };
        if status == GmresStatus::Converged && error >= tol {
            status = GmresStatus::Breakdown;
        }

        if status == GmresStatus::Breakdown && error >= tol {
            log::warn!(
                "GMRES breakdown at iteration {} with error {:.3e} above tol {:.1e}",
                k + 1,
                error,
                tol
            );
        }

        log::debug!(
            "GMRES finished: {:?} after {} iterations, error = {:.3e}",
            status,
            k + 1,
            error
        );

        Ok(GmresOutcome {
            status,
            iterations: k + 1,
            error,
            initial_residual: r_norm,
            cycles: 1,
            tol,
        })
    }

    /// Restarted GMRES: run up to `max_cycles` cycles, each starting from the
    /// iterate the previous one produced.
    ///
    /// Stops when the residual relative to the very first one falls below
    /// `tol`, or on a breakdown that did not reach it. The returned error is
    /// relative to the first cycle's initial residual and `iterations` is
    /// summed over cycles.
    pub fn solve_restarted<P>(
        &mut self,
        problem: &P,
        x: &mut [S],
        max_cycles: usize,
    ) -> Result<GmresOutcome>
    where
        P: Problem<S> + ?Sized,
    {
        if max_cycles == 0 {
            return Err(Error::InvalidConfig("max_cycles must be positive".into()));
        }
        let tol = self.config.tol;
        let mut reference = None;
        let mut iterations = 0;

        let mut cycle = 0;
        loop {
            cycle += 1;
            let outcome = self.solve(problem, x)?;
            iterations += outcome.iterations;
            let r0 = *reference.get_or_insert(outcome.initial_residual);
            let error = if r0 > 0.0 {
                outcome.error * outcome.initial_residual / r0
            } else {
                0.0
            };

            let status = if error < tol {
                Some(GmresStatus::Converged)
            } else if outcome.status == GmresStatus::Breakdown {
                Some(GmresStatus::Breakdown)
            } else if cycle == max_cycles {
                Some(GmresStatus::MaxIterReached)
            } else {
                None
            };

            if let Some(status) = status {
                log::debug!(
                    "Restarted GMRES: {:?} after {} cycles, {} iterations",
                    status,
                    cycle,
                    iterations
                );
                return Ok(GmresOutcome {
                    status,
                    iterations,
                    error,
                    initial_residual: r0,
                    cycles: cycle,
                    tol,
                });
            }
            log::trace!("Restart cycle {}: error = {:.3e}", cycle, error);
        }
    }

    fn reset(&mut self) {
        self.q.fill(S::zero());
        self.h.fill(0.0);
        self.cs.fill(0.0);
        self.sn.fill(0.0);
        self.beta.fill(0.0);
    }

    /// Extend the basis by one vector. Returns `true` on breakdown, in which
    /// case `Q[:, k+1]` is left unset.
    fn arnoldi_step<P>(&mut self, problem: &P, x: &[S], k: usize) -> Result<bool>
    where
        P: Problem<S> + ?Sized,
    {
        let space = &self.space;
        let q = &mut self.q;
        let h = &mut self.h;
        let work = self.work.as_mut_slice();

        problem.jvp(x, q.column(k), work);

        // Modified Gram-Schmidt
        for j in 0..=k {
            let hjk = dot_in(space, q.column(j), work)?;
            h[(j, k)] = hjk;
            axpy_in(space, &(-hjk), q.column(j), work)?;
        }

        let w_norm = nrm2_in(space, work);
        h[(k + 1, k)] = w_norm;
        if w_norm <= BREAKDOWN_EPS {
            return Ok(true);
        }

        scal_in(space, q.column_mut(k + 1), &(1.0 / w_norm), work)?;
        Ok(false)
    }

    /// Apply the previous rotations to column `k`, then zero `H[k+1, k]`.
    fn apply_givens(&mut self, k: usize) {
        let h = &mut self.h;
        for i in 0..k {
            let (a, b) = apply_rotation(self.cs[i], self.sn[i], h[(i, k)], h[(i + 1, k)]);
            h[(i, k)] = a;
            h[(i + 1, k)] = b;
        }

        let (c, s) = givens_rotation(h[(k, k)], h[(k + 1, k)]);
        self.cs[k] = c;
        self.sn[k] = s;
        h[(k, k)] = c * h[(k, k)] + s * h[(k + 1, k)];
        h[(k + 1, k)] = 0.0;
    }

    /// Rotate `beta` and return the relative residual estimate.
    fn update_residual(&mut self, k: usize, b_norm: f64) -> f64 {
        let (c, s) = (self.cs[k], self.sn[k]);
        self.beta[k + 1] = -s * self.beta[k];
        self.beta[k] *= c;
        self.beta[k + 1].abs() / b_norm
    }

    /// Solve the leading triangle and add `Q[:, 0..m] * y` to `x`.
    ///
    /// Trailing columns whose pivot is negligible next to the largest one are
    /// left out. Returns the number `m` of columns kept.
    fn reconstruct(&self, k: usize, x: &mut [S]) -> Result<usize> {
        let scale = (0..=k)
            .map(|i| self.h[(i, i)].abs())
            .fold(0.0, f64::max);
        let mut m = k + 1;
        // A stagnating breakdown leaves a vanishing pivot in the last column.
        while m > 0 && self.h[(m - 1, m - 1)].abs() <= f64::EPSILON * scale {
            m -= 1;
        }
        if m == 0 {
            return Ok(0);
        }

        let upper = Matrix::from_fn(m, m, |i, j| self.h[(i, j)]);
        let mut y = self.beta[..m].to_vec();
        trsm_vec(
            Side::Left,
            Uplo::Upper,
            Trans::NoTranspose,
            Diag::NonUnit,
            &1.0,
            &upper,
            &mut y,
        )?;

        for (j, yj) in y.iter().enumerate() {
            axpy_in(&self.space, yj, self.q.column(j), x)?;
        }
        Ok(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{DenseOperator, LinearOperator, LinearSystem};
    use fadkrylov_core::{Dual, Team};

    /// Diagonal operator for testing.
    struct DiagOp(Vec<f64>);

    impl<S: Scalar> LinearOperator<S> for DiagOp {
        fn dim(&self) -> usize {
            self.0.len()
        }

        fn apply(&self, x: &[S], y: &mut [S]) {
            for ((yi, xi), d) in y.iter_mut().zip(x).zip(&self.0) {
                *yi = xi.clone() * *d;
            }
        }
    }

    fn diag_system(diag: Vec<f64>, b: Vec<f64>) -> LinearSystem<DiagOp, f64> {
        LinearSystem::new(DiagOp(diag), b).unwrap()
    }

    #[test]
    fn gmres_real_diagonal() {
        let system = diag_system(vec![1.0, 2.0, 3.0, 4.0], vec![1.0, 4.0, 9.0, 16.0]);
        let mut gmres = Gmres::new(GmresConfig::for_size(4)).unwrap();
        let mut x = vec![0.0; 4];
        let outcome = gmres.solve(&system, &mut x).unwrap();

        assert!(outcome.is_converged(), "{outcome:?}");
        for (i, xi) in x.iter().enumerate() {
            let expected = (i + 1) as f64;
            assert!((xi - expected).abs() < 1e-8, "x[{i}] = {xi}, expected {expected}");
        }
    }

    #[test]
    fn gmres_real_zero_rhs() {
        let system = diag_system(vec![1.0, 2.0, 3.0], vec![0.0; 3]);
        let mut gmres = Gmres::new(GmresConfig::for_size(3)).unwrap();
        let mut x = vec![0.0; 3];
        let outcome = gmres.solve(&system, &mut x).unwrap();

        assert_eq!(outcome.status, GmresStatus::Converged);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(x, vec![0.0; 3]);
    }

    #[test]
    fn gmres_exact_initial_guess_is_untouched() {
        let system = diag_system(vec![2.0, 2.0], vec![2.0, 4.0]);
        let mut gmres = Gmres::new(GmresConfig::for_size(2)).unwrap();
        let mut x = vec![1.0, 2.0];
        let outcome = gmres.solve(&system, &mut x).unwrap();
        assert_eq!(outcome.iterations, 0);
        assert_eq!(x, vec![1.0, 2.0]);
    }

    #[test]
    fn gmres_identity_is_lucky_breakdown() {
        let system = diag_system(vec![1.0; 5], vec![1.0, -2.0, 3.0, 0.5, 4.0]);
        let mut gmres = Gmres::new(GmresConfig::for_size(5)).unwrap();
        let mut x = vec![0.0; 5];
        let outcome = gmres.solve(&system, &mut x).unwrap();

        assert_eq!(outcome.status, GmresStatus::Breakdown);
        assert_eq!(outcome.iterations, 1);
        assert!(outcome.is_lucky_breakdown());
        assert!((x[1] + 2.0).abs() < 1e-12);
    }

    #[test]
    fn gmres_singular_operator_stagnates() {
        // b lies in the null space, so the first Krylov direction is lost
        let system = diag_system(vec![0.0, 1.0], vec![1.0, 0.0]);
        let mut gmres = Gmres::new(GmresConfig::for_size(2)).unwrap();
        let mut x = vec![0.0; 2];
        let outcome = gmres.solve(&system, &mut x).unwrap();

        assert_eq!(outcome.status, GmresStatus::Breakdown);
        assert_eq!(outcome.iterations, 1);
        assert!(!outcome.is_converged());
        assert!(!outcome.is_lucky_breakdown());
        assert!((outcome.error - 1.0).abs() < 1e-14);
        assert_eq!(x, vec![0.0, 0.0]);

        let mut x = vec![0.0; 2];
        let restarted = gmres.solve_restarted(&system, &mut x, 5).unwrap();
        assert_eq!(restarted.status, GmresStatus::Breakdown);
        assert_eq!(restarted.cycles, 1);
        assert!((restarted.error - 1.0).abs() < 1e-14);
    }

    #[test]
    fn gmres_small_scale_operator_solves() {
        let system = diag_system(vec![1e-13, 1e-13], vec![1.0, 0.0]);
        let mut gmres = Gmres::new(GmresConfig::for_size(2)).unwrap();
        let mut x = vec![0.0; 2];
        let outcome = gmres.solve(&system, &mut x).unwrap();

        assert!(outcome.is_converged(), "{outcome:?}");
        assert!((x[0] - 1e13).abs() / 1e13 < 1e-12, "x[0] = {}", x[0]);
        assert_eq!(x[1], 0.0);

        let mut r = vec![0.0; 2];
        system.compute_residual(&x, &mut r);
        assert!(crate::linalg::nrm2(&r) < 1e-8);
    }

    #[test]
    fn gmres_max_iter_reached() {
        let diag: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let system = diag_system(diag, vec![1.0; 20]);
        let config = GmresConfig::for_size(20).with_max_iter(3);
        let mut gmres = Gmres::new(config).unwrap();
        let mut x = vec![0.0; 20];
        let outcome = gmres.solve(&system, &mut x).unwrap();

        assert_eq!(outcome.status, GmresStatus::MaxIterReached);
        assert_eq!(outcome.iterations, 3);
        assert!(outcome.error < 1.0);
        assert!(!outcome.is_converged());
    }

    #[test]
    fn gmres_error_estimate_matches_true_residual() {
        let a = Matrix::from_fn(6, 6, |i, j| {
            if i == j {
                4.0
            } else if i.abs_diff(j) == 1 {
                -1.0
            } else {
                0.0
            }
        });
        let system = LinearSystem::new(DenseOperator::new(a).unwrap(), vec![1.0; 6]).unwrap();
        let mut gmres = Gmres::new(GmresConfig::for_size(6).with_max_iter(3)).unwrap();
        let mut x = vec![0.0; 6];
        let outcome = gmres.solve(&system, &mut x).unwrap();

        let mut r = vec![0.0; 6];
        system.compute_residual(&x, &mut r);
        let true_error = crate::linalg::nrm2(&r) / outcome.initial_residual;
        assert!((true_error - outcome.error).abs() < 1e-10);
    }

    #[test]
    fn gmres_restarted_converges_across_cycles() {
        let diag: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let system = diag_system(diag, vec![1.0; 20]);
        let config = GmresConfig::for_size(20).with_max_iter(4);
        let mut gmres = Gmres::new(config).unwrap();
        let mut x = vec![0.0; 20];
        let outcome = gmres.solve_restarted(&system, &mut x, 200).unwrap();

        assert_eq!(outcome.status, GmresStatus::Converged);
        assert!(outcome.cycles > 1);
        assert!(outcome.iterations > 4);
        for (i, xi) in x.iter().enumerate() {
            assert!((xi - 1.0 / (i + 1) as f64).abs() < 1e-6);
        }
    }

    #[test]
    fn gmres_restarted_rejects_zero_cycles() {
        let system = diag_system(vec![1.0], vec![1.0]);
        let mut gmres = Gmres::new(GmresConfig::for_size(1)).unwrap();
        let mut x = vec![0.0];
        assert!(matches!(
            gmres.solve_restarted(&system, &mut x, 0),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn gmres_rejects_dimension_mismatch() {
        let system = diag_system(vec![1.0; 3], vec![1.0; 3]);
        let mut gmres = Gmres::new(GmresConfig::for_size(4)).unwrap();
        let mut x = vec![0.0; 4];
        assert!(gmres.solve(&system, &mut x).is_err());

        let mut gmres = Gmres::new(GmresConfig::for_size(3)).unwrap();
        let mut short = vec![0.0; 2];
        assert!(gmres.solve(&system, &mut short).is_err());
    }

    #[test]
    fn gmres_dual_values_match_real() {
        let diag = vec![3.0, 1.0, 4.0, 1.5, 5.0];
        let b = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let real = diag_system(diag.clone(), b.clone());
        let dual: LinearSystem<DiagOp, Dual<1>> = LinearSystem::new(
            DiagOp(diag),
            b.iter().map(|&v| Dual::constant(v)).collect(),
        )
        .unwrap();

        let mut x = vec![0.0; 5];
        let mut xd = vec![Dual::<1>::default(); 5];
        let real_out = Gmres::new(GmresConfig::for_size(5))
            .unwrap()
            .solve(&real, &mut x)
            .unwrap();
        let dual_out = Gmres::new(GmresConfig::for_size(5))
            .unwrap()
            .solve(&dual, &mut xd)
            .unwrap();

        assert_eq!(real_out.iterations, dual_out.iterations);
        for (xi, di) in x.iter().zip(&xd) {
            assert!((xi - di.val()).abs() < 1e-12);
        }
    }

    #[test]
    fn gmres_on_team_matches_device() {
        let diag: Vec<f64> = (1..=8).map(|i| 1.0 + 0.25 * i as f64).collect();
        let system = diag_system(diag, vec![1.0; 8]);
        let config = GmresConfig::for_size(8);

        let mut x_dev = vec![0.0; 8];
        let mut x_team = vec![0.0; 8];
        let dev = Gmres::new(config.clone())
            .unwrap()
            .solve(&system, &mut x_dev)
            .unwrap();
        let team = Gmres::with_space(config, Team::new(0, 1))
            .unwrap()
            .solve(&system, &mut x_team)
            .unwrap();

        assert_eq!(dev, team);
        assert_eq!(x_dev, x_team);
    }

    #[test]
    fn gmres_basis_is_orthonormal() {
        let diag: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        let system = diag_system(diag, vec![1.0; 10]);
        let mut gmres = Gmres::new(GmresConfig::for_size(10).with_max_iter(5)).unwrap();
        let mut x = vec![0.0; 10];
        gmres.solve(&system, &mut x).unwrap();

        let q = gmres.basis();
        for i in 0..=5 {
            for j in 0..=5 {
                let d = crate::linalg::dot(q.column(i), q.column(j)).unwrap();
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((d - expected).abs() < 1e-10, "Q[{i}].Q[{j}] = {d}");
            }
        }
        // Rotated Hessenberg is upper triangular
        let h = gmres.hessenberg();
        for k in 0..5 {
            assert_eq!(h[(k + 1, k)], 0.0);
        }
    }
}
