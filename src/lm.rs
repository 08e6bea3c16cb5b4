use nalgebra::{convert, Cholesky, DMatrix, DVector, RealField};
use num_traits::Float;

use crate::jacobian::estimate_jacobian;
use crate::Error;

#[derive(Debug, Clone, PartialEq)]
/// Information about the minimization.
///
/// Produced by every terminating run, whether the tolerances were met or
/// the iteration budget ran out; distinguish the two by comparing
/// [`iterations`](MinimizationReport::iterations) with the configured
/// maximum.
pub struct MinimizationReport<F: RealField> {
    /// Value of `$\|\vec{f}(\vec{x}_0)\|^2$` at the initial guess.
    pub initial_objective_function: F,
    /// Value of `$\|\vec{f}(\vec{x}^*)\|^2$` at the returned point.
    pub objective_function: F,
    /// Number of damped-step iterations executed. Zero when the initial
    /// guess already satisfied the gradient test.
    pub iterations: usize,
    /// Total number of evaluation-closure calls, Jacobian estimation
    /// included.
    pub number_of_evaluations: usize,
    /// The last residual vector returned by the evaluation closure at an
    /// accepted point.
    pub residuals: DVector<F>,
    /// The approximate Hessian `$\mathbf{H} = \mathbf{J}^\top\mathbf{J}$`
    /// at the last accepted point.
    ///
    /// Can be used to obtain an estimate of the covariance of the optimal
    /// parameters: `$\mathrm{COV} = \mathbf{H}\mathbf{M}\mathbf{H}^\top$`,
    /// with `$\mathbf{M}$` the covariance of the observations.
    pub hessian: DMatrix<F>,
    /// One row `$[\vec{x}, \|\vec{f}(\vec{x})\|^2]$` per iteration, row 0
    /// being the initial guess, when path recording was enabled.
    /// Has exactly `iterations + 1` rows.
    pub path: Option<DMatrix<F>>,
}

/// Levenberg-Marquardt optimization algorithm with numerically estimated
/// derivatives.
///
/// See the [module documentation](index.html) for a usage example.
///
/// The iteration damps the Gauss-Newton normal equations,
/// ```math
///   (\mathbf{J}^\top\mathbf{J} + \lambda\mathbf{I})\,\vec{h} = -\mathbf{J}^\top\vec{f},
/// ```
/// and adapts `$\lambda$` with the scheme of Nielsen (Madsen, Nielsen,
/// Tingleff, *Methods for Non-Linear Least Squares Problems*, 2004,
/// algorithm 3.16): on an accepted step
/// `$\lambda \gets \lambda\max\{\tfrac13, 1 - (2\ell-1)^3\}$` and the
/// growth factor `$\nu$` resets to 2; on a rejected step
/// `$\lambda \gets \lambda\nu$` and `$\nu \gets 2\nu$`. Small `$\lambda$`
/// approaches Gauss-Newton behavior, large `$\lambda$` a short
/// gradient-descent step, so repeated rejections degrade gracefully
/// instead of oscillating.
///
/// The Jacobian is estimated from forward differences by
/// [`estimate_jacobian`](crate::estimate_jacobian) and is recomputed from
/// scratch at every accepted point. This is more expensive than
/// quasi-Newton style updates but numerically simpler and more robust.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LevenbergMarquardt<F> {
    max_iterations: usize,
    tau: F,
    gtol: F,
    xtol: F,
    record_path: bool,
}

impl<F: RealField + Float> LevenbergMarquardt<F> {
    pub fn new() -> Self {
        Self {
            max_iterations: 200,
            tau: convert(1e-3),
            gtol: convert(1e-8),
            xtol: convert(1e-8),
            record_path: false,
        }
    }

    /// Set the iteration budget.
    ///
    /// Reaching it is a normal termination, reported through
    /// [`MinimizationReport::iterations`], not an error. Must be at least
    /// one; validated when the minimization runs.
    pub fn with_max_iterations(self, max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }

    /// Set the factor for the initial damping parameter,
    /// `$\lambda_0 = \tau\max_i(\mathbf{J}^\top\mathbf{J})_{ii}$`.
    ///
    /// Small values (like the default `$10^{-3}$`) suit initial guesses
    /// believed to be close to a minimum; `$\tau = 1$` is a conservative
    /// choice for poor guesses. Must be positive; validated when the
    /// minimization runs.
    pub fn with_tau(self, tau: F) -> Self {
        Self { tau, ..self }
    }

    /// Set the gradient tolerance.
    ///
    /// Termination occurs when
    /// `$\|\mathbf{J}^\top\vec{f}\|_\infty \leq \mathtt{gtol}$`, i.e. when
    /// a critical point was found. Must be positive; validated when the
    /// minimization runs.
    pub fn with_gtol(self, gtol: F) -> Self {
        Self { gtol, ..self }
    }

    /// Set the relative step-size tolerance.
    ///
    /// Termination occurs when a computed step satisfies
    /// `$\|\vec{h}\| < \mathtt{xtol}(\|\vec{x}\| + \mathtt{xtol})$`.
    /// Must be positive; validated when the minimization runs.
    pub fn with_xtol(self, xtol: F) -> Self {
        Self { xtol, ..self }
    }

    /// Record the visited points and their squared errors in
    /// [`MinimizationReport::path`].
    pub fn with_record_path(self, record_path: bool) -> Self {
        Self {
            record_path,
            ..self
        }
    }

    /// Minimize `$\|\vec{f}(\vec{x})\|^2$` starting from `x0`, with steps
    /// applied by Euclidean addition.
    ///
    /// `eval` maps a parameter vector and `user_param` to the residual
    /// vector; it must be deterministic, must not keep hidden state the
    /// optimizer can observe, and must return residual vectors of one
    /// consistent length, discovered from the first call. Returning
    /// `None` aborts the run with [`Error::User`].
    ///
    /// `increments` holds the per-dimension forward-difference step sizes
    /// used for Jacobian estimation; it must have the same length as `x0`
    /// and strictly positive entries.
    ///
    /// `user_param` is passed through to `eval` unchanged on every call.
    ///
    /// On success returns the optimized point together with a
    /// [`MinimizationReport`].
    pub fn minimize<U, E>(
        &self,
        x0: &DVector<F>,
        increments: &DVector<F>,
        user_param: &U,
        eval: E,
    ) -> Result<(DVector<F>, MinimizationReport<F>), Error>
    where
        E: Fn(&DVector<F>, &U) -> Option<DVector<F>>,
    {
        self.minimize_with_increment_adder(x0, increments, user_param, eval, |x, h, _| x + h)
    }

    /// Like [`minimize`](Self::minimize), but with a caller-supplied
    /// operation replacing the Euclidean `$\vec{x} + \vec{h}$` when
    /// forming a candidate point.
    ///
    /// `increment_adder(x, h, user_param)` must return the candidate
    /// obtained by applying the increment `h` to `x`. This is meant for
    /// on-manifold optimization, e.g. composing a pose increment with a
    /// base pose by group composition; the adder must be consistent with
    /// the metric implied by `increments`.
    pub fn minimize_with_increment_adder<U, E, A>(
        &self,
        x0: &DVector<F>,
        increments: &DVector<F>,
        user_param: &U,
        eval: E,
        increment_adder: A,
    ) -> Result<(DVector<F>, MinimizationReport<F>), Error>
    where
        E: Fn(&DVector<F>, &U) -> Option<DVector<F>>,
        A: Fn(&DVector<F>, &DVector<F>, &U) -> DVector<F>,
    {
        let n = x0.len();
        if self.max_iterations == 0 {
            return Err(Error::InvalidArgument("max_iterations must be at least 1"));
        }
        if !(self.tau > F::zero()) {
            return Err(Error::InvalidArgument("tau must be positive"));
        }
        if !(self.gtol > F::zero()) {
            return Err(Error::InvalidArgument("gtol must be positive"));
        }
        if !(self.xtol > F::zero()) {
            return Err(Error::InvalidArgument("xtol must be positive"));
        }
        if n == 0 {
            return Err(Error::InvalidArgument("parameter vector is empty"));
        }
        if increments.len() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: increments.len(),
            });
        }
        if increments.iter().any(|d| !(*d > F::zero())) {
            return Err(Error::InvalidArgument("increments must be strictly positive"));
        }

        let two: F = convert(2.0);

        // Linearize at the start point: Jacobian, Hessian and gradient.
        let mut x = x0.clone();
        let mut jacobian = estimate_jacobian(&x, &eval, increments, user_param)?;
        let mut residuals = eval(&x, user_param).ok_or(Error::User)?;
        let mut number_of_evaluations = n + 2;
        let m = residuals.len();
        if jacobian.nrows() != m {
            return Err(Error::DimensionMismatch {
                expected: jacobian.nrows(),
                found: m,
            });
        }
        let mut hessian = jacobian.tr_mul(&jacobian);
        let mut gradient = jacobian.tr_mul(&residuals);
        let mut objective = residuals.norm_squared();
        let initial_objective_function = objective;

        let mut lambda = self.tau * max_diagonal(&hessian);
        let mut v = two;
        let mut found = norm_inf(&gradient) <= self.gtol;

        let mut path = self
            .record_path
            .then(|| DMatrix::zeros(self.max_iterations + 1, n + 1));
        if let Some(path) = path.as_mut() {
            record_path_row(path, 0, &x, objective);
        }

        let mut iterations = 0;
        while !found && iterations < self.max_iterations {
            // Solve (H + lambda I) h = -g through the Cholesky factors.
            let mut damped = hessian.clone();
            for k in 0..n {
                damped[(k, k)] += lambda;
            }
            let cholesky = Cholesky::new(damped).ok_or(Error::SingularMatrix)?;
            let step = -cholesky.solve(&gradient);

            if step.norm() < self.xtol * (x.norm() + self.xtol) {
                // Negligible step relative to x; no candidate evaluation
                // needed.
                found = true;
                break;
            }

            let x_new = increment_adder(&x, &step, user_param);
            let residuals_new = eval(&x_new, user_param).ok_or(Error::User)?;
            number_of_evaluations += 1;
            if residuals_new.len() != m {
                return Err(Error::DimensionMismatch {
                    expected: m,
                    found: residuals_new.len(),
                });
            }
            let objective_new = residuals_new.norm_squared();

            // Gain ratio: actual over predicted reduction of the squared
            // error, the predicted one being h' (lambda h - g).
            let denom = (&step * lambda - &gradient).dot(&step);
            let gain = (objective - objective_new) / denom;

            if gain > F::zero() {
                // Accept and re-linearize at the new point.
                x = x_new;
                residuals = residuals_new;
                objective = objective_new;

                jacobian = estimate_jacobian(&x, &eval, increments, user_param)?;
                number_of_evaluations += n + 1;
                if jacobian.nrows() != m {
                    return Err(Error::DimensionMismatch {
                        expected: m,
                        found: jacobian.nrows(),
                    });
                }
                hessian = jacobian.tr_mul(&jacobian);
                gradient = jacobian.tr_mul(&residuals);
                found = norm_inf(&gradient) <= self.gtol;

                lambda *= Float::max(
                    convert(1.0 / 3.0),
                    F::one() - Float::powi(two * gain - F::one(), 3),
                );
                v = two;
            } else {
                lambda *= v;
                v *= two;
            }

            iterations += 1;
            if let Some(path) = path.as_mut() {
                record_path_row(path, iterations, &x, objective);
            }
        }

        let report = MinimizationReport {
            initial_objective_function,
            objective_function: objective,
            iterations,
            number_of_evaluations,
            residuals,
            hessian,
            path: path.map(|p| p.rows(0, iterations + 1).into_owned()),
        };
        Ok((x, report))
    }
}

impl<F: RealField + Float> Default for LevenbergMarquardt<F> {
    fn default() -> Self {
        Self::new()
    }
}

fn norm_inf<F: RealField + Float>(v: &DVector<F>) -> F {
    v.iter()
        .fold(F::zero(), |acc, &e| Float::max(acc, Float::abs(e)))
}

fn max_diagonal<F: RealField + Float>(m: &DMatrix<F>) -> F {
    m.diagonal()
        .iter()
        .fold(F::zero(), |acc, &e| Float::max(acc, e))
}

fn record_path_row<F: RealField + Float>(
    path: &mut DMatrix<F>,
    row: usize,
    x: &DVector<F>,
    objective: F,
) {
    for (j, &value) in x.iter().enumerate() {
        path[(row, j)] = value;
    }
    path[(row, x.len())] = objective;
}

#[cfg(test)]
mod test_validation;
