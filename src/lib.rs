//! Implementation of the [Levenberg-Marquardt](https://en.wikipedia.org/wiki/Levenberg%E2%80%93Marquardt_algorithm)
//! optimization algorithm using [nalgebra](https://nalgebra.org), with
//! derivatives estimated numerically by finite differences.
//!
//! This algorithm tries to solve the least-squares optimization problem
//! ```math
//! \min_{\vec{x}\in\R^n}F(\vec{x})\quad\text{where}\quad
//! F(\vec{x}) \coloneqq \sum_{i=1}^m \bigl(f_i(\vec{x})\bigr)^2
//! ```
//! for a user-supplied _residual function_
//! `$\vec{f}\!:\R^n\to\R^m$`.
//!
//! # Inputs
//!
//! You provide:
//!
//! - the residual function as a plain closure mapping a parameter vector
//!   and an opaque user parameter to the residual vector
//!   `$(f_1(\vec{x}), \ldots, f_m(\vec{x}))^\top\in\R^m$`;
//! - an initial guess for `$\vec{x}$` — the result typically depends
//!   _crucially_ on a good initial value;
//! - a vector of per-dimension step sizes used to estimate the Jacobian
//!   `$\mathbf{J}\in\R^{m\times n}$` by forward differences (see
//!   [`estimate_jacobian`]).
//!
//! No analytic derivatives are required. The hyperparameters of the
//! iteration are documented at [`LevenbergMarquardt`] along with the
//! damping strategy.
//!
//! # Usage example
//!
//! We minimize [Himmelblau's function](https://en.wikipedia.org/wiki/Himmelblau%27s_function),
//! written with `$n = m = 2$` as
//! ```math
//!   f_1(\vec{x}) \coloneqq x_1^2 + x_2 - 11\quad\text{and}\quad
//!   f_2(\vec{x}) \coloneqq x_1 + x_2^2 - 7.
//! ```
//!
//! ```
//! use levmarq::LevenbergMarquardt;
//! use nalgebra::{dvector, DVector};
//!
//! let eval = |x: &DVector<f64>, _: &()| {
//!     Some(dvector![
//!         x[0] * x[0] + x[1] - 11.0,
//!         x[0] + x[1] * x[1] - 7.0,
//!     ])
//! };
//!
//! let (x, report) = LevenbergMarquardt::new()
//!     .minimize(&dvector![1.0, 1.0], &dvector![1e-6, 1e-6], &(), eval)
//!     .unwrap();
//! assert!(report.objective_function < 1e-10);
//! // a zero-residual point satisfies both equations
//! assert!((x[0] * x[0] + x[1] - 11.0).abs() < 1e-5);
//! assert!((x[0] + x[1] * x[1] - 7.0).abs() < 1e-5);
//! ```
//!
//! # On-manifold optimization
//!
//! For parameter spaces that are not Euclidean (poses, angles), the
//! candidate-forming addition `$\vec{x} + \vec{h}$` can be replaced by a
//! caller-supplied operation; see
//! [`LevenbergMarquardt::minimize_with_increment_adder`].
//!
//! # Covariance of the result
//!
//! The report carries the approximate Hessian
//! `$\mathbf{H} = \mathbf{J}^\top\mathbf{J}$` at the optimum, from which a
//! covariance estimate of the optimal parameters can be derived as
//! `$\mathrm{COV} = \mathbf{H}\mathbf{M}\mathbf{H}^\top$` with
//! `$\mathbf{M}$` the covariance of the observations.

mod error;
mod jacobian;
mod lm;

pub use error::Error;
pub use jacobian::estimate_jacobian;
pub use lm::{LevenbergMarquardt, MinimizationReport};
