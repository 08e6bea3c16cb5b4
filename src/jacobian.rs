//! Finite-difference estimation of the Jacobian of a residual function.
use nalgebra::{DMatrix, DVector, RealField};
use num_traits::Float;

use crate::Error;

/// Estimate the Jacobian of `eval` at `x` by one-sided forward differences.
///
/// Column `$i$` of the result is the quotient
/// ```math
///   \frac{\vec{f}(\vec{x} + d_i\vec{e}_i) - \vec{f}(\vec{x})}{d_i},
/// ```
/// where `$d_i$` is `increments[i]` and `$\vec{e}_i$` the `$i$`-th unit
/// vector. The scheme is first-order accurate: the error in each entry is
/// on the order of the increment times the residual curvature. Increments
/// around `$\sqrt{\varepsilon}\approx 10^{-8}\ldots10^{-6}$` for `f64` are
/// a reasonable default when parameters are of magnitude one.
///
/// The full matrix costs `$n + 1$` calls of `eval`: one at the base point
/// and one per parameter dimension.
///
/// Every increment must be strictly positive and the increments vector
/// must have the same length as `x`, otherwise an [`Error`] is returned
/// before `eval` is called. All residual vectors returned by `eval` must
/// have one consistent length; a mismatch surfaces as
/// [`Error::DimensionMismatch`].
///
/// Besides powering [`LevenbergMarquardt`](crate::LevenbergMarquardt),
/// this function can be used on its own to cross-check a hand-derived
/// Jacobian.
pub fn estimate_jacobian<F, U, E>(
    x: &DVector<F>,
    eval: &E,
    increments: &DVector<F>,
    user_param: &U,
) -> Result<DMatrix<F>, Error>
where
    F: RealField + Float,
    E: Fn(&DVector<F>, &U) -> Option<DVector<F>>,
{
    let n = x.len();
    if increments.len() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            found: increments.len(),
        });
    }
    if increments.iter().any(|d| !(*d > F::zero())) {
        return Err(Error::InvalidArgument("increments must be strictly positive"));
    }

    let f_x = eval(x, user_param).ok_or(Error::User)?;
    let m = f_x.len();

    let mut jacobian = DMatrix::zeros(m, n);
    let mut x_mod = x.clone();
    for i in 0..n {
        x_mod[i] = x[i] + increments[i];
        let f_plus = eval(&x_mod, user_param).ok_or(Error::User)?;
        if f_plus.len() != m {
            return Err(Error::DimensionMismatch {
                expected: m,
                found: f_plus.len(),
            });
        }
        jacobian.set_column(i, &((f_plus - &f_x) / increments[i]));
        x_mod[i] = x[i];
    }
    Ok(jacobian)
}
