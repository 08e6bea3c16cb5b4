use core::fmt;

/// Reasons for failure of a minimization or Jacobian estimation.
///
/// Running out of iterations is *not* an error: the optimizer then returns
/// a normal [`MinimizationReport`](crate::MinimizationReport) with
/// `iterations` equal to the configured maximum, and the caller judges the
/// final error value. Only structural problems are reported through this
/// type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Two quantities that must agree in size do not: the increments
    /// vector versus the parameter vector, or the residual vectors
    /// returned by the evaluation closure across calls.
    DimensionMismatch { expected: usize, found: usize },
    /// The damped normal matrix `$\mathbf{H} + \lambda\mathbf{I}$` has no
    /// Cholesky factorization. There is no fallback for this case; the
    /// call is abandoned.
    SingularMatrix,
    /// A hyperparameter or input was malformed: a non-positive increment
    /// or tolerance, a zero iteration budget, an empty parameter vector.
    /// Detected before the evaluation closure is called even once.
    InvalidArgument(&'static str),
    /// The evaluation closure signalled failure by returning `None`.
    User,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {}, found {}", expected, found)
            }
            Error::SingularMatrix => {
                write!(f, "damped normal matrix is not positive-definite")
            }
            Error::InvalidArgument(what) => write!(f, "invalid argument: {}", what),
            Error::User => write!(f, "evaluation function signalled failure"),
        }
    }
}

impl std::error::Error for Error {}
