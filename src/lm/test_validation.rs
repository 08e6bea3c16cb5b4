//! Tests for argument validation and error propagation.
use core::cell::Cell;
use nalgebra::{dvector, DVector};

use crate::{Error, LevenbergMarquardt};

#[test]
fn mismatched_increments_fail_before_any_evaluation() {
    let calls = Cell::new(0usize);
    let eval = |x: &DVector<f64>, _: &()| {
        calls.set(calls.get() + 1);
        Some(x.clone())
    };

    let err = LevenbergMarquardt::new()
        .minimize(&dvector![1., 2.], &dvector![1e-6, 1e-6, 1e-6], &(), eval)
        .unwrap_err();

    assert_eq!(err, Error::DimensionMismatch { expected: 2, found: 3 });
    assert_eq!(calls.get(), 0);
}

#[test]
fn malformed_hyperparameters_are_rejected() {
    let eval = |x: &DVector<f64>, _: &()| Some(x.clone());
    let x0 = dvector![1.];
    let inc = dvector![1e-6];

    let err = LevenbergMarquardt::new()
        .with_max_iterations(0)
        .minimize(&x0, &inc, &(), eval)
        .unwrap_err();
    assert_eq!(err, Error::InvalidArgument("max_iterations must be at least 1"));

    let err = LevenbergMarquardt::new()
        .with_tau(-1.)
        .minimize(&x0, &inc, &(), eval)
        .unwrap_err();
    assert_eq!(err, Error::InvalidArgument("tau must be positive"));

    let err = LevenbergMarquardt::new()
        .with_gtol(0.)
        .minimize(&x0, &inc, &(), eval)
        .unwrap_err();
    assert_eq!(err, Error::InvalidArgument("gtol must be positive"));

    let err = LevenbergMarquardt::new()
        .with_xtol(0.)
        .minimize(&x0, &inc, &(), eval)
        .unwrap_err();
    assert_eq!(err, Error::InvalidArgument("xtol must be positive"));
}

#[test]
fn non_positive_increments_are_rejected() {
    let eval = |x: &DVector<f64>, _: &()| Some(x.clone());
    let err = LevenbergMarquardt::new()
        .minimize(&dvector![1., 2.], &dvector![1e-6, 0.], &(), eval)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    let err = LevenbergMarquardt::new()
        .minimize(&dvector![1., 2.], &dvector![1e-6, -1e-6], &(), eval)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn empty_parameter_vector_is_rejected() {
    let eval = |x: &DVector<f64>, _: &()| Some(x.clone());
    let err = LevenbergMarquardt::new()
        .minimize(&DVector::zeros(0), &DVector::zeros(0), &(), eval)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn inconsistent_residual_sizes_are_rejected() {
    // consistent for the start-up evaluations, then grows a row
    let calls = Cell::new(0usize);
    let eval = |x: &DVector<f64>, _: &()| {
        calls.set(calls.get() + 1);
        if calls.get() <= 3 {
            Some(dvector![x[0] - 1., 2. * x[0] + 1.])
        } else {
            Some(dvector![x[0] - 1., 2. * x[0] + 1., 0.])
        }
    };

    let err = LevenbergMarquardt::new()
        .minimize(&dvector![0.], &dvector![1e-6], &(), eval)
        .unwrap_err();
    assert_eq!(err, Error::DimensionMismatch { expected: 2, found: 3 });
}

#[test]
fn evaluation_failure_propagates() {
    let eval = |_: &DVector<f64>, _: &()| None::<DVector<f64>>;
    let err = LevenbergMarquardt::new()
        .minimize(&dvector![0.], &dvector![1e-6], &(), eval)
        .unwrap_err();
    assert_eq!(err, Error::User);
}

#[test]
fn increment_adder_replaces_euclidean_addition() {
    let adder_calls = Cell::new(0usize);
    let eval = |x: &DVector<f64>, _: &()| Some(dvector![x[0] - 5.]);

    let (x, report) = LevenbergMarquardt::new()
        .minimize_with_increment_adder(
            &dvector![0.],
            &dvector![1e-6],
            &(),
            eval,
            |x: &DVector<f64>, h: &DVector<f64>, _: &()| {
                adder_calls.set(adder_calls.get() + 1);
                // deliberately shorten every step; convergence must still
                // be reached, just more slowly
                x + h * 0.5
            },
        )
        .unwrap();

    assert!(adder_calls.get() > 0);
    assert!((x[0] - 5.).abs() < 1e-6);
    assert!(report.objective_function < 1e-12);
}

#[test]
fn error_messages_name_the_problem() {
    let err = Error::DimensionMismatch { expected: 2, found: 3 };
    assert_eq!(err.to_string(), "dimension mismatch: expected 2, found 3");
    assert_eq!(
        Error::SingularMatrix.to_string(),
        "damped normal matrix is not positive-definite"
    );
    assert_eq!(
        Error::InvalidArgument("tau must be positive").to_string(),
        "invalid argument: tau must be positive"
    );
    assert_eq!(
        Error::User.to_string(),
        "evaluation function signalled failure"
    );
}
