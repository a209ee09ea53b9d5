// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::Path;

use expect_test::expect;
use miette::SourceSpan;

use super::{Error, parse_problem, read_problem};
use crate::{error::ProblemError, gate::GateMatrix};

#[test]
fn parses_swap_scenario() {
    let problem = parse_problem("0 1 1 0\n3.0\n7.0\n0\n").expect("well-formed input");
    assert_eq!(problem.application.gate, GateMatrix::PAULI_X);
    assert_eq!(problem.application.target.bit(), 0);
    assert_eq!(problem.state.amplitudes(), &[3.0, 7.0]);
}

#[test]
fn amplitude_count_is_token_count_minus_five() {
    let problem = parse_problem("1 0 0 1  1 2 3 4  1").expect("well-formed input");
    assert_eq!(problem.state.len(), 4);
    assert_eq!(problem.application.target.bit(), 1);
}

#[test]
fn target_is_truncated_toward_zero() {
    let problem = parse_problem("1 0 0 1 1 2 3 4 1.9").expect("well-formed input");
    assert_eq!(problem.application.target.bit(), 1);
    let problem = parse_problem("1 0 0 1 1 2 -0.5").expect("well-formed input");
    assert_eq!(problem.application.target.bit(), 0);
}

#[test]
fn non_numeric_token_is_labelled() {
    let err = parse_problem("1 0 0 1 1 x 0").expect_err("x is not a number");
    assert_eq!(err, Error::NotANumber("x".to_string(), SourceSpan::from((10, 1))));
}

#[test]
fn too_few_numbers() {
    let err = parse_problem("1 0 0 1 5 0").expect_err("only one amplitude");
    expect![[r#"
        TooFewNumbers(
            6,
        )
    "#]]
    .assert_debug_eq(&err);
}

#[test]
fn amplitude_count_must_be_power_of_two() {
    let err = parse_problem("1 0 0 1 1 2 3 0").expect_err("three amplitudes");
    assert_eq!(
        err,
        Error::Invalid(ProblemError::LengthNotPowerOfTwo { len: 3 })
    );
}

#[test]
fn target_beyond_qubit_count_is_rejected() {
    let err = parse_problem("1 0 0 1 1 2 3 4 2").expect_err("two qubits only");
    expect![[r#"
        target bit 2 is out of range for a 2-qubit state
    "#]]
    .assert_eq(&format!("{err}\n"));
}

#[test]
fn negative_or_infinite_target_is_rejected() {
    for target in ["-1", "inf", "NaN"] {
        let source = format!("1 0 0 1 1 2 {target}");
        let err = parse_problem(&source).expect_err("invalid target");
        assert!(matches!(err, Error::InvalidTarget(..)), "{target}: {err:?}");
    }
}

#[test]
fn missing_file_is_input_unavailable() {
    let err = read_problem(Path::new("/nonexistent/qgate/input.txt")).expect_err("no such file");
    assert!(
        matches!(&err, Error::InputUnavailable(path, _) if path == "/nonexistent/qgate/input.txt"),
        "{err:?}"
    );
}
