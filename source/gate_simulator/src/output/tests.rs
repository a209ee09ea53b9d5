// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use expect_test::expect;

use super::{format_amplitudes, write_amplitudes};
use crate::state_vector::StateVector;

#[test]
fn one_amplitude_per_line_with_three_decimals() {
    let state = StateVector::new(vec![2.0, 3.0, -0.5, 0.12345]).expect("valid state");
    expect![[r#"
        2.000
        3.000
        -0.500
        0.123
    "#]]
    .assert_eq(&format_amplitudes(&state));
}

#[test]
fn rounds_to_three_places() {
    let state = StateVector::new(vec![0.707_106_77, -0.707_106_77]).expect("valid state");
    expect![[r#"
        0.707
        -0.707
    "#]]
    .assert_eq(&format_amplitudes(&state));
}

#[test]
fn writer_matches_formatted_string() {
    let state = StateVector::new(vec![7.0, 3.0]).expect("valid state");
    let mut bytes = Vec::new();
    write_amplitudes(&mut bytes, &state).expect("writing to memory cannot fail");
    assert_eq!(String::from_utf8(bytes).expect("utf-8"), format_amplitudes(&state));
}
