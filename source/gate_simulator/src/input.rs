// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Reads a gate application from its text form.
//!
//! The input is a whitespace separated list of decimal numbers:
//! the gate coefficients `a b c d`, then the `N` amplitudes, then the target
//! bit. `N` is the token count minus five.

#[cfg(test)]
mod tests;

use std::{fs, path::Path};

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::{
    error::ProblemError,
    gate::{GateApplication, GateMatrix, TargetBit},
    state_vector::{Amplitude, StateVector},
};

/// Coefficients before the amplitudes plus the trailing target bit.
const FRAMING_TOKENS: usize = 5;

#[derive(Clone, Debug, Diagnostic, Error, PartialEq, Eq)]
pub enum Error {
    #[error("cannot read input {0}: {1}")]
    #[diagnostic(code("QGate.Input.Unavailable"))]
    InputUnavailable(String, String),

    #[error("expected a number, found `{0}`")]
    #[diagnostic(code("QGate.Input.NotANumber"))]
    NotANumber(String, #[label] SourceSpan),

    #[error("input holds {0} numbers, at least 7 are required")]
    #[diagnostic(code("QGate.Input.TooFewNumbers"))]
    #[diagnostic(help(
        "expected four gate coefficients, at least two amplitudes and a target bit"
    ))]
    TooFewNumbers(usize),

    #[error("target bit must be a non-negative number, found `{0}`")]
    #[diagnostic(code("QGate.Input.InvalidTarget"))]
    InvalidTarget(String, #[label] SourceSpan),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Invalid(#[from] ProblemError),
}

/// A validated gate application and the state it acts on.
#[derive(Clone, Debug, PartialEq)]
pub struct Problem {
    pub application: GateApplication,
    pub state: StateVector,
}

#[derive(Clone, Copy, Debug)]
struct Token<'a> {
    offset: usize,
    text: &'a str,
}

impl Token<'_> {
    fn span(&self) -> SourceSpan {
        (self.offset, self.text.len()).into()
    }

    fn number(&self) -> Result<Amplitude, Error> {
        self.text
            .parse()
            .map_err(|_| Error::NotANumber(self.text.to_string(), self.span()))
    }
}

fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in source.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(offset)) => {
                tokens.push(Token {
                    offset,
                    text: &source[offset..i],
                });
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(offset) = start {
        tokens.push(Token {
            offset,
            text: &source[offset..],
        });
    }
    tokens
}

/// Parses and validates a problem from the contents of an input file.
pub fn parse_problem(source: &str) -> Result<Problem, Error> {
    let tokens = tokenize(source);
    if tokens.len() < FRAMING_TOKENS + 2 {
        return Err(Error::TooFewNumbers(tokens.len()));
    }
    let (coefficients, rest) = tokens.split_at(4);
    let (amplitudes, target) = rest.split_at(rest.len() - 1);

    let [a, b, c, d] = [0, 1, 2, 3].map(|i| coefficients[i].number());
    let gate = GateMatrix::new(a?, b?, c?, d?);
    let amplitudes = amplitudes
        .iter()
        .map(Token::number)
        .collect::<Result<Vec<_>, _>>()?;
    let state = StateVector::new(amplitudes)?;
    let target = parse_target(&target[0], state.qubit_count())?;

    Ok(Problem {
        application: GateApplication::new(gate, target),
        state,
    })
}

/// Reads and parses the input file at `path`.
pub fn read_problem(path: &Path) -> Result<Problem, Error> {
    parse_problem(&read_source(path)?)
}

pub fn read_source(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path)
        .map_err(|e| Error::InputUnavailable(path.display().to_string(), e.to_string()))
}

/// The target bit is written as a decimal number and truncated toward zero.
fn parse_target(token: &Token<'_>, qubit_count: u32) -> Result<TargetBit, Error> {
    let invalid = || Error::InvalidTarget(token.text.to_string(), token.span());
    let value: f64 = token
        .text
        .parse()
        .map_err(|_| Error::NotANumber(token.text.to_string(), token.span()))?;
    let truncated = value.trunc();
    if !truncated.is_finite() || truncated < 0.0 {
        return Err(invalid());
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let bit = truncated as u64;
    if bit >= u64::from(qubit_count) {
        return Err(ProblemError::TargetOutOfRange {
            target: bit,
            qubit_count,
        }
        .into());
    }
    u32::try_from(bit)
        .ok()
        .and_then(TargetBit::new)
        .ok_or_else(invalid)
}
