//! Failure expectations on steps
//!
//! A step declaring an [`ExpectationSpec`] must fail with the expected kind
//! (or a sub-kind), and with a message fully matching the pattern when one
//! is given. A satisfied expectation handles the failure; a broken one is
//! reported as an [`ExpectationMismatch`], distinct from user failures.

use crate::failure::{Failure, FailureKind};
use regex::Regex;

/// Declared expected failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectationSpec {
    kind: FailureKind,
    message_pattern: Option<String>,
}

impl ExpectationSpec {
    /// Expect a failure of `kind`
    #[must_use]
    pub fn new(kind: impl Into<FailureKind>) -> Self {
        Self {
            kind: kind.into(),
            message_pattern: None,
        }
    }

    /// Also require the message to fully match `pattern`
    #[must_use]
    pub fn with_message(mut self, pattern: impl Into<String>) -> Self {
        self.message_pattern = Some(pattern.into());
        self
    }

    /// Expected kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &FailureKind {
        &self.kind
    }

    /// Message pattern, if any
    #[inline]
    #[must_use]
    pub fn message_pattern(&self) -> Option<&str> {
        self.message_pattern.as_deref()
    }
}

/// Broken failure expectation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpectationMismatch {
    /// The step completed normally
    #[error("expected failure of kind '{expected}' but none occurred")]
    NoFailure {
        /// Expected kind
        expected: FailureKind,
    },

    /// The step failed with an unrelated kind
    #[error("unexpected failure kind, expected '{expected}' but was '{actual}'")]
    UnexpectedKind {
        /// Expected kind
        expected: FailureKind,
        /// Actual failure
        actual: Failure,
    },

    /// The failure message is absent or does not match
    #[error("unexpected message, expected match with '{pattern}' but was {}", display_message(.actual))]
    UnexpectedMessage {
        /// Declared pattern
        pattern: String,
        /// Actual failure message
        actual: Option<String>,
    },

    /// The declared pattern is not a valid regular expression
    #[error("invalid message pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Declared pattern
        pattern: String,
        /// Parse error
        reason: String,
    },
}

fn display_message(message: &Option<String>) -> String {
    match message {
        Some(m) => format!("'{m}'"),
        None => "no message".to_string(),
    }
}

/// Check a step outcome against `spec`
///
/// Returns the handled failure when the expectation holds.
///
/// # Errors
/// Returns [`ExpectationMismatch`] when the step did not fail, failed with
/// another kind, or failed with a non-matching message.
pub fn verify(spec: &ExpectationSpec, outcome: Result<(), Failure>) -> Result<Failure, ExpectationMismatch> {
    let Err(failure) = outcome else {
        return Err(ExpectationMismatch::NoFailure {
            expected: spec.kind.clone(),
        });
    };

    if !failure.kind().is_a(&spec.kind) {
        return Err(ExpectationMismatch::UnexpectedKind {
            expected: spec.kind.clone(),
            actual: failure,
        });
    }

    match spec.message_pattern() {
        Some(pattern) if !pattern.is_empty() => {
            let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|err| {
                ExpectationMismatch::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: err.to_string(),
                }
            })?;
            match failure.message() {
                Some(message) if regex.is_match(message) => Ok(failure),
                actual => Err(ExpectationMismatch::UnexpectedMessage {
                    pattern: pattern.to_string(),
                    actual: actual.map(str::to_string),
                }),
            }
        }
        _ => Ok(failure),
    }
}
