//! Failure model for test bodies and steps
//!
//! A [`Failure`] is what user code raises. Its [`FailureKind`] is a dotted
//! category path, so `io.not_found` is a sub-kind of `io`.

use crate::expect::ExpectationMismatch;
use std::any::Any;
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};

/// Dotted failure category
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FailureKind(Cow<'static, str>);

impl FailureKind {
    /// Failed assertion
    pub const ASSERTION: Self = Self(Cow::Borrowed("assertion"));
    /// Caught panic
    pub const PANIC: Self = Self(Cow::Borrowed("panic"));
    /// Test instance could not be built
    pub const INSTANTIATION: Self = Self(Cow::Borrowed("instantiation"));

    /// Create a kind from its dotted path
    #[must_use]
    pub fn new(path: impl Into<Cow<'static, str>>) -> Self {
        Self(path.into())
    }

    /// Kind named after type `E`
    #[must_use]
    pub fn of<E: ?Sized>() -> Self {
        Self(Cow::Borrowed(std::any::type_name::<E>()))
    }

    /// Dotted path
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if `self` is `other` or one of its sub-kinds
    #[must_use]
    pub fn is_a(&self, other: &FailureKind) -> bool {
        let (this, other) = (self.as_str(), other.as_str());
        this == other
            || (this.len() > other.len()
                && this.starts_with(other)
                && this.as_bytes()[other.len()] == b'.')
    }
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for FailureKind {
    fn from(path: &'static str) -> Self {
        Self::new(path)
    }
}

/// A failure raised by user code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    kind: FailureKind,
    message: Option<String>,
}

impl Failure {
    /// Failure without message
    #[must_use]
    pub fn new(kind: impl Into<FailureKind>) -> Self {
        Self {
            kind: kind.into(),
            message: None,
        }
    }

    /// Failure with message
    #[must_use]
    pub fn with_message(kind: impl Into<FailureKind>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: Some(message.into()),
        }
    }

    /// Assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::with_message(FailureKind::ASSERTION, message)
    }

    /// Wrap an error value; the kind is the error's type name
    #[must_use]
    pub fn caught<E: std::error::Error>(err: &E) -> Self {
        Self::with_message(FailureKind::of::<E>(), err.to_string())
    }

    /// Failure for a caught panic payload
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Self {
            kind: FailureKind::PANIC,
            message: panic_message(payload),
        }
    }

    /// Failure category
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &FailureKind {
        &self.kind
    }

    /// Failure message, if any
    #[inline]
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl Display for Failure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.kind, message),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Failure {}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> Option<String> {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
}

/// Error returned by a test method body
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    /// User failure; the test is reported as failed
    #[error("{0}")]
    Failed(#[from] Failure),

    /// Assumption not met; the test is reported as skipped
    #[error("assumption not met: {0}")]
    AssumptionNotMet(String),

    /// A step's failure expectation did not hold
    #[error(transparent)]
    Expectation(#[from] ExpectationMismatch),

    /// The body panicked
    #[error("panicked: {0}")]
    Panicked(String),
}

impl TestError {
    /// Assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Failed(Failure::assertion(message))
    }

    /// Skip the test unless `condition` holds
    ///
    /// # Errors
    /// Returns [`TestError::AssumptionNotMet`] when `condition` is false.
    pub fn assume(condition: bool, message: impl Into<String>) -> Result<(), Self> {
        if condition {
            Ok(())
        } else {
            Err(Self::AssumptionNotMet(message.into()))
        }
    }

    /// Check for [`TestError::AssumptionNotMet`]
    #[inline]
    #[must_use]
    pub fn is_assumption(&self) -> bool {
        matches!(self, Self::AssumptionNotMet(_))
    }
}

/// Error returned by a narrated step
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    /// Unhandled user failure
    #[error("{0}")]
    Failed(#[from] Failure),

    /// The step's failure expectation did not hold
    #[error(transparent)]
    Expectation(#[from] ExpectationMismatch),
}

impl From<StepError> for TestError {
    fn from(err: StepError) -> Self {
        match err {
            StepError::Failed(failure) => Self::Failed(failure),
            StepError::Expectation(mismatch) => Self::Expectation(mismatch),
        }
    }
}
