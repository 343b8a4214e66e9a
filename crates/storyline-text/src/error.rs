//! Error types for the sentence pipeline
//!
//! None of these errors ever reach a test: the [`MessageConverter`]
//! recovers from all of them.
//!
//! [`MessageConverter`]: crate::MessageConverter

/// Failure raised by a text rule or the argument formatter
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// A value could not produce its textual representation
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// A `$N` placeholder carried an index that does not fit in memory
    #[error("invalid placeholder '{token}'")]
    InvalidPlaceholder {
        /// Raw placeholder token
        token: String,
    },

    /// Argument formatting failed for a positional argument
    #[error("argument {index} could not be formatted: {reason}")]
    Argument {
        /// Zero-based argument index
        index: usize,
        /// Underlying reason
        reason: String,
    },
}

/// Failure computing the default textual representation of a value
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct FormatError(pub String);

impl FormatError {
    /// Create format error from a message
    #[inline]
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<std::fmt::Error> for FormatError {
    fn from(_: std::fmt::Error) -> Self {
        Self::new("formatter returned an error")
    }
}

/// Failure reading a named field off a value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// The value has no field with that name
    #[error("field not found: {0}")]
    NotFound(String),

    /// The field exists but could not be read
    #[error("field '{name}' unreadable: {reason}")]
    Unreadable {
        /// Field name
        name: String,
        /// Underlying reason
        reason: String,
    },
}
