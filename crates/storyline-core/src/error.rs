//! Class-level error types
//!
//! Provides error handling for:
//! - Graph configuration failures surfaced before any method runs
//! - Method shape validation
//! - Runner configuration parsing

use storyline_graph::{ConfigError, ResolveError};

/// Error raised while creating a class run; no method runs after it
#[derive(Debug, thiserror::Error)]
pub enum InitializationError {
    /// Module declaration or graph build failed
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// One or more methods have an unsupported shape
    #[error("{} invalid method(s): {}", .0.len(), join_errors(.0))]
    Validation(Vec<ShapeError>),
}

impl From<ResolveError> for InitializationError {
    fn from(err: ResolveError) -> Self {
        Self::Config(ConfigError::Resolve(err))
    }
}

fn join_errors(errors: &[ShapeError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Unsupported test method shape
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    /// Method is not public
    #[error("method {method} should be public")]
    NotPublic {
        /// Method name
        method: String,
    },

    /// Method declares parameters
    #[error("method {method} should have no parameters, found {arity}")]
    HasParameters {
        /// Method name
        method: String,
        /// Declared parameter count
        arity: usize,
    },

    /// Method returns a value
    #[error("method {method} should return unit")]
    NotUnit {
        /// Method name
        method: String,
    },

    /// Two methods share a name
    #[error("method {method} is declared more than once")]
    Duplicate {
        /// Method name
        method: String,
    },

    /// The class has nothing to run
    #[error("no runnable methods in {class}")]
    NoRunnableMethods {
        /// Class name
        class: String,
    },
}

/// Runner configuration could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum RunnerConfigError {
    /// Invalid TOML document
    #[error("invalid runner configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Field value out of range
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// Underlying reason
        reason: String,
    },
}
