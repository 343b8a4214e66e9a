//! Error types for object graph construction and resolution
//!
//! Provides error handling for:
//! - Module declaration and instantiation
//! - Module configuration (binding conflicts)
//! - Instance resolution

/// Errors raised while building an object graph
///
/// All of these are class-level: they surface before any test method runs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The test class declares no module list at all
    #[error("no module declaration found for '{class}'")]
    MissingModules {
        /// Test class name
        class: String,
    },

    /// The module list is empty
    #[error("the module declaration of '{class}' doesn't list any module")]
    EmptyModules {
        /// Test class name
        class: String,
    },

    /// A declared module could not be instantiated
    #[error("impossible to instantiate module '{module}': {reason}")]
    ModuleInstantiation {
        /// Module name
        module: String,
        /// Underlying reason
        reason: String,
    },

    /// The same type was bound twice
    #[error("type '{type_name}' bound more than once (by '{first}' and '{second}')")]
    DuplicateBinding {
        /// Bound type
        type_name: &'static str,
        /// Module holding the first binding
        first: String,
        /// Module attempting the second binding
        second: String,
    },

    /// Module-specific configuration failure
    #[error("module '{module}' failed to configure: {reason}")]
    Configure {
        /// Module name
        module: String,
        /// Underlying reason
        reason: String,
    },

    /// Resolving an instance during setup failed
    #[error("resolution failed: {0}")]
    Resolve(#[from] ResolveError),
}

impl ConfigError {
    /// Create module instantiation error
    pub fn instantiation(module: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ModuleInstantiation {
            module: module.into(),
            reason: reason.into(),
        }
    }

    /// Create configure error
    pub fn configure(module: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configure {
            module: module.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while resolving an instance from a graph
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// No binding for the requested type
    #[error("no binding for type '{type_name}'")]
    NotBound {
        /// Requested type
        type_name: &'static str,
    },

    /// The binding's factory failed
    #[error("factory for '{type_name}' failed: {reason}")]
    Factory {
        /// Requested type
        type_name: &'static str,
        /// Underlying reason
        reason: String,
    },

    /// The type is already being resolved on this thread
    #[error("cyclic resolution of '{type_name}'")]
    Cycle {
        /// Requested type
        type_name: &'static str,
    },

    /// The stored instance has an unexpected type
    #[error("binding for '{type_name}' holds a different type")]
    TypeMismatch {
        /// Requested type
        type_name: &'static str,
    },
}

impl ResolveError {
    /// Create factory error for `T`
    pub fn factory<T: ?Sized>(reason: impl Into<String>) -> Self {
        Self::Factory {
            type_name: std::any::type_name::<T>(),
            reason: reason.into(),
        }
    }

    /// Check for [`ResolveError::NotBound`]
    #[inline]
    #[must_use]
    pub fn is_not_bound(&self) -> bool {
        matches!(self, Self::NotBound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::EmptyModules {
            class: "MyStory".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "the module declaration of 'MyStory' doesn't list any module"
        );
    }

    #[test]
    fn resolve_error_converts() {
        let err: ConfigError = ResolveError::NotBound { type_name: "u32" }.into();
        assert!(matches!(err, ConfigError::Resolve(ResolveError::NotBound { .. })));
    }

    #[test]
    fn factory_error_names_type() {
        let err = ResolveError::factory::<String>("boom");
        assert!(err.to_string().contains("alloc::string::String"));
        assert!(!err.is_not_bound());
    }
}
