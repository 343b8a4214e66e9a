//! Runner configuration
//!
//! Every field has a default, so an empty document is valid:
//!
//! ```toml
//! finalizer_name = "drop"
//! catch_panics = true
//!
//! [formatter]
//! date_format = "%d/%m/%Y"
//! ```

use crate::error::RunnerConfigError;
use serde::Deserialize;
use storyline_text::FormatterConfig;

/// Default finalizer identifier
pub const DEFAULT_FINALIZER: &str = "drop";

/// Class runner settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Identifier passed through the narrator untouched (case-insensitive)
    pub finalizer_name: String,
    /// Catch panics in method bodies and expectation-checked steps
    pub catch_panics: bool,
    /// Argument formatting
    pub formatter: FormatterConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            finalizer_name: DEFAULT_FINALIZER.to_string(),
            catch_panics: true,
            formatter: FormatterConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Parse a TOML document
    ///
    /// # Errors
    /// Returns [`RunnerConfigError`] on malformed TOML or an invalid value.
    pub fn from_toml_str(document: &str) -> Result<Self, RunnerConfigError> {
        let config: Self = toml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field values
    ///
    /// # Errors
    /// Returns [`RunnerConfigError::InvalidValue`] for an empty finalizer
    /// name, or a date format that is empty or has an unknown specifier.
    pub fn validate(&self) -> Result<(), RunnerConfigError> {
        if self.finalizer_name.trim().is_empty() {
            return Err(RunnerConfigError::InvalidValue {
                field: "finalizer_name",
                reason: "must not be empty".to_string(),
            });
        }
        self.formatter
            .validate()
            .map_err(|err| RunnerConfigError::InvalidValue {
                field: "formatter.date_format",
                reason: err.to_string(),
            })
    }

    /// Check if `identifier` names the finalizer
    #[must_use]
    pub fn is_finalizer(&self, identifier: &str) -> bool {
        identifier.eq_ignore_ascii_case(&self.finalizer_name)
    }

    /// With finalizer name
    #[must_use]
    pub fn with_finalizer_name(mut self, name: impl Into<String>) -> Self {
        self.finalizer_name = name.into();
        self
    }

    /// With panic catching
    #[must_use]
    pub fn with_catch_panics(mut self, catch: bool) -> Self {
        self.catch_panics = catch;
        self
    }

    /// With formatter settings
    #[must_use]
    pub fn with_formatter(mut self, formatter: FormatterConfig) -> Self {
        self.formatter = formatter;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        assert_eq!(RunnerConfig::from_toml_str("").unwrap(), RunnerConfig::default());
    }

    #[test]
    fn partial_document() {
        let config = RunnerConfig::from_toml_str(
            r#"
            catch_panics = false

            [formatter]
            date_format = "%Y-%m-%d"
            "#,
        )
        .unwrap();
        assert!(!config.catch_panics);
        assert_eq!(config.finalizer_name, "drop");
        assert_eq!(config.formatter.date_format, "%Y-%m-%d");
    }

    #[test]
    fn rejects_empty_finalizer() {
        let err = RunnerConfig::from_toml_str(r#"finalizer_name = " ""#).unwrap_err();
        assert!(matches!(err, RunnerConfigError::InvalidValue { field: "finalizer_name", .. }));
    }

    #[test]
    fn rejects_unknown_date_specifier() {
        let err = RunnerConfig::from_toml_str("[formatter]\ndate_format = \"%Q\"").unwrap_err();
        assert!(matches!(
            err,
            RunnerConfigError::InvalidValue { field: "formatter.date_format", .. }
        ));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            RunnerConfig::from_toml_str("catch_panics = maybe"),
            Err(RunnerConfigError::Parse(_))
        ));
    }

    #[test]
    fn finalizer_is_case_insensitive() {
        let config = RunnerConfig::default();
        assert!(config.is_finalizer("DROP"));
        assert!(!config.is_finalizer("dropped"));
    }
}
