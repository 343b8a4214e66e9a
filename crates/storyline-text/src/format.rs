//! Argument formatting
//!
//! Provides [`ArgumentFormatter`], the type-directed renderer used when a
//! `$N` placeholder is substituted.
//!
//! # Rules (first match wins)
//! - `Null` → `<empty>`
//! - date → `dd/MM/yyyy`
//! - text → `"text"`
//! - sequence → `a, b and c`
//! - anything else → default textual representation
//!
//! A per-parameter template replaces the base rules: every `${field}` token
//! is filled with the base rendering of that field, or `<field_not_found>`.

use crate::error::{ConversionError, FormatError};
use crate::value::Value;
use chrono::format::{Item, StrftimeItems};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Deserialize;
use std::fmt::Write;

/// Rendering of an absent value
pub const ARGUMENT_NULL: &str = "<empty>";

/// Rendering of a template field that cannot be read
pub const FIELD_NOT_FOUND: &str = "<field_not_found>";

/// Separator between all but the last two list items
pub const COMMA_SEPARATOR: &str = ", ";

/// Separator before the last list item
pub const AND_SEPARATOR: &str = " and ";

static TEMPLATE_FIELD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{(.*?)\}").expect("valid regex"));

/// Formatter settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    /// `chrono` format string for dates
    pub date_format: String,
}

impl FormatterConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With date format
    #[inline]
    #[must_use]
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Check that the date format is a usable `chrono` format string
    ///
    /// # Errors
    /// Returns [`FormatError`] for an empty format or an unknown specifier.
    pub fn validate(&self) -> Result<(), FormatError> {
        if self.date_format.is_empty() {
            return Err(FormatError::new("date format must not be empty"));
        }
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(FormatError::new(format!(
                "date format '{}' has an invalid specifier",
                self.date_format
            )));
        }
        Ok(())
    }
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            date_format: "%d/%m/%Y".to_string(),
        }
    }
}

/// Type-directed argument renderer
#[derive(Debug, Clone, Default)]
pub struct ArgumentFormatter {
    config: FormatterConfig,
}

impl ArgumentFormatter {
    /// Create formatter with default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create formatter with configuration
    #[inline]
    #[must_use]
    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    /// Formatter configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    /// Render a value, through `template` when one is given
    ///
    /// # Errors
    /// Returns [`ConversionError::Format`] when a value outside a template
    /// cannot produce its textual representation.
    pub fn format(&self, value: &Value, template: Option<&str>) -> Result<String, ConversionError> {
        match template {
            Some(template) => Ok(self.format_template(value, template)),
            None => self.format_value(value),
        }
    }

    /// Render a value with the base rules
    ///
    /// # Errors
    /// Returns [`ConversionError::Format`] when a value cannot produce its
    /// textual representation.
    pub fn format_value(&self, value: &Value) -> Result<String, ConversionError> {
        match value {
            Value::Null => Ok(ARGUMENT_NULL.to_string()),
            Value::Date(date) => {
                let mut text = String::new();
                write!(text, "{}", date.format(&self.config.date_format)).map_err(FormatError::from)?;
                Ok(text)
            }
            Value::Text(text) => Ok(format!("\"{text}\"")),
            Value::Seq(items) => self.format_list(items),
            Value::Record(record) => Ok(record.display().to_string()),
            Value::Object(argument) => Ok(argument.display()?),
            Value::Other(text) => Ok(text.clone()),
        }
    }

    /// Join formatted items as an English list
    ///
    /// # Errors
    /// Fails as soon as one item fails; nothing partial is returned.
    pub fn format_list(&self, items: &[Value]) -> Result<String, ConversionError> {
        let mut result = String::new();
        let last = items.len().saturating_sub(1);
        for (i, item) in items.iter().enumerate() {
            let text = self.format_value(item)?;
            if i == 0 {
                result.push_str(&text);
            } else if i < last {
                result.push_str(COMMA_SEPARATOR);
                result.push_str(&text);
            } else {
                result.push_str(AND_SEPARATOR);
                result.push_str(&text);
            }
        }
        Ok(result)
    }

    /// Fill every `${field}` token of `template` from `value`
    ///
    /// Never fails: unreadable fields render as [`FIELD_NOT_FOUND`].
    #[must_use]
    pub fn format_template(&self, value: &Value, template: &str) -> String {
        TEMPLATE_FIELD
            .replace_all(template, |caps: &Captures<'_>| {
                let name = &caps[1];
                match self.field_text(value, name) {
                    Ok(text) => text,
                    Err(reason) => {
                        tracing::debug!(field = name, %reason, "template field not rendered");
                        FIELD_NOT_FOUND.to_string()
                    }
                }
            })
            .into_owned()
    }

    fn field_text(&self, value: &Value, name: &str) -> Result<String, FormatError> {
        let field = value
            .field(name)
            .map_err(|err| FormatError::new(err.to_string()))?;
        self.format_value(&field)
            .map_err(|err| FormatError::new(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;
    use crate::value::Argument;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use serde::Serialize;

    #[derive(Serialize)]
    struct PrintableBean {
        name: String,
        value: i32,
    }

    #[derive(Debug)]
    struct NotPrintable;

    impl Argument for NotPrintable {
        fn display(&self) -> Result<String, FormatError> {
            Err(FormatError::new("cannot print"))
        }
    }

    #[derive(Debug)]
    struct Account {
        owner: &'static str,
    }

    impl Argument for Account {
        fn display(&self) -> Result<String, FormatError> {
            Ok(format!("Account({})", self.owner))
        }

        fn field(&self, name: &str) -> Result<Value, FieldError> {
            match name {
                "owner" => Ok(Value::from(self.owner)),
                "balance" => Err(FieldError::Unreadable {
                    name: name.to_string(),
                    reason: "locked".to_string(),
                }),
                _ => Err(FieldError::NotFound(name.to_string())),
            }
        }
    }

    fn format(value: impl Into<Value>) -> String {
        ArgumentFormatter::new().format(&value.into(), None).unwrap()
    }

    #[test]
    fn null_is_empty_marker() {
        assert_eq!(format(Value::Null), "<empty>");
    }

    #[test]
    fn date_uses_day_month_year() {
        let date = NaiveDate::from_ymd_opt(2017, 1, 5).unwrap();
        assert_eq!(format(date), "05/01/2017");
    }

    #[test]
    fn date_format_is_configurable() {
        let formatter =
            ArgumentFormatter::with_config(FormatterConfig::new().with_date_format("%Y-%m-%d"));
        let date = NaiveDate::from_ymd_opt(2017, 1, 5).unwrap();
        assert_eq!(formatter.format(&date.into(), None).unwrap(), "2017-01-05");
    }

    #[test]
    fn invalid_date_format_is_error() {
        let formatter = ArgumentFormatter::with_config(FormatterConfig::new().with_date_format("%Q"));
        let date = NaiveDate::from_ymd_opt(2017, 1, 5).unwrap();
        assert!(matches!(
            formatter.format(&date.into(), None),
            Err(ConversionError::Format(_))
        ));
    }

    #[test]
    fn date_format_validation() {
        assert!(FormatterConfig::new().validate().is_ok());
        assert!(FormatterConfig::new().with_date_format("%Y-%m-%d").validate().is_ok());
        assert!(FormatterConfig::new().with_date_format("%Q").validate().is_err());
        assert!(FormatterConfig::new().with_date_format("").validate().is_err());
    }

    #[test]
    fn text_is_quoted() {
        assert_eq!(format("one"), "\"one\"");
    }

    #[test]
    fn lists_join_with_and() {
        assert_eq!(format(vec![1, 2, 3]), "1, 2 and 3");
        assert_eq!(format(Vec::<i32>::new()), "");
        assert_eq!(format(vec![7]), "7");
        assert_eq!(format(vec![1, 2]), "1 and 2");
    }

    #[test]
    fn arrays_format_like_lists() {
        assert_eq!(format(["one", "two", "three"]), "\"one\", \"two\" and \"three\"");
    }

    #[test]
    fn nested_lists_recurse() {
        assert_eq!(format(vec![vec![1, 2], vec![3]]), "1 and 2 and 3");
    }

    #[test]
    fn failing_element_fails_whole_list() {
        let items = Value::Seq(vec![Value::from(1), Value::object(NotPrintable)]);
        assert!(ArgumentFormatter::new().format(&items, None).is_err());
    }

    #[test]
    fn template_interpolates_fields() {
        let bean = Value::record(&PrintableBean {
            name: "name".to_string(),
            value: 1,
        });
        let text = ArgumentFormatter::new()
            .format(&bean, Some("a bean that contains ${name} and ${value}"))
            .unwrap();
        assert_eq!(text, "a bean that contains \"name\" and 1");
    }

    #[test]
    fn template_missing_field_keeps_rest() {
        let bean = Value::record(&PrintableBean {
            name: "name".to_string(),
            value: 3,
        });
        let text = ArgumentFormatter::new()
            .format(&bean, Some("a bean that contains ${name} and ${values}"))
            .unwrap();
        assert_eq!(text, "a bean that contains \"name\" and <field_not_found>");
    }

    #[test]
    fn template_on_capability_object() {
        let account = Value::object(Account { owner: "ann" });
        let text = ArgumentFormatter::new().format_template(&account, "${owner} has ${balance}");
        assert_eq!(text, "\"ann\" has <field_not_found>");
    }

    #[test]
    fn template_on_null_renders_not_found() {
        let text = ArgumentFormatter::new().format_template(&Value::Null, "${name}!");
        assert_eq!(text, "<field_not_found>!");
    }

    #[test]
    fn template_does_not_reinterpret_field_text() {
        let record = Value::record(&serde_json::json!({ "name": "${other}", "other": "x" }));
        let text = ArgumentFormatter::new().format_template(&record, "${name}");
        assert_eq!(text, "\"${other}\"");
    }

    #[test]
    fn object_display_failure_is_error() {
        let value = Value::object(NotPrintable);
        assert!(matches!(
            ArgumentFormatter::new().format(&value, None),
            Err(ConversionError::Format(_))
        ));
    }
}
