//! Identifier-to-sentence conversion
//!
//! Provides [`MessageConverter`], which runs the [`TextRule`] chain over a
//! method identifier and never fails.

use crate::error::ConversionError;
use crate::format::{ArgumentFormatter, FormatterConfig};
use crate::rule::{default_rules, Call, TextRule};
use crate::value::Value;

/// Runs the sentence pipeline
///
/// # Example
///
/// ```rust
/// use storyline_text::{MessageConverter, Value};
///
/// let converter = MessageConverter::new();
/// let sentence = converter.convert("theFirstStepTakes_$1_arguments", &[], &[Value::from("one")]);
/// assert_eq!(sentence, "The first step takes \"one\" arguments");
/// ```
#[derive(Debug)]
pub struct MessageConverter {
    rules: Vec<Box<dyn TextRule>>,
}

impl MessageConverter {
    /// Create converter with the default pipeline
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(FormatterConfig::default())
    }

    /// Create converter whose argument formatter uses `config`
    #[must_use]
    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            rules: default_rules(ArgumentFormatter::with_config(config)),
        }
    }

    /// Create converter running a custom rule chain
    #[inline]
    #[must_use]
    pub fn with_rules(rules: Vec<Box<dyn TextRule>>) -> Self {
        Self { rules }
    }

    /// Number of rules in the chain
    #[inline]
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Convert `identifier` into a sentence
    ///
    /// Any rule failure is logged and the untouched identifier is returned.
    #[must_use]
    pub fn convert(&self, identifier: &str, templates: &[Option<String>], arguments: &[Value]) -> String {
        match self.try_convert(identifier, templates, arguments) {
            Ok(sentence) => sentence,
            Err(err) => {
                tracing::error!(identifier, error = %err, "unable to convert identifier to a sentence");
                identifier.to_string()
            }
        }
    }

    /// Convert `identifier`, surfacing the first rule failure
    ///
    /// # Errors
    /// Returns the [`ConversionError`] of the first failing rule.
    pub fn try_convert(
        &self,
        identifier: &str,
        templates: &[Option<String>],
        arguments: &[Value],
    ) -> Result<String, ConversionError> {
        let call = Call::new(templates, arguments);
        self.rules
            .iter()
            .try_fold(identifier.to_string(), |message, rule| {
                let next = rule.apply(&message, &call)?;
                tracing::trace!(rule = rule.name(), %next, "rule applied");
                Ok(next)
            })
    }
}

impl Default for MessageConverter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatError;
    use crate::value::Argument;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use serde::Serialize;

    #[derive(Debug)]
    struct NotPrintableArgument;

    impl Argument for NotPrintableArgument {
        fn display(&self) -> Result<String, FormatError> {
            Err(FormatError::new("toString failed"))
        }
    }

    #[derive(Serialize)]
    struct PrintableBean {
        name: String,
        value: i32,
    }

    fn convert(identifier: &str, arguments: &[Value]) -> String {
        MessageConverter::new().convert(identifier, &[], arguments)
    }

    #[test]
    fn camel_case_identifier() {
        assert_eq!(
            convert("theFirstStepTakes_$1_arguments", &[Value::from("one")]),
            "The first step takes \"one\" arguments"
        );
    }

    #[test]
    fn invalid_date_format_falls_back_to_identifier() {
        let converter = MessageConverter::with_config(FormatterConfig::new().with_date_format("%Q"));
        let date = NaiveDate::from_ymd_opt(2017, 1, 5).unwrap();
        assert_eq!(converter.convert("on_$1", &[], &[date.into()]), "on_$1");
    }

    #[test]
    fn out_of_bound_argument() {
        assert_eq!(convert("step_$1", &[]), "Step <out_of_bound_argument>");
    }

    #[test]
    fn number_argument() {
        assert_eq!(
            convert("this_is_a_step_with_the_number_$1_as_argument", &[Value::from(2)]),
            "This is a step with the number 2 as argument"
        );
    }

    #[test]
    fn comma_and_string() {
        assert_eq!(
            convert(
                "this_step_checks_the_comma__and_the_string_parameter_$1",
                &[Value::from("String")]
            ),
            "This step checks the comma, and the string parameter \"String\""
        );
    }

    #[test]
    fn date_and_null() {
        let date = NaiveDate::from_ymd_opt(2017, 12, 31).unwrap();
        assert_eq!(
            convert(
                "this_step_has_a_date_$1_as_parameter_an_$2_value",
                &[Value::from(date), Value::Null]
            ),
            "This step has a date 31/12/2017 as parameter an <empty> value"
        );
    }

    #[test]
    fn list_and_array() {
        assert_eq!(
            convert(
                "this_step_has_a_list_of_$1_and_an_array_of_$2",
                &[Value::from(vec![1_i64, 2]), Value::from(["one", "two", "three"])]
            ),
            "This step has a list of 1 and 2 and an array of \"one\", \"two\" and \"three\""
        );
    }

    #[test]
    fn unprintable_argument_falls_back_to_identifier() {
        let identifier = "this_step_cannot_be_print_$1";
        assert_eq!(
            convert(identifier, &[Value::object(NotPrintableArgument)]),
            identifier
        );
    }

    #[test]
    fn template_argument() {
        let templates = [Some("a bean that contains ${name} and ${value}".to_string())];
        let bean = Value::record(&PrintableBean {
            name: "name".to_string(),
            value: 1,
        });
        let sentence = MessageConverter::new().convert(
            "this_step_should_print_an_object_as_$1",
            &templates,
            &[bean],
        );
        assert_eq!(
            sentence,
            "This step should print an object as a bean that contains \"name\" and 1"
        );
    }

    #[test]
    fn template_with_missing_field() {
        let templates = [Some("a bean that contains ${name} and ${values}".to_string())];
        let bean = Value::record(&PrintableBean {
            name: "name".to_string(),
            value: 3,
        });
        let sentence = MessageConverter::new().convert(
            "this_step_should_print_an_object_as_$1_with_missing_value",
            &templates,
            &[bean],
        );
        assert_eq!(
            sentence,
            "This step should print an object as a bean that contains \"name\" and <field_not_found> with missing value"
        );
    }

    #[test]
    fn camel_case_story_title() {
        assert_eq!(convert("testTheStoryPrinter", &[]), "Test the story printer");
    }

    #[test]
    fn empty_identifier() {
        assert_eq!(convert("", &[]), "");
    }

    #[test]
    fn try_convert_surfaces_error() {
        let result = MessageConverter::new().try_convert(
            "step_$1",
            &[],
            &[Value::object(NotPrintableArgument)],
        );
        assert!(matches!(result, Err(ConversionError::Argument { index: 0, .. })));
    }

    #[test]
    fn custom_rule_chain() {
        let converter = MessageConverter::with_rules(vec![Box::new(crate::rule::CapitalizeFirst)]);
        assert_eq!(converter.rule_count(), 1);
        assert_eq!(converter.convert("keep_me", &[], &[]), "Keep_me");
    }
}
