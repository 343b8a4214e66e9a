//! Text rules composing the sentence pipeline
//!
//! Each rule is a pure string transform. [`default_rules`] returns them in
//! the order the [`MessageConverter`] applies them.
//!
//! [`MessageConverter`]: crate::MessageConverter

use crate::error::ConversionError;
use crate::format::ArgumentFormatter;
use crate::value::Value;
use once_cell::sync::Lazy;
use regex::Regex;

/// Replacement for a placeholder with no matching argument
pub const ARGUMENT_OUT_OF_BOUND: &str = "<out_of_bound_argument>";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\$[0-9]+)(.*)$").expect("valid regex"));

/// Invocation context handed to every rule
#[derive(Debug, Clone, Copy)]
pub struct Call<'a> {
    /// Per-parameter display templates (may be shorter than `arguments`)
    pub templates: &'a [Option<String>],
    /// Positional call arguments
    pub arguments: &'a [Value],
}

impl<'a> Call<'a> {
    /// Create call context
    #[inline]
    #[must_use]
    pub fn new(templates: &'a [Option<String>], arguments: &'a [Value]) -> Self {
        Self {
            templates,
            arguments,
        }
    }

    /// Call with no arguments
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self {
            templates: &[],
            arguments: &[],
        }
    }

    /// Template declared for the argument at `index`
    #[inline]
    #[must_use]
    pub fn template(&self, index: usize) -> Option<&'a str> {
        self.templates.get(index).and_then(|t| t.as_deref())
    }
}

/// One stage of the sentence pipeline
pub trait TextRule: Send + Sync + std::fmt::Debug {
    /// Transform `message`
    ///
    /// # Errors
    /// Returns [`ConversionError`] when the stage cannot complete; the
    /// converter then falls back to the raw identifier.
    fn apply(&self, message: &str, call: &Call<'_>) -> Result<String, ConversionError>;

    /// Rule name (for logging)
    fn name(&self) -> &'static str;
}

/// Inserts a space before each upper-case letter not preceded by `_` and
/// lower-cases it
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitCamelCase;

impl TextRule for SplitCamelCase {
    fn apply(&self, message: &str, _call: &Call<'_>) -> Result<String, ConversionError> {
        let mut result = String::with_capacity(message.len() + 8);
        let mut previous = None;
        for c in message.chars() {
            if c.is_ascii_uppercase() && previous != Some('_') {
                result.push(' ');
                result.push(c.to_ascii_lowercase());
            } else {
                result.push(c);
            }
            previous = Some(c);
        }
        Ok(result)
    }

    fn name(&self) -> &'static str {
        "split_camel_case"
    }
}

/// `__` → `, `
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleUnderscoreToComma;

impl TextRule for DoubleUnderscoreToComma {
    fn apply(&self, message: &str, _call: &Call<'_>) -> Result<String, ConversionError> {
        Ok(message.replace("__", ", "))
    }

    fn name(&self) -> &'static str {
        "double_underscore_to_comma"
    }
}

/// `_` → space, `$` → space + `$`
#[derive(Debug, Clone, Copy, Default)]
pub struct UnderscoreAndDollarToSpace;

impl TextRule for UnderscoreAndDollarToSpace {
    fn apply(&self, message: &str, _call: &Call<'_>) -> Result<String, ConversionError> {
        Ok(message.replace('_', " ").replace('$', " $"))
    }

    fn name(&self) -> &'static str {
        "underscore_and_dollar_to_space"
    }
}

/// Replaces `$N` words with the formatted N-th argument
#[derive(Debug, Clone, Default)]
pub struct SubstituteArguments {
    formatter: ArgumentFormatter,
}

impl SubstituteArguments {
    /// Create rule using `formatter` for argument rendering
    #[inline]
    #[must_use]
    pub fn new(formatter: ArgumentFormatter) -> Self {
        Self { formatter }
    }

    fn substitute(&self, word: &str, call: &Call<'_>) -> Result<String, ConversionError> {
        let Some(caps) = PLACEHOLDER.captures(word) else {
            return Ok(word.to_string());
        };
        let token = &caps[1];
        let trailing = &caps[2];
        let number: usize = token[1..]
            .parse()
            .map_err(|_| ConversionError::InvalidPlaceholder {
                token: token.to_string(),
            })?;

        let rendered = match number.checked_sub(1) {
            Some(index) if index < call.arguments.len() => self
                .formatter
                .format(&call.arguments[index], call.template(index))
                .map_err(|err| ConversionError::Argument {
                    index,
                    reason: err.to_string(),
                })?,
            _ => ARGUMENT_OUT_OF_BOUND.to_string(),
        };
        Ok(rendered + trailing)
    }
}

impl TextRule for SubstituteArguments {
    fn apply(&self, message: &str, call: &Call<'_>) -> Result<String, ConversionError> {
        let words = message
            .split(' ')
            .map(|word| self.substitute(word, call))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(words.join(" "))
    }

    fn name(&self) -> &'static str {
        "substitute_arguments"
    }
}

/// Collapses whitespace runs to one space and trims both ends
#[derive(Debug, Clone, Copy, Default)]
pub struct CollapseWhitespace;

impl TextRule for CollapseWhitespace {
    fn apply(&self, message: &str, _call: &Call<'_>) -> Result<String, ConversionError> {
        Ok(message.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    fn name(&self) -> &'static str {
        "collapse_whitespace"
    }
}

/// Upper-cases the first character
#[derive(Debug, Clone, Copy, Default)]
pub struct CapitalizeFirst;

impl TextRule for CapitalizeFirst {
    fn apply(&self, message: &str, _call: &Call<'_>) -> Result<String, ConversionError> {
        let mut chars = message.chars();
        Ok(match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        })
    }

    fn name(&self) -> &'static str {
        "capitalize_first"
    }
}

/// The six rules in pipeline order
#[must_use]
pub fn default_rules(formatter: ArgumentFormatter) -> Vec<Box<dyn TextRule>> {
    vec![
        Box::new(SplitCamelCase),
        Box::new(DoubleUnderscoreToComma),
        Box::new(UnderscoreAndDollarToSpace),
        Box::new(SubstituteArguments::new(formatter)),
        Box::new(CollapseWhitespace),
        Box::new(CapitalizeFirst),
    ]
}
