//! storyline sentence pipeline
//!
//! Turns machine-style method identifiers and their call arguments into
//! readable sentences.
//!
//! # Core Concepts
//!
//! - [`TextRule`]: one pure string transform
//! - [`ArgumentFormatter`]: type-directed rendering of call arguments
//! - [`MessageConverter`]: the fixed rule chain, with fallback to the raw identifier
//! - [`Value`]: opaque call argument
//!
//! # Example
//!
//! ```rust
//! use storyline_text::{args, MessageConverter};
//!
//! let converter = MessageConverter::new();
//! let sentence = converter.convert(
//!     "while_the_second_step_takes_the_list_$1",
//!     &[],
//!     &args![vec![1, 2, 3]],
//! );
//! assert_eq!(sentence, "While the second step takes the list 1, 2 and 3");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod converter;
pub mod error;
pub mod format;
pub mod rule;
pub mod value;

// Re-exports
pub use converter::MessageConverter;
pub use error::{ConversionError, FieldError, FormatError};
pub use format::{
    ArgumentFormatter, FormatterConfig, AND_SEPARATOR, ARGUMENT_NULL, COMMA_SEPARATOR,
    FIELD_NOT_FOUND,
};
pub use rule::{
    default_rules, CapitalizeFirst, Call, CollapseWhitespace, DoubleUnderscoreToComma,
    SplitCamelCase, SubstituteArguments, TextRule, UnderscoreAndDollarToSpace,
    ARGUMENT_OUT_OF_BOUND,
};
pub use value::{Argument, Record, Value};

/// Build a `Vec<Value>` from heterogeneous arguments
///
/// ```rust
/// use storyline_text::{args, Value};
///
/// let values: Vec<Value> = args!["one", 2, None::<i32>];
/// assert_eq!(values.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($arg)),+]
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for sentence conversion
    pub use crate::{args, Argument, ArgumentFormatter, MessageConverter, TextRule, Value};
}
