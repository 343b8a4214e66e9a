//! Argument values passed to narrated calls
//!
//! Provides [`Value`], the opaque argument type the formatter dispatches on,
//! and the [`Argument`] capability trait for hand-written values that expose
//! named fields.

use crate::error::{FieldError, FormatError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use std::collections::{BTreeSet, VecDeque};
use std::fmt::Debug;
use std::sync::Arc;

/// Capability interface for values with named fields
///
/// Implement this for argument types that want `${field}` interpolation
/// without going through serde, or whose textual representation can fail.
pub trait Argument: Send + Sync + Debug {
    /// Default textual representation
    ///
    /// # Errors
    /// Returns [`FormatError`] when the value cannot be rendered.
    fn display(&self) -> Result<String, FormatError>;

    /// Read a named field
    ///
    /// # Errors
    /// Returns [`FieldError::NotFound`] unless overridden.
    fn field(&self, name: &str) -> Result<Value, FieldError> {
        Err(FieldError::NotFound(name.to_string()))
    }
}

/// Structured value with named fields
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: Vec<(String, Value)>,
    display: String,
}

impl Record {
    /// Create record from fields and its default textual representation
    #[must_use]
    pub fn new(fields: Vec<(String, Value)>, display: impl Into<String>) -> Self {
        Self {
            fields,
            display: display.into(),
        }
    }

    /// Lookup field by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Field names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Default textual representation (compact JSON)
    #[inline]
    #[must_use]
    pub fn display(&self) -> &str {
        &self.display
    }
}

/// A single call argument
///
/// Containers of any shape (vectors, slices, fixed-size arrays, sets)
/// collapse into [`Value::Seq`].
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent value
    Null,
    /// Calendar date
    Date(NaiveDate),
    /// Text, rendered in double quotes
    Text(String),
    /// Ordered sequence
    Seq(Vec<Value>),
    /// Structured value built through serde
    Record(Record),
    /// Hand-written value exposing the [`Argument`] capability
    Object(Arc<dyn Argument>),
    /// Anything else, already rendered
    Other(String),
}

impl Value {
    /// Build a structured value from any serializable type
    ///
    /// Serialization failures produce a value whose textual representation
    /// fails, so the whole sentence falls back to the raw identifier.
    pub fn record<T: serde::Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(json) => Self::from_json(json),
            Err(err) => Self::Object(Arc::new(Unserializable(err.to_string()))),
        }
    }

    /// Convert a JSON tree into a value
    #[must_use]
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Other(b.to_string()),
            serde_json::Value::Number(n) => Self::Other(n.to_string()),
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Array(items) => {
                Self::Seq(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                let display = serde_json::Value::Object(map.clone()).to_string();
                let fields = map
                    .into_iter()
                    .map(|(name, value)| (name, Self::from_json(value)))
                    .collect();
                Self::Record(Record::new(fields, display))
            }
        }
    }

    /// Wrap a hand-written argument
    #[inline]
    pub fn object(argument: impl Argument + 'static) -> Self {
        Self::Object(Arc::new(argument))
    }

    /// Check for [`Value::Null`]
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Read a named field off this value
    ///
    /// # Errors
    /// Returns [`FieldError`] when the value has no readable field `name`.
    pub fn field(&self, name: &str) -> Result<Value, FieldError> {
        match self {
            Self::Record(record) => record
                .get(name)
                .cloned()
                .ok_or_else(|| FieldError::NotFound(name.to_string())),
            Self::Object(argument) => argument.field(name),
            _ => Err(FieldError::NotFound(name.to_string())),
        }
    }
}

#[derive(Debug)]
struct Unserializable(String);

impl Argument for Unserializable {
    fn display(&self) -> Result<String, FormatError> {
        Err(FormatError::new(self.0.clone()))
    }
}

macro_rules! impl_from_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Other(value.to_string())
                }
            }
        )*
    };
}

impl_from_display!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Self::Date(value.date())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(value: DateTime<Tz>) -> Self {
        Self::Date(value.date_naive())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Self::Seq(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<VecDeque<T>> for Value {
    fn from(value: VecDeque<T>) -> Self {
        Self::Seq(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<BTreeSet<T>> for Value {
    fn from(value: BTreeSet<T>) -> Self {
        Self::Seq(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(value: [T; N]) -> Self {
        Self::Seq(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<Value>> From<&[T]> for Value {
    fn from(value: &[T]) -> Self {
        Self::Seq(value.iter().cloned().map(Into::into).collect())
    }
}

impl From<Arc<dyn Argument>> for Value {
    fn from(value: Arc<dyn Argument>) -> Self {
        Self::Object(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Self::Record(value)
    }
}
