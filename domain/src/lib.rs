//! Domain library for attribute validation rules.
//!
//! Holds the value model, the record ports (traits) a host implements, the
//! error collection rules append to, and the two rules themselves:
//! [`url_validator::UrlValidator`] and [`write_once::WriteOnceValidator`].
//! Keep host concerns (storage, schema, IO) out of this crate.

use std::borrow::Cow;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

pub use messages::MessageOptions;

/// A dynamically typed attribute value as seen by validation rules.
///
/// Equality is numeric across `Integer` and `Float` (`7 == 7.0`); every
/// other pair compares only within its own variant.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Null, `false`, or a string with nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Text(s) => s.trim().is_empty(),
            Value::Integer(_) | Value::Float(_) => false,
        }
    }

    /// String form of the value, or `None` for null.
    pub fn to_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Null => None,
            Value::Text(s) => Some(Cow::Borrowed(s.as_str())),
            other => Some(Cow::Owned(other.to_string())),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Integer(n), Value::Float(x)) | (Value::Float(x), Value::Integer(n)) => {
                int_equals_float(*n, *x)
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

// Exact: no rounding through `n as f64` for integers beyond 2^53.
fn int_equals_float(n: i64, x: f64) -> bool {
    x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 && x as i64 == n
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Read access to a record's current attribute values.
pub trait AttributeSource {
    /// Current value of `attribute`; unknown attributes read as `Value::Null`.
    fn read_attribute(&self, attribute: &str) -> Value;
}

/// Per-attribute dirty tracking for the current validation pass.
pub trait ChangeTracker {
    fn was_changed(&self, attribute: &str) -> bool;
    /// Value before the pending change. Equals the current value when the
    /// attribute has not changed.
    fn prior_value(&self, attribute: &str) -> Value;
}

/// Record port implemented by the host. Rules only ever see it through a
/// shared reference.
pub trait Record: AttributeSource + ChangeTracker {
    /// True once the record has been stored (an update rather than a create).
    fn is_persisted(&self) -> bool;
}

/// Symbolic failure kind of a validation error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidUrl,
    Unchangeable,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidUrl => "invalid_url",
            ErrorKind::Unchangeable => "unchangeable",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "invalid_url" => Some(ErrorKind::InvalidUrl),
            "unchangeable" => Some(ErrorKind::Unchangeable),
            _ => None,
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failure entry appended by a rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub attribute: String,
    pub kind: ErrorKind,
    /// The value that failed, kept for `%{value}` interpolation.
    pub value: Value,
    /// Message options of the rule that produced the error.
    pub options: MessageOptions,
}

/// Ordered multimap from attribute name to validation errors.
///
/// Rules append through [`Errors::add`]; reading and clearing are for the
/// orchestrator and the host.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Errors {
    entries: Vec<ValidationError>,
}

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        attribute: &str,
        kind: ErrorKind,
        value: Value,
        options: &MessageOptions,
    ) {
        self.entries.push(ValidationError {
            attribute: attribute.to_string(),
            kind,
            value,
            options: options.clone(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.entries.iter()
    }

    /// Errors recorded for a single attribute, in insertion order.
    pub fn on<'a>(&'a self, attribute: &'a str) -> impl Iterator<Item = &'a ValidationError> {
        self.entries.iter().filter(move |e| e.attribute == attribute)
    }

    pub fn kinds_on(&self, attribute: &str) -> Vec<ErrorKind> {
        self.on(attribute).map(|e| e.kind).collect()
    }

    /// Rendered messages prefixed with the humanized attribute name.
    pub fn full_messages(&self) -> Vec<String> {
        self.entries.iter().map(ValidationError::full_message).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// A stateless validation rule, invoked once per attribute per pass.
///
/// Implementations must not keep per-record data: one instance is shared by
/// every record (and thread) validated against it.
pub trait Rule: Send + Sync {
    /// Short rule name used in logs, e.g. `"url"`.
    fn name(&self) -> &'static str;

    fn validate_each(
        &self,
        record: &dyn Record,
        attribute: &str,
        value: &Value,
        errors: &mut Errors,
    );

    /// Whether the orchestrator may skip this rule for null or blank values
    /// under an `allow_nil`/`allow_blank` policy.
    fn honors_nil_shortcut(&self) -> bool {
        true
    }
}

/// Errors raised when wiring rules up, as opposed to validation failures
/// which are recorded in [`Errors`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid attribute name: {0}")]
    InvalidAttribute(String),
}

pub mod adapters;
pub mod messages;
pub mod uri;
pub mod url_validator;
pub mod validations;
pub mod write_once;
