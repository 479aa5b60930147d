//! Attribute values carried by a log line.
//!
//! Values are plain data until emission; nothing here performs I/O. An
//! attached error is kept as the original error object so the sink decides
//! how to render it.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// An application error attached to a log line.
///
/// Stored behind `Arc` so attribute lists stay cloneable and emission can
/// snapshot them without consuming the error.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// A single attribute value.
#[derive(Debug, Clone)]
pub enum Value {
    /// UTF-8 text
    Str(Cow<'static, str>),
    /// Boolean flag
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    Uint(u64),
    /// Floating point number
    Float(f64),
    /// Elapsed time, rendered in `Duration` debug notation (`100ms`, `1.5s`)
    Duration(Duration),
    /// An application error, preserved verbatim for the sink to render
    Error(SharedError),
}

impl Value {
    /// Convert to a JSON value for structured output.
    ///
    /// Durations and errors become strings; a non-finite float falls back to
    /// its string form since JSON has no representation for it.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Str(s) => serde_json::Value::String(s.to_string()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Uint(u) => serde_json::Value::from(*u),
            Value::Float(x) => serde_json::Number::from_f64(*x)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(x.to_string())),
            Value::Duration(d) => serde_json::Value::String(format!("{d:?}")),
            Value::Error(e) => serde_json::Value::String(e.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Uint(u) => write!(f, "{u}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Duration(d) => write!(f, "{d:?}"),
            Value::Error(e) => write!(f, "{e}"),
        }
    }
}

impl From<&'static str> for Value {
    fn from(s: &'static str) -> Self {
        Value::Str(Cow::Borrowed(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Cow::Owned(s))
    }
}

impl From<Cow<'static, str>> for Value {
    fn from(s: Cow<'static, str>) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u16> for Value {
    fn from(u: u16) -> Self {
        Value::Uint(u64::from(u))
    }
}

impl From<u32> for Value {
    fn from(u: u32) -> Self {
        Value::Uint(u64::from(u))
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::Uint(u)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(f64::from(x))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Value::Duration(d)
    }
}

impl From<SharedError> for Value {
    fn from(e: SharedError) -> Self {
        Value::Error(e)
    }
}

/// An ordered key/value attribute.
///
/// Keys are `Cow<'static, str>` so the common case of literal keys does not
/// allocate. Duplicate keys are legal; the accumulated sequence preserves
/// them in insertion order.
#[derive(Debug, Clone)]
pub struct Attr {
    /// Attribute key
    pub key: Cow<'static, str>,
    /// Attribute value
    pub value: Value,
}

impl Attr {
    /// Create an attribute from any supported key and value type.
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn conversions_pick_the_expected_variant() {
        assert!(matches!(Value::from("static"), Value::Str(_)));
        assert!(matches!(Value::from(String::from("owned")), Value::Str(_)));
        assert!(matches!(Value::from(true), Value::Bool(true)));
        assert!(matches!(Value::from(-3i64), Value::Int(-3)));
        assert!(matches!(Value::from(200u16), Value::Uint(200)));
        assert!(matches!(Value::from(99.99f64), Value::Float(_)));
        assert!(matches!(
            Value::from(Duration::from_millis(100)),
            Value::Duration(_)
        ));
    }

    #[test]
    fn duration_renders_in_debug_notation() {
        let v = Value::from(Duration::from_millis(100));
        assert_eq!(v.to_string(), "100ms");
        assert_eq!(v.to_json(), serde_json::Value::String("100ms".into()));
    }

    #[test]
    fn error_renders_via_display() {
        let err: SharedError = Arc::new(io::Error::other("disk on fire"));
        let v = Value::Error(err);
        assert_eq!(v.to_string(), "disk on fire");
    }

    #[test]
    fn non_finite_float_falls_back_to_string_json() {
        let v = Value::from(f64::NAN);
        assert!(matches!(v.to_json(), serde_json::Value::String(_)));
    }

    #[test]
    fn attr_display_is_key_equals_value() {
        let attr = Attr::new("user_id", "123");
        assert_eq!(attr.to_string(), "user_id=123");
    }
}
