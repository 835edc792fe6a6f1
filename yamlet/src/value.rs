//! Dynamically typed YAML values.

use std::{fmt, ops::Index};

use hashlink::LinkedHashMap;
use ordered_float::OrderedFloat;

use crate::schema::{CoreSchema, Schema};

/// A YAML value whose type is only known at runtime.
///
/// This is what [`Reader::any`](crate::Reader::any) returns. Accessing a nonexistent entry through
/// the [`Index`] impls returns [`Value::Null`] rather than panicking, so lookups can be chained:
///
/// ```
/// use yamlet::Value;
///
/// let value: Value = yamlet::from_str("a: [1, {b: c}]").unwrap();
/// assert_eq!(value["a"][1]["b"].as_str(), Some("c"));
/// assert!(value["a"][7]["nope"].is_null());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    /// `~`, `null` or an empty node.
    #[default]
    Null,
    /// `true` or `false`.
    Boolean(bool),
    /// An integer that fits in an `i64`.
    Integer(i64),
    /// A floating point number. Wrapped so that values can be mapping keys.
    FloatingPoint(OrderedFloat<f64>),
    /// A string.
    String(String),
    /// A timestamp, kept as written.
    Timestamp(Timestamp),
    /// A sequence.
    Sequence(Vec<Value>),
    /// A mapping, in document order.
    Mapping(Mapping),
}

/// The type contained in [`Value::Mapping`].
pub type Mapping = LinkedHashMap<Value, Value>;

static NULL: Value = Value::Null;

impl Value {
    /// Return whether the value is [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Return the boolean, if the value is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Return the integer, if the value is one.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Return the value as a float. Integers are converted.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_floating_point(&self) -> Option<f64> {
        match self {
            Value::FloatingPoint(f) => Some(f.0),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Return the string, if the value is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Return the timestamp, if the value is one.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match self {
            Value::Timestamp(t) => Some(t),
            _ => None,
        }
    }

    /// Return the entries of the sequence, if the value is one.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(v) => Some(v),
            _ => None,
        }
    }

    /// Return the mapping, if the value is one.
    #[must_use]
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Look `key` up in the mapping.
    ///
    /// Returns `None` if the value is not a mapping or has no such key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping()?.get(&Value::String(key.to_owned()))
    }

    /// Return a short name of the variant, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::FloatingPoint(_) => "float",
            Value::String(_) => "string",
            Value::Timestamp(_) => "timestamp",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }
}

impl Index<&str> for Value {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.get(key).unwrap_or(&NULL)
    }
}

impl Index<usize> for Value {
    type Output = Value;

    /// Index a sequence by position, or a mapping by integer key.
    fn index(&self, idx: usize) -> &Value {
        match self {
            Value::Sequence(v) => v.get(idx).unwrap_or(&NULL),
            Value::Mapping(m) => i64::try_from(idx)
                .ok()
                .and_then(|i| m.get(&Value::Integer(i)))
                .unwrap_or(&NULL),
            _ => &NULL,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::FloatingPoint(OrderedFloat(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Sequence(v.into_iter().map(Into::into).collect())
    }
}

/// A YAML timestamp, e.g. `2001-12-14t21:59:43.10-05:00`.
///
/// The text is validated against the YAML 1.1 timestamp format but not interpreted further.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(String);

impl Timestamp {
    /// Validate `text` as a timestamp.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        CoreSchema
            .is_timestamp(text)
            .then(|| Self::new_unchecked(text))
    }

    pub(crate) fn new_unchecked(text: &str) -> Self {
        Timestamp(text.to_owned())
    }

    /// Return the timestamp as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the `(year, month, day)` of the timestamp.
    #[must_use]
    pub fn date(&self) -> (i32, u32, u32) {
        let mut parts = self.0.splitn(3, '-');
        let mut field = || parts.next().unwrap_or_default();
        let year = field().parse().unwrap_or_default();
        let month = field().parse().unwrap_or_default();
        let day = field()
            .chars()
            .take_while(char::is_ascii_digit)
            .collect::<String>()
            .parse()
            .unwrap_or_default();
        (year, month, day)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn index_falls_back_to_null() {
        let mut mapping = Mapping::new();
        mapping.insert("a".into(), vec![1i64, 2].into());
        mapping.insert(Value::Integer(3), "three".into());
        let value = Value::Mapping(mapping);
        assert_eq!(value["a"][1], Value::Integer(2));
        assert_eq!(value[3].as_str(), Some("three"));
        assert!(value["b"].is_null());
        assert!(value["a"][2].is_null());
        assert!(Value::Integer(1)["a"].is_null());
    }

    #[test]
    fn timestamp_date() {
        let timestamp = Timestamp::parse("2001-12-14t21:59:43.10-05:00").unwrap();
        assert_eq!(timestamp.date(), (2001, 12, 14));
        assert_eq!(Timestamp::parse("2001-12-14").unwrap().date(), (2001, 12, 14));
        assert!(Timestamp::parse("yesterday").is_none());
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::Integer(2).as_floating_point(), Some(2.0));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from("x").type_name(), "string");
        assert_eq!(Value::Null.as_str(), None);
    }
}
