//! Resolution of plain scalars to typed values.
//!
//! The reader never interprets scalar text itself. It asks a [`Schema`] whether a text is null,
//! a boolean, a number or a timestamp. [`CoreSchema`] implements the YAML 1.2 core schema, with
//! the YAML 1.1 timestamp format on top.

use std::sync::OnceLock;

use ordered_float::OrderedFloat;
use regex::Regex;
use yamlet_parser::Quoting;

use crate::value::{Timestamp, Value};

/// The prefix of the tags of the YAML core schema. `!!int` resolves to `tag:yaml.org,2002:int`.
pub const CORE_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// Scalar resolution capabilities.
///
/// Only the text of plain scalars is given to the predicates: quoted and block scalars are
/// always strings. The trait is object safe; the reader hands it to expecters as `&dyn Schema`.
pub trait Schema {
    /// Return whether `text` denotes the absence of a value.
    fn is_null(&self, text: &str) -> bool;

    /// Parse `text` as a boolean.
    fn parse_boolean(&self, text: &str) -> Option<bool>;

    /// Parse `text` as a signed integer.
    fn parse_integer(&self, text: &str) -> Option<i64>;

    /// Parse `text` as an unsigned integer.
    fn parse_unsigned(&self, text: &str) -> Option<u64>;

    /// Parse `text` as a floating point number.
    fn parse_float(&self, text: &str) -> Option<f64>;

    /// Return whether `text` is a timestamp.
    fn is_timestamp(&self, text: &str) -> bool;

    /// Resolve a scalar to a [`Value`].
    ///
    /// Non-plain scalars are strings. A core schema tag restricts resolution to the named type
    /// and yields `None` if the text does not match it. Other tags are ignored and the type is
    /// guessed from the text. Untagged timestamps are left as strings.
    fn resolve(&self, text: &str, quoting: Quoting, tag: Option<&str>) -> Option<Value> {
        if !quoting.is_plain() {
            return Some(Value::String(text.to_owned()));
        }
        match tag.and_then(|tag| tag.strip_prefix(CORE_TAG_PREFIX)) {
            Some("null") => self.is_null(text).then_some(Value::Null),
            Some("bool") => self.parse_boolean(text).map(Value::Boolean),
            Some("int") => self.parse_integer(text).map(Value::Integer),
            Some("float") => self
                .parse_float(text)
                .map(|f| Value::FloatingPoint(OrderedFloat(f))),
            Some("str") => Some(Value::String(text.to_owned())),
            Some("timestamp") => self
                .is_timestamp(text)
                .then(|| Value::Timestamp(Timestamp::new_unchecked(text))),
            Some(_) => None,
            None => Some(self.guess(text)),
        }
    }

    /// Guess the type of an untagged plain scalar.
    fn guess(&self, text: &str) -> Value {
        if self.is_null(text) {
            Value::Null
        } else if let Some(b) = self.parse_boolean(text) {
            Value::Boolean(b)
        } else if let Some(i) = self.parse_integer(text) {
            Value::Integer(i)
        } else if let Some(f) = self.parse_float(text) {
            Value::FloatingPoint(OrderedFloat(f))
        } else {
            Value::String(text.to_owned())
        }
    }
}

/// The YAML 1.2 core schema.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoreSchema;

impl Schema for CoreSchema {
    fn is_null(&self, text: &str) -> bool {
        matches!(text, "~" | "null" | "Null" | "NULL" | "")
    }

    fn parse_boolean(&self, text: &str) -> Option<bool> {
        match text {
            "true" | "True" | "TRUE" => Some(true),
            "false" | "False" | "FALSE" => Some(false),
            _ => None,
        }
    }

    fn parse_integer(&self, text: &str) -> Option<i64> {
        if let Some(number) = text.strip_prefix("0x") {
            unsigned_digits(number, 16).and_then(|n| i64::from_str_radix(n, 16).ok())
        } else if let Some(number) = text.strip_prefix("0o") {
            unsigned_digits(number, 8).and_then(|n| i64::from_str_radix(n, 8).ok())
        } else if let Some(number) = text.strip_prefix('+') {
            // `i64::from_str` would accept a second sign.
            number
                .starts_with(|c: char| c.is_ascii_digit())
                .then(|| number.parse().ok())
                .flatten()
        } else {
            text.parse().ok()
        }
    }

    fn parse_unsigned(&self, text: &str) -> Option<u64> {
        if let Some(number) = text.strip_prefix("0x") {
            unsigned_digits(number, 16).and_then(|n| u64::from_str_radix(n, 16).ok())
        } else if let Some(number) = text.strip_prefix("0o") {
            unsigned_digits(number, 8).and_then(|n| u64::from_str_radix(n, 8).ok())
        } else {
            let number = text.strip_prefix('+').unwrap_or(text);
            number
                .starts_with(|c: char| c.is_ascii_digit())
                .then(|| number.parse().ok())
                .flatten()
        }
    }

    fn parse_float(&self, text: &str) -> Option<f64> {
        parse_core_schema_fp(text)
    }

    fn is_timestamp(&self, text: &str) -> bool {
        timestamp_regex().is_match(text)
    }
}

/// Parse a floating point number the way the YAML core schema does.
///
/// Infinities and NaN are written `.inf`, `-.inf` and `.nan` in any of their 3 casings. Other
/// texts must contain a digit, so that Rust's `inf` and `NaN` are not accepted.
#[must_use]
pub fn parse_core_schema_fp(v: &str) -> Option<f64> {
    match v {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => Some(f64::NAN),
        _ if v.as_bytes().iter().any(u8::is_ascii_digit) => v.parse::<f64>().ok(),
        _ => None,
    }
}

/// Return `digits` if it is a non-empty run of digits in `radix`. `from_str_radix` would also
/// take a sign.
fn unsigned_digits(digits: &str, radix: u32) -> Option<&str> {
    (!digits.is_empty() && digits.chars().all(|c| c.is_digit(radix))).then_some(digits)
}

/// The YAML 1.1 timestamp format: a date, optionally followed by a time and a time zone.
fn timestamp_regex() -> &'static Regex {
    static TIMESTAMP: OnceLock<Regex> = OnceLock::new();
    TIMESTAMP.get_or_init(|| {
        Regex::new(concat!(
            r"^(?:[0-9]{4}-[0-9]{2}-[0-9]{2}",
            r"|[0-9]{4}-[0-9]{1,2}-[0-9]{1,2}(?:[Tt]|[ \t]+)[0-9]{1,2}:[0-9]{2}:[0-9]{2}",
            r"(?:\.[0-9]*)?(?:[ \t]*(?:Z|[-+][0-9]{1,2}(?::[0-9]{2})?))?)$",
        ))
        .expect("the timestamp pattern is a valid regex")
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn guess_core_types() {
        let schema = CoreSchema;
        for (text, value) in [
            ("~", Value::Null),
            ("", Value::Null),
            ("True", Value::Boolean(true)),
            ("0x1f", Value::Integer(31)),
            ("0o17", Value::Integer(15)),
            ("+12", Value::Integer(12)),
            ("-12", Value::Integer(-12)),
            ("1.5e3", Value::FloatingPoint(OrderedFloat(1500.0))),
            ("-.inf", Value::FloatingPoint(OrderedFloat(f64::NEG_INFINITY))),
            ("inf", Value::String("inf".into())),
            ("+-1", Value::String("+-1".into())),
            ("0x-1", Value::String("0x-1".into())),
            ("2001-12-14", Value::String("2001-12-14".into())),
            ("yes", Value::String("yes".into())),
        ] {
            assert_eq!(schema.guess(text), value, "{text:?}");
        }
    }

    #[test]
    fn quoting_and_tags() {
        let schema = CoreSchema;
        assert_eq!(
            schema.resolve("12", Quoting::Double, None),
            Some(Value::String("12".into()))
        );
        assert_eq!(
            schema.resolve("12", Quoting::None, Some("tag:yaml.org,2002:str")),
            Some(Value::String("12".into()))
        );
        assert_eq!(
            schema.resolve("true", Quoting::None, Some("tag:yaml.org,2002:int")),
            None
        );
        assert_eq!(
            schema.resolve("12", Quoting::None, Some("tag:yaml.org,2002:unknown")),
            None
        );
        assert_eq!(
            schema.resolve("12", Quoting::None, Some("!degrees")),
            Some(Value::Integer(12))
        );
        assert!(matches!(
            schema.resolve("2001-12-14", Quoting::None, Some("tag:yaml.org,2002:timestamp")),
            Some(Value::Timestamp(_))
        ));
    }

    #[test]
    fn timestamps() {
        let schema = CoreSchema;
        for text in [
            "2001-12-14",
            "2001-12-14t21:59:43.10-05:00",
            "2001-12-14 21:59:43.10 -5",
            "2001-12-15T02:59:43.1Z",
            "2001-12-15 2:59:43.10",
        ] {
            assert!(schema.is_timestamp(text), "{text:?}");
        }
        for text in ["2001-1-14", "2001-12-14T", "12:00:00", "2001-12-14 21:59"] {
            assert!(!schema.is_timestamp(text), "{text:?}");
        }
    }

    #[test]
    fn unsigned() {
        let schema = CoreSchema;
        assert_eq!(schema.parse_unsigned("18446744073709551615"), Some(u64::MAX));
        assert_eq!(schema.parse_unsigned("-1"), None);
        assert_eq!(schema.parse_unsigned("0xff"), Some(255));
    }
}
