//! Tagged decoding of untrusted JSON fields.
//!
//! Every access to the parsed mapping goes through [`RawField`], so wrong
//! types, missing keys and nulls are explicit variants instead of scattered
//! type checks. The coercion helpers here are total: they always return a
//! value.

use crate::report::{collapse_whitespace, truncate_chars};
use serde_json::{Map, Number, Value};

/// One field of the untrusted mapping, classified by shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawField<'a> {
    Missing,
    Null,
    Bool(bool),
    Number(&'a Number),
    Str(&'a str),
    List(&'a [Value]),
    Map(&'a Map<String, Value>),
}

impl<'a> RawField<'a> {
    /// Look up `key` in `map`.
    pub fn of(map: &'a Map<String, Value>, key: &str) -> Self {
        Self::from_value(map.get(key))
    }

    pub fn from_value(value: Option<&'a Value>) -> Self {
        match value {
            None => RawField::Missing,
            Some(Value::Null) => RawField::Null,
            Some(Value::Bool(b)) => RawField::Bool(*b),
            Some(Value::Number(n)) => RawField::Number(n),
            Some(Value::String(s)) => RawField::Str(s),
            Some(Value::Array(items)) => RawField::List(items),
            Some(Value::Object(map)) => RawField::Map(map),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, RawField::Missing)
    }

    /// Scalar text form; lists and mappings have none.
    pub fn text(&self) -> Option<String> {
        match self {
            RawField::Str(s) => Some((*s).to_string()),
            RawField::Number(n) => Some(n.to_string()),
            RawField::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// List elements; any other shape is treated as an empty list.
    pub fn items(&self) -> &'a [Value] {
        match self {
            RawField::List(items) => *items,
            _ => &[],
        }
    }
}

/// Text of a list element. Mappings contribute their first string value, as
/// generators sometimes wrap bullets as `{"text": "..."}`.
pub fn item_text(value: &Value) -> Option<String> {
    match RawField::from_value(Some(value)) {
        RawField::Map(map) => map.values().find_map(|v| v.as_str().map(str::to_string)),
        other => other.text(),
    }
}

/// Collapse whitespace to single spaces (so the result is one line), cap at
/// `max` characters and trim again. The result is a fixed point.
pub fn bounded(s: &str, max: usize) -> String {
    truncate_chars(&collapse_whitespace(s), max).trim_end().to_string()
}

/// Integer value of a number or numeric string.
pub fn integer(field: RawField<'_>) -> Option<i64> {
    match field {
        RawField::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        RawField::Str(s) => s.trim().parse().ok(),
        _ => None,
    }
}
