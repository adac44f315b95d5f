//! A dynamically-typed scalar for arrays that mix value kinds.

use crate::key::FlipKey;
use core::cmp::Ordering;
use core::fmt;
use std::borrow::Cow;

/// Scalar stored in a heterogeneous `PhpArray<Value>`.
///
/// Ordering is partial: integers and floats compare numerically with each
/// other, strings compare with strings, booleans with booleans. Every other
/// pairing (and NaN) is incomparable, which makes `sort`/`asort` report
/// `ArrayError::NotComparable`.
///
/// Equality is strict: `Int(1) != Float(1.0)`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl FlipKey for Value {
    fn flip_key(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Int(i) => Some(Cow::Owned(i.to_string())),
            Value::Str(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Bool(_) | Value::Float(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_kinds_compare_across() {
        assert!(Value::Int(1) < Value::Float(1.5));
        assert!(Value::Float(2.0) > Value::Int(1));
        assert_eq!(
            Value::Int(2).partial_cmp(&Value::Float(2.0)),
            Some(Ordering::Equal)
        );
        // Equal under the order, but not equal values.
        assert_ne!(Value::Int(2), Value::Float(2.0));
    }

    #[test]
    fn mixed_kinds_are_incomparable() {
        assert_eq!(Value::Int(1).partial_cmp(&Value::from("1")), None);
        assert_eq!(Value::Bool(true).partial_cmp(&Value::Int(1)), None);
        assert_eq!(Value::Float(f64::NAN).partial_cmp(&Value::Float(0.0)), None);
    }

    #[test]
    fn only_ints_and_strings_flip() {
        assert_eq!(Value::Int(-3).flip_key().as_deref(), Some("-3"));
        assert_eq!(Value::from("k").flip_key().as_deref(), Some("k"));
        assert_eq!(Value::Float(1.0).flip_key(), None);
        assert_eq!(Value::Bool(false).flip_key(), None);
    }

    #[test]
    fn display_is_bare() {
        assert_eq!(Value::from("abc").to_string(), "abc");
        assert_eq!(Value::Int(5).to_string(), "5");
        assert_eq!(Value::Bool(true).to_string(), "true");
    }
}
