//! Named, typed parser parameters.
//!
//! Parameters are attached to a [`Parser`](crate::parser::Parser) and passed
//! unchanged into every nested sub-parse, so a filter configured once
//! (e.g. a date window) applies at every nesting level.

use std::fmt;

/// Typed parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::UInt(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Str(v) => f.write_str(v),
        }
    }
}

/// Ordered collection of named parameters.
///
/// Adding a name twice replaces the earlier value in place (last write
/// wins, first position kept).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    entries: Vec<(String, ParamValue)>,
}

impl Parameters {
    /// Create an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a parameter.
    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => {
                tracing::debug!(parameter = %name, "Replacing existing parameter value");
                slot.1 = value;
            }
            None => self.entries.push((name, value)),
        }
    }

    #[must_use]
    pub fn with_int(mut self, name: impl Into<String>, value: i64) -> Self {
        self.insert(name, ParamValue::Int(value));
        self
    }

    #[must_use]
    pub fn with_uint(mut self, name: impl Into<String>, value: u64) -> Self {
        self.insert(name, ParamValue::UInt(value));
        self
    }

    #[must_use]
    pub fn with_float(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, ParamValue::Float(value));
        self
    }

    #[must_use]
    pub fn with_string(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, ParamValue::Str(value.into()));
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Signed value; unsigned values that fit are accepted.
    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            ParamValue::Int(v) => Some(*v),
            ParamValue::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Unsigned value; non-negative signed values are accepted.
    #[must_use]
    pub fn get_uint(&self, name: &str) -> Option<u64> {
        match self.get(name)? {
            ParamValue::UInt(v) => Some(*v),
            ParamValue::Int(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_float(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            ParamValue::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
