//! Bound argument list handed to handlers.

use crate::error::ArgumentError;
use crate::types::Value;
use chrono::{DateTime, FixedOffset};
use std::time::Duration;

/// One parameter with its bound value. `None` means an optional
/// parameter without a default was omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArgument {
    pub name: String,
    pub value: Option<Value>,
}

/// Complete, ordered set of bound arguments for one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Vec<BoundArgument>,
}

macro_rules! typed_accessor {
    ($fn_name:ident, $opt_name:ident, $variant:ident, $ty:ty, $expected:literal) => {
        pub fn $fn_name(&self, name: &str) -> Result<$ty, ArgumentError> {
            self.$opt_name(name)?
                .ok_or_else(|| ArgumentError::Missing(name.to_string()))
        }

        pub fn $opt_name(&self, name: &str) -> Result<Option<$ty>, ArgumentError> {
            match self.get(name) {
                None => Ok(None),
                Some(Value::$variant(v)) => Ok(Some(v.clone())),
                Some(_) => Err(ArgumentError::WrongType {
                    name: name.to_string(),
                    expected: $expected,
                }),
            }
        }
    };
}

impl Arguments {
    pub fn new(values: Vec<BoundArgument>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundArgument> {
        self.values.iter()
    }

    /// Value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|a| a.name == name)
            .and_then(|a| a.value.as_ref())
    }

    /// Borrowed text value.
    pub fn text(&self, name: &str) -> Result<&str, ArgumentError> {
        self.opt_text(name)?
            .ok_or_else(|| ArgumentError::Missing(name.to_string()))
    }

    pub fn opt_text(&self, name: &str) -> Result<Option<&str>, ArgumentError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Text(v)) => Ok(Some(v.as_str())),
            Some(_) => Err(ArgumentError::WrongType {
                name: name.to_string(),
                expected: "text",
            }),
        }
    }

    /// Canonical member name of an enum argument.
    pub fn choice(&self, name: &str) -> Result<&str, ArgumentError> {
        match self.get(name) {
            None => Err(ArgumentError::Missing(name.to_string())),
            Some(Value::Enum(v)) => Ok(v.as_str()),
            Some(_) => Err(ArgumentError::WrongType {
                name: name.to_string(),
                expected: "choice",
            }),
        }
    }

    typed_accessor!(integer, opt_integer, Integer, i64, "whole number");
    typed_accessor!(unsigned, opt_unsigned, Unsigned, u64, "non-negative whole number");
    typed_accessor!(float, opt_float, Float, f64, "number");
    typed_accessor!(boolean, opt_boolean, Boolean, bool, "boolean");
    typed_accessor!(date_time, opt_date_time, DateTime, DateTime<FixedOffset>, "date/time");
    typed_accessor!(duration, opt_duration, Duration, Duration, "duration");
    typed_accessor!(text_list, opt_text_list, TextList, Vec<String>, "list");
}
