//! Typed values read from and written to SDK variables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which getter/setter flavour to use for a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    /// `...AsInt`
    Int,
    /// `...AsUInt64`
    #[serde(rename = "uint64")]
    UInt64,
    /// `...AsDouble` / `...AsFloat`
    Double,
    /// `...AsString`
    String,
}

/// A variable value as returned by a getter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Variable {
    /// Signed integer value
    Int(i32),
    /// Unsigned 64-bit value
    UInt64(u64),
    /// Floating point value
    Double(f64),
    /// Text value
    String(String),
}

impl Variable {
    /// Which kind this value is.
    pub fn kind(&self) -> VariableKind {
        match self {
            Self::Int(_) => VariableKind::Int,
            Self::UInt64(_) => VariableKind::UInt64,
            Self::Double(_) => VariableKind::Double,
            Self::String(_) => VariableKind::String,
        }
    }

    /// The value as `i32`, if it is one.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as `u64`, if it is one.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt64(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as `f64`, if it is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as text, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::UInt64(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
            Self::String(v) => f.write_str(v),
        }
    }
}

impl From<i32> for Variable {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Variable {
    fn from(v: u64) -> Self {
        Self::UInt64(v)
    }
}

impl From<f64> for Variable {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<String> for Variable {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Variable {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}
