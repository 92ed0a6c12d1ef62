// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dynamically typed property values.

use serde::{Deserialize, Serialize};

/// Type tag of a property value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    /// Unsigned 32-bit integer
    UInt32,
    /// Single-precision float
    Float,
    /// Array of single-precision floats
    FloatArray,
    /// Boolean
    Bool,
    /// Signed 32-bit integer
    Int32,
    /// String
    String,
}

/// Value stored in a property slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Unsigned 32-bit integer (enum selectors, counts)
    UInt32(u32),
    /// Single-precision float
    Float(f32),
    /// Float array; the length selects the native encoding
    FloatArray(Vec<f32>),
    /// Boolean
    Bool(bool),
    /// Signed 32-bit integer
    Int32(i32),
    /// String
    String(String),
}

impl PropertyValue {
    /// Get the type tag for this value
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::UInt32(_) => PropertyType::UInt32,
            Self::Float(_) => PropertyType::Float,
            Self::FloatArray(_) => PropertyType::FloatArray,
            Self::Bool(_) => PropertyType::Bool,
            Self::Int32(_) => PropertyType::Int32,
            Self::String(_) => PropertyType::String,
        }
    }

    /// Get the value as `u32`, if it is one
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::UInt32(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as `f32`, if it is one
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Borrow the value as a float slice, if it is an array
    pub fn as_float_array(&self) -> Option<&[f32]> {
        match self {
            Self::FloatArray(v) => Some(v),
            _ => None,
        }
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        Self::UInt32(value)
    }
}

impl From<f32> for PropertyValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Int32(value)
    }
}

impl From<Vec<f32>> for PropertyValue {
    fn from(value: Vec<f32>) -> Self {
        Self::FloatArray(value)
    }
}

impl<const N: usize> From<[f32; N]> for PropertyValue {
    fn from(value: [f32; N]) -> Self {
        Self::FloatArray(value.to_vec())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}
