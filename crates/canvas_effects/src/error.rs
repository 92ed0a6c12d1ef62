// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for effect resolution.

use crate::native::EffectId;
use std::fmt;

/// Result alias used throughout the crate
pub type Result<T, E = EffectError> = std::result::Result<T, E>;

/// Identifies which store an empty slot was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Property slot at the given index
    Property(u32),
    /// Input slot at the given index
    Input(u32),
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property(index) => write!(f, "property {index}"),
            Self::Input(index) => write!(f, "input {index}"),
        }
    }
}

/// Error reported by a native device or resource
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct NativeError {
    /// Human readable description from the backend
    pub message: String,
}

impl NativeError {
    /// Create a new native error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error during effect construction, mutation or resolution
#[derive(Debug, thiserror::Error)]
pub enum EffectError {
    /// A required reference was absent
    #[error("Invalid argument: {0} is required")]
    InvalidArgument(&'static str),

    /// A property or input slot was empty when it had to be pushed
    #[error("Null reference: {slot} is not set")]
    NullReference {
        /// The empty slot
        slot: Slot,
    },

    /// Index outside the bounds of a store
    #[error("Index {index} is out of range (size {len})")]
    OutOfRange {
        /// Requested index
        index: u32,
        /// Current store size
        len: u32,
    },

    /// An input does not support image resolution
    #[error("Effect input #{index} is an unsupported type")]
    TypeMismatch {
        /// Offending input slot
        index: u32,
    },

    /// A property value has a shape the native side cannot take
    #[error("Property {index} has an unsupported shape: {shape}")]
    NotSupported {
        /// Offending property slot
        index: u32,
        /// Description of the rejected shape
        shape: String,
    },

    /// The device refused to create the native effect
    #[error("Failed to create native effect {effect_id}: {source}")]
    NativeCreation {
        /// Effect kind that failed
        effect_id: EffectId,
        /// Backend error
        #[source]
        source: NativeError,
    },

    /// The native resource does not expose an image view
    #[error("Native effect does not expose an image")]
    NativeInterface,

    /// A native push (value or input) failed
    #[error("Native call failed: {0}")]
    Native(#[from] NativeError),

    /// The effect is already being resolved (graph cycle or concurrent resolve)
    #[error("Effect is already being resolved; the graph contains a cycle or is resolved concurrently")]
    Reentrant,
}
