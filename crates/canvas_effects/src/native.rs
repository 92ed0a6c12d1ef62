// SPDX-License-Identifier: MIT OR Apache-2.0
//! Native device contract.
//!
//! A rendering backend implements three traits:
//!
//! - [`Device`]: exposes a [`DeviceIdentity`] so effects can detect when the
//!   device they were realized on has been replaced (device loss, adapter
//!   switch).
//! - [`DeviceContext`]: the per-frame context effects are resolved against;
//!   creates native effect resources.
//! - [`NativeEffect`]: the device-backed effect object that receives
//!   property values and input images.
//!
//! Everything handed across this boundary is either a plain value
//! ([`NativeValue`], [`ImageHandle`]) or an opaque identity token.

use crate::error::NativeError;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Identifier of a native effect kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectId(pub Uuid);

impl EffectId {
    /// Create an effect ID from a 128-bit value
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Create a new random effect ID, for kinds defined at runtime
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0)
    }
}

/// Opaque handle to a native image produced by a backend.
///
/// Handles are assigned by backends and passed between effects without
/// interpretation by this crate.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageHandle(pub u64);

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageHandle({})", self.0)
    }
}

/// Identity of a device instance.
///
/// Compares by the identity of the device's shared allocation, not by any
/// handle value. The token holds a weak reference: it never keeps the device
/// alive, and while it exists the allocation cannot be reused by another
/// device, so a replaced device never compares equal to its predecessor.
#[derive(Clone)]
pub struct DeviceIdentity(Weak<dyn Any + Send + Sync>);

impl DeviceIdentity {
    /// Derive the identity of a shared device object
    pub fn of<T: Any + Send + Sync>(device: &Arc<T>) -> Self {
        Self::from_weak(Arc::downgrade(device))
    }

    /// Derive the identity from a weak reference to a shared device object
    pub fn from_weak<T: Any + Send + Sync>(device: Weak<T>) -> Self {
        let weak: Weak<dyn Any + Send + Sync> = device;
        Self(weak)
    }

    /// Whether the device this token refers to still exists
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl PartialEq for DeviceIdentity {
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for DeviceIdentity {}

impl fmt::Debug for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceIdentity")
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Fixed-layout value accepted by a native effect property slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeValue {
    /// Scalar unsigned integer
    UInt32(u32),
    /// Scalar float
    Float(f32),
    /// Row-major 4x4 float matrix
    Matrix4x4([f32; 16]),
}

/// A rendering device
pub trait Device: Send + Sync {
    /// Identity token of this device instance
    fn identity(&self) -> DeviceIdentity;
}

/// Context effects are resolved against
pub trait DeviceContext {
    /// The device that owns this context
    fn device(&self) -> &dyn Device;

    /// Create a native effect resource of the given kind
    fn create_effect(&self, effect_id: EffectId) -> Result<Box<dyn NativeEffect>, NativeError>;
}

/// Device-backed effect resource
pub trait NativeEffect: Send {
    /// Set the property at `index`
    fn set_value(&mut self, index: u32, value: NativeValue) -> Result<(), NativeError>;

    /// Set how many inputs the effect has
    fn set_input_count(&mut self, count: u32) -> Result<(), NativeError>;

    /// Wire an image into input slot `index`
    fn set_input(&mut self, index: u32, image: ImageHandle) -> Result<(), NativeError>;

    /// View of the effect's output as an image, if the resource supports one
    fn image(&self) -> Option<ImageHandle>;
}
