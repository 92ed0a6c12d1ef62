// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless software device.
//!
//! Implements the [`native`](crate::native) contract without a GPU. Effects
//! render nothing; every native call is appended to a shared [`CallLog`].
//! Useful as a test double and for tracing what a graph resolve actually
//! sends to a device.

use crate::error::NativeError;
use crate::native::{Device, DeviceContext, DeviceIdentity, EffectId, ImageHandle, NativeEffect, NativeValue};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// A native call made against a software device
#[derive(Debug, Clone, PartialEq)]
pub enum NativeCall {
    /// A native effect was created
    CreateEffect {
        /// Effect kind
        effect_id: EffectId,
        /// Image handle of the new resource
        image: ImageHandle,
    },
    /// A property value was pushed
    SetValue {
        /// Target resource
        image: ImageHandle,
        /// Property slot
        index: u32,
        /// Pushed value
        value: NativeValue,
    },
    /// The input count was set
    SetInputCount {
        /// Target resource
        image: ImageHandle,
        /// New input count
        count: u32,
    },
    /// An input image was wired in
    SetInput {
        /// Target resource
        image: ImageHandle,
        /// Input slot
        index: u32,
        /// Wired image
        input: ImageHandle,
    },
    /// A native effect was released
    Release {
        /// Released resource
        image: ImageHandle,
    },
}

/// Shared, append-only record of native calls
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<NativeCall>>>,
}

impl CallLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: NativeCall) {
        self.calls.lock().push(call);
    }

    /// Copy of all recorded calls
    pub fn calls(&self) -> Vec<NativeCall> {
        self.calls.lock().clone()
    }

    /// Number of recorded calls
    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }

    /// Forget all recorded calls
    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    /// Count calls matching a predicate
    pub fn count(&self, predicate: impl Fn(&NativeCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|&call| predicate(call)).count()
    }

    /// Number of effect creations
    pub fn creations(&self) -> usize {
        self.count(|call| matches!(call, NativeCall::CreateEffect { .. }))
    }

    /// Number of property pushes
    pub fn value_pushes(&self) -> usize {
        self.count(|call| matches!(call, NativeCall::SetValue { .. }))
    }

    /// Number of input wirings, including input count updates
    pub fn input_pushes(&self) -> usize {
        self.count(|call| matches!(call, NativeCall::SetInput { .. } | NativeCall::SetInputCount { .. }))
    }

    /// Number of property and input pushes combined
    pub fn pushes(&self) -> usize {
        self.value_pushes() + self.input_pushes()
    }
}

/// Software rendering device
#[derive(Debug)]
pub struct SoftwareDevice {
    this: Weak<SoftwareDevice>,
    log: CallLog,
    next_image: Arc<AtomicU64>,
    rejected: Mutex<HashSet<EffectId>>,
    imageless: Mutex<HashSet<EffectId>>,
}

impl SoftwareDevice {
    /// Create a device with its own call log
    pub fn new() -> Arc<Self> {
        Self::with_log(CallLog::new())
    }

    /// Create a device that records into an existing log.
    ///
    /// Image handles are still unique per device; use [`replace`](Self::replace)
    /// to keep them unique across a device and its successor.
    pub fn with_log(log: CallLog) -> Arc<Self> {
        Self::build(log, Arc::new(AtomicU64::new(1)))
    }

    fn build(log: CallLog, next_image: Arc<AtomicU64>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            log,
            next_image,
            rejected: Mutex::new(HashSet::new()),
            imageless: Mutex::new(HashSet::new()),
        })
    }

    /// Create a new device instance standing in for this one after a device
    /// loss. It shares the call log and image numbering but has a distinct
    /// identity.
    pub fn replace(&self) -> Arc<Self> {
        Self::build(self.log.clone(), Arc::clone(&self.next_image))
    }

    /// The call log this device records into
    pub fn log(&self) -> &CallLog {
        &self.log
    }

    /// Make effect creation fail for `effect_id`
    pub fn reject_effect(&self, effect_id: EffectId) {
        self.rejected.lock().insert(effect_id);
    }

    /// Make effects of kind `effect_id` expose no image view
    pub fn hide_image(&self, effect_id: EffectId) {
        self.imageless.lock().insert(effect_id);
    }

    /// Create a context for this device
    pub fn context(self: &Arc<Self>) -> SoftwareContext {
        SoftwareContext {
            device: Arc::clone(self),
        }
    }

    /// Allocate a fresh image handle, e.g. for an uploaded bitmap
    pub fn allocate_image(&self) -> ImageHandle {
        ImageHandle(self.next_image.fetch_add(1, Ordering::Relaxed))
    }
}

impl Device for SoftwareDevice {
    fn identity(&self) -> DeviceIdentity {
        DeviceIdentity::from_weak(self.this.clone())
    }
}

/// Context of a [`SoftwareDevice`]
#[derive(Debug, Clone)]
pub struct SoftwareContext {
    device: Arc<SoftwareDevice>,
}

impl DeviceContext for SoftwareContext {
    fn device(&self) -> &dyn Device {
        &*self.device
    }

    fn create_effect(&self, effect_id: EffectId) -> Result<Box<dyn NativeEffect>, NativeError> {
        if self.device.rejected.lock().contains(&effect_id) {
            return Err(NativeError::new(format!("effect {effect_id} is not registered")));
        }

        let image = self.device.allocate_image();
        self.device.log.record(NativeCall::CreateEffect { effect_id, image });

        Ok(Box::new(SoftwareEffect {
            image,
            exposes_image: !self.device.imageless.lock().contains(&effect_id),
            log: self.device.log.clone(),
            inputs: Vec::new(),
        }))
    }
}

/// Native effect of a [`SoftwareDevice`]
#[derive(Debug)]
pub struct SoftwareEffect {
    image: ImageHandle,
    exposes_image: bool,
    log: CallLog,
    inputs: Vec<Option<ImageHandle>>,
}

impl NativeEffect for SoftwareEffect {
    fn set_value(&mut self, index: u32, value: NativeValue) -> Result<(), NativeError> {
        self.log.record(NativeCall::SetValue {
            image: self.image,
            index,
            value,
        });
        Ok(())
    }

    fn set_input_count(&mut self, count: u32) -> Result<(), NativeError> {
        self.inputs.resize(count as usize, None);
        self.log.record(NativeCall::SetInputCount {
            image: self.image,
            count,
        });
        Ok(())
    }

    fn set_input(&mut self, index: u32, input: ImageHandle) -> Result<(), NativeError> {
        let count = self.inputs.len();
        let slot = self
            .inputs
            .get_mut(index as usize)
            .ok_or_else(|| NativeError::new(format!("input {index} out of range (count {count})")))?;
        *slot = Some(input);
        self.log.record(NativeCall::SetInput {
            image: self.image,
            index,
            input,
        });
        Ok(())
    }

    fn image(&self) -> Option<ImageHandle> {
        self.exposes_image.then_some(self.image)
    }
}

impl Drop for SoftwareEffect {
    fn drop(&mut self) {
        self.log.record(NativeCall::Release { image: self.image });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLUR: EffectId = EffectId::from_u128(1);

    #[test]
    fn test_create_and_push() {
        let device = SoftwareDevice::new();
        let context = device.context();
        let mut effect = context.create_effect(BLUR).unwrap();

        effect.set_value(0, NativeValue::Float(3.0)).unwrap();
        effect.set_input_count(1).unwrap();
        effect.set_input(0, ImageHandle(99)).unwrap();
        assert!(effect.set_input(1, ImageHandle(99)).is_err());

        assert_eq!(device.log().creations(), 1);
        assert_eq!(device.log().value_pushes(), 1);
        assert_eq!(device.log().input_pushes(), 2);
        assert!(effect.image().is_some());
    }

    #[test]
    fn test_release_on_drop() {
        let device = SoftwareDevice::new();
        let effect = device.context().create_effect(BLUR).unwrap();
        let image = effect.image().unwrap();
        drop(effect);
        assert_eq!(device.log().calls().last(), Some(&NativeCall::Release { image }));
    }

    #[test]
    fn test_rejected_and_imageless() {
        let device = SoftwareDevice::new();
        device.reject_effect(BLUR);
        assert!(device.context().create_effect(BLUR).is_err());

        let other = EffectId::from_u128(2);
        device.hide_image(other);
        assert!(device.context().create_effect(other).unwrap().image().is_none());
    }

    #[test]
    fn test_replacement_has_new_identity() {
        let device = SoftwareDevice::new();
        let replacement = device.replace();
        assert_eq!(device.identity(), device.context().device().identity());
        assert_ne!(device.identity(), replacement.identity());

        let first = device.context().create_effect(BLUR).unwrap().image();
        let second = replacement.context().create_effect(BLUR).unwrap().image();
        assert_ne!(first, second);
        assert_eq!(replacement.log().creations(), 2);
    }
}
