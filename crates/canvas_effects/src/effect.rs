// SPDX-License-Identifier: MIT OR Apache-2.0
//! The effect node: one device-backed stage of an image graph.
//!
//! An [`Effect`] realizes its native resource lazily, on the device context
//! it is first resolved against. On every resolve it compares the context's
//! [`DeviceIdentity`] with the one it was realized on; a mismatch drops the
//! resource and rebuilds it, which is how device loss is recovered without
//! caller involvement.
//!
//! Properties and inputs are only pushed into the resource when their store
//! is marked changed, or when the resource is new (a fresh native effect
//! starts from its own defaults, so everything must be pushed).
//!
//! Resolution is synchronous and depth-first through the inputs. An effect
//! that is reached again while it is already being resolved (a cycle in the
//! graph, or an unsynchronized resolve from another thread) fails with
//! [`EffectError::Reentrant`].

use crate::error::{EffectError, Result, Slot};
use crate::image::{EffectInput, ImageSource};
use crate::marshal;
use crate::native::{DeviceContext, DeviceIdentity, EffectId, ImageHandle, NativeEffect};
use crate::slots::{InputStore, PropertyStore};
use crate::value::PropertyValue;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Native resource cache, valid for one device
#[derive(Default)]
struct NativeState {
    device: Option<DeviceIdentity>,
    resource: Option<Box<dyn NativeEffect>>,
}

/// A node in an effect graph
pub struct Effect {
    effect_id: EffectId,
    properties: PropertyStore,
    inputs: InputStore,
    native: Mutex<NativeState>,
}

impl Effect {
    /// Create an effect of kind `effect_id`.
    ///
    /// The property store starts with `property_count` empty slots and can
    /// grow. The input store starts with `input_count` empty slots and grows
    /// only if `fixed_inputs` is false. Inputs start out changed, so the
    /// first resolve always wires them.
    pub fn new(effect_id: EffectId, property_count: u32, input_count: u32, fixed_inputs: bool) -> Arc<Self> {
        let inputs = InputStore::new(input_count, fixed_inputs);
        inputs.set_changed(true);

        Arc::new(Self {
            effect_id,
            properties: PropertyStore::new(property_count, false),
            inputs,
            native: Mutex::new(NativeState::default()),
        })
    }

    /// The effect kind
    pub fn effect_id(&self) -> EffectId {
        self.effect_id
    }

    /// Live handle to the property store
    pub fn properties(&self) -> PropertyStore {
        self.properties.clone()
    }

    /// Live handle to the input store
    pub fn inputs(&self) -> InputStore {
        self.inputs.clone()
    }

    /// Get the input at `index`
    pub fn input(&self, index: u32) -> Result<Option<Arc<dyn EffectInput>>> {
        self.inputs.get(index)
    }

    /// Set the input at `index`
    pub fn set_input(&self, index: u32, input: Arc<dyn EffectInput>) -> Result<()> {
        self.inputs.set(index, Some(input))
    }

    /// Get the property at `index`
    pub fn property(&self, index: u32) -> Result<Option<PropertyValue>> {
        self.properties.get(index)
    }

    /// Set the property at `index`
    pub fn set_property(&self, index: u32, value: impl Into<PropertyValue>) -> Result<()> {
        self.properties.set(index, Some(value.into()))
    }

    /// Whether a native resource is currently cached
    pub fn is_realized(&self) -> bool {
        self.native.lock().resource.is_some()
    }

    /// Release the native resource.
    ///
    /// Properties and inputs are kept; the next resolve recreates the
    /// resource and pushes everything again.
    pub fn close(&self) {
        let mut native = self.native.lock();
        if native.resource.take().is_some() {
            tracing::debug!("Released native effect {}", self.effect_id);
        }
        native.device = None;
    }

    /// Resolve this effect and its inputs into a native image on `context`
    pub fn resolve(&self, context: &dyn DeviceContext) -> Result<ImageHandle> {
        self.resolve_optional(Some(context))
    }

    /// Resolve against a context that may be absent
    pub fn resolve_optional(&self, context: Option<&dyn DeviceContext>) -> Result<ImageHandle> {
        let context = context.ok_or(EffectError::InvalidArgument("device context"))?;
        let mut native = self.native.try_lock().ok_or(EffectError::Reentrant)?;

        let identity = context.device().identity();
        if native.device.as_ref() != Some(&identity) {
            if native.resource.take().is_some() {
                tracing::debug!("Device changed, recreating native effect {}", self.effect_id);
            }
            native.device = Some(identity);
        }

        let (mut resource, recreated) = match native.resource.take() {
            Some(resource) => (resource, false),
            None => {
                let created = context
                    .create_effect(self.effect_id)
                    .map_err(|source| EffectError::NativeCreation {
                        effect_id: self.effect_id,
                        source,
                    })?;
                tracing::debug!("Created native effect {}", self.effect_id);
                (created, true)
            }
        };

        let result = self.update(&mut *resource, context, recreated);
        // A resource that failed its first full push is dropped, so the next
        // resolve starts over with a fresh one.
        if result.is_ok() || !recreated {
            native.resource = Some(resource);
        }
        result
    }

    fn update(&self, resource: &mut dyn NativeEffect, context: &dyn DeviceContext, recreated: bool) -> Result<ImageHandle> {
        if recreated || self.properties.is_changed() {
            self.properties.flush(|slots| marshal::push_slots(&mut *resource, slots))?;
        }

        // Resolving an input may write to this store: the flag is cleared
        // together with the copy and set again if wiring fails.
        if recreated || self.inputs.is_changed() {
            let inputs = self.inputs.take_snapshot();
            if let Err(e) = self.wire_inputs(resource, context, &inputs) {
                self.inputs.set_changed(true);
                return Err(e);
            }
        }

        resource.image().ok_or(EffectError::NativeInterface)
    }

    fn wire_inputs(
        &self,
        resource: &mut dyn NativeEffect,
        context: &dyn DeviceContext,
        inputs: &[Option<Arc<dyn EffectInput>>],
    ) -> Result<()> {
        resource.set_input_count(inputs.len() as u32)?;

        for (index, input) in inputs.iter().enumerate() {
            let index = index as u32;
            let input = input.as_ref().ok_or(EffectError::NullReference {
                slot: Slot::Input(index),
            })?;
            let source = input
                .as_image_source()
                .ok_or(EffectError::TypeMismatch { index })?;

            let image = source.resolve(context)?;
            resource.set_input(index, image)?;
            tracing::trace!("Wired input {} = {:?} into {}", index, image, self.effect_id);
        }

        Ok(())
    }
}

impl ImageSource for Effect {
    fn resolve(&self, context: &dyn DeviceContext) -> Result<ImageHandle> {
        self.resolve_optional(Some(context))
    }
}

impl EffectInput for Effect {
    fn as_image_source(&self) -> Option<&dyn ImageSource> {
        Some(self)
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let realized = self.native.try_lock().map(|native| native.resource.is_some());
        f.debug_struct("Effect")
            .field("effect_id", &self.effect_id)
            .field("properties", &self.properties)
            .field("inputs", &self.inputs)
            .field("realized", &realized)
            .finish()
    }
}
