// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registry of effect kinds.

use crate::effect::Effect;
use crate::error::Result;
use crate::native::EffectId;
use crate::value::PropertyValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Description of an effect kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDescriptor {
    /// Native effect kind
    pub id: EffectId,
    /// Display name
    pub name: String,
    /// Number of property slots
    pub property_count: u32,
    /// Number of input slots
    pub input_count: u32,
    /// Whether the input count is fixed
    #[serde(default)]
    pub fixed_inputs: bool,
    /// Default property values by slot
    #[serde(default)]
    pub defaults: Vec<(u32, PropertyValue)>,
}

impl EffectDescriptor {
    /// Create a descriptor with no default values
    pub fn new(id: EffectId, name: impl Into<String>, property_count: u32, input_count: u32, fixed_inputs: bool) -> Self {
        Self {
            id,
            name: name.into(),
            property_count,
            input_count,
            fixed_inputs,
            defaults: Vec::new(),
        }
    }

    /// Add a default property value
    pub fn with_default(mut self, index: u32, value: impl Into<PropertyValue>) -> Self {
        self.defaults.push((index, value.into()));
        self
    }

    /// Create an effect of this kind with its default values applied
    pub fn instantiate(&self) -> Result<Arc<Effect>> {
        let effect = Effect::new(self.id, self.property_count, self.input_count, self.fixed_inputs);
        let properties = effect.properties();
        for (index, value) in &self.defaults {
            properties.set(*index, Some(value.clone()))?;
        }
        Ok(effect)
    }
}

/// Registry of available effect kinds
#[derive(Debug)]
pub struct EffectRegistry {
    /// Registered descriptors by ID
    descriptors: IndexMap<EffectId, EffectDescriptor>,
}

impl EffectRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            descriptors: IndexMap::new(),
        }
    }

    /// Register an effect kind, replacing any previous one with the same ID
    pub fn register(&mut self, descriptor: EffectDescriptor) {
        self.descriptors.insert(descriptor.id, descriptor);
    }

    /// Get a descriptor by ID
    pub fn get(&self, id: EffectId) -> Option<&EffectDescriptor> {
        self.descriptors.get(&id)
    }

    /// Find a descriptor by display name
    pub fn find(&self, name: &str) -> Option<&EffectDescriptor> {
        self.descriptors.values().find(|d| d.name == name)
    }

    /// All descriptors, in registration order
    pub fn descriptors(&self) -> impl Iterator<Item = &EffectDescriptor> {
        self.descriptors.values()
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Create an effect from a registered ID
    pub fn create(&self, id: EffectId) -> Option<Result<Arc<Effect>>> {
        self.get(id).map(EffectDescriptor::instantiate)
    }
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<EffectDescriptor> for EffectRegistry {
    fn from_iter<I: IntoIterator<Item = EffectDescriptor>>(iter: I) -> Self {
        let mut registry = Self::new();
        for descriptor in iter {
            registry.register(descriptor);
        }
        registry
    }
}
