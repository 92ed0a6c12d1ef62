// SPDX-License-Identifier: MIT OR Apache-2.0
//! Builds an effect graph from a [`DemoConfig`].

use crate::config::{ConfigError, DemoConfig, InputRef};
use canvas_effects::software::SoftwareDevice;
use canvas_effects::{Effect, EffectInput, EffectRegistry, StaticImage};
use indexmap::IndexMap;
use std::sync::Arc;

/// Instantiated graph: named effect nodes plus the output node
#[derive(Debug)]
pub struct EffectGraph {
    nodes: IndexMap<String, Arc<Effect>>,
    output: Arc<Effect>,
}

impl EffectGraph {
    /// Instantiate every node and wire the inputs.
    ///
    /// Static images are allocated on `device`.
    pub fn build(config: &DemoConfig, device: &SoftwareDevice) -> Result<Self, ConfigError> {
        let registry: EffectRegistry = config.effects.iter().cloned().collect();

        let images: IndexMap<&str, Arc<StaticImage>> = config
            .images
            .iter()
            .map(|name| (name.as_str(), Arc::new(StaticImage::new(device.allocate_image()))))
            .collect();

        let mut nodes = IndexMap::new();
        for node in &config.nodes {
            let descriptor = registry
                .find(&node.effect)
                .ok_or_else(|| ConfigError::UnknownEffect {
                    node: node.name.clone(),
                    effect: node.effect.clone(),
                })?;
            let effect = descriptor.instantiate().map_err(|source| ConfigError::Effect {
                node: node.name.clone(),
                source,
            })?;
            if nodes.insert(node.name.clone(), effect).is_some() {
                return Err(ConfigError::DuplicateNode(node.name.clone()));
            }
        }

        // Inputs are wired after every node exists so that order in the file
        // does not matter.
        for node in &config.nodes {
            let effect = &nodes[node.name.as_str()];
            let wrap = |source| ConfigError::Effect {
                node: node.name.clone(),
                source,
            };

            for (index, value) in &node.properties {
                effect.set_property(*index, value.clone()).map_err(wrap)?;
            }

            let inputs = effect.inputs();
            for (index, input) in node.inputs.iter().enumerate() {
                let source: Arc<dyn EffectInput> = match input {
                    InputRef::Node(name) => nodes.get(name.as_str()).map(|n| Arc::clone(n) as Arc<dyn EffectInput>),
                    InputRef::Image(name) => images.get(name.as_str()).map(|i| Arc::clone(i) as Arc<dyn EffectInput>),
                }
                .ok_or_else(|| ConfigError::UnknownInput {
                    node: node.name.clone(),
                    input: input.clone(),
                })?;

                let index = index as u32;
                if index < inputs.len() {
                    inputs.set(index, Some(source)).map_err(wrap)?;
                } else {
                    inputs.append(Some(source)).map_err(wrap)?;
                }
            }
        }

        let output = nodes
            .get(config.output.as_str())
            .cloned()
            .ok_or_else(|| ConfigError::MissingOutput(config.output.clone()))?;

        Ok(Self { nodes, output })
    }

    /// The node whose image is the graph's result
    pub fn output(&self) -> &Arc<Effect> {
        &self.output
    }

    /// Get a node by name
    pub fn node(&self, name: &str) -> Option<&Arc<Effect>> {
        self.nodes.get(name)
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Release every node's native resource
    pub fn close(&self) {
        self.nodes.values().for_each(|node| node.close());
    }
}
