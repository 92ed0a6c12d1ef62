// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph description loaded from RON.

use canvas_effects::{EffectDescriptor, EffectError, PropertyValue};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Graph used when no file is given on the command line
pub const DEFAULT_GRAPH: &str = include_str!("../../../demos/blur_chain.ron");

/// Source wired into a node input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputRef {
    /// Output of another node, by name
    Node(String),
    /// A named static image
    Image(String),
}

/// One effect node of the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Unique node name
    pub name: String,
    /// Name of the effect kind to instantiate
    pub effect: String,
    /// Property overrides applied on top of the kind's defaults
    #[serde(default)]
    pub properties: Vec<(u32, PropertyValue)>,
    /// Inputs in slot order
    #[serde(default)]
    pub inputs: Vec<InputRef>,
}

/// Complete demo configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Effect kinds available to nodes
    pub effects: Vec<EffectDescriptor>,
    /// Names of static images the device provides
    #[serde(default)]
    pub images: Vec<String>,
    /// Effect nodes
    pub nodes: Vec<NodeConfig>,
    /// Name of the node whose image is the graph's result
    pub output: String,
    /// How many times to resolve on the first device
    #[serde(default = "default_passes")]
    pub passes: u32,
    /// How many simulated device losses to recover from
    #[serde(default)]
    pub device_resets: u32,
}

fn default_passes() -> u32 {
    2
}

impl DemoConfig {
    /// Parse a configuration from RON text
    pub fn from_ron(source: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(source)?)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron(&source)
    }
}

/// Error loading or building a graph description
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Failed to read graph file: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid RON for a graph
    #[error("Failed to parse graph file: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// A node names an effect kind that is not declared
    #[error("Node '{node}' uses unknown effect '{effect}'")]
    UnknownEffect {
        /// Node name
        node: String,
        /// Effect name
        effect: String,
    },

    /// An input refers to a node or image that does not exist
    #[error("Node '{node}' references unknown input {input:?}")]
    UnknownInput {
        /// Node name
        node: String,
        /// The dangling reference
        input: InputRef,
    },

    /// Two nodes share a name
    #[error("Duplicate node name '{0}'")]
    DuplicateNode(String),

    /// The output node does not exist
    #[error("Output node '{0}' not found")]
    MissingOutput(String),

    /// Applying a property or input failed
    #[error("Node '{node}': {source}")]
    Effect {
        /// Node name
        node: String,
        /// Underlying error
        #[source]
        source: EffectError,
    },
}
