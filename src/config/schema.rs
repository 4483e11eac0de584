//! YAML schema for a forward/backward run

use crate::autograd::GraphConfig;
use serde::{Deserialize, Serialize};

/// Parsed YAML run file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSpec {
    /// Model architecture
    pub model: ModelSpec,

    /// Input batch, one row per sample
    pub input: Vec<Vec<f32>>,

    /// Seed for weight initialisation; drawn from the OS when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Graph settings
    #[serde(default)]
    pub graph: GraphConfig,
}

/// Ordered layer list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub layers: Vec<LayerSpec>,
}

/// One layer, tagged by `type`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerSpec {
    Dense {
        in_features: usize,
        out_features: usize,
    },
    Relu,
}
