//! Edge records and synaptic edge types.
use serde::{Deserialize, Serialize};

/// Synaptic properties shared by a group of edges.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct EdgeType {
    /// The weight of every synapse of this type.
    pub syn_weight: f64,
    /// The transmission delay, in milliseconds.
    pub delay: f64,
    /// Dynamics-parameters filename consumed by the simulator backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamics_params: Option<String>,
    /// Simulator template identifier, e.g. "static_synapse".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_template: Option<String>,
}

impl EdgeType {
    pub fn new(syn_weight: f64, delay: f64) -> Self {
        EdgeType {
            syn_weight,
            delay,
            dynamics_params: None,
            model_template: None,
        }
    }

    pub fn dynamics_params(mut self, params: impl Into<String>) -> Self {
        self.dynamics_params = Some(params.into());
        self
    }

    pub fn model_template(mut self, template: impl Into<String>) -> Self {
        self.model_template = Some(template.into());
        self
    }
}

/// A built connection between a source and a target node.
///
/// The owning [`EdgeGroup`](crate::builder::EdgeGroup) header carries the
/// edge-type ID and the source/target population names.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// The ID of the node producing spikes.
    pub source_id: usize,
    /// The ID of the node receiving spikes.
    pub target_id: usize,
    /// The number of synapses realizing the connection.
    pub nsyns: usize,
}

impl Edge {
    pub fn new(source_id: usize, target_id: usize, nsyns: usize) -> Self {
        Edge {
            source_id,
            target_id,
            nsyns,
        }
    }
}
