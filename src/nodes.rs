//! Node records, node-type property tables, and filters over them.
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Excitatory/inhibitory tag of a node type.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Ei {
    #[serde(rename = "e")]
    Exc,
    #[serde(rename = "i")]
    Inh,
}

impl fmt::Display for Ei {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Ei::Exc => write!(f, "e"),
            Ei::Inh => write!(f, "i"),
        }
    }
}

/// How the simulator backend instantiates nodes of a type.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum ModelType {
    /// A point-process neuron simulated by the backend.
    #[serde(rename = "point_process")]
    PointProcess,
    /// A virtual node that only produces externally supplied spikes.
    #[serde(rename = "virtual")]
    Virtual,
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelType::PointProcess => write!(f, "point_process"),
            ModelType::Virtual => write!(f, "virtual"),
        }
    }
}

/// Properties shared by a group of nodes.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct NodeType {
    /// Human-readable model name, e.g. "Scnn1a".
    pub model_name: String,
    /// Excitatory/inhibitory tag.
    pub ei: Ei,
    /// Instantiation kind on the simulator side.
    pub model_type: ModelType,
    /// Simulator template identifier, e.g. "nest:glif_lif_asc_psc".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_template: Option<String>,
    /// Dynamics-parameters filename consumed by the simulator backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamics_params: Option<String>,
    /// Extra free-form tags, e.g. "orig_model" -> "glif".
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
}

impl NodeType {
    pub fn new(model_name: impl Into<String>, ei: Ei, model_type: ModelType) -> Self {
        NodeType {
            model_name: model_name.into(),
            ei,
            model_type,
            model_template: None,
            dynamics_params: None,
            attrs: BTreeMap::new(),
        }
    }

    pub fn model_template(mut self, template: impl Into<String>) -> Self {
        self.model_template = Some(template.into());
        self
    }

    pub fn dynamics_params(mut self, params: impl Into<String>) -> Self {
        self.dynamics_params = Some(params.into());
        self
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// The value of a named property, uniformly as a string.
    /// Built-in fields take precedence over free-form attributes.
    pub fn property(&self, key: &str) -> Option<String> {
        match key {
            "model_name" => Some(self.model_name.clone()),
            "ei" => Some(self.ei.to_string()),
            "model_type" => Some(self.model_type.to_string()),
            "model_template" => self.model_template.clone(),
            "dynamics_params" => self.dynamics_params.clone(),
            _ => self.attrs.get(key).cloned(),
        }
    }
}

/// A single node of the network.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Population-local ID, dense from 0.
    pub node_id: usize,
    /// Index into the population's node-type table.
    pub node_type_id: usize,
    /// Position in space, if the node is placed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[f64; 3]>,
    /// Rotation angle around the y axis, in radians.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_angle_yaxis: Option<f64>,
    /// Rotation angle around the z axis, in radians.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_angle_zaxis: Option<f64>,
}

/// A conjunctive filter over node-type properties.
///
/// # Examples
///
/// ```
/// use pointnet::nodes::{Ei, NodeFilter, NodeType, ModelType};
///
/// let node_type = NodeType::new("Scnn1a", Ei::Exc, ModelType::PointProcess)
///     .attr("orig_model", "glif");
///
/// let filter = NodeFilter::new().ei(Ei::Exc).attr("orig_model", "glif");
/// assert!(filter.matches(&node_type));
///
/// let filter = NodeFilter::new().ei(Ei::Inh);
/// assert!(!filter.matches(&node_type));
/// ```
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct NodeFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ei: Option<Ei>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model_type: Option<ModelType>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attrs: BTreeMap<String, String>,
}

impl NodeFilter {
    /// Create an empty filter, which matches every node type.
    pub fn new() -> Self {
        NodeFilter::default()
    }

    pub fn model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    pub fn ei(mut self, ei: Ei) -> Self {
        self.ei = Some(ei);
        self
    }

    pub fn model_type(mut self, model_type: ModelType) -> Self {
        self.model_type = Some(model_type);
        self
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Whether all constraints of the filter hold for a node type.
    pub fn matches(&self, node_type: &NodeType) -> bool {
        if let Some(model_name) = &self.model_name {
            if *model_name != node_type.model_name {
                return false;
            }
        }
        if let Some(ei) = self.ei {
            if ei != node_type.ei {
                return false;
            }
        }
        if let Some(model_type) = self.model_type {
            if model_type != node_type.model_type {
                return false;
            }
        }
        self.attrs
            .iter()
            .all(|(key, value)| node_type.attrs.get(key) == Some(value))
    }
}

/// A materialized selection of nodes from a single population.
#[derive(Debug, PartialEq, Clone)]
pub struct NodeSet {
    /// The population the nodes belong to.
    pub population: String,
    /// The selected nodes.
    pub nodes: Vec<Node>,
}

impl NodeSet {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
