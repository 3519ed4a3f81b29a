//! Scenario graph data model
//!
//! A scenario is a directed graph of typed steps ("nodes") connected by
//! edges. The model is purely structural: flattening a graph into a
//! playback sequence and dispatching steps to handlers live in
//! `waypoint-flow` and `waypoint-steps`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::error::{Error, Result};

/// One interaction unit in a scenario, typed by a step kind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Node ID (unique within a scenario)
    pub id: String,
    /// Owning scenario
    #[serde(default)]
    pub scenario_id: String,
    /// Display label
    #[serde(default)]
    pub label: String,
    /// Message template shown when the step becomes active; may contain
    /// `{{key}}` tokens resolved against the workspace context
    #[serde(default)]
    pub assistant_message: String,
    /// Dotted context location this step's result is merged into
    #[serde(default)]
    pub context_path: Option<String>,
    /// Step kind, resolved against the step registry
    pub kind: String,
    /// Free-form per-step configuration, mutated by the editor collaborator
    #[serde(default)]
    pub attrs: Value,
}

impl Node {
    /// Create a new node of the given kind
    pub fn new(id: &str, kind: &str) -> Self {
        Self {
            id: id.to_string(),
            scenario_id: String::new(),
            label: id.to_string(),
            assistant_message: String::new(),
            context_path: None,
            kind: kind.to_string(),
            attrs: Value::Null,
        }
    }

    /// Set the display label
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    /// Set the assistant message template
    pub fn with_message(mut self, message: &str) -> Self {
        self.assistant_message = message.to_string();
        self
    }

    /// Set the dotted context path results are written to
    pub fn with_context_path(mut self, path: &str) -> Self {
        self.context_path = Some(path.to_string());
        self
    }

    /// Set per-step configuration
    pub fn with_attrs(mut self, attrs: Value) -> Self {
        self.attrs = attrs;
        self
    }
}

/// A directed transition between two nodes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Edge {
    /// Source node ID
    pub source: String,
    /// Target node ID
    pub target: String,
}

impl Edge {
    /// Create a new edge
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
        }
    }
}

/// A named graph of steps forming one guided flow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    /// Unique identifier
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Step nodes, in authoring order
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Directed transitions
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// Structural findings reported by [`Scenario::validate`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Nodes with more than one outgoing edge. The default path
    /// calculator collapses branches into a single sequence, so authors
    /// are warned rather than rejected.
    pub branch_nodes: Vec<String>,
}

impl ScenarioReport {
    /// True when nothing was flagged
    pub fn is_clean(&self) -> bool {
        self.branch_nodes.is_empty()
    }
}

impl Scenario {
    /// Create a new empty scenario
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Add a node, stamping its owning scenario id
    pub fn with_node(mut self, mut node: Node) -> Self {
        node.scenario_id = self.id.clone();
        self.nodes.push(node);
        self
    }

    /// Add an edge
    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }

    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Validate the scenario structure.
    ///
    /// Duplicate node ids and edges referencing unknown nodes are errors.
    /// Multi-successor nodes are legal but reported, since the default
    /// path calculator flattens them to one sequence.
    pub fn validate(&self) -> Result<ScenarioReport> {
        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(Error::validation(format!("Duplicate node ID: {}", node.id)));
            }
        }

        for edge in &self.edges {
            if !seen.contains(edge.source.as_str()) {
                return Err(Error::validation(format!(
                    "Edge references unknown source node: {}",
                    edge.source
                )));
            }
            if !seen.contains(edge.target.as_str()) {
                return Err(Error::validation(format!(
                    "Edge references unknown target node: {}",
                    edge.target
                )));
            }
        }

        let mut report = ScenarioReport::default();
        for node in &self.nodes {
            let outgoing = self.edges.iter().filter(|e| e.source == node.id).count();
            if outgoing > 1 {
                report.branch_nodes.push(node.id.clone());
            }
        }

        Ok(report)
    }
}
