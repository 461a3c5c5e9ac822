use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a node or edge. Stable and unique within one graph.
pub type EntityId = String;

/// Property value types for nodes and edges.
///
/// Documentation graphs only carry flat front-matter values:
/// - Null: missing or explicitly null values
/// - Bool: true/false
/// - Int: 64-bit signed integers
/// - Float: 64-bit floating point
/// - String: UTF-8 strings
/// - List: inline string lists such as `keywords: [a, b]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<String>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(value: Vec<String>) -> Self {
        PropertyValue::List(value)
    }
}

pub type Properties = IndexMap<String, PropertyValue>;

/// A document (or skill) in the graph.
///
/// Labels are stored without the leading colon used in queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: EntityId,
    pub labels: Vec<String>,
    pub properties: Properties,
    /// Provenance tag: the skill directory the node was extracted from.
    pub skill: String,
    /// Path relative to the graph root.
    pub path: String,
}

impl GraphNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            labels: Vec::new(),
            properties: Properties::new(),
            skill: String::new(),
            path: String::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skill = skill.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// A directed, typed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub rel_type: String,
    pub source: EntityId,
    pub target: EntityId,
    pub properties: Properties,
}

impl GraphEdge {
    /// Creates an edge whose id is derived as `source--TYPE--target`.
    pub fn new(
        source: impl Into<String>,
        rel_type: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        let source = source.into();
        let rel_type = rel_type.into();
        let target = target.into();
        Self {
            id: format!("{source}--{rel_type}--{target}"),
            rel_type,
            source,
            target,
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("edge {edge} references missing node {endpoint}")]
    DanglingEdge { edge: EntityId, endpoint: EntityId },
}

/// In-memory documentation graph.
///
/// Nodes keep insertion order, and so do the adjacency lists, which makes
/// every scan over the graph deterministic.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Graph {
    nodes: IndexMap<EntityId, GraphNode>,
    edges: Vec<GraphEdge>,
    #[serde(skip)]
    edge_by_id: HashMap<EntityId, usize>,
    #[serde(skip)]
    outbound: HashMap<EntityId, Vec<usize>>,
    #[serde(skip)]
    inbound: HashMap<EntityId, Vec<usize>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node, replacing any previous node with the same id in place.
    pub fn add_node(&mut self, node: GraphNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Inserts an edge.
    ///
    /// Returns `Ok(false)` when an edge with the same id already exists and
    /// an error when either endpoint is not a node of this graph.
    pub fn add_edge(&mut self, edge: GraphEdge) -> Result<bool, GraphError> {
        for endpoint in [&edge.source, &edge.target] {
            if !self.nodes.contains_key(endpoint) {
                return Err(GraphError::DanglingEdge {
                    edge: edge.id.clone(),
                    endpoint: endpoint.clone(),
                });
            }
        }
        if self.edge_by_id.contains_key(&edge.id) {
            return Ok(false);
        }

        let idx = self.edges.len();
        self.edge_by_id.insert(edge.id.clone(), idx);
        self.outbound.entry(edge.source.clone()).or_default().push(idx);
        self.inbound.entry(edge.target.clone()).or_default().push(idx);
        self.edges.push(edge);
        Ok(true)
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &str) -> Option<&GraphEdge> {
        self.edge_by_id.get(id).map(|&idx| &self.edges[idx])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter()
    }

    pub fn outgoing<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a GraphEdge> + use<'a> {
        self.adjacent(&self.outbound, id)
    }

    pub fn incoming<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a GraphEdge> + use<'a> {
        self.adjacent(&self.inbound, id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn adjacent<'a>(
        &'a self,
        index: &'a HashMap<EntityId, Vec<usize>>,
        id: &str,
    ) -> impl Iterator<Item = &'a GraphEdge> + use<'a> {
        index
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.edges[idx])
    }
}

/// A read-only view of a documentation graph.
///
/// The query executor only ever reads through this trait. Implementors must
/// iterate in a stable order so identical queries give identical results.
pub trait GraphSnapshot {
    /// All nodes, in insertion order.
    fn nodes(&self) -> Box<dyn Iterator<Item = &GraphNode> + '_>;

    /// Lookup a node by id.
    fn node(&self, id: &str) -> Option<&GraphNode>;

    /// Edges whose source is `id`.
    fn outgoing(&self, id: &str) -> Box<dyn Iterator<Item = &GraphEdge> + '_>;

    /// Edges whose target is `id`.
    fn incoming(&self, id: &str) -> Box<dyn Iterator<Item = &GraphEdge> + '_>;

    /// Get the number of nodes.
    ///
    /// The default implementation counts `nodes()`.
    fn node_count(&self) -> usize {
        self.nodes().count()
    }
}

impl GraphSnapshot for Graph {
    fn nodes(&self) -> Box<dyn Iterator<Item = &GraphNode> + '_> {
        Box::new(Graph::nodes(self))
    }

    fn node(&self, id: &str) -> Option<&GraphNode> {
        Graph::node(self, id)
    }

    fn outgoing(&self, id: &str) -> Box<dyn Iterator<Item = &GraphEdge> + '_> {
        Box::new(Graph::outgoing(self, id))
    }

    fn incoming(&self, id: &str) -> Box<dyn Iterator<Item = &GraphEdge> + '_> {
        Box::new(Graph::incoming(self, id))
    }

    fn node_count(&self) -> usize {
        Graph::node_count(self)
    }
}

/// Produces a graph snapshot from a content directory.
///
/// The engine never re-invokes a builder; freshness is the caller's concern.
pub trait GraphBuilder {
    type Error;

    fn build(&self, root: &Path) -> Result<Graph, Self::Error>;
}
