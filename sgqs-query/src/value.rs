use std::fmt;
use std::hash::{Hash, Hasher};

use serde::ser::{SerializeMap, SerializeSeq};
use sgqs_api::{GraphEdge, GraphNode, Properties, PropertyValue};

use crate::error::ErrorInfo;

/// Owned copy of a node, returned when a query projects a bare node variable.
#[derive(Debug, Clone)]
pub struct NodeValue {
    pub id: String,
    pub labels: Vec<String>,
    pub properties: Properties,
    pub skill: String,
    pub path: String,
}

/// Owned copy of an edge, returned when a query projects a bare relationship variable.
#[derive(Debug, Clone)]
pub struct EdgeValue {
    pub id: String,
    pub rel_type: String,
    pub source: String,
    pub target: String,
    pub properties: Properties,
}

impl From<&GraphNode> for NodeValue {
    fn from(node: &GraphNode) -> Self {
        Self {
            id: node.id.clone(),
            labels: node.labels.clone(),
            properties: node.properties.clone(),
            skill: node.skill.clone(),
            path: node.path.clone(),
        }
    }
}

impl From<&GraphEdge> for EdgeValue {
    fn from(edge: &GraphEdge) -> Self {
        Self {
            id: edge.id.clone(),
            rel_type: edge.rel_type.clone(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            properties: edge.properties.clone(),
        }
    }
}

// Entities are identified by id within one graph.
impl PartialEq for NodeValue {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for NodeValue {}

impl PartialEq for EdgeValue {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EdgeValue {}

impl Hash for NodeValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Hash for EdgeValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl serde::Serialize for NodeValue {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("labels", &self.labels)?;
        map.serialize_entry("properties", &self.properties)?;
        map.serialize_entry("skill", &self.skill)?;
        map.serialize_entry("path", &self.path)?;
        map.end()
    }
}

impl serde::Serialize for EdgeValue {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("type", &self.rel_type)?;
        map.serialize_entry("source", &self.source)?;
        map.serialize_entry("target", &self.target)?;
        map.serialize_entry("properties", &self.properties)?;
        map.end()
    }
}

/// Equality and hashing are structural, with floats compared by bit
/// pattern so that DISTINCT and grouping see `NaN` as one value and keep
/// `0.0` apart from `-0.0`. Query `=` goes through the evaluator instead.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Node(NodeValue),
    Edge(EdgeValue),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Node(_) => "node",
            Value::Edge(_) => "relationship",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<&PropertyValue> for Value {
    fn from(value: &PropertyValue) -> Self {
        match value {
            PropertyValue::Null => Value::Null,
            PropertyValue::Bool(b) => Value::Bool(*b),
            PropertyValue::Int(i) => Value::Int(*i),
            PropertyValue::Float(f) => Value::Float(*f),
            PropertyValue::String(s) => Value::String(s.clone()),
            PropertyValue::List(items) => {
                Value::List(items.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::String(s) => s.hash(state),
            Value::List(l) => l.hash(state),
            Value::Node(n) => n.hash(state),
            Value::Edge(e) => e.hash(state),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Node(a), Value::Node(b)) => a == b,
            (Value::Edge(a), Value::Edge(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(list) => {
                let mut seq = serializer.serialize_seq(Some(list.len()))?;
                for item in list {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Node(node) => serde::Serialize::serialize(node, serializer),
            Value::Edge(edge) => serde::Serialize::serialize(edge, serializer),
        }
    }
}

/// Text rendering used for tabular output: strings are written raw, NULL
/// as an empty cell, and structured values as compact JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => f.write_str(s),
            Value::List(_) | Value::Node(_) | Value::Edge(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

/// One output row: column name to value, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Row {
    cols: Vec<(String, Value)>,
}

impl Row {
    pub fn new(cols: Vec<(String, Value)>) -> Self {
        Self { cols }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.cols.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        if let Some((_k, v)) = self.cols.iter_mut().find(|(k, _)| *k == name) {
            *v = value;
        } else {
            self.cols.push((name, value));
        }
        self
    }

    pub fn columns(&self) -> &[(String, Value)] {
        &self.cols
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.cols.iter().map(|(_, v)| v)
    }
}

impl serde::Serialize for Row {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cols.len()))?;
        for (name, value) in &self.cols {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Tabular query output plus recoverable errors and warnings.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub errors: Vec<ErrorInfo>,
}

impl QueryResult {
    /// True when `errors` holds anything other than warnings.
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(|e| !e.is_warning())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ErrorInfo> {
        self.errors.iter().filter(|e| e.is_warning())
    }
}
