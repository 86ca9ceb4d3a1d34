//! Relationship (edge) between two chunks.

use serde::{Deserialize, Serialize};
use super::{NodeId, PropertyMap, Value};

/// Label of an edge pointing at the preceding chunk.
pub const PREV: &str = "PREV";
/// Label of an edge pointing at the following chunk.
pub const NEXT: &str = "NEXT";
/// Label of an edge pointing at a semantically similar chunk.
pub const SIMILAR: &str = "SIMILAR";

/// Opaque relationship identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelId(pub u64);

impl std::fmt::Display for RelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sequential traversal direction along a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Prev,
    Next,
}

impl Direction {
    /// The relationship label that encodes this direction.
    pub fn label(self) -> &'static str {
        match self {
            Direction::Prev => PREV,
            Direction::Next => NEXT,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Prev => Direction::Next,
            Direction::Next => Direction::Prev,
        }
    }
}

/// A directed, labeled edge. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelId,
    pub src: NodeId,
    pub dst: NodeId,
    pub label: String,
    pub properties: PropertyMap,
}

impl Relationship {
    pub fn new(id: RelId, src: NodeId, dst: NodeId, label: impl Into<String>) -> Self {
        Self {
            id,
            src,
            dst,
            label: label.into(),
            properties: PropertyMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.label == label
    }

    /// Similarity score, if the edge carries a numeric `score` property.
    pub fn score(&self) -> Option<f64> {
        self.properties.get("score").and_then(Value::as_float)
    }
}
