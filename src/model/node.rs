//! Node (document chunk) in the knowledge graph.

use serde::{Deserialize, Serialize};
use super::{PropertyMap, Value};

/// Separator placed between chunk contents when a context window is merged.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Opaque node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Node label: a whole document or a chunk split from one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Doc,
    #[default]
    Chunk,
}

/// Granularity level of a node within its document hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeLevel {
    Level0,
    Level1,
    Level2,
}

impl NodeLevel {
    /// The next finer level, or `None` at the leaf level.
    pub fn next_level(self) -> Option<NodeLevel> {
        match self {
            NodeLevel::Level0 => Some(NodeLevel::Level1),
            NodeLevel::Level1 => Some(NodeLevel::Level2),
            NodeLevel::Level2 => None,
        }
    }
}

/// A document chunk. Immutable once it has been added to a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Identifier of the source document this chunk was split from.
    pub doc_id: String,
    pub content: String,
    pub label: NodeType,
    pub level: Option<NodeLevel>,
    pub properties: PropertyMap,
}

impl Node {
    pub fn new(id: NodeId, doc_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            doc_id: doc_id.into(),
            content: content.into(),
            label: NodeType::Chunk,
            level: None,
            properties: PropertyMap::new(),
        }
    }

    pub fn with_label(mut self, label: NodeType) -> Self {
        self.label = label;
        self
    }

    pub fn with_level(mut self, level: NodeLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// Concatenate node contents in order, separated by a blank line.
pub fn merge_contents<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> String {
    nodes
        .into_iter()
        .map(|n| n.content.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}
