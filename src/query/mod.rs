//! Predicates for ad-hoc node and relationship lookups.
//!
//! These are pure matchers: the storage backend decides how to scan,
//! the predicates here decide what matches.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::model::{Node, NodeId, NodeLevel, NodeType, Relationship, Value};
use crate::{Error, Result};

// ============================================================================
// Comparison
// ============================================================================

/// Property comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Gt,
    Lt,
    Eq,
}

impl Comparison {
    /// `Gt`/`Lt` compare numerically; a non-numeric side never matches.
    pub fn matches(self, actual: &Value, expected: &Value) -> bool {
        match self {
            Comparison::Eq => actual.loose_eq(expected),
            Comparison::Gt | Comparison::Lt => {
                let (Some(a), Some(e)) = (actual.as_float(), expected.as_float()) else {
                    return false;
                };
                if self == Comparison::Gt { a > e } else { a < e }
            }
        }
    }
}

impl FromStr for Comparison {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gt" | ">" => Ok(Comparison::Gt),
            "lt" | "<" => Ok(Comparison::Lt),
            "eq" | "=" | "==" => Ok(Comparison::Eq),
            other => Err(Error::InvalidQuery(format!("invalid comparison operator: {other}"))),
        }
    }
}

/// `properties[key] <comparison> value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyPredicate {
    pub key: String,
    pub value: Value,
    pub comparison: Comparison,
}

impl PropertyPredicate {
    pub fn new(key: impl Into<String>, comparison: Comparison, value: impl Into<Value>) -> Self {
        Self { key: key.into(), value: value.into(), comparison }
    }

    /// A missing key never matches.
    pub fn matches(&self, properties: &crate::model::PropertyMap) -> bool {
        properties
            .get(&self.key)
            .is_some_and(|actual| self.comparison.matches(actual, &self.value))
    }
}

// ============================================================================
// Node query
// ============================================================================

/// Conjunctive node filter. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeQuery {
    pub ids: Option<SmallVec<[NodeId; 4]>>,
    pub label: Option<NodeType>,
    pub level: Option<NodeLevel>,
    /// Equality on a single property.
    pub property: Option<(String, Value)>,
}

impl NodeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(mut self, ids: impl IntoIterator<Item = NodeId>) -> Self {
        self.ids = Some(ids.into_iter().collect());
        self
    }

    pub fn label(mut self, label: NodeType) -> Self {
        self.label = Some(label);
        self
    }

    pub fn level(mut self, level: NodeLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.property = Some((key.into(), value.into()));
        self
    }

    pub fn matches(&self, node: &Node) -> bool {
        if let Some(ids) = &self.ids {
            if !ids.contains(&node.id) {
                return false;
            }
        }
        if self.label.is_some_and(|l| l != node.label) {
            return false;
        }
        if self.level.is_some_and(|l| Some(l) != node.level) {
            return false;
        }
        if let Some((key, value)) = &self.property {
            return node.get(key).is_some_and(|v| v.loose_eq(value));
        }
        true
    }
}

// ============================================================================
// Relationship query
// ============================================================================

/// Constraint on the target node of a relationship.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetFilter {
    pub label: Option<NodeType>,
    pub property: Option<PropertyPredicate>,
}

impl TargetFilter {
    pub fn matches(&self, target: &Node) -> bool {
        self.label.is_none_or(|l| l == target.label)
            && self.property.as_ref().is_none_or(|p| p.matches(&target.properties))
    }
}

/// Filter over the outgoing relationships of a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipQuery {
    pub label: Option<String>,
    pub property: Option<PropertyPredicate>,
    pub target: Option<TargetFilter>,
}

impl RelationshipQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn property(mut self, predicate: PropertyPredicate) -> Self {
        self.property = Some(predicate);
        self
    }

    pub fn target(mut self, target: TargetFilter) -> Self {
        self.target = Some(target);
        self
    }

    /// Match the edge itself; `target` is the node the edge points at.
    pub fn matches(&self, rel: &Relationship, target: &Node) -> bool {
        self.label.as_deref().is_none_or(|l| rel.has_label(l))
            && self.property.as_ref().is_none_or(|p| p.matches(&rel.properties))
            && self.target.as_ref().is_none_or(|t| t.matches(target))
    }
}
