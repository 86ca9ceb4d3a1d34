//! In-memory graph store.
//!
//! This is the reference implementation of `GraphStore`.
//!
//! The graph is assembled with a [`MemoryGraphBuilder`] and frozen by
//! [`MemoryGraphBuilder::build`]. After that nodes and relationships are
//! immutable, so reads go straight to the maps without a lock and any
//! number of evolutions can share one `Arc<MemoryGraph>`. The only
//! synchronised piece is the sampling RNG.
//!
//! Use this backend for:
//! - Testing the evolution engine against a scripted corpus
//! - Embedding test-set generation in tools that already hold their chunks

use parking_lot::Mutex;
use async_trait::async_trait;
use hashbrown::HashMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::model::*;
use crate::query::{NodeQuery, RelationshipQuery};
use crate::{Error, Result};
use super::GraphStore;

// ============================================================================
// Builder
// ============================================================================

/// Mutable ingestion side of the in-memory graph.
#[derive(Debug, Default)]
pub struct MemoryGraphBuilder {
    nodes: HashMap<NodeId, Node>,
    /// Insertion order; sampling indexes into this.
    order: Vec<NodeId>,
    relationships: Vec<Relationship>,
    next_node_id: u64,
    seed: Option<u64>,
}

impl MemoryGraphBuilder {
    pub fn new() -> Self {
        Self { next_node_id: 1, ..Self::default() }
    }

    /// Fix the sampling RNG seed (reproducible test sets).
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Add a node. Its `id` is replaced by a freshly allocated one.
    pub fn add_node(&mut self, mut node: Node) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        node.id = id;
        self.nodes.insert(id, node);
        self.order.push(id);
        id
    }

    /// Add a plain chunk node.
    pub fn add_chunk(&mut self, doc_id: impl Into<String>, content: impl Into<String>) -> NodeId {
        self.add_node(Node::new(NodeId(0), doc_id, content))
    }

    /// Create a relationship between two existing nodes.
    pub fn add_relationship(
        &mut self,
        src: NodeId,
        dst: NodeId,
        label: &str,
        props: PropertyMap,
    ) -> Result<RelId> {
        if !self.nodes.contains_key(&src) {
            return Err(Error::NotFound(format!("Source node {src}")));
        }
        if !self.nodes.contains_key(&dst) {
            return Err(Error::NotFound(format!("Target node {dst}")));
        }

        let id = RelId(self.relationships.len() as u64 + 1);
        self.relationships.push(Relationship {
            id,
            src,
            dst,
            label: label.to_string(),
            properties: props,
        });
        Ok(id)
    }

    /// Chain chunks in reading order: `a -NEXT-> b` and `b -PREV-> a` for
    /// every consecutive pair.
    pub fn link_sequence(&mut self, chunks: &[NodeId]) -> Result<()> {
        for pair in chunks.windows(2) {
            self.add_relationship(pair[0], pair[1], NEXT, PropertyMap::new())?;
            self.add_relationship(pair[1], pair[0], PREV, PropertyMap::new())?;
        }
        Ok(())
    }

    /// Symmetric `SIMILAR` edges carrying `score`.
    pub fn link_similar(&mut self, a: NodeId, b: NodeId, score: f64) -> Result<()> {
        let props = PropertyMap::from([("score".to_string(), Value::Float(score))]);
        self.add_relationship(a, b, SIMILAR, props.clone())?;
        self.add_relationship(b, a, SIMILAR, props)?;
        Ok(())
    }

    /// Freeze the graph.
    pub fn build(self) -> MemoryGraph {
        let mut outgoing: HashMap<NodeId, Vec<usize>> = HashMap::new();
        let mut incoming: HashMap<NodeId, Vec<usize>> = HashMap::new();
        for (idx, rel) in self.relationships.iter().enumerate() {
            outgoing.entry(rel.src).or_default().push(idx);
            incoming.entry(rel.dst).or_default().push(idx);
        }

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        debug!(
            nodes = self.nodes.len(),
            relationships = self.relationships.len(),
            "memory graph built"
        );

        MemoryGraph {
            nodes: self.nodes,
            order: self.order,
            relationships: self.relationships,
            outgoing,
            incoming,
            rng: Mutex::new(rng),
        }
    }
}

// ============================================================================
// MemoryGraph
// ============================================================================

/// Immutable in-memory chunk graph.
#[derive(Debug)]
pub struct MemoryGraph {
    nodes: HashMap<NodeId, Node>,
    order: Vec<NodeId>,
    relationships: Vec<Relationship>,
    /// node_id → indexes into `relationships` where the node is `src`
    outgoing: HashMap<NodeId, Vec<usize>>,
    /// node_id → indexes into `relationships` where the node is `dst`
    incoming: HashMap<NodeId, Vec<usize>>,
    rng: Mutex<StdRng>,
}

impl MemoryGraph {
    pub fn builder() -> MemoryGraphBuilder {
        MemoryGraphBuilder::new()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    fn require(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or_else(|| Error::NotFound(format!("Node {id}")))
    }

    fn outgoing(&self, id: NodeId) -> impl Iterator<Item = &Relationship> {
        self.outgoing
            .get(&id)
            .into_iter()
            .flatten()
            .map(|&idx| &self.relationships[idx])
    }

    fn incoming(&self, id: NodeId) -> impl Iterator<Item = &Relationship> {
        self.incoming
            .get(&id)
            .into_iter()
            .flatten()
            .map(|&idx| &self.relationships[idx])
    }
}

// ============================================================================
// GraphStore impl
// ============================================================================

#[async_trait]
impl GraphStore for MemoryGraph {
    async fn node_count(&self) -> Result<usize> {
        Ok(self.nodes.len())
    }

    async fn get_node(&self, id: NodeId) -> Result<Option<Node>> {
        Ok(self.nodes.get(&id).cloned())
    }

    async fn sample_random(&self, k: usize) -> Result<Vec<Node>> {
        let available = self.order.len();
        if k > available {
            return Err(Error::InsufficientNodes { requested: k, available });
        }

        let picked = {
            let mut rng = self.rng.lock();
            rand::seq::index::sample(&mut *rng, available, k)
        };

        Ok(picked
            .into_iter()
            .map(|i| self.nodes[&self.order[i]].clone())
            .collect())
    }

    /// Prefers an outgoing edge labeled for `direction`; falls back to an
    /// incoming edge carrying the opposite label (`x -NEXT-> node` means `x`
    /// precedes `node`).
    async fn adjacent(&self, node: NodeId, direction: Direction) -> Result<Option<Node>> {
        self.require(node)?;

        let forward = self
            .outgoing(node)
            .find(|r| r.has_label(direction.label()))
            .map(|r| r.dst);
        let found = forward.or_else(|| {
            self.incoming(node)
                .find(|r| r.has_label(direction.opposite().label()))
                .map(|r| r.src)
        });

        Ok(found.and_then(|id| self.nodes.get(&id).cloned()))
    }

    async fn similar(&self, node: NodeId) -> Result<Vec<Node>> {
        self.require(node)?;

        let mut ranked: Vec<(Option<f64>, NodeId)> = self
            .outgoing(node)
            .filter(|r| r.has_label(SIMILAR))
            .map(|r| (r.score(), r.dst))
            .collect();
        // Highest score first; unscored edges sink to the end, ties keep insertion order.
        ranked.sort_by(|a, b| match (a.0, b.0) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        Ok(ranked
            .into_iter()
            .filter_map(|(_, id)| self.nodes.get(&id).cloned())
            .collect())
    }

    async fn filter_nodes(&self, query: &NodeQuery) -> Result<Vec<Node>> {
        Ok(self
            .order
            .iter()
            .map(|id| &self.nodes[id])
            .filter(|n| query.matches(n))
            .cloned()
            .collect())
    }

    async fn relationships(
        &self,
        node: NodeId,
        query: &RelationshipQuery,
    ) -> Result<Vec<Relationship>> {
        self.require(node)?;

        Ok(self
            .outgoing(node)
            .filter(|r| {
                self.nodes
                    .get(&r.dst)
                    .is_some_and(|target| query.matches(r, target))
            })
            .cloned()
            .collect())
    }
}

// ============================================================================
// Tests
// ============================================================================
