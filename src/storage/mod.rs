//! # Graph Store Trait
//!
//! This is THE contract between the evolution engine and the chunk graph.
//! The engine only ever reads: sampling, sequential adjacency and similarity
//! lookup. Ingestion belongs to whoever builds the store.
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryGraph` | `memory` | Immutable in-memory graph for testing/embedding |

pub mod memory;

use async_trait::async_trait;

use crate::model::*;
use crate::query::{NodeQuery, RelationshipQuery};
use crate::Result;

pub use memory::{MemoryGraph, MemoryGraphBuilder};

/// The read-only graph contract.
///
/// Implementations must tolerate concurrent callers: many evolutions share a
/// single store. Remote backends report transport failures as
/// `Error::ServiceUnavailable`.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Total number of nodes.
    async fn node_count(&self) -> Result<usize>;

    /// Get a node by ID. Returns None if not found.
    async fn get_node(&self, id: NodeId) -> Result<Option<Node>>;

    /// `k` distinct nodes, uniformly at random, without replacement.
    ///
    /// Fails with `Error::InsufficientNodes` when the store holds fewer than `k`.
    async fn sample_random(&self, k: usize) -> Result<Vec<Node>>;

    /// The chunk directly before or after `node`, if any.
    async fn adjacent(&self, node: NodeId, direction: Direction) -> Result<Option<Node>>;

    /// Nodes linked from `node` by `SIMILAR` edges, best score first. May be empty.
    async fn similar(&self, node: NodeId) -> Result<Vec<Node>>;

    /// All nodes matching `query`.
    async fn filter_nodes(&self, query: &NodeQuery) -> Result<Vec<Node>>;

    /// Outgoing relationships of `node` matching `query`.
    async fn relationships(
        &self,
        node: NodeId,
        query: &RelationshipQuery,
    ) -> Result<Vec<Relationship>>;
}
