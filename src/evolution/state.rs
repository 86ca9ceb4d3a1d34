//! Per-request evolution state: the context window and its retry counters.
//!
//! One `EvolutionState` lives for exactly one `evolve` call and is dropped
//! with it, so cancelling the future discards it. It never writes to the
//! graph.

use smallvec::SmallVec;
use tracing::debug;

use crate::model::{merge_contents, Direction, Node, NodeId};
use crate::storage::GraphStore;
use crate::{Error, Result};
use super::EvolutionConfig;

/// Phases of the simple-evolution state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Pick a fresh root node; the window collapses to that node.
    Sampling,
    /// Score the front of the window.
    NodeCheck,
    /// Ask the model for a seed question over the merged window.
    Generating,
    /// Validate the seed question.
    QuestionCheck,
}

/// What `EvolutionState::expand` did to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// Prepended the preceding chunk.
    Prev(NodeId),
    /// Appended the following chunk.
    Next(NodeId),
    /// No neighbour left; started over from a fresh root.
    Resampled(NodeId),
}

/// Mutable record of one generation attempt.
///
/// Invariant: `nodes` is never empty. `root` is an identifier only; the
/// window owns all content.
#[derive(Debug, Clone)]
pub struct EvolutionState {
    nodes: SmallVec<[Node; 4]>,
    root: NodeId,
    tries: usize,
    resamples: usize,
    config: EvolutionConfig,
}

impl EvolutionState {
    /// Sample the root node and open a one-node window on it.
    pub async fn start(store: &dyn GraphStore, config: EvolutionConfig) -> Result<Self> {
        let root = sample_one(store).await?;
        Ok(Self {
            root: root.id,
            nodes: SmallVec::from_elem(root, 1),
            tries: 0,
            resamples: 0,
            config,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Earliest node of the window.
    pub fn front(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn tries(&self) -> usize {
        self.tries
    }

    pub fn resamples(&self) -> usize {
        self.resamples
    }

    /// Window contents in order, blank-line separated.
    pub fn merged_context(&self) -> String {
        merge_contents(&self.nodes)
    }

    /// Replace the whole window with a freshly sampled root.
    pub async fn resample(&mut self, store: &dyn GraphStore) -> Result<NodeId> {
        let root = sample_one(store).await?;
        self.root = root.id;
        self.nodes = SmallVec::from_elem(root, 1);
        Ok(self.root)
    }

    /// Count a node-check rejection. Does not touch `tries`.
    pub fn record_rejected_node(&mut self) -> Result<()> {
        self.resamples += 1;
        match self.config.max_resamples {
            Some(max) if self.resamples > max => {
                Err(Error::ResamplesExhausted { resamples: self.resamples })
            }
            _ => Ok(()),
        }
    }

    /// Count a question-check rejection; fails once `tries` exceeds `max_tries`.
    pub fn record_rejected_question(&mut self) -> Result<()> {
        self.tries += 1;
        if self.tries > self.config.max_tries {
            return Err(Error::RetriesExhausted {
                tries: self.tries,
                max_tries: self.config.max_tries,
            });
        }
        Ok(())
    }

    /// Grow the window for another attempt: the chunk before the window
    /// first, then the chunk after it, else start over from a fresh root.
    pub async fn expand(&mut self, store: &dyn GraphStore) -> Result<Expansion> {
        let first = self.front().id;
        if let Some(prev) = store.adjacent(first, Direction::Prev).await? {
            if !self.contains(prev.id) {
                let id = prev.id;
                self.nodes.insert(0, prev);
                debug!(root = %self.root, added = %id, "context expanded backwards");
                return Ok(Expansion::Prev(id));
            }
        }

        let last = self.nodes[self.nodes.len() - 1].id;
        if let Some(next) = store.adjacent(last, Direction::Next).await? {
            if !self.contains(next.id) {
                let id = next.id;
                self.nodes.push(next);
                debug!(root = %self.root, added = %id, "context expanded forwards");
                return Ok(Expansion::Next(id));
            }
        }

        let root = self.resample(store).await?;
        debug!(root = %root, "no adjacent context, resampled root");
        Ok(Expansion::Resampled(root))
    }

    fn contains(&self, id: NodeId) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }
}

/// Exactly one random node.
pub(crate) async fn sample_one(store: &dyn GraphStore) -> Result<Node> {
    store
        .sample_random(1)
        .await?
        .into_iter()
        .next()
        .ok_or(Error::InsufficientNodes { requested: 1, available: 0 })
}
