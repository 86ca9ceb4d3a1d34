//! # testset-rs — Synthetic RAG Test-Set Generation
//!
//! Generates evaluation questions from a corpus of document chunks stored as a
//! knowledge graph. The core is the *evolution engine*: a bounded-retry,
//! graph-traversal-driven pipeline that samples a chunk, judges whether it can
//! seed a question, generates and validates a question, and for richer
//! variants merges a second, similar context and compresses the result.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `GraphStore` and `TextGenerator` are the contracts to the outside world
//! 2. **Clean DTOs**: `Node`, `Relationship`, `Value` cross all boundaries
//! 3. **Private state**: every evolution owns its context window; the graph is read-only
//! 4. **Content vs. infrastructure**: quality problems are retried, transport problems propagate
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use testset_rs::{GeneratorConfig, MemoryGraph, TestsetGenerator, TextGenerator};
//!
//! # async fn example(llm: Arc<dyn TextGenerator>) -> testset_rs::Result<()> {
//! let mut builder = MemoryGraph::builder();
//! let a = builder.add_chunk("doc-1", "Rust guarantees memory safety without a GC.");
//! let b = builder.add_chunk("doc-1", "Ownership rules are checked at compile time.");
//! builder.link_sequence(&[a, b])?;
//! let graph = Arc::new(builder.build());
//!
//! let generator = TestsetGenerator::new(llm, graph, GeneratorConfig::default())?;
//! let testset = generator.generate(10).await?;
//! println!("{}", testset.to_json()?);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod query;
pub mod storage;
pub mod llm;
pub mod prompt;
pub mod filter;
pub mod evolution;
pub mod generator;
pub mod config;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Node, Relationship, Value, PropertyMap,
    NodeId, RelId, Direction, NodeType, NodeLevel,
};

// ============================================================================
// Re-exports: Graph access
// ============================================================================

pub use query::{Comparison, NodeQuery, PropertyPredicate, RelationshipQuery, TargetFilter};
pub use storage::{GraphStore, MemoryGraph, MemoryGraphBuilder};

// ============================================================================
// Re-exports: Generation
// ============================================================================

pub use llm::{TextGenerator, LlmResult, Generation, TokenUsage};
pub use prompt::Prompt;
pub use filter::{NodeFilter, NodeVerdict, QuestionFilter};
pub use evolution::{
    Evolution, EvolutionConfig, EvolutionKind, Evolved,
    MultiContextEvolution, QuestionLength, QuestionStyle, SimpleEvolution,
};
pub use generator::{Distribution, Testset, TestsetGenerator, TestsetRow, SkippedRow};
pub use config::GeneratorConfig;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Insufficient nodes: requested {requested}, graph holds {available}")]
    InsufficientNodes { requested: usize, available: usize },

    #[error("Retries exhausted: {tries} question-check failures (max_tries = {max_tries})")]
    RetriesExhausted { tries: usize, max_tries: usize },

    #[error("Node resamples exhausted after {resamples} low-scoring nodes")]
    ResamplesExhausted { resamples: usize },

    #[error("No similar context for node {0}")]
    NoSimilarContext(NodeId),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Content-quality failures: the request produced nothing usable, but a
    /// fresh request with a new random seed may succeed. Everything else is
    /// an infrastructure or programming error.
    pub fn is_content_failure(&self) -> bool {
        matches!(
            self,
            Error::RetriesExhausted { .. }
                | Error::ResamplesExhausted { .. }
                | Error::NoSimilarContext(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
