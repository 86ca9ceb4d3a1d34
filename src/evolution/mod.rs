//! # Evolution Engine
//!
//! Strategies that turn graph context into a synthetic question.
//!
//! | Strategy | Module | Description |
//! |----------|--------|-------------|
//! | `SimpleEvolution` | `simple` | Single-context question with bounded retries |
//! | `MultiContextEvolution` | `multi_context` | Simple seed + similar context + compression |
//!
//! Both share the retry policy in [`EvolutionConfig`]: question-check
//! failures spend `max_tries`, node-check failures spend the separate
//! `max_resamples` budget.

pub mod state;
pub mod simple;
pub mod multi_context;

use serde::{Deserialize, Serialize};

use crate::filter::{NodeFilter, QuestionFilter};
use crate::llm::TextGenerator;
use crate::model::{Node, NodeId};
use crate::storage::GraphStore;
use crate::Result;

pub use state::{EvolutionState, Expansion, Phase};
pub use simple::SimpleEvolution;
pub use multi_context::MultiContextEvolution;

// ============================================================================
// Configuration
// ============================================================================

/// Phrasing asked of seed questions, mimicking real user input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStyle {
    Misspelled,
    #[default]
    PerfectGrammar,
    PoorGrammar,
    WebSearchLike,
}

impl QuestionStyle {
    /// Wording used in the seed prompt.
    pub fn describe(self) -> &'static str {
        match self {
            QuestionStyle::Misspelled => "Misspelled queries",
            QuestionStyle::PerfectGrammar => "Perfect grammar",
            QuestionStyle::PoorGrammar => "Poor grammar",
            QuestionStyle::WebSearchLike => "Web search like queries",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl QuestionLength {
    pub fn describe(self) -> &'static str {
        match self {
            QuestionLength::Short => "short",
            QuestionLength::Medium => "medium",
            QuestionLength::Long => "long",
        }
    }
}

/// Retry budgets and question shape for one evolution request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Question-check failures tolerated; the next one exhausts the request.
    pub max_tries: usize,
    /// Node-check failures tolerated. `None` resamples without bound.
    pub max_resamples: Option<usize>,
    pub style: QuestionStyle,
    pub length: QuestionLength,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            max_tries: 5,
            max_resamples: Some(50),
            style: QuestionStyle::default(),
            length: QuestionLength::default(),
        }
    }
}

// ============================================================================
// Output
// ============================================================================

/// Which strategy produced a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionKind {
    Simple,
    MultiContext,
}

impl std::fmt::Display for EvolutionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvolutionKind::Simple => write!(f, "simple"),
            EvolutionKind::MultiContext => write!(f, "multi_context"),
        }
    }
}

/// A successfully evolved question and the context it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evolved {
    pub question: String,
    /// Context nodes in order.
    pub contexts: Vec<Node>,
    pub root: NodeId,
    pub kind: EvolutionKind,
    /// Question-check failures spent.
    pub tries: usize,
    /// Node-check failures spent.
    pub resamples: usize,
}

// ============================================================================
// Evolution (sum over strategies)
// ============================================================================

/// A configured evolution strategy.
#[derive(Debug, Clone)]
pub enum Evolution {
    Simple(SimpleEvolution),
    MultiContext(MultiContextEvolution),
}

impl Evolution {
    pub fn simple(node_filter: NodeFilter, question_filter: QuestionFilter, config: EvolutionConfig) -> Self {
        Evolution::Simple(SimpleEvolution::new(node_filter, question_filter, config))
    }

    pub fn multi_context(node_filter: NodeFilter, question_filter: QuestionFilter, config: EvolutionConfig) -> Self {
        Evolution::MultiContext(MultiContextEvolution::new(node_filter, question_filter, config))
    }

    pub fn kind(&self) -> EvolutionKind {
        match self {
            Evolution::Simple(_) => EvolutionKind::Simple,
            Evolution::MultiContext(_) => EvolutionKind::MultiContext,
        }
    }

    /// Run one generation request to completion.
    pub async fn evolve(&self, llm: &dyn TextGenerator, store: &dyn GraphStore) -> Result<Evolved> {
        match self {
            Evolution::Simple(e) => e.evolve(llm, store).await,
            Evolution::MultiContext(e) => e.evolve(llm, store).await,
        }
    }
}
