//! Single-context evolution.
//!
//! ```text
//! Sampling ──> NodeCheck ──pass──> Generating ──> QuestionCheck ──pass──> done
//!    ^             │                                   │
//!    └────fail─────┘            fail: tries += 1, expand window, back to NodeCheck
//! ```
//!
//! Node-check failures are free with respect to `max_tries`: sampling is
//! cheap, generation is the bounded resource.

use tracing::{debug, info};

use crate::filter::{NodeFilter, QuestionFilter};
use crate::llm::TextGenerator;
use crate::prompt;
use crate::storage::GraphStore;
use crate::Result;
use super::{EvolutionConfig, EvolutionKind, EvolutionState, Evolved, Phase};

/// Generates one question from a (possibly expanded) single context window.
#[derive(Debug, Clone)]
pub struct SimpleEvolution {
    node_filter: NodeFilter,
    question_filter: QuestionFilter,
    config: EvolutionConfig,
}

impl SimpleEvolution {
    pub fn new(node_filter: NodeFilter, question_filter: QuestionFilter, config: EvolutionConfig) -> Self {
        Self { node_filter, question_filter, config }
    }

    pub fn config(&self) -> EvolutionConfig {
        self.config
    }

    pub async fn evolve(&self, llm: &dyn TextGenerator, store: &dyn GraphStore) -> Result<Evolved> {
        let mut state = EvolutionState::start(store, self.config).await?;
        let mut phase = Phase::NodeCheck;
        let mut question = String::new();

        loop {
            debug!(?phase, root = %state.root(), tries = state.tries(), "evolution step");
            phase = match phase {
                Phase::Sampling => {
                    state.resample(store).await?;
                    Phase::NodeCheck
                }
                Phase::NodeCheck => {
                    let verdict = self.node_filter.evaluate(state.front()).await?;
                    if verdict.passed {
                        Phase::Generating
                    } else {
                        state.record_rejected_node()?;
                        Phase::Sampling
                    }
                }
                Phase::Generating => {
                    let context = state.merged_context();
                    let prompt = prompt::SEED_QUESTION.format(&[
                        ("context", context.as_str()),
                        ("style", self.config.style.describe()),
                        ("length", self.config.length.describe()),
                    ])?;
                    question = llm.generate_text(&prompt).await?;
                    Phase::QuestionCheck
                }
                Phase::QuestionCheck => {
                    // An empty completion cannot be a question; skip the filter call.
                    let valid = !question.is_empty() && self.question_filter.evaluate(&question).await?;
                    if valid {
                        info!(
                            root = %state.root(),
                            tries = state.tries(),
                            context_nodes = state.nodes().len(),
                            "simple evolution succeeded"
                        );
                        return Ok(Evolved {
                            question,
                            contexts: state.nodes().to_vec(),
                            root: state.root(),
                            kind: EvolutionKind::Simple,
                            tries: state.tries(),
                            resamples: state.resamples(),
                        });
                    }
                    state.record_rejected_question()?;
                    let expansion = state.expand(store).await?;
                    info!(tries = state.tries(), ?expansion, "question rejected, retrying");
                    Phase::NodeCheck
                }
            };
        }
    }
}
