//! Multi-context evolution.
//!
//! Runs a [`SimpleEvolution`] for a seed question, then rewrites it against
//! an anchor chunk and that anchor's most similar chunk, then compresses the
//! rewrite. The reconcile and compress steps have no retry loop: once the
//! two-context question exists, a bad completion is reported, not retried.

use tracing::debug;

use crate::filter::{NodeFilter, QuestionFilter};
use crate::llm::TextGenerator;
use crate::prompt;
use crate::storage::GraphStore;
use crate::{Error, Result};
use super::state::sample_one;
use super::{EvolutionConfig, EvolutionKind, Evolved, SimpleEvolution};

/// Question spanning two semantically related chunks.
#[derive(Debug, Clone)]
pub struct MultiContextEvolution {
    simple: SimpleEvolution,
}

impl MultiContextEvolution {
    pub fn new(node_filter: NodeFilter, question_filter: QuestionFilter, config: EvolutionConfig) -> Self {
        Self { simple: SimpleEvolution::new(node_filter, question_filter, config) }
    }

    pub async fn evolve(&self, llm: &dyn TextGenerator, store: &dyn GraphStore) -> Result<Evolved> {
        // The anchor is sampled independently of the seed evolution's own root.
        let anchor = sample_one(store).await?;
        let seed = self.simple.evolve(llm, store).await?;
        debug!(anchor = %anchor.id, question = %seed.question, "seed question generated");

        let similar = store
            .similar(anchor.id)
            .await?
            .into_iter()
            .next()
            .ok_or(Error::NoSimilarContext(anchor.id))?;

        let prompt = prompt::MULTI_CONTEXT_QUESTION.format(&[
            ("question", seed.question.as_str()),
            ("context1", anchor.content.as_str()),
            ("context2", similar.content.as_str()),
        ])?;
        let merged = non_empty(llm.generate_text(&prompt).await?, "multi-context rewrite")?;
        debug!(anchor = %anchor.id, similar = %similar.id, question = %merged, "multi-context question generated");

        let prompt = prompt::COMPRESS_QUESTION.format(&[("question", merged.as_str())])?;
        let compressed = non_empty(llm.generate_text(&prompt).await?, "compression")?;
        debug!(question = %compressed, "multi-context question compressed");

        Ok(Evolved {
            question: compressed,
            root: anchor.id,
            contexts: vec![anchor, similar],
            kind: EvolutionKind::MultiContext,
            tries: seed.tries,
            resamples: seed.resamples,
        })
    }
}

fn non_empty(text: String, step: &str) -> Result<String> {
    if text.is_empty() {
        return Err(Error::Generation(format!("{step} returned an empty question")));
    }
    Ok(text)
}
