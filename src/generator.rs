//! Batch test-set generation.
//!
//! Each row is an independent evolution with its own private state; rows
//! run concurrently and share only the read-only graph. A row that fails on
//! content quality is skipped and reported; an infrastructure failure
//! aborts the batch and drops every evolution still in flight. Every kept
//! row gets a reference answer written from its contexts.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::GeneratorConfig;
use crate::evolution::{Evolution, EvolutionKind, Evolved};
use crate::filter::{NodeFilter, QuestionFilter};
use crate::llm::TextGenerator;
use crate::model::{merge_contents, NodeId};
use crate::prompt;
use crate::storage::GraphStore;
use crate::{Error, Result};

// ============================================================================
// Distribution
// ============================================================================

/// Relative weights of the evolution strategies in a test set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Distribution {
    pub simple: f64,
    pub multi_context: f64,
}

impl Default for Distribution {
    fn default() -> Self {
        Self { simple: 0.5, multi_context: 0.5 }
    }
}

impl Distribution {
    pub fn validate(&self) -> Result<()> {
        let weights = [self.simple, self.multi_context];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::Config(format!("distribution weights must be non-negative: {self:?}")));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(Error::Config("distribution weights sum to zero".into()));
        }
        Ok(())
    }

    /// Split `n` rows into `(simple, multi_context)` counts.
    pub fn counts(&self, n: usize) -> Result<(usize, usize)> {
        self.validate()?;
        let share = self.simple / (self.simple + self.multi_context);
        let simple = ((n as f64) * share).round() as usize;
        let simple = simple.min(n);
        Ok((simple, n - simple))
    }
}

// ============================================================================
// Output
// ============================================================================

/// One generated test-set entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestsetRow {
    pub question: String,
    /// Ground-truth answer, written from `contexts` only.
    pub reference: String,
    pub contexts: Vec<String>,
    pub context_ids: Vec<NodeId>,
    pub evolution_type: EvolutionKind,
    /// Question-check failures spent before success.
    pub tries: usize,
    pub generated_at: DateTime<Utc>,
}

impl TestsetRow {
    pub fn new(e: Evolved, reference: String) -> Self {
        Self {
            question: e.question,
            reference,
            context_ids: e.contexts.iter().map(|n| n.id).collect(),
            contexts: e.contexts.into_iter().map(|n| n.content).collect(),
            evolution_type: e.kind,
            tries: e.tries,
            generated_at: Utc::now(),
        }
    }
}

/// A row that produced no question for content reasons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub evolution_type: EvolutionKind,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Testset {
    pub rows: Vec<TestsetRow>,
    pub skipped: Vec<SkippedRow>,
}

impl Testset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

enum RowOutcome {
    Row(TestsetRow),
    Skipped(SkippedRow),
}

// ============================================================================
// TestsetGenerator
// ============================================================================

/// Runs batches of evolutions against one graph and one text service.
pub struct TestsetGenerator {
    llm: Arc<dyn TextGenerator>,
    store: Arc<dyn GraphStore>,
    config: GeneratorConfig,
    simple: Evolution,
    multi_context: Evolution,
}

impl TestsetGenerator {
    pub fn new(
        llm: Arc<dyn TextGenerator>,
        store: Arc<dyn GraphStore>,
        config: GeneratorConfig,
    ) -> Result<Self> {
        config.validate()?;
        let node_filter = NodeFilter::new(llm.clone()).with_threshold(config.threshold);
        let question_filter = QuestionFilter::new(llm.clone());
        Ok(Self {
            simple: Evolution::simple(node_filter.clone(), question_filter.clone(), config.evolution),
            multi_context: Evolution::multi_context(node_filter, question_filter, config.evolution),
            llm,
            store,
            config,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate `n` rows. Skipped rows are not replaced.
    pub async fn generate(&self, n: usize) -> Result<Testset> {
        let (simple, multi) = self.config.distribution.counts(n)?;
        info!(n, simple, multi_context = multi, concurrency = self.config.concurrency, "generating test set");

        let jobs = std::iter::repeat_n(&self.simple, simple)
            .chain(std::iter::repeat_n(&self.multi_context, multi))
            .map(|evolution| self.run_one(evolution));

        let outcomes: Vec<RowOutcome> = stream::iter(jobs)
            .buffered(self.config.concurrency)
            .try_collect()
            .await?;

        let mut testset = Testset::default();
        for outcome in outcomes {
            match outcome {
                RowOutcome::Row(row) => testset.rows.push(row),
                RowOutcome::Skipped(skip) => testset.skipped.push(skip),
            }
        }
        info!(rows = testset.rows.len(), skipped = testset.skipped.len(), "test set generated");
        Ok(testset)
    }

    async fn run_one(&self, evolution: &Evolution) -> Result<RowOutcome> {
        match evolution.evolve(self.llm.as_ref(), self.store.as_ref()).await {
            Ok(evolved) => {
                let reference = self.reference_answer(&evolved).await?;
                Ok(RowOutcome::Row(TestsetRow::new(evolved, reference)))
            }
            Err(e) if e.is_content_failure() => {
                warn!(kind = %evolution.kind(), error = %e, "row skipped");
                Ok(RowOutcome::Skipped(SkippedRow {
                    evolution_type: evolution.kind(),
                    reason: e.to_string(),
                }))
            }
            Err(e) => Err(e),
        }
    }

    /// Answer the evolved question from its own contexts.
    async fn reference_answer(&self, evolved: &Evolved) -> Result<String> {
        let context = merge_contents(&evolved.contexts);
        let prompt = prompt::REFERENCE_ANSWER.format(&[
            ("question", evolved.question.as_str()),
            ("context", context.as_str()),
        ])?;
        let answer = self.llm.generate_text(&prompt).await?;
        if answer.is_empty() {
            return Err(Error::Generation(format!(
                "reference answer for '{}' was empty",
                evolved.question
            )));
        }
        debug!(question = %evolved.question, "reference answer generated");
        Ok(answer)
    }
}
