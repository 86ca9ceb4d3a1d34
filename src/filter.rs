//! Quality gates in front of question generation.
//!
//! Both filters make exactly one model call and never fail on malformed
//! output: a node whose score cannot be read scores 0 (rejected), a question
//! whose verdict cannot be read is accepted. Only service failures propagate.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use tracing::debug;

use crate::llm::{load_as_json, TextGenerator};
use crate::model::Node;
use crate::prompt;
use crate::Result;

/// Default minimum context score for a node to seed a question.
pub const DEFAULT_THRESHOLD: f64 = 7.5;

// ============================================================================
// Node filter
// ============================================================================

/// Scored judgment of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeVerdict {
    pub score: f64,
    pub passed: bool,
}

impl NodeVerdict {
    /// `passed` is inclusive at the threshold.
    pub fn from_score(score: f64, threshold: f64) -> Self {
        Self { score, passed: score >= threshold }
    }
}

/// Judges whether a chunk is information-dense enough to ask about.
#[derive(Clone)]
pub struct NodeFilter {
    llm: Arc<dyn TextGenerator>,
    threshold: f64,
}

impl NodeFilter {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm, threshold: DEFAULT_THRESHOLD }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub async fn evaluate(&self, node: &Node) -> Result<NodeVerdict> {
        let prompt = prompt::CONTEXT_SCORING.format(&[("context", node.content.as_str())])?;
        let output = self.llm.generate_text(&prompt).await?;
        let verdict = NodeVerdict::from_score(score_of(&load_as_json(&output)), self.threshold);
        debug!(node = %node.id, score = verdict.score, passed = verdict.passed, "node scored");
        Ok(verdict)
    }
}

impl std::fmt::Debug for NodeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeFilter").field("threshold", &self.threshold).finish_non_exhaustive()
    }
}

/// `score` as a number; numeric strings are accepted, anything else is 0.
fn score_of(parsed: &Map<String, Json>) -> f64 {
    match parsed.get("score") {
        Some(Json::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Json::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

// ============================================================================
// Question filter
// ============================================================================

/// Judges whether a generated question is well-formed and answerable.
#[derive(Clone)]
pub struct QuestionFilter {
    llm: Arc<dyn TextGenerator>,
}

impl QuestionFilter {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    pub async fn evaluate(&self, question: &str) -> Result<bool> {
        let prompt = prompt::FILTER_QUESTION.format(&[("question", question)])?;
        let output = self.llm.generate_text(&prompt).await?;
        let parsed = load_as_json(&output);
        let accepted = verdict_accepts(&parsed);
        debug!(question, verdict = ?parsed.get("verdict"), accepted, "question filtered");
        Ok(accepted)
    }
}

impl std::fmt::Debug for QuestionFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionFilter").finish_non_exhaustive()
    }
}

/// Only a literal `"No"` rejects.
fn verdict_accepts(parsed: &Map<String, Json>) -> bool {
    !matches!(parsed.get("verdict"), Some(Json::String(v)) if v == "No")
}
