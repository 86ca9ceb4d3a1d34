//! End-to-end tests for the evolution state machine.
//!
//! Each test drives a `SimpleEvolution` or `MultiContextEvolution` against a
//! `MemoryGraph` and a scripted text service that answers by prompt kind.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use testset_rs::prompt::{
    COMPRESS_QUESTION, CONTEXT_SCORING, FILTER_QUESTION, MULTI_CONTEXT_QUESTION,
};
use testset_rs::query::{NodeQuery, RelationshipQuery};
use testset_rs::{
    Direction, Error, EvolutionConfig, EvolutionKind, GraphStore, LlmResult, MemoryGraph,
    MultiContextEvolution, Node, NodeFilter, NodeId, QuestionFilter, QuestionLength, QuestionStyle,
    Relationship, Result, SimpleEvolution, TextGenerator,
};

// ============================================================================
// Scripted text service
// ============================================================================

/// Answers scoring prompts from `scores` (then `default_score`), question
/// checks from `verdicts` (then `default_verdict`), and counts every call.
struct ScriptedLlm {
    scores: Mutex<VecDeque<f64>>,
    default_score: f64,
    verdicts: Mutex<VecDeque<&'static str>>,
    default_verdict: &'static str,
    node_checks: AtomicUsize,
    question_checks: AtomicUsize,
    seeds: AtomicUsize,
    seed_prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    fn new(default_score: f64, default_verdict: &'static str) -> Self {
        Self {
            scores: Mutex::new(VecDeque::new()),
            default_score,
            verdicts: Mutex::new(VecDeque::new()),
            default_verdict,
            node_checks: AtomicUsize::new(0),
            question_checks: AtomicUsize::new(0),
            seeds: AtomicUsize::new(0),
            seed_prompts: Mutex::new(Vec::new()),
        }
    }

    fn with_scores(self, scores: &[f64]) -> Self {
        self.scores.lock().extend(scores.iter().copied());
        self
    }

    fn with_verdicts(self, verdicts: &[&'static str]) -> Self {
        self.verdicts.lock().extend(verdicts.iter().copied());
        self
    }
}

#[async_trait]
impl TextGenerator for ScriptedLlm {
    async fn generate(&self, prompt: &str, _n: usize) -> Result<LlmResult> {
        let text = if prompt.starts_with(CONTEXT_SCORING.instruction) {
            self.node_checks.fetch_add(1, Ordering::SeqCst);
            let score = self.scores.lock().pop_front().unwrap_or(self.default_score);
            format!(r#"{{"score": {score}}}"#)
        } else if prompt.starts_with(FILTER_QUESTION.instruction) {
            self.question_checks.fetch_add(1, Ordering::SeqCst);
            let verdict = self.verdicts.lock().pop_front().unwrap_or(self.default_verdict);
            format!(r#"{{"reason": "scripted", "verdict": "{verdict}"}}"#)
        } else if prompt.starts_with(MULTI_CONTEXT_QUESTION.instruction) {
            "Which two facts connect alpha and beta?".to_string()
        } else if prompt.starts_with(COMPRESS_QUESTION.instruction) {
            "How do alpha and beta connect?".to_string()
        } else {
            self.seeds.fetch_add(1, Ordering::SeqCst);
            self.seed_prompts.lock().push(prompt.to_string());
            "What does the passage describe?".to_string()
        };
        Ok(LlmResult::single(text))
    }
}

/// A text service whose transport is down.
struct Unreachable;

#[async_trait]
impl TextGenerator for Unreachable {
    async fn generate(&self, _prompt: &str, _n: usize) -> Result<LlmResult> {
        Err(Error::ServiceUnavailable("connection refused".into()))
    }
}

// ============================================================================
// Counting graph decorator
// ============================================================================

/// Forwards to an inner store and counts traversal calls.
struct Counting<G> {
    inner: G,
    samples: AtomicUsize,
    adjacent: AtomicUsize,
}

impl<G> Counting<G> {
    fn new(inner: G) -> Self {
        Self { inner, samples: AtomicUsize::new(0), adjacent: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl<G: GraphStore> GraphStore for Counting<G> {
    async fn node_count(&self) -> Result<usize> {
        self.inner.node_count().await
    }

    async fn get_node(&self, id: NodeId) -> Result<Option<Node>> {
        self.inner.get_node(id).await
    }

    async fn sample_random(&self, k: usize) -> Result<Vec<Node>> {
        self.samples.fetch_add(1, Ordering::SeqCst);
        self.inner.sample_random(k).await
    }

    async fn adjacent(&self, node: NodeId, direction: Direction) -> Result<Option<Node>> {
        self.adjacent.fetch_add(1, Ordering::SeqCst);
        self.inner.adjacent(node, direction).await
    }

    async fn similar(&self, node: NodeId) -> Result<Vec<Node>> {
        self.inner.similar(node).await
    }

    async fn filter_nodes(&self, query: &NodeQuery) -> Result<Vec<Node>> {
        self.inner.filter_nodes(query).await
    }

    async fn relationships(&self, node: NodeId, query: &RelationshipQuery) -> Result<Vec<Relationship>> {
        self.inner.relationships(node, query).await
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// `n` chunks from separate documents: no PREV/NEXT edges at all.
fn isolated_chunks(n: usize) -> MemoryGraph {
    let mut b = MemoryGraph::builder().seed(42);
    for i in 0..n {
        b.add_chunk(format!("doc-{i}"), format!("Standalone chunk number {i}."));
    }
    b.build()
}

fn simple(llm: &Arc<ScriptedLlm>, config: EvolutionConfig) -> SimpleEvolution {
    SimpleEvolution::new(
        NodeFilter::new(llm.clone()).with_threshold(7.5),
        QuestionFilter::new(llm.clone()),
        config,
    )
}

// ============================================================================
// 1. Happy path: one node check, one question check, no retries
// ============================================================================

#[tokio::test]
async fn test_single_pass_evolution() {
    let graph = isolated_chunks(5);
    let llm = Arc::new(ScriptedLlm::new(9.0, "Yes"));

    let out = simple(&llm, EvolutionConfig::default())
        .evolve(llm.as_ref(), &graph)
        .await
        .unwrap();

    assert_eq!(out.kind, EvolutionKind::Simple);
    assert_eq!(out.question, "What does the passage describe?");
    assert_eq!(out.tries, 0);
    assert_eq!(out.resamples, 0);
    assert_eq!(llm.node_checks.load(Ordering::SeqCst), 1);
    assert_eq!(llm.question_checks.load(Ordering::SeqCst), 1);
    assert_eq!(llm.seeds.load(Ordering::SeqCst), 1);
}

// ============================================================================
// 2. Node-check failures resample without spending retries
// ============================================================================

#[tokio::test]
async fn test_low_score_resamples_for_free() {
    let graph = Counting::new(isolated_chunks(5));
    let llm = Arc::new(ScriptedLlm::new(9.0, "Yes").with_scores(&[2.0]));

    let out = simple(&llm, EvolutionConfig::default())
        .evolve(llm.as_ref(), &graph)
        .await
        .unwrap();

    assert_eq!(out.tries, 0);
    assert_eq!(out.resamples, 1);
    assert_eq!(llm.node_checks.load(Ordering::SeqCst), 2);
    assert_eq!(llm.question_checks.load(Ordering::SeqCst), 1);
    // Initial sample plus one resample.
    assert_eq!(graph.samples.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_score_at_threshold_passes() {
    let graph = isolated_chunks(5);
    let llm = Arc::new(ScriptedLlm::new(7.5, "Yes"));

    let out = simple(&llm, EvolutionConfig::default())
        .evolve(llm.as_ref(), &graph)
        .await
        .unwrap();
    assert_eq!(out.resamples, 0);
}

// ============================================================================
// 3. Rejected questions without neighbours exhaust the retry budget
// ============================================================================

#[tokio::test]
async fn test_isolated_nodes_exhaust_retries() {
    let graph = Counting::new(isolated_chunks(5));
    let llm = Arc::new(ScriptedLlm::new(9.0, "No"));
    let config = EvolutionConfig { max_tries: 5, max_resamples: Some(50), ..EvolutionConfig::default() };

    let err = simple(&llm, config).evolve(llm.as_ref(), &graph).await.unwrap_err();

    assert!(
        matches!(err, Error::RetriesExhausted { tries: 6, max_tries: 5 }),
        "unexpected error: {err:?}"
    );
    assert_eq!(llm.question_checks.load(Ordering::SeqCst), 6);
    // Initial sample plus a resample after each of the five retried rejections.
    assert_eq!(graph.samples.load(Ordering::SeqCst), 6);
    // Each expansion looks both ways before giving up on the window.
    assert_eq!(graph.adjacent.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn test_zero_max_tries_allows_one_attempt() {
    let graph = isolated_chunks(2);
    let llm = Arc::new(ScriptedLlm::new(9.0, "No"));
    let config = EvolutionConfig { max_tries: 0, max_resamples: None, ..EvolutionConfig::default() };

    let err = simple(&llm, config).evolve(llm.as_ref(), &graph).await.unwrap_err();
    assert!(matches!(err, Error::RetriesExhausted { tries: 1, max_tries: 0 }));
    assert_eq!(llm.question_checks.load(Ordering::SeqCst), 1);
}

// ============================================================================
// 4. Context expansion grows the window in document order
// ============================================================================

#[tokio::test]
async fn test_rejections_expand_window_over_whole_document() {
    let mut b = MemoryGraph::builder().seed(9);
    let ids: Vec<NodeId> = ["Intro.", "Body.", "Outro."]
        .iter()
        .map(|text| b.add_chunk("doc", *text))
        .collect();
    b.link_sequence(&ids).unwrap();
    let graph = b.build();

    // Wherever the root lands, two expansions cover the three-chunk document.
    let llm = Arc::new(ScriptedLlm::new(9.0, "Yes").with_verdicts(&["No", "No"]));
    let out = simple(&llm, EvolutionConfig::default())
        .evolve(llm.as_ref(), &graph)
        .await
        .unwrap();

    assert_eq!(out.tries, 2);
    assert_eq!(out.contexts.iter().map(|n| n.id).collect::<Vec<_>>(), ids);
    let last_seed = llm.seed_prompts.lock().last().cloned().unwrap();
    assert!(last_seed.contains("Intro.\n\nBody.\n\nOutro."));
}

#[tokio::test]
async fn test_seed_prompt_carries_question_shape() {
    let graph = isolated_chunks(2);
    let llm = Arc::new(ScriptedLlm::new(9.0, "Yes"));
    let config = EvolutionConfig {
        style: QuestionStyle::Misspelled,
        length: QuestionLength::Long,
        ..EvolutionConfig::default()
    };

    simple(&llm, config).evolve(llm.as_ref(), &graph).await.unwrap();

    let seed = llm.seed_prompts.lock()[0].clone();
    assert!(seed.contains("style: Misspelled queries\n"), "{seed}");
    assert!(seed.contains("length: long\n"), "{seed}");
}

// ============================================================================
// 5. Infrastructure failures propagate unchanged
// ============================================================================

#[tokio::test]
async fn test_service_failure_propagates() {
    let graph = isolated_chunks(3);
    let llm: Arc<dyn TextGenerator> = Arc::new(Unreachable);
    let evolution = SimpleEvolution::new(
        NodeFilter::new(llm.clone()),
        QuestionFilter::new(llm.clone()),
        EvolutionConfig::default(),
    );

    let err = evolution.evolve(llm.as_ref(), &graph).await.unwrap_err();
    assert!(matches!(err, Error::ServiceUnavailable(_)));
}

#[tokio::test]
async fn test_empty_graph_is_insufficient() {
    let graph = MemoryGraph::builder().build();
    let llm = Arc::new(ScriptedLlm::new(9.0, "Yes"));

    let err = simple(&llm, EvolutionConfig::default())
        .evolve(llm.as_ref(), &graph)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InsufficientNodes { requested: 1, available: 0 }));
    assert_eq!(llm.node_checks.load(Ordering::SeqCst), 0);
}

// ============================================================================
// 6. Multi-context evolution
// ============================================================================

#[tokio::test]
async fn test_multi_context_evolution() {
    let mut b = MemoryGraph::builder().seed(3);
    let alpha = b.add_chunk("doc-a", "Alpha describes the ingestion pipeline.");
    let beta = b.add_chunk("doc-b", "Beta describes the retrieval index.");
    b.link_similar(alpha, beta, 0.87).unwrap();
    let graph = b.build();

    let llm = Arc::new(ScriptedLlm::new(9.0, "Yes"));
    let evolution = MultiContextEvolution::new(
        NodeFilter::new(llm.clone()),
        QuestionFilter::new(llm.clone()),
        EvolutionConfig::default(),
    );

    let out = evolution.evolve(llm.as_ref(), &graph).await.unwrap();
    assert_eq!(out.kind, EvolutionKind::MultiContext);
    assert_eq!(out.question, "How do alpha and beta connect?");

    let mut ids: Vec<NodeId> = out.contexts.iter().map(|n| n.id).collect();
    assert_eq!(ids[0], out.root);
    ids.sort();
    assert_eq!(ids, vec![alpha, beta]);
}

#[tokio::test]
async fn test_multi_context_seed_failure_propagates() {
    let mut b = MemoryGraph::builder().seed(3);
    let alpha = b.add_chunk("doc-a", "Alpha.");
    let beta = b.add_chunk("doc-b", "Beta.");
    b.link_similar(alpha, beta, 0.5).unwrap();
    let graph = b.build();

    let llm = Arc::new(ScriptedLlm::new(9.0, "No"));
    let evolution = MultiContextEvolution::new(
        NodeFilter::new(llm.clone()),
        QuestionFilter::new(llm.clone()),
        EvolutionConfig { max_tries: 1, max_resamples: None, ..EvolutionConfig::default() },
    );

    let err = evolution.evolve(llm.as_ref(), &graph).await.unwrap_err();
    assert!(matches!(err, Error::RetriesExhausted { tries: 2, max_tries: 1 }));
}
