//! Prompt templates used by the filters and evolutions.
//!
//! A template is an instruction plus named inputs. Formatting checks that
//! exactly the declared inputs were supplied, so a typo in a variable name
//! fails loudly instead of shipping an empty context to the model.

use crate::{Error, Result};

/// A named prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub name: &'static str,
    pub instruction: &'static str,
    pub input_keys: &'static [&'static str],
    /// Expected response shape, appended to the rendered prompt if set.
    pub output_format: Option<&'static str>,
}

impl Prompt {
    /// Render with the given `(key, value)` pairs.
    pub fn format(&self, vars: &[(&str, &str)]) -> Result<String> {
        for (key, _) in vars {
            if !self.input_keys.iter().any(|k| k == key) {
                return Err(Error::Prompt(format!("{}: unknown variable '{key}'", self.name)));
            }
        }

        let mut out = String::from(self.instruction);
        out.push_str("\n\n");
        for key in self.input_keys {
            let value = vars
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| *v)
                .ok_or_else(|| Error::Prompt(format!("{}: missing variable '{key}'", self.name)))?;
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
        if let Some(format) = self.output_format {
            out.push('\n');
            out.push_str(format);
            out.push('\n');
        }
        Ok(out)
    }
}

// ============================================================================
// Built-in prompts
// ============================================================================

/// Scores how information-dense a chunk is, 0–10.
pub const CONTEXT_SCORING: Prompt = Prompt {
    name: "context_scoring",
    instruction: "Evaluate the provided context and assign a numerical score between 0 and 10 \
based on: clarity (is the information precise and easy to understand), depth (does it go \
beyond surface-level facts), structure (is it logically organised), and relevance (is it \
free of unrelated boilerplate such as navigation text or references). Average the criteria.",
    input_keys: &["context"],
    output_format: Some(r#"Respond only with JSON: {"score": <number between 0 and 10>}"#),
};

/// Judges whether a question is self-contained and answerable.
pub const FILTER_QUESTION: Prompt = Prompt {
    name: "filter_question",
    instruction: "Determine whether the given question can be clearly understood and answered \
without additional context. A good question names its subject explicitly, asks for one \
thing, and does not refer to 'the context' or 'the passage'.",
    input_keys: &["question"],
    output_format: Some(r#"Respond only with JSON: {"reason": "<short reason>", "verdict": "Yes" | "No"}"#),
};

/// Produces a first-pass question from a context window.
pub const SEED_QUESTION: Prompt = Prompt {
    name: "seed_question",
    instruction: "Generate one question that can be fully answered from the given context. \
The question should be answerable by someone who has read the context and should not \
mention the context itself. Write it in the requested style and at the requested length. \
Respond with the question only.",
    input_keys: &["context", "style", "length"],
    output_format: None,
};

/// Rewrites a question so answering it needs both contexts.
pub const MULTI_CONTEXT_QUESTION: Prompt = Prompt {
    name: "multi_context_question",
    instruction: "Rewrite the given question so that answering it requires information from \
both context1 and context2. The rewritten question must be answerable from the two \
contexts together, must not be answerable from either one alone, and must not mention \
'context1' or 'context2'. Respond with the rewritten question only.",
    input_keys: &["question", "context1", "context2"],
    output_format: None,
};

/// Condenses a question without changing what it asks.
pub const COMPRESS_QUESTION: Prompt = Prompt {
    name: "compress_question",
    instruction: "Rewrite the following question to make it more concise and coherent while \
keeping its meaning. Use abbreviations where natural, drop filler words, and keep a \
single question mark. Respond with the rewritten question only.",
    input_keys: &["question"],
    output_format: None,
};

/// Answers a generated question from its contexts only.
pub const REFERENCE_ANSWER: Prompt = Prompt {
    name: "reference_answer",
    instruction: "Answer the question using only the information in the given context. \
Be complete but concise, and do not add facts the context does not state. Respond with \
the answer only.",
    input_keys: &["question", "context"],
    output_format: None,
};
