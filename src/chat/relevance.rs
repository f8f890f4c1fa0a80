//! LLM relevance gate.
//!
//! One constrained generation call classifies whether the retrieved
//! context can actually answer the query. The parser fails closed: any
//! response other than a clean "RELEVANT" routes to the not-relevant
//! branch, so a confused classifier sends the query to web/fallback
//! rather than to possibly wrong grounding.

use crate::llm::TextGenerator;

/// How much of the assembled context the classifier sees. A heuristic,
/// not a contract - tune freely.
pub const RELEVANCE_SAMPLE_CHARS: usize = 500;

/// Ask the model whether `context` is relevant to `query`. Provider
/// errors count as not relevant.
pub async fn is_relevant(generator: &dyn TextGenerator, query: &str, context: &str) -> bool {
    let sample = truncate_sample(context, RELEVANCE_SAMPLE_CHARS);
    let prompt = relevance_prompt(query, sample);

    match generator.generate(&prompt, 10, 0.1).await {
        Ok(response) => {
            let relevant = parse_relevance(&response);
            tracing::info!(
                "Relevance gate: {} (model said: {})",
                if relevant { "relevant" } else { "not relevant" },
                response.trim()
            );
            relevant
        }
        Err(e) => {
            tracing::warn!("Relevance check failed, treating as not relevant: {e}");
            false
        }
    }
}

fn relevance_prompt(query: &str, sample: &str) -> String {
    format!(
        "Given this user question and document context, determine if the \
         context contains relevant information to answer the question.\n\n\
         **User Question:** {query}\n\n\
         **Document Context (first {RELEVANCE_SAMPLE_CHARS} chars):** {sample}...\n\n\
         **Task:** Answer with ONLY \"RELEVANT\" or \"NOT_RELEVANT\"\n\n\
         - Answer \"RELEVANT\" if the context can help answer the question\n\
         - Answer \"NOT_RELEVANT\" if the context is about completely different topics\n\n\
         Your answer (one word only):"
    )
}

/// Decision rule: RELEVANT only if the uppercased response contains
/// "RELEVANT" and does not contain "NOT". Everything else is NOT relevant.
pub fn parse_relevance(response: &str) -> bool {
    let normalized = response.trim().to_uppercase();
    normalized.contains("RELEVANT") && !normalized.contains("NOT")
}

fn truncate_sample(context: &str, max_chars: usize) -> &str {
    if context.len() <= max_chars {
        return context;
    }
    let mut end = max_chars;
    while !context.is_char_boundary(end) {
        end -= 1;
    }
    &context[..end]
}
