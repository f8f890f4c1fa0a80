//! Pure query classification.
//!
//! All keyword dispatch in the pipeline lives here as explicit constant
//! sets and pure functions, so routing decisions are testable without
//! touching the orchestrator.

/// Comprehensive-query retrieval is capped at this many chunks.
pub const MAX_COMPREHENSIVE_TOP_K: usize = 35;

/// Queries that are only a greeting skip retrieval entirely.
const GREETINGS: &[&str] = &[
    "hello",
    "hi",
    "hey",
    "greetings",
    "good morning",
    "good afternoon",
    "good evening",
    "how are you",
    "what's up",
    "wassup",
    "sup",
    "how do you do",
    "nice to meet you",
    "pleased to meet you",
];

/// Keywords marking a query as asking for exhaustive coverage.
const COMPREHENSIVE_KEYWORDS: &[&str] = &[
    "all",
    "list",
    "every",
    "each",
    "complete",
    "entire",
    "full",
    "comprehensive",
    "everything",
    "total",
    "whole",
    "summarize all",
];

/// Keywords suggesting the query wants factual or current information,
/// worth a web search even with no documents uploaded.
const INFORMATIONAL_KEYWORDS: &[&str] = &[
    "what is", "who is", "when did", "how to", "latest", "current", "recent", "news", "today",
];

/// True when the query is nothing but a greeting: an exact match against
/// the greeting set, allowing a single trailing `!` or `?`.
pub fn is_greeting(query: &str) -> bool {
    let normalized = query.trim().to_lowercase();
    GREETINGS.iter().any(|g| {
        normalized == *g
            || normalized == format!("{g}!")
            || normalized == format!("{g}?")
    })
}

/// True when the query asks for comprehensive/list-style coverage.
pub fn is_comprehensive(query: &str) -> bool {
    let normalized = query.to_lowercase();
    COMPREHENSIVE_KEYWORDS
        .iter()
        .any(|k| normalized.contains(k))
}

/// True when the query looks like it needs factual/current information.
pub fn needs_web_search(query: &str) -> bool {
    let normalized = query.to_lowercase();
    INFORMATIONAL_KEYWORDS
        .iter()
        .any(|k| normalized.contains(k))
}

/// Retrieval depth for a query: comprehensive queries fetch 3× the
/// requested top-k, capped at [`MAX_COMPREHENSIVE_TOP_K`].
pub fn effective_top_k(query: &str, requested_top_k: usize) -> usize {
    if is_comprehensive(query) {
        (requested_top_k * 3).min(MAX_COMPREHENSIVE_TOP_K)
    } else {
        requested_top_k
    }
}
