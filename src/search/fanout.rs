//! Best-effort fan-out search across a caller's namespaces.
//!
//! Scores from different namespaces are compared directly when re-sorting
//! the union. This assumes all of a tenant's namespaces were populated
//! with the same embedding model; scores from different embedding spaces
//! are not comparable.

use crate::models::RetrievedMatch;
use crate::search::vector::VectorSearch;

/// Search each namespace in order and merge the results: the union is
/// stably sorted by score descending (ties keep namespace order) and
/// truncated to `top_k`. A failing namespace logs a warning and
/// contributes nothing; partial results are preferred over no results.
pub fn fan_out_search<S: VectorSearch + ?Sized>(
    index: &S,
    query_embedding: &[f32],
    namespaces: &[String],
    top_k: usize,
) -> Vec<RetrievedMatch> {
    let mut all_matches = Vec::new();

    for namespace in namespaces {
        match index.search(query_embedding, namespace, top_k) {
            Ok(matches) => {
                tracing::debug!("Namespace '{namespace}': {} matches", matches.len());
                all_matches.extend(matches);
            }
            Err(e) => {
                tracing::warn!("Namespace '{namespace}' search failed: {e}");
            }
        }
    }

    // Stable sort: equal scores keep their namespace/input order
    all_matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    all_matches.truncate(top_k);
    all_matches
}
