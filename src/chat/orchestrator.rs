//! Answer-composition orchestrator.
//!
//! Ties the pipeline together for one query-response cycle:
//! namespace resolution, greeting short-circuit, fan-out retrieval,
//! relevance gating, mode-aware prompt composition, generation, web
//! augmentation with discrepancy reconciliation, flashcard extraction,
//! and the transcript append. Provider failures degrade tier by tier;
//! the caller only sees an error when even the unconstrained direct
//! answer fails.

use anyhow::Result;
use std::collections::HashSet;

use crate::auth::Identity;
use crate::chat::classify;
use crate::chat::flashcards::parse_flashcards;
use crate::chat::prompt;
use crate::chat::relevance;
use crate::error::ApiError;
use crate::models::{Citation, QueryRequest, QueryResponse, RetrievedMatch, SessionMode};
use crate::search::fanout::fan_out_search;
use crate::state::AppState;
use crate::websearch::{format_web_results, search_web, WEB_CONTEXT_MAX_CHARS};

/// Which branch of the state machine produced the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerPath {
    Greeting,
    NoDocs,
    RagRelevant,
    RagNotRelevant,
    RagErrorFallback,
}

/// Citation snippets are capped at this many characters.
const CITATION_SNIPPET_CHARS: usize = 200;

/// Flashcard topics are derived from the query, truncated to 50 chars.
const TOPIC_MAX_CHARS: usize = 50;

/// Handle one query end to end and return the answer, deduplicated
/// citations, and the (possibly new) session id.
pub async fn answer_query(
    state: &AppState,
    identity: &Identity,
    req: &QueryRequest,
) -> Result<QueryResponse, ApiError> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err(ApiError::Validation("Query is required".to_string()));
    }
    let mode = SessionMode::from_tag(req.mode.as_deref().unwrap_or_default());

    // Resolve or create the session up front so every branch can append
    // its turn to a real transcript.
    let session_id = match &req.session_id {
        Some(id) => {
            state
                .sessions
                .get(id, &identity.user_id)
                .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?
                .session_id
        }
        None => state.sessions.create(identity.user_id)?.session_id,
    };

    let doc_count = state.documents.count_completed(&identity.user_id);
    tracing::info!(
        "Query for user {} (mode {:?}, {} completed docs)",
        identity.user_id,
        mode,
        doc_count
    );

    let (answer, citations, path) = if classify::is_greeting(query) {
        let answer = state
            .generator
            .generate(&prompt::greeting_prompt(query), prompt::MAX_TOKENS_GREETING, 0.8)
            .await
            .map_err(|e| ApiError::Provider(format!("{e:#}")))?;
        (answer, Vec::new(), AnswerPath::Greeting)
    } else if doc_count == 0 {
        let answer = answer_without_documents(state, query).await?;
        (answer, Vec::new(), AnswerPath::NoDocs)
    } else {
        // Ownership of an explicit namespace override is checked before
        // the fallback-wrapped section so it surfaces as Unauthorized,
        // not as a degraded answer.
        let owned = state
            .documents
            .distinct_completed_namespaces(&identity.user_id);
        let namespaces = resolve_namespaces(
            &identity.namespace,
            req.collection_namespace.as_deref(),
            owned,
        )?;
        match answer_with_rag(state, req, query, mode, &namespaces).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("RAG pipeline failed, trying web fallback: {e:#}");
                let answer = answer_error_fallback(state, query).await?;
                (answer, Vec::new(), AnswerPath::RagErrorFallback)
            }
        }
    };

    tracing::info!("Answer path: {path:?}, {} citations", citations.len());

    // Study-mode answers may carry flashcard blocks worth persisting.
    if mode == SessionMode::Study {
        let cards = parse_flashcards(&answer);
        if !cards.is_empty() {
            let topic = truncate_topic(query);
            match state
                .flashcards
                .create(identity.user_id, &session_id, &topic, cards)
            {
                Ok(set) => tracing::info!(
                    "Saved {} flashcards (set {})",
                    set.flashcards.len(),
                    set.set_id
                ),
                Err(e) => tracing::warn!("Failed to save flashcards: {e:#}"),
            }
        }
    }

    state.sessions.append_turn(&session_id, query, &answer)?;

    Ok(QueryResponse {
        answer,
        citations,
        session_id,
    })
}

/// NO_DOCS branch: web search for informational queries, otherwise a
/// direct answer nudging toward an upload.
async fn answer_without_documents(state: &AppState, query: &str) -> Result<String, ApiError> {
    if classify::needs_web_search(query) {
        let results = search_web(&state.http_client, &state.config.web_search, query, 5).await;
        if !results.is_empty() {
            let web_context = format_web_results(&results, WEB_CONTEXT_MAX_CHARS);
            return state
                .generator
                .generate(
                    &prompt::web_answer_prompt(None, &web_context, query),
                    prompt::MAX_TOKENS_ANSWER,
                    0.7,
                )
                .await
                .map_err(|e| ApiError::Provider(format!("{e:#}")));
        }
    }

    state
        .generator
        .generate(&prompt::no_docs_prompt(query), prompt::MAX_TOKENS_ANSWER, 0.7)
        .await
        .map_err(|e| ApiError::Provider(format!("{e:#}")))
}

/// RAG_ERROR_FALLBACK: web-backed answer if possible, else an
/// unconstrained direct answer. Only a failure of that last generation
/// surfaces to the caller.
async fn answer_error_fallback(state: &AppState, query: &str) -> Result<String, ApiError> {
    let results = search_web(&state.http_client, &state.config.web_search, query, 5).await;
    let prompt_text = if results.is_empty() {
        prompt::general_prompt(query)
    } else {
        let web_context = format_web_results(&results, WEB_CONTEXT_MAX_CHARS);
        prompt::web_answer_prompt(None, &web_context, query)
    };

    state
        .generator
        .generate(&prompt_text, prompt::MAX_TOKENS_ANSWER, 0.7)
        .await
        .map_err(|e| ApiError::Provider(format!("{e:#}")))
}

/// The retrieval branch: fan-out search, relevance gate, grounded or
/// web-routed generation, optional reconciliation pass.
async fn answer_with_rag(
    state: &AppState,
    req: &QueryRequest,
    query: &str,
    mode: SessionMode,
    namespaces: &[String],
) -> Result<(String, Vec<Citation>, AnswerPath)> {
    let comprehensive = classify::is_comprehensive(query);
    let top_k = classify::effective_top_k(query, req.top_k);
    if comprehensive {
        tracing::info!("Comprehensive query detected, retrieving top_k={top_k}");
    }
    tracing::debug!("Searching {} namespace(s)", namespaces.len());

    let query_embedding = state.embedder.embed(query).await?;
    let matches = fan_out_search(&*state.vectors, &query_embedding, namespaces, top_k);

    let context = prompt::build_context(&matches);
    let citations = dedupe_citations(&matches);

    // The gate only runs when retrieval produced matches: an empty
    // context would classify as not relevant regardless, so zero matches
    // route straight to the not-relevant branch without a classifier call.
    let relevant = !matches.is_empty()
        && relevance::is_relevant(&*state.generator, query, &context).await;

    if !relevant {
        let answer = answer_not_relevant(state, query, mode).await?;
        return Ok((answer, Vec::new(), AnswerPath::RagNotRelevant));
    }

    // Grounded primary answer
    let max_tokens = if comprehensive {
        prompt::MAX_TOKENS_COMPREHENSIVE
    } else {
        prompt::MAX_TOKENS_ANSWER
    };
    let corpus_answer = state
        .generator
        .generate(
            &prompt::grounded_prompt(mode, &context, query, comprehensive, matches.len()),
            max_tokens,
            0.7,
        )
        .await?;

    // Casual/research answers get a web reconciliation pass; study mode
    // stays corpus-only.
    let answer = if mode.allows_web_search() {
        let results = search_web(&state.http_client, &state.config.web_search, query, 3).await;
        if results.is_empty() {
            corpus_answer
        } else {
            let web_context = format_web_results(&results, WEB_CONTEXT_MAX_CHARS);
            match state
                .generator
                .generate(
                    &prompt::reconciliation_prompt(&corpus_answer, &web_context),
                    prompt::MAX_TOKENS_RECONCILE,
                    0.7,
                )
                .await
            {
                Ok(supplement) => format!("{corpus_answer}\n\n{supplement}"),
                Err(e) => {
                    // The grounded answer stands on its own
                    tracing::warn!("Reconciliation pass failed, keeping corpus answer: {e:#}");
                    corpus_answer
                }
            }
        }
    } else {
        corpus_answer
    };

    Ok((answer, citations, AnswerPath::RagRelevant))
}

/// RAG_NOT_RELEVANT branch: web answer for casual/research, encouraging
/// corpus-free answer for study. Citations stay empty.
async fn answer_not_relevant(
    state: &AppState,
    query: &str,
    mode: SessionMode,
) -> Result<String> {
    if mode.allows_web_search() {
        let results = search_web(&state.http_client, &state.config.web_search, query, 5).await;
        if !results.is_empty() {
            let web_context = format_web_results(&results, WEB_CONTEXT_MAX_CHARS);
            return state
                .generator
                .generate(
                    &prompt::web_answer_prompt(Some(mode), &web_context, query),
                    prompt::MAX_TOKENS_ANSWER,
                    0.7,
                )
                .await;
        }
        return state
            .generator
            .generate(&prompt::general_prompt(query), prompt::MAX_TOKENS_FALLBACK, 0.7)
            .await;
    }

    state
        .generator
        .generate(
            &prompt::study_no_corpus_prompt(query),
            prompt::MAX_TOKENS_FALLBACK,
            0.7,
        )
        .await
}

/// Pick the namespaces to search: an explicit override (if it differs
/// from the caller's default) must belong to the caller; otherwise fan
/// out across every namespace holding the caller's completed documents.
fn resolve_namespaces(
    default_namespace: &str,
    requested: Option<&str>,
    owned: Vec<String>,
) -> Result<Vec<String>, ApiError> {
    match requested {
        Some(ns) if ns != default_namespace => {
            if !ns.starts_with(&format!("{default_namespace}__")) {
                return Err(ApiError::Unauthorized(
                    "Namespace does not belong to the caller".to_string(),
                ));
            }
            Ok(vec![ns.to_string()])
        }
        _ => Ok(owned),
    }
}

/// Deduplicate matches into citations keyed by (document, page): the
/// first (highest-ranked) match wins, snippets are capped.
fn dedupe_citations(matches: &[RetrievedMatch]) -> Vec<Citation> {
    let mut seen: HashSet<(String, Option<u32>)> = HashSet::new();
    let mut citations = Vec::new();

    for m in matches {
        let key = (m.document.clone(), m.page);
        if seen.insert(key) {
            citations.push(Citation {
                document: m.document.clone(),
                page: m.page,
                score: m.score,
                text_snippet: truncate_chars(&m.text, CITATION_SNIPPET_CHARS),
            });
        }
    }
    citations
}

/// Flashcard-set topic from the query: full query under 50 chars,
/// otherwise the first 47 plus an ellipsis.
fn truncate_topic(query: &str) -> String {
    let chars: Vec<char> = query.chars().collect();
    if chars.len() < TOPIC_MAX_CHARS {
        query.to_string()
    } else {
        let head: String = chars[..TOPIC_MAX_CHARS - 3].iter().collect();
        format!("{head}...")
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
