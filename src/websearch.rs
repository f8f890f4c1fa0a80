//! Web search adapter (Tavily-style API).
//!
//! This boundary never raises: a missing API key or any provider error
//! degrades to an empty result list, and callers treat "no results" as a
//! valid outcome rather than a failure.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;

use crate::config::WebSearchConfig;

/// Per-result content cap when formatting for LLM context.
const RESULT_CONTENT_CHARS: usize = 500;

/// Default soft budget for a formatted web context block.
pub const WEB_CONTEXT_MAX_CHARS: usize = 3_000;

/// Retry budget for search requests: 3 attempts, 1s/2s/4s backoff.
const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebResult {
    pub title: String,
    pub url: String,
    pub content: String,
    pub score: f32,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<RawResult>,
}

#[derive(Deserialize)]
struct RawResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: f32,
}

/// Search the web, returning up to `max_results` ranked results. Returns
/// an empty list when no provider is configured or every attempt fails.
pub async fn search_web(
    client: &reqwest::Client,
    config: &WebSearchConfig,
    query: &str,
    max_results: usize,
) -> Vec<WebResult> {
    let Some(api_key) = config.api_key.as_deref() else {
        tracing::debug!("Web search provider not configured, skipping");
        return Vec::new();
    };

    for attempt in 0..MAX_ATTEMPTS {
        if attempt > 0 {
            let wait = Duration::from_secs(1 << (attempt - 1)); // 1s, 2s, 4s
            tokio::time::sleep(wait).await;
        }
        match search_once(client, config, api_key, query, max_results).await {
            Ok(results) => {
                tracing::info!("Web search returned {} results", results.len());
                return results;
            }
            Err(e) => {
                tracing::warn!(
                    "Web search failed (attempt {}/{MAX_ATTEMPTS}): {e}",
                    attempt + 1
                );
            }
        }
    }
    Vec::new()
}

async fn search_once(
    client: &reqwest::Client,
    config: &WebSearchConfig,
    api_key: &str,
    query: &str,
    max_results: usize,
) -> anyhow::Result<Vec<WebResult>> {
    let url = format!("{}/search", config.base_url);
    let req = SearchRequest {
        api_key,
        query,
        max_results,
        search_depth: "basic",
    };

    let resp = client
        .post(&url)
        .timeout(Duration::from_secs(config.timeout_secs))
        .json(&req)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Web search API returned {status}: {body}");
    }

    let body: SearchResponse = resp.json().await?;
    Ok(body
        .results
        .into_iter()
        .map(|r| WebResult {
            title: r.title,
            url: r.url,
            content: r.content,
            score: r.score,
        })
        .collect())
}

/// Format results into LLM context text within a soft length budget.
/// Blocks are appended greedily in rank order; a block that would push
/// the total past `max_chars` ends the output, so partial result sets
/// are preferred over text cut mid-block.
pub fn format_web_results(results: &[WebResult], max_chars: usize) -> String {
    if results.is_empty() {
        return String::new();
    }

    let mut context = String::new();
    for (i, result) in results.iter().enumerate() {
        let content = truncate_chars(&result.content, RESULT_CONTENT_CHARS);
        let mut block = String::new();
        write!(
            block,
            "**Web Result {}: {}**\nSource: {}\n{}\n",
            i + 1,
            result.title,
            result.url,
            content
        )
        .unwrap();

        if context.len() + block.len() > max_chars {
            break;
        }
        if !context.is_empty() {
            context.push('\n');
        }
        context.push_str(&block);
    }
    context
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.len() <= max_chars {
        return s.to_string();
    }
    let truncated: String = s
        .char_indices()
        .take_while(|(i, _)| *i < max_chars)
        .map(|(_, c)| c)
        .collect();
    format!("{truncated}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str, content_len: usize) -> WebResult {
        WebResult {
            title: title.into(),
            url: format!("https://example.com/{title}"),
            content: "x".repeat(content_len),
            score: 0.5,
        }
    }

    #[test]
    fn test_format_empty_results() {
        assert_eq!(format_web_results(&[], WEB_CONTEXT_MAX_CHARS), "");
    }

    #[test]
    fn test_format_includes_title_url_content() {
        let formatted = format_web_results(&[result("guide", 50)], WEB_CONTEXT_MAX_CHARS);
        assert!(formatted.contains("**Web Result 1: guide**"));
        assert!(formatted.contains("Source: https://example.com/guide"));
        assert!(formatted.contains("xxx"));
    }

    #[test]
    fn test_format_truncates_long_content_per_result() {
        let formatted = format_web_results(&[result("big", 2_000)], WEB_CONTEXT_MAX_CHARS);
        assert!(formatted.contains("..."));
        // 500 chars of content plus the header, nowhere near 2000
        assert!(formatted.len() < 700);
    }

    #[test]
    fn test_format_stops_before_exceeding_budget() {
        let results: Vec<WebResult> = (0..10).map(|i| result(&format!("r{i}"), 400)).collect();
        let formatted = format_web_results(&results, 1_000);
        assert!(formatted.len() <= 1_000);
        // Whole blocks only: the last included block is intact
        assert!(formatted.contains("**Web Result 1: r0**"));
        assert!(!formatted.contains("**Web Result 9: r8**"));
    }

    #[test]
    fn test_format_preserves_rank_order() {
        let results = vec![result("first", 10), result("second", 10)];
        let formatted = format_web_results(&results, WEB_CONTEXT_MAX_CHARS);
        let first_pos = formatted.find("first").unwrap();
        let second_pos = formatted.find("second").unwrap();
        assert!(first_pos < second_pos);
    }

    #[test]
    fn test_truncate_chars_respects_boundary() {
        let s = "é".repeat(600);
        let out = truncate_chars(&s, RESULT_CONTENT_CHARS);
        assert!(out.ends_with("..."));
    }
}
