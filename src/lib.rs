//! # doc-chat
//!
//! A retrieval-augmented chat backend: users upload documents whose
//! chunks are embedded into a namespace-partitioned vector index, and
//! natural-language queries are answered by retrieving relevant chunks,
//! optionally blending in live web search, and generating an answer
//! through a hosted language model.
//!
//! ## Answer pipeline
//!
//! ```text
//!                    ┌──────────────┐
//!                    │  User Query  │
//!                    └──────┬───────┘
//!                           │
//!                 greeting? ├────────────► GREETING (1-sentence reply)
//!                           │
//!              zero docs?   ├────────────► NO_DOCS (web if informational,
//!                           │                       else direct answer)
//!                           ▼
//!              ┌─────────────────────────┐
//!              │ Namespace resolution    │  explicit override, or all
//!              │ + fan-out retrieval     │  namespaces the caller owns
//!              └────────────┬────────────┘
//!                           ▼
//!              ┌─────────────────────────┐
//!              │ Relevance gate (LLM,    │  fail-closed: anything but a
//!              │ 500-char sample)        │  clean RELEVANT routes away
//!              └──────┬───────────┬──────┘
//!                     │ relevant  │ not relevant
//!                     ▼           ▼
//!          ┌───────────────┐   ┌──────────────────────┐
//!          │ Grounded      │   │ casual/research: web  │
//!          │ answer        │   │ study: encouragement  │
//!          └──────┬────────┘   └──────────────────────┘
//!                 │ casual/research + web results
//!                 ▼
//!          ┌───────────────────────────┐
//!          │ Reconciliation pass:      │
//!          │ web section always,       │
//!          │ discrepancies only if real│
//!          └───────────────────────────┘
//! ```
//!
//! Any error inside the retrieval branch degrades to a web-backed and
//! finally an unconstrained direct answer; the caller only sees a hard
//! failure when every tier fails.
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, providers, and stores
//! - [`models`] - Shared data types: sessions, flashcards, documents, requests
//! - [`error`] - `ApiError` taxonomy mapped to HTTP statuses
//! - [`auth`] - Bearer-token identity extraction
//! - [`store`] - JSON-file persistence: users, documents, sessions, flashcards
//! - [`llm`] - Generation and embedding provider adapters
//! - [`search`] - Namespace-partitioned vector store and fan-out search
//! - [`websearch`] - Web search adapter with graceful empty-result degradation
//! - [`chat`] - Classification, prompt composition, relevance gate,
//!   flashcard parsing, and the orchestrator
//! - [`api`] - Axum HTTP handlers
//! - [`state`] - Shared application state

pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod search;
pub mod state;
pub mod store;
pub mod websearch;
