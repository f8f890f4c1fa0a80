//! End-to-end tests of the pieces the HTTP layer composes: document and
//! vector ingestion through fan-out retrieval and context assembly, the
//! study-mode flashcard flow, session transcript persistence across
//! process restarts, and the orchestrator's branch selection driven by
//! scripted generation and embedding providers. No network calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use doc_chat::auth::Identity;
use doc_chat::chat::{classify, flashcards, orchestrator, prompt, relevance};
use doc_chat::config::Config;
use doc_chat::llm::{Embedder, TextGenerator};
use doc_chat::models::{Document, Flashcard, ProcessingStatus, QueryRequest, User};
use doc_chat::search::fanout::fan_out_search;
use doc_chat::search::vector::{VectorSearch, VectorStore};
use doc_chat::state::AppState;
use doc_chat::store::documents::DocumentStore;
use doc_chat::store::flashcards::FlashcardStore;
use doc_chat::store::sessions::SessionStore;
use doc_chat::store::users::UserStore;

fn completed_doc(user_id: Uuid, namespace: &str, filename: &str) -> Document {
    Document {
        id: Uuid::new_v4(),
        user_id,
        filename: filename.to_string(),
        namespace: namespace.to_string(),
        processing_status: ProcessingStatus::Completed,
        chunk_count: 2,
        uploaded_at: Utc::now(),
    }
}

#[test]
fn test_ingest_then_fan_out_retrieval() {
    let dir = tempfile::tempdir().unwrap();
    let user_id = Uuid::new_v4();
    let default_ns = User::default_namespace(&user_id);
    let bio_ns = format!("{default_ns}__biology");

    let docs = DocumentStore::open_or_create(&dir.path().join("docs.json")).unwrap();
    docs.insert(completed_doc(user_id, &default_ns, "general.pdf"))
        .unwrap();
    docs.insert(completed_doc(user_id, &bio_ns, "cells.pdf"))
        .unwrap();

    let vectors = VectorStore::open_or_create(&dir.path().join("vectors")).unwrap();
    vectors
        .upsert(
            &default_ns,
            &[
                (
                    "g1".to_string(),
                    "general.pdf".to_string(),
                    Some(1),
                    "Photosynthesis converts light into chemical energy.".to_string(),
                ),
                (
                    "g2".to_string(),
                    "general.pdf".to_string(),
                    Some(2),
                    "The French Revolution began in 1789.".to_string(),
                ),
            ],
            vec![vec![1.0, 0.0, 0.0], vec![0.0, 0.0, 1.0]],
        )
        .unwrap();
    vectors
        .upsert(
            &bio_ns,
            &[(
                "b1".to_string(),
                "cells.pdf".to_string(),
                Some(7),
                "Chloroplasts are the site of photosynthesis.".to_string(),
            )],
            vec![vec![0.9, 0.1, 0.0]],
        )
        .unwrap();

    // The orchestrator fans out over every namespace holding completed docs
    let namespaces = docs.distinct_completed_namespaces(&user_id);
    assert_eq!(namespaces, vec![default_ns.clone(), bio_ns.clone()]);

    let query_embedding = [1.0, 0.0, 0.0];
    let matches = fan_out_search(&vectors, &query_embedding, &namespaces, 2);

    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].document, "general.pdf");
    assert_eq!(matches[1].document, "cells.pdf");
    assert!(matches[0].score >= matches[1].score);

    let context = prompt::build_context(&matches);
    assert!(context.contains("[general.pdf, p.1]"));
    assert!(context.contains("[cells.pdf, p.7]"));
    assert!(context.contains("Chloroplasts"));
}

#[test]
fn test_comprehensive_query_widens_retrieval() {
    let query = "List all the topics covered in my notes";
    assert!(classify::is_comprehensive(query));
    assert_eq!(classify::effective_top_k(query, 15), 35);
    assert_eq!(classify::effective_top_k(query, 5), 15);
    assert_eq!(classify::effective_top_k("What is osmosis?", 15), 15);
}

#[test]
fn test_greeting_detection_is_exact_match() {
    assert!(classify::is_greeting("Hello!"));
    assert!(classify::is_greeting("  good morning  "));
    assert!(!classify::is_greeting("hello, can you summarize my notes?"));
}

#[test]
fn test_relevance_parser_fails_closed() {
    assert!(relevance::parse_relevance("RELEVANT"));
    assert!(relevance::parse_relevance("The context is relevant."));
    assert!(!relevance::parse_relevance("NOT RELEVANT"));
    assert!(!relevance::parse_relevance("not relevant to the query"));
    assert!(!relevance::parse_relevance("I cannot determine this."));
    assert!(!relevance::parse_relevance(""));
}

#[test]
fn test_study_answer_to_persisted_flashcards() {
    let dir = tempfile::tempdir().unwrap();
    let user_id = Uuid::new_v4();

    let answer = "Great question! Let's break it down.\n\n\
                  FLASHCARD_START\n\
                  Q: What organelle performs photosynthesis?\n\
                  A: The chloroplast.\n\
                  FLASHCARD_END\n\n\
                  FLASHCARD_START\n\
                  Q: What pigment absorbs light?\n\
                  A: Chlorophyll.\n\
                  FLASHCARD_END\n\n\
                  Keep reviewing these!";

    let cards = flashcards::parse_flashcards(answer);
    assert_eq!(cards.len(), 2);

    let store = FlashcardStore::open_or_create(&dir.path().join("fc.json")).unwrap();
    let set = store
        .create(user_id, "sess_abc", "Photosynthesis basics", cards)
        .unwrap();

    let listed = store.list_for_session(&user_id, "sess_abc");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].set_id, set.set_id);
    assert_eq!(listed[0].flashcards.len(), 2);
    assert_eq!(
        listed[0].flashcards[1],
        Flashcard {
            question: "What pigment absorbs light?".to_string(),
            answer: "Chlorophyll.".to_string(),
        }
    );
}

#[test]
fn test_answer_without_markers_creates_no_set() {
    let answer = "Photosynthesis happens in the chloroplast, where chlorophyll \
                  absorbs light energy.";
    assert!(flashcards::parse_flashcards(answer).is_empty());
}

#[test]
fn test_session_transcript_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.json");
    let user_id = Uuid::new_v4();

    let session_id = {
        let store = SessionStore::open_or_create(&path).unwrap();
        let session = store.create(user_id).unwrap();
        store
            .append_turn(&session.session_id, "What is osmosis?", "Osmosis is ...")
            .unwrap();
        store
            .append_turn(&session.session_id, "And diffusion?", "Diffusion is ...")
            .unwrap();
        session.session_id
    };

    // Reopen from disk, as a fresh process would
    let store = SessionStore::open_or_create(&path).unwrap();
    let session = store.get(&session_id, &user_id).unwrap();
    assert_eq!(session.messages.len(), 4);
    assert_eq!(session.messages[0].role, "user");
    assert_eq!(session.messages[0].content, "What is osmosis?");
    assert_eq!(session.messages[3].role, "assistant");
    assert!(session.expires_at > session.created_at);
}

/// Scripted generator: a fixed reply per call class, recognized the way
/// the pipeline distinguishes them. Relevance-gate calls (the only ones
/// with a 10-token budget) get `relevance_reply` and are counted.
struct ScriptedGenerator {
    relevance_reply: &'static str,
    relevance_calls: AtomicUsize,
}

impl ScriptedGenerator {
    fn replying(relevance_reply: &'static str) -> Arc<Self> {
        Arc::new(Self {
            relevance_reply,
            relevance_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        _temperature: f32,
    ) -> anyhow::Result<String> {
        if max_tokens == 10 {
            self.relevance_calls.fetch_add(1, Ordering::SeqCst);
            return Ok(self.relevance_reply.to_string());
        }
        if prompt.contains("Respond to this greeting") {
            Ok("Hello! How can I help?".to_string())
        } else if prompt.contains("Retrieved Context from User's Documents") {
            Ok("Grounded answer with sources.".to_string())
        } else {
            Ok("General fallback answer.".to_string())
        }
    }
}

/// Embedder returning one fixed vector, counting calls.
struct FixedEmbedder {
    vector: Vec<f32>,
    calls: AtomicUsize,
}

impl FixedEmbedder {
    fn returning(vector: Vec<f32>) -> Arc<Self> {
        Arc::new(Self {
            vector,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vector.clone())
    }
}

/// Full application state over a temp dir with scripted providers. Web
/// search stays unconfigured, so it degrades to empty results.
fn pipeline_state(
    dir: &std::path::Path,
    generator: Arc<ScriptedGenerator>,
    embedder: Arc<FixedEmbedder>,
) -> AppState {
    let config = Config {
        data_dir: dir.to_path_buf(),
        ..Config::default()
    };
    std::fs::create_dir_all(config.vector_dir()).unwrap();
    AppState {
        users: Arc::new(UserStore::open_or_create(&config.users_path()).unwrap()),
        documents: Arc::new(DocumentStore::open_or_create(&config.documents_path()).unwrap()),
        sessions: Arc::new(SessionStore::open_or_create(&config.sessions_path()).unwrap()),
        flashcards: Arc::new(FlashcardStore::open_or_create(&config.flashcards_path()).unwrap()),
        vectors: Arc::new(VectorStore::open_or_create(&config.vector_dir()).unwrap()),
        generator,
        embedder,
        http_client: reqwest::Client::new(),
        chat_semaphore: Arc::new(tokio::sync::Semaphore::new(2)),
        config,
    }
}

fn test_identity(state: &AppState) -> Identity {
    let user = state.users.create("tester").unwrap();
    Identity {
        user_id: user.id,
        namespace: user.namespace,
    }
}

fn plain_query(query: &str) -> QueryRequest {
    QueryRequest {
        query: query.to_string(),
        session_id: None,
        collection_namespace: None,
        top_k: 15,
        mode: None,
    }
}

/// Seed one completed document and one indexed chunk for the identity.
fn seed_corpus(state: &AppState, identity: &Identity) {
    state
        .documents
        .insert(completed_doc(identity.user_id, &identity.namespace, "notes.pdf"))
        .unwrap();
    state
        .vectors
        .upsert(
            &identity.namespace,
            &[(
                "c1".to_string(),
                "notes.pdf".to_string(),
                Some(2),
                "Photosynthesis converts light into chemical energy.".to_string(),
            )],
            vec![vec![1.0, 0.0]],
        )
        .unwrap();
}

#[tokio::test]
async fn test_greeting_skips_retrieval_and_has_no_citations() {
    let dir = tempfile::tempdir().unwrap();
    let generator = ScriptedGenerator::replying("RELEVANT");
    let embedder = FixedEmbedder::returning(vec![1.0, 0.0]);
    let state = pipeline_state(dir.path(), generator.clone(), embedder.clone());
    let identity = test_identity(&state);
    seed_corpus(&state, &identity);

    let resp = orchestrator::answer_query(&state, &identity, &plain_query("hi"))
        .await
        .unwrap();

    assert_eq!(resp.answer, "Hello! How can I help?");
    assert!(resp.citations.is_empty());
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    assert_eq!(generator.relevance_calls.load(Ordering::SeqCst), 0);

    // Both turn messages were appended to the new session
    let session = state.sessions.get(&resp.session_id, &identity.user_id).unwrap();
    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.messages[0].content, "hi");
}

#[tokio::test]
async fn test_relevant_corpus_answers_with_citations() {
    let dir = tempfile::tempdir().unwrap();
    let generator = ScriptedGenerator::replying("RELEVANT");
    let embedder = FixedEmbedder::returning(vec![1.0, 0.0]);
    let state = pipeline_state(dir.path(), generator.clone(), embedder.clone());
    let identity = test_identity(&state);
    seed_corpus(&state, &identity);

    let resp = orchestrator::answer_query(
        &state,
        &identity,
        &plain_query("Where does photosynthesis happen?"),
    )
    .await
    .unwrap();

    assert_eq!(resp.answer, "Grounded answer with sources.");
    assert_eq!(resp.citations.len(), 1);
    assert_eq!(resp.citations[0].document, "notes.pdf");
    assert_eq!(resp.citations[0].page, Some(2));
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    assert_eq!(generator.relevance_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_irrelevant_corpus_answers_without_citations() {
    let dir = tempfile::tempdir().unwrap();
    let generator = ScriptedGenerator::replying("NOT_RELEVANT");
    let embedder = FixedEmbedder::returning(vec![1.0, 0.0]);
    let state = pipeline_state(dir.path(), generator.clone(), embedder.clone());
    let identity = test_identity(&state);
    seed_corpus(&state, &identity);

    let resp = orchestrator::answer_query(
        &state,
        &identity,
        &plain_query("Tell me about medieval castles"),
    )
    .await
    .unwrap();

    assert_eq!(resp.answer, "General fallback answer.");
    assert!(resp.citations.is_empty());
    assert_eq!(generator.relevance_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_empty_retrieval_routes_not_relevant_without_gate_call() {
    let dir = tempfile::tempdir().unwrap();
    let generator = ScriptedGenerator::replying("RELEVANT");
    let embedder = FixedEmbedder::returning(vec![1.0, 0.0]);
    let state = pipeline_state(dir.path(), generator.clone(), embedder.clone());
    let identity = test_identity(&state);

    // Completed document on record, but nothing indexed
    state
        .documents
        .insert(completed_doc(identity.user_id, &identity.namespace, "notes.pdf"))
        .unwrap();

    let resp = orchestrator::answer_query(
        &state,
        &identity,
        &plain_query("Where does photosynthesis happen?"),
    )
    .await
    .unwrap();

    assert_eq!(resp.answer, "General fallback answer.");
    assert!(resp.citations.is_empty());
    assert_eq!(generator.relevance_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_vector_index_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let vectors = VectorStore::open_or_create(dir.path()).unwrap();
        vectors
            .upsert(
                "user_x",
                &[(
                    "c1".to_string(),
                    "notes.pdf".to_string(),
                    Some(4),
                    "Entropy always increases.".to_string(),
                )],
                vec![vec![0.6, 0.8]],
            )
            .unwrap();
    }

    let vectors = VectorStore::open_or_create(dir.path()).unwrap();
    let hits = vectors
        .search(&[0.6, 0.8], "user_x", 5)
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].document, "notes.pdf");
    assert_eq!(hits[0].page, Some(4));
}
