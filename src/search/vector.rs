use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::RetrievedMatch;
use crate::store::persist_list;

/// A stored vector entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VectorEntry {
    id: String,
    namespace: String,
    document: String,
    page: Option<u32>,
    text: String,
    embedding: Vec<f32>,
}

/// Nearest-neighbor search over one named partition of the index.
///
/// The trait is the seam the orchestrator depends on; the in-memory
/// store below is the default implementation.
pub trait VectorSearch: Send + Sync {
    fn search(
        &self,
        query_embedding: &[f32],
        namespace: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedMatch>>;
}

/// In-memory vector store, partitioned by namespace, with disk
/// persistence and cosine similarity search.
pub struct VectorStore {
    entries: RwLock<Vec<VectorEntry>>,
    persist_path: PathBuf,
}

impl VectorStore {
    pub fn open_or_create(vector_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(vector_dir)?;
        let persist_path = vector_dir.join("vectors.json");

        let entries = if persist_path.exists() {
            let data =
                std::fs::read_to_string(&persist_path).context("Failed to read vector store")?;
            serde_json::from_str(&data).unwrap_or_default()
        } else {
            Vec::new()
        };

        Ok(Self {
            entries: RwLock::new(entries),
            persist_path,
        })
    }

    /// Upsert chunk vectors into a namespace. `embeddings` must be
    /// parallel with `chunks`. Existing entries with the same id are
    /// replaced.
    pub fn upsert(
        &self,
        namespace: &str,
        chunks: &[(String, String, Option<u32>, String)], // (id, document, page, text)
        embeddings: Vec<Vec<f32>>,
    ) -> Result<()> {
        let mut entries = self.entries.write();

        for (i, (id, document, page, text)) in chunks.iter().enumerate() {
            if let Some(embedding) = embeddings.get(i) {
                entries.retain(|e| !(e.namespace == namespace && &e.id == id));
                entries.push(VectorEntry {
                    id: id.clone(),
                    namespace: namespace.to_string(),
                    document: document.clone(),
                    page: *page,
                    text: text.clone(),
                    embedding: embedding.clone(),
                });
            }
        }

        persist_list(&self.persist_path, &entries)
    }

    /// Delete entries by id within a namespace.
    pub fn delete_ids(&self, namespace: &str, ids: &[String]) -> Result<()> {
        let mut entries = self.entries.write();
        entries.retain(|e| !(e.namespace == namespace && ids.contains(&e.id)));
        persist_list(&self.persist_path, &entries)
    }

    pub fn entry_count(&self) -> usize {
        self.entries.read().len()
    }
}

impl VectorSearch for VectorStore {
    /// Search one namespace by cosine similarity, best score first.
    fn search(
        &self,
        query_embedding: &[f32],
        namespace: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedMatch>> {
        let entries = self.entries.read();

        let mut scored: Vec<(f32, &VectorEntry)> = entries
            .iter()
            .filter(|e| e.namespace == namespace)
            .map(|e| (cosine_similarity(query_embedding, &e.embedding), e))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(score, e)| RetrievedMatch {
                namespace: e.namespace.clone(),
                score,
                document: e.document.clone(),
                page: e.page,
                text: e.text.clone(),
            })
            .collect())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}
