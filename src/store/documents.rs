use anyhow::Result;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::models::{Document, ProcessingStatus};
use crate::store::{load_list, persist_list};

/// Document metadata store. The ingestion collaborator inserts records
/// and flips their status; the query pipeline only reads completed ones.
pub struct DocumentStore {
    documents: RwLock<Vec<Document>>,
    persist_path: PathBuf,
}

impl DocumentStore {
    pub fn open_or_create(path: &Path) -> Result<Self> {
        Ok(Self {
            documents: RwLock::new(load_list(path)?),
            persist_path: path.to_path_buf(),
        })
    }

    pub fn insert(&self, document: Document) -> Result<()> {
        let mut docs = self.documents.write();
        docs.push(document);
        persist_list(&self.persist_path, &docs)
    }

    pub fn set_status(&self, id: &Uuid, status: ProcessingStatus, chunk_count: usize) -> Result<()> {
        let mut docs = self.documents.write();
        if let Some(doc) = docs.iter_mut().find(|d| &d.id == id) {
            doc.processing_status = status;
            doc.chunk_count = chunk_count;
        }
        persist_list(&self.persist_path, &docs)
    }

    pub fn delete(&self, id: &Uuid, user_id: &Uuid) -> Result<bool> {
        let mut docs = self.documents.write();
        let before = docs.len();
        docs.retain(|d| !(&d.id == id && &d.user_id == user_id));
        let removed = docs.len() < before;
        persist_list(&self.persist_path, &docs)?;
        Ok(removed)
    }

    pub fn list_for_user(&self, user_id: &Uuid) -> Vec<Document> {
        self.documents
            .read()
            .iter()
            .filter(|d| &d.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Number of fully processed documents owned by `user_id`.
    pub fn count_completed(&self, user_id: &Uuid) -> usize {
        self.documents
            .read()
            .iter()
            .filter(|d| &d.user_id == user_id && d.processing_status == ProcessingStatus::Completed)
            .count()
    }

    /// Distinct namespaces holding completed documents for `user_id`,
    /// in first-seen order.
    pub fn distinct_completed_namespaces(&self, user_id: &Uuid) -> Vec<String> {
        let docs = self.documents.read();
        let mut namespaces: Vec<String> = Vec::new();
        for doc in docs.iter() {
            if &doc.user_id == user_id
                && doc.processing_status == ProcessingStatus::Completed
                && !namespaces.contains(&doc.namespace)
            {
                namespaces.push(doc.namespace.clone());
            }
        }
        namespaces
    }
}
