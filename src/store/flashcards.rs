use anyhow::Result;
use chrono::Utc;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::models::{Flashcard, FlashcardSet};
use crate::store::{load_list, persist_list, prefixed_id};

/// Flashcard set store. Sets are created either explicitly through the
/// API or as a study-mode side effect of the answer pipeline.
pub struct FlashcardStore {
    sets: RwLock<Vec<FlashcardSet>>,
    persist_path: PathBuf,
}

impl FlashcardStore {
    pub fn open_or_create(path: &Path) -> Result<Self> {
        Ok(Self {
            sets: RwLock::new(load_list(path)?),
            persist_path: path.to_path_buf(),
        })
    }

    pub fn create(
        &self,
        user_id: Uuid,
        session_id: &str,
        topic: &str,
        flashcards: Vec<Flashcard>,
    ) -> Result<FlashcardSet> {
        let set = FlashcardSet {
            set_id: prefixed_id("fc"),
            user_id,
            session_id: session_id.to_string(),
            topic: topic.to_string(),
            flashcards,
            created_at: Utc::now(),
            last_reviewed: None,
        };
        let mut sets = self.sets.write();
        sets.push(set.clone());
        persist_list(&self.persist_path, &sets)?;
        Ok(set)
    }

    /// All sets for a user, most recent first.
    pub fn list_for_user(&self, user_id: &Uuid) -> Vec<FlashcardSet> {
        let mut owned: Vec<FlashcardSet> = self
            .sets
            .read()
            .iter()
            .filter(|s| &s.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        owned
    }

    pub fn list_for_session(&self, user_id: &Uuid, session_id: &str) -> Vec<FlashcardSet> {
        let mut owned: Vec<FlashcardSet> = self
            .sets
            .read()
            .iter()
            .filter(|s| &s.user_id == user_id && s.session_id == session_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        owned
    }

    pub fn mark_reviewed(&self, set_id: &str, user_id: &Uuid) -> Result<bool> {
        let mut sets = self.sets.write();
        let mut found = false;
        if let Some(set) = sets
            .iter_mut()
            .find(|s| s.set_id == set_id && &s.user_id == user_id)
        {
            set.last_reviewed = Some(Utc::now());
            found = true;
        }
        persist_list(&self.persist_path, &sets)?;
        Ok(found)
    }

    pub fn delete(&self, set_id: &str, user_id: &Uuid) -> Result<bool> {
        let mut sets = self.sets.write();
        let before = sets.len();
        sets.retain(|s| !(s.set_id == set_id && &s.user_id == user_id));
        let removed = sets.len() < before;
        persist_list(&self.persist_path, &sets)?;
        Ok(removed)
    }
}
