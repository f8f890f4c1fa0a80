use anyhow::Result;
use chrono::{Duration, Utc};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::models::{ChatMessage, ChatSession};
use crate::store::{load_list, persist_list, prefixed_id};

/// Sessions live for 30 days from creation.
const SESSION_TTL_DAYS: i64 = 30;

/// Chat session store with lazy TTL expiry: expired sessions are purged
/// whenever the store is touched, so no background sweeper is needed.
pub struct SessionStore {
    sessions: RwLock<Vec<ChatSession>>,
    persist_path: PathBuf,
}

impl SessionStore {
    pub fn open_or_create(path: &Path) -> Result<Self> {
        Ok(Self {
            sessions: RwLock::new(load_list(path)?),
            persist_path: path.to_path_buf(),
        })
    }

    fn purge_expired(sessions: &mut Vec<ChatSession>) {
        let now = Utc::now();
        sessions.retain(|s| s.expires_at > now);
    }

    pub fn create(&self, user_id: Uuid) -> Result<ChatSession> {
        let now = Utc::now();
        let session = ChatSession {
            session_id: prefixed_id("sess"),
            user_id,
            title: None,
            created_at: now,
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
            messages: Vec::new(),
        };
        let mut sessions = self.sessions.write();
        Self::purge_expired(&mut sessions);
        sessions.push(session.clone());
        persist_list(&self.persist_path, &sessions)?;
        Ok(session)
    }

    /// Fetch a session, owner-checked. Expired sessions are gone.
    pub fn get(&self, session_id: &str, user_id: &Uuid) -> Option<ChatSession> {
        let mut sessions = self.sessions.write();
        Self::purge_expired(&mut sessions);
        sessions
            .iter()
            .find(|s| s.session_id == session_id && &s.user_id == user_id)
            .cloned()
    }

    /// Most recent sessions first, capped at `limit`.
    pub fn list_for_user(&self, user_id: &Uuid, limit: usize) -> Vec<ChatSession> {
        let mut sessions = self.sessions.write();
        Self::purge_expired(&mut sessions);
        let mut owned: Vec<ChatSession> = sessions
            .iter()
            .filter(|s| &s.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        owned.truncate(limit);
        owned
    }

    /// Append one full query turn (user message + assistant message) as a
    /// single mutation, so a crash can never leave a half-written turn.
    pub fn append_turn(
        &self,
        session_id: &str,
        user_content: &str,
        assistant_content: &str,
    ) -> Result<()> {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        if let Some(session) = sessions.iter_mut().find(|s| s.session_id == session_id) {
            session.messages.push(ChatMessage {
                role: "user".to_string(),
                content: user_content.to_string(),
                timestamp: now,
            });
            session.messages.push(ChatMessage {
                role: "assistant".to_string(),
                content: assistant_content.to_string(),
                timestamp: now,
            });
        }
        persist_list(&self.persist_path, &sessions)
    }

    pub fn set_title(&self, session_id: &str, title: &str) -> Result<()> {
        let mut sessions = self.sessions.write();
        if let Some(session) = sessions.iter_mut().find(|s| s.session_id == session_id) {
            session.title = Some(title.to_string());
        }
        persist_list(&self.persist_path, &sessions)
    }

    pub fn delete(&self, session_id: &str, user_id: &Uuid) -> Result<bool> {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|s| !(s.session_id == session_id && &s.user_id == user_id));
        let removed = sessions.len() < before;
        persist_list(&self.persist_path, &sessions)?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_sets_30_day_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open_or_create(&dir.path().join("s.json")).unwrap();
        let session = store.create(Uuid::new_v4()).unwrap();
        let ttl = session.expires_at - session.created_at;
        assert_eq!(ttl.num_days(), SESSION_TTL_DAYS);
    }

    #[test]
    fn test_append_turn_writes_both_messages() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open_or_create(&dir.path().join("s.json")).unwrap();
        let user = Uuid::new_v4();
        let session = store.create(user).unwrap();

        store
            .append_turn(&session.session_id, "what is X?", "X is ...")
            .unwrap();

        let session = store.get(&session.session_id, &user).unwrap();
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].role, "user");
        assert_eq!(session.messages[1].role, "assistant");
    }

    #[test]
    fn test_get_is_owner_checked() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open_or_create(&dir.path().join("s.json")).unwrap();
        let session = store.create(Uuid::new_v4()).unwrap();
        assert!(store.get(&session.session_id, &Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_expired_sessions_are_purged() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open_or_create(&dir.path().join("s.json")).unwrap();
        let user = Uuid::new_v4();
        let session = store.create(user).unwrap();

        // Force-expire the session
        {
            let mut sessions = store.sessions.write();
            sessions[0].expires_at = Utc::now() - Duration::seconds(1);
        }

        assert!(store.get(&session.session_id, &user).is_none());
        assert!(store.list_for_user(&user, 50).is_empty());
    }

    #[test]
    fn test_list_is_most_recent_first_and_capped() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open_or_create(&dir.path().join("s.json")).unwrap();
        let user = Uuid::new_v4();
        let first = store.create(user).unwrap();
        // Nudge ordering: make the first session strictly older
        {
            let mut sessions = store.sessions.write();
            sessions[0].created_at = Utc::now() - Duration::minutes(5);
        }
        let second = store.create(user).unwrap();

        let listed = store.list_for_user(&user, 1);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].session_id, second.session_id);
        assert_ne!(listed[0].session_id, first.session_id);
    }
}
