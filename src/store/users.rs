use anyhow::Result;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::models::User;
use crate::store::{load_list, persist_list, prefixed_id};

/// User registry. Credential issuance and verification live elsewhere;
/// this store only resolves opaque bearer tokens to identities.
pub struct UserStore {
    users: RwLock<Vec<User>>,
    persist_path: PathBuf,
}

impl UserStore {
    pub fn open_or_create(path: &Path) -> Result<Self> {
        let users = load_list(path)?;
        let store = Self {
            users: RwLock::new(users),
            persist_path: path.to_path_buf(),
        };

        // Seed a local default user so a fresh install is usable without
        // an external identity provider.
        if store.users.read().is_empty() {
            let user = store.create("local")?;
            tracing::info!("Created default user (token: {})", user.token);
        }

        Ok(store)
    }

    pub fn create(&self, username: &str) -> Result<User> {
        let id = Uuid::new_v4();
        let user = User {
            id,
            username: username.to_string(),
            token: prefixed_id("tok"),
            namespace: User::default_namespace(&id),
        };
        let mut users = self.users.write();
        users.push(user.clone());
        persist_list(&self.persist_path, &users)?;
        Ok(user)
    }

    /// Resolve a bearer token to a user, or None for unknown tokens.
    pub fn find_by_token(&self, token: &str) -> Option<User> {
        self.users.read().iter().find(|u| u.token == token).cloned()
    }

    pub fn get(&self, id: &Uuid) -> Option<User> {
        self.users.read().iter().find(|u| &u.id == id).cloned()
    }
}
