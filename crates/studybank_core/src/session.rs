//! crates/studybank_core/src/session.rs
//!
//! The session store: the current bearer credential and user identity,
//! mirrored to durable storage so a restarted process picks them back up.

use crate::domain::User;
use crate::ports::{KeyValueStore, PortError, PortResult};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

/// Storage key for the bearer credential.
pub const TOKEN_KEY: &str = "access_token";
/// Storage key for the JSON-serialized user profile.
pub const USER_KEY: &str = "user";

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    user: Option<User>,
}

pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    state: RwLock<SessionState>,
}

impl SessionStore {
    /// Restores the session persisted in `storage`.
    ///
    /// Never fails: unreadable entries are logged and treated as absent. A
    /// stored user that no longer parses is dropped (memory and storage)
    /// while the credential is kept.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let token = match storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!("Failed to read stored credential: {}", e);
                None
            }
        };

        let user = match storage.get(USER_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!("Discarding unreadable stored user: {}", e);
                    if let Err(e) = storage.remove(USER_KEY) {
                        warn!("Failed to remove unreadable stored user: {}", e);
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read stored user: {}", e);
                None
            }
        };

        Self {
            storage,
            state: RwLock::new(SessionState { token, user }),
        }
    }

    /// Starts a session. Memory is updated first, so the new credential is
    /// in effect even if persisting it fails.
    pub fn login(&self, user: User, token: String) -> PortResult<()> {
        let serialized =
            serde_json::to_string(&user).map_err(|e| PortError::Unexpected(e.to_string()))?;
        let user_id = user.id;
        {
            let mut state = self.state.write();
            state.token = Some(token.clone());
            state.user = Some(user);
        }
        self.storage.set(TOKEN_KEY, &token)?;
        self.storage.set(USER_KEY, &serialized)?;
        info!(user_id, "Session started");
        Ok(())
    }

    /// Ends the session in memory and in storage. Storage failures are
    /// logged only.
    pub fn logout(&self) {
        {
            let mut state = self.state.write();
            state.token = None;
            state.user = None;
        }
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!("Failed to remove '{}' from storage: {}", key, e);
            }
        }
        info!("Session cleared");
    }

    /// Replaces the identity of the current session, keeping the credential.
    pub fn set_user(&self, user: User) -> PortResult<()> {
        let serialized =
            serde_json::to_string(&user).map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.state.write().user = Some(user);
        self.storage.set(USER_KEY, &serialized)
    }

    pub fn token(&self) -> Option<String> {
        self.state.read().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.read().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state
            .read()
            .token
            .as_deref()
            .is_some_and(|t| !t.is_empty())
    }

    /// The durable storage backing this session.
    pub fn storage(&self) -> Arc<dyn KeyValueStore> {
        self.storage.clone()
    }
}
