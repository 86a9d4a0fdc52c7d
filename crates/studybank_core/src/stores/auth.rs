//! crates/studybank_core/src/stores/auth.rs
//!
//! Session actions that need the network: login, registration and
//! refreshing the current identity. The credential itself lives in the
//! `SessionStore`.

use crate::client::ApiClient;
use crate::domain::{Credentials, Registration, User};
use crate::ports::{PortError, PortResult};
use crate::session::SessionStore;
use crate::stores::loading::LoadingCounter;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{error, info};

pub struct AuthStore {
    api: Arc<ApiClient>,
    session: Arc<SessionStore>,
    error: RwLock<Option<String>>,
    loading: LoadingCounter,
}

impl AuthStore {
    pub fn new(api: Arc<ApiClient>) -> Self {
        let session = api.session().clone();
        Self {
            api,
            session,
            error: RwLock::new(None),
            loading: LoadingCounter::default(),
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn user(&self) -> Option<User> {
        self.session.user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn error(&self) -> Option<String> {
        self.error.read().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub async fn login(&self, credentials: &Credentials) -> PortResult<User> {
        let _loading = self.loading.begin();
        *self.error.write() = None;

        let auth = self
            .api
            .login(credentials)
            .await
            .map_err(|e| self.fail(e, "Login failed"))?;
        self.session.login(auth.user.clone(), auth.token)?;
        Ok(auth.user)
    }

    /// Creates the account and starts a session for it.
    pub async fn register(&self, registration: &Registration) -> PortResult<User> {
        let _loading = self.loading.begin();
        *self.error.write() = None;

        let auth = self
            .api
            .register(registration)
            .await
            .map_err(|e| self.fail(e, "Registration failed"))?;
        info!(username = %auth.user.username, "Registered new account");
        self.session.login(auth.user.clone(), auth.token)?;
        Ok(auth.user)
    }

    pub fn logout(&self) {
        self.session.logout();
    }

    /// Re-reads the identity behind the stored credential. Unauthorized
    /// ends the session; any other failure leaves it as it was.
    pub async fn refresh(&self) -> PortResult<User> {
        let _loading = self.loading.begin();

        match self.api.current_user().await {
            Ok(user) => {
                self.session.set_user(user.clone())?;
                Ok(user)
            }
            Err(e) => {
                if e.is_unauthorized() {
                    self.session.logout();
                }
                error!("Failed to refresh current user: {}", e);
                Err(e)
            }
        }
    }

    fn fail(&self, e: PortError, fallback: &str) -> PortError {
        error!("{}: {}", fallback, e);
        *self.error.write() = Some(e.user_message(fallback));
        e
    }
}
