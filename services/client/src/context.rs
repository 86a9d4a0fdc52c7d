//! services/client/src/context.rs
//!
//! Defines the application context: every store wired to one session and one
//! transport, created once at startup and passed to whatever needs it.

use crate::adapters::{FileStore, ReqwestTransport};
use crate::config::Config;
use crate::error::ClientError;
use serde::Serialize;
use std::sync::Arc;
use studybank_core::ports::{HttpTransport, KeyValueStore};
use studybank_core::stores::RecommendationParams;
use studybank_core::{
    AnalyticsStore, ApiClient, AuthStore, CollectionStore, ItemStore, Question, QuestionStore,
    RouteGuard, SessionStore, Stats,
};
use tracing::info;

/// Statistics and recommendations fetched together for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub stats: Option<Stats>,
    pub recommendations: Vec<Question>,
}

/// The shared client state.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub session: Arc<SessionStore>,
    pub api: Arc<ApiClient>,
    pub auth: Arc<AuthStore>,
    pub items: Arc<ItemStore>,
    pub questions: Arc<QuestionStore>,
    pub collections: Arc<CollectionStore>,
    pub analytics: Arc<AnalyticsStore>,
    pub guard: Arc<RouteGuard>,
}

impl AppContext {
    /// Builds the context over the real adapters named by `config`.
    pub fn from_config(config: Arc<Config>) -> Result<Self, ClientError> {
        let storage = Arc::new(FileStore::open(&config.session_file)?);
        info!(path = %storage.path().display(), "Session storage opened");
        let transport = Arc::new(ReqwestTransport::new(
            config.api_base_url.clone(),
            config.request_timeout,
        )?);
        Ok(Self::with_adapters(config, storage, transport))
    }

    /// Builds the context over any port implementations.
    pub fn with_adapters(
        config: Arc<Config>,
        storage: Arc<dyn KeyValueStore>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let session = Arc::new(SessionStore::load(storage.clone()));
        let api = Arc::new(ApiClient::new(transport, session.clone()));
        Self {
            config,
            auth: Arc::new(AuthStore::new(api.clone())),
            items: Arc::new(ItemStore::new(api.clone())),
            questions: Arc::new(QuestionStore::new(api.clone())),
            collections: Arc::new(CollectionStore::new(api.clone())),
            analytics: Arc::new(AnalyticsStore::new(api.clone())),
            guard: Arc::new(RouteGuard::new(storage)),
            session,
            api,
        }
    }

    /// Loads stats, then recommendations. Each fetch clears the error the
    /// previous one recorded, so a failure is surfaced before moving on.
    pub async fn dashboard(&self, limit: Option<u32>) -> Result<Dashboard, ClientError> {
        self.analytics.fetch_stats().await;
        recorded(self.analytics.error())?;

        let params = RecommendationParams {
            limit,
            subject: None,
        };
        self.analytics.fetch_recommendations(&params).await;
        recorded(self.analytics.error())?;

        Ok(Dashboard {
            stats: self.analytics.stats(),
            recommendations: self.analytics.recommendations(),
        })
    }
}

/// Read actions record their failure instead of returning it.
pub fn recorded(error: Option<String>) -> Result<(), ClientError> {
    match error {
        Some(message) => Err(ClientError::Internal(message)),
        None => Ok(()),
    }
}
