//! crates/studybank_core/src/stores/analytics.rs
//!
//! Dashboard statistics and recommendations. Both fetches may run at once
//! (`refresh_all`), which is why loading is a counter and not a flag.

use crate::client::ApiClient;
use crate::domain::{Question, Stats};
use crate::stores::loading::LoadingCounter;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::error;

#[derive(Default)]
struct AnalyticsState {
    stats: Option<Stats>,
    recommendations: Vec<Question>,
    error: Option<String>,
}

/// Filters for `/analytics/recommendations`.
#[derive(Debug, Clone, Default)]
pub struct RecommendationParams {
    pub limit: Option<u32>,
    pub subject: Option<String>,
}

pub struct AnalyticsStore {
    api: Arc<ApiClient>,
    state: RwLock<AnalyticsState>,
    loading: LoadingCounter,
}

impl AnalyticsStore {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            state: RwLock::new(AnalyticsState::default()),
            loading: LoadingCounter::default(),
        }
    }

    pub fn stats(&self) -> Option<Stats> {
        self.state.read().stats.clone()
    }

    pub fn recommendations(&self) -> Vec<Question> {
        self.state.read().recommendations.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.state.read().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub async fn fetch_stats(&self) {
        let _loading = self.loading.begin();
        self.state.write().error = None;

        match self.api.stats().await {
            Ok(stats) => self.state.write().stats = Some(stats),
            Err(e) => {
                error!("Failed to fetch stats: {}", e);
                self.state.write().error = Some(e.user_message("Failed to fetch stats"));
            }
        }
    }

    pub async fn fetch_recommendations(&self, params: &RecommendationParams) {
        let _loading = self.loading.begin();
        self.state.write().error = None;

        match self
            .api
            .recommendations(params.limit, params.subject.as_deref())
            .await
        {
            Ok(recommendations) => self.state.write().recommendations = recommendations,
            Err(e) => {
                error!("Failed to fetch recommendations: {}", e);
                self.state.write().error =
                    Some(e.user_message("Failed to fetch recommendations"));
            }
        }
    }

    /// Runs both fetches concurrently and returns once both have resolved.
    pub async fn refresh_all(&self) {
        let params = RecommendationParams::default();
        futures::join!(self.fetch_stats(), self.fetch_recommendations(&params));
    }
}
