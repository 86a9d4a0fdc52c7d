pub mod analytics;
pub mod auth;
pub mod collections;
pub mod items;
pub mod loading;
pub mod paged;

pub use analytics::{AnalyticsStore, RecommendationParams};
pub use auth::AuthStore;
pub use collections::CollectionStore;
pub use loading::{LoadingCounter, LoadingGuard};
pub use paged::{ItemStore, PagedStore, QuestionStore};
