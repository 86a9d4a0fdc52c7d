pub mod client;
pub mod domain;
pub mod endpoints;
pub mod guard;
pub mod image;
pub mod ports;
pub mod query;
pub mod session;
pub mod storage;
pub mod stores;

pub use client::ApiClient;
pub use domain::{
    Answer, Collection, Credentials, Id, ImageDescriptor, Item, ItemStatus, Pagination, Question,
    Registration, Resource, Rotation, Stats, Tag, User,
};
pub use guard::{Navigation, Route, RouteGuard};
pub use ports::{
    ApiRequest, ApiResponse, HttpMethod, HttpTransport, KeyValueStore, PortError, PortResult,
    RequestBody,
};
pub use query::ListFilter;
pub use session::SessionStore;
pub use storage::MemoryStore;
pub use stores::{AnalyticsStore, AuthStore, CollectionStore, ItemStore, QuestionStore};
