//! crates/studybank_core/src/stores/paged.rs
//!
//! Cache and mutation interface for a paginated resource (items,
//! questions): the last fetched page, one "current" record, pagination,
//! and loading/error flags.
//!
//! The list and the current record are independent copies. Mutations that
//! touch one never touch the other unless documented on the action.

use crate::client::ApiClient;
use crate::domain::{Id, Item, Pagination, Question, Resource};
use crate::ports::{PortError, PortResult};
use crate::query::ListFilter;
use crate::stores::loading::LoadingCounter;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

pub type ItemStore = PagedStore<Item>;
pub type QuestionStore = PagedStore<Question>;

pub(super) struct PagedState<R> {
    pub(super) records: Vec<R>,
    pub(super) current: Option<R>,
    pub(super) error: Option<String>,
    pub(super) pagination: Pagination,
}

impl<R> Default for PagedState<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            current: None,
            error: None,
            pagination: Pagination::default(),
        }
    }
}

pub struct PagedStore<R: Resource> {
    pub(super) api: Arc<ApiClient>,
    pub(super) state: RwLock<PagedState<R>>,
    pub(super) loading: LoadingCounter,
}

impl<R: Resource> PagedStore<R> {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            state: RwLock::new(PagedState::default()),
            loading: LoadingCounter::default(),
        }
    }

    //=====================================================================================
    // Snapshots
    //=====================================================================================

    pub fn list(&self) -> Vec<R> {
        self.state.read().records.clone()
    }

    pub fn current(&self) -> Option<R> {
        self.state.read().current.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.state.read().error.clone()
    }

    pub fn pagination(&self) -> Pagination {
        self.state.read().pagination
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    /// Moves the page cursor used by the next `fetch_list`.
    pub fn set_page(&self, page: u32) {
        self.state.write().pagination.page = page.max(1);
    }

    //=====================================================================================
    // Actions
    //=====================================================================================

    /// Fetches one page. On failure the previous page and pagination stay
    /// in place and only the error is updated; the error is not returned.
    pub async fn fetch_list(&self, filter: &ListFilter) {
        let _loading = self.loading.begin();
        self.clear_error();

        let pagination = self.pagination();
        let requested_page = filter.page.unwrap_or(pagination.page);
        let per_page = filter.per_page.unwrap_or(pagination.per_page);

        match self.api.list::<R>(filter.to_query(&pagination)).await {
            Ok(page) => {
                let mut state = self.state.write();
                state.records = page.records;
                state.pagination = Pagination {
                    page: page.current_page.unwrap_or(requested_page),
                    per_page,
                    total: page.total,
                    pages: page.pages,
                };
            }
            Err(e) => {
                error!("Fetch {}s error: {}", R::NAME, e);
                self.record_error(&e, &format!("Failed to fetch {}s", R::NAME));
            }
        }
    }

    /// Loads one record into the current slot. On failure the current
    /// record is left as it was and `None` is returned.
    pub async fn fetch_one(&self, id: Id) -> Option<R> {
        let _loading = self.loading.begin();
        self.clear_error();

        match self.api.fetch::<R>(id).await {
            Ok(record) => {
                self.state.write().current = Some(record.clone());
                Some(record)
            }
            Err(e) => {
                error!("Get {} {} error: {}", R::NAME, id, e);
                self.record_error(&e, &format!("Failed to fetch {}", R::NAME));
                None
            }
        }
    }

    /// Creates a record. The cached list is not touched; refetch or insert
    /// explicitly.
    pub async fn create<P: Serialize + Sync>(&self, payload: &P) -> PortResult<R> {
        let _loading = self.loading.begin();
        self.clear_error();

        self.api
            .create::<R, P>(payload)
            .await
            .map_err(|e| self.fail(e, &format!("Failed to create {}", R::NAME)))
    }

    /// Updates a record and makes the server's copy the current record.
    pub async fn update<P: Serialize + Sync>(&self, id: Id, payload: &P) -> PortResult<R> {
        let _loading = self.loading.begin();
        self.clear_error();

        let record = self
            .api
            .update::<R, P>(id, payload)
            .await
            .map_err(|e| self.fail(e, &format!("Failed to update {}", R::NAME)))?;
        self.state.write().current = Some(record.clone());
        Ok(record)
    }

    /// Deletes a record and drops it from the cached list. The current
    /// record is kept even if it is the one deleted.
    pub async fn delete(&self, id: Id) -> PortResult<()> {
        let _loading = self.loading.begin();
        self.clear_error();

        self.api
            .remove::<R>(id)
            .await
            .map_err(|e| self.fail(e, &format!("Failed to delete {}", R::NAME)))?;
        self.state.write().records.retain(|r| r.id() != id);
        Ok(())
    }

    //=====================================================================================
    // Error Helpers
    //=====================================================================================

    pub(super) fn clear_error(&self) {
        self.state.write().error = None;
    }

    pub(super) fn record_error(&self, e: &PortError, fallback: &str) {
        self.state.write().error = Some(e.user_message(fallback));
    }

    /// Records the error for display and hands it back for propagation.
    pub(super) fn fail(&self, e: PortError, fallback: &str) -> PortError {
        error!("{}: {}", fallback, e);
        self.record_error(&e, fallback);
        e
    }
}
