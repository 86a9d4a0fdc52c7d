//! crates/studybank_core/src/stores/collections.rs
//!
//! Cache of the user's collections. Unlike items, collection mutations keep
//! the cached list in step with the server's answer.

use crate::client::ApiClient;
use crate::domain::{Collection, CollectionPatch, Id, NewCollection};
use crate::ports::{PortError, PortResult};
use crate::stores::loading::LoadingCounter;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::error;

#[derive(Default)]
struct CollectionState {
    collections: Vec<Collection>,
    trash: Vec<Collection>,
    error: Option<String>,
}

pub struct CollectionStore {
    api: Arc<ApiClient>,
    state: RwLock<CollectionState>,
    loading: LoadingCounter,
}

impl CollectionStore {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            state: RwLock::new(CollectionState::default()),
            loading: LoadingCounter::default(),
        }
    }

    pub fn collections(&self) -> Vec<Collection> {
        self.state.read().collections.clone()
    }

    pub fn trash(&self) -> Vec<Collection> {
        self.state.read().trash.clone()
    }

    pub fn get(&self, id: Id) -> Option<Collection> {
        self.state
            .read()
            .collections
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    /// Collections not in the trash.
    pub fn active(&self) -> Vec<Collection> {
        self.state
            .read()
            .collections
            .iter()
            .filter(|c| !c.is_deleted)
            .cloned()
            .collect()
    }

    pub fn error(&self) -> Option<String> {
        self.state.read().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    /// Replaces the cached list. Errors are recorded, never returned.
    pub async fn fetch_all(&self) {
        let _loading = self.loading.begin();
        self.state.write().error = None;

        match self.api.list_collections().await {
            Ok(collections) => self.state.write().collections = collections,
            Err(e) => {
                error!("Error fetching collections: {}", e);
                self.state.write().error = Some(e.user_message("Failed to fetch collections"));
            }
        }
    }

    pub async fn fetch_trash(&self) {
        let _loading = self.loading.begin();
        self.state.write().error = None;

        match self.api.list_trashed_collections().await {
            Ok(trash) => self.state.write().trash = trash,
            Err(e) => {
                error!("Error fetching trashed collections: {}", e);
                self.state.write().error = Some(e.user_message("Failed to fetch trash"));
            }
        }
    }

    pub async fn create(&self, collection: &NewCollection) -> PortResult<Collection> {
        let _loading = self.loading.begin();
        self.state.write().error = None;

        let created = self
            .api
            .create_collection(collection)
            .await
            .map_err(|e| self.fail(e, "Failed to create collection"))?;
        self.state.write().collections.push(created.clone());
        Ok(created)
    }

    pub async fn update(&self, id: Id, patch: &CollectionPatch) -> PortResult<Collection> {
        let _loading = self.loading.begin();
        self.state.write().error = None;

        let updated = self
            .api
            .update_collection(id, patch)
            .await
            .map_err(|e| self.fail(e, "Failed to update collection"))?;
        if let Some(slot) = self
            .state
            .write()
            .collections
            .iter_mut()
            .find(|c| c.id == id)
        {
            *slot = updated.clone();
        }
        Ok(updated)
    }

    /// Soft delete: the collection leaves the list and joins the trash.
    pub async fn move_to_trash(&self, id: Id) -> PortResult<Collection> {
        let _loading = self.loading.begin();
        self.state.write().error = None;

        let patch = CollectionPatch {
            is_deleted: Some(true),
            ..Default::default()
        };
        let trashed = self
            .api
            .update_collection(id, &patch)
            .await
            .map_err(|e| self.fail(e, "Failed to move collection to trash"))?;

        let mut state = self.state.write();
        state.collections.retain(|c| c.id != id);
        state.trash.retain(|c| c.id != id);
        state.trash.push(trashed.clone());
        Ok(trashed)
    }

    /// Permanent delete. The server only accepts it for a collection that is
    /// already in the trash.
    pub async fn delete(&self, id: Id) -> PortResult<()> {
        let _loading = self.loading.begin();
        self.state.write().error = None;

        self.api
            .delete_collection(id)
            .await
            .map_err(|e| self.fail(e, "Failed to delete collection"))?;
        self.state.write().trash.retain(|c| c.id != id);
        Ok(())
    }

    /// Brings a collection back from the trash.
    pub async fn restore(&self, id: Id) -> PortResult<Option<Collection>> {
        let _loading = self.loading.begin();
        self.state.write().error = None;

        let restored = self
            .api
            .restore_collection(id)
            .await
            .map_err(|e| self.fail(e, "Failed to restore collection"))?;

        let mut state = self.state.write();
        state.trash.retain(|c| c.id != id);
        if let Some(collection) = &restored {
            if !state.collections.iter().any(|c| c.id == id) {
                state.collections.push(collection.clone());
            }
        }
        Ok(restored)
    }

    fn fail(&self, e: PortError, fallback: &str) -> PortError {
        error!("{}: {}", fallback, e);
        self.state.write().error = Some(e.user_message(fallback));
        e
    }
}
