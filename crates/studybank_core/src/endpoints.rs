//! crates/studybank_core/src/endpoints.rs
//!
//! Typed wrappers for every REST endpoint the client consumes, grouped by
//! resource. Paths are relative to the configured API base.

use crate::client::ApiClient;
use crate::domain::{
    Answer, AnswerReceipt, AuthSession, Collection, CollectionPatch, Credentials, Id, Item,
    NewAnswer, NewCollection, Question, Registration, Resource, RotateRequest, RotateResponse,
    Rotation, Stats, Tag, UploadedAsset, User,
};
use crate::ports::{ApiRequest, HttpMethod, PortError, PortResult, RequestBody};
use crate::query::QueryPairs;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One page of a paginated list response.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    pub records: Vec<R>,
    pub total: u64,
    pub pages: u32,
    /// `None` when the server did not echo the page back.
    pub current_page: Option<u32>,
}

#[derive(Deserialize)]
struct PageMeta {
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    pages: Option<u32>,
    #[serde(default)]
    current_page: Option<u32>,
}

/// Accepts both `{<field>: [...], total, pages, current_page}` and a bare
/// array (treated as a single complete page).
fn parse_page<R: Resource>(body: serde_json::Value) -> PortResult<Page<R>> {
    let decode_err = |e: serde_json::Error| {
        PortError::Unexpected(format!("Failed to decode {} list: {}", R::NAME, e))
    };

    match body {
        serde_json::Value::Array(_) => {
            let records: Vec<R> = serde_json::from_value(body).map_err(decode_err)?;
            let total = records.len() as u64;
            Ok(Page {
                records,
                total,
                pages: u32::from(total > 0),
                current_page: None,
            })
        }
        serde_json::Value::Object(mut map) => {
            let list = map
                .remove(R::LIST_FIELD)
                .unwrap_or(serde_json::Value::Array(Vec::new()));
            let records: Vec<R> = serde_json::from_value(list).map_err(decode_err)?;
            let meta: PageMeta =
                serde_json::from_value(serde_json::Value::Object(map)).map_err(decode_err)?;
            Ok(Page {
                total: meta.total.unwrap_or(records.len() as u64),
                pages: meta.pages.unwrap_or(0),
                current_page: meta.current_page,
                records,
            })
        }
        other => Err(PortError::Unexpected(format!(
            "Unexpected {} list shape: {}",
            R::NAME,
            other
        ))),
    }
}

fn record_path<R: Resource>(id: Id) -> String {
    format!("{}/{}", R::PATH, id)
}

//=========================================================================================
// Auth
//=========================================================================================

impl ApiClient {
    pub async fn register(&self, registration: &Registration) -> PortResult<AuthSession> {
        self.post("/auth/register", registration).await
    }

    pub async fn login(&self, credentials: &Credentials) -> PortResult<AuthSession> {
        self.post("/auth/login", credentials).await
    }

    pub async fn current_user(&self) -> PortResult<User> {
        self.get("/auth/me", Vec::new()).await
    }
}

//=========================================================================================
// Paginated Resources (items, questions)
//=========================================================================================

impl ApiClient {
    pub async fn list<R: Resource>(&self, query: Vec<(String, String)>) -> PortResult<Page<R>> {
        let body: serde_json::Value = self.get(R::PATH, query).await?;
        parse_page(body)
    }

    pub async fn fetch<R: Resource>(&self, id: Id) -> PortResult<R> {
        self.get(&record_path::<R>(id), Vec::new()).await
    }

    pub async fn create<R: Resource, P: Serialize + Sync>(&self, payload: &P) -> PortResult<R> {
        self.post(R::PATH, payload).await
    }

    pub async fn update<R: Resource, P: Serialize + Sync>(
        &self,
        id: Id,
        payload: &P,
    ) -> PortResult<R> {
        self.patch(&record_path::<R>(id), payload).await
    }

    pub async fn remove<R: Resource>(&self, id: Id) -> PortResult<()> {
        self.delete(&record_path::<R>(id)).await
    }
}

//=========================================================================================
// Item-only Endpoints
//=========================================================================================

#[derive(Serialize)]
struct ReviewFlag {
    needs_review: bool,
}

impl ApiClient {
    pub async fn rotate_image(
        &self,
        id: Id,
        image_index: usize,
        rotation: Rotation,
    ) -> PortResult<RotateResponse> {
        let body = RotateRequest {
            image_index,
            rotation,
        };
        self.patch(&format!("/items/{}/rotate", id), &body).await
    }

    /// The response shape is not fixed; callers read what they need.
    pub async fn set_review_flag(
        &self,
        id: Id,
        needs_review: bool,
    ) -> PortResult<serde_json::Value> {
        self.patch(&format!("/items/{}/review", id), &ReviewFlag { needs_review })
            .await
    }

    pub async fn submit_answer(&self, id: Id, answer: &NewAnswer) -> PortResult<AnswerReceipt> {
        self.post(&format!("/items/{}/answers", id), answer).await
    }

    pub async fn answer_history(&self, id: Id) -> PortResult<Vec<Answer>> {
        self.get(&format!("/items/{}/answers", id), Vec::new())
            .await
    }

    pub async fn review_session(
        &self,
        limit: Option<u32>,
        subject: Option<&str>,
    ) -> PortResult<Vec<Item>> {
        let mut query = QueryPairs::default();
        query.push_opt("limit", limit);
        query.push_opt("subject", subject);
        self.get("/items/review-session", query.into_pairs()).await
    }
}

//=========================================================================================
// Collections
//=========================================================================================

impl ApiClient {
    pub async fn list_collections(&self) -> PortResult<Vec<Collection>> {
        self.get("/collections", Vec::new()).await
    }

    pub async fn list_trashed_collections(&self) -> PortResult<Vec<Collection>> {
        self.get("/collections/trash", Vec::new()).await
    }

    pub async fn create_collection(&self, collection: &NewCollection) -> PortResult<Collection> {
        self.post("/collections", collection).await
    }

    pub async fn update_collection(
        &self,
        id: Id,
        patch: &CollectionPatch,
    ) -> PortResult<Collection> {
        self.patch(&format!("/collections/{}", id), patch).await
    }

    pub async fn delete_collection(&self, id: Id) -> PortResult<()> {
        self.delete(&format!("/collections/{}", id)).await
    }

    /// Returns the restored collection, or `None` when the server only
    /// acknowledged (the collection was already active).
    pub async fn restore_collection(&self, id: Id) -> PortResult<Option<Collection>> {
        let body: serde_json::Value = self
            .request(ApiRequest::new(
                HttpMethod::Post,
                format!("/collections/{}/restore", id),
            ))
            .await?;
        Ok(serde_json::from_value(body).ok())
    }
}

//=========================================================================================
// Uploads, Tags, Analytics
//=========================================================================================

#[derive(Serialize)]
struct AssetRef<'a> {
    public_id: &'a str,
}

impl ApiClient {
    pub async fn upload_image(
        &self,
        file_name: &str,
        data: impl Into<Bytes>,
    ) -> PortResult<UploadedAsset> {
        let body = RequestBody::Multipart {
            field: "file".to_string(),
            file_name: file_name.to_string(),
            data: data.into(),
        };
        self.request(ApiRequest::new(HttpMethod::Post, "/upload").with_body(body))
            .await
    }

    pub async fn delete_image(&self, public_id: &str) -> PortResult<()> {
        self.delete_with("/upload", &AssetRef { public_id }).await
    }

    pub async fn list_tags(&self, search: Option<&str>) -> PortResult<Vec<Tag>> {
        let mut query = QueryPairs::default();
        query.push_opt("search", search.filter(|s| !s.is_empty()));
        self.get("/tags", query.into_pairs()).await
    }

    pub async fn stats(&self) -> PortResult<Stats> {
        self.get("/analytics/stats", Vec::new()).await
    }

    pub async fn recommendations(
        &self,
        limit: Option<u32>,
        subject: Option<&str>,
    ) -> PortResult<Vec<Question>> {
        let mut query = QueryPairs::default();
        query.push_opt("limit", limit);
        query.push_opt("subject", subject);
        self.get("/analytics/recommendations", query.into_pairs())
            .await
    }
}
