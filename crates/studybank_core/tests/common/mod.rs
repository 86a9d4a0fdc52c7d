//! Shared fixtures for the store integration tests: a scripted
//! `HttpTransport` and a wired-up client over in-memory storage.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use studybank_core::ports::{ApiRequest, ApiResponse, HttpTransport, PortError, PortResult};
use studybank_core::session::{SessionStore, TOKEN_KEY, USER_KEY};
use studybank_core::storage::MemoryStore;
use studybank_core::ApiClient;
use tokio::sync::oneshot;

enum Reply {
    Ready(PortResult<ApiResponse>),
    /// Resolves only when the test sends through the paired sender.
    Gated(oneshot::Receiver<PortResult<ApiResponse>>),
}

/// Replays queued replies in order and records every request it sees.
#[derive(Default)]
pub struct ScriptedTransport {
    requests: Mutex<Vec<ApiRequest>>,
    replies: Mutex<VecDeque<Reply>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, status: u16, body: Value) {
        self.replies
            .lock()
            .push_back(Reply::Ready(Ok(ApiResponse::json(status, &body))));
    }

    pub fn reply_error(&self, error: PortError) {
        self.replies.lock().push_back(Reply::Ready(Err(error)));
    }

    /// Queues a reply the test releases later.
    pub fn gate(&self) -> oneshot::Sender<PortResult<ApiResponse>> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().push_back(Reply::Gated(rx));
        tx
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> ApiRequest {
        self.requests
            .lock()
            .last()
            .cloned()
            .expect("no request was sent")
    }

    /// Yields to spawned tasks until `count` requests have been sent.
    pub async fn wait_for_requests(&self, count: usize) {
        for _ in 0..1000 {
            if self.requests.lock().len() >= count {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {} requests, saw {}", count, self.requests.lock().len());
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> PortResult<ApiResponse> {
        self.requests.lock().push(request);
        let reply = self.replies.lock().pop_front();
        match reply {
            Some(Reply::Ready(result)) => result,
            Some(Reply::Gated(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(PortError::Transport("gate dropped".to_string()))),
            None => Err(PortError::Transport("no scripted reply".to_string())),
        }
    }
}

pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub storage: Arc<MemoryStore>,
    pub session: Arc<SessionStore>,
    pub api: Arc<ApiClient>,
}

/// A client whose session already holds `token` (and a user), if given.
pub fn harness(token: Option<&str>) -> Harness {
    let storage = Arc::new(match token {
        Some(token) => MemoryStore::with_entries([
            (TOKEN_KEY, token.to_string()),
            (USER_KEY, user_json(1).to_string()),
        ]),
        None => MemoryStore::new(),
    });
    let transport = ScriptedTransport::new();
    let session = Arc::new(SessionStore::load(storage.clone()));
    let api = Arc::new(ApiClient::new(transport.clone(), session.clone()));
    Harness {
        transport,
        storage,
        session,
        api,
    }
}

pub fn user_json(id: i64) -> Value {
    json!({
        "id": id,
        "username": format!("student{}", id),
        "email": format!("student{}@example.com", id),
        "role": "student",
        "created_at": "2024-01-01T08:00:00",
        "avatar_url": null,
        "auth_provider": "local"
    })
}

pub fn item_json(id: i64) -> Value {
    json!({
        "id": id,
        "title": format!("Item {}", id),
        "subject": "MATHS",
        "collection_id": 3,
        "difficulty": 2,
        "status": "UNANSWERED",
        "images": [
            { "url": "https://res.cloudinary.com/demo/image/upload/a.jpg", "public_id": "a", "rotation": 0 },
            { "url": "https://res.cloudinary.com/demo/image/upload/b.jpg", "public_id": "b", "rotation": 0 }
        ],
        "content_text": "Solve for x",
        "author_id": 1,
        "created_at": "2024-01-01T09:00:00",
        "updated_at": "2024-01-01T09:00:00",
        "attempts": 0,
        "tags": [{ "id": 1, "name": "algebra" }],
        "needs_review": false
    })
}

pub fn item_page(ids: &[i64], page: u32, total: u64, pages: u32) -> Value {
    json!({
        "items": ids.iter().map(|id| item_json(*id)).collect::<Vec<_>>(),
        "total": total,
        "pages": pages,
        "current_page": page
    })
}
