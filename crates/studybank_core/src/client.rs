//! crates/studybank_core/src/client.rs
//!
//! The HTTP client adapter policy that sits between the stores and the
//! `HttpTransport` port: attaches the session's bearer credential to every
//! request, classifies error statuses into `PortError`, and clears the
//! session whenever any endpoint answers 401.

use crate::ports::{
    ApiRequest, ApiResponse, HttpMethod, HttpTransport, PortError, PortResult, RequestBody,
};
use crate::session::SessionStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn HttpTransport>, session: Arc<SessionStore>) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Sends a request and returns the raw response if its status is 2xx.
    pub async fn send(&self, mut request: ApiRequest) -> PortResult<ApiResponse> {
        // Read at dispatch time so a login/logout since the request was
        // built is honored.
        request.bearer = self.session.token();

        let method = request.method;
        let path = request.path.clone();
        debug!(?method, %path, authenticated = request.bearer.is_some(), "Dispatching request");

        let response = self.transport.send(request).await?;
        if response.is_success() {
            return Ok(response);
        }

        let message = error_message(&response);
        if response.status == 401 {
            warn!(%path, "Unauthorized response, clearing session");
            self.session.logout();
        }
        Err(PortError::from_status(response.status, message))
    }

    /// Sends a request and decodes the JSON body.
    pub async fn request<T: DeserializeOwned>(&self, request: ApiRequest) -> PortResult<T> {
        let response = self.send(request).await?;
        decode(&response)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> PortResult<T> {
        self.request(ApiRequest::new(HttpMethod::Get, path).with_query(query))
            .await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> PortResult<T> {
        self.request(ApiRequest::new(HttpMethod::Post, path).with_body(json_body(body)?))
            .await
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> PortResult<T> {
        self.request(ApiRequest::new(HttpMethod::Patch, path).with_body(json_body(body)?))
            .await
    }

    /// DELETE with no body. The response body, if any, is ignored.
    pub async fn delete(&self, path: &str) -> PortResult<()> {
        self.send(ApiRequest::new(HttpMethod::Delete, path))
            .await
            .map(|_| ())
    }

    /// DELETE carrying a JSON body.
    pub async fn delete_with<B: Serialize>(&self, path: &str, body: &B) -> PortResult<()> {
        self.send(ApiRequest::new(HttpMethod::Delete, path).with_body(json_body(body)?))
            .await
            .map(|_| ())
    }
}

pub(crate) fn json_body<B: Serialize>(body: &B) -> PortResult<RequestBody> {
    serde_json::to_value(body)
        .map(RequestBody::Json)
        .map_err(|e| PortError::Unexpected(format!("Failed to encode request body: {}", e)))
}

fn decode<T: DeserializeOwned>(response: &ApiResponse) -> PortResult<T> {
    let result = if response.body.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_value(serde_json::Value::Null)
    } else {
        serde_json::from_slice(&response.body)
    };
    result.map_err(|e| PortError::Unexpected(format!("Failed to decode response: {}", e)))
}

/// The backend reports failures as `{"error": "..."}` and the JWT layer as
/// `{"msg": "..."}`; fall back to a status-derived message for anything else.
fn error_message(response: &ApiResponse) -> String {
    serde_json::from_slice::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|body| {
            ["error", "msg", "message"]
                .iter()
                .find_map(|key| body.get(key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| format!("Request failed with status {}", response.status))
}
