//! services/client/src/adapters/http.rs
//!
//! This module contains the adapter that sends API requests over HTTP.
//! It implements the `HttpTransport` port from the `core` crate.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use std::time::Duration;
use studybank_core::ports::{
    ApiRequest, ApiResponse, HttpMethod, HttpTransport, PortError, PortResult, RequestBody,
};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `HttpTransport` port using `reqwest`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Creates a new `ReqwestTransport` rooted at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> reqwest::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

//=========================================================================================
// `HttpTransport` Trait Implementation
//=========================================================================================

#[async_trait]
impl HttpTransport for ReqwestTransport {
    /// Sends the request and hands back the status and raw body. Non-2xx
    /// statuses are not errors here; only failing to get a response is.
    async fn send(&self, request: ApiRequest) -> PortResult<ApiResponse> {
        let url = self.url(&request.path);
        debug!(method = ?request.method, %url, "Sending request");

        let mut builder = self.client.request(method(request.method), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart {
                field,
                file_name,
                data,
            } => {
                let part = Part::bytes(data.to_vec()).file_name(file_name);
                builder.multipart(Form::new().part(field, part))
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;

        debug!(status, bytes = body.len(), "Received response");
        Ok(ApiResponse::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_handles_slashes_on_either_side() {
        assert_eq!(
            join_url("http://localhost:5000/api", "/items/5"),
            "http://localhost:5000/api/items/5"
        );
        assert_eq!(
            join_url("http://localhost:5000/api/", "items"),
            "http://localhost:5000/api/items"
        );
    }

    #[test]
    fn methods_map_one_to_one() {
        assert_eq!(method(HttpMethod::Patch), Method::PATCH);
        assert_eq!(method(HttpMethod::Delete), Method::DELETE);
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let transport =
            ReqwestTransport::new("http://127.0.0.1:9", Some(Duration::from_secs(2))).unwrap();

        let result = transport
            .send(ApiRequest::new(HttpMethod::Get, "/auth/me"))
            .await;

        assert!(matches!(result, Err(PortError::Transport(_))));
    }
}
