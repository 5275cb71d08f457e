//! Request pipeline for GitHub API calls.
//!
//! Every call travels through a fixed stack of tower layers, outermost first:
//!
//! ```text
//! Cache → RequestLog → DecodeJson → Authentication → StatusCheck → transport
//! ```
//!
//! The cache sits outside everything so a hit skips authentication and the
//! network entirely. The status check sits next to the wire and sees raw
//! transport responses first on the way back up.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod authentication;
mod cache;
mod decode;
mod request_log;
mod status_check;

pub use authentication::{AccessToken, Authentication, AuthenticationLayer};
pub use cache::{cache_key, CacheLayer, ResponseCache};
pub use decode::{DecodeJson, DecodeJsonLayer};
pub use request_log::{RequestLog, RequestLogLayer};
pub use status_check::{StatusCheck, StatusCheckLayer};

use crate::config::CacheKeyScope;
use crate::error::{GitHubApiError, Result};
use crate::storage::Storage;
use bytes::Bytes;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use reqwest::header::HeaderMap;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::util::BoxCloneService;
use tower::{Layer, Service, ServiceBuilder, ServiceExt};

/// Future returned by every pipeline stage.
pub type ResponseFuture = BoxFuture<'static, Result<ApiResponse>>;

/// An outgoing API request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Attach a JSON body.
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Path plus query string, e.g. `/gists?page=2`.
    pub fn request_uri(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{}", self.url.path(), query),
            None => self.url.path().to_string(),
        }
    }
}

/// Response body as it moves up the pipeline.
///
/// The transport produces `Empty` or `Raw`; the decoding stage turns `Raw`
/// into `Json` when the bytes parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum Body {
    Empty,
    Raw(Bytes),
    Json(Value),
}

impl Body {
    pub fn from_bytes(bytes: Bytes) -> Self {
        if bytes.is_empty() {
            Body::Empty
        } else {
            Body::Raw(bytes)
        }
    }
}

/// A completed API response. This is also the value stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,
    /// Header names are lowercase.
    pub headers: BTreeMap<String, String>,
    pub body: Body,
}

impl ApiResponse {
    pub fn new(status: u16, body: Body) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Error message supplied by the server, falling back to the raw body
    /// text and finally to the bare status code.
    pub fn message(&self) -> String {
        let from_json = |value: &Value| {
            value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        let message = match &self.body {
            Body::Json(value) => from_json(value),
            Body::Raw(bytes) => serde_json::from_slice::<Value>(bytes)
                .ok()
                .and_then(|value| from_json(&value))
                .or_else(|| {
                    let text = String::from_utf8_lossy(bytes).trim().to_string();
                    (!text.is_empty()).then_some(text)
                }),
            Body::Empty => None,
        };

        message.unwrap_or_else(|| format!("HTTP {}", self.status))
    }

    /// Deserialize the body into `T`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        match &self.body {
            Body::Json(value) => Ok(T::deserialize(value)?),
            Body::Raw(bytes) => Ok(serde_json::from_slice(bytes)?),
            Body::Empty => Err(GitHubApiError::UnexpectedResponse(format!(
                "empty body with status {}",
                self.status
            ))),
        }
    }
}

/// A fully assembled, type-erased stack of stages.
///
/// Built once and reused for every call. The boxed service is not `Sync`,
/// so it lives behind a mutex; each call clones it out and releases the
/// lock before awaiting.
pub struct Pipeline {
    service: Mutex<BoxCloneService<ApiRequest, ApiResponse, GitHubApiError>>,
}

impl Pipeline {
    pub fn builder(token: AccessToken) -> PipelineBuilder {
        PipelineBuilder::new(token)
    }

    /// Send `request` through every stage.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let service = self.service.lock().clone();
        service.oneshot(request).await
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

/// Assembles the stage stack around a transport.
pub struct PipelineBuilder {
    token: AccessToken,
    cache: Option<(Arc<dyn Storage>, CacheKeyScope)>,
}

impl PipelineBuilder {
    pub fn new(token: AccessToken) -> Self {
        Self { token, cache: None }
    }

    /// Put a cache stage backed by `storage` on top of the stack.
    pub fn cache(mut self, storage: Arc<dyn Storage>, scope: CacheKeyScope) -> Self {
        self.cache = Some((storage, scope));
        self
    }

    pub fn build<T>(self, transport: T) -> Pipeline
    where
        T: Service<ApiRequest, Response = ApiResponse, Error = GitHubApiError>
            + Clone
            + Send
            + 'static,
        T::Future: Send + 'static,
    {
        let namespace = match &self.cache {
            Some((_, CacheKeyScope::PerToken)) => Some(self.token.fingerprint()),
            _ => None,
        };

        let stack = ServiceBuilder::new()
            .layer(RequestLogLayer)
            .layer(DecodeJsonLayer)
            .layer(AuthenticationLayer::new(self.token))
            .layer(StatusCheckLayer)
            .service(transport);

        let service = match self.cache {
            Some((storage, _)) => {
                BoxCloneService::new(CacheLayer::new(storage, namespace).layer(stack))
            }
            None => BoxCloneService::new(stack),
        };

        Pipeline {
            service: Mutex::new(service),
        }
    }
}
