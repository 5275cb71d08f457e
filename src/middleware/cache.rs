// Response cache stage, outermost in the pipeline
// Author: kelexine (https://github.com/kelexine)

use super::request_log::log_served_from_cache;
use super::{ApiRequest, ApiResponse, ResponseFuture};
use crate::error::{GitHubApiError, Result};
use crate::metrics;
use crate::storage::Storage;
use reqwest::{Method, Url};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{debug, warn};

/// Cache key for a request: `"<METHOD> <url>"`, prefixed with
/// `"<namespace>:"` when keys are scoped to a token.
pub fn cache_key(method: &Method, url: &Url, namespace: Option<&str>) -> String {
    match namespace {
        Some(namespace) => format!("{}:{} {}", namespace, method, url),
        None => format!("{} {}", method, url),
    }
}

#[derive(Clone)]
pub struct CacheLayer {
    storage: Arc<dyn Storage>,
    namespace: Option<Arc<str>>,
}

impl CacheLayer {
    pub fn new(storage: Arc<dyn Storage>, namespace: Option<String>) -> Self {
        Self {
            storage,
            namespace: namespace.map(Arc::from),
        }
    }
}

impl<S> Layer<S> for CacheLayer {
    type Service = ResponseCache<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ResponseCache {
            inner,
            storage: Arc::clone(&self.storage),
            namespace: self.namespace.clone(),
        }
    }
}

/// Answers repeated requests from storage.
///
/// A hit returns the stored response without touching any inner stage.
/// A miss forwards the request and stores whatever response comes back;
/// errors are propagated and never stored. Every method is cached.
#[derive(Clone)]
pub struct ResponseCache<S> {
    inner: S,
    storage: Arc<dyn Storage>,
    namespace: Option<Arc<str>>,
}

impl<S> Service<ApiRequest> for ResponseCache<S>
where
    S: Service<ApiRequest, Response = ApiResponse, Error = GitHubApiError>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
{
    type Response = ApiResponse;
    type Error = GitHubApiError;
    type Future = ResponseFuture;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: ApiRequest) -> Self::Future {
        // The readied service goes into the future; a fresh clone stays behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let storage = Arc::clone(&self.storage);
        let key = cache_key(&request.method, &request.url, self.namespace.as_deref());

        Box::pin(async move {
            if let Some(bytes) = storage.read(&key).await? {
                match serde_json::from_slice::<ApiResponse>(&bytes) {
                    Ok(response) => {
                        metrics::record_cache_hit();
                        log_served_from_cache(&request);
                        return Ok(response);
                    }
                    Err(e) => warn!("Discarding unreadable cache entry for {}: {}", key, e),
                }
            }

            metrics::record_cache_miss();
            debug!("Cache miss: {}", key);

            let response = inner.call(request).await?;
            storage.write(&key, serde_json::to_vec(&response)?).await?;
            metrics::record_cache_store();

            Ok(response)
        })
    }
}
