// Request logging stage
// Author: kelexine (https://github.com/kelexine)

use super::{ApiRequest, ApiResponse, ResponseFuture};
use crate::error::{GitHubApiError, Result};
use crate::metrics;
use crate::utils::logging::sanitize;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogLayer;

impl<S> Layer<S> for RequestLogLayer {
    type Service = RequestLog<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLog { inner }
    }
}

/// Emits one record per call that went upstream:
/// `[host] METHOD /uri status (elapsed s)`.
#[derive(Debug, Clone)]
pub struct RequestLog<S> {
    inner: S,
}

impl<S> Service<ApiRequest> for RequestLog<S>
where
    S: Service<ApiRequest, Response = ApiResponse, Error = GitHubApiError> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = ApiResponse;
    type Error = GitHubApiError;
    type Future = ResponseFuture;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: ApiRequest) -> Self::Future {
        let host = request.host().to_string();
        let method = request.method.to_string();
        let uri = request.request_uri();
        let started = Instant::now();

        let future = self.inner.call(request);
        Box::pin(async move {
            let result = future.await;
            let elapsed = started.elapsed().as_secs_f64();

            match &result {
                Ok(response) => {
                    info!(
                        host = %host,
                        method = %method,
                        uri = %uri,
                        status = response.status,
                        elapsed_secs = elapsed,
                        "[{}] {} {} {} ({:.3} s)",
                        host, method, uri, response.status, elapsed
                    );
                    if let Some(remaining) = response.header("x-ratelimit-remaining") {
                        debug!("Rate limit remaining: {}", remaining);
                    }
                    metrics::record_request(&method, response.status, elapsed);
                }
                Err(e) => {
                    warn!(
                        "[{}] {} {} failed after {:.3} s: {}",
                        host,
                        method,
                        uri,
                        elapsed,
                        sanitize(&e.to_string())
                    );
                }
            }

            result
        })
    }
}

/// Record for a call the cache answered before it reached this stage.
pub(super) fn log_served_from_cache(request: &ApiRequest) {
    info!(
        host = %request.host(),
        method = %request.method,
        uri = %request.request_uri(),
        "[{}] {} {} served from cache",
        request.host(),
        request.method,
        request.request_uri()
    );
}
