// Status check stage, closest to the transport
// Author: kelexine (https://github.com/kelexine)

use super::{ApiRequest, ApiResponse, ResponseFuture};
use crate::error::{GitHubApiError, Result};
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::trace;

#[derive(Debug, Clone, Copy, Default)]
pub struct StatusCheckLayer;

impl<S> Layer<S> for StatusCheckLayer {
    type Service = StatusCheck<S>;

    fn layer(&self, inner: S) -> Self::Service {
        StatusCheck { inner }
    }
}

/// Observes raw transport statuses and traces anything outside 2xx, the
/// same range [`ApiResponse::is_success`] accepts. Responses pass through
/// unchanged; mapping statuses to domain errors is the client's job.
#[derive(Debug, Clone)]
pub struct StatusCheck<S> {
    inner: S,
}

impl<S> Service<ApiRequest> for StatusCheck<S>
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
        let uri = request.request_uri();
        let future = self.inner.call(request);
        Box::pin(async move {
            let response = future.await?;
            if !response.is_success() {
                trace!(status = response.status, uri = %uri, "Upstream returned an error status");
            }
            Ok(response)
        })
    }
}
