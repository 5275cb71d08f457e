// Payload decoding stage
// Author: kelexine (https://github.com/kelexine)

use super::{ApiRequest, ApiResponse, Body, ResponseFuture};
use crate::error::{GitHubApiError, Result};
use serde_json::Value;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeJsonLayer;

impl<S> Layer<S> for DecodeJsonLayer {
    type Service = DecodeJson<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DecodeJson { inner }
    }
}

/// Parses raw response bytes into JSON on the way up.
#[derive(Debug, Clone)]
pub struct DecodeJson<S> {
    inner: S,
}

impl<S> Service<ApiRequest> for DecodeJson<S>
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
        let future = self.inner.call(request);
        Box::pin(async move {
            let mut response = future.await?;
            response.body = decode(response.body);
            Ok(response)
        })
    }
}

/// Whitespace-only bodies count as empty. Bodies that are not JSON (proxy
/// error pages and the like) stay raw.
fn decode(body: Body) -> Body {
    match body {
        Body::Raw(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Body::Empty,
        Body::Raw(bytes) => match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => Body::Json(value),
            Err(e) => {
                debug!("Response body is not JSON, keeping raw bytes: {}", e);
                Body::Raw(bytes)
            }
        },
        other => other,
    }
}
