// Authentication stage: token injection and 401 detection
// Author: kelexine (https://github.com/kelexine)

use super::{ApiRequest, ApiResponse, ResponseFuture};
use crate::error::{GitHubApiError, Result};
use crate::utils::logging::sanitize;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::warn;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A GitHub access token. The value is wiped from memory on drop and
/// never printed by `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Short SHA-256 digest, safe to use in cache keys and logs.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        hex::encode(&digest[..8])
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

impl From<String> for AccessToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for AccessToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct AuthenticationLayer {
    token: Arc<AccessToken>,
}

impl AuthenticationLayer {
    pub fn new(token: AccessToken) -> Self {
        Self {
            token: Arc::new(token),
        }
    }
}

impl<S> Layer<S> for AuthenticationLayer {
    type Service = Authentication<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Authentication {
            inner,
            token: Arc::clone(&self.token),
        }
    }
}

/// Sets `Authorization: token <value>` on the way down and turns a 401 on
/// the way up into `AuthenticationFailure`.
#[derive(Debug, Clone)]
pub struct Authentication<S> {
    inner: S,
    token: Arc<AccessToken>,
}

impl<S> Service<ApiRequest> for Authentication<S>
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

    fn call(&mut self, mut request: ApiRequest) -> Self::Future {
        match HeaderValue::from_str(&format!("token {}", self.token.expose())) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers.insert(AUTHORIZATION, value);
            }
            Err(_) => {
                return Box::pin(async {
                    Err(GitHubApiError::AuthenticationFailure(
                        "access token contains characters not allowed in a header".to_string(),
                    ))
                })
            }
        }

        let future = self.inner.call(request);
        Box::pin(async move {
            let response = future.await?;
            if response.status == 401 {
                let message = response.message();
                warn!("GitHub rejected the access token: {}", sanitize(&message));
                return Err(GitHubApiError::AuthenticationFailure(message));
            }
            Ok(response)
        })
    }
}
