// HTTP transport at the bottom of the pipeline
// Author: kelexine (https://github.com/kelexine)

use crate::config::GitHubConfig;
use crate::error::{GitHubApiError, Result};
use crate::middleware::{ApiRequest, ApiResponse, Body, ResponseFuture};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use std::collections::BTreeMap;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::Service;
use tracing::debug;

/// Sends pipeline requests over HTTPS with a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build the HTTP client with GitHub's default headers and the
    /// configured timeouts.
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .pool_idle_timeout(Duration::from_secs(90))
            .use_rustls_tls()
            .build()
            .map_err(|e| {
                GitHubApiError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        debug!("Created HTTP client for {}", config.api_base_url);

        Ok(Self { client })
    }
}

impl Service<ApiRequest> for HttpTransport {
    type Response = ApiResponse;
    type Error = GitHubApiError;
    type Future = ResponseFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: ApiRequest) -> Self::Future {
        let client = self.client.clone();
        Box::pin(async move {
            let mut builder = client
                .request(request.method, request.url)
                .headers(request.headers);
            if let Some(body) = request.body {
                builder = builder.json(&body);
            }

            let response = builder.send().await?;
            let status = response.status().as_u16();

            // Repeated headers are folded into one comma-separated value
            let mut headers: BTreeMap<String, String> = BTreeMap::new();
            for (name, value) in response.headers() {
                let Ok(value) = value.to_str() else { continue };
                headers
                    .entry(name.as_str().to_string())
                    .and_modify(|existing| {
                        existing.push_str(", ");
                        existing.push_str(value);
                    })
                    .or_insert_with(|| value.to_string());
            }

            let bytes = response.bytes().await?;

            Ok(ApiResponse {
                status,
                headers,
                body: Body::from_bytes(bytes),
            })
        })
    }
}
