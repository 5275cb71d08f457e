// GitHub API client operations
// Author: kelexine (https://github.com/kelexine)

use super::models::{
    Event, EventPayload, Gist, GistPayload, RepoPayload, Repository, UserPayload, UserProfile,
};
use crate::config::{CacheKeyScope, GitHubConfig};
use crate::error::{GitHubApiError, Result};
use crate::middleware::{AccessToken, ApiRequest, ApiResponse, Pipeline, PipelineBuilder};
use crate::pagination::{self, Page};
use crate::storage::Storage;
use crate::transport::HttpTransport;
use futures::{stream, StreamExt, TryStreamExt};
use reqwest::header::{HeaderValue, CONTENT_LENGTH};
use reqwest::{Method, Url};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::Service;
use tracing::debug;

/// Language lookups run concurrently, at most this many at a time.
const LANGUAGE_FETCH_CONCURRENCY: usize = 8;

/// Client for the GitHub REST API, bound to one access token.
///
/// Two pipelines are built up front and reused for every call:
/// - reads (`GET`) go through the response cache when one is configured
/// - writes (`POST`, `PUT`, `DELETE`) skip the cache stage
///
/// Cached reads are never invalidated by writes; a `repo_starred` check
/// right after `star_repo` may see the cached answer.
#[derive(Debug)]
pub struct GitHubClient {
    base_url: Url,
    reads: Pipeline,
    writes: Pipeline,
}

impl GitHubClient {
    /// Client against `api.github.com` with default settings and no cache.
    pub fn new(token: impl Into<AccessToken>) -> Result<Self> {
        Self::builder(token).build()
    }

    pub fn builder(token: impl Into<AccessToken>) -> GitHubClientBuilder {
        GitHubClientBuilder::new(token.into())
    }

    /// Look up a user's public profile.
    pub async fn user_info(&self, username: &str) -> Result<UserProfile> {
        let Some(user) = path_segment(username) else {
            return Err(GitHubApiError::NonexistentUser(username.to_string()));
        };
        let url = self.url(&format!("users/{}", user))?;
        let response = self.reads.send(ApiRequest::get(url)).await?;

        if response.status != 200 {
            return Err(GitHubApiError::NonexistentUser(username.to_string()));
        }

        Ok(response.parse::<UserPayload>()?.into())
    }

    /// Every public repository of `username` with its language breakdown.
    /// Forks are dropped unless `include_forks` is set.
    pub async fn public_repos_for_user(
        &self,
        username: &str,
        include_forks: bool,
    ) -> Result<Vec<Repository>> {
        let Some(user) = path_segment(username) else {
            return Err(GitHubApiError::NonexistentUser(username.to_string()));
        };
        let url = self.url(&format!("users/{}/repos", user))?;
        let response = self.reads.send(ApiRequest::get(url)).await?;

        if response.status != 200 {
            return Err(GitHubApiError::NonexistentUser(username.to_string()));
        }

        let repos = pagination::collect_all(&self.reads, response)
            .await?
            .into_iter()
            .map(serde_json::from_value::<RepoPayload>)
            .collect::<serde_json::Result<Vec<_>>>()?;

        debug!("Fetched {} repositories for {}", repos.len(), username);

        stream::iter(repos.into_iter().filter(|repo| include_forks || !repo.fork))
            .map(|repo| async move {
                let language_breakdown = self.languages(&repo.full_name).await?;
                Ok::<_, GitHubApiError>(Repository {
                    full_name: repo.full_name,
                    language_breakdown,
                })
            })
            .buffered(LANGUAGE_FETCH_CONCURRENCY)
            .try_collect()
            .await
    }

    /// Every public event of `username`, across all pages.
    pub async fn public_events_for_user(&self, username: &str) -> Result<Vec<Event>> {
        let Some(user) = path_segment(username) else {
            return Err(GitHubApiError::NonexistentUser(username.to_string()));
        };
        let url = self.url(&format!("users/{}/events/public", user))?;
        let response = self.reads.send(ApiRequest::get(url)).await?;

        if response.status != 200 {
            return Err(GitHubApiError::NonexistentUser(username.to_string()));
        }

        pagination::collect_all(&self.reads, response)
            .await?
            .into_iter()
            .map(|value| -> Result<Event> {
                Ok(serde_json::from_value::<EventPayload>(value)?.into())
            })
            .collect()
    }

    /// Create a secret gist holding a single file.
    ///
    /// The returned gist is a summary: its `files` are empty.
    pub async fn create_private_gist(
        &self,
        description: &str,
        filename: &str,
        contents: &str,
    ) -> Result<Gist> {
        let payload = json!({
            "description": description,
            "public": false,
            "files": {
                filename: { "content": contents }
            }
        });
        let request = ApiRequest::new(Method::POST, self.url("gists")?).with_json(payload);
        let response = self.writes.send(request).await?;

        if response.status != 201 {
            return Err(GitHubApiError::GistCreationFailure(response.message()));
        }

        Ok(response.parse::<GistPayload>()?.into_summary())
    }

    /// One page of the authenticated user's gists, as summaries.
    pub async fn gists(&self, page: u32) -> Result<Page<Gist>> {
        let page = page.max(1);
        let mut url = self.url("gists")?;
        url.query_pairs_mut().append_pair("page", &page.to_string());

        let response = self.reads.send(ApiRequest::get(url)).await?;
        if response.status != 200 {
            return Err(GitHubApiError::RequestFailure(response.message()));
        }

        pagination::single_page(&response, page)?.try_map(|value| {
            Ok(serde_json::from_value::<GistPayload>(value)?.into_summary())
        })
    }

    /// A single gist with all of its files.
    pub async fn gist_info(&self, id: &str) -> Result<Gist> {
        let url = self.gist_url(id)?;
        let response = self.reads.send(ApiRequest::get(url)).await?;

        if response.status != 200 {
            return Err(GitHubApiError::NonexistentGist(id.to_string()));
        }

        Ok(response.parse::<GistPayload>()?.into_detail()?)
    }

    pub async fn delete_gist(&self, id: &str) -> Result<()> {
        let url = self.gist_url(id)?;
        let response = self.writes.send(ApiRequest::new(Method::DELETE, url)).await?;

        if response.status != 204 {
            return Err(GitHubApiError::NonexistentGist(id.to_string()));
        }
        Ok(())
    }

    /// Whether the authenticated user has starred `full_name` (`owner/repo`).
    /// Any status other than 204 means "not starred", and so does a name
    /// that is not `owner/repo`.
    pub async fn repo_starred(&self, full_name: &str) -> Result<bool> {
        let Some(repo) = repo_path(full_name) else {
            return Ok(false);
        };
        let url = self.url(&format!("user/starred/{}", repo))?;
        let response = self.reads.send(ApiRequest::get(url)).await?;
        Ok(response.status == 204)
    }

    pub async fn star_repo(&self, full_name: &str) -> Result<()> {
        let url = self.starred_url(full_name)?;
        let mut request = ApiRequest::new(Method::PUT, url);
        // GitHub rejects a bodiless PUT without an explicit zero length
        request
            .headers
            .insert(CONTENT_LENGTH, HeaderValue::from_static("0"));

        let response = self.writes.send(request).await?;
        expect_no_content(&response)
    }

    pub async fn unstar_repo(&self, full_name: &str) -> Result<()> {
        let url = self.starred_url(full_name)?;
        let response = self.writes.send(ApiRequest::new(Method::DELETE, url)).await?;
        expect_no_content(&response)
    }

    async fn languages(&self, full_name: &str) -> Result<BTreeMap<String, u64>> {
        let repo = repo_path(full_name)
            .ok_or_else(|| GitHubApiError::NonexistentRepo(full_name.to_string()))?;
        let url = self.url(&format!("repos/{}/languages", repo))?;
        let response = self.reads.send(ApiRequest::get(url)).await?;

        if response.status != 200 {
            return Err(GitHubApiError::NonexistentRepo(full_name.to_string()));
        }

        response.parse()
    }

    fn gist_url(&self, id: &str) -> Result<Url> {
        let gist =
            path_segment(id).ok_or_else(|| GitHubApiError::NonexistentGist(id.to_string()))?;
        self.url(&format!("gists/{}", gist))
    }

    fn starred_url(&self, full_name: &str) -> Result<Url> {
        let repo = repo_path(full_name)
            .ok_or_else(|| GitHubApiError::NonexistentRepo(full_name.to_string()))?;
        self.url(&format!("user/starred/{}", repo))
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| {
            GitHubApiError::Configuration(format!("Invalid API path '{}': {}", path, e))
        })
    }
}

fn expect_no_content(response: &ApiResponse) -> Result<()> {
    if response.status != 204 {
        return Err(GitHubApiError::RequestFailure(response.message()));
    }
    Ok(())
}

/// `value` encoded as exactly one path segment (`/` becomes `%2F`).
///
/// Empty, `.` and `..` are refused: `Url::join` would resolve them and the
/// request would land on another endpoint.
fn path_segment(value: &str) -> Option<String> {
    match value {
        "" | "." | ".." => None,
        _ => Some(urlencoding::encode(value).into_owned()),
    }
}

/// `owner/repo` as two encoded segments; anything else is `None`.
fn repo_path(full_name: &str) -> Option<String> {
    let (owner, repo) = full_name.split_once('/')?;
    if repo.contains('/') {
        return None;
    }
    Some(format!("{}/{}", path_segment(owner)?, path_segment(repo)?))
}

/// Builds a [`GitHubClient`] and its pipelines.
pub struct GitHubClientBuilder {
    token: AccessToken,
    config: GitHubConfig,
    cache: Option<(Arc<dyn Storage>, CacheKeyScope)>,
}

impl GitHubClientBuilder {
    fn new(token: AccessToken) -> Self {
        Self {
            token,
            config: GitHubConfig::default(),
            cache: None,
        }
    }

    pub fn config(mut self, config: GitHubConfig) -> Self {
        self.config = config;
        self
    }

    /// Serve reads from `storage` when possible.
    pub fn cache(mut self, storage: Arc<dyn Storage>, scope: CacheKeyScope) -> Self {
        self.cache = Some((storage, scope));
        self
    }

    /// Build with the HTTPS transport described by the configuration.
    pub fn build(self) -> Result<GitHubClient> {
        let transport = HttpTransport::new(&self.config)?;
        self.build_with_transport(transport)
    }

    /// Build on top of a caller-supplied transport.
    pub fn build_with_transport<T>(self, transport: T) -> Result<GitHubClient>
    where
        T: Service<ApiRequest, Response = ApiResponse, Error = GitHubApiError>
            + Clone
            + Send
            + 'static,
        T::Future: Send + 'static,
    {
        // Without a trailing slash `join` would replace the last segment
        // of bases like `https://ghe.example.com/api/v3`.
        let mut base = self.config.api_base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| {
            GitHubApiError::Configuration(format!("Invalid API base URL '{}': {}", base, e))
        })?;

        let mut reads = PipelineBuilder::new(self.token.clone());
        if let Some((storage, scope)) = self.cache {
            reads = reads.cache(storage, scope);
        }

        Ok(GitHubClient {
            base_url,
            reads: reads.build(transport.clone()),
            writes: PipelineBuilder::new(self.token).build(transport),
        })
    }
}
