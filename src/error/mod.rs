// Error types for the GitHub API client
// Author: kelexine (https://github.com/kelexine)

use thiserror::Error;

/// Every failure a client call can surface.
///
/// The first group are request outcomes the web layer renders to users;
/// the rest are plumbing failures (transport, decoding, configuration).
#[derive(Error, Debug)]
pub enum GitHubApiError {
    #[error("'{0}' does not exist")]
    NonexistentUser(String),

    #[error("Gist '{0}' does not exist")]
    NonexistentGist(String),

    #[error("Repository '{0}' does not exist")]
    NonexistentRepo(String),

    #[error("Gist creation failed: {0}")]
    GistCreationFailure(String),

    #[error("Request failed: {0}")]
    RequestFailure(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailure(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),
}

impl GitHubApiError {
    /// True for the "resource does not exist" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GitHubApiError::NonexistentUser(_)
                | GitHubApiError::NonexistentGist(_)
                | GitHubApiError::NonexistentRepo(_)
        )
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, GitHubApiError::AuthenticationFailure(_))
    }
}

impl From<redis::RedisError> for GitHubApiError {
    fn from(err: redis::RedisError) -> Self {
        GitHubApiError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GitHubApiError>;
