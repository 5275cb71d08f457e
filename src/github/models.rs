//! Domain records returned by [`GitHubClient`](super::GitHubClient), and
//! the wire payloads they are built from.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Public profile of a single account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: Option<String>,
    pub location: Option<String>,
    pub public_repo_count: u32,
}

/// A repository and the bytes of code per language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub full_name: String,
    pub language_breakdown: BTreeMap<String, u64>,
}

/// One public activity event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: String,
    pub repo_name: String,
}

/// A gist.
///
/// `files` is only filled in by a single-gist lookup; listings and
/// creation return summaries with no files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gist {
    pub id: String,
    pub html_url: String,
    pub description: Option<String>,
    pub files: Vec<GistFile>,
    pub is_public: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GistFile {
    pub name: String,
    pub language: Option<String>,
    pub content: String,
}

// ============================================================================
// WIRE PAYLOADS
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct UserPayload {
    pub name: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub public_repos: u32,
}

impl From<UserPayload> for UserProfile {
    fn from(payload: UserPayload) -> Self {
        Self {
            name: payload.name,
            location: payload.location,
            public_repo_count: payload.public_repos,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepoPayload {
    pub full_name: String,
    #[serde(default)]
    pub fork: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EventPayload {
    #[serde(rename = "type")]
    pub event_type: String,
    pub repo: EventRepoPayload,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EventRepoPayload {
    pub name: String,
}

impl From<EventPayload> for Event {
    fn from(payload: EventPayload) -> Self {
        Self {
            event_type: payload.event_type,
            repo_name: payload.repo.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GistPayload {
    pub id: String,
    pub html_url: String,
    pub description: Option<String>,
    pub public: bool,
    pub created_at: String,
    /// Keyed by file name, in server order.
    #[serde(default)]
    pub files: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct GistFilePayload {
    filename: Option<String>,
    language: Option<String>,
    #[serde(default)]
    content: String,
}

impl GistPayload {
    /// Summary form: file details are dropped.
    pub fn into_summary(self) -> Gist {
        Gist {
            id: self.id,
            html_url: self.html_url,
            description: self.description,
            files: Vec::new(),
            is_public: self.public,
            created_at: self.created_at,
        }
    }

    /// Detailed form with every file, in the order the server listed them.
    pub fn into_detail(self) -> serde_json::Result<Gist> {
        let files = self
            .files
            .into_iter()
            .map(|(key, value)| {
                let file: GistFilePayload = serde_json::from_value(value)?;
                Ok(GistFile {
                    name: file.filename.unwrap_or(key),
                    language: file.language,
                    content: file.content,
                })
            })
            .collect::<serde_json::Result<Vec<_>>>()?;

        Ok(Gist {
            id: self.id,
            html_url: self.html_url,
            description: self.description,
            files,
            is_public: self.public,
            created_at: self.created_at,
        })
    }
}
