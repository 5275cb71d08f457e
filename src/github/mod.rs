// GitHub REST API client
// Author: kelexine (https://github.com/kelexine)

mod client;
pub mod models;

pub use crate::pagination::Page;
pub use client::{GitHubClient, GitHubClientBuilder};
pub use models::{Event, Gist, GistFile, Repository, UserProfile};
