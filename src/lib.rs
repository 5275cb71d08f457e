// github-gateway - GitHub REST API client with a cached middleware pipeline
// Author: kelexine (https://github.com/kelexine)

pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod metrics;
pub mod middleware;
pub mod pagination;
pub mod storage;
pub mod transport;
pub mod utils;

pub use error::{GitHubApiError, Result};
pub use github::{GitHubClient, GitHubClientBuilder};
