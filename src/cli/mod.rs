// CLI module for github-gateway
// Author: kelexine (https://github.com/kelexine)

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// github-gateway - GitHub REST API client with a cached middleware pipeline
#[derive(Parser, Debug)]
#[command(name = "github-gateway", version, about, long_about = None)]
pub struct Args {
    /// Config file (defaults to ~/.github-gateway/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// GitHub access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Print collected metrics to stderr when done
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show a user's public profile
    User { username: String },

    /// List a user's public repositories with language breakdowns
    Repos {
        username: String,
        /// Leave out forked repositories
        #[arg(long)]
        no_forks: bool,
    },

    /// List a user's public events
    Events { username: String },

    /// List your gists, one page at a time
    Gists {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Show a gist with its files
    Gist { id: String },

    /// Create a secret gist from a single file
    CreateGist {
        /// File to upload; its name becomes the gist file name
        file: PathBuf,
        #[arg(long, short, default_value = "")]
        description: String,
    },

    DeleteGist { id: String },

    /// Check whether you starred OWNER/REPO
    Starred { repo: String },

    Star { repo: String },

    Unstar { repo: String },
}
