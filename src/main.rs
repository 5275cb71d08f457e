// github-gateway - GitHub REST API client with a cached middleware pipeline
// Author: kelexine (https://github.com/kelexine)

use anyhow::{Context, Result};
use clap::Parser;
use github_gateway::cli::{Args, Command};
use github_gateway::config::AppConfig;
use github_gateway::metrics::gather_metrics;
use github_gateway::storage;
use github_gateway::utils::logging;
use github_gateway::GitHubClient;
use serde::Serialize;
use serde_json::json;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Phase 1: Load configuration
    let config = AppConfig::load(args.config.as_deref())?;

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting github-gateway v{}", env!("CARGO_PKG_VERSION"));

    // Phase 3: Connect the response cache
    let storage = storage::from_config(&config.cache).await?;

    // Phase 4: Build the client
    let mut builder = GitHubClient::builder(args.token.as_str()).config(config.github.clone());
    if let Some(storage) = storage {
        builder = builder.cache(storage, config.cache.key_scope);
    }
    let client = builder.build()?;

    // Phase 5: Run the command
    let outcome = run(&client, args.command).await;

    if args.metrics {
        eprintln!("{}", gather_metrics());
    }

    outcome
}

async fn run(client: &GitHubClient, command: Command) -> Result<()> {
    match command {
        Command::User { username } => print(&client.user_info(&username).await?),
        Command::Repos { username, no_forks } => {
            print(&client.public_repos_for_user(&username, !no_forks).await?)
        }
        Command::Events { username } => print(&client.public_events_for_user(&username).await?),
        Command::Gists { page } => print(&client.gists(page).await?),
        Command::Gist { id } => print(&client.gist_info(&id).await?),
        Command::CreateGist { file, description } => {
            let contents = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let filename = file
                .file_name()
                .and_then(|name| name.to_str())
                .context("Gist file needs a UTF-8 file name")?;
            print(
                &client
                    .create_private_gist(&description, filename, &contents)
                    .await?,
            )
        }
        Command::DeleteGist { id } => {
            client.delete_gist(&id).await?;
            print(&json!({ "deleted": id }))
        }
        Command::Starred { repo } => {
            let starred = client.repo_starred(&repo).await?;
            print(&json!({ "repo": repo, "starred": starred }))
        }
        Command::Star { repo } => {
            client.star_repo(&repo).await?;
            print(&json!({ "repo": repo, "starred": true }))
        }
        Command::Unstar { repo } => {
            client.unstar_repo(&repo).await?;
            print(&json!({ "repo": repo, "starred": false }))
        }
    }
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
