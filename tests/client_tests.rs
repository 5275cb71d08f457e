// Client operations against a mock GitHub API
// Author: kelexine (https://github.com/kelexine)

use github_gateway::config::{CacheKeyScope, GitHubConfig};
use github_gateway::storage::MemoryStorage;
use github_gateway::{GitHubApiError, GitHubClient};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::sync::Arc;

const TOKEN: &str = "test-token";

fn config_for(server: &ServerGuard) -> GitHubConfig {
    GitHubConfig {
        api_base_url: server.url(),
        ..GitHubConfig::default()
    }
}

fn client_for(server: &ServerGuard) -> GitHubClient {
    GitHubClient::builder(TOKEN)
        .config(config_for(server))
        .build()
        .unwrap()
}

/// Path regex that matches `path` with or without a query string.
fn path_with_query(path: &str) -> Matcher {
    Matcher::Regex(format!("^{}(\\?.*)?$", path))
}

fn page_query(page: u32) -> Matcher {
    Matcher::UrlEncoded("page".into(), page.to_string())
}

#[tokio::test]
async fn test_user_info() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/users/octocat")
        .match_header("authorization", format!("token {}", TOKEN).as_str())
        .match_header("accept", "application/vnd.github+json")
        .match_header("user-agent", Matcher::Regex("^github-gateway/".into()))
        .with_status(200)
        .with_body(
            json!({
                "login": "octocat",
                "name": "The Octocat",
                "location": "San Francisco",
                "public_repos": 8
            })
            .to_string(),
        )
        .create_async()
        .await;

    let profile = client_for(&server).user_info("octocat").await.unwrap();

    assert_eq!(profile.name.as_deref(), Some("The Octocat"));
    assert_eq!(profile.location.as_deref(), Some("San Francisco"));
    assert_eq!(profile.public_repo_count, 8);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_user_info_unknown_user() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/users/nobody-here")
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await;

    match client_for(&server).user_info("nobody-here").await {
        Err(GitHubApiError::NonexistentUser(name)) => assert_eq!(name, "nobody-here"),
        other => panic!("expected NonexistentUser, got {:?}", other),
    }
}

#[tokio::test]
async fn test_bad_credentials_is_authentication_failure() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/users/octocat")
        .with_status(401)
        .with_body(r#"{"message":"Bad credentials"}"#)
        .create_async()
        .await;

    match client_for(&server).user_info("octocat").await {
        Err(GitHubApiError::AuthenticationFailure(message)) => {
            assert_eq!(message, "Bad credentials")
        }
        other => panic!("expected AuthenticationFailure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_public_repos_follow_pages_and_skip_forks() {
    let mut server = Server::new_async().await;
    let next = format!("{}/user/583231/repos?page=2", server.url());

    server
        .mock("GET", "/users/octocat/repos")
        .with_status(200)
        .with_header("link", &format!("<{}>; rel=\"next\"", next))
        .with_body(
            json!([
                {"full_name": "octocat/Hello-World", "fork": false},
                {"full_name": "octocat/linguist", "fork": true}
            ])
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", path_with_query("/user/583231/repos"))
        .match_query(page_query(2))
        .with_status(200)
        .with_body(json!([{"full_name": "octocat/Spoon-Knife", "fork": false}]).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/repos/octocat/Hello-World/languages")
        .with_status(200)
        .with_body(r#"{"C": 1200, "Shell": 80}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/repos/octocat/Spoon-Knife/languages")
        .with_status(200)
        .with_body(r#"{"HTML": 1000}"#)
        .create_async()
        .await;
    let fork_languages = server
        .mock("GET", "/repos/octocat/linguist/languages")
        .with_status(200)
        .with_body("{}")
        .expect(0)
        .create_async()
        .await;

    let repos = client_for(&server)
        .public_repos_for_user("octocat", false)
        .await
        .unwrap();

    let names: Vec<_> = repos.iter().map(|r| r.full_name.as_str()).collect();
    assert_eq!(names, vec!["octocat/Hello-World", "octocat/Spoon-Knife"]);
    assert_eq!(repos[0].language_breakdown.get("C"), Some(&1200));
    assert_eq!(repos[1].language_breakdown.get("HTML"), Some(&1000));
    fork_languages.assert_async().await;
}

#[tokio::test]
async fn test_public_repos_including_forks() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/users/octocat/repos")
        .with_status(200)
        .with_body(json!([{"full_name": "octocat/linguist", "fork": true}]).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/repos/octocat/linguist/languages")
        .with_status(200)
        .with_body(r#"{"Ruby": 42}"#)
        .create_async()
        .await;

    let repos = client_for(&server)
        .public_repos_for_user("octocat", true)
        .await
        .unwrap();

    assert_eq!(repos.len(), 1);
    assert_eq!(repos[0].language_breakdown.get("Ruby"), Some(&42));
}

#[tokio::test]
async fn test_public_repos_missing_languages_is_nonexistent_repo() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/users/octocat/repos")
        .with_status(200)
        .with_body(json!([{"full_name": "octocat/gone", "fork": false}]).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/repos/octocat/gone/languages")
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await;

    match client_for(&server).public_repos_for_user("octocat", false).await {
        Err(GitHubApiError::NonexistentRepo(name)) => assert_eq!(name, "octocat/gone"),
        other => panic!("expected NonexistentRepo, got {:?}", other),
    }
}

#[tokio::test]
async fn test_public_events_across_pages() {
    let mut server = Server::new_async().await;
    let base = server.url();
    let page = |n: u32| format!("{}/user/583231/events/public?page={}", base, n);

    server
        .mock("GET", "/users/octocat/events/public")
        .with_status(200)
        .with_header("link", &format!("<{}>; rel=\"next\"", page(2)))
        .with_body(json!([{"type": "PushEvent", "repo": {"name": "octocat/a"}}]).to_string())
        .create_async()
        .await;
    server
        .mock("GET", path_with_query("/user/583231/events/public"))
        .match_query(page_query(2))
        .with_status(200)
        .with_header("link", &format!("<{}>; rel=\"next\"", page(3)))
        .with_body(json!([{"type": "WatchEvent", "repo": {"name": "octocat/b"}}]).to_string())
        .create_async()
        .await;
    server
        .mock("GET", path_with_query("/user/583231/events/public"))
        .match_query(page_query(3))
        .with_status(200)
        .with_body(json!([{"type": "ForkEvent", "repo": {"name": "octocat/c"}}]).to_string())
        .create_async()
        .await;

    let events = client_for(&server)
        .public_events_for_user("octocat")
        .await
        .unwrap();

    let types: Vec<_> = events.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(types, vec!["PushEvent", "WatchEvent", "ForkEvent"]);
    assert_eq!(events[2].repo_name, "octocat/c");
}

#[tokio::test]
async fn test_failed_follow_up_page_is_request_failure() {
    let mut server = Server::new_async().await;
    let next = format!("{}/user/583231/events/public?page=2", server.url());

    server
        .mock("GET", "/users/octocat/events/public")
        .with_status(200)
        .with_header("link", &format!("<{}>; rel=\"next\"", next))
        .with_body("[]")
        .create_async()
        .await;
    server
        .mock("GET", path_with_query("/user/583231/events/public"))
        .match_query(page_query(2))
        .with_status(500)
        .with_body(r#"{"message":"Server Error"}"#)
        .create_async()
        .await;

    match client_for(&server).public_events_for_user("octocat").await {
        Err(GitHubApiError::RequestFailure(message)) => assert_eq!(message, "Server Error"),
        other => panic!("expected RequestFailure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_create_private_gist() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/gists")
        .match_body(Matcher::PartialJson(json!({
            "description": "scratch",
            "public": false,
            "files": {"notes.md": {"content": "hello"}}
        })))
        .with_status(201)
        .with_body(
            json!({
                "id": "x1",
                "html_url": "https://gist.github.com/x1",
                "description": "scratch",
                "public": false,
                "created_at": "2024-01-02T03:04:05Z",
                "files": {"notes.md": {"filename": "notes.md", "content": "hello"}}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let gist = client_for(&server)
        .create_private_gist("scratch", "notes.md", "hello")
        .await
        .unwrap();

    assert_eq!(gist.id, "x1");
    assert!(!gist.is_public);
    assert!(gist.files.is_empty());
    assert_eq!(gist.created_at, "2024-01-02T03:04:05Z");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_create_gist_rejected() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/gists")
        .with_status(422)
        .with_body(r#"{"message":"Validation Failed"}"#)
        .create_async()
        .await;

    match client_for(&server)
        .create_private_gist("", "empty.txt", "")
        .await
    {
        Err(GitHubApiError::GistCreationFailure(message)) => {
            assert_eq!(message, "Validation Failed")
        }
        other => panic!("expected GistCreationFailure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_gists_page_reads_last_relation() {
    let mut server = Server::new_async().await;
    let link = format!(
        "<{0}/gists?page=3>; rel=\"next\", <{0}/gists?page=4>; rel=\"last\"",
        server.url()
    );
    server
        .mock("GET", path_with_query("/gists"))
        .match_query(page_query(2))
        .with_status(200)
        .with_header("link", &link)
        .with_body(
            json!([{
                "id": "g1",
                "html_url": "https://gist.github.com/g1",
                "description": null,
                "public": true,
                "created_at": "2024-01-01T00:00:00Z",
                "files": {"a.rs": {"filename": "a.rs", "language": "Rust"}}
            }])
            .to_string(),
        )
        .create_async()
        .await;

    let page = client_for(&server).gists(2).await.unwrap();

    assert_eq!(page.page_number, 2);
    assert_eq!(page.total_pages, 4);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].description, None);
    assert!(page.items[0].files.is_empty());
}

#[tokio::test]
async fn test_gists_last_page_without_link() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", path_with_query("/gists"))
        .match_query(page_query(1))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    // Page numbers below one are clamped
    let page = client_for(&server).gists(0).await.unwrap();

    assert_eq!(page.page_number, 1);
    assert_eq!(page.total_pages, 1);
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn test_gist_info_lists_files() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/gists/aa5a315d")
        .with_status(200)
        .with_body(
            json!({
                "id": "aa5a315d",
                "html_url": "https://gist.github.com/aa5a315d",
                "description": "Hello World Examples",
                "public": true,
                "created_at": "2010-04-14T02:15:15Z",
                "files": {
                    "hello_world.rb": {"filename": "hello_world.rb", "language": "Ruby", "content": "puts 1"},
                    "hello_world.py": {"filename": "hello_world.py", "language": "Python", "content": "print(1)"}
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let gist = client_for(&server).gist_info("aa5a315d").await.unwrap();

    assert_eq!(gist.files.len(), 2);
    assert_eq!(gist.files[0].name, "hello_world.rb");
    assert_eq!(gist.files[1].language.as_deref(), Some("Python"));
    assert_eq!(gist.files[1].content, "print(1)");
}

#[tokio::test]
async fn test_gist_info_unknown_gist() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/gists/missing")
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await;

    assert!(matches!(
        client_for(&server).gist_info("missing").await,
        Err(GitHubApiError::NonexistentGist(id)) if id == "missing"
    ));
}

#[tokio::test]
async fn test_delete_gist() {
    let mut server = Server::new_async().await;
    server
        .mock("DELETE", "/gists/x1")
        .with_status(204)
        .create_async()
        .await;
    server
        .mock("DELETE", "/gists/missing")
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    client.delete_gist("x1").await.unwrap();
    assert!(matches!(
        client.delete_gist("missing").await,
        Err(GitHubApiError::NonexistentGist(_))
    ));
}

#[tokio::test]
async fn test_repo_starred() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/user/starred/rust-lang/rust")
        .with_status(204)
        .create_async()
        .await;
    server
        .mock("GET", "/user/starred/octocat/Hello-World")
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    assert!(client.repo_starred("rust-lang/rust").await.unwrap());
    assert!(!client.repo_starred("octocat/Hello-World").await.unwrap());
}

#[tokio::test]
async fn test_star_and_unstar() {
    let mut server = Server::new_async().await;
    let star = server
        .mock("PUT", "/user/starred/rust-lang/rust")
        .match_header("content-length", "0")
        .with_status(204)
        .create_async()
        .await;
    let unstar = server
        .mock("DELETE", "/user/starred/rust-lang/rust")
        .with_status(204)
        .create_async()
        .await;

    let client = client_for(&server);
    client.star_repo("rust-lang/rust").await.unwrap();
    client.unstar_repo("rust-lang/rust").await.unwrap();

    star.assert_async().await;
    unstar.assert_async().await;
}

#[tokio::test]
async fn test_star_failure_carries_server_message() {
    let mut server = Server::new_async().await;
    server
        .mock("PUT", "/user/starred/octocat/private")
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await;

    match client_for(&server).star_repo("octocat/private").await {
        Err(GitHubApiError::RequestFailure(message)) => assert_eq!(message, "Not Found"),
        other => panic!("expected RequestFailure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cached_reads_skip_the_network() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/users/octocat")
        .with_status(200)
        .with_body(r#"{"name":"The Octocat","location":null,"public_repos":8}"#)
        .expect(1)
        .create_async()
        .await;

    let client = GitHubClient::builder(TOKEN)
        .config(config_for(&server))
        .cache(Arc::new(MemoryStorage::new()), CacheKeyScope::Shared)
        .build()
        .unwrap();

    let first = client.user_info("octocat").await.unwrap();
    let second = client.user_info("octocat").await.unwrap();

    assert_eq!(first, second);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_cached_not_found_still_maps_to_error() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/users/ghost")
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = GitHubClient::builder(TOKEN)
        .config(config_for(&server))
        .cache(Arc::new(MemoryStorage::new()), CacheKeyScope::Shared)
        .build()
        .unwrap();

    for _ in 0..2 {
        assert!(matches!(
            client.user_info("ghost").await,
            Err(GitHubApiError::NonexistentUser(_))
        ));
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_writes_bypass_the_cache() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", "/gists/x1")
        .with_status(204)
        .expect(2)
        .create_async()
        .await;

    let client = GitHubClient::builder(TOKEN)
        .config(config_for(&server))
        .cache(Arc::new(MemoryStorage::new()), CacheKeyScope::Shared)
        .build()
        .unwrap();

    client.delete_gist("x1").await.unwrap();
    client.delete_gist("x1").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_gist_id_cannot_reach_another_endpoint() {
    let mut server = Server::new_async().await;
    let unstar = server
        .mock("DELETE", "/user/starred/a/b")
        .with_status(204)
        .expect(0)
        .create_async()
        .await;

    match client_for(&server)
        .delete_gist("x/../../user/starred/a/b")
        .await
    {
        Err(GitHubApiError::NonexistentGist(id)) => assert_eq!(id, "x/../../user/starred/a/b"),
        other => panic!("expected NonexistentGist, got {:?}", other),
    }
    unstar.assert_async().await;
}

#[tokio::test]
async fn test_username_cannot_reach_another_endpoint() {
    let mut server = Server::new_async().await;
    let own_profile = server
        .mock("GET", "/user")
        .with_status(200)
        .with_body(r#"{"name":"Token Owner","location":"Home","public_repos":3}"#)
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server);
    for username in ["../user", ".."] {
        match client.user_info(username).await {
            Err(GitHubApiError::NonexistentUser(name)) => assert_eq!(name, username),
            other => panic!("expected NonexistentUser for {:?}, got {:?}", username, other),
        }
    }
    own_profile.assert_async().await;
}

#[tokio::test]
async fn test_malformed_repo_names_are_rejected_before_sending() {
    let mut server = Server::new_async().await;
    let anything = server
        .mock("PUT", Matcher::Any)
        .with_status(204)
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server);
    for name in ["rust", "a/../../gists", "rust-lang/rust/extra"] {
        assert!(matches!(
            client.star_repo(name).await,
            Err(GitHubApiError::NonexistentRepo(_))
        ));
        assert!(!client.repo_starred(name).await.unwrap());
    }
    anything.assert_async().await;
}

async fn unauthorized(server: &mut ServerGuard, method: &str, path: &str) {
    server
        .mock(method, path)
        .with_status(401)
        .with_body(r#"{"message":"Bad credentials"}"#)
        .create_async()
        .await;
}

fn assert_bad_credentials<T: std::fmt::Debug>(result: Result<T, GitHubApiError>) {
    match result {
        Err(GitHubApiError::AuthenticationFailure(message)) => {
            assert_eq!(message, "Bad credentials")
        }
        other => panic!("expected AuthenticationFailure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_bad_credentials_on_repo_starred_is_not_false() {
    let mut server = Server::new_async().await;
    unauthorized(&mut server, "GET", "/user/starred/rust-lang/rust").await;

    assert_bad_credentials(client_for(&server).repo_starred("rust-lang/rust").await);
}

#[tokio::test]
async fn test_bad_credentials_on_writes() {
    let mut server = Server::new_async().await;
    unauthorized(&mut server, "PUT", "/user/starred/rust-lang/rust").await;
    unauthorized(&mut server, "DELETE", "/gists/x1").await;

    let client = client_for(&server);
    assert_bad_credentials(client.star_repo("rust-lang/rust").await);
    assert_bad_credentials(client.delete_gist("x1").await);
}
