//! Profile and repository listing

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::transport::{is_valid_repository_name, is_valid_username, HttpTransport, PAGE_SIZE};
use crate::types::{FetchError, Profile, Repository};

#[derive(Clone)]
pub struct RepositoryLister {
    transport: Arc<dyn HttpTransport>,
}

impl RepositoryLister {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Fetch the profile (load-bearing) and the first page of repositories.
    ///
    /// A failed repository listing degrades to an empty list. A username
    /// that is not a plain account name fails without any upstream call.
    pub async fn fetch_profile_and_repos(
        &self,
        username: &str,
    ) -> Result<(Profile, Vec<Repository>), FetchError> {
        if !is_valid_username(username) {
            return Err(FetchError::InvalidName {
                name: username.to_string(),
            });
        }
        let profile = self.fetch_profile(username).await?;

        let path = format!("/users/{}/repos?per_page={}", username, PAGE_SIZE);
        let repositories = match self.transport.get(&path).await {
            Ok(body) => parse_repositories(&path, body),
            Err(e) => {
                warn!(username, error = %e, "repository list unavailable, continuing without it");
                Vec::new()
            }
        };

        Ok((profile, repositories))
    }

    async fn fetch_profile(&self, username: &str) -> Result<Profile, FetchError> {
        let path = format!("/users/{}", username);
        let body = self.transport.get(&path).await?;
        serde_json::from_value(body).map_err(|e| FetchError::parse(&path, e.to_string()))
    }
}

/// Keep every well-formed entry; a malformed one is dropped on its own.
fn parse_repositories(path: &str, body: Value) -> Vec<Repository> {
    let Value::Array(items) = body else {
        warn!(path, "repository list is not an array");
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Repository>(item) {
            Ok(repo) if is_valid_repository_name(&repo.name) => Some(repo),
            Ok(repo) => {
                warn!(path, name = %repo.name, "skipping repository with unusable name");
                None
            }
            Err(e) => {
                debug!(path, error = %e, "skipping malformed repository entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fake::FakeTransport;
    use serde_json::json;

    const REPOS_PATH: &str = "/users/octocat/repos?per_page=100";

    fn lister(fake: &Arc<FakeTransport>) -> RepositoryLister {
        RepositoryLister::new(fake.clone())
    }

    #[tokio::test]
    async fn test_profile_and_repos() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(
            "/users/octocat",
            json!({"public_repos": 2, "followers": 10, "following": 1}),
        );
        fake.respond(
            REPOS_PATH,
            json!([
                {"name": "alpha", "languages_url": "https://api.github.com/repos/octocat/alpha/languages"},
                {"name": "beta"}
            ]),
        );

        let (profile, repos) = lister(&fake)
            .fetch_profile_and_repos("octocat")
            .await
            .unwrap();

        assert_eq!(profile.public_repos, 2);
        assert_eq!(profile.followers, 10);
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].name, "alpha");
        assert!(repos[1].languages_url.is_none());
    }

    #[tokio::test]
    async fn test_profile_failure_propagates_without_listing() {
        let fake = Arc::new(FakeTransport::new());
        fake.reject("/users/ghost", 404);

        let err = lister(&fake)
            .fetch_profile_and_repos("ghost")
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert_eq!(fake.call_count("/users/ghost/repos?per_page=100"), 0);
    }

    #[tokio::test]
    async fn test_malformed_profile_is_parse_failure() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond("/users/octocat", json!({"followers": "lots"}));

        let err = lister(&fake)
            .fetch_profile_and_repos("octocat")
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_repo_list_failure_degrades_to_empty() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond("/users/octocat", json!({"public_repos": 5}));
        fake.time_out(REPOS_PATH);

        let (profile, repos) = lister(&fake)
            .fetch_profile_and_repos("octocat")
            .await
            .unwrap();

        assert_eq!(profile.public_repos, 5);
        assert!(repos.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_repo_entries_are_skipped() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond("/users/octocat", json!({}));
        fake.respond(REPOS_PATH, json!([{"name": "ok"}, {"id": 7}, "junk"]));

        let (_, repos) = lister(&fake)
            .fetch_profile_and_repos("octocat")
            .await
            .unwrap();

        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].name, "ok");
    }

    #[tokio::test]
    async fn test_non_array_repo_list_is_empty() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond("/users/octocat", json!({}));
        fake.respond(REPOS_PATH, json!({"message": "unexpected"}));

        let (_, repos) = lister(&fake)
            .fetch_profile_and_repos("octocat")
            .await
            .unwrap();

        assert!(repos.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_username_fails_without_a_call() {
        let fake = Arc::new(FakeTransport::new());

        let err = lister(&fake)
            .fetch_profile_and_repos("../orgs/x")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            FetchError::InvalidName {
                name: "../orgs/x".into()
            }
        );
        assert_eq!(fake.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_repo_entries_with_unusable_names_are_skipped() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond("/users/octocat", json!({}));
        fake.respond(
            REPOS_PATH,
            json!([{"name": "ok"}, {"name": ".."}, {"name": "a/b"}]),
        );

        let (_, repos) = lister(&fake)
            .fetch_profile_and_repos("octocat")
            .await
            .unwrap();

        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].name, "ok");
    }
}
