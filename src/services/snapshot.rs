//! Dashboard refresh: snapshot + aggregates for a handful of users

use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::fanout::permits;
use super::{
    CommitAggregator, EventAggregator, GithubTransport, HttpTransport, LanguageAggregator,
    RepositoryLister, SnapshotCache,
};
use crate::config::Config;
use crate::types::{FetchError, FetchedUser, ProfileSummary, Result, UserBundle, UserResult};

/// Entry point for the presentation layer.
///
/// Cheap to clone; clones share the transport and the cache.
#[derive(Clone)]
pub struct SnapshotService {
    cache: Arc<SnapshotCache>,
    lister: RepositoryLister,
    events: EventAggregator,
    commits: CommitAggregator,
    languages: LanguageAggregator,
    max_concurrency: usize,
}

impl SnapshotService {
    /// Build the production stack: reqwest transport and a fresh cache.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = Arc::new(GithubTransport::new(config)?);
        let cache = Arc::new(SnapshotCache::new(config.cache_ttl()));
        Ok(Self::new(transport, cache, config.max_concurrency))
    }

    pub fn new(
        transport: Arc<dyn HttpTransport>,
        cache: Arc<SnapshotCache>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            cache,
            lister: RepositoryLister::new(Arc::clone(&transport)),
            events: EventAggregator::new(Arc::clone(&transport)),
            commits: CommitAggregator::new(Arc::clone(&transport), max_concurrency),
            languages: LanguageAggregator::new(transport, max_concurrency),
            max_concurrency,
        }
    }

    /// One result per username, in input order. Users are processed in
    /// parallel and independently of each other.
    pub async fn get_snapshot_bundle(&self, usernames: &[String]) -> Vec<UserResult> {
        let mut join_set = JoinSet::new();
        for (index, username) in usernames.iter().enumerate() {
            let service = self.clone();
            let username = username.clone();
            join_set.spawn(async move { (index, service.user_result(&username).await) });
        }

        let mut slots: Vec<Option<UserResult>> = vec![None; usernames.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => warn!(error = %e, "user refresh task failed"),
            }
        }

        slots
            .into_iter()
            .zip(usernames)
            .map(|(slot, username)| {
                slot.unwrap_or_else(|| UserResult::Failed {
                    username: username.clone(),
                    reason: "refresh task aborted".into(),
                })
            })
            .collect()
    }

    /// Snapshot from cache (or upstream), then aggregates from that
    /// snapshot's repository list.
    pub async fn user_result(&self, username: &str) -> UserResult {
        let snapshot = match self
            .cache
            .get_or_fetch(username, || self.fetch_user(username))
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(username, error = %e, "profile unavailable");
                return UserResult::Failed {
                    username: username.to_string(),
                    reason: e.to_string(),
                };
            }
        };

        // Commit and language calls for one user share a single limit
        let pool = permits(self.max_concurrency);
        let (commit_days, languages) = tokio::join!(
            self.commits
                .daily_commits_within(username, &snapshot.repositories, &pool),
            self.languages
                .language_histogram_within(&snapshot.repositories, &pool),
        );

        info!(
            username,
            repositories = snapshot.repositories.len(),
            events = snapshot.events.len(),
            commit_days = commit_days.len(),
            "user refreshed"
        );

        UserResult::Ready(UserBundle {
            summary: ProfileSummary::from_snapshot(&snapshot),
            repositories: snapshot.repositories.clone(),
            commit_days,
            languages,
            events: EventAggregator::histogram(&snapshot.events),
        })
    }

    async fn fetch_user(&self, username: &str) -> std::result::Result<FetchedUser, FetchError> {
        let (profile, repositories) = self.lister.fetch_profile_and_repos(username).await?;
        let events = self.events.fetch_events(username).await;
        Ok(FetchedUser {
            profile,
            repositories,
            events,
        })
    }
}
