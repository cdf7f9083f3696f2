//! Daily commit counts across a user's repositories

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::fanout::{fan_out, permits};
use super::transport::{is_valid_repository_name, is_valid_username, HttpTransport, PAGE_SIZE};
use super::Aggregator;
use crate::types::{CommitDay, FetchError, Repository};

#[derive(Clone)]
pub struct CommitAggregator {
    transport: Arc<dyn HttpTransport>,
    max_concurrency: usize,
}

impl CommitAggregator {
    pub fn new(transport: Arc<dyn HttpTransport>, max_concurrency: usize) -> Self {
        Self {
            transport,
            max_concurrency,
        }
    }

    /// One commit-history call per repository (first page only), bucketed by
    /// day. A repository whose call fails contributes nothing.
    pub async fn daily_commits(&self, username: &str, repositories: &[Repository]) -> Vec<CommitDay> {
        self.daily_commits_within(username, repositories, &permits(self.max_concurrency))
            .await
    }

    /// Same as [`Self::daily_commits`], drawing call permits from a pool
    /// shared with other fan-outs.
    pub async fn daily_commits_within(
        &self,
        username: &str,
        repositories: &[Repository],
        pool: &Arc<Semaphore>,
    ) -> Vec<CommitDay> {
        if !is_valid_username(username) {
            warn!(username, "invalid username, no commit history");
            return Vec::new();
        }
        let paths = repositories
            .iter()
            .filter(|repo| is_valid_repository_name(&repo.name))
            .map(|repo| {
                format!(
                    "/repos/{}/{}/commits?per_page={}",
                    username, repo.name, PAGE_SIZE
                )
            });

        let per_repo = fan_out(paths, pool, |path| {
            let transport = Arc::clone(&self.transport);
            async move {
                match transport.get(&path).await {
                    Ok(body) => commit_timestamps(&path, &body),
                    Err(e) => {
                        warn!(path = %path, error = %e, "commit history unavailable, skipping repository");
                        Vec::new()
                    }
                }
            }
        })
        .await;

        let timestamps: Vec<DateTime<Utc>> = per_repo.into_iter().flatten().collect();
        Aggregator::daily(&timestamps)
    }
}

/// Author timestamps from a commit list. Entries without a parseable
/// `commit.author.date` are dropped one by one.
fn commit_timestamps(path: &str, body: &Value) -> Vec<DateTime<Utc>> {
    let Some(commits) = body.as_array() else {
        warn!(path, "commit history is not an array");
        return Vec::new();
    };

    commits
        .iter()
        .filter_map(|commit| match author_date(path, commit) {
            Ok(ts) => Some(ts),
            Err(e) => {
                debug!(error = %e, "dropping commit");
                None
            }
        })
        .collect()
}

fn author_date(path: &str, commit: &Value) -> Result<DateTime<Utc>, FetchError> {
    let raw = commit
        .pointer("/commit/author/date")
        .and_then(Value::as_str)
        .ok_or_else(|| FetchError::parse(path, "commit without author date"))?;

    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| FetchError::parse(path, format!("bad timestamp {:?}: {}", raw, e)))
}
