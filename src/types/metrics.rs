//! Derived, display-ready aggregates handed to the presentation layer

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Repository, UserSnapshot};

/// Language name → number of repositories reporting it
pub type LanguageHistogram = HashMap<String, u64>;

/// Event type → number of events of that type
pub type EventHistogram = HashMap<String, u64>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitDay {
    pub date: NaiveDate,
    pub count: u64,
}

/// Numbers shown on a user's card
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileSummary {
    pub username: String,
    pub public_repos: u64,
    pub followers: u64,
    pub following: u64,
    pub public_events: u64,
}

impl ProfileSummary {
    pub fn from_snapshot(snapshot: &UserSnapshot) -> Self {
        Self {
            username: snapshot.username.clone(),
            public_repos: snapshot.profile.public_repos,
            followers: snapshot.profile.followers,
            following: snapshot.profile.following,
            public_events: snapshot.events.len() as u64,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserBundle {
    pub summary: ProfileSummary,
    pub repositories: Vec<Repository>,
    pub commit_days: Vec<CommitDay>,
    pub languages: LanguageHistogram,
    pub events: EventHistogram,
}

/// Per-username outcome of a dashboard refresh
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UserResult {
    Ready(UserBundle),
    /// Profile could not be fetched; nothing to show for this user
    Failed { username: String, reason: String },
}

impl UserResult {
    pub fn username(&self) -> &str {
        match self {
            Self::Ready(bundle) => &bundle.summary.username,
            Self::Failed { username, .. } => username,
        }
    }

    pub fn bundle(&self) -> Option<&UserBundle> {
        match self {
            Self::Ready(bundle) => Some(bundle),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}
