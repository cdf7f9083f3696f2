//! Snapshot types: what the upstream API tells us about a user

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Event tag used when the upstream omits `type` or sends something other
/// than a string
pub const UNKNOWN_EVENT_TYPE: &str = "Unknown";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Profile {
    #[serde(default)]
    pub public_repos: u64,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    /// Opaque reference to the repository's language breakdown
    #[serde(default)]
    pub languages_url: Option<String>,
}

/// One public event. Every event the feed returns is kept; odd field
/// values degrade to `Unknown` / `None` instead of dropping the event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    #[serde(
        rename = "type",
        default = "unknown_event_type",
        deserialize_with = "lenient_event_type"
    )]
    pub kind: String,
    #[serde(
        rename = "created_at",
        default,
        deserialize_with = "lenient_timestamp"
    )]
    pub occurred_at: Option<DateTime<Utc>>,
}

fn unknown_event_type() -> String {
    UNKNOWN_EVENT_TYPE.to_string()
}

fn lenient_event_type<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(kind) => kind,
        _ => unknown_event_type(),
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?
        .as_str()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|ts| ts.with_timezone(&Utc)))
}

/// Raw result of one upstream round for a user, before it is stamped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedUser {
    pub profile: Profile,
    pub repositories: Vec<Repository>,
    pub events: Vec<Event>,
}

/// A user's profile, repositories and events as of `fetched_at`.
///
/// Snapshots are never mutated once stored; a refresh produces a new one.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserSnapshot {
    pub username: String,
    pub fetched_at: DateTime<Utc>,
    pub profile: Profile,
    pub repositories: Vec<Repository>,
    pub events: Vec<Event>,
}

impl UserSnapshot {
    pub fn new(username: &str, fetched_at: DateTime<Utc>, fetched: FetchedUser) -> Self {
        Self {
            username: username.to_string(),
            fetched_at,
            profile: fetched.profile,
            repositories: fetched.repositories,
            events: fetched.events,
        }
    }
}
