//! Snapshot caching service
//!
//! Keeps the latest snapshot per username for a fixed TTL. Concurrent
//! requests for the same username share one upstream fetch; requests for
//! different usernames never wait on each other.

use crate::types::{FetchError, FetchedUser, UserSnapshot};
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// Source of "now" for expiry decisions
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

type Outcome = Result<Arc<UserSnapshot>, FetchError>;

enum Slot {
    Ready(Arc<UserSnapshot>),
    /// A fetch is running; the receiver yields its outcome once settled
    Pending(watch::Receiver<Option<Outcome>>),
}

enum Lookup {
    Hit(Arc<UserSnapshot>),
    Join(watch::Receiver<Option<Outcome>>),
    Lead(watch::Sender<Option<Outcome>>),
}

pub struct SnapshotCache {
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
    slots: DashMap<String, Slot>,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            clock,
            slots: DashMap::new(),
        }
    }

    /// Return the cached snapshot for `username` if still valid, otherwise
    /// run `fetch` and cache its result stamped with the current time.
    ///
    /// If a fetch for `username` is already running, wait for it and return
    /// its outcome (success or failure) instead of starting another one.
    /// Failures are handed to every waiter but never cached.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        username: &str,
        fetch: F,
    ) -> Result<Arc<UserSnapshot>, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<FetchedUser, FetchError>>,
    {
        let sender = loop {
            match self.lookup(username) {
                Lookup::Hit(snapshot) => {
                    debug!(username, "snapshot cache hit");
                    return Ok(snapshot);
                }
                Lookup::Join(mut receiver) => {
                    debug!(username, "joining in-flight snapshot fetch");
                    let settled = receiver
                        .wait_for(|outcome| outcome.is_some())
                        .await
                        .ok()
                        .and_then(|outcome| (*outcome).clone());
                    if let Some(outcome) = settled {
                        return outcome;
                    }
                    // Leader went away without an answer; look again.
                }
                Lookup::Lead(sender) => break sender,
            }
        };

        debug!(username, "snapshot cache miss, fetching");
        let outcome = fetch()
            .await
            .map(|fetched| Arc::new(UserSnapshot::new(username, self.clock.now(), fetched)));

        match &outcome {
            Ok(snapshot) => {
                self.slots
                    .insert(username.to_string(), Slot::Ready(Arc::clone(snapshot)));
            }
            Err(e) => {
                debug!(username, error = %e, "snapshot fetch failed, not caching");
                self.slots.remove(username);
            }
        }

        let _ = sender.send(Some(outcome.clone()));
        outcome
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn is_fresh(&self, snapshot: &UserSnapshot) -> bool {
        self.clock.now().signed_duration_since(snapshot.fetched_at) < self.ttl
    }

    /// Decide under the key's shard lock whether to serve, wait, or fetch.
    fn lookup(&self, username: &str) -> Lookup {
        match self.slots.entry(username.to_string()) {
            Entry::Occupied(mut occupied) => {
                let current = match occupied.get() {
                    Slot::Ready(snapshot) if self.is_fresh(snapshot) => {
                        Some(Lookup::Hit(Arc::clone(snapshot)))
                    }
                    // A closed channel means the leader was dropped mid-fetch
                    Slot::Pending(receiver) if receiver.has_changed().is_ok() => {
                        Some(Lookup::Join(receiver.clone()))
                    }
                    _ => None,
                };
                current.unwrap_or_else(|| {
                    let (sender, receiver) = watch::channel(None);
                    occupied.insert(Slot::Pending(receiver));
                    Lookup::Lead(sender)
                })
            }
            Entry::Vacant(vacant) => {
                let (sender, receiver) = watch::channel(None);
                vacant.insert(Slot::Pending(receiver));
                Lookup::Lead(sender)
            }
        }
    }
}
