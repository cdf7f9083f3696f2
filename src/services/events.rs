//! Public event feed

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::transport::{is_valid_username, HttpTransport, PAGE_SIZE};
use super::Aggregator;
use crate::types::{Event, EventHistogram};

#[derive(Clone)]
pub struct EventAggregator {
    transport: Arc<dyn HttpTransport>,
}

impl EventAggregator {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// First page of the user's public events. Empty on any failure.
    pub async fn fetch_events(&self, username: &str) -> Vec<Event> {
        if !is_valid_username(username) {
            warn!(username, "invalid username, no event feed");
            return Vec::new();
        }
        let path = format!("/users/{}/events/public?per_page={}", username, PAGE_SIZE);
        match self.transport.get(&path).await {
            Ok(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match serde_json::from_value::<Event>(item) {
                    Ok(event) => Some(event),
                    Err(e) => {
                        debug!(path = %path, error = %e, "skipping malformed event");
                        None
                    }
                })
                .collect(),
            Ok(_) => {
                warn!(username, "event feed is not an array");
                Vec::new()
            }
            Err(e) => {
                warn!(username, error = %e, "event feed unavailable, continuing without it");
                Vec::new()
            }
        }
    }

    pub fn histogram(events: &[Event]) -> EventHistogram {
        Aggregator::by_event_type(events)
    }
}
