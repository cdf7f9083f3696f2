//! Scripted `HttpTransport` and a hand-driven clock for unit tests

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{Clock, HttpTransport};
use crate::types::FetchError;

#[derive(Default)]
pub(crate) struct FakeTransport {
    responses: Mutex<HashMap<String, Result<Value, FetchError>>>,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps this long before answering
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn respond(&self, path: &str, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), Ok(body));
    }

    pub fn reject(&self, path: &str, status: u16) {
        self.responses.lock().unwrap().insert(
            path.to_string(),
            Err(FetchError::UpstreamRejection {
                path: path.to_string(),
                status,
            }),
        );
    }

    pub fn time_out(&self, path: &str) {
        self.responses.lock().unwrap().insert(
            path.to_string(),
            Err(FetchError::Transport {
                path: path.to_string(),
                message: "operation timed out".into(),
                timed_out: true,
            }),
        );
    }

    pub fn call_count(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.as_str() == path)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn get(&self, path: &str) -> Result<Value, FetchError> {
        self.calls.lock().unwrap().push(path.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let response = self
            .responses
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(|| {
                Err(FetchError::UpstreamRejection {
                    path: path.to_string(),
                    status: 404,
                })
            });

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }
}

/// Clock that only moves when told to
pub(crate) struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += TimeDelta::from_std(by).unwrap();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
