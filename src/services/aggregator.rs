//! Aggregator for turning raw upstream records into display-ready metrics

use crate::types::{CommitDay, Event, EventHistogram, LanguageHistogram};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};

/// Aggregator for computing per-user metrics
pub struct Aggregator;

impl Aggregator {
    /// Bucket commit timestamps by UTC calendar day (sorted by date ascending)
    pub fn daily(timestamps: &[DateTime<Utc>]) -> Vec<CommitDay> {
        if timestamps.is_empty() {
            return Vec::new();
        }

        let mut daily_map: HashMap<NaiveDate, u64> = HashMap::new();
        for ts in timestamps {
            let count = daily_map.entry(ts.date_naive()).or_insert(0);
            *count = count.saturating_add(1);
        }

        let mut result: Vec<CommitDay> = daily_map
            .into_iter()
            .map(|(date, count)| CommitDay { date, count })
            .collect();
        result.sort_by_key(|d| d.date);
        result
    }

    /// Count repositories per language. Each repository counts once per
    /// language it reports, regardless of byte volume.
    pub fn by_language<I, L>(breakdowns: I) -> LanguageHistogram
    where
        I: IntoIterator<Item = L>,
        L: IntoIterator<Item = String>,
    {
        let mut histogram = LanguageHistogram::new();
        for languages in breakdowns {
            let present: HashSet<String> = languages.into_iter().collect();
            for language in present {
                let count = histogram.entry(language).or_insert(0);
                *count = count.saturating_add(1);
            }
        }
        histogram
    }

    /// Count events per type tag
    pub fn by_event_type(events: &[Event]) -> EventHistogram {
        let mut histogram = EventHistogram::new();
        for event in events {
            let count = histogram.entry(event.kind.clone()).or_insert(0);
            *count = count.saturating_add(1);
        }
        histogram
    }

    /// Sum of all counts in a histogram
    pub fn total(histogram: &HashMap<String, u64>) -> u64 {
        histogram
            .values()
            .fold(0u64, |acc, n| acc.saturating_add(*n))
    }
}
