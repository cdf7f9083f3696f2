//! Language histogram across a user's repositories

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::warn;

use super::fanout::{fan_out, permits};
use super::transport::HttpTransport;
use super::Aggregator;
use crate::types::{LanguageHistogram, Repository};

#[derive(Clone)]
pub struct LanguageAggregator {
    transport: Arc<dyn HttpTransport>,
    max_concurrency: usize,
}

impl LanguageAggregator {
    pub fn new(transport: Arc<dyn HttpTransport>, max_concurrency: usize) -> Self {
        Self {
            transport,
            max_concurrency,
        }
    }

    /// How many repositories use each language. Repositories without a
    /// languages reference are skipped; failed calls contribute nothing.
    pub async fn language_histogram(&self, repositories: &[Repository]) -> LanguageHistogram {
        self.language_histogram_within(repositories, &permits(self.max_concurrency))
            .await
    }

    /// Same as [`Self::language_histogram`], drawing call permits from a
    /// pool shared with other fan-outs.
    pub async fn language_histogram_within(
        &self,
        repositories: &[Repository],
        pool: &Arc<Semaphore>,
    ) -> LanguageHistogram {
        let urls = repositories
            .iter()
            .filter_map(|repo| repo.languages_url.clone());

        let breakdowns = fan_out(urls, pool, |url| {
            let transport = Arc::clone(&self.transport);
            async move {
                match transport.get(&url).await {
                    Ok(Value::Object(languages)) => languages.keys().cloned().collect::<Vec<String>>(),
                    Ok(_) => {
                        warn!(url = %url, "language breakdown is not an object");
                        Vec::new()
                    }
                    Err(e) => {
                        warn!(url = %url, error = %e, "language breakdown unavailable, skipping repository");
                        Vec::new()
                    }
                }
            }
        })
        .await;

        Aggregator::by_language(breakdowns)
    }
}
