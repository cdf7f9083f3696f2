//! Bounded-concurrency fan-out over independent upstream calls

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

/// Permit pool for `limit` concurrent calls; zero is treated as one.
pub fn permits(limit: usize) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(limit.max(1)))
}

/// Run `task` for every item, each holding one permit from `permits`
/// while it runs.
///
/// Fan-outs that share a pool share its limit. Results come back in
/// completion order. A task that panics contributes nothing and is logged.
pub async fn fan_out<I, F, Fut, T>(items: I, permits: &Arc<Semaphore>, task: F) -> Vec<T>
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let mut join_set = JoinSet::new();

    for item in items {
        let permit = Arc::clone(permits);
        let fut = task(item);
        join_set.spawn(async move {
            // The semaphore is never closed, so acquire only waits.
            let _permit = permit.acquire_owned().await.ok();
            fut.await
        });
    }

    let mut results = Vec::with_capacity(join_set.len());
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(value) => results.push(value),
            Err(e) => warn!(error = %e, "fan-out task failed"),
        }
    }
    results
}
