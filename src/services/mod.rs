//! Services for fetching, caching and aggregating upstream data

pub mod aggregator;
pub mod cache;
pub mod commits;
pub mod events;
pub mod fanout;
pub mod languages;
pub mod repositories;
pub mod snapshot;
pub mod transport;

#[cfg(test)]
pub(crate) mod fake;

pub use aggregator::Aggregator;
pub use cache::{Clock, SnapshotCache, SystemClock};
pub use commits::CommitAggregator;
pub use events::EventAggregator;
pub use languages::LanguageAggregator;
pub use repositories::RepositoryLister;
pub use snapshot::SnapshotService;
pub use transport::{
    is_valid_repository_name, is_valid_username, GithubTransport, HttpTransport, PAGE_SIZE,
};
