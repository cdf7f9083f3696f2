//! Fetch, cache and aggregate GitHub activity for side-by-side comparison
//!
//! The entry point is [`services::SnapshotService::get_snapshot_bundle`].

pub mod config;
pub mod services;
pub mod types;
