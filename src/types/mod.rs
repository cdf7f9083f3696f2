//! Type definitions for selfdash

mod error;
mod metrics;
mod snapshot;

pub use error::*;
pub use metrics::*;
pub use snapshot::*;
