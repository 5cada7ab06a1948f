//! Supporting services for the search pipeline.
//!
//! Services hold state that outlives a single query:
//! - Usage tracking (frequency/recency scores fed into ranking)

pub mod usage;

pub use usage::{UsageEntry, UsageTracker};
