//! Project context aggregation for promptlift
//!
//! [`ContextAggregator`] runs an ordered list of analyzers against a project,
//! merges their records into a [`ProjectContext`] and caches the result by
//! canonical path for the lifetime of the aggregator.

mod aggregator;
mod cache;
mod context;
pub mod render;

pub use aggregator::ContextAggregator;
pub use cache::CacheStats;
pub use context::ProjectContext;
