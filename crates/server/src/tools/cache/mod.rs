//! Cache administration MCP tools.
//!
//! These act on the cache facade directly rather than through the
//! mutation registry.

pub mod flush;
pub mod invalidate;
pub mod purge;
pub mod stats;

pub use flush::{CacheFlushParams, flush_impl};
pub use invalidate::{CacheInvalidateParams, invalidate_impl};
pub use purge::{CachePurgeParams, purge_impl};
pub use stats::{CacheStatsParams, stats_impl};
