//! cache_stats tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelf_core::cache::CacheStats;

use crate::state::AppState;
use crate::tools::json_result;

/// Parameters for the cache_stats tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatsParams {}

/// Output from the cache_stats tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatsOutput {
    #[serde(flatten)]
    pub stats: CacheStats,

    /// Hits as a percentage of lookups.
    pub hit_rate: f64,

    /// Store capability: `indexed`, `enumerable` or `opaque`.
    pub capability: String,

    pub default_ttl_secs: u64,
}

/// Implementation of the cache_stats tool.
pub async fn stats_impl(state: &AppState, _params: CacheStatsParams) -> Result<CallToolResult, McpError> {
    let stats = state.cache.stats();
    json_result(&CacheStatsOutput {
        stats,
        hit_rate: stats.hit_rate(),
        capability: state.cache.store().capability().to_string(),
        default_ttl_secs: state.cache.default_ttl().as_secs(),
    })
}
