//! cache_purge tool implementation.
//!
//! Removes expired entries from the store. Expired entries are already
//! invisible to reads, so this only reclaims space.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Number of expired entries deleted.
    pub deleted: u64,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(state: &AppState, _params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let deleted = state.cache.purge_expired().await?;
    json_result(&CachePurgeOutput { deleted })
}
