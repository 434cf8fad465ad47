//! cache_invalidate tool implementation.
//!
//! Invalidates named caches by prefix without a data write.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelf_core::{CacheName, Error};

use crate::state::AppState;
use crate::tools::json_result;

/// Parameters for the cache_invalidate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheInvalidateParams {
    /// Cache names whose entries should be deleted.
    pub names: Vec<CacheName>,
}

/// Implementation of the cache_invalidate tool.
pub async fn invalidate_impl(state: &AppState, params: CacheInvalidateParams) -> Result<CallToolResult, McpError> {
    if params.names.is_empty() {
        return Err(Error::InvalidInput("names must list at least one cache".to_string()).into());
    }

    let outcome = state.cache.invalidate(&params.names).await?;
    json_result(&outcome)
}
