//! cache_flush tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::tools::json_result;

/// Parameters for the cache_flush tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheFlushParams {}

/// Output from the cache_flush tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheFlushOutput {
    /// Number of entries deleted.
    pub removed: u64,
}

/// Implementation of the cache_flush tool.
pub async fn flush_impl(state: &AppState, _params: CacheFlushParams) -> Result<CallToolResult, McpError> {
    let removed = state.cache.flush().await?;
    tracing::warn!(removed, "Cache flushed on request");
    json_result(&CacheFlushOutput { removed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{body, memory_state};
    use crate::tools::categories::{self, CategoriesListParams};

    #[tokio::test]
    async fn test_flush_empties_cache() {
        let state = memory_state();
        categories::list_impl(&state, CategoriesListParams::default()).await.unwrap();

        let output = body(&flush_impl(&state, CacheFlushParams::default()).await.unwrap());
        assert_eq!(output["removed"], 1);
        assert_eq!(state.cache.stats().flushes, 1);

        let output = body(&flush_impl(&state, CacheFlushParams::default()).await.unwrap());
        assert_eq!(output["removed"], 0);
    }
}
