//! MCP tool implementations.
//!
//! Read tools go through the cache facade. Write tools mutate the catalog
//! and then report a mutation event so the registry can invalidate the
//! affected caches.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use shelf_core::{Error, ParamBag};

use crate::catalog::ListOptions;

pub mod cache;
pub mod categories;
pub mod orders;
pub mod products;
pub mod users;

/// Serialize `output` as the tool's text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Trimmed string, or `None` when blank.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Blank sort columns count as unset.
pub(crate) fn normalize_list(mut options: ListOptions) -> ListOptions {
    options.sort_column = non_empty(options.sort_column);
    options
}

/// Add the caller's pagination and sort fields to `bag`.
///
/// Only the fields the caller set are added; the key deriver fills in the
/// defaults so an explicit default and an omitted one share a key.
pub(crate) fn with_list_options(bag: ParamBag, options: &ListOptions) -> ParamBag {
    bag.with_opt("page", options.page)
        .with_opt("per_page", options.per_page)
        .with_opt("sort_column", options.sort_column.clone())
        .with_opt("sort_direction", options.sort_direction.map(|d| d.as_str()))
}
