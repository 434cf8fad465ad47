//! MCP server handler implementation.
//!
//! Routes tool calls to the implementations in [`crate::tools`], handing
//! each one the shared [`AppState`].
use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

use crate::catalog::NewProduct;
use crate::state::AppState;
use crate::tools::cache::{CacheFlushParams, CacheInvalidateParams, CachePurgeParams, CacheStatsParams};
use crate::tools::categories::{CategoriesListParams, CategoryCreateParams, CategoryDeleteParams, CategoryUpdateParams};
use crate::tools::orders::{OrderDeleteParams, OrderPlaceParams, OrderStatusParams, OrdersListParams, UserOrdersParams};
use crate::tools::products::{
    ProductDeleteParams, ProductShowParams, ProductToggleParams, ProductUpdateParams, ProductsListParams,
};
use crate::tools::users::{UserCreateParams, UserUpdateParams};
use crate::tools::{cache, categories, orders, products, users};

/// The storefront MCP server.
#[derive(Clone)]
pub struct ShelfServer {
    state: Arc<AppState>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ShelfServer {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state, tool_router: Self::tool_router() }
    }

    #[tool(description = "List products with optional filters, sorting and pagination. Results are cached.")]
    async fn products_list(&self, params: Parameters<ProductsListParams>) -> Result<CallToolResult, McpError> {
        products::list_impl(&self.state, params.0).await
    }

    #[tool(description = "Show one product with its category name. Results are cached.")]
    async fn product_show(&self, params: Parameters<ProductShowParams>) -> Result<CallToolResult, McpError> {
        products::show_impl(&self.state, params.0).await
    }

    #[tool(description = "Create a product and invalidate product and order caches.")]
    async fn product_create(&self, params: Parameters<NewProduct>) -> Result<CallToolResult, McpError> {
        products::create_impl(&self.state, params.0).await
    }

    #[tool(description = "Update a product's fields and invalidate product and order caches.")]
    async fn product_update(&self, params: Parameters<ProductUpdateParams>) -> Result<CallToolResult, McpError> {
        products::update_impl(&self.state, params.0).await
    }

    #[tool(description = "Soft-delete a product and invalidate product and order caches.")]
    async fn product_delete(&self, params: Parameters<ProductDeleteParams>) -> Result<CallToolResult, McpError> {
        products::delete_impl(&self.state, params.0).await
    }

    #[tool(description = "Activate or deactivate a product and invalidate product and order caches.")]
    async fn product_toggle_active(&self, params: Parameters<ProductToggleParams>) -> Result<CallToolResult, McpError> {
        products::toggle_impl(&self.state, params.0).await
    }

    #[tool(description = "List categories with optional search, sorting and pagination. Results are cached.")]
    async fn categories_list(&self, params: Parameters<CategoriesListParams>) -> Result<CallToolResult, McpError> {
        categories::list_impl(&self.state, params.0).await
    }

    #[tool(description = "Create a category.")]
    async fn category_create(&self, params: Parameters<CategoryCreateParams>) -> Result<CallToolResult, McpError> {
        categories::create_impl(&self.state, params.0).await
    }

    #[tool(description = "Rename a category. Cached product and order views pick up the new name.")]
    async fn category_update(&self, params: Parameters<CategoryUpdateParams>) -> Result<CallToolResult, McpError> {
        categories::update_impl(&self.state, params.0).await
    }

    #[tool(description = "Soft-delete a category, or restore it with restore=true.")]
    async fn category_delete(&self, params: Parameters<CategoryDeleteParams>) -> Result<CallToolResult, McpError> {
        categories::delete_impl(&self.state, params.0).await
    }

    #[tool(description = "List all orders with optional filters, sorting and pagination. Results are cached.")]
    async fn orders_list(&self, params: Parameters<OrdersListParams>) -> Result<CallToolResult, McpError> {
        orders::list_impl(&self.state, params.0).await
    }

    #[tool(description = "List one user's orders. Results are cached per user.")]
    async fn user_orders(&self, params: Parameters<UserOrdersParams>) -> Result<CallToolResult, McpError> {
        orders::user_orders_impl(&self.state, params.0).await
    }

    #[tool(description = "Place an order. Fails without changes if any item lacks stock.")]
    async fn order_place(&self, params: Parameters<OrderPlaceParams>) -> Result<CallToolResult, McpError> {
        orders::place_impl(&self.state, params.0).await
    }

    #[tool(description = "Change an order's status.")]
    async fn order_update_status(&self, params: Parameters<OrderStatusParams>) -> Result<CallToolResult, McpError> {
        orders::update_status_impl(&self.state, params.0).await
    }

    #[tool(description = "Soft-delete an order and return its stock to the products.")]
    async fn order_delete(&self, params: Parameters<OrderDeleteParams>) -> Result<CallToolResult, McpError> {
        orders::delete_impl(&self.state, params.0).await
    }

    #[tool(description = "Create a user.")]
    async fn user_create(&self, params: Parameters<UserCreateParams>) -> Result<CallToolResult, McpError> {
        users::create_impl(&self.state, params.0).await
    }

    #[tool(description = "Rename a user. Cached order lists pick up the new name.")]
    async fn user_update(&self, params: Parameters<UserUpdateParams>) -> Result<CallToolResult, McpError> {
        users::update_impl(&self.state, params.0).await
    }

    #[tool(description = "Delete every cache entry under the given cache names.")]
    async fn cache_invalidate(&self, params: Parameters<CacheInvalidateParams>) -> Result<CallToolResult, McpError> {
        cache::invalidate_impl(&self.state, params.0).await
    }

    #[tool(description = "Delete every cache entry.")]
    async fn cache_flush(&self, params: Parameters<CacheFlushParams>) -> Result<CallToolResult, McpError> {
        cache::flush_impl(&self.state, params.0).await
    }

    #[tool(description = "Show cache hit, miss, error and invalidation counters.")]
    async fn cache_stats(&self, params: Parameters<CacheStatsParams>) -> Result<CallToolResult, McpError> {
        cache::stats_impl(&self.state, params.0).await
    }

    #[tool(description = "Delete expired cache entries.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        cache::purge_impl(&self.state, params.0).await
    }
}

impl ServerHandler for ShelfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "shelf-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
