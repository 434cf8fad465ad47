//! Product tools: cached list and detail reads, invalidating writes.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelf_core::{CacheName, InvalidationOutcome, MutationEvent, ParamBag};

use super::{json_result, non_empty, normalize_list, with_list_options};
use crate::catalog::{ListOptions, NewProduct, Page, ProductChanges, ProductFilter, ProductView};
use crate::state::AppState;

/// Parameters for the products_list tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ProductsListParams {
    #[serde(flatten)]
    pub filter: ProductFilter,

    #[serde(flatten)]
    pub list: ListOptions,
}

/// Output from the products_list tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductsListOutput {
    /// Cache key the page was read from or stored under.
    pub cache_key: String,
    #[serde(flatten)]
    pub page: Page<ProductView>,
}

/// Parameters for the product_show tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProductShowParams {
    pub id: i64,

    /// Also show a soft-deleted product.
    #[serde(default)]
    pub with_trashed: bool,
}

/// Parameters for the product_update tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProductUpdateParams {
    pub id: i64,

    #[serde(flatten)]
    pub changes: ProductChanges,
}

/// Parameters for the product_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProductDeleteParams {
    pub id: i64,
}

/// Parameters for the product_toggle_active tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProductToggleParams {
    pub id: i64,

    /// `true` restores a deleted product, `false` soft-deletes it.
    pub active: bool,
}

/// Output from product write tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductWriteOutput {
    pub product: ProductView,
    /// How the product caches were invalidated, if that succeeded.
    pub invalidation: Option<InvalidationOutcome>,
}

fn normalize(mut filter: ProductFilter) -> ProductFilter {
    filter.q = non_empty(filter.q);
    filter.name = non_empty(filter.name);
    filter.category_name = non_empty(filter.category_name);
    filter.date_from = non_empty(filter.date_from);
    filter.date_to = non_empty(filter.date_to);
    filter
}

/// Cache parameters for the filter fields alone.
fn filter_bag(filter: &ProductFilter) -> ParamBag {
    ParamBag::new()
        .with_opt("q", filter.q.clone())
        .with_opt("name", filter.name.clone())
        .with_opt("category_id", filter.category_id)
        .with_opt("category_name", filter.category_name.clone())
        .with_opt("min_price", filter.min_price)
        .with_opt("max_price", filter.max_price)
        .with_opt("date_from", filter.date_from.clone())
        .with_opt("date_to", filter.date_to.clone())
        .with_opt("with_trashed", filter.with_trashed.then_some(true))
}

/// Unfiltered lists share `products_list`; any filter moves the page to
/// `products_filtered`.
fn list_cache_key(state: &AppState, filter: &ProductFilter, list: &ListOptions) -> String {
    let filters = filter_bag(filter);
    let name = if filters.is_empty() { CacheName::ProductsList } else { CacheName::ProductsFiltered };
    state.keys.paginated_key(name, &with_list_options(filters, list))
}

/// Implementation of the products_list tool.
pub async fn list_impl(state: &AppState, params: ProductsListParams) -> Result<CallToolResult, McpError> {
    let filter = normalize(params.filter);
    let list = normalize_list(params.list);
    let cache_key = list_cache_key(state, &filter, &list);

    let page = state
        .cache
        .remember_default(&cache_key, move || async move {
            state.catalog.list_products(&filter, &list, state.config.per_page).await
        })
        .await?;

    json_result(&ProductsListOutput { cache_key, page })
}

/// Implementation of the product_show tool.
pub async fn show_impl(state: &AppState, params: ProductShowParams) -> Result<CallToolResult, McpError> {
    let bag = ParamBag::new()
        .with("id", params.id)
        .with_opt("with_trashed", params.with_trashed.then_some(true));
    let key = state.keys.key(CacheName::ProductDetail, &bag);
    let ProductShowParams { id, with_trashed } = params;

    let product = state
        .cache
        .remember_default(&key, move || async move { state.catalog.get_product(id, with_trashed).await })
        .await?;

    json_result(&product)
}

async fn written(state: &AppState, product: ProductView) -> Result<CallToolResult, McpError> {
    tracing::info!(product_id = product.product.id, "Product written");
    let invalidation = state.after_write(MutationEvent::ProductWritten).await;
    json_result(&ProductWriteOutput { product, invalidation })
}

/// Implementation of the product_create tool.
pub async fn create_impl(state: &AppState, params: NewProduct) -> Result<CallToolResult, McpError> {
    let product = state.catalog.create_product(params).await?;
    written(state, product).await
}

/// Implementation of the product_update tool.
pub async fn update_impl(state: &AppState, params: ProductUpdateParams) -> Result<CallToolResult, McpError> {
    let product = state.catalog.update_product(params.id, params.changes).await?;
    written(state, product).await
}

/// Implementation of the product_delete tool.
pub async fn delete_impl(state: &AppState, params: ProductDeleteParams) -> Result<CallToolResult, McpError> {
    let product = state.catalog.set_product_active(params.id, false).await?;
    written(state, product).await
}

/// Implementation of the product_toggle_active tool.
pub async fn toggle_impl(state: &AppState, params: ProductToggleParams) -> Result<CallToolResult, McpError> {
    let product = state.catalog.set_product_active(params.id, params.active).await?;
    written(state, product).await
}
