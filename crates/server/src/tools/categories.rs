//! Category tools.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelf_core::{CacheName, InvalidationOutcome, MutationEvent, ParamBag};

use super::{json_result, non_empty, normalize_list, with_list_options};
use crate::catalog::{Category, CategoryFilter, ListOptions, Page};
use crate::state::AppState;

/// Parameters for the categories_list tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CategoriesListParams {
    #[serde(flatten)]
    pub filter: CategoryFilter,

    #[serde(flatten)]
    pub list: ListOptions,
}

/// Output from the categories_list tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesListOutput {
    pub cache_key: String,
    #[serde(flatten)]
    pub page: Page<Category>,
}

/// Parameters for the category_create tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategoryCreateParams {
    pub name: String,
}

/// Parameters for the category_update tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategoryUpdateParams {
    pub id: i64,
    pub name: String,
}

/// Parameters for the category_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategoryDeleteParams {
    pub id: i64,

    /// Restore a deleted category instead.
    #[serde(default)]
    pub restore: bool,
}

/// Output from category write tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWriteOutput {
    pub category: Category,
    pub invalidation: Option<InvalidationOutcome>,
}

/// Implementation of the categories_list tool.
pub async fn list_impl(state: &AppState, params: CategoriesListParams) -> Result<CallToolResult, McpError> {
    let mut filter = params.filter;
    filter.q = non_empty(filter.q);
    let list = normalize_list(params.list);

    let bag = ParamBag::new()
        .with_opt("q", filter.q.clone())
        .with_opt("with_trashed", filter.with_trashed.then_some(true));
    let cache_key = state
        .keys
        .paginated_key(CacheName::CategoriesList, &with_list_options(bag, &list));

    let page = state
        .cache
        .remember_default(&cache_key, move || async move {
            state.catalog.list_categories(&filter, &list, state.config.per_page).await
        })
        .await?;

    json_result(&CategoriesListOutput { cache_key, page })
}

async fn written(state: &AppState, category: Category) -> Result<CallToolResult, McpError> {
    tracing::info!(category_id = category.id, "Category written");
    let invalidation = state.after_write(MutationEvent::CategoryWritten).await;
    json_result(&CategoryWriteOutput { category, invalidation })
}

/// Implementation of the category_create tool.
pub async fn create_impl(state: &AppState, params: CategoryCreateParams) -> Result<CallToolResult, McpError> {
    let category = state.catalog.create_category(&params.name).await?;
    written(state, category).await
}

/// Implementation of the category_update tool.
pub async fn update_impl(state: &AppState, params: CategoryUpdateParams) -> Result<CallToolResult, McpError> {
    let category = state.catalog.update_category(params.id, &params.name).await?;
    written(state, category).await
}

/// Implementation of the category_delete tool.
pub async fn delete_impl(state: &AppState, params: CategoryDeleteParams) -> Result<CallToolResult, McpError> {
    let category = state.catalog.set_category_active(params.id, params.restore).await?;
    written(state, category).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{NewProduct, ProductFilter};
    use crate::state::test_support::{body, memory_state};
    use crate::tools::products::{self, ProductShowParams, ProductsListParams};

    #[tokio::test]
    async fn test_create_and_list() {
        let state = memory_state();
        for name in ["Shoes", "Hats"] {
            create_impl(&state, CategoryCreateParams { name: name.into() }).await.unwrap();
        }

        let page = body(&list_impl(&state, CategoriesListParams::default()).await.unwrap());
        assert_eq!(page["total"], 2);
        assert_eq!(page["items"][0]["name"], "Hats");
        assert!(page["cache_key"].as_str().unwrap().starts_with("categories_list_"));
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let state = memory_state();
        create_impl(&state, CategoryCreateParams { name: "Shoes".into() }).await.unwrap();
        let err = create_impl(&state, CategoryCreateParams { name: "shoes".into() }).await.unwrap_err();
        assert_eq!(err.code.0, -32003);
    }

    #[tokio::test]
    async fn test_rename_refreshes_cached_product_views() {
        let state = memory_state();
        let category = state.catalog.create_category("Shoes").await.unwrap();
        let product = state
            .catalog
            .create_product(NewProduct {
                name: "Runner".into(),
                description: None,
                price: 80.0,
                stock: 1,
                category_id: category.id,
            })
            .await
            .unwrap();
        let id = product.product.id;

        let filtered = ProductsListParams {
            filter: ProductFilter { category_name: Some("Shoes".into()), ..Default::default() },
            ..Default::default()
        };
        assert_eq!(body(&products::list_impl(&state, filtered.clone()).await.unwrap())["total"], 1);
        let shown = body(&products::show_impl(&state, ProductShowParams { id, with_trashed: false }).await.unwrap());
        assert_eq!(shown["category_name"], "Shoes");

        update_impl(&state, CategoryUpdateParams { id: category.id, name: "Footwear".into() })
            .await
            .unwrap();

        let shown = body(&products::show_impl(&state, ProductShowParams { id, with_trashed: false }).await.unwrap());
        assert_eq!(shown["category_name"], "Footwear");
        assert_eq!(body(&products::list_impl(&state, filtered).await.unwrap())["total"], 0);
    }

    #[tokio::test]
    async fn test_delete_hides_and_restore_returns() {
        let state = memory_state();
        let created = body(&create_impl(&state, CategoryCreateParams { name: "Shoes".into() }).await.unwrap());
        let id = created["category"]["id"].as_i64().unwrap();

        delete_impl(&state, CategoryDeleteParams { id, restore: false }).await.unwrap();
        assert_eq!(body(&list_impl(&state, CategoriesListParams::default()).await.unwrap())["total"], 0);

        delete_impl(&state, CategoryDeleteParams { id, restore: true }).await.unwrap();
        assert_eq!(body(&list_impl(&state, CategoriesListParams::default()).await.unwrap())["total"], 1);
    }
}
