//! Order tools: admin and per-user order lists, placement and status changes.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelf_core::{CacheName, InvalidationOutcome, MutationEvent, ParamBag};

use super::{json_result, non_empty, normalize_list, with_list_options};
use crate::catalog::{ListOptions, OrderFilter, OrderItem, OrderStatus, OrderView, Page};
use crate::state::AppState;

/// Parameters for the orders_list tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct OrdersListParams {
    #[serde(flatten)]
    pub filter: OrderFilter,

    #[serde(flatten)]
    pub list: ListOptions,
}

/// Parameters for the user_orders tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct UserOrdersParams {
    /// The user whose orders to list.
    pub user_id: i64,
    pub status: Option<OrderStatus>,
    pub order_number: Option<String>,
    pub product_name: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,

    #[serde(flatten)]
    pub list: ListOptions,
}

/// Output from the order list tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdersListOutput {
    pub cache_key: String,
    #[serde(flatten)]
    pub page: Page<OrderView>,
}

/// Parameters for the order_place tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OrderPlaceParams {
    pub user_id: i64,
    pub items: Vec<OrderItem>,
    pub notes: Option<String>,
}

/// Parameters for the order_update_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OrderStatusParams {
    pub id: i64,
    pub status: OrderStatus,
}

/// Parameters for the order_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OrderDeleteParams {
    pub id: i64,
}

/// Output from order write tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWriteOutput {
    pub order: OrderView,
    pub invalidation: Option<InvalidationOutcome>,
}

fn normalize(mut filter: OrderFilter) -> OrderFilter {
    filter.user_name = non_empty(filter.user_name);
    filter.order_number = non_empty(filter.order_number);
    filter.product_name = non_empty(filter.product_name);
    filter.date_from = non_empty(filter.date_from);
    filter.date_to = non_empty(filter.date_to);
    filter.category_ids = filter
        .category_ids
        .map(|mut ids| {
            ids.sort_unstable();
            ids.dedup();
            ids
        })
        .filter(|ids| !ids.is_empty());
    filter
}

/// Cache parameters for every filter except `user_id`, which user-scoped
/// keys inject themselves.
fn filter_bag(filter: &OrderFilter) -> ParamBag {
    ParamBag::new()
        .with_opt("user_name", filter.user_name.clone())
        .with_opt("status", filter.status.map(|s| s.as_str()))
        .with_opt("order_number", filter.order_number.clone())
        .with_opt("product_name", filter.product_name.clone())
        .with_opt("category_ids", filter.category_ids.clone())
        .with_opt("date_from", filter.date_from.clone())
        .with_opt("date_to", filter.date_to.clone())
}

async fn cached_page(
    state: &AppState, cache_key: String, filter: OrderFilter, list: ListOptions,
) -> Result<CallToolResult, McpError> {
    let page = state
        .cache
        .remember_default(&cache_key, move || async move {
            state.catalog.list_orders(&filter, &list, state.config.per_page).await
        })
        .await?;

    json_result(&OrdersListOutput { cache_key, page })
}

/// Implementation of the orders_list tool.
pub async fn list_impl(state: &AppState, params: OrdersListParams) -> Result<CallToolResult, McpError> {
    let filter = normalize(params.filter);
    let list = normalize_list(params.list);

    let bag = filter_bag(&filter).with_opt("user_id", filter.user_id);
    let cache_key = state
        .keys
        .paginated_key(CacheName::OrdersList, &with_list_options(bag, &list));

    cached_page(state, cache_key, filter, list).await
}

/// Implementation of the user_orders tool.
pub async fn user_orders_impl(state: &AppState, params: UserOrdersParams) -> Result<CallToolResult, McpError> {
    let filter = normalize(OrderFilter {
        user_id: Some(params.user_id),
        user_name: None,
        status: params.status,
        order_number: params.order_number,
        product_name: params.product_name,
        category_ids: None,
        date_from: params.date_from,
        date_to: params.date_to,
    });
    let list = normalize_list(params.list);

    let cache_key = state.keys.user_paginated_key(
        CacheName::UserOrders,
        params.user_id,
        &with_list_options(filter_bag(&filter), &list),
    );

    cached_page(state, cache_key, filter, list).await
}

async fn written(state: &AppState, order: OrderView, event: MutationEvent) -> Result<CallToolResult, McpError> {
    tracing::info!(order_id = order.id, %event, "Order written");
    let invalidation = state.after_write(event).await;
    json_result(&OrderWriteOutput { order, invalidation })
}

/// Implementation of the order_place tool.
pub async fn place_impl(state: &AppState, params: OrderPlaceParams) -> Result<CallToolResult, McpError> {
    let notes = non_empty(params.notes);
    let order = state.catalog.place_order(params.user_id, &params.items, notes).await?;
    written(state, order, MutationEvent::OrderPlaced).await
}

/// Implementation of the order_update_status tool.
pub async fn update_status_impl(state: &AppState, params: OrderStatusParams) -> Result<CallToolResult, McpError> {
    let order = state.catalog.update_order_status(params.id, params.status).await?;
    written(state, order, MutationEvent::OrderWritten).await
}

/// Implementation of the order_delete tool.
///
/// Deleting returns stock to the products, so it stales product caches the
/// same way placing an order does.
pub async fn delete_impl(state: &AppState, params: OrderDeleteParams) -> Result<CallToolResult, McpError> {
    let order = state.catalog.delete_order(params.id).await?;
    written(state, order, MutationEvent::OrderPlaced).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NewProduct;
    use crate::state::test_support::{body, memory_state};
    use crate::tools::products::{self, ProductShowParams};

    struct Fixture {
        ada: i64,
        bob: i64,
        runner: i64,
    }

    async fn fixture(state: &AppState) -> Fixture {
        let shoes = state.catalog.create_category("Shoes").await.unwrap();
        let runner = state
            .catalog
            .create_product(NewProduct {
                name: "Runner".into(),
                description: None,
                price: 50.0,
                stock: 4,
                category_id: shoes.id,
            })
            .await
            .unwrap();
        let ada = state.catalog.create_user("Ada").await.unwrap();
        let bob = state.catalog.create_user("Bob").await.unwrap();
        Fixture { ada: ada.id, bob: bob.id, runner: runner.product.id }
    }

    fn one(user_id: i64, product_id: i64, quantity: u32) -> OrderPlaceParams {
        OrderPlaceParams { user_id, items: vec![OrderItem { product_id, quantity }], notes: None }
    }

    fn for_user(user_id: i64) -> UserOrdersParams {
        UserOrdersParams { user_id, ..Default::default() }
    }

    #[tokio::test]
    async fn test_user_orders_are_scoped() {
        let state = memory_state();
        let f = fixture(&state).await;
        place_impl(&state, one(f.ada, f.runner, 1)).await.unwrap();

        let ada = body(&user_orders_impl(&state, for_user(f.ada)).await.unwrap());
        let bob = body(&user_orders_impl(&state, for_user(f.bob)).await.unwrap());
        assert_eq!(ada["total"], 1);
        assert_eq!(bob["total"], 0);
        assert_ne!(ada["cache_key"], bob["cache_key"]);
        assert!(ada["cache_key"].as_str().unwrap().starts_with("user_orders_"));
    }

    #[tokio::test]
    async fn test_placing_order_refreshes_lists_and_stock() {
        let state = memory_state();
        let f = fixture(&state).await;

        assert_eq!(body(&list_impl(&state, OrdersListParams::default()).await.unwrap())["total"], 0);
        assert_eq!(body(&user_orders_impl(&state, for_user(f.ada)).await.unwrap())["total"], 0);
        let shown = ProductShowParams { id: f.runner, with_trashed: false };
        assert_eq!(body(&products::show_impl(&state, shown.clone()).await.unwrap())["stock"], 4);

        let placed = body(&place_impl(&state, one(f.ada, f.runner, 3)).await.unwrap());
        assert_eq!(placed["order"]["total_amount"], 150.0);
        assert_eq!(placed["invalidation"]["strategy"], "pruned");

        assert_eq!(body(&list_impl(&state, OrdersListParams::default()).await.unwrap())["total"], 1);
        assert_eq!(body(&user_orders_impl(&state, for_user(f.ada)).await.unwrap())["total"], 1);
        assert_eq!(body(&products::show_impl(&state, shown).await.unwrap())["stock"], 1);
    }

    #[tokio::test]
    async fn test_insufficient_stock_is_a_conflict() {
        let state = memory_state();
        let f = fixture(&state).await;
        let err = place_impl(&state, one(f.ada, f.runner, 5)).await.unwrap_err();
        assert_eq!(err.code.0, -32003);
        assert_eq!(state.cache.stats().invalidations, 0);
    }

    #[tokio::test]
    async fn test_status_change_and_delete() {
        let state = memory_state();
        let f = fixture(&state).await;
        let placed = body(&place_impl(&state, one(f.bob, f.runner, 2)).await.unwrap());
        let id = placed["order"]["id"].as_i64().unwrap();

        let completed = OrdersListParams {
            filter: OrderFilter { status: Some(OrderStatus::Completed), ..Default::default() },
            ..Default::default()
        };
        assert_eq!(body(&list_impl(&state, completed.clone()).await.unwrap())["total"], 0);

        update_status_impl(&state, OrderStatusParams { id, status: OrderStatus::Completed }).await.unwrap();
        assert_eq!(body(&list_impl(&state, completed.clone()).await.unwrap())["total"], 1);

        delete_impl(&state, OrderDeleteParams { id }).await.unwrap();
        assert_eq!(body(&list_impl(&state, completed).await.unwrap())["total"], 0);
        let shown = ProductShowParams { id: f.runner, with_trashed: false };
        assert_eq!(body(&products::show_impl(&state, shown).await.unwrap())["stock"], 4);
    }

    #[tokio::test]
    async fn test_category_ids_order_does_not_fragment() {
        let state = memory_state();
        let by_ids = |ids: Vec<i64>| OrdersListParams {
            filter: OrderFilter { category_ids: Some(ids), ..Default::default() },
            ..Default::default()
        };

        let a = body(&list_impl(&state, by_ids(vec![3, 1])).await.unwrap());
        let b = body(&list_impl(&state, by_ids(vec![1, 3, 3])).await.unwrap());
        assert_eq!(a["cache_key"], b["cache_key"]);
        assert_eq!(state.cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_admin_filters_share_no_key_with_user_scope() {
        let state = memory_state();
        let f = fixture(&state).await;
        let admin = OrdersListParams {
            filter: OrderFilter { user_id: Some(f.ada), ..Default::default() },
            ..Default::default()
        };
        let a = body(&list_impl(&state, admin).await.unwrap());
        let b = body(&user_orders_impl(&state, for_user(f.ada)).await.unwrap());
        assert!(a["cache_key"].as_str().unwrap().starts_with("orders_list_"));
        assert_ne!(a["cache_key"], b["cache_key"]);
    }
}
