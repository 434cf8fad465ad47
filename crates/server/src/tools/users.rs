//! User tools. Order views embed the user's name, so user writes stale
//! order caches.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelf_core::{InvalidationOutcome, MutationEvent};

use super::json_result;
use crate::catalog::User;
use crate::state::AppState;

/// Parameters for the user_create tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UserCreateParams {
    pub name: String,
}

/// Parameters for the user_update tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UserUpdateParams {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserWriteOutput {
    pub user: User,
    pub invalidation: Option<InvalidationOutcome>,
}

async fn written(state: &AppState, user: User) -> Result<CallToolResult, McpError> {
    let invalidation = state.after_write(MutationEvent::UserWritten).await;
    json_result(&UserWriteOutput { user, invalidation })
}

/// Implementation of the user_create tool.
pub async fn create_impl(state: &AppState, params: UserCreateParams) -> Result<CallToolResult, McpError> {
    let user = state.catalog.create_user(&params.name).await?;
    written(state, user).await
}

/// Implementation of the user_update tool.
pub async fn update_impl(state: &AppState, params: UserUpdateParams) -> Result<CallToolResult, McpError> {
    let user = state.catalog.update_user(params.id, &params.name).await?;
    written(state, user).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{NewProduct, OrderItem};
    use crate::state::test_support::{body, memory_state};
    use crate::tools::orders::{self, OrderPlaceParams, OrdersListParams};

    #[tokio::test]
    async fn test_rename_refreshes_order_lists() {
        let state = memory_state();
        let user = body(&create_impl(&state, UserCreateParams { name: "Ada".into() }).await.unwrap());
        let user_id = user["user"]["id"].as_i64().unwrap();

        let shoes = state.catalog.create_category("Shoes").await.unwrap();
        let runner = state
            .catalog
            .create_product(NewProduct {
                name: "Runner".into(),
                description: None,
                price: 1.0,
                stock: 1,
                category_id: shoes.id,
            })
            .await
            .unwrap();
        orders::place_impl(
            &state,
            OrderPlaceParams {
                user_id,
                items: vec![OrderItem { product_id: runner.product.id, quantity: 1 }],
                notes: None,
            },
        )
        .await
        .unwrap();

        let page = body(&orders::list_impl(&state, OrdersListParams::default()).await.unwrap());
        assert_eq!(page["items"][0]["user_name"], "Ada");

        update_impl(&state, UserUpdateParams { id: user_id, name: "Ada L.".into() }).await.unwrap();
        let page = body(&orders::list_impl(&state, OrdersListParams::default()).await.unwrap());
        assert_eq!(page["items"][0]["user_name"], "Ada L.");
    }

    #[tokio::test]
    async fn test_update_unknown_user() {
        let state = memory_state();
        let err = update_impl(&state, UserUpdateParams { id: 1, name: "x".into() }).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }
}
