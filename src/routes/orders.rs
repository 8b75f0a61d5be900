use anyhow::Context;
use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::error::{AppError, StdResponse};
use crate::models::{OrderEntity, OrderItemEntity, OrderStatus};
use crate::repo::{self, OrderItemRequest};
use crate::state::AppState;

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_order))
            .routes(utoipa_axum::routes!(list_orders))
            .routes(utoipa_axum::routes!(get_order))
            .routes(utoipa_axum::routes!(set_order_status)),
    )
}

#[derive(Deserialize, ToSchema)]
struct OrderItemReq {
    menu_item_id: i32,
    #[serde(default = "default_quantity")]
    quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Deserialize, ToSchema)]
struct CreateOrderReq {
    user_id: i32,
    restaurant_id: i32,
    delivery_address: Option<String>,
    items: Vec<OrderItemReq>,
}

#[derive(Serialize, ToSchema)]
struct GetOrderRes {
    pub order: OrderEntity,
    pub items: Vec<OrderItemEntity>,
}

/// Place an order. Prices are snapshotted from the current menu and the
/// total is computed server side; the order and its items land atomically.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Orders"],
    request_body = CreateOrderReq,
    responses(
        (status = 200, description = "Created order successfully", body = StdResponse<GetOrderRes, String>),
        (status = 400, description = "Empty item list or invalid quantity"),
        (status = 404, description = "User, restaurant, or menu item not found")
    )
)]
async fn create_order(
    State(state): State<AppState>,
    Json(body): Json<CreateOrderReq>,
) -> Result<impl IntoResponse, AppError> {
    if body.items.is_empty() {
        return Err(AppError::BadRequest(
            "items must contain at least one entry".to_string(),
        ));
    }

    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection")?;

    repo::get_user(&mut conn, body.user_id)
        .await
        .context("Failed to get user")?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    repo::get_restaurant(&mut conn, body.restaurant_id)
        .await
        .context("Failed to get restaurant")?
        .ok_or_else(|| AppError::NotFound("Restaurant not found".to_string()))?;

    let items = body
        .items
        .into_iter()
        .map(|item| OrderItemRequest {
            menu_item_id: item.menu_item_id,
            quantity: item.quantity,
        })
        .collect();

    let (order, items) = repo::create_order(
        &mut conn,
        body.user_id,
        body.restaurant_id,
        body.delivery_address,
        items,
    )
    .await?;

    Ok(StdResponse {
        data: Some(GetOrderRes { order, items }),
        message: Some("Created order successfully"),
    })
}

/// Fetch all orders in the system.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Orders"],
    responses(
        (status = 200, description = "List all orders", body = StdResponse<Vec<OrderEntity>, String>)
    )
)]
async fn list_orders(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection")?;

    let orders = repo::list_orders(&mut conn)
        .await
        .context("Failed to get orders")?;

    Ok(StdResponse {
        data: Some(orders),
        message: Some("Get orders successfully"),
    })
}

/// Fetch a specific order with its items.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Orders"],
    params(
        ("id" = i32, Path, description = "Order ID to fetch")
    ),
    responses(
        (status = 200, description = "Get order successfully", body = StdResponse<GetOrderRes, String>),
        (status = 404, description = "Order not found")
    )
)]
async fn get_order(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection")?;

    let order = repo::get_order(&mut conn, id)
        .await
        .context("Failed to get order")?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    let items = repo::list_order_items(&mut conn, id)
        .await
        .context("Failed to get order items")?;

    Ok(StdResponse {
        data: Some(GetOrderRes { order, items }),
        message: Some("Get order successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct SetOrderStatusReq {
    status: OrderStatus,
}

/// Update an order's status.
#[utoipa::path(
    post,
    path = "/{id}/status",
    tags = ["Orders"],
    params(
        ("id" = i32, Path, description = "Order ID to update")
    ),
    request_body = SetOrderStatusReq,
    responses(
        (status = 200, description = "Updated order status successfully", body = StdResponse<OrderEntity, String>),
        (status = 404, description = "Order not found")
    )
)]
async fn set_order_status(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<SetOrderStatusReq>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection")?;

    let order = repo::set_order_status(&mut conn, id, body.status).await?;

    Ok(StdResponse {
        data: Some(order),
        message: Some("Updated order status successfully"),
    })
}
