use anyhow::Context;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::capability::{DELIVERY_ASSIGNEE_ROLES, require_role};
use crate::error::{AppError, StdResponse};
use crate::models::{DeliveryEntity, DeliveryStatus, DeliveryStatusHistoryEntity};
use crate::repo;
use crate::state::AppState;

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/deliveries",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_delivery))
            .routes(utoipa_axum::routes!(list_deliveries))
            .routes(utoipa_axum::routes!(get_delivery))
            .routes(utoipa_axum::routes!(assign_delivery))
            .routes(utoipa_axum::routes!(set_delivery_status)),
    )
}

fn validate_eta(eta_minutes: Option<i32>) -> Result<(), AppError> {
    match eta_minutes {
        Some(eta) if eta < 1 => Err(AppError::BadRequest(
            "eta_minutes must be >= 1".to_string(),
        )),
        _ => Ok(()),
    }
}

#[derive(Deserialize, ToSchema)]
struct CreateDeliveryReq {
    order_id: i32,
    delivery_person_id: Option<i32>,
    eta_minutes: Option<i32>,
}

/// Create the delivery record for an order. Supplying a delivery person
/// makes the record start out assigned.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Deliveries"],
    request_body = CreateDeliveryReq,
    responses(
        (status = 200, description = "Created delivery successfully", body = StdResponse<DeliveryEntity, String>),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Delivery already exists for this order")
    )
)]
async fn create_delivery(
    State(state): State<AppState>,
    Json(body): Json<CreateDeliveryReq>,
) -> Result<impl IntoResponse, AppError> {
    validate_eta(body.eta_minutes)?;

    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection")?;

    repo::get_order(&mut conn, body.order_id)
        .await
        .context("Failed to get order")?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    if repo::get_delivery_by_order_id(&mut conn, body.order_id)
        .await
        .context("Failed to check for an existing delivery")?
        .is_some()
    {
        return Err(AppError::Conflict(
            "Delivery already exists for this order".to_string(),
        ));
    }

    let delivery = repo::create_delivery(
        &mut conn,
        body.order_id,
        body.delivery_person_id,
        body.eta_minutes,
    )
    .await?;

    Ok(StdResponse {
        data: Some(delivery),
        message: Some("Created delivery successfully"),
    })
}

#[derive(Deserialize)]
struct ListDeliveriesQuery {
    delivery_person_id: Option<i32>,
}

/// List deliveries, optionally narrowed to one delivery person.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Deliveries"],
    params(
        ("delivery_person_id" = Option<i32>, Query, description = "Optional delivery person user id to filter by")
    ),
    responses(
        (status = 200, description = "List deliveries", body = StdResponse<Vec<DeliveryEntity>, String>)
    )
)]
async fn list_deliveries(
    State(state): State<AppState>,
    Query(query): Query<ListDeliveriesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection")?;

    let deliveries = repo::list_deliveries(&mut conn, query.delivery_person_id)
        .await
        .context("Failed to list deliveries")?;

    Ok(StdResponse {
        data: Some(deliveries),
        message: Some("Listed deliveries successfully"),
    })
}

#[derive(Serialize, ToSchema)]
struct DeliveryWithHistoryRes {
    delivery: DeliveryEntity,
    history: Vec<DeliveryStatusHistoryEntity>,
}

/// Fetch a delivery together with its ordered status history.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Deliveries"],
    params(
        ("id" = i32, Path, description = "Delivery ID to fetch")
    ),
    responses(
        (status = 200, description = "Get delivery successfully", body = StdResponse<DeliveryWithHistoryRes, String>),
        (status = 404, description = "Delivery not found")
    )
)]
async fn get_delivery(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection")?;

    let delivery = repo::get_delivery(&mut conn, id)
        .await
        .context("Failed to get delivery")?
        .ok_or_else(|| AppError::NotFound("Delivery not found".to_string()))?;

    let history = repo::list_delivery_status_history(&mut conn, id)
        .await
        .context("Failed to get delivery status history")?;

    Ok(StdResponse {
        data: Some(DeliveryWithHistoryRes { delivery, history }),
        message: Some("Get delivery successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct DeliveryAssignReq {
    delivery_person_id: i32,
    eta_minutes: Option<i32>,
}

/// Assign a delivery to a delivery person.
#[utoipa::path(
    post,
    path = "/{id}/assign",
    tags = ["Deliveries"],
    params(
        ("id" = i32, Path, description = "Delivery ID to assign")
    ),
    request_body = DeliveryAssignReq,
    responses(
        (status = 200, description = "Assigned delivery successfully", body = StdResponse<DeliveryEntity, String>),
        (status = 400, description = "User is not a delivery person"),
        (status = 404, description = "Delivery or delivery person not found")
    )
)]
async fn assign_delivery(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<DeliveryAssignReq>,
) -> Result<impl IntoResponse, AppError> {
    validate_eta(body.eta_minutes)?;

    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection")?;

    let assignee = repo::get_user(&mut conn, body.delivery_person_id)
        .await
        .context("Failed to get delivery person")?
        .ok_or_else(|| AppError::NotFound("Delivery person not found".to_string()))?;
    require_role(&assignee, DELIVERY_ASSIGNEE_ROLES)
        .map_err(|_| AppError::BadRequest("User is not a delivery person".to_string()))?;

    let delivery =
        repo::assign_delivery(&mut conn, id, body.delivery_person_id, body.eta_minutes).await?;

    Ok(StdResponse {
        data: Some(delivery),
        message: Some("Assigned delivery successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct DeliveryStatusUpdateReq {
    delivery_id: i32,
    status: DeliveryStatus,
    note: Option<String>,
}

/// Update delivery status and append a status-history entry.
#[utoipa::path(
    post,
    path = "/{id}/status",
    tags = ["Deliveries"],
    params(
        ("id" = i32, Path, description = "Delivery ID to update")
    ),
    request_body = DeliveryStatusUpdateReq,
    responses(
        (status = 200, description = "Updated delivery status successfully", body = StdResponse<DeliveryEntity, String>),
        (status = 400, description = "delivery_id in body does not match the path"),
        (status = 404, description = "Delivery not found")
    )
)]
async fn set_delivery_status(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<DeliveryStatusUpdateReq>,
) -> Result<impl IntoResponse, AppError> {
    if body.delivery_id != id {
        return Err(AppError::BadRequest(
            "delivery_id in body must match path parameter".to_string(),
        ));
    }

    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection")?;

    let delivery = repo::set_delivery_status(&mut conn, id, body.status, body.note).await?;

    Ok(StdResponse {
        data: Some(delivery),
        message: Some("Updated delivery status successfully"),
    })
}
