use anyhow::Context;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::error::{AppError, StdResponse};
use crate::models::{CreateMenuItemEntity, CreateRestaurantEntity, MenuItemEntity, RestaurantEntity};
use crate::repo;
use crate::state::AppState;

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/restaurants",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_restaurant))
            .routes(utoipa_axum::routes!(list_restaurants))
            .routes(utoipa_axum::routes!(get_restaurant))
            .routes(utoipa_axum::routes!(create_menu_item))
            .routes(utoipa_axum::routes!(list_menu_items)),
    )
}

/// Register a restaurant.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Restaurants"],
    request_body = CreateRestaurantEntity,
    responses(
        (status = 200, description = "Created restaurant successfully", body = StdResponse<RestaurantEntity, String>)
    )
)]
async fn create_restaurant(
    State(state): State<AppState>,
    Json(body): Json<CreateRestaurantEntity>,
) -> Result<impl IntoResponse, AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }

    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection")?;

    let restaurant = repo::create_restaurant(&mut conn, body)
        .await
        .context("Failed to create restaurant")?;

    Ok(StdResponse {
        data: Some(restaurant),
        message: Some("Created restaurant successfully"),
    })
}

/// List restaurants ordered by name.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Restaurants"],
    responses(
        (status = 200, description = "List restaurants", body = StdResponse<Vec<RestaurantEntity>, String>)
    )
)]
async fn list_restaurants(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection")?;

    let restaurants = repo::list_restaurants(&mut conn)
        .await
        .context("Failed to list restaurants")?;

    Ok(StdResponse {
        data: Some(restaurants),
        message: Some("Listed restaurants successfully"),
    })
}

/// Fetch a single restaurant.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Restaurants"],
    params(
        ("id" = i32, Path, description = "Restaurant ID to fetch")
    ),
    responses(
        (status = 200, description = "Get restaurant successfully", body = StdResponse<RestaurantEntity, String>),
        (status = 404, description = "Restaurant not found")
    )
)]
async fn get_restaurant(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection")?;

    let restaurant = repo::get_restaurant(&mut conn, id)
        .await
        .context("Failed to get restaurant")?
        .ok_or_else(|| AppError::NotFound("Restaurant not found".to_string()))?;

    Ok(StdResponse {
        data: Some(restaurant),
        message: Some("Get restaurant successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct CreateMenuItemReq {
    name: String,
    description: Option<String>,
    #[schema(value_type = String)]
    price: BigDecimal,
    image_url: Option<String>,
    #[serde(default = "default_true")]
    is_available: bool,
}

fn default_true() -> bool {
    true
}

/// Add a menu item to a restaurant.
#[utoipa::path(
    post,
    path = "/{id}/menu-items",
    tags = ["Restaurants"],
    params(
        ("id" = i32, Path, description = "Restaurant ID to add the item to")
    ),
    request_body = CreateMenuItemReq,
    responses(
        (status = 200, description = "Created menu item successfully", body = StdResponse<MenuItemEntity, String>),
        (status = 404, description = "Restaurant not found")
    )
)]
async fn create_menu_item(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<CreateMenuItemReq>,
) -> Result<impl IntoResponse, AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }
    if body.price <= BigDecimal::from(0) {
        return Err(AppError::BadRequest("price must be > 0".to_string()));
    }

    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection")?;

    repo::get_restaurant(&mut conn, id)
        .await
        .context("Failed to get restaurant")?
        .ok_or_else(|| AppError::NotFound("Restaurant not found".to_string()))?;

    let menu_item = repo::create_menu_item(
        &mut conn,
        CreateMenuItemEntity {
            restaurant_id: id,
            name: body.name,
            description: body.description,
            price: body.price.with_scale(2),
            image_url: body.image_url,
            is_available: body.is_available,
        },
    )
    .await
    .context("Failed to create menu item")?;

    Ok(StdResponse {
        data: Some(menu_item),
        message: Some("Created menu item successfully"),
    })
}

#[derive(Deserialize)]
struct ListMenuItemsQuery {
    only_available: Option<bool>,
}

/// List a restaurant's menu, by default only the available items.
#[utoipa::path(
    get,
    path = "/{id}/menu-items",
    tags = ["Restaurants"],
    params(
        ("id" = i32, Path, description = "Restaurant ID whose menu to list"),
        ("only_available" = Option<bool>, Query, description = "Restrict to available items, defaults to true")
    ),
    responses(
        (status = 200, description = "List menu items", body = StdResponse<Vec<MenuItemEntity>, String>),
        (status = 404, description = "Restaurant not found")
    )
)]
async fn list_menu_items(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Query(query): Query<ListMenuItemsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection")?;

    repo::get_restaurant(&mut conn, id)
        .await
        .context("Failed to get restaurant")?
        .ok_or_else(|| AppError::NotFound("Restaurant not found".to_string()))?;

    let menu_items =
        repo::list_menu_items_for_restaurant(&mut conn, id, query.only_available.unwrap_or(true))
            .await
            .context("Failed to list menu items")?;

    Ok(StdResponse {
        data: Some(menu_items),
        message: Some("Listed menu items successfully"),
    })
}
