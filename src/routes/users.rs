use anyhow::Context;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::capability::Role;
use crate::error::{AppError, StdResponse};
use crate::models::{CreateUserEntity, UserEntity};
use crate::repo;
use crate::state::AppState;

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/users",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_user))
            .routes(utoipa_axum::routes!(list_users))
            .routes(utoipa_axum::routes!(get_user)),
    )
}

#[derive(Deserialize, ToSchema)]
struct CreateUserReq {
    email: String,
    name: String,
    role: Option<Role>,
}

/// Create a user account.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Users"],
    request_body = CreateUserReq,
    responses(
        (status = 200, description = "Created user successfully", body = StdResponse<UserEntity, String>)
    )
)]
async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserReq>,
) -> Result<impl IntoResponse, AppError> {
    if !body.email.contains('@') {
        return Err(AppError::BadRequest("email must be a valid address".to_string()));
    }
    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }

    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection")?;

    let user = repo::create_user(
        &mut conn,
        CreateUserEntity {
            email: body.email,
            name: body.name,
            role: body.role.unwrap_or(Role::Customer).as_str().to_string(),
            hashed_password: None,
        },
    )
    .await
    .map_err(|err| match AppError::from(err) {
        AppError::Conflict(_) => {
            AppError::Conflict("User with this email already exists".to_string())
        }
        err => err,
    })?;

    Ok(StdResponse {
        data: Some(user),
        message: Some("Created user successfully"),
    })
}

#[derive(Deserialize)]
struct ListUsersQuery {
    email: Option<String>,
}

/// List users, optionally filtered by exact email.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Users"],
    params(
        ("email" = Option<String>, Query, description = "Filter by exact email")
    ),
    responses(
        (status = 200, description = "List users", body = StdResponse<Vec<UserEntity>, String>)
    )
)]
async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection")?;

    let users = match query.email.as_deref() {
        Some(email) => repo::get_user_by_email(&mut conn, email)
            .await
            .context("Failed to get user by email")?
            .into_iter()
            .collect(),
        None => repo::list_users(&mut conn)
            .await
            .context("Failed to list users")?,
    };

    Ok(StdResponse {
        data: Some(users),
        message: Some("Listed users successfully"),
    })
}

/// Fetch a single user.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Users"],
    params(
        ("id" = i32, Path, description = "User ID to fetch")
    ),
    responses(
        (status = 200, description = "Get user successfully", body = StdResponse<UserEntity, String>),
        (status = 404, description = "User not found")
    )
)]
async fn get_user(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection")?;

    let user = repo::get_user(&mut conn, id)
        .await
        .context("Failed to get user")?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(StdResponse {
        data: Some(user),
        message: Some("Get user successfully"),
    })
}
