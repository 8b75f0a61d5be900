use axum::response::IntoResponse;
use utoipa_axum::router::OpenApiRouter;

use crate::error::StdResponse;
use crate::state::AppState;

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().routes(utoipa_axum::routes!(health_check))
}

/// Service health probe.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Health"],
    responses(
        (status = 200, description = "Service is healthy", body = StdResponse<String, String>)
    )
)]
async fn health_check() -> impl IntoResponse {
    StdResponse::<(), _> {
        data: None,
        message: Some("Healthy"),
    }
}
