use std::time::Duration;

use anyhow::Context;
use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
};
use bigdecimal::BigDecimal;
use diesel_async::AsyncConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::error::{AppError, StdResponse};
use crate::models::{OrderStatus, PaymentEntity, PaymentStatus};
use crate::repo;
use crate::state::AppState;

/// Shared-secret header expected on mock webhook calls.
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

const WEBHOOK_PATH: &str = "/payments/webhooks/mock";

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/payments",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_mock_payment_intent))
            .routes(utoipa_axum::routes!(mock_payment_webhook))
            .routes(utoipa_axum::routes!(simulate_mock_webhook)),
    )
}

fn default_provider() -> String {
    "mock".to_string()
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_succeed() -> bool {
    true
}

#[derive(Deserialize, ToSchema)]
struct MockPaymentIntentReq {
    order_id: i32,
    #[serde(default = "default_provider")]
    provider: String,
    /// Defaults to the order's total when omitted.
    #[schema(value_type = Option<String>)]
    amount: Option<BigDecimal>,
    #[serde(default = "default_currency")]
    currency: String,
    /// Whether the simulated authorization succeeds.
    #[serde(default = "default_succeed")]
    succeed: bool,
}

#[derive(Serialize, ToSchema)]
struct MockPaymentIntentRes {
    payment: PaymentEntity,
    checkout_url: String,
    provider_payment_id: String,
}

fn build_checkout_url(provider: &str, provider_payment_id: &str, order_id: i32) -> String {
    format!("/mock-checkout?provider={provider}&payment_id={provider_payment_id}&order_id={order_id}")
}

/// Create a mock payment intent for an order and persist the payment row.
/// A successful simulation advances a freshly created order to confirmed.
#[utoipa::path(
    post,
    path = "/mock/intent",
    tags = ["Payments"],
    request_body = MockPaymentIntentReq,
    responses(
        (status = 200, description = "Created mock payment intent", body = StdResponse<MockPaymentIntentRes, String>),
        (status = 400, description = "Resolved amount is not positive"),
        (status = 404, description = "Order not found")
    )
)]
async fn create_mock_payment_intent(
    State(state): State<AppState>,
    Json(body): Json<MockPaymentIntentReq>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection")?;

    let order = repo::get_order(&mut conn, body.order_id)
        .await
        .context("Failed to get order")?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    let amount = body
        .amount
        .unwrap_or_else(|| order.total_amount.clone())
        .with_scale(2);
    if amount <= BigDecimal::from(0) {
        return Err(AppError::BadRequest("Amount must be > 0".to_string()));
    }

    let provider_payment_id = format!("mock_{}", Uuid::new_v4().simple());
    let status = if body.succeed {
        PaymentStatus::Authorized
    } else {
        PaymentStatus::Failed
    };
    let raw_payload = serde_json::json!({
        "currency": body.currency,
        "succeed": body.succeed,
        "generated_by": "mock_intent",
    })
    .to_string();

    let order_id = order.id;
    let order_still_created = order.status == OrderStatus::Created.as_str();
    let provider = body.provider.clone();
    let ppid = provider_payment_id.clone();

    let payment = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let payment = repo::upsert_payment_for_order(
                    conn,
                    order_id,
                    provider,
                    amount,
                    status,
                    Some(ppid),
                    Some(raw_payload),
                )
                .await?;

                if status == PaymentStatus::Authorized && order_still_created {
                    repo::set_order_status(conn, order_id, OrderStatus::Confirmed).await?;
                }

                Ok::<_, AppError>(payment)
            })
        })
        .await?;

    let checkout_url = build_checkout_url(&body.provider, &provider_payment_id, order_id);

    Ok(StdResponse {
        data: Some(MockPaymentIntentRes {
            payment,
            checkout_url,
            provider_payment_id,
        }),
        message: Some("Created mock payment intent successfully"),
    })
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct PaymentWebhookEvent {
    pub provider_payment_id: String,
    pub order_id: i32,
    pub provider: String,
    pub status: PaymentStatus,
}

#[derive(Serialize, ToSchema)]
struct WebhookRes {
    ok: bool,
    payment_id: i32,
    order_id: i32,
    order_status: Option<String>,
}

/// Receive a mock provider webhook. The shared secret is checked before
/// anything else; the event must reference an existing payment and its order.
#[utoipa::path(
    post,
    path = "/webhooks/mock",
    tags = ["Payments"],
    request_body = PaymentWebhookEvent,
    responses(
        (status = 200, description = "Processed webhook", body = StdResponse<WebhookRes, String>),
        (status = 400, description = "order_id mismatch for this payment"),
        (status = 401, description = "Invalid webhook secret"),
        (status = 404, description = "Payment not found")
    )
)]
async fn mock_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(event): Json<PaymentWebhookEvent>,
) -> Result<impl IntoResponse, AppError> {
    let provided = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());
    if provided != Some(state.config.webhook_secret.as_str()) {
        return Err(AppError::Unauthorized("Invalid webhook secret".to_string()));
    }

    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection")?;

    let payment = repo::get_payment_by_provider_payment_id(&mut conn, &event.provider_payment_id)
        .await
        .context("Failed to get payment")?
        .ok_or_else(|| {
            AppError::NotFound("Payment not found for provider_payment_id".to_string())
        })?;

    if payment.order_id != event.order_id {
        return Err(AppError::BadRequest(
            "order_id mismatch for this payment".to_string(),
        ));
    }

    let raw_payload =
        serde_json::to_string(&event).context("Failed to serialize webhook event")?;
    let amount = payment.amount.clone();

    let (payment, updated_order) = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let payment = repo::upsert_payment_for_order(
                    conn,
                    event.order_id,
                    event.provider.clone(),
                    amount,
                    event.status,
                    Some(event.provider_payment_id.clone()),
                    Some(raw_payload),
                )
                .await?;

                let updated_order = match event.status.order_transition() {
                    Some(next) => {
                        Some(repo::set_order_status(conn, event.order_id, next).await?)
                    }
                    None => None,
                };

                Ok::<_, AppError>((payment, updated_order))
            })
        })
        .await?;

    Ok(StdResponse {
        data: Some(WebhookRes {
            ok: true,
            payment_id: payment.id,
            order_id: payment.order_id,
            order_status: updated_order.map(|order| order.status),
        }),
        message: Some("Processed webhook successfully"),
    })
}

#[derive(Serialize, ToSchema)]
struct SimulateWebhookRes {
    sent_to: String,
    status_code: u16,
    #[schema(value_type = Object)]
    response: serde_json::Value,
}

/// Local-dev helper: post the event to this service's own webhook endpoint
/// using the configured secret, and relay the downstream response.
#[utoipa::path(
    post,
    path = "/mock/simulate-webhook",
    tags = ["Payments"],
    request_body = PaymentWebhookEvent,
    responses(
        (status = 200, description = "Webhook simulated", body = StdResponse<SimulateWebhookRes, String>)
    )
)]
async fn simulate_mock_webhook(
    State(state): State<AppState>,
    Json(event): Json<PaymentWebhookEvent>,
) -> Result<impl IntoResponse, AppError> {
    let base = state
        .config
        .site_url
        .clone()
        .unwrap_or_else(|| format!("http://localhost:{}", state.config.port));
    let webhook_url = format!("{base}{WEBHOOK_PATH}");

    let response = state
        .http_client
        .post(&webhook_url)
        .timeout(Duration::from_secs(10))
        .header(WEBHOOK_SECRET_HEADER, &state.config.webhook_secret)
        .json(&event)
        .send()
        .await
        .map_err(|_| AppError::ServiceUnreachable("the mock webhook endpoint".to_string()))?;

    let status_code = response.status().as_u16();
    let is_json = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/json"))
        .unwrap_or(false);
    let body = if is_json {
        response
            .json::<serde_json::Value>()
            .await
            .context("Failed to parse webhook response")?
    } else {
        serde_json::Value::String(
            response
                .text()
                .await
                .context("Failed to read webhook response")?,
        )
    };

    Ok(StdResponse {
        data: Some(SimulateWebhookRes {
            sent_to: webhook_url,
            status_code,
            response: body,
        }),
        message: Some("Simulated webhook successfully"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_url_carries_provider_payment_and_order() {
        let url = build_checkout_url("mock", "mock_abc123", 42);
        assert_eq!(
            url,
            "/mock-checkout?provider=mock&payment_id=mock_abc123&order_id=42"
        );
    }

    #[test]
    fn webhook_event_round_trips_with_snake_case_status() {
        let event: PaymentWebhookEvent = serde_json::from_str(
            r#"{"provider_payment_id":"mock_1","order_id":5,"provider":"mock","status":"captured"}"#,
        )
        .unwrap();
        assert_eq!(event.status, PaymentStatus::Captured);
        let wire = serde_json::to_string(&event).unwrap();
        assert!(wire.contains("\"captured\""));
    }
}
