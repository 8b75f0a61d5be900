use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::{
    Selectable,
    prelude::{Insertable, Queryable},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Status sets
//
// Columns stay VARCHAR; the closed sets are enforced where requests enter the
// system. Transition legality is deliberately not checked, terminal states
// accept further updates.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Created,
    Confirmed,
    Preparing,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Authorized,
    Captured,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Authorized => "authorized",
            PaymentStatus::Captured => "captured",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    /// Order progression driven by a payment outcome. `None` leaves the order
    /// untouched.
    pub fn order_transition(&self) -> Option<OrderStatus> {
        match self {
            PaymentStatus::Authorized | PaymentStatus::Captured => Some(OrderStatus::Confirmed),
            PaymentStatus::Failed => Some(OrderStatus::Cancelled),
            PaymentStatus::Pending | PaymentStatus::Refunded => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Unassigned,
    Assigned,
    PickedUp,
    InTransit,
    Delivered,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Unassigned => "unassigned",
            DeliveryStatus::Assigned => "assigned",
            DeliveryStatus::PickedUp => "picked_up",
            DeliveryStatus::InTransit => "in_transit",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Failed => "failed",
        }
    }

    /// Starting status of a fresh delivery record.
    pub fn initial(has_assignee: bool) -> Self {
        if has_assignee {
            DeliveryStatus::Assigned
        } else {
            DeliveryStatus::Unassigned
        }
    }
}

// Users

#[derive(Queryable, Selectable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserEntity {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(skip_serializing)]
    pub hashed_password: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::users)]
pub struct CreateUserEntity {
    pub email: String,
    pub name: String,
    pub role: String,
    pub hashed_password: Option<String>,
}

// Restaurants

#[derive(Queryable, Selectable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::restaurants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RestaurantEntity {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::restaurants)]
pub struct CreateRestaurantEntity {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
}

// Menu items

#[derive(Queryable, Selectable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::menu_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MenuItemEntity {
    pub id: i32,
    pub restaurant_id: i32,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String)]
    pub price: BigDecimal,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::menu_items)]
pub struct CreateMenuItemEntity {
    pub restaurant_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub image_url: Option<String>,
    pub is_available: bool,
}

// Orders

#[derive(Queryable, Selectable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderEntity {
    pub id: i32,
    pub user_id: i32,
    pub restaurant_id: i32,
    pub status: String,
    #[schema(value_type = String)]
    pub total_amount: BigDecimal,
    pub delivery_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::orders)]
pub struct CreateOrderEntity {
    pub user_id: i32,
    pub restaurant_id: i32,
    pub status: String,
    pub total_amount: BigDecimal,
    pub delivery_address: Option<String>,
}

#[derive(Queryable, Selectable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemEntity {
    pub id: i32,
    pub order_id: i32,
    pub menu_item_id: i32,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub unit_price: BigDecimal,
    #[schema(value_type = String)]
    pub line_total: BigDecimal,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::order_items)]
pub struct CreateOrderItemEntity {
    pub order_id: i32,
    pub menu_item_id: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub line_total: BigDecimal,
}

// Payments

#[derive(Queryable, Selectable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentEntity {
    pub id: i32,
    pub order_id: i32,
    pub provider: String,
    pub status: String,
    #[schema(value_type = String)]
    pub amount: BigDecimal,
    pub provider_payment_id: Option<String>,
    pub raw_payload: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::payments)]
pub struct CreatePaymentEntity {
    pub order_id: i32,
    pub provider: String,
    pub status: String,
    pub amount: BigDecimal,
    pub provider_payment_id: Option<String>,
    pub raw_payload: Option<String>,
}

// Deliveries

#[derive(Queryable, Selectable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::deliveries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DeliveryEntity {
    pub id: i32,
    pub order_id: i32,
    pub delivery_person_id: Option<i32>,
    pub status: String,
    pub eta_minutes: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::deliveries)]
pub struct CreateDeliveryEntity {
    pub order_id: i32,
    pub delivery_person_id: Option<i32>,
    pub status: String,
    pub eta_minutes: Option<i32>,
}

#[derive(Queryable, Selectable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::delivery_status_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DeliveryStatusHistoryEntity {
    pub id: i32,
    pub delivery_id: i32,
    pub status: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::delivery_status_history)]
pub struct CreateDeliveryStatusHistoryEntity {
    pub delivery_id: i32,
    pub status: String,
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_forms_are_snake_case() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::OutForDelivery).unwrap(),
            "\"out_for_delivery\""
        );
        assert_eq!(
            serde_json::from_str::<DeliveryStatus>("\"picked_up\"").unwrap(),
            DeliveryStatus::PickedUp
        );
        assert_eq!(
            serde_json::from_str::<PaymentStatus>("\"authorized\"").unwrap(),
            PaymentStatus::Authorized
        );
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(serde_json::from_str::<DeliveryStatus>("\"teleported\"").is_err());
    }

    #[test]
    fn as_str_matches_wire_form() {
        for status in [
            OrderStatus::Created,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            let wire = serde_json::to_string(&status).unwrap();
            assert_eq!(wire.trim_matches('"'), status.as_str());
        }
    }

    #[test]
    fn payment_outcome_drives_order_status() {
        assert_eq!(
            PaymentStatus::Authorized.order_transition(),
            Some(OrderStatus::Confirmed)
        );
        assert_eq!(
            PaymentStatus::Captured.order_transition(),
            Some(OrderStatus::Confirmed)
        );
        assert_eq!(
            PaymentStatus::Failed.order_transition(),
            Some(OrderStatus::Cancelled)
        );
        assert_eq!(PaymentStatus::Pending.order_transition(), None);
        assert_eq!(PaymentStatus::Refunded.order_transition(), None);
    }

    #[test]
    fn delivery_initial_status_depends_on_assignee() {
        assert_eq!(DeliveryStatus::initial(true), DeliveryStatus::Assigned);
        assert_eq!(DeliveryStatus::initial(false), DeliveryStatus::Unassigned);
    }
}
