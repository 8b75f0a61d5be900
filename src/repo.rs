//! Repository operations over the relational schema. Functions take a
//! connection so handlers can compose them inside one unit of work.

use bigdecimal::BigDecimal;
use diesel::prelude::AsChangeset;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, QueryResult, SelectableHelper};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::error::AppError;
use crate::models::{
    CreateDeliveryEntity, CreateDeliveryStatusHistoryEntity, CreateMenuItemEntity,
    CreateOrderEntity, CreateOrderItemEntity, CreatePaymentEntity, CreateRestaurantEntity,
    CreateUserEntity, DeliveryEntity, DeliveryStatus, DeliveryStatusHistoryEntity, MenuItemEntity,
    OrderEntity, OrderItemEntity, OrderStatus, PaymentEntity, PaymentStatus, RestaurantEntity,
    UserEntity,
};
use crate::schema::{
    deliveries, delivery_status_history, menu_items, order_items, orders, payments, restaurants,
    users,
};

pub fn line_total(unit_price: &BigDecimal, quantity: i32) -> BigDecimal {
    (unit_price * BigDecimal::from(quantity)).with_scale(2)
}

pub fn money_sum<I>(values: I) -> BigDecimal
where
    I: IntoIterator<Item = BigDecimal>,
{
    values
        .into_iter()
        .fold(BigDecimal::from(0), |acc, v| acc + v)
        .with_scale(2)
}

// Users

pub async fn create_user(
    conn: &mut AsyncPgConnection,
    new_user: CreateUserEntity,
) -> QueryResult<UserEntity> {
    diesel::insert_into(users::table)
        .values(new_user)
        .returning(UserEntity::as_returning())
        .get_result(conn)
        .await
}

pub async fn get_user(conn: &mut AsyncPgConnection, user_id: i32) -> QueryResult<Option<UserEntity>> {
    users::table.find(user_id).get_result(conn).await.optional()
}

pub async fn get_user_by_email(
    conn: &mut AsyncPgConnection,
    email: &str,
) -> QueryResult<Option<UserEntity>> {
    users::table
        .filter(users::email.eq(email))
        .get_result(conn)
        .await
        .optional()
}

pub async fn list_users(conn: &mut AsyncPgConnection) -> QueryResult<Vec<UserEntity>> {
    users::table
        .order_by(users::id.asc())
        .get_results(conn)
        .await
}

// Restaurants

pub async fn create_restaurant(
    conn: &mut AsyncPgConnection,
    new_restaurant: CreateRestaurantEntity,
) -> QueryResult<RestaurantEntity> {
    diesel::insert_into(restaurants::table)
        .values(new_restaurant)
        .returning(RestaurantEntity::as_returning())
        .get_result(conn)
        .await
}

pub async fn list_restaurants(conn: &mut AsyncPgConnection) -> QueryResult<Vec<RestaurantEntity>> {
    restaurants::table
        .order_by(restaurants::name.asc())
        .get_results(conn)
        .await
}

pub async fn get_restaurant(
    conn: &mut AsyncPgConnection,
    restaurant_id: i32,
) -> QueryResult<Option<RestaurantEntity>> {
    restaurants::table
        .find(restaurant_id)
        .get_result(conn)
        .await
        .optional()
}

// Menu items

pub async fn create_menu_item(
    conn: &mut AsyncPgConnection,
    new_item: CreateMenuItemEntity,
) -> QueryResult<MenuItemEntity> {
    diesel::insert_into(menu_items::table)
        .values(new_item)
        .returning(MenuItemEntity::as_returning())
        .get_result(conn)
        .await
}

pub async fn get_menu_item(
    conn: &mut AsyncPgConnection,
    menu_item_id: i32,
) -> QueryResult<Option<MenuItemEntity>> {
    menu_items::table
        .find(menu_item_id)
        .get_result(conn)
        .await
        .optional()
}

pub async fn list_menu_items_for_restaurant(
    conn: &mut AsyncPgConnection,
    restaurant_id: i32,
    only_available: bool,
) -> QueryResult<Vec<MenuItemEntity>> {
    let mut query = menu_items::table
        .filter(menu_items::restaurant_id.eq(restaurant_id))
        .into_boxed();
    if only_available {
        query = query.filter(menu_items::is_available.eq(true));
    }
    query
        .order_by(menu_items::name.asc())
        .get_results(conn)
        .await
}

// Orders

pub struct OrderItemRequest {
    pub menu_item_id: i32,
    pub quantity: i32,
}

/// Create an order and its items as one atomic unit. Unit prices are
/// snapshotted from the current menu; the total is the exact sum of line
/// totals.
pub async fn create_order(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    restaurant_id: i32,
    delivery_address: Option<String>,
    items: Vec<OrderItemRequest>,
) -> Result<(OrderEntity, Vec<OrderItemEntity>), AppError> {
    conn.transaction(move |conn| {
        Box::pin(async move {
            let order: OrderEntity = diesel::insert_into(orders::table)
                .values(CreateOrderEntity {
                    user_id,
                    restaurant_id,
                    status: OrderStatus::Created.as_str().to_string(),
                    total_amount: BigDecimal::from(0).with_scale(2),
                    delivery_address,
                })
                .returning(OrderEntity::as_returning())
                .get_result(conn)
                .await?;

            let mut new_items = Vec::with_capacity(items.len());
            let mut line_totals = Vec::with_capacity(items.len());

            for item in &items {
                let menu_item = get_menu_item(conn, item.menu_item_id).await?.ok_or_else(|| {
                    AppError::NotFound(format!("Menu item {} not found", item.menu_item_id))
                })?;

                if item.quantity < 1 {
                    return Err(AppError::BadRequest("Quantity must be >= 1".to_string()));
                }

                let line = line_total(&menu_item.price, item.quantity);
                new_items.push(CreateOrderItemEntity {
                    order_id: order.id,
                    menu_item_id: menu_item.id,
                    quantity: item.quantity,
                    unit_price: menu_item.price.clone(),
                    line_total: line.clone(),
                });
                line_totals.push(line);
            }

            let order_items: Vec<OrderItemEntity> = diesel::insert_into(order_items::table)
                .values(&new_items)
                .returning(OrderItemEntity::as_returning())
                .get_results(conn)
                .await?;

            let order: OrderEntity = diesel::update(orders::table.find(order.id))
                .set(orders::total_amount.eq(money_sum(line_totals)))
                .returning(OrderEntity::as_returning())
                .get_result(conn)
                .await?;

            Ok::<_, AppError>((order, order_items))
        })
    })
    .await
}

pub async fn get_order(
    conn: &mut AsyncPgConnection,
    order_id: i32,
) -> QueryResult<Option<OrderEntity>> {
    orders::table.find(order_id).get_result(conn).await.optional()
}

pub async fn list_orders(conn: &mut AsyncPgConnection) -> QueryResult<Vec<OrderEntity>> {
    orders::table
        .order_by(orders::updated_at.desc())
        .get_results(conn)
        .await
}

pub async fn list_order_items(
    conn: &mut AsyncPgConnection,
    order_id: i32,
) -> QueryResult<Vec<OrderItemEntity>> {
    order_items::table
        .filter(order_items::order_id.eq(order_id))
        .order_by(order_items::id.asc())
        .get_results(conn)
        .await
}

pub async fn set_order_status(
    conn: &mut AsyncPgConnection,
    order_id: i32,
    status: OrderStatus,
) -> Result<OrderEntity, AppError> {
    diesel::update(orders::table.find(order_id))
        .set((
            orders::status.eq(status.as_str()),
            orders::updated_at.eq(diesel::dsl::now),
        ))
        .returning(OrderEntity::as_returning())
        .get_result(conn)
        .await
        .map_err(|err| match err {
            diesel::result::Error::NotFound => {
                AppError::NotFound("Order not found".to_string())
            }
            err => err.into(),
        })
}

// Payments

/// At most one payment exists per order. A second call replaces every mutable
/// field; omitted optionals are cleared, not preserved.
pub async fn upsert_payment_for_order(
    conn: &mut AsyncPgConnection,
    order_id: i32,
    provider: String,
    amount: BigDecimal,
    status: PaymentStatus,
    provider_payment_id: Option<String>,
    raw_payload: Option<String>,
) -> QueryResult<PaymentEntity> {
    diesel::insert_into(payments::table)
        .values(CreatePaymentEntity {
            order_id,
            provider: provider.clone(),
            status: status.as_str().to_string(),
            amount: amount.clone(),
            provider_payment_id: provider_payment_id.clone(),
            raw_payload: raw_payload.clone(),
        })
        .on_conflict(payments::order_id)
        .do_update()
        .set((
            payments::provider.eq(provider),
            payments::status.eq(status.as_str()),
            payments::amount.eq(amount),
            payments::provider_payment_id.eq(provider_payment_id),
            payments::raw_payload.eq(raw_payload),
            payments::updated_at.eq(diesel::dsl::now),
        ))
        .returning(PaymentEntity::as_returning())
        .get_result(conn)
        .await
}

pub async fn get_payment_by_provider_payment_id(
    conn: &mut AsyncPgConnection,
    provider_payment_id: &str,
) -> QueryResult<Option<PaymentEntity>> {
    payments::table
        .filter(payments::provider_payment_id.eq(provider_payment_id))
        .get_result(conn)
        .await
        .optional()
}

// Deliveries

/// Create the delivery for an order together with its first history entry.
pub async fn create_delivery(
    conn: &mut AsyncPgConnection,
    order_id: i32,
    delivery_person_id: Option<i32>,
    eta_minutes: Option<i32>,
) -> Result<DeliveryEntity, AppError> {
    let status = DeliveryStatus::initial(delivery_person_id.is_some());
    conn.transaction(move |conn| {
        Box::pin(async move {
            let delivery: DeliveryEntity = diesel::insert_into(deliveries::table)
                .values(CreateDeliveryEntity {
                    order_id,
                    delivery_person_id,
                    status: status.as_str().to_string(),
                    eta_minutes,
                })
                .returning(DeliveryEntity::as_returning())
                .get_result(conn)
                .await?;

            diesel::insert_into(delivery_status_history::table)
                .values(CreateDeliveryStatusHistoryEntity {
                    delivery_id: delivery.id,
                    status: delivery.status.clone(),
                    note: Some("Initial status".to_string()),
                })
                .execute(conn)
                .await?;

            Ok::<_, AppError>(delivery)
        })
    })
    .await
}

pub async fn get_delivery(
    conn: &mut AsyncPgConnection,
    delivery_id: i32,
) -> QueryResult<Option<DeliveryEntity>> {
    deliveries::table
        .find(delivery_id)
        .get_result(conn)
        .await
        .optional()
}

pub async fn get_delivery_by_order_id(
    conn: &mut AsyncPgConnection,
    order_id: i32,
) -> QueryResult<Option<DeliveryEntity>> {
    deliveries::table
        .filter(deliveries::order_id.eq(order_id))
        .get_result(conn)
        .await
        .optional()
}

pub async fn list_deliveries(
    conn: &mut AsyncPgConnection,
    delivery_person_id: Option<i32>,
) -> QueryResult<Vec<DeliveryEntity>> {
    let mut query = deliveries::table.into_boxed();
    if let Some(person_id) = delivery_person_id {
        query = query.filter(deliveries::delivery_person_id.eq(person_id));
    }
    query
        .order_by(deliveries::id.asc())
        .get_results(conn)
        .await
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::deliveries)]
struct AssignDeliveryChangeset {
    delivery_person_id: i32,
    status: String,
    // None skips the column, the stored ETA survives.
    eta_minutes: Option<i32>,
}

/// Hand the delivery to an assignee. The status change is logged to history
/// like any other transition.
pub async fn assign_delivery(
    conn: &mut AsyncPgConnection,
    delivery_id: i32,
    delivery_person_id: i32,
    eta_minutes: Option<i32>,
) -> Result<DeliveryEntity, AppError> {
    conn.transaction(move |conn| {
        Box::pin(async move {
            let delivery: DeliveryEntity = diesel::update(deliveries::table.find(delivery_id))
                .set((
                    AssignDeliveryChangeset {
                        delivery_person_id,
                        status: DeliveryStatus::Assigned.as_str().to_string(),
                        eta_minutes,
                    },
                    deliveries::updated_at.eq(diesel::dsl::now),
                ))
                .returning(DeliveryEntity::as_returning())
                .get_result(conn)
                .await
                .map_err(|err| match err {
                    diesel::result::Error::NotFound => {
                        AppError::NotFound("Delivery not found".to_string())
                    }
                    err => AppError::from(err),
                })?;

            diesel::insert_into(delivery_status_history::table)
                .values(CreateDeliveryStatusHistoryEntity {
                    delivery_id: delivery.id,
                    status: delivery.status.clone(),
                    note: Some(format!("Assigned to delivery person {delivery_person_id}")),
                })
                .execute(conn)
                .await?;

            Ok::<_, AppError>(delivery)
        })
    })
    .await
}

/// Update the delivery status and append exactly one history entry.
pub async fn set_delivery_status(
    conn: &mut AsyncPgConnection,
    delivery_id: i32,
    status: DeliveryStatus,
    note: Option<String>,
) -> Result<DeliveryEntity, AppError> {
    conn.transaction(move |conn| {
        Box::pin(async move {
            let delivery: DeliveryEntity = diesel::update(deliveries::table.find(delivery_id))
                .set((
                    deliveries::status.eq(status.as_str()),
                    deliveries::updated_at.eq(diesel::dsl::now),
                ))
                .returning(DeliveryEntity::as_returning())
                .get_result(conn)
                .await
                .map_err(|err| match err {
                    diesel::result::Error::NotFound => {
                        AppError::NotFound("Delivery not found".to_string())
                    }
                    err => AppError::from(err),
                })?;

            diesel::insert_into(delivery_status_history::table)
                .values(CreateDeliveryStatusHistoryEntity {
                    delivery_id,
                    status: status.as_str().to_string(),
                    note,
                })
                .execute(conn)
                .await?;

            Ok::<_, AppError>(delivery)
        })
    })
    .await
}

pub async fn list_delivery_status_history(
    conn: &mut AsyncPgConnection,
    delivery_id: i32,
) -> QueryResult<Vec<DeliveryStatusHistoryEntity>> {
    delivery_status_history::table
        .filter(delivery_status_history::delivery_id.eq(delivery_id))
        .order_by((
            delivery_status_history::created_at.asc(),
            delivery_status_history::id.asc(),
        ))
        .get_results(conn)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(s: &str) -> BigDecimal {
        s.parse().unwrap()
    }

    #[test]
    fn line_total_is_exact_fixed_point() {
        assert_eq!(line_total(&money("9.99"), 2), money("19.98"));
        assert_eq!(line_total(&money("4.50"), 1), money("4.50"));
        assert_eq!(line_total(&money("0.10"), 3), money("0.30"));
    }

    #[test]
    fn order_total_is_exact_sum_of_line_totals() {
        let total = money_sum([line_total(&money("9.99"), 2), line_total(&money("4.50"), 1)]);
        assert_eq!(total, money("24.48"));
    }

    #[test]
    fn empty_sum_is_zero() {
        assert_eq!(money_sum(Vec::new()), money("0.00"));
    }
}
