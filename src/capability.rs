use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::models::UserEntity;

/// Roles stored on user rows. Unknown stored values fail every capability
/// check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Admin,
    Delivery,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
            Role::Delivery => "delivery",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "customer" => Some(Role::Customer),
            "admin" => Some(Role::Admin),
            "delivery" => Some(Role::Delivery),
            _ => None,
        }
    }
}

/// Roles allowed to carry deliveries.
pub const DELIVERY_ASSIGNEE_ROLES: &[Role] = &[Role::Delivery, Role::Admin];

/// The single role gate used by every role-checked endpoint.
pub fn require_role(user: &UserEntity, allowed: &[Role]) -> Result<(), AppError> {
    match Role::parse(&user.role) {
        Some(role) if allowed.contains(&role) => Ok(()),
        _ => Err(AppError::BadRequest(format!(
            "User {} is not allowed to perform this action",
            user.id
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_with_role(role: &str) -> UserEntity {
        UserEntity {
            id: 7,
            email: "rider@example.com".to_string(),
            name: "Rider".to_string(),
            role: role.to_string(),
            hashed_password: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn delivery_and_admin_may_carry_deliveries() {
        assert!(require_role(&user_with_role("delivery"), DELIVERY_ASSIGNEE_ROLES).is_ok());
        assert!(require_role(&user_with_role("admin"), DELIVERY_ASSIGNEE_ROLES).is_ok());
    }

    #[test]
    fn customer_is_rejected() {
        let err = require_role(&user_with_role("customer"), DELIVERY_ASSIGNEE_ROLES);
        assert!(matches!(err, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn unknown_stored_role_fails_closed() {
        let err = require_role(&user_with_role("superuser"), DELIVERY_ASSIGNEE_ROLES);
        assert!(matches!(err, Err(AppError::BadRequest(_))));
    }
}
