use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    database::Database,
    models::RoleKind,
    utils::verify_token,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
struct AuthenticatedRow {
    id: Uuid,
    name: String,
    email: String,
    role_id: Uuid,
    role_name: String,
}

#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role_id: Uuid,
    pub role_name: String,
    pub role: RoleKind,
}

impl CurrentUser {
    /// Admin/Manager may see and act on any customer; an Employee only on
    /// customers assigned to them.
    pub fn can_access_customer(&self, assigned_employee_id: Option<Uuid>) -> bool {
        self.role.full_access() || assigned_employee_id == Some(self.id)
    }

    /// The employee id used to scope dashboards and reminders. None means
    /// the caller sees agency-wide numbers.
    pub fn scope_employee_id(&self) -> Option<Uuid> {
        if self.role.full_access() {
            None
        } else {
            Some(self.id)
        }
    }
}

pub async fn get_current_user(cookies: Cookies, db: &Database) -> Option<CurrentUser> {
    // Try to get JWT token from auth_token cookie
    let token = cookies.get("auth_token")?.value().to_string();

    let claims = verify_token(&token).ok()?;
    let user_id = Uuid::parse_str(&claims.sub).ok()?;

    let row = sqlx::query_as::<_, AuthenticatedRow>(
        "SELECT u.id, u.name, u.email, u.role_id, r.name AS role_name \
         FROM users u \
         JOIN roles r ON r.id = u.role_id \
         WHERE u.id = $1 AND u.is_active = true",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .ok()??;

    let role = RoleKind::from_name(&row.role_name);
    Some(CurrentUser {
        id: row.id,
        name: row.name,
        email: row.email,
        role_id: row.role_id,
        role_name: row.role_name,
        role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_role(role: RoleKind) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            role_id: Uuid::new_v4(),
            role_name: String::new(),
            role,
        }
    }

    #[test]
    fn managers_access_any_customer() {
        let user = user_with_role(RoleKind::Manager);
        assert!(user.can_access_customer(None));
        assert!(user.can_access_customer(Some(Uuid::new_v4())));
        assert_eq!(user.scope_employee_id(), None);
    }

    #[test]
    fn employees_access_only_their_customers() {
        let user = user_with_role(RoleKind::Employee);
        assert!(user.can_access_customer(Some(user.id)));
        assert!(!user.can_access_customer(Some(Uuid::new_v4())));
        assert!(!user.can_access_customer(None));
        assert_eq!(user.scope_employee_id(), Some(user.id));
    }
}
