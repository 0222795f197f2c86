use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
}

/// Role listing row with the number of users currently holding the role.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct RoleWithUserCount {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_system: bool,
    pub user_count: i64,
}

/// Role decisions in code go through this enum rather than string
/// comparisons scattered around the handlers. Parsed case-insensitively
/// from the role name joined onto the user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleKind {
    Admin,
    Manager,
    Employee,
    Other,
}

impl RoleKind {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "admin" => RoleKind::Admin,
            "manager" => RoleKind::Manager,
            "employee" => RoleKind::Employee,
            _ => RoleKind::Other,
        }
    }

    /// Admin and Manager see every customer and may mutate shared data.
    pub fn full_access(self) -> bool {
        matches!(self, RoleKind::Admin | RoleKind::Manager)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub mobile: Option<String>,
    pub role_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// User row with the role name joined in, flattened for templates.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct UserDisplay {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub role_id: Uuid,
    pub role_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl UserDisplay {
    pub fn mobile_text(&self) -> String {
        self.mobile.clone().unwrap_or_default()
    }

    pub fn status_text(&self) -> &'static str {
        if self.is_active {
            "Active"
        } else {
            "Inactive"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_kind_is_case_insensitive() {
        assert_eq!(RoleKind::from_name("ADMIN"), RoleKind::Admin);
        assert_eq!(RoleKind::from_name(" manager "), RoleKind::Manager);
        assert_eq!(RoleKind::from_name("Employee"), RoleKind::Employee);
        assert_eq!(RoleKind::from_name("Auditor"), RoleKind::Other);
    }

    #[test]
    fn full_access_is_admin_or_manager() {
        assert!(RoleKind::Admin.full_access());
        assert!(RoleKind::Manager.full_access());
        assert!(!RoleKind::Employee.full_access());
        assert!(!RoleKind::Other.full_access());
    }
}
