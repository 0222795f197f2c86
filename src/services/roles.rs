use uuid::Uuid;

use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::models::Role;
use crate::repositories::roles;

/// Seeded on startup; Admin is the one system role.
const DEFAULT_ROLES: &[(&str, &str, bool)] = &[
    ("Admin", "Full system access", true),
    ("Manager", "Manage teams and assignments", false),
    ("Employee", "Standard access for day-to-day work", false),
];

pub async fn ensure_default_roles(db: &Database) -> AppResult<()> {
    for (name, description, is_system) in DEFAULT_ROLES {
        if roles::find_by_name(db, name).await?.is_none() {
            roles::insert(db, name, Some(description), *is_system).await?;
            log::info!("Seeded default role {}", name);
        }
    }
    Ok(())
}

pub async fn create_role(
    db: &Database,
    name: &str,
    description: Option<&str>,
) -> AppResult<Role> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Role name is required.".to_string()));
    }
    if roles::find_by_name(db, name).await?.is_some() {
        return Err(AppError::Validation(format!(
            "A role named '{}' already exists.",
            name
        )));
    }
    Ok(roles::insert(db, name, description, false).await?)
}

pub async fn update_role(
    db: &Database,
    id: Uuid,
    name: &str,
    description: Option<&str>,
) -> AppResult<()> {
    let existing = roles::find_by_id(db, id)
        .await?
        .ok_or(AppError::NotFound("Role"))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Role name is required.".to_string()));
    }
    if existing.is_system && !existing.name.eq_ignore_ascii_case(name) {
        return Err(AppError::Validation(format!(
            "System role '{}' cannot be renamed.",
            existing.name
        )));
    }
    if let Some(other) = roles::find_by_name(db, name).await? {
        if other.id != id {
            return Err(AppError::Validation(format!(
                "A role named '{}' already exists.",
                name
            )));
        }
    }

    Ok(roles::update(db, id, name, description).await?)
}

pub async fn delete_role(db: &Database, id: Uuid) -> AppResult<()> {
    let existing = roles::find_by_id(db, id)
        .await?
        .ok_or(AppError::NotFound("Role"))?;
    if existing.is_system {
        return Err(AppError::Validation(format!(
            "System role '{}' cannot be deleted.",
            existing.name
        )));
    }
    let in_use = roles::assigned_user_count(db, id).await?;
    if in_use > 0 {
        return Err(AppError::Validation(format!(
            "Cannot delete role '{}' because it is assigned to {} user(s).",
            existing.name, in_use
        )));
    }
    Ok(roles::delete(db, id).await?)
}
