use uuid::Uuid;

use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::repositories::{roles, users};
use crate::utils::{hash_password, verify_password};

const DEFAULT_ADMIN_EMAIL: &str = "admin@crm.local";
const DEFAULT_ADMIN_PASSWORD: &str = "Admin@123";

/// Inactive accounts cannot sign in even with the right password.
pub async fn authenticate(db: &Database, email: &str, password: &str) -> AppResult<Option<User>> {
    let Some(user) = users::find_active_by_email(db, email).await? else {
        return Ok(None);
    };
    if verify_password(password, &user.password_hash)? {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

fn validate_password(password: &str) -> AppResult<()> {
    if password.len() < 6 {
        return Err(AppError::Validation(
            "Password must be at least 6 characters.".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_user(
    db: &Database,
    name: &str,
    email: &str,
    password: &str,
    mobile: Option<&str>,
    role_id: Uuid,
) -> AppResult<User> {
    let name = name.trim();
    let email = email.trim();
    if name.is_empty() || email.is_empty() {
        return Err(AppError::Validation(
            "Name and email are required.".to_string(),
        ));
    }
    validate_password(password)?;
    if users::find_by_email(db, email).await?.is_some() {
        return Err(AppError::Validation(format!(
            "A user with email '{}' already exists.",
            email
        )));
    }
    if roles::find_by_id(db, role_id).await?.is_none() {
        return Err(AppError::Validation("Unknown role.".to_string()));
    }

    let password_hash = hash_password(password)?;
    Ok(users::insert(db, name, email, &password_hash, mobile, role_id).await?)
}

/// Edits a user; the password changes only when a new one was posted.
pub async fn update_user(
    db: &Database,
    id: Uuid,
    name: &str,
    email: &str,
    new_password: Option<&str>,
    mobile: Option<&str>,
    role_id: Uuid,
) -> AppResult<()> {
    let name = name.trim();
    let email = email.trim();
    if name.is_empty() || email.is_empty() {
        return Err(AppError::Validation(
            "Name and email are required.".to_string(),
        ));
    }
    if users::find_by_id(db, id).await?.is_none() {
        return Err(AppError::NotFound("User"));
    }
    if let Some(other) = users::find_by_email(db, email).await? {
        if other.id != id {
            return Err(AppError::Validation(format!(
                "A user with email '{}' already exists.",
                email
            )));
        }
    }
    if roles::find_by_id(db, role_id).await?.is_none() {
        return Err(AppError::Validation("Unknown role.".to_string()));
    }

    users::update(db, id, name, email, mobile, role_id).await?;

    if let Some(password) = new_password.map(str::trim).filter(|v| !v.is_empty()) {
        validate_password(password)?;
        let password_hash = hash_password(password)?;
        users::update_password_hash(db, id, &password_hash).await?;
    }
    Ok(())
}

/// First-run bootstrap: a sign-in is impossible without at least one
/// account, so a default administrator is created when none exists.
pub async fn ensure_default_admin(db: &Database) -> AppResult<()> {
    if users::find_by_email(db, DEFAULT_ADMIN_EMAIL).await?.is_some() {
        return Ok(());
    }
    let admin_role = roles::find_by_name(db, "Admin")
        .await?
        .ok_or_else(|| AppError::Validation("Admin role missing.".to_string()))?;
    let password_hash = hash_password(DEFAULT_ADMIN_PASSWORD)?;
    users::insert(
        db,
        "System Administrator",
        DEFAULT_ADMIN_EMAIL,
        &password_hash,
        None,
        admin_role.id,
    )
    .await?;
    log::warn!(
        "Seeded default administrator {}; change its password",
        DEFAULT_ADMIN_EMAIL
    );
    Ok(())
}
