use uuid::Uuid;

use crate::database::Database;
use crate::models::{User, UserDisplay};

const DISPLAY_SELECT: &str = "SELECT u.id, u.name, u.email, u.mobile, u.role_id, \
     r.name AS role_name, u.is_active, u.created_at \
     FROM users u JOIN roles r ON r.id = u.role_id";

pub async fn list_display(db: &Database) -> Result<Vec<UserDisplay>, sqlx::Error> {
    sqlx::query_as::<_, UserDisplay>(&format!("{} ORDER BY u.name", DISPLAY_SELECT))
        .fetch_all(db)
        .await
}

pub async fn find_display_by_id(
    db: &Database,
    id: Uuid,
) -> Result<Option<UserDisplay>, sqlx::Error> {
    sqlx::query_as::<_, UserDisplay>(&format!("{} WHERE u.id = $1", DISPLAY_SELECT))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_by_id(db: &Database, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_active_by_email(
    db: &Database,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE LOWER(email) = LOWER($1) AND is_active = true",
    )
    .bind(email)
    .fetch_optional(db)
    .await
}

pub async fn find_by_email(db: &Database, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
        .bind(email)
        .fetch_optional(db)
        .await
}

/// Active users holding the Employee role, for assignment dropdowns.
pub async fn list_active_employees(db: &Database) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT u.* FROM users u \
         JOIN roles r ON r.id = u.role_id \
         WHERE u.is_active = true AND LOWER(r.name) = 'employee' \
         ORDER BY u.name",
    )
    .fetch_all(db)
    .await
}

pub async fn find_active_employee(db: &Database, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT u.* FROM users u \
         JOIN roles r ON r.id = u.role_id \
         WHERE u.id = $1 AND u.is_active = true AND LOWER(r.name) = 'employee'",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn insert(
    db: &Database,
    name: &str,
    email: &str,
    password_hash: &str,
    mobile: Option<&str>,
    role_id: Uuid,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, password_hash, mobile, role_id, is_active) \
         VALUES ($1, $2, $3, $4, $5, true) RETURNING *",
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(mobile)
    .bind(role_id)
    .fetch_one(db)
    .await
}

pub async fn update(
    db: &Database,
    id: Uuid,
    name: &str,
    email: &str,
    mobile: Option<&str>,
    role_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET name = $2, email = $3, mobile = $4, role_id = $5 WHERE id = $1",
    )
    .bind(id)
    .bind(name)
    .bind(email)
    .bind(mobile)
    .bind(role_id)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn update_password_hash(
    db: &Database,
    id: Uuid,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn set_active(db: &Database, id: Uuid, is_active: bool) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET is_active = $2 WHERE id = $1")
        .bind(id)
        .bind(is_active)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn update_role(db: &Database, id: Uuid, role_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET role_id = $2 WHERE id = $1")
        .bind(id)
        .bind(role_id)
        .execute(db)
        .await?;
    Ok(())
}
