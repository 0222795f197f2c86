use uuid::Uuid;

use crate::database::Database;
use crate::models::{Role, RoleWithUserCount};

pub async fn list_with_user_counts(db: &Database) -> Result<Vec<RoleWithUserCount>, sqlx::Error> {
    sqlx::query_as::<_, RoleWithUserCount>(
        "SELECT r.id, r.name, r.description, r.is_system, \
                COUNT(u.id) AS user_count \
         FROM roles r \
         LEFT JOIN users u ON u.role_id = r.id \
         GROUP BY r.id, r.name, r.description, r.is_system \
         ORDER BY r.name",
    )
    .fetch_all(db)
    .await
}

pub async fn list_all(db: &Database) -> Result<Vec<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY name")
        .fetch_all(db)
        .await
}

pub async fn find_by_id(db: &Database, id: Uuid) -> Result<Option<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_by_name(db: &Database, name: &str) -> Result<Option<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE LOWER(name) = LOWER($1)")
        .bind(name)
        .fetch_optional(db)
        .await
}

pub async fn insert(
    db: &Database,
    name: &str,
    description: Option<&str>,
    is_system: bool,
) -> Result<Role, sqlx::Error> {
    sqlx::query_as::<_, Role>(
        "INSERT INTO roles (name, description, is_system) \
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(name)
    .bind(description)
    .bind(is_system)
    .fetch_one(db)
    .await
}

pub async fn update(
    db: &Database,
    id: Uuid,
    name: &str,
    description: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE roles SET name = $2, description = $3 WHERE id = $1")
        .bind(id)
        .bind(name)
        .bind(description)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn delete(db: &Database, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM roles WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn assigned_user_count(db: &Database, id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role_id = $1")
        .bind(id)
        .fetch_one(db)
        .await
}
