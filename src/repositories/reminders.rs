use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::database::Database;
use crate::models::DueReminder;

pub async fn insert(
    db: &Database,
    customer_id: Uuid,
    employee_id: Uuid,
    remind_at: DateTime<Utc>,
    note: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO reminders (customer_id, employee_id, remind_at, note) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(customer_id)
    .bind(employee_id)
    .bind(remind_at)
    .bind(note)
    .execute(db)
    .await?;
    Ok(())
}

/// The caller's due, not-yet-shown reminders, oldest first.
pub async fn due_for_employee(
    db: &Database,
    employee_id: Uuid,
) -> Result<Vec<DueReminder>, sqlx::Error> {
    sqlx::query_as::<_, DueReminder>(
        "SELECT r.id, r.customer_id, c.name AS customer_name, \
                c.mobile_number AS customer_mobile, r.remind_at, r.note \
         FROM reminders r \
         JOIN customers c ON c.id = r.customer_id \
         WHERE r.employee_id = $1 AND r.is_shown = false AND r.remind_at <= NOW() \
         ORDER BY r.remind_at",
    )
    .bind(employee_id)
    .fetch_all(db)
    .await
}

/// Reminders falling on the given day, agency-wide or for one employee.
pub async fn on_day(
    db: &Database,
    day: NaiveDate,
    employee_id: Option<Uuid>,
) -> Result<Vec<DueReminder>, sqlx::Error> {
    let base = "SELECT r.id, r.customer_id, c.name AS customer_name, \
                c.mobile_number AS customer_mobile, r.remind_at, r.note \
         FROM reminders r \
         JOIN customers c ON c.id = r.customer_id \
         WHERE DATE(r.remind_at) = $1";
    match employee_id {
        Some(employee_id) => {
            sqlx::query_as::<_, DueReminder>(&format!(
                "{} AND r.employee_id = $2 ORDER BY r.remind_at",
                base
            ))
            .bind(day)
            .bind(employee_id)
            .fetch_all(db)
            .await
        }
        None => {
            sqlx::query_as::<_, DueReminder>(&format!("{} ORDER BY r.remind_at", base))
                .bind(day)
                .fetch_all(db)
                .await
        }
    }
}

pub async fn mark_shown(db: &Database, id: Uuid, employee_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE reminders SET is_shown = true WHERE id = $1 AND employee_id = $2",
    )
    .bind(id)
    .bind(employee_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}
