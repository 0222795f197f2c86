use chrono::NaiveDate;
use uuid::Uuid;

use crate::database::Database;
use crate::models::follow_up::{FollowUpDetail, FollowUpInput};

const DETAIL_SELECT: &str = "SELECT f.id, f.customer_id, c.name AS customer_name, \
     f.follow_up_date, f.insurance_type, f.budget, f.has_existing_policy, \
     f.follow_up_note, f.follow_up_status, f.next_reminder_at, f.reminder_required, \
     f.is_converted, f.conversion_reason, \
     s.product_id AS sold_product_id, s.product_name AS sold_product_name, \
     s.ticket_size, s.tenure_years, s.policy_number, s.policy_enforce_date \
     FROM follow_ups f \
     JOIN customers c ON c.id = f.customer_id \
     LEFT JOIN sold_product_details s ON s.follow_up_id = f.id";

pub async fn history_for_customer(
    db: &Database,
    customer_id: Uuid,
) -> Result<Vec<FollowUpDetail>, sqlx::Error> {
    sqlx::query_as::<_, FollowUpDetail>(&format!(
        "{} WHERE f.customer_id = $1 ORDER BY f.follow_up_date DESC",
        DETAIL_SELECT
    ))
    .bind(customer_id)
    .fetch_all(db)
    .await
}

pub async fn find_detail_by_id(
    db: &Database,
    id: Uuid,
) -> Result<Option<FollowUpDetail>, sqlx::Error> {
    sqlx::query_as::<_, FollowUpDetail>(&format!("{} WHERE f.id = $1", DETAIL_SELECT))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn insert(
    db: &Database,
    input: &FollowUpInput,
    created_by: Option<Uuid>,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO follow_ups \
         (customer_id, follow_up_date, insurance_type, budget, has_existing_policy, \
          follow_up_note, follow_up_status, next_reminder_at, reminder_required, \
          is_converted, conversion_reason, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         RETURNING id",
    )
    .bind(input.customer_id)
    .bind(input.follow_up_date)
    .bind(&input.insurance_type)
    .bind(input.budget)
    .bind(input.has_existing_policy)
    .bind(&input.follow_up_note)
    .bind(&input.follow_up_status)
    .bind(input.next_reminder_at)
    .bind(input.reminder_required)
    .bind(input.is_converted)
    .bind(&input.conversion_reason)
    .bind(created_by)
    .fetch_one(db)
    .await
}

pub async fn update(db: &Database, id: Uuid, input: &FollowUpInput) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE follow_ups SET follow_up_date = $2, insurance_type = $3, budget = $4, \
         has_existing_policy = $5, follow_up_note = $6, follow_up_status = $7, \
         next_reminder_at = $8, reminder_required = $9, is_converted = $10, \
         conversion_reason = $11 \
         WHERE id = $1",
    )
    .bind(id)
    .bind(input.follow_up_date)
    .bind(&input.insurance_type)
    .bind(input.budget)
    .bind(input.has_existing_policy)
    .bind(&input.follow_up_note)
    .bind(&input.follow_up_status)
    .bind(input.next_reminder_at)
    .bind(input.reminder_required)
    .bind(input.is_converted)
    .bind(&input.conversion_reason)
    .execute(db)
    .await?;
    Ok(())
}

/// Calls logged on the given day, optionally scoped to one employee's
/// customers.
pub async fn call_count_on(
    db: &Database,
    day: NaiveDate,
    employee_id: Option<Uuid>,
) -> Result<i64, sqlx::Error> {
    match employee_id {
        Some(employee_id) => {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM follow_ups f \
                 JOIN customers c ON c.id = f.customer_id \
                 WHERE DATE(f.follow_up_date) = $1 AND c.assigned_employee_id = $2",
            )
            .bind(day)
            .bind(employee_id)
            .fetch_one(db)
            .await
        }
        None => {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM follow_ups WHERE DATE(follow_up_date) = $1",
            )
            .bind(day)
            .fetch_one(db)
            .await
        }
    }
}
