use uuid::Uuid;

use crate::database::Database;
use crate::models::follow_up::SaleInput;
use crate::models::SoldProductInfo;

/// One sale row per follow-up. Re-saving a converted follow-up lands on
/// the unique follow_up_id index and updates in place.
pub async fn upsert_for_follow_up(
    db: &Database,
    follow_up_id: Uuid,
    customer_id: Uuid,
    sale: &SaleInput,
    created_by: Option<Uuid>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO sold_product_details \
         (customer_id, follow_up_id, product_id, product_name, ticket_size, \
          tenure_years, policy_number, policy_enforce_date, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (follow_up_id) DO UPDATE SET \
            product_id = EXCLUDED.product_id, \
            product_name = EXCLUDED.product_name, \
            ticket_size = EXCLUDED.ticket_size, \
            tenure_years = EXCLUDED.tenure_years, \
            policy_number = EXCLUDED.policy_number, \
            policy_enforce_date = EXCLUDED.policy_enforce_date, \
            updated_on = NOW()",
    )
    .bind(customer_id)
    .bind(follow_up_id)
    .bind(sale.product_id)
    .bind(&sale.product_name)
    .bind(sale.ticket_size)
    .bind(sale.tenure_years)
    .bind(&sale.policy_number)
    .bind(sale.policy_enforce_date)
    .bind(created_by)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn delete_by_follow_up(db: &Database, follow_up_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sold_product_details WHERE follow_up_id = $1")
        .bind(follow_up_id)
        .execute(db)
        .await?;
    Ok(())
}

/// Joined listing for the sales report, optionally filtered by customer.
pub async fn list_info(
    db: &Database,
    customer_id: Option<Uuid>,
) -> Result<Vec<SoldProductInfo>, sqlx::Error> {
    let base = "SELECT s.id, s.customer_id, c.name AS customer_name, s.product_name, \
                f.follow_up_date, s.ticket_size, s.tenure_years, s.policy_number, \
                s.policy_enforce_date, u.name AS sold_by \
         FROM sold_product_details s \
         JOIN customers c ON c.id = s.customer_id \
         JOIN follow_ups f ON f.id = s.follow_up_id \
         LEFT JOIN users u ON u.id = s.created_by";
    match customer_id {
        Some(customer_id) => {
            sqlx::query_as::<_, SoldProductInfo>(&format!(
                "{} WHERE s.customer_id = $1 ORDER BY s.policy_enforce_date DESC",
                base
            ))
            .bind(customer_id)
            .fetch_all(db)
            .await
        }
        None => {
            sqlx::query_as::<_, SoldProductInfo>(&format!(
                "{} ORDER BY s.policy_enforce_date DESC",
                base
            ))
            .fetch_all(db)
            .await
        }
    }
}
