use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::models::follow_up::{FollowUpInput, SaleInput};
use crate::repositories::{customers, follow_ups, products, reminders, sold_products};

/// What the sale table should look like after a follow-up save.
#[derive(Debug, Clone, PartialEq)]
pub enum SaleSync {
    Upsert(SaleInput),
    Clear,
}

/// A follow-up carries a sale row only while it is converted with all
/// sale fields present. Anything else clears the row, so unconverting
/// (or blanking a field) removes a previously recorded sale.
pub fn plan_sale_sync(is_converted: Option<bool>, sale: Option<SaleInput>) -> SaleSync {
    match (is_converted, sale) {
        (Some(true), Some(sale)) => SaleSync::Upsert(sale),
        _ => SaleSync::Clear,
    }
}

/// Collapses the optional sale form fields into a complete SaleInput,
/// or None when any of them is missing.
pub fn complete_sale(
    product_id: Option<Uuid>,
    product_name: Option<String>,
    ticket_size: Option<Decimal>,
    tenure_years: Option<i32>,
    policy_number: Option<String>,
    policy_enforce_date: Option<DateTime<Utc>>,
) -> Option<SaleInput> {
    Some(SaleInput {
        product_id: product_id?,
        product_name: product_name.filter(|v| !v.trim().is_empty())?,
        ticket_size: ticket_size?,
        tenure_years: tenure_years?,
        policy_number: policy_number.filter(|v| !v.trim().is_empty())?,
        policy_enforce_date: policy_enforce_date?,
    })
}

/// The customer a sale row belongs to. On update the stored follow-up's
/// customer wins over whatever the form posted, so a forged hidden field
/// cannot point the sale at a different customer.
pub fn sale_customer_id(stored: Option<Uuid>, posted: Uuid) -> Uuid {
    stored.unwrap_or(posted)
}

/// Field errors for a conversion attempt. Empty when the conversion is
/// acceptable as posted.
pub fn validate_conversion(
    ticket_size: Option<Decimal>,
    tenure_years: Option<i32>,
    policy_number: Option<&str>,
    policy_enforce_date: Option<DateTime<Utc>>,
    product_known: bool,
) -> Vec<String> {
    let mut errors = Vec::new();
    if !product_known {
        errors.push("Select a product for the converted policy.".to_string());
    }
    match ticket_size {
        Some(v) if v > Decimal::ZERO => {}
        _ => errors.push("Ticket size must be greater than zero.".to_string()),
    }
    match tenure_years {
        Some(v) if v > 0 => {}
        _ => errors.push("Tenure is required for a converted policy.".to_string()),
    }
    if policy_number.map(str::trim).filter(|v| !v.is_empty()).is_none() {
        errors.push("Policy number is required for a converted policy.".to_string());
    }
    if policy_enforce_date.is_none() {
        errors.push("Policy enforce date is required for a converted policy.".to_string());
    }
    errors
}

/// Creates a follow-up for the customer and keeps the sale table and the
/// reminder queue in step with it.
pub async fn create_follow_up(
    db: &Database,
    user: &CurrentUser,
    input: &FollowUpInput,
    sale: Option<SaleInput>,
) -> AppResult<Uuid> {
    let customer = customers::find_by_id(db, input.customer_id)
        .await?
        .ok_or(AppError::NotFound("Customer"))?;
    if !user.can_access_customer(customer.assigned_employee_id) {
        return Err(AppError::Forbidden);
    }
    let assignee = customer.assigned_employee_id.ok_or_else(|| {
        AppError::Validation(
            "Assign the customer to an employee before recording follow-ups.".to_string(),
        )
    })?;

    let follow_up_id = follow_ups::insert(db, input, Some(user.id)).await?;
    apply_sale_sync(
        db,
        follow_up_id,
        input.customer_id,
        input.is_converted,
        sale,
        Some(user.id),
    )
    .await?;

    // Saving with a reminder requested queues one for the assignee
    if input.reminder_required {
        if let Some(remind_at) = input.next_reminder_at {
            let note = input
                .follow_up_note
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or("Follow-up reminder");
            reminders::insert(db, input.customer_id, assignee, remind_at, Some(note)).await?;
        }
    }

    Ok(follow_up_id)
}

pub async fn update_follow_up(
    db: &Database,
    user: &CurrentUser,
    follow_up_id: Uuid,
    input: &FollowUpInput,
    sale: Option<SaleInput>,
) -> AppResult<()> {
    let existing = follow_ups::find_detail_by_id(db, follow_up_id)
        .await?
        .ok_or(AppError::NotFound("Follow-up"))?;
    let customer = customers::find_by_id(db, existing.customer_id)
        .await?
        .ok_or(AppError::NotFound("Customer"))?;
    if !user.can_access_customer(customer.assigned_employee_id) {
        return Err(AppError::Forbidden);
    }

    follow_ups::update(db, follow_up_id, input).await?;
    // The follow-up stays on its stored customer, and so must the sale row
    let customer_id = sale_customer_id(Some(existing.customer_id), input.customer_id);
    apply_sale_sync(
        db,
        follow_up_id,
        customer_id,
        input.is_converted,
        sale,
        Some(user.id),
    )
    .await
}

async fn apply_sale_sync(
    db: &Database,
    follow_up_id: Uuid,
    customer_id: Uuid,
    is_converted: Option<bool>,
    sale: Option<SaleInput>,
    created_by: Option<Uuid>,
) -> AppResult<()> {
    match plan_sale_sync(is_converted, sale) {
        SaleSync::Upsert(sale) => {
            // The product must still exist at save time
            if products::find_by_id(db, sale.product_id).await?.is_none() {
                return Err(AppError::Validation("Unknown product.".to_string()));
            }
            sold_products::upsert_for_follow_up(db, follow_up_id, customer_id, &sale, created_by)
                .await?;
        }
        SaleSync::Clear => {
            sold_products::delete_by_follow_up(db, follow_up_id).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sale() -> SaleInput {
        SaleInput {
            product_id: Uuid::new_v4(),
            product_name: "Term Life".to_string(),
            ticket_size: Decimal::new(50_000, 0),
            tenure_years: 10,
            policy_number: "POL-1001".to_string(),
            policy_enforce_date: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn converted_with_complete_sale_upserts() {
        let sale = sale();
        assert_eq!(
            plan_sale_sync(Some(true), Some(sale.clone())),
            SaleSync::Upsert(sale)
        );
    }

    #[test]
    fn unconverted_clears_the_sale_row() {
        assert_eq!(plan_sale_sync(Some(false), Some(sale())), SaleSync::Clear);
        assert_eq!(plan_sale_sync(None, Some(sale())), SaleSync::Clear);
    }

    #[test]
    fn converted_without_complete_sale_clears() {
        assert_eq!(plan_sale_sync(Some(true), None), SaleSync::Clear);
    }

    #[test]
    fn complete_sale_requires_every_field() {
        let full = complete_sale(
            Some(Uuid::new_v4()),
            Some("Term Life".to_string()),
            Some(Decimal::new(1000, 0)),
            Some(5),
            Some("POL-1".to_string()),
            Some(Utc::now()),
        );
        assert!(full.is_some());

        let missing_policy = complete_sale(
            Some(Uuid::new_v4()),
            Some("Term Life".to_string()),
            Some(Decimal::new(1000, 0)),
            Some(5),
            Some("   ".to_string()),
            Some(Utc::now()),
        );
        assert!(missing_policy.is_none());
    }

    #[test]
    fn sale_rows_follow_the_stored_customer_on_update() {
        let stored = Uuid::new_v4();
        let posted = Uuid::new_v4();
        // An edit cannot move the sale off the follow-up's own customer
        assert_eq!(sale_customer_id(Some(stored), posted), stored);
        // A fresh follow-up has no stored customer yet
        assert_eq!(sale_customer_id(None, posted), posted);
    }

    #[test]
    fn conversion_validation_flags_each_gap() {
        let errors = validate_conversion(Some(Decimal::ZERO), None, Some(" "), None, false);
        assert_eq!(errors.len(), 5);

        let clean = validate_conversion(
            Some(Decimal::new(1000, 0)),
            Some(5),
            Some("POL-1"),
            Some(Utc::now()),
            true,
        );
        assert!(clean.is_empty());
    }
}
