use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Follow-up with the linked sale columns joined from sold_product_details.
/// Reads always come through this shape so the edit form and the history
/// page see the conversion fields without a second query.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct FollowUpDetail {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub follow_up_date: DateTime<Utc>,
    pub insurance_type: Option<String>,
    pub budget: Option<Decimal>,
    pub has_existing_policy: bool,
    pub follow_up_note: Option<String>,
    pub follow_up_status: Option<String>,
    pub next_reminder_at: Option<DateTime<Utc>>,
    pub reminder_required: bool,
    pub is_converted: Option<bool>,
    pub conversion_reason: Option<String>,
    pub sold_product_id: Option<Uuid>,
    pub sold_product_name: Option<String>,
    pub ticket_size: Option<Decimal>,
    pub tenure_years: Option<i32>,
    pub policy_number: Option<String>,
    pub policy_enforce_date: Option<DateTime<Utc>>,
}

/// Flattened for templates.
#[derive(Debug, Serialize, Deserialize)]
pub struct FollowUpDisplay {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub follow_up_date: String,
    pub insurance_type: String,
    pub budget: String,
    pub has_existing_policy: bool,
    pub follow_up_note: String,
    pub follow_up_status: String,
    pub next_reminder_at: String,
    pub reminder_required: bool,
    pub is_converted: bool,
    pub conversion_reason: String,
    pub sold_product_id: String,
    pub sold_product_name: String,
    pub ticket_size: String,
    pub tenure_years: String,
    pub policy_number: String,
    pub policy_enforce_date: String,
}

impl From<FollowUpDetail> for FollowUpDisplay {
    fn from(row: FollowUpDetail) -> Self {
        Self {
            id: row.id,
            customer_id: row.customer_id,
            customer_name: row.customer_name,
            follow_up_date: row.follow_up_date.format("%Y-%m-%d").to_string(),
            insurance_type: row.insurance_type.unwrap_or_default(),
            budget: row.budget.map(|v| v.to_string()).unwrap_or_default(),
            has_existing_policy: row.has_existing_policy,
            follow_up_note: row.follow_up_note.unwrap_or_default(),
            follow_up_status: row.follow_up_status.unwrap_or_default(),
            next_reminder_at: row
                .next_reminder_at
                .map(|v| v.format("%Y-%m-%dT%H:%M").to_string())
                .unwrap_or_default(),
            reminder_required: row.reminder_required,
            is_converted: row.is_converted.unwrap_or(false),
            conversion_reason: row.conversion_reason.unwrap_or_default(),
            sold_product_id: row
                .sold_product_id
                .map(|v| v.to_string())
                .unwrap_or_default(),
            sold_product_name: row.sold_product_name.unwrap_or_default(),
            ticket_size: row.ticket_size.map(|v| v.to_string()).unwrap_or_default(),
            tenure_years: row
                .tenure_years
                .map(|v| v.to_string())
                .unwrap_or_default(),
            policy_number: row.policy_number.unwrap_or_default(),
            policy_enforce_date: row
                .policy_enforce_date
                .map(|v| v.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }
}

/// Validated follow-up fields ready to persist, produced by the service
/// layer from the posted form.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowUpInput {
    pub customer_id: Uuid,
    pub follow_up_date: DateTime<Utc>,
    pub insurance_type: Option<String>,
    pub budget: Option<Decimal>,
    pub has_existing_policy: bool,
    pub follow_up_note: Option<String>,
    pub follow_up_status: Option<String>,
    pub next_reminder_at: Option<DateTime<Utc>>,
    pub reminder_required: bool,
    pub is_converted: Option<bool>,
    pub conversion_reason: Option<String>,
}

/// Sale fields that accompany a converted follow-up.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleInput {
    pub product_id: Uuid,
    pub product_name: String,
    pub ticket_size: Decimal,
    pub tenure_years: i32,
    pub policy_number: String,
    pub policy_enforce_date: DateTime<Utc>,
}

/// Due-reminder poll payload, with customer contact details joined in.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct DueReminder {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_mobile: String,
    pub remind_at: DateTime<Utc>,
    pub note: Option<String>,
}
