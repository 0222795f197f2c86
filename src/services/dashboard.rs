use chrono::Utc;
use uuid::Uuid;

use crate::database::Database;
use crate::error::AppResult;
use crate::models::DueReminder;
use crate::repositories::{customers, follow_ups, reminders};

pub struct DashboardData {
    pub todays_reminders: Vec<DueReminder>,
    pub todays_call_count: i64,
    pub assigned_customer_count: i64,
    /// Agency-wide total; only populated for full-access roles.
    pub total_customer_count: Option<i64>,
}

/// Dashboard numbers for one employee, or agency-wide when `employee_id`
/// is None. The reads are independent and run concurrently.
pub async fn dashboard_for(
    db: &Database,
    employee_id: Option<Uuid>,
) -> AppResult<DashboardData> {
    let today = Utc::now().date_naive();

    match employee_id {
        Some(employee_id) => {
            let (todays_reminders, todays_call_count, assigned_customer_count) = tokio::try_join!(
                reminders::on_day(db, today, Some(employee_id)),
                follow_ups::call_count_on(db, today, Some(employee_id)),
                customers::assigned_count(db, employee_id),
            )?;
            Ok(DashboardData {
                todays_reminders,
                todays_call_count,
                assigned_customer_count,
                total_customer_count: None,
            })
        }
        None => {
            let (todays_reminders, todays_call_count, total) = tokio::try_join!(
                reminders::on_day(db, today, None),
                follow_ups::call_count_on(db, today, None),
                customers::total_count(db),
            )?;
            Ok(DashboardData {
                todays_reminders,
                todays_call_count,
                assigned_customer_count: total,
                total_customer_count: Some(total),
            })
        }
    }
}
