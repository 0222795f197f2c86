use axum::{extract::State, response::Html};
use askama::Template;
use tower_cookies::Cookies;

use crate::{
    database::Database,
    error::AppResult,
    handlers::require_user,
    services::dashboard,
};

struct ReminderRow {
    customer_name: String,
    customer_mobile: String,
    remind_at: String,
    note: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    user_name: String,
    role_name: String,
    todays_reminders: Vec<ReminderRow>,
    todays_call_count: i64,
    assigned_customer_count: i64,
    total_customer_count: i64,
    has_total: bool,
    has_full_access: bool,
}

pub async fn dashboard(
    cookies: Cookies,
    State(db): State<Database>,
) -> AppResult<Html<String>> {
    let user = require_user(cookies, &db).await?;
    let data = dashboard::dashboard_for(&db, user.scope_employee_id()).await?;

    let todays_reminders = data
        .todays_reminders
        .into_iter()
        .map(|reminder| ReminderRow {
            customer_name: reminder.customer_name,
            customer_mobile: reminder.customer_mobile,
            remind_at: reminder.remind_at.format("%H:%M").to_string(),
            note: reminder.note.unwrap_or_default(),
        })
        .collect();

    let template = DashboardTemplate {
        user_name: user.name.clone(),
        role_name: user.role_name.clone(),
        todays_reminders,
        todays_call_count: data.todays_call_count,
        assigned_customer_count: data.assigned_customer_count,
        total_customer_count: data.total_customer_count.unwrap_or_default(),
        has_total: data.total_customer_count.is_some(),
        has_full_access: user.role.full_access(),
    };
    Ok(Html(template.render().unwrap()))
}
