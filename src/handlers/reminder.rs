use axum::{
    extract::{Form, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    database::Database,
    error::{AppError, AppResult},
    handlers::require_user,
    repositories::reminders,
};

#[derive(Serialize)]
pub struct DueReminderPayload {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_mobile: String,
    pub remind_at: String,
    pub note: String,
}

/// Polled by the layout script; returns the caller's due reminders.
pub async fn get_due_reminders(
    cookies: Cookies,
    State(db): State<Database>,
) -> AppResult<Json<Vec<DueReminderPayload>>> {
    let user = require_user(cookies, &db).await?;

    let due = reminders::due_for_employee(&db, user.id).await?;
    let payload = due
        .into_iter()
        .map(|reminder| DueReminderPayload {
            id: reminder.id,
            customer_id: reminder.customer_id,
            customer_name: reminder.customer_name,
            customer_mobile: reminder.customer_mobile,
            remind_at: reminder.remind_at.format("%Y-%m-%d %H:%M").to_string(),
            note: reminder.note.unwrap_or_default(),
        })
        .collect();
    Ok(Json(payload))
}

#[derive(Deserialize)]
pub struct MarkShownForm {
    id: Uuid,
}

pub async fn mark_as_shown(
    cookies: Cookies,
    State(db): State<Database>,
    Form(form): Form<MarkShownForm>,
) -> AppResult<Json<serde_json::Value>> {
    let user = require_user(cookies, &db).await?;

    // Scoped to the caller so one employee cannot dismiss another's reminder
    let updated = reminders::mark_shown(&db, form.id, user.id).await?;
    if updated == 0 {
        return Err(AppError::NotFound("Reminder"));
    }
    Ok(Json(serde_json::json!({ "success": true })))
}
