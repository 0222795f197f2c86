use axum::{
    extract::{Form, Path, Query, State},
    response::{Html, IntoResponse, Response},
};
use askama::Template;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    database::Database,
    error::{AppError, AppResult},
    handlers::require_user,
    models::customer::{CustomerDisplay, CustomerFilter},
    models::follow_up::{FollowUpDisplay, FollowUpInput, SaleInput},
    repositories::{customers, follow_ups, products},
    services::follow_ups as follow_up_service,
    utils::flash::redirect_with_flash,
};

struct ProductOption {
    id: Uuid,
    name: String,
}

#[derive(Template)]
#[template(path = "follow_ups/form.html")]
struct FollowUpFormTemplate {
    form: FollowUpFormData,
    customer_name: String,
    products: Vec<ProductOption>,
    errors: Vec<String>,
    is_edit: bool,
    action: String,
}

#[derive(Template)]
#[template(path = "follow_ups/history.html")]
struct HistoryTemplate {
    customer: CustomerDisplay,
    follow_ups: Vec<FollowUpDisplay>,
    flash: String,
    error: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct FollowUpFormData {
    #[serde(default)]
    pub id: String,
    pub customer_id: Uuid,
    #[serde(default)]
    pub follow_up_date: String,
    #[serde(default)]
    pub insurance_type: String,
    #[serde(default)]
    pub budget: String,
    #[serde(default)]
    pub has_existing_policy: Option<String>,
    #[serde(default)]
    pub follow_up_note: String,
    #[serde(default)]
    pub follow_up_status: String,
    #[serde(default)]
    pub reminder_required: Option<String>,
    #[serde(default)]
    pub next_reminder_at: String,
    #[serde(default)]
    pub is_converted: String,
    #[serde(default)]
    pub conversion_reason: String,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub ticket_size: String,
    #[serde(default)]
    pub tenure_years: String,
    #[serde(default)]
    pub policy_number: String,
    #[serde(default)]
    pub policy_enforce_date: String,
}

impl FollowUpFormData {
    pub fn has_existing_policy_checked(&self) -> bool {
        self.has_existing_policy.is_some()
    }

    pub fn reminder_required_checked(&self) -> bool {
        self.reminder_required.is_some()
    }
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

fn parse_datetime_local(value: &str) -> Option<DateTime<Utc>> {
    let datetime = NaiveDateTime::parse_from_str(value.trim(), "%Y-%m-%dT%H:%M").ok()?;
    Some(Utc.from_utc_datetime(&datetime))
}

struct ParsedFollowUp {
    input: FollowUpInput,
    sale: Option<SaleInput>,
    errors: Vec<String>,
}

/// Turns the posted form into persistable input, collecting conversion
/// errors instead of failing fast so the form can show them all.
async fn parse_follow_up_form(db: &Database, form: &FollowUpFormData) -> AppResult<ParsedFollowUp> {
    let mut errors = Vec::new();

    let follow_up_date = match parse_date(&form.follow_up_date) {
        Some(date) => date,
        None => {
            errors.push("Follow-up date is required.".to_string());
            Utc::now()
        }
    };

    let budget = match optional(&form.budget) {
        None => None,
        Some(text) => match Decimal::from_str(&text) {
            Ok(value) if value >= Decimal::ZERO => Some(value),
            _ => {
                errors.push(format!("Budget value '{}' is invalid.", text));
                None
            }
        },
    };

    let is_converted = match form.is_converted.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    };

    let reminder_required = form.reminder_required_checked();
    let next_reminder_at = optional(&form.next_reminder_at)
        .as_deref()
        .and_then(parse_datetime_local);
    if reminder_required && next_reminder_at.is_none() {
        errors.push("Pick a reminder date and time.".to_string());
    }

    let mut sale = None;
    if is_converted == Some(true) {
        let product_id = optional(&form.product_id).and_then(|v| Uuid::parse_str(&v).ok());
        let product = match product_id {
            Some(id) => products::find_by_id(db, id).await?,
            None => None,
        };
        let ticket_size = optional(&form.ticket_size).and_then(|v| Decimal::from_str(&v).ok());
        let tenure_years = optional(&form.tenure_years).and_then(|v| v.parse::<i32>().ok());
        let policy_enforce_date = optional(&form.policy_enforce_date)
            .as_deref()
            .and_then(parse_date);

        errors.extend(follow_up_service::validate_conversion(
            ticket_size,
            tenure_years,
            optional(&form.policy_number).as_deref(),
            policy_enforce_date,
            product.is_some(),
        ));

        if let Some(product) = product {
            sale = follow_up_service::complete_sale(
                Some(product.id),
                Some(product.name),
                ticket_size,
                tenure_years,
                optional(&form.policy_number),
                policy_enforce_date,
            );
        }
    }

    // Conversion fields are dropped when the follow-up is not converted
    let conversion_reason = if is_converted.is_some() {
        optional(&form.conversion_reason)
    } else {
        None
    };

    Ok(ParsedFollowUp {
        input: FollowUpInput {
            customer_id: form.customer_id,
            follow_up_date,
            insurance_type: optional(&form.insurance_type),
            budget,
            has_existing_policy: form.has_existing_policy_checked(),
            follow_up_note: optional(&form.follow_up_note),
            follow_up_status: optional(&form.follow_up_status),
            next_reminder_at,
            reminder_required,
            is_converted,
            conversion_reason,
        },
        sale,
        errors,
    })
}

async fn product_options(db: &Database) -> AppResult<Vec<ProductOption>> {
    Ok(products::list_all(db)
        .await?
        .into_iter()
        .map(|product| ProductOption {
            id: product.id,
            name: product.name,
        })
        .collect())
}

async fn customer_checked(
    db: &Database,
    cookies_user: &crate::middleware::CurrentUser,
    customer_id: Uuid,
) -> AppResult<CustomerDisplay> {
    let customer = customers::find_with_assignee(db, customer_id)
        .await?
        .ok_or(AppError::NotFound("Customer"))?;
    if !cookies_user.can_access_customer(customer.assigned_employee_id) {
        return Err(AppError::Forbidden);
    }
    Ok(CustomerDisplay::from(customer))
}

pub async fn add_form(
    cookies: Cookies,
    State(db): State<Database>,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Html<String>> {
    let user = require_user(cookies, &db).await?;
    let customer = customer_checked(&db, &user, customer_id).await?;

    let template = FollowUpFormTemplate {
        form: FollowUpFormData {
            customer_id,
            follow_up_date: Utc::now().format("%Y-%m-%d").to_string(),
            ..Default::default()
        },
        customer_name: customer.name,
        products: product_options(&db).await?,
        errors: Vec::new(),
        is_edit: false,
        action: "/FollowUp/Add".to_string(),
    };
    Ok(Html(template.render().unwrap()))
}

pub async fn add(
    cookies: Cookies,
    State(db): State<Database>,
    Form(form): Form<FollowUpFormData>,
) -> AppResult<Response> {
    let user = require_user(cookies, &db).await?;
    let customer = customer_checked(&db, &user, form.customer_id).await?;

    let parsed = parse_follow_up_form(&db, &form).await?;
    if !parsed.errors.is_empty() {
        let template = FollowUpFormTemplate {
            form,
            customer_name: customer.name,
            products: product_options(&db).await?,
            errors: parsed.errors,
            is_edit: false,
            action: "/FollowUp/Add".to_string(),
        };
        return Ok(Html(template.render().unwrap()).into_response());
    }

    match follow_up_service::create_follow_up(&db, &user, &parsed.input, parsed.sale).await {
        Ok(_) => Ok(redirect_with_flash(
            &format!("/FollowUp/History/{}", form.customer_id),
            "Follow-up recorded.",
        )
        .into_response()),
        Err(AppError::Validation(message)) => {
            let template = FollowUpFormTemplate {
                form,
                customer_name: customer.name,
                products: product_options(&db).await?,
                errors: vec![message],
                is_edit: false,
                action: "/FollowUp/Add".to_string(),
            };
            Ok(Html(template.render().unwrap()).into_response())
        }
        Err(err) => Err(err),
    }
}

pub async fn edit_form(
    cookies: Cookies,
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> AppResult<Html<String>> {
    let user = require_user(cookies, &db).await?;
    let detail = follow_ups::find_detail_by_id(&db, id)
        .await?
        .ok_or(AppError::NotFound("Follow-up"))?;
    customer_checked(&db, &user, detail.customer_id).await?;

    let display = FollowUpDisplay::from(detail);
    let template = FollowUpFormTemplate {
        form: FollowUpFormData {
            id: display.id.to_string(),
            customer_id: display.customer_id,
            follow_up_date: display.follow_up_date.clone(),
            insurance_type: display.insurance_type.clone(),
            budget: display.budget.clone(),
            has_existing_policy: display.has_existing_policy.then(|| "on".to_string()),
            follow_up_note: display.follow_up_note.clone(),
            follow_up_status: display.follow_up_status.clone(),
            reminder_required: display.reminder_required.then(|| "on".to_string()),
            next_reminder_at: display.next_reminder_at.clone(),
            is_converted: if display.is_converted {
                "true".to_string()
            } else {
                String::new()
            },
            conversion_reason: display.conversion_reason.clone(),
            product_id: display.sold_product_id.clone(),
            ticket_size: display.ticket_size.clone(),
            tenure_years: display.tenure_years.clone(),
            policy_number: display.policy_number.clone(),
            policy_enforce_date: display.policy_enforce_date.clone(),
        },
        customer_name: display.customer_name,
        products: product_options(&db).await?,
        errors: Vec::new(),
        is_edit: true,
        action: "/FollowUp/Edit".to_string(),
    };
    Ok(Html(template.render().unwrap()))
}

pub async fn edit(
    cookies: Cookies,
    State(db): State<Database>,
    Form(form): Form<FollowUpFormData>,
) -> AppResult<Response> {
    let user = require_user(cookies, &db).await?;
    let customer = customer_checked(&db, &user, form.customer_id).await?;
    let follow_up_id = Uuid::parse_str(form.id.trim())
        .map_err(|_| AppError::NotFound("Follow-up"))?;

    let parsed = parse_follow_up_form(&db, &form).await?;
    if !parsed.errors.is_empty() {
        let template = FollowUpFormTemplate {
            form,
            customer_name: customer.name,
            products: product_options(&db).await?,
            errors: parsed.errors,
            is_edit: true,
            action: "/FollowUp/Edit".to_string(),
        };
        return Ok(Html(template.render().unwrap()).into_response());
    }

    follow_up_service::update_follow_up(&db, &user, follow_up_id, &parsed.input, parsed.sale)
        .await?;
    Ok(redirect_with_flash(
        &format!("/FollowUp/History/{}", form.customer_id),
        "Follow-up updated.",
    )
    .into_response())
}

pub async fn history(
    cookies: Cookies,
    State(db): State<Database>,
    Path(customer_id): Path<Uuid>,
    Query(filter): Query<CustomerFilter>,
) -> AppResult<Html<String>> {
    let user = require_user(cookies, &db).await?;
    let customer = customer_checked(&db, &user, customer_id).await?;

    let rows = follow_ups::history_for_customer(&db, customer_id).await?;
    let template = HistoryTemplate {
        customer,
        follow_ups: rows.into_iter().map(FollowUpDisplay::from).collect(),
        flash: filter.flash.unwrap_or_default(),
        error: filter.error.unwrap_or_default(),
    };
    Ok(Html(template.render().unwrap()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_parse_from_form_formats() {
        assert!(parse_date("2026-08-30").is_some());
        assert!(parse_date("30/08/2026").is_none());
        assert!(parse_datetime_local("2026-08-30T14:30").is_some());
        assert!(parse_datetime_local("2026-08-30").is_none());
    }

    #[test]
    fn checkbox_presence_maps_to_bool() {
        let mut form = FollowUpFormData {
            customer_id: Uuid::new_v4(),
            ..Default::default()
        };
        assert!(!form.reminder_required_checked());
        form.reminder_required = Some("on".to_string());
        assert!(form.reminder_required_checked());
    }
}
