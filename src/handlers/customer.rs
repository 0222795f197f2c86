use axum::{
    extract::{Form, Multipart, Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
};
use askama::Template;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    database::Database,
    error::{AppError, AppResult},
    export,
    handlers::{parse_form_pairs, require_full_access, require_user},
    import,
    models::customer::{CustomerDisplay, CustomerFilter, NewCustomer},
    repositories::{customers, users},
    services,
    utils::flash::{redirect_with_error, redirect_with_flash},
};

#[derive(Template)]
#[template(path = "customers/index.html")]
struct CustomersTemplate {
    customers: Vec<CustomerDisplay>,
    search_term: String,
    location: String,
    insurance_type: String,
    assignment: String,
    flash: String,
    error: String,
    can_manage: bool,
}

#[derive(Template)]
#[template(path = "customers/form.html")]
struct CustomerFormTemplate {
    form: CustomerFormData,
    error: String,
    is_edit: bool,
    action: String,
}

#[derive(Template)]
#[template(path = "customers/assign.html")]
struct AssignTemplate {
    customer: CustomerDisplay,
    employees: Vec<EmployeeOption>,
}

#[derive(Template)]
#[template(path = "customers/bulk_assign.html")]
struct BulkAssignTemplate {
    customers: Vec<CustomerDisplay>,
    employees: Vec<EmployeeOption>,
    flash: String,
    error: String,
}

struct EmployeeOption {
    id: Uuid,
    name: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct CustomerFormData {
    pub name: String,
    pub email: String,
    pub mobile_number: String,
    pub location: String,
    #[serde(default)]
    pub insurance_type: String,
    #[serde(default)]
    pub income: String,
    #[serde(default)]
    pub source_of_income: String,
    #[serde(default)]
    pub family_members: String,
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Form-level validation; the first problem wins.
fn validate_customer_form(form: &CustomerFormData) -> Result<NewCustomer, String> {
    if form.name.trim().is_empty() {
        return Err("Name is required.".to_string());
    }
    if form.email.trim().is_empty() {
        return Err("Email is required.".to_string());
    }
    if form.mobile_number.trim().is_empty() {
        return Err("Mobile number is required.".to_string());
    }
    if form.location.trim().is_empty() {
        return Err("Location is required.".to_string());
    }

    let income = match optional(&form.income) {
        None => None,
        Some(text) => match Decimal::from_str(&text) {
            Ok(value) if value >= Decimal::ZERO => Some(value),
            _ => return Err(format!("Income value '{}' is invalid.", text)),
        },
    };
    let family_members = match optional(&form.family_members) {
        None => None,
        Some(text) => match text.parse::<i32>() {
            Ok(value) if (0..=50).contains(&value) => Some(value),
            _ => return Err(format!("Family members value '{}' is invalid.", text)),
        },
    };

    Ok(NewCustomer {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        mobile_number: form.mobile_number.trim().to_string(),
        location: form.location.trim().to_string(),
        insurance_type: optional(&form.insurance_type),
        income,
        source_of_income: optional(&form.source_of_income),
        family_members,
    })
}

pub async fn index(
    cookies: Cookies,
    State(db): State<Database>,
    Query(filter): Query<CustomerFilter>,
) -> AppResult<Html<String>> {
    let user = require_user(cookies, &db).await?;
    let rows =
        services::customers::customers_for_user(&db, user.role, user.id, &filter).await?;

    let template = CustomersTemplate {
        customers: rows.into_iter().map(CustomerDisplay::from).collect(),
        search_term: filter.search_term.clone().unwrap_or_default(),
        location: filter.location.clone().unwrap_or_default(),
        insurance_type: filter.insurance_type.clone().unwrap_or_default(),
        assignment: filter.assignment.clone().unwrap_or_default(),
        flash: filter.flash.clone().unwrap_or_default(),
        error: filter.error.clone().unwrap_or_default(),
        can_manage: user.role.full_access(),
    };
    Ok(Html(template.render().unwrap()))
}

pub async fn add_form(cookies: Cookies, State(db): State<Database>) -> AppResult<Html<String>> {
    let user = require_user(cookies, &db).await?;
    require_full_access(&user)?;
    let template = CustomerFormTemplate {
        form: CustomerFormData::default(),
        error: String::new(),
        is_edit: false,
        action: "/Customer/Add".to_string(),
    };
    Ok(Html(template.render().unwrap()))
}

pub async fn add(
    cookies: Cookies,
    State(db): State<Database>,
    Form(form): Form<CustomerFormData>,
) -> AppResult<Response> {
    let user = require_user(cookies, &db).await?;
    require_full_access(&user)?;

    match validate_customer_form(&form) {
        Ok(customer) => {
            customers::insert(&db, &customer, Some(user.id)).await?;
            Ok(redirect_with_flash("/Customer/Index", "Customer added.").into_response())
        }
        Err(message) => {
            let template = CustomerFormTemplate {
                form,
                error: message,
                is_edit: false,
                action: "/Customer/Add".to_string(),
            };
            Ok(Html(template.render().unwrap()).into_response())
        }
    }
}

pub async fn edit_form(
    cookies: Cookies,
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> AppResult<Html<String>> {
    let user = require_user(cookies, &db).await?;
    require_full_access(&user)?;
    let customer = customers::find_by_id(&db, id)
        .await?
        .ok_or(AppError::NotFound("Customer"))?;

    let template = CustomerFormTemplate {
        form: CustomerFormData {
            name: customer.name,
            email: customer.email,
            mobile_number: customer.mobile_number,
            location: customer.location,
            insurance_type: customer.insurance_type.unwrap_or_default(),
            income: customer.income.map(|v| v.to_string()).unwrap_or_default(),
            source_of_income: customer.source_of_income.unwrap_or_default(),
            family_members: customer
                .family_members
                .map(|v| v.to_string())
                .unwrap_or_default(),
        },
        error: String::new(),
        is_edit: true,
        action: format!("/Customer/Edit/{}", id),
    };
    Ok(Html(template.render().unwrap()))
}

pub async fn edit(
    cookies: Cookies,
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Form(form): Form<CustomerFormData>,
) -> AppResult<Response> {
    let user = require_user(cookies, &db).await?;
    require_full_access(&user)?;
    if customers::find_by_id(&db, id).await?.is_none() {
        return Err(AppError::NotFound("Customer"));
    }

    match validate_customer_form(&form) {
        Ok(customer) => {
            customers::update(&db, id, &customer).await?;
            Ok(redirect_with_flash("/Customer/Index", "Customer updated.").into_response())
        }
        Err(message) => {
            let template = CustomerFormTemplate {
                form,
                error: message,
                is_edit: true,
                action: format!("/Customer/Edit/{}", id),
            };
            Ok(Html(template.render().unwrap()).into_response())
        }
    }
}

pub async fn delete(
    cookies: Cookies,
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> AppResult<Redirect> {
    let user = require_user(cookies, &db).await?;
    require_full_access(&user)?;
    let deleted = customers::delete(&db, id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("Customer"));
    }
    Ok(redirect_with_flash("/Customer/Index", "Customer deleted."))
}

async fn load_employee_options(db: &Database) -> AppResult<Vec<EmployeeOption>> {
    Ok(users::list_active_employees(db)
        .await?
        .into_iter()
        .map(|employee| EmployeeOption {
            id: employee.id,
            name: employee.name,
        })
        .collect())
}

pub async fn assign_form(
    cookies: Cookies,
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> AppResult<Html<String>> {
    let user = require_user(cookies, &db).await?;
    require_full_access(&user)?;

    let customer = customers::find_with_assignee(&db, id)
        .await?
        .ok_or(AppError::NotFound("Customer"))?;

    let template = AssignTemplate {
        customer: CustomerDisplay::from(customer),
        employees: load_employee_options(&db).await?,
    };
    Ok(Html(template.render().unwrap()))
}

#[derive(Deserialize)]
pub struct AssignForm {
    employee_id: Uuid,
}

pub async fn assign(
    cookies: Cookies,
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Form(form): Form<AssignForm>,
) -> AppResult<Redirect> {
    let user = require_user(cookies, &db).await?;
    require_full_access(&user)?;

    match services::customers::assign_customers(&db, &[id], form.employee_id).await {
        Ok(_) => Ok(redirect_with_flash("/Customer/Index", "Customer assigned.")),
        Err(AppError::Validation(message)) => {
            Ok(redirect_with_error("/Customer/Index", &message))
        }
        Err(err) => Err(err),
    }
}

pub async fn bulk_assign_form(
    cookies: Cookies,
    State(db): State<Database>,
    Query(filter): Query<CustomerFilter>,
) -> AppResult<Html<String>> {
    let user = require_user(cookies, &db).await?;
    require_full_access(&user)?;

    let rows = customers::list(&db, None, &CustomerFilter::default()).await?;
    let template = BulkAssignTemplate {
        customers: rows.into_iter().map(CustomerDisplay::from).collect(),
        employees: load_employee_options(&db).await?,
        flash: filter.flash.unwrap_or_default(),
        error: filter.error.unwrap_or_default(),
    };
    Ok(Html(template.render().unwrap()))
}

/// The checkbox list repeats customer_ids, so the body is parsed by hand.
pub async fn bulk_assign(
    cookies: Cookies,
    State(db): State<Database>,
    body: String,
) -> AppResult<Redirect> {
    let user = require_user(cookies, &db).await?;
    require_full_access(&user)?;

    let pairs = parse_form_pairs(&body);
    let customer_ids: Vec<Uuid> = pairs
        .iter()
        .filter(|(key, _)| key == "customer_ids")
        .filter_map(|(_, value)| Uuid::parse_str(value).ok())
        .collect();
    let employee_id = pairs
        .iter()
        .find(|(key, _)| key == "employee_id")
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
        .ok_or_else(|| AppError::Validation("Select an employee.".to_string()))?;

    match services::customers::assign_customers(&db, &customer_ids, employee_id).await {
        Ok(count) => Ok(redirect_with_flash(
            "/Customer/BulkAssign",
            &format!("{} customer(s) assigned.", count),
        )),
        Err(AppError::Validation(message)) => {
            Ok(redirect_with_error("/Customer/BulkAssign", &message))
        }
        Err(err) => Err(err),
    }
}

pub async fn bulk_upload(
    cookies: Cookies,
    State(db): State<Database>,
    mut multipart: Multipart,
) -> AppResult<Redirect> {
    let user = require_user(cookies, &db).await?;
    require_full_access(&user)?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::Validation("Invalid upload.".to_string()))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|_| AppError::Validation("Invalid upload.".to_string()))?;
            upload = Some((file_name, bytes.to_vec()));
        }
    }
    let Some((file_name, bytes)) = upload else {
        return Ok(redirect_with_error("/Customer/Index", "Choose a file to upload."));
    };

    let outcome = match import::parse_customers(&file_name, &bytes) {
        Ok(outcome) => outcome,
        Err(AppError::Import(message)) => {
            return Ok(redirect_with_error("/Customer/Index", &message));
        }
        Err(err) => return Err(err),
    };

    for customer in &outcome.customers {
        customers::insert(&db, customer, Some(user.id)).await?;
    }

    let mut message = format!(
        "{} uploaded, {} skipped.",
        outcome.customers.len(),
        outcome.errors.len()
    );
    if !outcome.errors.is_empty() {
        let shown = outcome.errors.iter().take(5).cloned().collect::<Vec<_>>();
        message.push(' ');
        message.push_str(&shown.join(" "));
        if outcome.errors.len() > 5 {
            message.push_str(&format!(" ...and {} more.", outcome.errors.len() - 5));
        }
    }
    log::info!(
        "Imported {} customers ({} rows skipped) from {}",
        outcome.customers.len(),
        outcome.errors.len(),
        file_name
    );
    Ok(redirect_with_flash("/Customer/Index", &message))
}

#[derive(Deserialize)]
pub struct ExportQuery {
    format: Option<String>,
}

pub async fn export_customers(
    cookies: Cookies,
    State(db): State<Database>,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    let user = require_user(cookies, &db).await?;
    require_full_access(&user)?;
    let format = export::ExportFormat::parse(query.format.as_deref())?;

    let rows = services::customers::customers_for_user(
        &db,
        user.role,
        user.id,
        &CustomerFilter::default(),
    )
    .await?;
    let displays: Vec<CustomerDisplay> =
        rows.into_iter().map(CustomerDisplay::from).collect();

    let bytes = match format {
        export::ExportFormat::Excel => export::customers_excel(&displays)?,
        export::ExportFormat::Pdf => export::customers_pdf(&displays)?,
    };
    Ok(file_response(format, "customers", bytes))
}

pub async fn download_template(
    cookies: Cookies,
    State(db): State<Database>,
) -> AppResult<Response> {
    let user = require_user(cookies, &db).await?;
    require_full_access(&user)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"customer_template.csv\"".to_string(),
            ),
        ],
        export::CUSTOMER_TEMPLATE_CSV,
    )
        .into_response())
}

pub(crate) fn file_response(
    format: export::ExportFormat,
    stem: &str,
    bytes: Vec<u8>,
) -> Response {
    (
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", format.file_name(stem)),
            ),
        ],
        bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_form() -> CustomerFormData {
        CustomerFormData {
            name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            mobile_number: "9800000001".to_string(),
            location: "Mumbai".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn valid_form_maps_to_new_customer() {
        let mut form = base_form();
        form.income = "98000.50".to_string();
        form.family_members = "4".to_string();
        let customer = validate_customer_form(&form).unwrap();
        assert_eq!(customer.income, Some(Decimal::from_str("98000.50").unwrap()));
        assert_eq!(customer.family_members, Some(4));
        assert_eq!(customer.insurance_type, None);
    }

    #[test]
    fn first_missing_field_is_reported() {
        let mut form = base_form();
        form.name = "  ".to_string();
        form.email = String::new();
        assert_eq!(
            validate_customer_form(&form).unwrap_err(),
            "Name is required."
        );
    }

    #[test]
    fn family_members_outside_range_is_rejected() {
        let mut form = base_form();
        form.family_members = "51".to_string();
        assert!(validate_customer_form(&form)
            .unwrap_err()
            .contains("Family members"));
    }

    #[test]
    fn negative_income_is_rejected() {
        let mut form = base_form();
        form.income = "-5".to_string();
        assert!(validate_customer_form(&form).unwrap_err().contains("Income"));
    }
}
