use axum::{
    extract::{Query, State},
    response::Html,
};
use askama::Template;
use serde::Deserialize;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    database::Database,
    error::AppResult,
    handlers::{require_full_access, require_user},
    repositories::sold_products,
};

struct SoldProductRow {
    customer_name: String,
    product_name: String,
    follow_up_date: String,
    ticket_size: String,
    tenure_years: i32,
    policy_number: String,
    policy_enforce_date: String,
    sold_by: String,
}

#[derive(Template)]
#[template(path = "sold_products/index.html")]
struct SoldProductsTemplate {
    sales: Vec<SoldProductRow>,
}

#[derive(Deserialize)]
pub struct SoldProductQuery {
    customer_id: Option<Uuid>,
}

pub async fn index(
    cookies: Cookies,
    State(db): State<Database>,
    Query(query): Query<SoldProductQuery>,
) -> AppResult<Html<String>> {
    let user = require_user(cookies, &db).await?;
    require_full_access(&user)?;

    let rows = sold_products::list_info(&db, query.customer_id).await?;
    let sales = rows
        .into_iter()
        .map(|row| SoldProductRow {
            customer_name: row.customer_name,
            product_name: row.product_name,
            follow_up_date: row.follow_up_date.format("%Y-%m-%d").to_string(),
            ticket_size: row.ticket_size.to_string(),
            tenure_years: row.tenure_years,
            policy_number: row.policy_number,
            policy_enforce_date: row.policy_enforce_date.format("%Y-%m-%d").to_string(),
            sold_by: row.sold_by.unwrap_or_default(),
        })
        .collect();

    let template = SoldProductsTemplate { sales };
    Ok(Html(template.render().unwrap()))
}
