use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub commission_type: String,
    pub commission_value: Decimal,
    pub commission_notes: Option<String>,
    pub created_on: DateTime<Utc>,
    pub updated_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductDisplay {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub commission_type: String,
    pub commission_value: String,
    pub commission_notes: String,
    pub created_on: String,
    pub documents: Vec<ProductDocument>,
}

impl ProductDisplay {
    pub fn from_product(product: Product, documents: Vec<ProductDocument>) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description.unwrap_or_default(),
            commission_type: product.commission_type,
            commission_value: product.commission_value.to_string(),
            commission_notes: product.commission_notes.unwrap_or_default(),
            created_on: product.created_on.format("%Y-%m-%d").to_string(),
            documents,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductDocument {
    pub id: Uuid,
    pub product_id: Uuid,
    pub file_name: String,
    pub original_file_name: String,
    pub content_type: String,
    pub file_path: String,
    pub file_size: i64,
    pub uploaded_on: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub commission_type: String,
    pub commission_value: Decimal,
    pub commission_notes: Option<String>,
}

/// A document already written to disk, waiting for its database row.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub file_name: String,
    pub original_file_name: String,
    pub content_type: String,
    pub file_path: String,
    pub file_size: i64,
}

/// Joined row for the sold-product report.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct SoldProductInfo {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub product_name: String,
    pub follow_up_date: DateTime<Utc>,
    pub ticket_size: Decimal,
    pub tenure_years: i32,
    pub policy_number: String,
    pub policy_enforce_date: DateTime<Utc>,
    pub sold_by: Option<String>,
}
