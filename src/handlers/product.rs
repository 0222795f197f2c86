use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
};
use askama::Template;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    database::Database,
    error::{AppError, AppResult},
    handlers::{require_full_access, require_user},
    models::product::{NewDocument, NewProduct, ProductDisplay},
    repositories::products,
    utils::flash::{redirect_with_error, redirect_with_flash},
};

const MAX_DOCUMENT_BYTES: usize = 20 * 1024 * 1024;

#[derive(Template)]
#[template(path = "products/index.html")]
struct ProductsTemplate {
    products: Vec<ProductDisplay>,
    flash: String,
    error: String,
    can_manage: bool,
}

#[derive(Template)]
#[template(path = "products/form.html")]
struct ProductFormTemplate {
    form: ProductFormData,
    error: String,
    is_edit: bool,
    action: String,
}

#[derive(Debug, Default, Clone)]
pub struct ProductFormData {
    pub name: String,
    pub description: String,
    pub commission_type: String,
    pub commission_value: String,
    pub commission_notes: String,
}

#[derive(Deserialize)]
pub struct ProductsQuery {
    flash: Option<String>,
    error: Option<String>,
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn validate_product_form(form: &ProductFormData) -> Result<NewProduct, String> {
    if form.name.trim().is_empty() {
        return Err("Product name is required.".to_string());
    }
    if form.commission_type.trim().is_empty() {
        return Err("Commission type is required.".to_string());
    }
    let commission_value = match Decimal::from_str(form.commission_value.trim()) {
        Ok(value) if value >= Decimal::ZERO => value,
        _ => {
            return Err(format!(
                "Commission value '{}' is invalid.",
                form.commission_value
            ))
        }
    };
    Ok(NewProduct {
        name: form.name.trim().to_string(),
        description: optional(&form.description),
        commission_type: form.commission_type.trim().to_string(),
        commission_value,
        commission_notes: optional(&form.commission_notes),
    })
}

fn content_type_for(extension: &str) -> Option<&'static str> {
    match extension {
        "pdf" => Some("application/pdf"),
        "doc" => Some("application/msword"),
        "docx" => {
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        }
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

fn upload_dir() -> PathBuf {
    PathBuf::from(env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()))
}

/// Validates and writes one uploaded document to disk.
async fn save_document(original_name: &str, bytes: &[u8]) -> AppResult<NewDocument> {
    let extension = original_name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let content_type = content_type_for(&extension).ok_or_else(|| {
        AppError::Validation(format!(
            "File type of '{}' is not allowed. Allowed: pdf, doc, docx, png, jpg, jpeg.",
            original_name
        ))
    })?;
    if bytes.len() > MAX_DOCUMENT_BYTES {
        return Err(AppError::Validation(format!(
            "'{}' exceeds the 20 MB document limit.",
            original_name
        )));
    }

    let file_name = format!("{}.{}", Uuid::new_v4(), extension);
    let directory = upload_dir();
    tokio::fs::create_dir_all(&directory)
        .await
        .map_err(|err| AppError::Internal(err.into()))?;
    let path = directory.join(&file_name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|err| AppError::Internal(err.into()))?;

    Ok(NewDocument {
        file_name,
        original_file_name: original_name.to_string(),
        content_type: content_type.to_string(),
        file_path: path.to_string_lossy().into_owned(),
        file_size: bytes.len() as i64,
    })
}

struct ProductUpload {
    form: ProductFormData,
    documents: Vec<NewDocument>,
}

async fn read_product_multipart(mut multipart: Multipart) -> AppResult<ProductUpload> {
    let mut form = ProductFormData::default();
    let mut documents = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::Validation("Invalid upload.".to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "documents" {
            let original = field.file_name().unwrap_or_default().to_string();
            if original.is_empty() {
                continue;
            }
            let bytes = field
                .bytes()
                .await
                .map_err(|_| AppError::Validation("Invalid upload.".to_string()))?;
            documents.push(save_document(&original, &bytes).await?);
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|_| AppError::Validation("Invalid upload.".to_string()))?;
        match name.as_str() {
            "name" => form.name = value,
            "description" => form.description = value,
            "commission_type" => form.commission_type = value,
            "commission_value" => form.commission_value = value,
            "commission_notes" => form.commission_notes = value,
            _ => {}
        }
    }

    Ok(ProductUpload { form, documents })
}

pub async fn index(
    cookies: Cookies,
    State(db): State<Database>,
    Query(query): Query<ProductsQuery>,
) -> AppResult<Html<String>> {
    let user = require_user(cookies, &db).await?;

    let mut displays = Vec::new();
    for product in products::list_all(&db).await? {
        let documents = products::documents_for(&db, product.id).await?;
        displays.push(ProductDisplay::from_product(product, documents));
    }

    let template = ProductsTemplate {
        products: displays,
        flash: query.flash.unwrap_or_default(),
        error: query.error.unwrap_or_default(),
        can_manage: user.role.full_access(),
    };
    Ok(Html(template.render().unwrap()))
}

pub async fn create_form(cookies: Cookies, State(db): State<Database>) -> AppResult<Html<String>> {
    let user = require_user(cookies, &db).await?;
    require_full_access(&user)?;
    let template = ProductFormTemplate {
        form: ProductFormData::default(),
        error: String::new(),
        is_edit: false,
        action: "/Product/Create".to_string(),
    };
    Ok(Html(template.render().unwrap()))
}

pub async fn create(
    cookies: Cookies,
    State(db): State<Database>,
    multipart: Multipart,
) -> AppResult<Response> {
    let user = require_user(cookies, &db).await?;
    require_full_access(&user)?;

    let upload = match read_product_multipart(multipart).await {
        Ok(upload) => upload,
        Err(AppError::Validation(message)) => {
            return Ok(redirect_with_error("/Product/Index", &message).into_response())
        }
        Err(err) => return Err(err),
    };

    match validate_product_form(&upload.form) {
        Ok(product) => {
            products::insert_with_documents(&db, &product, &upload.documents).await?;
            Ok(redirect_with_flash("/Product/Index", "Product created.").into_response())
        }
        Err(message) => {
            let template = ProductFormTemplate {
                form: upload.form,
                error: message,
                is_edit: false,
                action: "/Product/Create".to_string(),
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
    let product = products::find_by_id(&db, id)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    let template = ProductFormTemplate {
        form: ProductFormData {
            name: product.name,
            description: product.description.unwrap_or_default(),
            commission_type: product.commission_type,
            commission_value: product.commission_value.to_string(),
            commission_notes: product.commission_notes.unwrap_or_default(),
        },
        error: String::new(),
        is_edit: true,
        action: format!("/Product/Edit/{}", id),
    };
    Ok(Html(template.render().unwrap()))
}

pub async fn edit(
    cookies: Cookies,
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> AppResult<Response> {
    let user = require_user(cookies, &db).await?;
    require_full_access(&user)?;
    if products::find_by_id(&db, id).await?.is_none() {
        return Err(AppError::NotFound("Product"));
    }

    let upload = match read_product_multipart(multipart).await {
        Ok(upload) => upload,
        Err(AppError::Validation(message)) => {
            return Ok(redirect_with_error("/Product/Index", &message).into_response())
        }
        Err(err) => return Err(err),
    };

    match validate_product_form(&upload.form) {
        Ok(product) => {
            products::update(&db, id, &product).await?;
            for document in &upload.documents {
                products::insert_document(&db, id, document).await?;
            }
            Ok(redirect_with_flash("/Product/Index", "Product updated.").into_response())
        }
        Err(message) => {
            let template = ProductFormTemplate {
                form: upload.form,
                error: message,
                is_edit: true,
                action: format!("/Product/Edit/{}", id),
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

    // Remove attachment files first; rows cascade with the product
    for document in products::documents_for(&db, id).await? {
        let _ = tokio::fs::remove_file(&document.file_path).await;
    }
    let deleted = products::delete(&db, id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("Product"));
    }
    Ok(redirect_with_flash("/Product/Index", "Product deleted."))
}

pub async fn preview_document(
    cookies: Cookies,
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let _user = require_user(cookies, &db).await?;
    let document = products::find_document(&db, id)
        .await?
        .ok_or(AppError::NotFound("Document"))?;

    let bytes = tokio::fs::read(&document.file_path)
        .await
        .map_err(|_| AppError::NotFound("Document"))?;
    Ok((
        [
            (header::CONTENT_TYPE, document.content_type.clone()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", document.original_file_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

pub async fn delete_document(
    cookies: Cookies,
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> AppResult<Redirect> {
    let user = require_user(cookies, &db).await?;
    require_full_access(&user)?;
    let document = products::find_document(&db, id)
        .await?
        .ok_or(AppError::NotFound("Document"))?;

    let _ = tokio::fs::remove_file(&document.file_path).await;
    products::delete_document(&db, id).await?;
    Ok(redirect_with_flash("/Product/Index", "Document removed."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commission_value_must_be_a_non_negative_number() {
        let mut form = ProductFormData {
            name: "Term Life".to_string(),
            commission_type: "Percent".to_string(),
            commission_value: "2.5".to_string(),
            ..Default::default()
        };
        assert!(validate_product_form(&form).is_ok());
        form.commission_value = "-1".to_string();
        assert!(validate_product_form(&form).is_err());
        form.commission_value = "lots".to_string();
        assert!(validate_product_form(&form).is_err());
    }

    #[test]
    fn document_types_outside_the_allowlist_are_refused() {
        assert!(content_type_for("pdf").is_some());
        assert!(content_type_for("jpeg").is_some());
        assert!(content_type_for("exe").is_none());
        assert!(content_type_for("svg").is_none());
    }
}
