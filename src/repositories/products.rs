use uuid::Uuid;

use crate::database::Database;
use crate::models::product::{NewDocument, NewProduct, Product, ProductDocument};

pub async fn list_all(db: &Database) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY name")
        .fetch_all(db)
        .await
}

pub async fn find_by_id(db: &Database, id: Uuid) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Product and its documents go in together; if any document row fails
/// the whole insert rolls back.
pub async fn insert_with_documents(
    db: &Database,
    product: &NewProduct,
    documents: &[NewDocument],
) -> Result<Uuid, sqlx::Error> {
    let mut tx = db.begin().await?;

    let product_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO products \
         (name, description, commission_type, commission_value, commission_notes) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(&product.name)
    .bind(&product.description)
    .bind(&product.commission_type)
    .bind(product.commission_value)
    .bind(&product.commission_notes)
    .fetch_one(&mut *tx)
    .await?;

    for document in documents {
        sqlx::query(
            "INSERT INTO product_documents \
             (product_id, file_name, original_file_name, content_type, file_path, file_size) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(product_id)
        .bind(&document.file_name)
        .bind(&document.original_file_name)
        .bind(&document.content_type)
        .bind(&document.file_path)
        .bind(document.file_size)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(product_id)
}

pub async fn update(db: &Database, id: Uuid, product: &NewProduct) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE products SET name = $2, description = $3, commission_type = $4, \
         commission_value = $5, commission_notes = $6, updated_on = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(&product.commission_type)
    .bind(product.commission_value)
    .bind(&product.commission_notes)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn delete(db: &Database, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn insert_document(
    db: &Database,
    product_id: Uuid,
    document: &NewDocument,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO product_documents \
         (product_id, file_name, original_file_name, content_type, file_path, file_size) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(product_id)
    .bind(&document.file_name)
    .bind(&document.original_file_name)
    .bind(&document.content_type)
    .bind(&document.file_path)
    .bind(document.file_size)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn documents_for(
    db: &Database,
    product_id: Uuid,
) -> Result<Vec<ProductDocument>, sqlx::Error> {
    sqlx::query_as::<_, ProductDocument>(
        "SELECT * FROM product_documents WHERE product_id = $1 ORDER BY uploaded_on",
    )
    .bind(product_id)
    .fetch_all(db)
    .await
}

pub async fn find_document(
    db: &Database,
    id: Uuid,
) -> Result<Option<ProductDocument>, sqlx::Error> {
    sqlx::query_as::<_, ProductDocument>("SELECT * FROM product_documents WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn delete_document(db: &Database, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM product_documents WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}
