use log::info;
use sqlx::{PgPool, Pool, Postgres};

pub type Database = Pool<Postgres>;

pub async fn create_database_pool(database_url: &str) -> Result<Database, sqlx::Error> {
    let pool = PgPool::connect(database_url).await?;

    // Test the connection
    sqlx::query("SELECT 1")
        .fetch_one(&pool)
        .await?;

    info!("Connected to database successfully");
    Ok(pool)
}

/// Brings the schema up to date on startup. Base tables are created if
/// missing, then columns added in later releases are patched in with
/// information_schema checks so existing databases keep their data.
pub async fn run_migrations(db: &Database) -> Result<(), sqlx::Error> {
    for statement in BASE_SCHEMA {
        sqlx::query(statement).execute(db).await?;
    }

    // Columns added after the initial schema shipped
    add_column_if_missing(db, "customers", "insurance_type", "VARCHAR(100)").await?;
    add_column_if_missing(db, "follow_ups", "budget", "NUMERIC(18,2)").await?;
    add_column_if_missing(
        db,
        "follow_ups",
        "has_existing_policy",
        "BOOLEAN NOT NULL DEFAULT FALSE",
    )
    .await?;
    add_column_if_missing(
        db,
        "follow_ups",
        "reminder_required",
        "BOOLEAN NOT NULL DEFAULT FALSE",
    )
    .await?;
    add_column_if_missing(db, "follow_ups", "is_converted", "BOOLEAN").await?;
    add_column_if_missing(db, "follow_ups", "conversion_reason", "VARCHAR(500)").await?;

    info!("Schema migrations complete");
    Ok(())
}

async fn add_column_if_missing(
    db: &Database,
    table: &str,
    column: &str,
    definition: &str,
) -> Result<(), sqlx::Error> {
    let exists = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM information_schema.columns \
         WHERE table_name = $1 AND column_name = $2",
    )
    .bind(table)
    .bind(column)
    .fetch_one(db)
    .await?;

    if exists == 0 {
        let sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, definition);
        sqlx::query(&sql).execute(db).await?;
        info!("Added column {}.{}", table, column);
    }

    Ok(())
}

const BASE_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS roles (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(100) NOT NULL UNIQUE,
        description VARCHAR(500),
        is_system BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(200) NOT NULL,
        email VARCHAR(320) NOT NULL UNIQUE,
        password_hash VARCHAR(200) NOT NULL,
        mobile VARCHAR(50),
        role_id UUID NOT NULL REFERENCES roles(id),
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS customers (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(200) NOT NULL,
        email VARCHAR(320) NOT NULL,
        mobile_number VARCHAR(50) NOT NULL,
        location VARCHAR(200) NOT NULL,
        income NUMERIC(18,2),
        source_of_income VARCHAR(200),
        family_members INT,
        assigned_employee_id UUID REFERENCES users(id),
        created_by UUID REFERENCES users(id),
        created_date TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS follow_ups (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        customer_id UUID NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
        follow_up_date TIMESTAMPTZ NOT NULL,
        insurance_type VARCHAR(100),
        follow_up_note VARCHAR(1000),
        follow_up_status VARCHAR(100),
        next_reminder_at TIMESTAMPTZ,
        created_by UUID REFERENCES users(id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reminders (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        customer_id UUID NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
        employee_id UUID NOT NULL REFERENCES users(id),
        remind_at TIMESTAMPTZ NOT NULL,
        note VARCHAR(1000),
        is_shown BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(200) NOT NULL,
        description VARCHAR(1000),
        commission_type VARCHAR(50) NOT NULL,
        commission_value NUMERIC(18,2) NOT NULL,
        commission_notes VARCHAR(1000),
        created_on TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_on TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS product_documents (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        product_id UUID NOT NULL REFERENCES products(id) ON DELETE CASCADE,
        file_name VARCHAR(300) NOT NULL,
        original_file_name VARCHAR(300) NOT NULL,
        content_type VARCHAR(150) NOT NULL,
        file_path VARCHAR(500) NOT NULL,
        file_size BIGINT NOT NULL,
        uploaded_on TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sold_product_details (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        customer_id UUID NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
        follow_up_id UUID NOT NULL REFERENCES follow_ups(id) ON DELETE CASCADE,
        product_id UUID NOT NULL REFERENCES products(id),
        product_name VARCHAR(200) NOT NULL,
        ticket_size NUMERIC(18,2) NOT NULL,
        tenure_years INT NOT NULL,
        policy_number VARCHAR(100) NOT NULL,
        policy_enforce_date TIMESTAMPTZ NOT NULL,
        created_on TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_on TIMESTAMPTZ,
        created_by UUID REFERENCES users(id)
    )
    "#,
    // One sale row per follow-up; target of the conversion upsert
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS ux_sold_product_details_follow_up
        ON sold_product_details (follow_up_id)
    "#,
];
