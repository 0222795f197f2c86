use uuid::Uuid;

use crate::database::Database;
use crate::models::customer::{Customer, CustomerFilter, CustomerWithAssignee, NewCustomer};

const LIST_SELECT: &str = "SELECT c.id, c.name, c.email, c.mobile_number, c.location, \
     c.insurance_type, c.income, c.source_of_income, c.family_members, \
     c.assigned_employee_id, u.name AS assigned_employee_name, c.created_date \
     FROM customers c \
     LEFT JOIN users u ON u.id = c.assigned_employee_id";

/// Role-scoped, filtered customer listing. `assigned_to` narrows the list
/// to one employee's customers; the filter conditions stack on top.
pub async fn list(
    db: &Database,
    assigned_to: Option<Uuid>,
    filter: &CustomerFilter,
) -> Result<Vec<CustomerWithAssignee>, sqlx::Error> {
    let mut conditions = Vec::new();
    let mut bind_count = 0;

    if assigned_to.is_some() {
        bind_count += 1;
        conditions.push(format!("c.assigned_employee_id = ${}", bind_count));
    }
    let search_bind = filter.search().map(|_| {
        bind_count += 1;
        conditions.push(format!(
            "(c.name ILIKE ${n} OR c.email ILIKE ${n} OR c.mobile_number ILIKE ${n})",
            n = bind_count
        ));
        bind_count
    });
    if filter.location_filter().is_some() {
        bind_count += 1;
        conditions.push(format!("c.location ILIKE ${}", bind_count));
    }
    if filter.insurance_filter().is_some() {
        bind_count += 1;
        conditions.push(format!("c.insurance_type ILIKE ${}", bind_count));
    }
    match filter.assigned_filter() {
        Some(true) => conditions.push("c.assigned_employee_id IS NOT NULL".to_string()),
        Some(false) => conditions.push("c.assigned_employee_id IS NULL".to_string()),
        None => {}
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    let sql = format!("{}{} ORDER BY c.created_date DESC", LIST_SELECT, where_clause);

    let mut query = sqlx::query_as::<_, CustomerWithAssignee>(&sql);
    if let Some(employee_id) = assigned_to {
        query = query.bind(employee_id);
    }
    if search_bind.is_some() {
        let pattern = format!("%{}%", filter.search().unwrap_or_default());
        query = query.bind(pattern);
    }
    if let Some(location) = filter.location_filter() {
        query = query.bind(format!("%{}%", location));
    }
    if let Some(insurance) = filter.insurance_filter() {
        query = query.bind(format!("%{}%", insurance));
    }

    query.fetch_all(db).await
}

pub async fn find_with_assignee(
    db: &Database,
    id: Uuid,
) -> Result<Option<CustomerWithAssignee>, sqlx::Error> {
    sqlx::query_as::<_, CustomerWithAssignee>(&format!("{} WHERE c.id = $1", LIST_SELECT))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_by_id(db: &Database, id: Uuid) -> Result<Option<Customer>, sqlx::Error> {
    sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn insert(
    db: &Database,
    customer: &NewCustomer,
    created_by: Option<Uuid>,
) -> Result<Customer, sqlx::Error> {
    sqlx::query_as::<_, Customer>(
        "INSERT INTO customers \
         (name, email, mobile_number, location, insurance_type, income, \
          source_of_income, family_members, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
    )
    .bind(&customer.name)
    .bind(&customer.email)
    .bind(&customer.mobile_number)
    .bind(&customer.location)
    .bind(&customer.insurance_type)
    .bind(customer.income)
    .bind(&customer.source_of_income)
    .bind(customer.family_members)
    .bind(created_by)
    .fetch_one(db)
    .await
}

pub async fn update(
    db: &Database,
    id: Uuid,
    customer: &NewCustomer,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE customers SET name = $2, email = $3, mobile_number = $4, location = $5, \
         insurance_type = $6, income = $7, source_of_income = $8, family_members = $9 \
         WHERE id = $1",
    )
    .bind(id)
    .bind(&customer.name)
    .bind(&customer.email)
    .bind(&customer.mobile_number)
    .bind(&customer.location)
    .bind(&customer.insurance_type)
    .bind(customer.income)
    .bind(&customer.source_of_income)
    .bind(customer.family_members)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn delete(db: &Database, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM customers WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// Unconditional overwrite of the assignee for the given customers.
pub async fn assign(
    db: &Database,
    customer_ids: &[Uuid],
    employee_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE customers SET assigned_employee_id = $1 WHERE id = ANY($2)",
    )
    .bind(employee_id)
    .bind(customer_ids)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

pub async fn total_count(db: &Database) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers")
        .fetch_one(db)
        .await
}

pub async fn assigned_count(db: &Database, employee_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM customers WHERE assigned_employee_id = $1",
    )
    .bind(employee_id)
    .fetch_one(db)
    .await
}
