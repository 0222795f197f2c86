use uuid::Uuid;

use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::models::customer::{CustomerFilter, CustomerWithAssignee};
use crate::models::RoleKind;
use crate::repositories::{customers, users};

/// What slice of the customer base a role gets to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerScope {
    All,
    AssignedTo(Uuid),
    None,
}

impl CustomerScope {
    pub fn for_user(role: RoleKind, user_id: Uuid) -> Self {
        match role {
            RoleKind::Admin | RoleKind::Manager => CustomerScope::All,
            RoleKind::Employee => CustomerScope::AssignedTo(user_id),
            RoleKind::Other => CustomerScope::None,
        }
    }
}

pub async fn customers_for_user(
    db: &Database,
    role: RoleKind,
    user_id: Uuid,
    filter: &CustomerFilter,
) -> AppResult<Vec<CustomerWithAssignee>> {
    match CustomerScope::for_user(role, user_id) {
        CustomerScope::All => Ok(customers::list(db, None, filter).await?),
        CustomerScope::AssignedTo(employee_id) => {
            Ok(customers::list(db, Some(employee_id), filter).await?)
        }
        CustomerScope::None => Ok(Vec::new()),
    }
}

/// Drops nil and duplicate ids before an assignment write.
pub fn sanitize_assignment_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = Vec::new();
    for id in ids {
        if !id.is_nil() && !seen.contains(id) {
            seen.push(*id);
        }
    }
    seen
}

/// Assigns the given customers to an employee, overwriting any previous
/// assignee. The target must be an active user holding the Employee role.
pub async fn assign_customers(
    db: &Database,
    customer_ids: &[Uuid],
    employee_id: Uuid,
) -> AppResult<u64> {
    let ids = sanitize_assignment_ids(customer_ids);
    if ids.is_empty() {
        return Err(AppError::Validation(
            "Select at least one customer to assign.".to_string(),
        ));
    }

    let employee = users::find_active_employee(db, employee_id).await?;
    if employee.is_none() {
        return Err(AppError::Validation(
            "The selected assignee is not an active employee.".to_string(),
        ));
    }

    Ok(customers::assign(db, &ids, employee_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_and_manager_see_everything() {
        let id = Uuid::new_v4();
        assert_eq!(
            CustomerScope::for_user(RoleKind::Admin, id),
            CustomerScope::All
        );
        assert_eq!(
            CustomerScope::for_user(RoleKind::Manager, id),
            CustomerScope::All
        );
    }

    #[test]
    fn employee_sees_only_assigned() {
        let id = Uuid::new_v4();
        assert_eq!(
            CustomerScope::for_user(RoleKind::Employee, id),
            CustomerScope::AssignedTo(id)
        );
    }

    #[test]
    fn unknown_role_sees_nothing() {
        assert_eq!(
            CustomerScope::for_user(RoleKind::Other, Uuid::new_v4()),
            CustomerScope::None
        );
    }

    #[test]
    fn assignment_ids_are_deduplicated_and_non_nil() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let ids = sanitize_assignment_ids(&[a, Uuid::nil(), b, a]);
        assert_eq!(ids, vec![a, b]);
    }
}
