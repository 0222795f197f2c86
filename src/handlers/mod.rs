pub mod account;
pub mod admin;
pub mod customer;
pub mod follow_up;
pub mod home;
pub mod product;
pub mod reminder;
pub mod sold_product;

use tower_cookies::Cookies;

use crate::{
    database::Database,
    error::{AppError, AppResult},
    middleware::{get_current_user, CurrentUser},
    models::RoleKind,
};

pub(crate) async fn require_user(cookies: Cookies, db: &Database) -> AppResult<CurrentUser> {
    get_current_user(cookies, db)
        .await
        .ok_or(AppError::Unauthorized)
}

/// Admin or Manager.
pub(crate) fn require_full_access(user: &CurrentUser) -> AppResult<()> {
    if user.role.full_access() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

pub(crate) fn require_admin(user: &CurrentUser) -> AppResult<()> {
    if user.role == RoleKind::Admin {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Parses an application/x-www-form-urlencoded body into key/value pairs.
/// Used where a field repeats (checkbox lists), which Form cannot decode.
pub(crate) fn parse_form_pairs(body: &str) -> Vec<(String, String)> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next().unwrap_or_default().replace('+', " ");
            let value = parts.next().unwrap_or_default().replace('+', " ");
            (
                urlencoding::decode(&key).map(|v| v.into_owned()).unwrap_or(key),
                urlencoding::decode(&value).map(|v| v.into_owned()).unwrap_or(value),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_keys_are_preserved() {
        let pairs = parse_form_pairs("customer_ids=a&customer_ids=b&employee_id=c");
        assert_eq!(
            pairs,
            vec![
                ("customer_ids".to_string(), "a".to_string()),
                ("customer_ids".to_string(), "b".to_string()),
                ("employee_id".to_string(), "c".to_string()),
            ]
        );
    }

    #[test]
    fn values_are_url_decoded() {
        let pairs = parse_form_pairs("note=follow%20up+call");
        assert_eq!(pairs[0].1, "follow up call");
    }
}
