//! Flash messages carried across redirects as a query parameter.
//! Target pages read the parameter back and render it in the layout.

use axum::response::Redirect;

fn with_param(path: &str, key: &str, message: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{}{}{}={}", path, separator, key, urlencoding::encode(message))
}

pub fn redirect_with_flash(path: &str, message: &str) -> Redirect {
    Redirect::to(&with_param(path, "flash", message))
}

pub fn redirect_with_error(path: &str, message: &str) -> Redirect {
    Redirect::to(&with_param(path, "error", message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_is_url_encoded() {
        assert_eq!(
            with_param("/Customer/Index", "flash", "3 uploaded, 1 skipped"),
            "/Customer/Index?flash=3%20uploaded%2C%201%20skipped"
        );
    }

    #[test]
    fn existing_query_uses_ampersand() {
        assert_eq!(
            with_param("/Customer/Index?location=Pune", "error", "ok"),
            "/Customer/Index?location=Pune&error=ok"
        );
    }
}
