use axum::{
    extract::{Form, Query, State},
    response::{Html, IntoResponse, Redirect},
};
use askama::Template;
use serde::Deserialize;
use tower_cookies::{Cookie, Cookies};

use crate::{
    database::Database,
    error::AppResult,
    services::accounts,
    utils::create_token,
};

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    error: String,
}

#[derive(Template)]
#[template(path = "access_denied.html")]
struct AccessDeniedTemplate {}

#[derive(Deserialize)]
pub struct LoginQuery {
    error: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
}

pub async fn login_page(Query(query): Query<LoginQuery>) -> Html<String> {
    let template = LoginTemplate {
        error: query.error.unwrap_or_default(),
    };
    Html(template.render().unwrap())
}

pub async fn login(
    State(db): State<Database>,
    cookies: Cookies,
    Form(form): Form<LoginForm>,
) -> AppResult<axum::response::Response> {
    match accounts::authenticate(&db, &form.email, &form.password).await? {
        Some(user) => {
            let token = create_token(user.id, user.email.clone())?;

            let cookie = Cookie::build(("auth_token", token))
                .path("/")
                .http_only(true)
                .max_age(time::Duration::hours(8))
                .build();
            cookies.add(cookie);

            log::info!("User {} signed in", user.email);
            Ok(Redirect::to("/Home/Index").into_response())
        }
        None => {
            let template = LoginTemplate {
                error: "Invalid email or password.".to_string(),
            };
            Ok(Html(template.render().unwrap()).into_response())
        }
    }
}

pub async fn logout(cookies: Cookies) -> impl IntoResponse {
    cookies.remove(Cookie::from("auth_token"));
    Redirect::to("/Account/Login")
}

pub async fn access_denied() -> Html<String> {
    Html(AccessDeniedTemplate {}.render().unwrap())
}
