use axum::{
    extract::{Form, Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use askama::Template;
use serde::Deserialize;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    database::Database,
    error::{AppError, AppResult},
    export,
    handlers::{customer::file_response, require_admin, require_user},
    models::{Role, UserDisplay},
    repositories::{roles, users},
    services::{accounts, roles as role_service},
    utils::flash::{redirect_with_error, redirect_with_flash},
};

#[derive(Template)]
#[template(path = "admin/users.html")]
struct UsersTemplate {
    users: Vec<UserDisplay>,
    roles: Vec<Role>,
    flash: String,
    error: String,
}

#[derive(Template)]
#[template(path = "admin/user_form.html")]
struct UserFormTemplate {
    user: UserDisplay,
    roles: Vec<Role>,
    error: String,
}

struct RoleRow {
    id: Uuid,
    name: String,
    description: String,
    is_system: bool,
    user_count: i64,
}

#[derive(Template)]
#[template(path = "admin/roles.html")]
struct RolesTemplate {
    roles: Vec<RoleRow>,
    flash: String,
    error: String,
}

#[derive(Deserialize)]
pub struct PageQuery {
    flash: Option<String>,
    error: Option<String>,
}

pub async fn users_page(
    cookies: Cookies,
    State(db): State<Database>,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<String>> {
    let user = require_user(cookies, &db).await?;
    require_admin(&user)?;

    let template = UsersTemplate {
        users: users::list_display(&db).await?,
        roles: roles::list_all(&db).await?,
        flash: query.flash.unwrap_or_default(),
        error: query.error.unwrap_or_default(),
    };
    Ok(Html(template.render().unwrap()))
}

#[derive(Deserialize)]
pub struct UserForm {
    name: String,
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    mobile: String,
    role_id: Uuid,
}

pub async fn create_user(
    cookies: Cookies,
    State(db): State<Database>,
    Form(form): Form<UserForm>,
) -> AppResult<Redirect> {
    let user = require_user(cookies, &db).await?;
    require_admin(&user)?;

    let mobile = Some(form.mobile.trim()).filter(|v| !v.is_empty());
    match accounts::create_user(
        &db,
        &form.name,
        &form.email,
        &form.password,
        mobile,
        form.role_id,
    )
    .await
    {
        Ok(created) => {
            log::info!("User {} created by {}", created.email, user.email);
            Ok(redirect_with_flash("/Admin/Users", "User created."))
        }
        Err(AppError::Validation(message)) => Ok(redirect_with_error("/Admin/Users", &message)),
        Err(err) => Err(err),
    }
}

pub async fn edit_user_form(
    cookies: Cookies,
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> AppResult<Html<String>> {
    let user = require_user(cookies, &db).await?;
    require_admin(&user)?;

    let target = users::find_display_by_id(&db, id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    let template = UserFormTemplate {
        user: target,
        roles: roles::list_all(&db).await?,
        error: String::new(),
    };
    Ok(Html(template.render().unwrap()))
}

pub async fn edit_user(
    cookies: Cookies,
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Form(form): Form<UserForm>,
) -> AppResult<Response> {
    let user = require_user(cookies, &db).await?;
    require_admin(&user)?;

    let mobile = Some(form.mobile.trim()).filter(|v| !v.is_empty());
    let new_password = Some(form.password.as_str()).filter(|v| !v.trim().is_empty());
    match accounts::update_user(
        &db,
        id,
        &form.name,
        &form.email,
        new_password,
        mobile,
        form.role_id,
    )
    .await
    {
        Ok(()) => Ok(redirect_with_flash("/Admin/Users", "User updated.").into_response()),
        Err(AppError::Validation(message)) => {
            let target = users::find_display_by_id(&db, id)
                .await?
                .ok_or(AppError::NotFound("User"))?;
            let template = UserFormTemplate {
                user: target,
                roles: roles::list_all(&db).await?,
                error: message,
            };
            Ok(Html(template.render().unwrap()).into_response())
        }
        Err(err) => Err(err),
    }
}

#[derive(Deserialize)]
pub struct SetActiveForm {
    active: bool,
}

pub async fn set_user_active(
    cookies: Cookies,
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Form(form): Form<SetActiveForm>,
) -> AppResult<Redirect> {
    let user = require_user(cookies, &db).await?;
    require_admin(&user)?;
    if id == user.id {
        return Ok(redirect_with_error(
            "/Admin/Users",
            "You cannot deactivate your own account.",
        ));
    }
    if users::find_by_id(&db, id).await?.is_none() {
        return Err(AppError::NotFound("User"));
    }

    users::set_active(&db, id, form.active).await?;
    let message = if form.active {
        "User activated."
    } else {
        "User deactivated."
    };
    Ok(redirect_with_flash("/Admin/Users", message))
}

pub async fn roles_page(
    cookies: Cookies,
    State(db): State<Database>,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<String>> {
    let user = require_user(cookies, &db).await?;
    require_admin(&user)?;

    let rows = roles::list_with_user_counts(&db)
        .await?
        .into_iter()
        .map(|role| RoleRow {
            id: role.id,
            name: role.name,
            description: role.description.unwrap_or_default(),
            is_system: role.is_system,
            user_count: role.user_count,
        })
        .collect();
    let template = RolesTemplate {
        roles: rows,
        flash: query.flash.unwrap_or_default(),
        error: query.error.unwrap_or_default(),
    };
    Ok(Html(template.render().unwrap()))
}

#[derive(Deserialize)]
pub struct RoleForm {
    name: String,
    #[serde(default)]
    description: String,
}

pub async fn create_role(
    cookies: Cookies,
    State(db): State<Database>,
    Form(form): Form<RoleForm>,
) -> AppResult<Redirect> {
    let user = require_user(cookies, &db).await?;
    require_admin(&user)?;

    let description = Some(form.description.trim()).filter(|v| !v.is_empty());
    match role_service::create_role(&db, &form.name, description).await {
        Ok(_) => Ok(redirect_with_flash("/Admin/ManageRoles", "Role created.")),
        Err(AppError::Validation(message)) => {
            Ok(redirect_with_error("/Admin/ManageRoles", &message))
        }
        Err(err) => Err(err),
    }
}

pub async fn update_role(
    cookies: Cookies,
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Form(form): Form<RoleForm>,
) -> AppResult<Redirect> {
    let user = require_user(cookies, &db).await?;
    require_admin(&user)?;

    let description = Some(form.description.trim()).filter(|v| !v.is_empty());
    match role_service::update_role(&db, id, &form.name, description).await {
        Ok(()) => Ok(redirect_with_flash("/Admin/ManageRoles", "Role updated.")),
        Err(AppError::Validation(message)) => {
            Ok(redirect_with_error("/Admin/ManageRoles", &message))
        }
        Err(err) => Err(err),
    }
}

pub async fn delete_role(
    cookies: Cookies,
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> AppResult<Redirect> {
    let user = require_user(cookies, &db).await?;
    require_admin(&user)?;

    match role_service::delete_role(&db, id).await {
        Ok(()) => Ok(redirect_with_flash("/Admin/ManageRoles", "Role deleted.")),
        Err(AppError::Validation(message)) => {
            Ok(redirect_with_error("/Admin/ManageRoles", &message))
        }
        Err(err) => Err(err),
    }
}

#[derive(Deserialize)]
pub struct UserRoleForm {
    user_id: Uuid,
    role_id: Uuid,
}

pub async fn update_user_role(
    cookies: Cookies,
    State(db): State<Database>,
    Form(form): Form<UserRoleForm>,
) -> AppResult<Redirect> {
    let user = require_user(cookies, &db).await?;
    require_admin(&user)?;
    if users::find_by_id(&db, form.user_id).await?.is_none() {
        return Err(AppError::NotFound("User"));
    }
    if roles::find_by_id(&db, form.role_id).await?.is_none() {
        return Ok(redirect_with_error("/Admin/Users", "Unknown role."));
    }

    users::update_role(&db, form.user_id, form.role_id).await?;
    Ok(redirect_with_flash("/Admin/Users", "Role updated."))
}

#[derive(Deserialize)]
pub struct ExportQuery {
    format: Option<String>,
}

pub async fn export_users(
    cookies: Cookies,
    State(db): State<Database>,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    let user = require_user(cookies, &db).await?;
    require_admin(&user)?;
    let format = export::ExportFormat::parse(query.format.as_deref())?;

    let rows = users::list_display(&db).await?;
    let bytes = match format {
        export::ExportFormat::Excel => export::users_excel(&rows)?,
        export::ExportFormat::Pdf => export::users_pdf(&rows)?,
    };
    Ok(file_response(format, "users", bytes))
}
