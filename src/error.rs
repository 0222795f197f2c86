use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

/// Application error taxonomy. Handlers either surface these directly
/// (the IntoResponse below) or catch the domain variants and turn them
/// into flash messages on a redirect.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("access denied")]
    Forbidden,

    #[error("authentication required")]
    Unauthorized,

    #[error("{0}")]
    Import(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(message) | AppError::Import(message) => {
                (StatusCode::BAD_REQUEST, message).into_response()
            }
            AppError::NotFound(what) => {
                (StatusCode::NOT_FOUND, format!("{} not found", what)).into_response()
            }
            AppError::Forbidden => Redirect::to("/Account/AccessDenied").into_response(),
            AppError::Unauthorized => Redirect::to("/Account/Login").into_response(),
            AppError::Database(err) => {
                log::error!("database error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
            AppError::Bcrypt(err) => {
                log::error!("bcrypt error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
            AppError::Jwt(_) => Redirect::to("/Account/Login").into_response(),
            AppError::Internal(err) => {
                log::error!("unexpected error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
