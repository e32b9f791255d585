//! Web layer errors
//!
//! Handlers return `Result<Response, AppError>`. Validation failures never
//! reach this type: they are rendered as the form with its errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use crate::services::{ServiceError, UserServiceError};
use crate::views::simple_error_page;

/// Where anonymous visitors of protected pages are sent
pub const LOGIN_URL: &str = "/login/";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No valid session
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Missing, or owned by another account
    #[error("Not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound => AppError::NotFound,
            ServiceError::InternalError(e) => AppError::Internal(e),
        }
    }
}

impl From<UserServiceError> for AppError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::InternalError(e) => AppError::Internal(e),
            other => AppError::Internal(anyhow::anyhow!("Unhandled user service error: {}", other)),
        }
    }
}

/// Marker attached to error responses; the error page middleware renders it
#[derive(Debug, Clone)]
pub struct ErrorPage {
    pub status: StatusCode,
    pub title: String,
    pub message: String,
}

impl ErrorPage {
    fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            title: "Page not found".to_string(),
            message: "The page you are looking for does not exist.".to_string(),
        }
    }

    fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            title: "Something went wrong".to_string(),
            message: "An unexpected error occurred. Please try again later.".to_string(),
        }
    }

    fn into_response(self) -> Response {
        let mut response = (self.status, axum::response::Html(simple_error_page(&self.message)))
            .into_response();
        response.extensions_mut().insert(self);
        response
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::AuthenticationRequired => Redirect::to(LOGIN_URL).into_response(),
            AppError::NotFound => ErrorPage::not_found().into_response(),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                ErrorPage::internal().into_response()
            }
        }
    }
}

/// Fallback for unknown routes
pub async fn not_found() -> AppError {
    AppError::NotFound
}

/// Parse a path id; anything but an integer is `NotFound`
pub fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse().map_err(|_| AppError::NotFound)
}
