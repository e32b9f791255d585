//! Web middleware
//!
//! Contains:
//! - Application state shared by all handlers
//! - Session cookie handling
//! - Authentication (session token validation)
//! - Error page rendering

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tera::Context as TeraContext;

use crate::config::Config;
use crate::db::repositories::{
    SqlxFamilyMemberRepository, SqlxHealthRecordRepository, SqlxSessionRepository,
    SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::User;
use crate::services::{
    DashboardService, FamilyMemberService, HealthRecordService, UserService,
};
use crate::views::{simple_error_page, StandardTemplateVars, ViewRenderer, ERROR_TEMPLATE};
use crate::web::error::{AppError, ErrorPage};
use crate::web::page::current_user_view;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub member_service: Arc<FamilyMemberService>,
    pub record_service: Arc<HealthRecordService>,
    pub dashboard_service: Arc<DashboardService>,
    pub views: Arc<ViewRenderer>,
    pub session_cookie: SessionCookie,
}

impl AppState {
    /// Wire repositories and services on top of `pool`
    pub fn new(pool: DynDatabasePool, config: &Config, views: ViewRenderer) -> Self {
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let member_repo = SqlxFamilyMemberRepository::boxed(pool.clone());
        let record_repo = SqlxHealthRecordRepository::boxed(pool.clone());

        Self {
            user_service: Arc::new(UserService::with_session_lifetime(
                user_repo,
                session_repo,
                chrono::Duration::days(config.session.lifetime_days),
            )),
            member_service: Arc::new(FamilyMemberService::new(
                member_repo.clone(),
                record_repo.clone(),
            )),
            record_service: Arc::new(HealthRecordService::new(
                record_repo.clone(),
                member_repo.clone(),
            )),
            dashboard_service: Arc::new(DashboardService::new(member_repo, record_repo)),
            views: Arc::new(views),
            session_cookie: SessionCookie {
                max_age_seconds: config.session.max_age_seconds(),
                secure: config.session.secure_cookie,
            },
            pool,
        }
    }
}

/// Attributes of the `session` cookie
#[derive(Debug, Clone, Copy)]
pub struct SessionCookie {
    pub max_age_seconds: i64,
    pub secure: bool,
}

impl SessionCookie {
    /// `Set-Cookie` value establishing a session
    pub fn set(&self, token: &str) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE, token, self.max_age_seconds
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value removing the session cookie
    pub fn clear(&self) -> String {
        let mut cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE);
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Value of cookie `name`, searching every `Cookie` header
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Extract the session token from the request cookies
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    read_cookie(headers, SESSION_COOKIE).filter(|token| !token.is_empty())
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::AuthenticationRequired)
    }
}

/// Authentication middleware. Anonymous requests are sent to the login page.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_session_token(request.headers()).ok_or(AppError::AuthenticationRequired)?;

    let user = state
        .user_service
        .validate_session(&token)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Session validation failed: {}", e)))?
        .ok_or(AppError::AuthenticationRequired)?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Optional authentication middleware
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(user) = resolve_user(&state, request.headers()).await {
        request.extensions_mut().insert(AuthenticatedUser(user));
    }
    next.run(request).await
}

/// The signed-in user, if any. Lookup failures are logged and treated as
/// anonymous.
async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Option<User> {
    let token = extract_session_token(headers)?;
    match state.user_service.validate_session(&token).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("Session lookup failed: {}", e);
            None
        }
    }
}

/// Replace the body of error responses with the rendered error page
pub async fn render_error_pages(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let headers = request.headers().clone();

    let response = next.run(request).await;
    let Some(page) = response.extensions().get::<ErrorPage>().cloned() else {
        return response;
    };

    let mut standard_vars = StandardTemplateVars::new(path);
    if let Some(user) = resolve_user(&state, &headers).await {
        standard_vars = standard_vars.with_user(current_user_view(&user));
    }

    let mut context = TeraContext::new();
    context.insert("status", &page.status.as_u16());
    context.insert("error_title", &page.title);
    context.insert("error_message", &page.message);

    let html = match state.views.render_page(ERROR_TEMPLATE, &context, &standard_vars) {
        Ok(html) => html,
        Err(e) => {
            tracing::warn!("Failed to render error page: {}", e);
            simple_error_page(&page.message)
        }
    };

    (page.status, Html(html)).into_response()
}
