//! Account pages
//!
//! - GET  /            - landing page
//! - GET/POST /register/
//! - GET/POST /login/
//! - GET/POST /logout/

use axum::{
    extract::{Form, State},
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use tera::Context as TeraContext;

use crate::forms::{FormErrors, LoginForm, RegisterForm};
use crate::services::UserServiceError;
use crate::views::Message;
use crate::web::error::AppError;
use crate::web::flash::flash_cookie;
use crate::web::middleware::{extract_session_token, AppState};
use crate::web::page::Page;

pub const DASHBOARD_URL: &str = "/dashboard/";

/// GET / - landing page, or the dashboard when signed in
pub async fn home(State(state): State<AppState>, page: Page) -> Result<Response, AppError> {
    if page.user.is_some() {
        return Ok(Redirect::to(DASHBOARD_URL).into_response());
    }
    page.render(&state, "home.html", &TeraContext::new())
}

fn form_context<T: serde::Serialize>(form: &T, errors: &FormErrors) -> TeraContext {
    let mut context = TeraContext::new();
    context.insert("form", form);
    context.insert("errors", errors);
    context
}

/// GET /register/
pub async fn register_form(State(state): State<AppState>, page: Page) -> Result<Response, AppError> {
    if page.user.is_some() {
        return Ok(Redirect::to(DASHBOARD_URL).into_response());
    }
    let context = form_context(&RegisterForm::default(), &FormErrors::new());
    page.render(&state, "register.html", &context)
}

/// POST /register/ - create the account and sign it in
pub async fn register_submit(
    State(state): State<AppState>,
    page: Page,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if page.user.is_some() {
        return Ok(Redirect::to(DASHBOARD_URL).into_response());
    }

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => return page.render(&state, "register.html", &form_context(&form, &errors)),
    };

    let user = match state.user_service.register(input).await {
        Ok(user) => user,
        Err(UserServiceError::ValidationError(errors)) => {
            return page.render(&state, "register.html", &form_context(&form, &errors));
        }
        Err(e) => return Err(e.into()),
    };

    let session = state.user_service.start_session(user.id).await?;
    let welcome = Message::success(format!(
        "Welcome, {}! Your account is ready.",
        user.first_name
    ));

    Ok((
        AppendHeaders([
            (header::SET_COOKIE, state.session_cookie.set(&session.id)),
            (header::SET_COOKIE, flash_cookie(&welcome)),
        ]),
        Redirect::to(DASHBOARD_URL),
    )
        .into_response())
}

/// GET /login/
pub async fn login_form(State(state): State<AppState>, page: Page) -> Result<Response, AppError> {
    if page.user.is_some() {
        return Ok(Redirect::to(DASHBOARD_URL).into_response());
    }
    let context = form_context(&LoginForm::default(), &FormErrors::new());
    page.render(&state, "login.html", &context)
}

/// POST /login/
pub async fn login_submit(
    State(state): State<AppState>,
    page: Page,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if page.user.is_some() {
        return Ok(Redirect::to(DASHBOARD_URL).into_response());
    }

    let (username, password) = match form.validate() {
        Ok(credentials) => credentials,
        Err(errors) => return page.render(&state, "login.html", &form_context(&form, &errors)),
    };

    match state.user_service.login(&username, &password).await {
        Ok(session) => Ok((
            AppendHeaders([(header::SET_COOKIE, state.session_cookie.set(&session.id))]),
            Redirect::to(DASHBOARD_URL),
        )
            .into_response()),
        Err(UserServiceError::AuthenticationError(message)) => {
            let mut errors = FormErrors::new();
            errors.add_non_field(message);
            page.render(&state, "login.html", &form_context(&form, &errors))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET|POST /logout/ - end the session and go back to the start page
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    if let Some(token) = extract_session_token(&headers) {
        state.user_service.logout(&token).await?;
        tracing::info!("User logged out");
    }

    Ok((
        AppendHeaders([(header::SET_COOKIE, state.session_cookie.clear())]),
        Redirect::to("/"),
    )
        .into_response())
}
