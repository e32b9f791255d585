//! Web layer - HTML page handlers and routing
//!
//! It includes:
//! - Account pages (landing, register, login, logout)
//! - Dashboard
//! - Family member pages
//! - Health record pages
//! - Session, flash message and error page plumbing

pub mod auth;
pub mod dashboard;
pub mod error;
pub mod flash;
pub mod members;
pub mod middleware;
pub mod page;
pub mod records;
pub mod view_models;

#[cfg(test)]
mod tests;

use axum::{
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use middleware::{AppState, AuthenticatedUser, SessionCookie};

/// Build the page router (without state)
pub fn build_page_router(state: AppState) -> Router<AppState> {
    // Protected routes (need a signed-in user)
    let protected_routes = Router::new()
        .route("/dashboard/", get(dashboard::dashboard))
        .route("/members/", get(members::list))
        .route("/members/add/", get(members::add_form).post(members::add_submit))
        .route("/members/{id}/", get(members::detail))
        .route(
            "/members/{id}/edit/",
            get(members::edit_form).post(members::edit_submit),
        )
        .route(
            "/members/{id}/delete/",
            get(members::delete_confirm).post(members::delete_submit),
        )
        .route(
            "/members/{id}/records/add/",
            get(records::add_form).post(records::add_submit),
        )
        .route(
            "/records/{id}/edit/",
            get(records::edit_form).post(records::edit_submit),
        )
        .route(
            "/records/{id}/delete/",
            get(records::delete_confirm).post(records::delete_submit),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .route("/", get(auth::home))
        .route("/register/", get(auth::register_form).post(auth::register_submit))
        .route("/login/", get(auth::login_form).post(auth::login_submit))
        .route("/logout/", get(auth::logout).post(auth::logout))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::optional_auth,
        ))
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(build_page_router(state.clone()))
        .fallback(error::not_found)
        // Error pages for every route and the fallback
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::render_error_pages,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
