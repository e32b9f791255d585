//! Dashboard page

use axum::{extract::State, response::Response};
use tera::Context as TeraContext;

use crate::web::error::AppError;
use crate::web::middleware::{AppState, AuthenticatedUser};
use crate::web::page::Page;
use crate::web::view_models::DashboardView;

/// GET /dashboard/
pub async fn dashboard(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    page: Page,
) -> Result<Response, AppError> {
    let summary = state.dashboard_service.summary(user.id).await?;
    let view = DashboardView::from(&summary);

    let mut context = TeraContext::new();
    context.insert("summary", &view.summary);
    context.insert("members", &view.members);
    context.insert("recent_records", &view.recent_records);
    page.render(&state, "dashboard.html", &context)
}
