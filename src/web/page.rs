//! Page rendering for handlers

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
    response::{AppendHeaders, Html, IntoResponse, Response},
};
use std::convert::Infallible;
use tera::Context as TeraContext;

use crate::models::User;
use crate::views::{CurrentUserView, Message, StandardTemplateVars};
use crate::web::error::AppError;
use crate::web::flash::{clear_flash_cookie, read_flash};
use crate::web::middleware::{AppState, AuthenticatedUser};

/// Per-request data every page needs: the path, the signed-in user (set by
/// the auth middleware) and pending flash messages.
#[derive(Debug, Clone)]
pub struct Page {
    pub path: String,
    pub user: Option<User>,
    pub messages: Vec<Message>,
}

impl<S> FromRequestParts<S> for Page
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            path: parts.uri.path().to_string(),
            user: parts
                .extensions
                .get::<AuthenticatedUser>()
                .map(|u| u.0.clone()),
            messages: read_flash(&parts.headers),
        })
    }
}

impl Page {
    /// Render `template` with `context` plus the standard variables.
    ///
    /// Displayed flash messages are cleared from the browser.
    pub fn render(
        self,
        state: &AppState,
        template: &str,
        context: &TeraContext,
    ) -> Result<Response, AppError> {
        let consumed_flash = !self.messages.is_empty();

        let mut standard_vars = StandardTemplateVars::new(self.path).with_messages(self.messages);
        if let Some(user) = &self.user {
            standard_vars = standard_vars.with_user(current_user_view(user));
        }

        let html = state.views.render_page(template, context, &standard_vars)?;

        if consumed_flash {
            Ok((
                AppendHeaders([(header::SET_COOKIE, clear_flash_cookie())]),
                Html(html),
            )
                .into_response())
        } else {
            Ok(Html(html).into_response())
        }
    }
}

pub fn current_user_view(user: &User) -> CurrentUserView {
    CurrentUserView {
        id: user.id,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        full_name: user.full_name(),
    }
}
