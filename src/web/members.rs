//! Family member pages
//!
//! - GET       /members/
//! - GET/POST  /members/add/
//! - GET       /members/{id}/
//! - GET/POST  /members/{id}/edit/
//! - GET/POST  /members/{id}/delete/

use axum::{
    extract::{Form, Path, State},
    response::Response,
};
use tera::Context as TeraContext;

use crate::forms::{FormErrors, MemberForm};
use crate::models::{BloodGroup, FamilyMember, Relation};
use crate::views::Message;
use crate::web::error::{parse_id, AppError};
use crate::web::flash::redirect_with_flash;
use crate::web::middleware::{AppState, AuthenticatedUser};
use crate::web::page::Page;
use crate::web::view_models::{MemberDetailView, MemberView};

pub const MEMBERS_URL: &str = "/members/";

pub fn member_url(id: i64) -> String {
    format!("/members/{}/", id)
}

fn form_context(
    page_title: &str,
    form: &MemberForm,
    errors: &FormErrors,
    cancel_url: &str,
) -> TeraContext {
    let mut context = TeraContext::new();
    context.insert("page_title", page_title);
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("cancel_url", cancel_url);
    context.insert("relations", &Relation::choices());
    context.insert("blood_groups", &BloodGroup::choices());
    context
}

fn edit_title(member: &FamilyMember) -> String {
    format!("Edit {}", member.name)
}

/// GET /members/
pub async fn list(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    page: Page,
) -> Result<Response, AppError> {
    let members = state.member_service.list(user.id).await?;
    let views: Vec<MemberView> = members.iter().map(MemberView::from).collect();

    let mut context = TeraContext::new();
    context.insert("members", &views);
    page.render(&state, "members/list.html", &context)
}

/// GET /members/add/
pub async fn add_form(State(state): State<AppState>, page: Page) -> Result<Response, AppError> {
    let context = form_context(
        "Add Family Member",
        &MemberForm::default(),
        &FormErrors::new(),
        MEMBERS_URL,
    );
    page.render(&state, "members/form.html", &context)
}

/// POST /members/add/
pub async fn add_submit(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    page: Page,
    Form(form): Form<MemberForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let context = form_context("Add Family Member", &form, &errors, MEMBERS_URL);
            return page.render(&state, "members/form.html", &context);
        }
    };

    let member = state.member_service.create(user.id, &input).await?;
    Ok(redirect_with_flash(
        &member_url(member.id),
        Message::success(format!("{} added to your family!", member.name)),
    ))
}

/// GET /members/{id}/
pub async fn detail(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    page: Page,
) -> Result<Response, AppError> {
    let detail = state.member_service.detail(parse_id(&id)?, user.id).await?;
    let view = MemberDetailView::from(&detail);

    let mut context = TeraContext::new();
    context.insert("member", &view.member);
    context.insert("records", &view.records);
    context.insert("active_records", &view.active_records);
    context.insert("chronic_records", &view.chronic_records);
    context.insert("recovered_records", &view.recovered_records);
    page.render(&state, "members/detail.html", &context)
}

/// GET /members/{id}/edit/
pub async fn edit_form(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    page: Page,
) -> Result<Response, AppError> {
    let member = state.member_service.get(parse_id(&id)?, user.id).await?;
    let context = form_context(
        &edit_title(&member),
        &MemberForm::from_member(&member),
        &FormErrors::new(),
        &member_url(member.id),
    );
    page.render(&state, "members/form.html", &context)
}

/// POST /members/{id}/edit/
pub async fn edit_submit(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    page: Page,
    Form(form): Form<MemberForm>,
) -> Result<Response, AppError> {
    let member = state.member_service.get(parse_id(&id)?, user.id).await?;

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let context = form_context(
                &edit_title(&member),
                &form,
                &errors,
                &member_url(member.id),
            );
            return page.render(&state, "members/form.html", &context);
        }
    };

    let updated = state.member_service.update(member.id, user.id, &input).await?;
    Ok(redirect_with_flash(
        &member_url(updated.id),
        Message::success(format!("{} updated successfully!", updated.name)),
    ))
}

/// GET /members/{id}/delete/ - confirmation only, nothing is deleted
pub async fn delete_confirm(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    page: Page,
) -> Result<Response, AppError> {
    let detail = state.member_service.detail(parse_id(&id)?, user.id).await?;

    let mut context = TeraContext::new();
    context.insert(
        "member",
        &MemberView::new(&detail.member, detail.records.len() as i64),
    );
    page.render(&state, "members/confirm_delete.html", &context)
}

/// POST /members/{id}/delete/
pub async fn delete_submit(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let member = state.member_service.delete(parse_id(&id)?, user.id).await?;
    Ok(redirect_with_flash(
        MEMBERS_URL,
        Message::success(format!("{} removed from your family.", member.name)),
    ))
}
