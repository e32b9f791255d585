//! Health record pages
//!
//! - GET/POST  /members/{id}/records/add/
//! - GET/POST  /records/{id}/edit/
//! - GET/POST  /records/{id}/delete/

use axum::{
    extract::{Form, Path, State},
    response::Response,
};
use tera::Context as TeraContext;

use crate::forms::{FormErrors, RecordForm};
use crate::models::{FamilyMember, RecordCategory, RecordStatus, Severity};
use crate::views::Message;
use crate::web::error::{parse_id, AppError};
use crate::web::flash::redirect_with_flash;
use crate::web::members::member_url;
use crate::web::middleware::{AppState, AuthenticatedUser};
use crate::web::page::Page;
use crate::web::view_models::{MemberView, RecordView};

const ADD_TITLE: &str = "Add Health Record";

fn form_context(
    page_title: &str,
    member: &FamilyMember,
    form: &RecordForm,
    errors: &FormErrors,
) -> TeraContext {
    let mut context = TeraContext::new();
    context.insert("page_title", page_title);
    context.insert("member", &MemberView::new(member, 0));
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("categories", &RecordCategory::choices());
    context.insert("severities", &Severity::choices());
    context.insert("statuses", &RecordStatus::choices());
    context
}

fn edit_title(record_title: &str) -> String {
    format!("Edit {}", record_title)
}

/// GET /members/{id}/records/add/
pub async fn add_form(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(member_id): Path<String>,
    page: Page,
) -> Result<Response, AppError> {
    let member = state.member_service.get(parse_id(&member_id)?, user.id).await?;
    let context = form_context(ADD_TITLE, &member, &RecordForm::default(), &FormErrors::new());
    page.render(&state, "records/form.html", &context)
}

/// POST /members/{id}/records/add/
pub async fn add_submit(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(member_id): Path<String>,
    page: Page,
    Form(form): Form<RecordForm>,
) -> Result<Response, AppError> {
    let member = state.member_service.get(parse_id(&member_id)?, user.id).await?;

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let context = form_context(ADD_TITLE, &member, &form, &errors);
            return page.render(&state, "records/form.html", &context);
        }
    };

    state.record_service.create(member.id, user.id, &input).await?;
    Ok(redirect_with_flash(
        &member_url(member.id),
        Message::success("Health record added!"),
    ))
}

/// GET /records/{id}/edit/
pub async fn edit_form(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    page: Page,
) -> Result<Response, AppError> {
    let (record, member) = state
        .record_service
        .get_with_member(parse_id(&id)?, user.id)
        .await?;
    let context = form_context(
        &edit_title(&record.title),
        &member,
        &RecordForm::from_record(&record),
        &FormErrors::new(),
    );
    page.render(&state, "records/form.html", &context)
}

/// POST /records/{id}/edit/
pub async fn edit_submit(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    page: Page,
    Form(form): Form<RecordForm>,
) -> Result<Response, AppError> {
    let (record, member) = state
        .record_service
        .get_with_member(parse_id(&id)?, user.id)
        .await?;

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let context = form_context(&edit_title(&record.title), &member, &form, &errors);
            return page.render(&state, "records/form.html", &context);
        }
    };

    state.record_service.update(record.id, user.id, &input).await?;
    Ok(redirect_with_flash(
        &member_url(member.id),
        Message::success("Record updated!"),
    ))
}

/// GET /records/{id}/delete/
pub async fn delete_confirm(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    page: Page,
) -> Result<Response, AppError> {
    let (record, member) = state
        .record_service
        .get_with_member(parse_id(&id)?, user.id)
        .await?;

    let mut context = TeraContext::new();
    context.insert("record", &RecordView::new(&record, &member.name));
    context.insert("member", &MemberView::new(&member, 0));
    page.render(&state, "records/confirm_delete.html", &context)
}

/// POST /records/{id}/delete/
pub async fn delete_submit(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let record = state.record_service.delete(parse_id(&id)?, user.id).await?;
    Ok(redirect_with_flash(
        &member_url(record.family_member_id),
        Message::success("Record deleted."),
    ))
}
