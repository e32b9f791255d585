//! Tests for the page router, driven through `tower::ServiceExt::oneshot`
//! with cookies carried by hand between requests.

use super::*;
use crate::config::Config;
use crate::db::{create_test_pool, migrations};
use crate::views::ViewRenderer;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
};
use tower::ServiceExt;

const PASSWORD: &str = "Xy9!abcd";

async fn setup() -> (Router, AppState) {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    migrations::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    let views = ViewRenderer::builtin().expect("Failed to load templates");
    let state = AppState::new(pool, &Config::default(), views);
    (build_router(state.clone()), state)
}

fn encode_form(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, cookie: Option<&str>, fields: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(encode_form(fields))).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

/// `name=value` of the `Set-Cookie` header for cookie `name`
fn set_cookie(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{}=", name)))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

/// Register `username` and return its session cookie pair
async fn register(app: &Router, username: &str, first_name: &str) -> String {
    let email = format!("{}@example.com", username);
    let response = send(
        app,
        post(
            "/register/",
            None,
            &[
                ("username", username),
                ("email", email.as_str()),
                ("first_name", first_name),
                ("last_name", "Smith"),
                ("password1", PASSWORD),
                ("password2", PASSWORD),
            ],
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    set_cookie(&response, "session").expect("registration should sign in")
}

/// Add a family member and return its id
async fn add_member(app: &Router, cookie: &str, name: &str) -> i64 {
    let response = send(
        app,
        post(
            "/members/add/",
            Some(cookie),
            &[("name", name), ("relation", "father"), ("blood_group", "O+")],
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    location(&response)
        .trim_start_matches("/members/")
        .trim_end_matches('/')
        .parse()
        .unwrap()
}

fn record_fields<'a>(status: &'a str, recovery_date: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("title", "Flu"),
        ("category", "disease"),
        ("severity", "moderate"),
        ("status", status),
        ("diagnosis_date", "2024-01-01"),
        ("recovery_date", recovery_date),
        ("medications", "Paracetamol, Rest"),
    ]
}

async fn user_id(state: &AppState, cookie: &str) -> i64 {
    let token = cookie.trim_start_matches("session=");
    state
        .user_service
        .validate_session(token)
        .await
        .unwrap()
        .expect("session should be valid")
        .id
}

#[tokio::test]
async fn test_family_health_flow() {
    let (app, state) = setup().await;

    // Registration signs in and greets on the dashboard
    let response = send(
        &app,
        post(
            "/register/",
            None,
            &[
                ("username", "alice"),
                ("email", "alice@example.com"),
                ("first_name", "Alice"),
                ("last_name", "Smith"),
                ("password1", PASSWORD),
                ("password2", PASSWORD),
            ],
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard/");
    let session = set_cookie(&response, "session").unwrap();
    let flash = set_cookie(&response, "flash").unwrap();

    let response = send(&app, get("/dashboard/", Some(&format!("{}; {}", session, flash)))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(set_cookie(&response, "flash").as_deref(), Some("flash="));
    let body = body_text(response).await;
    assert!(body.contains("Welcome, Alice!"));
    assert!(body.contains("You have not added anyone yet."));

    // Add a member and a record
    let member_id = add_member(&app, &session, "Bob").await;
    let response = send(
        &app,
        post(
            &format!("/members/{}/records/add/", member_id),
            Some(&session),
            &record_fields("active", ""),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/members/{}/", member_id));
    assert!(set_cookie(&response, "flash").unwrap().contains("Health%20record%20added"));

    let alice = user_id(&state, &session).await;
    let summary = state.dashboard_service.summary(alice).await.unwrap();
    assert_eq!(summary.member_count, 1);
    assert_eq!(summary.total_records, 1);
    assert_eq!(summary.active_records, 1);
    assert_eq!(summary.chronic_records, 0);

    let response = send(&app, get(&format!("/members/{}/", member_id), Some(&session))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Bob (Father)"));
    assert!(body.contains("Paracetamol"));

    // Marking the record recovered takes it off the active count
    let record_id = summary.recent_records[0].record.id;
    let response = send(
        &app,
        post(
            &format!("/records/{}/edit/", record_id),
            Some(&session),
            &record_fields("recovered", "2024-01-10"),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let summary = state.dashboard_service.summary(alice).await.unwrap();
    assert_eq!(summary.total_records, 1);
    assert_eq!(summary.active_records, 0);

    let detail = state.member_service.detail(member_id, alice).await.unwrap();
    assert_eq!(detail.recovered_records.len(), 1);
    assert_eq!(detail.recovered_records[0].id, record_id);
}

#[tokio::test]
async fn test_anonymous_visitors_are_sent_to_login() {
    let (app, _state) = setup().await;

    for uri in ["/dashboard/", "/members/", "/members/1/", "/records/1/edit/"] {
        let response = send(&app, get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", uri);
        assert_eq!(location(&response), "/login/", "{}", uri);
    }

    let response = send(&app, get("/dashboard/", Some("session=bogus"))).await;
    assert_eq!(location(&response), "/login/");
}

#[tokio::test]
async fn test_signed_in_users_skip_account_pages() {
    let (app, _state) = setup().await;
    let session = register(&app, "alice", "Alice").await;

    for uri in ["/", "/login/", "/register/"] {
        let response = send(&app, get(uri, Some(&session))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", uri);
        assert_eq!(location(&response), "/dashboard/", "{}", uri);
    }

    let response = send(&app, get("/", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_and_logout() {
    let (app, _state) = setup().await;
    register(&app, "alice", "Alice").await;

    let response = send(
        &app,
        post("/login/", None, &[("username", "alice"), ("password", PASSWORD)]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard/");
    let session = set_cookie(&response, "session").unwrap();

    let response = send(&app, post("/logout/", Some(&session), &[])).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert_eq!(set_cookie(&response, "session").as_deref(), Some("session="));

    // The old token no longer works
    let response = send(&app, get("/dashboard/", Some(&session))).await;
    assert_eq!(location(&response), "/login/");
}

#[tokio::test]
async fn test_login_failures_look_the_same() {
    let (app, _state) = setup().await;
    register(&app, "alice", "Alice").await;

    let wrong_password = send(
        &app,
        post("/login/", None, &[("username", "alice"), ("password", "nope-nope")]),
    )
    .await;
    let unknown_user = send(
        &app,
        post("/login/", None, &[("username", "mallory"), ("password", PASSWORD)]),
    )
    .await;

    assert_eq!(wrong_password.status(), StatusCode::OK);
    assert_eq!(unknown_user.status(), StatusCode::OK);
    assert!(set_cookie(&wrong_password, "session").is_none());

    let wrong_password = body_text(wrong_password).await;
    let unknown_user = body_text(unknown_user).await;
    assert!(wrong_password.contains("Invalid username or password."));
    assert!(unknown_user.contains("Invalid username or password."));
}

#[tokio::test]
async fn test_invalid_registration_rerenders_form() {
    let (app, _state) = setup().await;
    register(&app, "alice", "Alice").await;

    let response = send(
        &app,
        post(
            "/register/",
            None,
            &[
                ("username", "alice"),
                ("email", "other@example.com"),
                ("first_name", "Other"),
                ("last_name", "Person"),
                ("password1", PASSWORD),
                ("password2", PASSWORD),
            ],
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response, "session").is_none());
    let body = body_text(response).await;
    assert!(body.contains("A user with that username already exists."));
}

#[tokio::test]
async fn test_delete_needs_confirmation() {
    let (app, state) = setup().await;
    let session = register(&app, "alice", "Alice").await;
    let alice = user_id(&state, &session).await;
    let member_id = add_member(&app, &session, "Bob").await;

    let uri = format!("/members/{}/delete/", member_id);
    let response = send(&app, get(&uri, Some(&session))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(state.member_service.get(member_id, alice).await.is_ok());

    let response = send(&app, post(&uri, Some(&session), &[])).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/members/");
    assert!(state.member_service.get(member_id, alice).await.is_err());
}

#[tokio::test]
async fn test_record_delete_returns_to_member() {
    let (app, state) = setup().await;
    let session = register(&app, "alice", "Alice").await;
    let alice = user_id(&state, &session).await;
    let member_id = add_member(&app, &session, "Bob").await;
    send(
        &app,
        post(
            &format!("/members/{}/records/add/", member_id),
            Some(&session),
            &record_fields("active", ""),
        ),
    )
    .await;
    let summary = state.dashboard_service.summary(alice).await.unwrap();
    let record_id = summary.recent_records[0].record.id;

    let uri = format!("/records/{}/delete/", record_id);
    let response = send(&app, get(&uri, Some(&session))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Flu - Bob"));

    let response = send(&app, post(&uri, Some(&session), &[])).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/members/{}/", member_id));
    let summary = state.dashboard_service.summary(alice).await.unwrap();
    assert_eq!(summary.total_records, 0);
}

#[tokio::test]
async fn test_other_users_data_is_not_found() {
    let (app, state) = setup().await;
    let alice_session = register(&app, "alice", "Alice").await;
    let alice = user_id(&state, &alice_session).await;
    let member_id = add_member(&app, &alice_session, "Bob").await;
    send(
        &app,
        post(
            &format!("/members/{}/records/add/", member_id),
            Some(&alice_session),
            &record_fields("active", ""),
        ),
    )
    .await;
    let record_id = state.dashboard_service.summary(alice).await.unwrap().recent_records[0]
        .record
        .id;

    let eve_session = register(&app, "eve", "Eve").await;
    for uri in [
        format!("/members/{}/", member_id),
        format!("/members/{}/edit/", member_id),
        format!("/members/{}/delete/", member_id),
        format!("/members/{}/records/add/", member_id),
        format!("/records/{}/edit/", record_id),
        format!("/records/{}/delete/", record_id),
    ] {
        let response = send(&app, get(&uri, Some(&eve_session))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "GET {}", uri);
    }

    let member_fields = [("name", "Hijacked"), ("relation", "other"), ("blood_group", "A+")];
    let hijacked_record = record_fields("chronic", "");
    let no_fields: &[(&str, &str)] = &[];
    let writes: Vec<(String, &[(&str, &str)])> = vec![
        (format!("/members/{}/edit/", member_id), member_fields.as_slice()),
        (format!("/members/{}/records/add/", member_id), hijacked_record.as_slice()),
        (format!("/records/{}/edit/", record_id), hijacked_record.as_slice()),
        (format!("/records/{}/delete/", record_id), no_fields),
        (format!("/members/{}/delete/", member_id), no_fields),
    ];
    for (uri, fields) in writes {
        let response = send(&app, post(&uri, Some(&eve_session), fields)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "POST {}", uri);
    }

    // Alice's data is untouched
    let detail = state.member_service.detail(member_id, alice).await.unwrap();
    assert_eq!(detail.member.name, "Bob");
    assert_eq!(detail.records.len(), 1);
    assert_eq!(detail.active_records.len(), 1);
    assert_eq!(detail.records[0].id, record_id);
}

#[tokio::test]
async fn test_bad_ids_and_unknown_paths_are_not_found() {
    let (app, _state) = setup().await;
    let session = register(&app, "alice", "Alice").await;

    let response = send(&app, get("/members/abc/", Some(&session))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_text(response).await;
    assert!(body.contains("Page not found"));
    assert!(body.contains("Hi, Alice"));

    let response = send(&app, get("/records/999/edit/", Some(&session))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, get("/no/such/page/", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_record_is_not_saved() {
    let (app, state) = setup().await;
    let session = register(&app, "alice", "Alice").await;
    let alice = user_id(&state, &session).await;
    let member_id = add_member(&app, &session, "Bob").await;

    let response = send(
        &app,
        post(
            &format!("/members/{}/records/add/", member_id),
            Some(&session),
            &[("title", "Flu"), ("status", "active")],
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("This field is required."));
    assert!(body.contains("value=\"Flu\""));

    let summary = state.dashboard_service.summary(alice).await.unwrap();
    assert_eq!(summary.total_records, 0);
}

#[tokio::test]
async fn test_member_edit_prefills_and_updates() {
    let (app, state) = setup().await;
    let session = register(&app, "alice", "Alice").await;
    let alice = user_id(&state, &session).await;
    let member_id = add_member(&app, &session, "Bob").await;

    let uri = format!("/members/{}/edit/", member_id);
    let response = send(&app, get(&uri, Some(&session))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Edit Bob"));

    let response = send(
        &app,
        post(
            &uri,
            Some(&session),
            &[("name", "Robert"), ("relation", "father"), ("blood_group", "A-")],
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(set_cookie(&response, "flash")
        .unwrap()
        .contains("Robert%20updated%20successfully"));

    let member = state.member_service.get(member_id, alice).await.unwrap();
    assert_eq!(member.name, "Robert");
}
