//! Tests for the view renderer

use super::*;
use std::fs;
use tempfile::TempDir;

fn vars() -> StandardTemplateVars {
    StandardTemplateVars::new("/members/")
}

#[test]
fn test_builtin_templates_are_embedded() {
    let renderer = ViewRenderer::builtin().unwrap();
    for name in [
        "base.html",
        "home.html",
        "register.html",
        "login.html",
        "dashboard.html",
        "members/list.html",
        "members/form.html",
        "members/detail.html",
        "members/confirm_delete.html",
        "records/form.html",
        "records/confirm_delete.html",
        ERROR_TEMPLATE,
    ] {
        assert!(renderer.has_template(name), "missing template {}", name);
    }
}

#[test]
fn test_render_page_injects_standard_vars() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("page.html"),
        "{{ request_path }}|{{ year }}|{% for m in messages %}{{ m.level }}:{{ m.text }}{% endfor %}|{% if current_user %}{{ current_user.username }}{% endif %}",
    )
    .unwrap();
    let renderer = ViewRenderer::new(Some(dir.path())).unwrap();

    let standard = vars()
        .with_messages(vec![Message::success("Bob added to your family!")])
        .with_user(CurrentUserView {
            id: 1,
            username: "alice".to_string(),
            first_name: "Alice".to_string(),
            full_name: "Alice Smith".to_string(),
        });
    let html = renderer
        .render_page("page.html", &TeraContext::new(), &standard)
        .unwrap();

    let year = chrono::Utc::now().year();
    assert_eq!(
        html,
        format!("&#x2F;members&#x2F;|{}|success:Bob added to your family!|alice", year)
    );
}

#[test]
fn test_override_replaces_builtin_template() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("members")).unwrap();
    fs::write(
        dir.path().join("members/list.html"),
        "custom list for {{ request_path }}",
    )
    .unwrap();

    let renderer = ViewRenderer::new(Some(dir.path())).unwrap();
    let html = renderer
        .render_page("members/list.html", &TeraContext::new(), &vars())
        .unwrap();
    // Autoescaped like every other variable
    assert_eq!(html, "custom list for &#x2F;members&#x2F;");

    // Other built-ins are still there
    assert!(renderer.has_template("dashboard.html"));
}

#[test]
fn test_missing_override_directory_falls_back_to_builtin() {
    let dir = TempDir::new().unwrap();
    let renderer = ViewRenderer::new(Some(&dir.path().join("nope"))).unwrap();
    assert!(renderer.has_template("base.html"));
}

#[test]
fn test_invalid_override_is_an_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.html"), "{% if %}").unwrap();
    assert!(ViewRenderer::new(Some(dir.path())).is_err());
}

#[test]
fn test_render_unknown_template_fails() {
    let renderer = ViewRenderer::builtin().unwrap();
    let err = renderer
        .render("nonexistent.html", &TeraContext::new())
        .unwrap_err();
    assert!(err.to_string().contains("nonexistent.html"));
}

#[test]
fn test_render_with_fallback_uses_error_template() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("error.html"),
        "error page: {{ status }} {{ error_title }}",
    )
    .unwrap();
    let renderer = ViewRenderer::new(Some(dir.path())).unwrap();

    let html = renderer.render_with_fallback("nonexistent.html", &TeraContext::new());
    assert_eq!(html, "error page: 500 Something went wrong");
}

#[test]
fn test_render_with_fallback_last_resort() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("error.html"), "{{ missing_variable.field }}").unwrap();
    let renderer = ViewRenderer::new(Some(dir.path())).unwrap();

    let html = renderer.render_with_fallback("nonexistent.html", &TeraContext::new());
    assert!(html.contains("<!DOCTYPE html>"));
    assert!(html.contains("Something went wrong"));
}

#[test]
fn test_simple_error_page_escapes_message() {
    let html = simple_error_page("<script>alert(1)</script>");
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
}

#[test]
fn test_templates_autoescape_user_input() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("name.html"), "{{ name }}").unwrap();
    let renderer = ViewRenderer::new(Some(dir.path())).unwrap();

    let mut context = TeraContext::new();
    context.insert("name", "<b>Bob</b>");
    let html = renderer.render("name.html", &context).unwrap();
    assert_eq!(html, "&lt;b&gt;Bob&lt;&#x2F;b&gt;");
}

#[test]
fn test_message_level_parse() {
    for level in [
        MessageLevel::Success,
        MessageLevel::Info,
        MessageLevel::Warning,
        MessageLevel::Error,
    ] {
        assert_eq!(MessageLevel::parse(level.as_str()), Some(level));
    }
    assert_eq!(MessageLevel::parse("debug"), None);
}
