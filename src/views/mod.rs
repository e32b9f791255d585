//! View rendering
//!
//! Pages are rendered with Tera. The built-in template set under
//! `templates/` is embedded in the binary; an optional override directory
//! replaces individual templates by name (e.g. `members/detail.html`).
//!
//! Every page receives the standard variables `current_user`, `messages`,
//! `request_path` and `year`.

use anyhow::{Context, Result};
use chrono::Datelike;
use rust_embed::RustEmbed;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fs;
use std::path::Path;
use tera::{Context as TeraContext, Tera};

mod error;

pub use error::ViewError;

/// Template rendered when another template fails
pub const ERROR_TEMPLATE: &str = "error.html";

/// Built-in templates compiled into the binary
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct BuiltinTemplates;

/// Renders pages from the built-in templates plus optional overrides
pub struct ViewRenderer {
    tera: Tera,
}

impl ViewRenderer {
    /// Create a renderer from the embedded templates only
    pub fn builtin() -> Result<Self> {
        Self::new(None)
    }

    /// Create a renderer, layering templates from `override_path` (if any)
    /// over the embedded set.
    pub fn new(override_path: Option<&Path>) -> Result<Self> {
        let tera = Self::load_templates(override_path)?;
        Ok(Self { tera })
    }

    fn load_templates(override_path: Option<&Path>) -> Result<Tera> {
        // Keyed by name so an override replaces the built-in template
        let mut templates: BTreeMap<String, String> = BTreeMap::new();

        for name in BuiltinTemplates::iter() {
            let file = BuiltinTemplates::get(&name)
                .ok_or_else(|| ViewError::TemplateError(format!("Missing embedded template {}", name)))?;
            let content = String::from_utf8(file.data.into_owned())
                .map_err(|_| ViewError::InvalidEncoding(name.to_string()))?;
            templates.insert(name.to_string(), content);
        }

        if let Some(dir) = override_path {
            if dir.is_dir() {
                let mut overrides = Vec::new();
                collect_templates_from_dir(dir, dir, &mut overrides)?;
                for (name, content) in overrides {
                    tracing::debug!("Template override: {}", name);
                    templates.insert(name, content);
                }
            } else {
                tracing::warn!(
                    "Template override directory {:?} does not exist, using built-in templates",
                    dir
                );
            }
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(templates.into_iter().collect::<Vec<_>>())
            .map_err(|e| ViewError::TemplateError(describe_tera_error(&e)))?;

        Ok(tera)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|t| t == name)
    }

    /// Render a template
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String> {
        self.tera.render(template, context).map_err(|e| {
            ViewError::TemplateError(format!(
                "Failed to render '{}': {}",
                template,
                describe_tera_error(&e)
            ))
            .into()
        })
    }

    /// Render a page with the standard variables added to `context`
    pub fn render_page(
        &self,
        template: &str,
        context: &TeraContext,
        standard_vars: &StandardTemplateVars,
    ) -> Result<String> {
        let mut full_context = context.clone();
        standard_vars.insert_into(&mut full_context);
        self.render(template, &full_context)
    }

    /// Render a template, falling back to the error template and then to a
    /// plain HTML page. Never fails.
    pub fn render_with_fallback(&self, template: &str, context: &TeraContext) -> String {
        match self.render(template, context) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(
                    "Failed to render template '{}': {}, trying error template",
                    template,
                    e
                );

                let mut error_context = context.clone();
                error_context.insert("status", &500);
                error_context.insert("error_title", "Something went wrong");
                error_context.insert(
                    "error_message",
                    "The page could not be displayed. Please try again later.",
                );

                match self.render(ERROR_TEMPLATE, &error_context) {
                    Ok(html) => html,
                    Err(error_template_err) => {
                        tracing::warn!(
                            "Failed to render error template: {}, returning plain error page",
                            error_template_err
                        );
                        simple_error_page("Something went wrong")
                    }
                }
            }
        }
    }
}

/// Last-resort HTML when no template can be rendered
pub fn simple_error_page(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>HealthTrack</title>
</head>
<body>
    <h1>HealthTrack</h1>
    <p>{}</p>
</body>
</html>"#,
        tera::escape_html(message)
    )
}

fn describe_tera_error(e: &tera::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

fn collect_templates_from_dir(
    base_path: &Path,
    current_path: &Path,
    templates: &mut Vec<(String, String)>,
) -> Result<()> {
    for entry in fs::read_dir(current_path)
        .with_context(|| format!("Failed to read template directory: {:?}", current_path))?
    {
        let path = entry?.path();

        if path.is_dir() {
            collect_templates_from_dir(base_path, &path, templates)?;
        } else if path.extension().map_or(false, |ext| ext == "html") {
            let relative_path = path
                .strip_prefix(base_path)
                .context("Template outside of override directory")?;
            let name = relative_path.to_string_lossy().replace('\\', "/");
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read template: {:?}", path))?;
            templates.push((name, content));
        }
    }
    Ok(())
}

/// Severity of a one-shot page message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl MessageLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// A notification shown once at the top of a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub level: MessageLevel,
    pub text: String,
}

impl Message {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            text: text.into(),
        }
    }
}

/// Signed-in user as templates see it
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUserView {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub full_name: String,
}

/// Variables every page receives
#[derive(Debug, Clone, Serialize)]
pub struct StandardTemplateVars {
    pub current_user: Option<CurrentUserView>,
    pub messages: Vec<Message>,
    pub request_path: String,
    /// Current year (footer)
    pub year: i32,
}

impl StandardTemplateVars {
    pub fn new(request_path: impl Into<String>) -> Self {
        Self {
            current_user: None,
            messages: Vec::new(),
            request_path: request_path.into(),
            year: chrono::Utc::now().year(),
        }
    }

    pub fn with_user(mut self, user: CurrentUserView) -> Self {
        self.current_user = Some(user);
        self
    }

    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    fn insert_into(&self, context: &mut TeraContext) {
        context.insert("current_user", &self.current_user);
        context.insert("messages", &self.messages);
        context.insert("request_path", &self.request_path);
        context.insert("year", &self.year);
    }
}

#[cfg(test)]
mod tests;
