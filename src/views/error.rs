//! View rendering error types

use thiserror::Error;

/// Template loading and rendering errors
#[derive(Debug, Error)]
pub enum ViewError {
    /// A template failed to parse or render
    #[error("Template error: {0}")]
    TemplateError(String),

    /// An embedded template is not valid UTF-8
    #[error("Template {0} is not valid UTF-8")]
    InvalidEncoding(String),

    /// IO error while reading override templates
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
