//! One-shot notifications carried across a redirect
//!
//! The message rides in a `flash` cookie (`level|text`, URL-encoded) that the
//! next rendered page displays and clears.

use axum::{
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};

use crate::views::{Message, MessageLevel};
use crate::web::middleware::read_cookie;

pub const FLASH_COOKIE: &str = "flash";

/// `Set-Cookie` value carrying `message`
pub fn flash_cookie(message: &Message) -> String {
    let raw = format!("{}|{}", message.level.as_str(), message.text);
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        FLASH_COOKIE,
        urlencoding::encode(&raw)
    )
}

/// `Set-Cookie` value removing the flash cookie
pub fn clear_flash_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", FLASH_COOKIE)
}

/// Messages waiting in the request's flash cookie
pub fn read_flash(headers: &HeaderMap) -> Vec<Message> {
    let Some(raw) = read_cookie(headers, FLASH_COOKIE).filter(|v| !v.is_empty()) else {
        return Vec::new();
    };
    let decoded = match urlencoding::decode(&raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => return Vec::new(),
    };

    let message = match decoded.split_once('|') {
        Some((level, text)) => Message {
            level: MessageLevel::parse(level).unwrap_or(MessageLevel::Info),
            text: text.to_string(),
        },
        None => Message {
            level: MessageLevel::Info,
            text: decoded,
        },
    };
    vec![message]
}

/// 303 redirect to `to` that shows `message` on the next page
pub fn redirect_with_flash(to: &str, message: Message) -> Response {
    (
        AppendHeaders([(header::SET_COOKIE, flash_cookie(&message))]),
        Redirect::to(to),
    )
        .into_response()
}
