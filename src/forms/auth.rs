//! Registration and login forms
//!
//! Password strength follows the usual account-system rules: a minimum
//! length, not purely numeric, not a well-known password, and not too close
//! to the user's own attributes.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{optional_text, required_text, FormErrors, REQUIRED};
use crate::models::CreateUserInput;

pub const USERNAME_MAX_LENGTH: usize = 150;
pub const NAME_MAX_LENGTH: usize = 50;
pub const EMAIL_MAX_LENGTH: usize = 254;
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Maximum allowed similarity between a password and a user attribute
const MAX_SIMILARITY: f64 = 0.7;

static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w.@+-]+$").expect("Failed to compile username regex")
});

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^[a-z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)+$",
    )
    .expect("Failed to compile email regex")
});

static ATTRIBUTE_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\W+").expect("Failed to compile attribute split regex"));

/// Passwords rejected outright, compared case-insensitively
const COMMON_PASSWORDS: &[&str] = &[
    "123456", "123456789", "12345678", "password", "qwerty", "123123", "111111",
    "1234567890", "1234567", "qwerty123", "000000", "1q2w3e", "aa12345678", "abc123",
    "password1", "1234", "qwertyuiop", "123321", "password123", "1q2w3e4r5t", "iloveyou",
    "654321", "666666", "987654321", "123", "123456a", "qwe123", "1q2w3e4r", "7777777",
    "1qaz2wsx", "123qwe", "zxcvbnm", "121212", "asdasd", "a123456", "555555", "dragon",
    "112233", "123123123", "monkey", "11111111", "qazwsx", "159753", "asdfghjkl",
    "222222", "1234qwer", "qwerty1", "123654", "123abc", "asdfgh", "777777", "aaaaaa",
    "myspace1", "88888888", "fuckyou", "123456789a", "999999", "888888", "football",
    "princess", "789456123", "147258369", "1111111", "sunshine", "michael", "computer",
    "qwer1234", "daniel", "789456", "11111", "abcd1234", "q1w2e3r4", "shadow", "159357",
    "123456q", "1111", "samsung", "killer", "asd123", "superman", "master", "12345a",
    "azerty", "zxcvbn", "qazwsxedc", "131313", "ashley", "target123", "987654",
    "baseball", "qwert", "asdasd123", "qwerty12", "soccer", "charlie", "qweasdzxc",
    "letmein", "welcome", "trustno1", "passw0rd", "starwars", "whatever", "freedom",
    "jennifer", "hunter", "hunter2", "buster", "jordan", "thomas", "hello123",
    "changeme", "admin", "admin123", "root", "secret", "pass1234", "welcome1",
];

/// Submitted registration form
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password1: String,
    #[serde(skip_serializing)]
    pub password2: String,
}

impl RegisterForm {
    /// Validate every field. Username uniqueness is checked by the user
    /// service, which reports it on the `username` field.
    pub fn validate(&self) -> Result<CreateUserInput, FormErrors> {
        let mut errors = FormErrors::new();

        let username = required_text(&mut errors, "username", &self.username, USERNAME_MAX_LENGTH);
        if !username.is_empty() && !USERNAME_REGEX.is_match(&username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        let email = required_text(&mut errors, "email", &self.email, EMAIL_MAX_LENGTH);
        if !email.is_empty() && !is_valid_email(&email) {
            errors.add("email", "Enter a valid email address.");
        }

        let first_name = required_text(&mut errors, "first_name", &self.first_name, NAME_MAX_LENGTH);
        let last_name = required_text(&mut errors, "last_name", &self.last_name, NAME_MAX_LENGTH);

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        }
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        }

        if !self.password1.is_empty() && !self.password2.is_empty() {
            if self.password1 != self.password2 {
                errors.add("password2", "The two password fields didn’t match.");
            } else {
                let attributes = [
                    ("username", username.as_str()),
                    ("first name", first_name.as_str()),
                    ("last name", last_name.as_str()),
                    ("email address", email.as_str()),
                ];
                for message in password_strength_errors(&self.password2, &attributes) {
                    errors.add("password2", message);
                }
            }
        }

        errors.finish(CreateUserInput {
            username,
            email,
            password: self.password1.clone(),
            first_name,
            last_name,
        })
    }
}

/// Submitted login form
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl LoginForm {
    /// Both fields must be present; returns the trimmed username and the password
    pub fn validate(&self) -> Result<(String, String), FormErrors> {
        let mut errors = FormErrors::new();
        let username = optional_text(&mut errors, "username", &self.username, USERNAME_MAX_LENGTH);
        if username.is_empty() {
            errors.add("username", REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.finish((username, self.password.clone()))
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Every strength rule the password breaks, in a stable order.
///
/// `attributes` pairs a human readable attribute name with its value.
pub fn password_strength_errors(password: &str, attributes: &[(&str, &str)]) -> Vec<String> {
    let mut messages = Vec::new();

    if let Some(name) = too_similar_attribute(password, attributes) {
        messages.push(format!("The password is too similar to the {}.", name));
    }
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        messages.push(format!(
            "This password is too short. It must contain at least {} characters.",
            PASSWORD_MIN_LENGTH
        ));
    }
    if is_common_password(password) {
        messages.push("This password is too common.".to_string());
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        messages.push("This password is entirely numeric.".to_string());
    }

    messages
}

fn is_common_password(password: &str) -> bool {
    let candidate = password.trim().to_lowercase();
    COMMON_PASSWORDS.iter().any(|common| *common == candidate)
}

/// Name of the first attribute the password resembles too closely.
///
/// Each attribute is compared whole and split on non-word characters (so
/// `alice@example.com` also yields `alice`, `example` and `com`). Parts much
/// shorter than the password are skipped.
fn too_similar_attribute<'a>(password: &str, attributes: &[(&'a str, &str)]) -> Option<&'a str> {
    let password = password.to_lowercase();

    for &(name, value) in attributes {
        if value.is_empty() {
            continue;
        }
        let value = value.to_lowercase();
        let parts = ATTRIBUTE_SPLIT
            .split(&value)
            .chain(std::iter::once(value.as_str()));

        for part in parts {
            if exceeds_length_ratio(&password, part) {
                continue;
            }
            if quick_ratio(&password, part) >= MAX_SIMILARITY {
                return Some(name);
            }
        }
    }
    None
}

/// A password ten times longer than the attribute cannot be "similar" to it
fn exceeds_length_ratio(password: &str, part: &str) -> bool {
    let password_len = password.chars().count();
    let part_len = part.chars().count();
    let length_bound = MAX_SIMILARITY / 2.0 * password_len as f64;
    password_len >= 10 * part_len && (part_len as f64) < length_bound
}

/// Upper bound on the matching-blocks similarity ratio: twice the size of
/// the character multiset intersection over the combined length.
fn quick_ratio(a: &str, b: &str) -> f64 {
    let total = a.chars().count() + b.chars().count();
    if total == 0 {
        return 1.0;
    }

    let mut available: HashMap<char, usize> = HashMap::new();
    for c in b.chars() {
        *available.entry(c).or_default() += 1;
    }

    let mut matches = 0usize;
    for c in a.chars() {
        if let Some(count) = available.get_mut(&c) {
            if *count > 0 {
                *count -= 1;
                matches += 1;
            }
        }
    }

    2.0 * matches as f64 / total as f64
}
