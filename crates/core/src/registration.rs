//! Registration and login form validation.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::CoreError;

static USERNAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._]+$").expect("username regex is valid"));

/// Fields submitted by the registration form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegistrationForm {
    #[validate(
        length(
            min = 4,
            max = 25,
            message = "Username must be between 4 and 25 characters"
        ),
        custom(function = "username_chars")
    )]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords should match!"))]
    pub password2: String,
}

fn username_chars(username: &str) -> Result<(), ValidationError> {
    if USERNAME_CHARS.is_match(username) {
        Ok(())
    } else {
        Err(ValidationError::new("username_chars").with_message(
            "Username may only contain letters, numbers, periods and underscores".into(),
        ))
    }
}

impl RegistrationForm {
    /// Validate the form, folding every field error into one message.
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate().map_err(|e| CoreError::Validation(join_messages(&e)))
    }
}

/// Flatten validator errors into a single, deterministic message.
fn join_messages(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(msg) => msg.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}
