//! Boundary validation of inbound payloads.

use std::collections::HashMap;

use crate::utils::error::{FieldErrors, TelemetryError};

const REQUIRED_MESSAGE: &str = "Missing data for required field.";
const INVALID_EMAIL_MESSAGE: &str = "Not a valid email address.";

/// Shape-checked login credentials.
#[derive(Debug, Clone)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

/// Validates a `{email, password}` map, collecting field-level messages.
pub fn validate_login(data: &HashMap<String, String>) -> Result<LoginPayload, TelemetryError> {
    let mut errors = FieldErrors::new();

    let email = data.get("email").map(|s| s.trim()).unwrap_or("");
    if email.is_empty() {
        errors.insert("email".to_string(), REQUIRED_MESSAGE.to_string());
    } else if !is_plausible_email(email) {
        errors.insert("email".to_string(), INVALID_EMAIL_MESSAGE.to_string());
    }

    let password = data.get("password").cloned().unwrap_or_default();
    if password.is_empty() {
        errors.insert("password".to_string(), REQUIRED_MESSAGE.to_string());
    }

    if !errors.is_empty() {
        return Err(TelemetryError::Validation(errors));
    }

    Ok(LoginPayload {
        email: email.to_string(),
        password,
    })
}

fn is_plausible_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}
