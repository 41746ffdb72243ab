use validator::{Validate, ValidationErrors};

use crate::error::{AppError, FieldError, Result};

/// Input validation utilities for blog service

pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Flatten `validator` output into the `details` list served to clients.
///
/// Fields are sorted so responses are stable across runs.
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut details: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {}", err.code));
                FieldError::new(field.clone(), message)
            })
        })
        .collect();

    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

/// Password composition rules for new or changed passwords
/// - Minimum 8 characters
/// - At least one uppercase letter
/// - At least one lowercase letter
/// - At least one digit
pub fn password_errors(password: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if password.chars().count() < PASSWORD_MIN_LENGTH {
        errors.push(FieldError::new(
            "password",
            "Password must be at least 8 characters",
        ));
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        errors.push(FieldError::new(
            "password",
            "Password must contain at least one uppercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        errors.push(FieldError::new(
            "password",
            "Password must contain at least one lowercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push(FieldError::new(
            "password",
            "Password must contain at least one number",
        ));
    }

    errors
}

/// Run derive rules; fail with every field error at once
pub fn check<T: Validate>(input: &T) -> Result<()> {
    check_with_password(input, None)
}

/// Run derive rules plus password composition rules when a password is supplied
pub fn check_with_password<T: Validate>(input: &T, password: Option<&str>) -> Result<()> {
    let mut details = match input.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => field_errors(&errors),
    };

    if let Some(password) = password {
        details.extend(password_errors(password));
    }

    if details.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(details))
    }
}

/// Emails are compared and stored trimmed and lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
