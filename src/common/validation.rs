// Common validation types and traits

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.is_valid = false;
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    /// Converts into `Err(ApiError)` when any rule failed
    pub fn into_result(self) -> Result<(), super::ApiError> {
        if self.is_valid {
            Ok(())
        } else {
            Err(self.into())
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

pub trait Validator<T> {
    fn validate(&self, data: &T) -> ValidationResult;
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("valid email regex")
    })
}

/// Checks an email address field
pub fn check_email(result: &mut ValidationResult, field: &str, value: &str) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        result.add_error(field, "Email is required");
    } else if trimmed.len() > 254 || !email_pattern().is_match(trimmed) {
        result.add_error(field, "Email address is not valid");
    }
}

/// Checks a submitted one-time code: exactly six ASCII digits
pub fn check_otp(result: &mut ValidationResult, field: &str, value: &str) {
    let trimmed = value.trim();
    if trimmed.len() != 6 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        result.add_error(field, "Verification code must be 6 digits");
    }
}

/// Checks a required free-text field with a maximum length
pub fn check_text(result: &mut ValidationResult, field: &str, value: &str, label: &str, max: usize) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        result.add_error(field, &format!("{} is required", label));
    } else if trimmed.chars().count() > max {
        result.add_error(
            field,
            &format!("{} must not exceed {} characters", label, max),
        );
    }
}
