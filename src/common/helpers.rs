// Helper functions for safe logging and input normalization

use serde_json::Value;

/// JSON keys whose values must never reach the logs
const SENSITIVE_KEYS: &[&str] = &["otp", "code", "token", "password", "hashedOtp", "signupToken", "grantHash"];

/// Masks email addresses for safe logging
/// Prevents sensitive data exposure while preserving debugging utility
///
/// # Example
/// ```ignore
/// let masked = safe_email_log("user@example.com");
/// // Returns: "u***@example.com"
/// ```
pub fn safe_email_log(email: &str) -> String {
    let parts: Vec<&str> = email.split('@').collect();
    match (parts.as_slice(), email.len() > 3) {
        ([local, domain], true) => match local.chars().next() {
            Some(first) => format!("{}***@{}", first, domain),
            None => "***@***.***".to_string(),
        },
        _ => "***@***.***".to_string(),
    }
}

/// Masks tokens for safe logging
/// Shows only first and last 4 characters
pub fn safe_token_log(token: &str) -> String {
    if token.len() > 8 && token.is_ascii() {
        format!("{}...{}", &token[..4], &token[token.len() - 4..])
    } else {
        "***".to_string()
    }
}

/// Canonical form used for every per-email store key
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Replaces sensitive values in a JSON document with a fixed marker
pub fn redact_sensitive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map.iter_mut() {
                if SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key)) {
                    *inner = Value::String("[REDACTED]".to_string());
                } else {
                    redact_sensitive(inner);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_sensitive),
        _ => {}
    }
}
