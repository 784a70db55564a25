// src/services/email.rs
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::common::safe_email_log;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email provider not configured: {0}")]
    NotConfigured(String),

    #[error("Email delivery failed: {0}")]
    Delivery(String),
}

/// A rendered message ready for dispatch
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// Outbound email transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError>;
}

/// Development transport: records that a message would have been sent.
///
/// Only the masked recipient and a fixed description are logged; the subject
/// and bodies contain the code and stay out of the logs.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        info!(
            to = %safe_email_log(&email.to),
            html_bytes = email.html_body.len(),
            "Email delivery skipped (log provider)"
        );
        Ok(())
    }
}

/// Renders the verification code email.
///
/// Both bodies carry the code and the expiry notice.
pub fn render_otp_email(to: &str, name: &str, code: &str, ttl_minutes: u64) -> OutgoingEmail {
    let greeting_name = if name.trim().is_empty() {
        "there"
    } else {
        name.trim()
    };

    let subject = format!("{} is your verification code", code);

    let html_body = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .header {{ background-color: #4F46E5; color: white; padding: 20px; text-align: center; }}
        .content {{ padding: 20px; background-color: #f9f9f9; }}
        .code {{ font-size: 32px; font-weight: bold; letter-spacing: 8px; text-align: center; padding: 16px; background-color: #EEF2FF; border-radius: 8px; margin: 20px 0; }}
        .footer {{ padding: 20px; text-align: center; font-size: 12px; color: #666; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Verify your email</h1>
        </div>
        <div class="content">
            <p>Hi {},</p>

            <p>Use the following code to continue:</p>

            <div class="code">{}</div>

            <p>This code expires in <strong>{} minutes</strong>. If you did not request it, you can ignore this email.</p>
        </div>
        <div class="footer">
            <p>This is an automated message. Please do not reply directly to this email.</p>
        </div>
    </div>
</body>
</html>"#,
        escape_html(greeting_name),
        code,
        ttl_minutes
    );

    let text_body = format!(
        "Hi {},\n\nYour verification code is {}.\n\nThis code expires in {} minutes. If you did not request it, you can ignore this email.\n",
        greeting_name, code, ttl_minutes
    );

    OutgoingEmail {
        to: to.to_string(),
        subject,
        html_body,
        text_body,
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Captures messages instead of delivering them
    #[derive(Debug, Default)]
    pub struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
        fail: bool,
    }

    impl RecordingMailer {
        pub fn failing() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn sent(&self) -> Vec<OutgoingEmail> {
            self.sent.lock().unwrap().clone()
        }

        /// Six-digit code from the most recent message to `to`
        pub fn last_code_for(&self, to: &str) -> Option<String> {
            self.sent()
                .iter()
                .rev()
                .find(|email| email.to == to)
                .and_then(|email| email.subject.split_whitespace().next().map(str::to_string))
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
            if self.fail {
                return Err(EmailError::Delivery("simulated outage".to_string()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_email_contains_code_and_expiry() {
        let email = render_otp_email("seller@shop.example", "Dana", "482913", 5);
        assert_eq!(email.to, "seller@shop.example");
        assert!(email.subject.contains("482913"));
        assert!(email.html_body.contains("482913"));
        assert!(email.html_body.contains("5 minutes"));
        assert!(email.text_body.contains("482913"));
        assert!(email.text_body.contains("5 minutes"));
        assert!(email.text_body.starts_with("Hi Dana,"));
    }

    #[test]
    fn test_otp_email_escapes_name() {
        let email = render_otp_email("a@b.co", "<script>", "111111", 5);
        assert!(!email.html_body.contains("<script>"));
        assert!(email.html_body.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_otp_email_blank_name() {
        let email = render_otp_email("a@b.co", "  ", "111111", 5);
        assert!(email.text_body.starts_with("Hi there,"));
    }
}
