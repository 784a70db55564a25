// src/services/aws.rs
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sesv2::config::Region;
use aws_sdk_sesv2::types::{Body as SesBody, Content, Destination, EmailContent, Message};
use aws_sdk_sesv2::Client as SesClient;
use tracing::{error, info};

use super::email::{EmailError, Mailer, OutgoingEmail};
use crate::common::safe_email_log;

/// Delivers mail through AWS SESv2.
///
/// Credentials come from the default AWS provider chain.
#[derive(Debug, Clone)]
pub struct SesMailer {
    client: SesClient,
    from_email: String,
}

impl SesMailer {
    pub async fn new(from_email: Option<String>, region: Option<String>) -> Result<Self, EmailError> {
        let from_email = from_email
            .filter(|from| !from.trim().is_empty())
            .ok_or_else(|| EmailError::NotConfigured("AWS_SES_FROM_EMAIL is not set".to_string()))?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let aws_config = loader.load().await;

        info!(from = %safe_email_log(&from_email), "SES mailer initialized");

        Ok(Self {
            client: SesClient::new(&aws_config),
            from_email,
        })
    }
}

fn utf8_content(data: &str) -> Result<Content, EmailError> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|e| EmailError::Delivery(format!("Failed to build content: {}", e)))
}

#[async_trait]
impl Mailer for SesMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let destination = Destination::builder()
            .to_addresses(email.to.clone())
            .build();

        let body = SesBody::builder()
            .html(utf8_content(&email.html_body)?)
            .text(utf8_content(&email.text_body)?)
            .build();

        let message = Message::builder()
            .subject(utf8_content(&email.subject)?)
            .body(body)
            .build();

        let result = self
            .client
            .send_email()
            .from_email_address(&self.from_email)
            .destination(destination)
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    to = %safe_email_log(&email.to),
                    "Failed to send email via SES"
                );
                EmailError::Delivery(format!("Send failed: {}", e))
            })?;

        info!(
            to = %safe_email_log(&email.to),
            message_id = ?result.message_id(),
            "Email sent successfully via SES"
        );

        Ok(())
    }
}
