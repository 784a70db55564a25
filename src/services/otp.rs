// src/services/otp.rs
//! One-time passcode issuance and verification
//!
//! Per email (and purpose) there is at most one live code. Codes are stored
//! only as Argon2 hashes, expire after `ttl_seconds`, and are deleted once
//! `max_attempts` wrong guesses have been charged. Sending is capped at
//! `max_requests_per_window` per email.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::{rngs::OsRng, Rng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::email::{render_otp_email, Mailer};
use super::store::{get_json, replace_json, set_json, StoreError, TtlStore};
use crate::common::config::{parse_bounded, ConfigError, EnvLookup};
use crate::common::{normalize_email, safe_email_log};

pub const INVALID_OR_EXPIRED_MESSAGE: &str = "Invalid or expired verification code";
pub const TOO_MANY_ATTEMPTS_MESSAGE: &str =
    "Too many failed attempts. Please request a new verification code.";
pub const MISMATCH_MESSAGE: &str = "Invalid verification code";

const MAX_OTP_TTL_SECONDS: u64 = 24 * 60 * 60;
const MAX_OTP_ATTEMPTS: u32 = 100;
const MAX_REQUESTS_PER_WINDOW: u32 = 1_000;
const MAX_RATE_WINDOW_SECONDS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpConfig {
    pub ttl_seconds: u64,
    pub max_attempts: u32,
    pub max_requests_per_window: u32,
    pub window_seconds: u64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 5 * 60,
            max_attempts: 5,
            max_requests_per_window: 3,
            window_seconds: 60 * 60,
        }
    }
}

impl OtpConfig {
    pub fn from_lookup(lookup: EnvLookup<'_>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            ttl_seconds: parse_bounded(
                lookup,
                "OTP_TTL_SECONDS",
                defaults.ttl_seconds,
                1,
                MAX_OTP_TTL_SECONDS,
            )?,
            max_attempts: parse_bounded(
                lookup,
                "OTP_MAX_ATTEMPTS",
                defaults.max_attempts,
                1,
                MAX_OTP_ATTEMPTS,
            )?,
            max_requests_per_window: parse_bounded(
                lookup,
                "OTP_MAX_REQUESTS_PER_HOUR",
                defaults.max_requests_per_window,
                1,
                MAX_REQUESTS_PER_WINDOW,
            )?,
            window_seconds: parse_bounded(
                lookup,
                "OTP_RATE_WINDOW_SECONDS",
                defaults.window_seconds,
                1,
                MAX_RATE_WINDOW_SECONDS,
            )?,
        })
    }

    pub fn ttl_minutes(&self) -> u64 {
        (self.ttl_seconds + 59) / 60
    }
}

/// Flow a code belongs to; codes never cross flows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    SellerSignup,
    SellerLogin,
    AdminLogin,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::SellerSignup => "seller_signup",
            OtpPurpose::SellerLogin => "seller_login",
            OtpPurpose::AdminLogin => "admin_login",
        }
    }

    fn record_key(&self, email: &str) -> String {
        format!("otp:{}:{}", self.as_str(), email)
    }

    fn rate_key(&self, email: &str) -> String {
        format!("otp_rate:{}:{}", self.as_str(), email)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRecord {
    pub hashed_otp: String,
    pub email: String,
    pub attempts: u32,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    /// Hash of the completion grant handed to the client that verified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitRecord {
    pub count: u32,
    pub reset_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitStatus {
    pub fn retry_after_seconds(&self) -> i64 {
        (self.reset_at - Utc::now()).num_seconds().max(0)
    }
}

/// Result of checking a submitted code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    Mismatch { attempts_remaining: u32 },
    NotFound,
    TooManyAttempts,
}

impl VerifyOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, VerifyOutcome::Verified)
    }

    pub fn error_message(&self) -> Option<&'static str> {
        match self {
            VerifyOutcome::Verified => None,
            VerifyOutcome::Mismatch { .. } => Some(MISMATCH_MESSAGE),
            VerifyOutcome::NotFound => Some(INVALID_OR_EXPIRED_MESSAGE),
            VerifyOutcome::TooManyAttempts => Some(TOO_MANY_ATTEMPTS_MESSAGE),
        }
    }

    pub fn code(&self) -> Option<&'static str> {
        match self {
            VerifyOutcome::Verified => None,
            VerifyOutcome::Mismatch { .. } => Some("OTP_MISMATCH"),
            VerifyOutcome::NotFound => Some("OTP_INVALID_OR_EXPIRED"),
            VerifyOutcome::TooManyAttempts => Some("OTP_TOO_MANY_ATTEMPTS"),
        }
    }

    pub fn attempts_remaining(&self) -> Option<u32> {
        match self {
            VerifyOutcome::Mismatch { attempts_remaining } => Some(*attempts_remaining),
            VerifyOutcome::TooManyAttempts => Some(0),
            _ => None,
        }
    }

    pub fn to_response(&self) -> VerifyResponse {
        VerifyResponse {
            success: self.is_success(),
            error: self.error_message().map(str::to_string),
            code: self.code().map(str::to_string),
            attempts_remaining: self.attempts_remaining(),
        }
    }
}

/// Wire form of [`VerifyOutcome`]
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_remaining: Option<u32>,
}

/// Result of a send request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    RateLimited(RateLimitStatus),
    DeliveryFailed,
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent)
    }
}

#[derive(Debug, Error)]
pub enum OtpError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Hashing error: {0}")]
    Hash(String),

    #[error("Rate window of {0} seconds is out of range")]
    Window(u64),
}

#[derive(Clone)]
pub struct OtpService {
    store: Arc<dyn TtlStore>,
    mailer: Arc<dyn Mailer>,
    config: OtpConfig,
}

impl OtpService {
    pub fn new(store: Arc<dyn TtlStore>, mailer: Arc<dyn Mailer>, config: OtpConfig) -> Self {
        info!(
            ttl_seconds = config.ttl_seconds,
            max_attempts = config.max_attempts,
            max_requests_per_window = config.max_requests_per_window,
            window_seconds = config.window_seconds,
            "Initializing OtpService"
        );
        Self {
            store,
            mailer,
            config,
        }
    }

    pub fn config(&self) -> &OtpConfig {
        &self.config
    }

    /// Uniformly random code in 100000..=999999
    pub fn generate() -> String {
        OsRng.gen_range(100_000..=999_999u32).to_string()
    }

    /// Counts one send request against the hourly cap.
    ///
    /// A refused request leaves the stored count untouched.
    pub async fn check_rate_limit(
        &self,
        purpose: OtpPurpose,
        email: &str,
    ) -> Result<RateLimitStatus, OtpError> {
        let email = normalize_email(email);
        let key = purpose.rate_key(&email);
        let max = self.config.max_requests_per_window;
        let now = Utc::now();

        let existing: Option<RateLimitRecord> = get_json(self.store.as_ref(), &key).await?;

        match existing {
            Some(record) if now < record.reset_at => {
                if record.count >= max {
                    warn!(
                        email = %safe_email_log(&email),
                        purpose = %purpose.as_str(),
                        count = record.count,
                        "OTP send refused by rate limit"
                    );
                    return Ok(RateLimitStatus {
                        allowed: false,
                        remaining: 0,
                        reset_at: record.reset_at,
                    });
                }

                let updated = RateLimitRecord {
                    count: record.count + 1,
                    reset_at: record.reset_at,
                };
                if !replace_json(self.store.as_ref(), &key, &updated).await? {
                    // Window vanished between read and write; start a new one.
                    return self.open_window(&key, now).await;
                }
                Ok(RateLimitStatus {
                    allowed: true,
                    remaining: max.saturating_sub(updated.count),
                    reset_at: updated.reset_at,
                })
            }
            _ => self.open_window(&key, now).await,
        }
    }

    async fn open_window(&self, key: &str, now: DateTime<Utc>) -> Result<RateLimitStatus, OtpError> {
        let window = Duration::from_secs(self.config.window_seconds);
        let reset_at = i64::try_from(self.config.window_seconds)
            .ok()
            .and_then(ChronoDuration::try_seconds)
            .and_then(|span| now.checked_add_signed(span))
            .ok_or(OtpError::Window(self.config.window_seconds))?;
        let record = RateLimitRecord { count: 1, reset_at };
        set_json(self.store.as_ref(), key, &record, window).await?;
        Ok(RateLimitStatus {
            allowed: self.config.max_requests_per_window >= 1,
            remaining: self.config.max_requests_per_window.saturating_sub(1),
            reset_at: record.reset_at,
        })
    }

    /// Hashes `otp` and stores it, superseding any earlier code for the email
    pub async fn store_otp(&self, purpose: OtpPurpose, email: &str, otp: &str) -> Result<(), OtpError> {
        let email = normalize_email(email);
        let hashed_otp = hash_code(otp.to_string()).await?;

        let record = OtpRecord {
            hashed_otp,
            email: email.clone(),
            attempts: 0,
            verified: false,
            created_at: Utc::now(),
            grant_hash: None,
        };

        set_json(
            self.store.as_ref(),
            &purpose.record_key(&email),
            &record,
            Duration::from_secs(self.config.ttl_seconds),
        )
        .await?;

        debug!(
            email = %safe_email_log(&email),
            purpose = %purpose.as_str(),
            "OTP record stored"
        );
        Ok(())
    }

    /// Checks a submitted code.
    ///
    /// The attempt is persisted before the hash comparison runs.
    pub async fn verify(
        &self,
        purpose: OtpPurpose,
        email: &str,
        input_otp: &str,
    ) -> Result<VerifyOutcome, OtpError> {
        let email = normalize_email(email);
        let key = purpose.record_key(&email);
        let max = self.config.max_attempts;

        let Some(mut record) = get_json::<OtpRecord>(self.store.as_ref(), &key).await? else {
            debug!(email = %safe_email_log(&email), purpose = %purpose.as_str(), "No OTP record");
            return Ok(VerifyOutcome::NotFound);
        };

        if record.attempts >= max {
            self.store.delete(&key).await?;
            warn!(
                email = %safe_email_log(&email),
                purpose = %purpose.as_str(),
                "OTP record exhausted, deleted"
            );
            return Ok(VerifyOutcome::TooManyAttempts);
        }

        record.attempts += 1;
        if !replace_json(self.store.as_ref(), &key, &record).await? {
            return Ok(VerifyOutcome::NotFound);
        }

        if !code_matches(input_otp.trim().to_string(), record.hashed_otp.clone()).await? {
            if record.attempts >= max {
                self.store.delete(&key).await?;
                warn!(
                    email = %safe_email_log(&email),
                    purpose = %purpose.as_str(),
                    attempts = record.attempts,
                    "OTP verification failed, attempts exhausted"
                );
                return Ok(VerifyOutcome::TooManyAttempts);
            }

            let attempts_remaining = max - record.attempts;
            info!(
                email = %safe_email_log(&email),
                purpose = %purpose.as_str(),
                attempts_remaining = attempts_remaining,
                "OTP verification failed"
            );
            return Ok(VerifyOutcome::Mismatch { attempts_remaining });
        }

        record.attempts = 0;
        record.verified = true;
        if !replace_json(self.store.as_ref(), &key, &record).await? {
            return Ok(VerifyOutcome::NotFound);
        }

        info!(
            email = %safe_email_log(&email),
            purpose = %purpose.as_str(),
            "OTP verified"
        );
        Ok(VerifyOutcome::Verified)
    }

    /// Whether a live record exists and has been verified
    pub async fn is_verified(&self, purpose: OtpPurpose, email: &str) -> Result<bool, OtpError> {
        let email = normalize_email(email);
        let record: Option<OtpRecord> =
            get_json(self.store.as_ref(), &purpose.record_key(&email)).await?;
        Ok(record.map(|r| r.verified).unwrap_or(false))
    }

    /// Attaches a fresh completion grant to a verified record.
    ///
    /// The plaintext grant is returned once and only its hash is stored.
    /// `None` when there is no verified record.
    pub async fn issue_grant(
        &self,
        purpose: OtpPurpose,
        email: &str,
    ) -> Result<Option<String>, OtpError> {
        let email = normalize_email(email);
        let key = purpose.record_key(&email);

        let Some(mut record) = get_json::<OtpRecord>(self.store.as_ref(), &key).await? else {
            return Ok(None);
        };
        if !record.verified {
            return Ok(None);
        }

        let grant = generate_grant();
        record.grant_hash = Some(hash_code(grant.clone()).await?);
        if !replace_json(self.store.as_ref(), &key, &record).await? {
            return Ok(None);
        }

        debug!(email = %safe_email_log(&email), purpose = %purpose.as_str(), "Completion grant issued");
        Ok(Some(grant))
    }

    /// Whether `grant` is the one issued for the verified record
    pub async fn grant_matches(
        &self,
        purpose: OtpPurpose,
        email: &str,
        grant: &str,
    ) -> Result<bool, OtpError> {
        let email = normalize_email(email);
        let record: Option<OtpRecord> =
            get_json(self.store.as_ref(), &purpose.record_key(&email)).await?;

        match record {
            Some(OtpRecord {
                verified: true,
                grant_hash: Some(hash),
                ..
            }) => code_matches(grant.trim().to_string(), hash).await,
            _ => Ok(false),
        }
    }

    /// Deletes the record once its purpose is fulfilled
    pub async fn clear(&self, purpose: OtpPurpose, email: &str) -> Result<(), OtpError> {
        let email = normalize_email(email);
        self.store.delete(&purpose.record_key(&email)).await?;
        debug!(email = %safe_email_log(&email), purpose = %purpose.as_str(), "OTP record cleared");
        Ok(())
    }

    /// Rate-checks, stores and emails `otp`.
    ///
    /// When refused nothing is stored and nothing is sent.
    pub async fn send_email(
        &self,
        purpose: OtpPurpose,
        email: &str,
        otp: &str,
        name: &str,
    ) -> Result<SendOutcome, OtpError> {
        let email = normalize_email(email);

        let status = self.check_rate_limit(purpose, &email).await?;
        if !status.allowed {
            return Ok(SendOutcome::RateLimited(status));
        }

        self.store_otp(purpose, &email, otp).await?;

        let message = render_otp_email(&email, name, otp, self.config.ttl_minutes());
        match self.mailer.send(&message).await {
            Ok(()) => {
                info!(
                    email = %safe_email_log(&email),
                    purpose = %purpose.as_str(),
                    remaining = status.remaining,
                    "OTP email dispatched"
                );
                Ok(SendOutcome::Sent)
            }
            Err(e) => {
                error!(
                    error = %e,
                    email = %safe_email_log(&email),
                    purpose = %purpose.as_str(),
                    "OTP email dispatch failed"
                );
                Ok(SendOutcome::DeliveryFailed)
            }
        }
    }
}

/// 32 random bytes, hex encoded
fn generate_grant() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

async fn hash_code(code: String) -> Result<String, OtpError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(code.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| OtpError::Hash(e.to_string()))
    })
    .await
    .map_err(|e| OtpError::Hash(e.to_string()))?
}

async fn code_matches(input: String, hashed: String) -> Result<bool, OtpError> {
    tokio::task::spawn_blocking(move || match PasswordHash::new(&hashed) {
        Ok(parsed) => Argon2::default()
            .verify_password(input.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            error!(error = %e, "Stored OTP hash is unreadable");
            false
        }
    })
    .await
    .map_err(|e| OtpError::Hash(e.to_string()))
}
