// src/services/mod.rs
//
// Shared services module containing business logic services
// that can be used across the portal modules

pub mod aws;
pub mod email;
pub mod monitoring;
pub mod otp;
pub mod store;

// Re-export commonly used types for convenience
pub use aws::SesMailer;
pub use email::{LogMailer, Mailer};
pub use otp::{OtpConfig, OtpPurpose, OtpService};
pub use store::{MemoryStore, SqliteStore, TtlStore};
