// src/seller/validators.rs

use super::models::*;
use crate::common::validation::{check_email, check_otp, check_text};
use crate::common::{ValidationResult, Validator};

pub const MAX_BUSINESS_NAME_LENGTH: usize = 120;
pub const MAX_CONTACT_NAME_LENGTH: usize = 100;

// ============================================================================
// Seller Validators
// ============================================================================

pub struct SignupSendOtpValidator;

impl Validator<SignupSendOtpRequest> for SignupSendOtpValidator {
    fn validate(&self, data: &SignupSendOtpRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        check_email(&mut result, "email", &data.email);

        if let Some(name) = &data.name {
            if name.trim().chars().count() > MAX_CONTACT_NAME_LENGTH {
                result.add_error(
                    "name",
                    &format!("Name must not exceed {} characters", MAX_CONTACT_NAME_LENGTH),
                );
            }
        }

        result
    }
}

pub struct VerifyOtpValidator;

impl Validator<VerifyOtpRequest> for VerifyOtpValidator {
    fn validate(&self, data: &VerifyOtpRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        check_email(&mut result, "email", &data.email);
        check_otp(&mut result, "otp", &data.otp);
        result
    }
}

pub struct CompleteSignupValidator;

impl Validator<CompleteSignupRequest> for CompleteSignupValidator {
    fn validate(&self, data: &CompleteSignupRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        check_email(&mut result, "email", &data.email);
        check_text(
            &mut result,
            "businessName",
            &data.business_name,
            "Business name",
            MAX_BUSINESS_NAME_LENGTH,
        );
        if data.signup_token.trim().is_empty() {
            result.add_error("signupToken", "Signup token is required");
        }
        result
    }
}

pub struct LoginSendOtpValidator;

impl Validator<LoginSendOtpRequest> for LoginSendOtpValidator {
    fn validate(&self, data: &LoginSendOtpRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        check_email(&mut result, "email", &data.email);
        result
    }
}
