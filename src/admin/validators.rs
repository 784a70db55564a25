// src/admin/validators.rs

use super::models::*;
use crate::auth::models::SellerStatus;
use crate::common::validation::{check_email, check_otp};
use crate::common::{ValidationResult, Validator};

pub const MAX_REASON_LENGTH: usize = 500;

pub struct AdminSendOtpValidator;

impl Validator<AdminSendOtpRequest> for AdminSendOtpValidator {
    fn validate(&self, data: &AdminSendOtpRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        check_email(&mut result, "email", &data.email);
        result
    }
}

pub struct AdminVerifyValidator;

impl Validator<AdminVerifyRequest> for AdminVerifyValidator {
    fn validate(&self, data: &AdminVerifyRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        check_email(&mut result, "email", &data.email);
        check_otp(&mut result, "otp", &data.otp);
        result
    }
}

pub struct UpdateSellerStatusValidator;

impl Validator<UpdateSellerStatusRequest> for UpdateSellerStatusValidator {
    fn validate(&self, data: &UpdateSellerStatusRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.status.parse::<SellerStatus>().is_err() {
            result.add_error(
                "status",
                "Status must be one of: pending, approved, suspended, rejected",
            );
        }

        if let Some(reason) = &data.reason {
            if reason.chars().count() > MAX_REASON_LENGTH {
                result.add_error(
                    "reason",
                    &format!("Reason must not exceed {} characters", MAX_REASON_LENGTH),
                );
            }
        }

        result
    }
}
