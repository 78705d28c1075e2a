//! Authentication-related models

use crate::models::account::{AccountResponse, Role};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Job seeker registration request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterJobSeekerRequest {
    #[validate(length(min = 1, max = 120))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

/// Employer registration request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterEmployerRequest {
    #[validate(length(min = 1, max = 120))]
    pub full_name: String,
    #[validate(length(min = 1, max = 160))]
    pub company_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

/// Login request (per-role and unified endpoints share this shape)
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Registration and login response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Role label of the matched partition. Admin accounts may carry a
    /// finer-grained label.
    pub role: String,
    pub user: AccountResponse,
    pub token: String,
}

/// Change password request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 1, max = 128))]
    pub new_password: String,
}

/// Password reset request (step 1: mail out a token)
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RequestPasswordResetRequest {
    #[validate(email)]
    pub email: String,
    pub role: Role,
}

/// Password reset request (step 2: consume the token)
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1))]
    pub token: String,
    pub role: Role,
    #[validate(length(min = 1, max = 128))]
    pub new_password: String,
}
