use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{AuthMethod, Language, LoginHistoryEntry, LoginStatus, PublicUser};
use crate::services::policy::OtpChannel;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    #[schema(example = "Jo Doe")]
    pub name: String,

    #[validate(length(min = 3, max = 20, message = "Username must be 3-20 characters"))]
    #[schema(example = "jodoe")]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    #[schema(example = "password123", min_length = 6)]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    #[schema(example = "Login successful")]
    pub message: String,
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "password123")]
    pub password: String,
}

/// Returned when the policy engine requires a second factor. The
/// `otp_token` only proves "password verified, OTP pending" and is rejected
/// by every session-protected endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct OtpPendingResponse {
    #[schema(example = "OTP required. A verification code has been sent.")]
    pub message: String,
    #[schema(example = true)]
    pub otp_required: bool,
    pub otp_token: String,
    pub channel: OtpChannel,
    #[schema(example = "u***@example.com")]
    pub masked_destination: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyLoginOtpRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub otp_token: String,

    #[validate(length(min = 1, message = "Code is required"))]
    #[schema(example = "123456")]
    pub code: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResendLoginOtpRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub otp_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 160, message = "Bio cannot exceed 160 characters"))]
    pub bio: Option<String>,

    pub avatar: Option<String>,
}

/// Which identifier the password-reset caller supplied; also selects the
/// delivery channel for the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResetMethod {
    Email,
    Phone,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PasswordResetRequest {
    pub method: ResetMethod,

    #[validate(length(min = 1, message = "Identifier is required"))]
    #[schema(example = "user@example.com")]
    pub value: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PasswordResetConfirmRequest {
    pub method: ResetMethod,

    #[validate(length(min = 1, message = "Identifier is required"))]
    pub value: String,

    #[validate(length(min = 1, message = "Code is required"))]
    #[schema(example = "123456")]
    pub code: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct OtpCodeRequest {
    #[validate(length(min = 1, message = "Code is required"))]
    #[schema(example = "123456")]
    pub code: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LanguageOtpVerifyRequest {
    #[validate(length(min = 1, message = "Code is required"))]
    #[schema(example = "123456")]
    pub code: String,

    pub language: Language,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AudioPermissionResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginHistoryItem {
    pub ip_address: String,
    pub browser: String,
    pub os: String,
    pub device: String,
    pub login_time: DateTime<Utc>,
    pub login_status: LoginStatus,
    pub auth_method: AuthMethod,
}

impl From<LoginHistoryEntry> for LoginHistoryItem {
    fn from(e: LoginHistoryEntry) -> Self {
        Self {
            ip_address: e.ip_address,
            browser: e.browser,
            os: e.os,
            device: e.device,
            login_time: e.login_time,
            login_status: e.login_status,
            auth_method: e.auth_method,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginHistoryResponse {
    pub login_history: Vec<LoginHistoryItem>,
}
