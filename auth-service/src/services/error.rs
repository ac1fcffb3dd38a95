use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User with this email or username already exists")]
    UserAlreadyExists,

    #[error("User not found")]
    UserNotFound,

    #[error("No phone number on file for this account")]
    PhoneMissing,

    #[error("Invalid OTP")]
    OtpInvalid,

    #[error("OTP expired")]
    OtpExpired,

    #[error("No OTP pending for this action")]
    OtpNotPending,

    #[error("Invalid token")]
    InvalidToken,

    #[error("You have already requested a password reset today. Please try again tomorrow.")]
    PasswordResetLimit,

    #[error(transparent)]
    Store(AppError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<AppError> for ServiceError {
    fn from(err: AppError) -> Self {
        ServiceError::Store(err)
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidCredentials => {
                AppError::AuthError(anyhow::anyhow!("Invalid email or password"))
            }
            ServiceError::UserAlreadyExists => {
                AppError::Conflict(anyhow::anyhow!("User with this email or username already exists"))
            }
            ServiceError::UserNotFound => AppError::NotFound(anyhow::anyhow!("User not found")),
            ServiceError::PhoneMissing => {
                AppError::BadRequest(anyhow::anyhow!("No phone number on file for this account"))
            }
            ServiceError::OtpInvalid => AppError::BadRequest(anyhow::anyhow!("Invalid OTP")),
            ServiceError::OtpExpired => AppError::BadRequest(anyhow::anyhow!("OTP expired")),
            ServiceError::OtpNotPending => {
                AppError::BadRequest(anyhow::anyhow!("No OTP pending for this action"))
            }
            ServiceError::InvalidToken => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid token"))
            }
            ServiceError::PasswordResetLimit => AppError::TooManyRequests(
                "You have already requested a password reset today. Please try again tomorrow."
                    .to_string(),
                None,
            ),
            ServiceError::Store(e) => e,
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}
