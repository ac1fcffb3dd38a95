use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::auth::{MessageResponse, PasswordResetConfirmRequest, PasswordResetRequest, ResetMethod},
    dtos::ErrorResponse,
    utils::ValidatedJson,
    AppState,
};

/// Request a password reset code
///
/// Limited to one request per user per calendar day. The code is delivered
/// on the channel matching the identifier kind (email or SMS).
#[utoipa::path(
    post,
    path = "/auth/password-reset/request",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset code sent", body = MessageResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 429, description = "Already requested today", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn request_password_reset(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PasswordResetRequest>,
) -> Result<impl IntoResponse, AppError> {
    let channel = match req.method {
        ResetMethod::Email => "email",
        ResetMethod::Phone => "phone",
    };
    state.account_service.request_password_reset(req).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: format!("Password reset code sent to your {}.", channel),
        }),
    ))
}

/// Confirm a password reset with the delivered code
#[utoipa::path(
    post,
    path = "/auth/password-reset/confirm",
    request_body = PasswordResetConfirmRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Invalid or expired code", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PasswordResetConfirmRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.account_service.confirm_password_reset(req).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Password reset successfully".to_string(),
        }),
    ))
}
