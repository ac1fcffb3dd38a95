use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use service_core::error::AppError;

use crate::{
    dtos::auth::{
        AudioPermissionResponse, LanguageOtpVerifyRequest, MessageResponse, OtpCodeRequest,
    },
    dtos::ErrorResponse,
    middleware::CurrentUser,
    models::PublicUser,
    utils::ValidatedJson,
    AppState,
};

/// Send an audio-upload verification code to the user's email
#[utoipa::path(
    post,
    path = "/auth/audio-otp/send",
    responses(
        (status = 200, description = "Code sent", body = MessageResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Verification",
    security(("bearer_auth" = []))
)]
pub async fn send_audio_otp(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    state.account_service.send_audio_otp(&user).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "OTP sent successfully to your email".to_string(),
        }),
    ))
}

/// Verify the audio-upload code; the stamp stays fresh for one hour
#[utoipa::path(
    post,
    path = "/auth/audio-otp/verify",
    request_body = OtpCodeRequest,
    responses(
        (status = 200, description = "Verified", body = MessageResponse),
        (status = 400, description = "Invalid or expired code", body = ErrorResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse)
    ),
    tag = "Verification",
    security(("bearer_auth" = []))
)]
pub async fn verify_audio_otp(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(req): ValidatedJson<OtpCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.account_service.verify_audio_otp(&user, &req.code).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Email verified successfully for audio upload".to_string(),
        }),
    ))
}

/// Whether the user may upload audio right now
///
/// Requires a fresh verification stamp AND the 14:00-19:00 IST window.
#[utoipa::path(
    get,
    path = "/auth/audio-otp/permission",
    responses(
        (status = 200, description = "Permission state", body = AudioPermissionResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse)
    ),
    tag = "Verification",
    security(("bearer_auth" = []))
)]
pub async fn audio_permission(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> impl IntoResponse {
    let (allowed, reason) = state
        .account_service
        .audio_upload_permission(&user, Utc::now());
    Json(AudioPermissionResponse {
        allowed,
        reason: reason.map(str::to_string),
    })
}

/// Send a language-switch verification code to the user's phone
#[utoipa::path(
    post,
    path = "/auth/language-otp/send",
    responses(
        (status = 200, description = "Code sent", body = MessageResponse),
        (status = 400, description = "No phone number on file", body = ErrorResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse)
    ),
    tag = "Verification",
    security(("bearer_auth" = []))
)]
pub async fn send_language_otp(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    state.account_service.send_language_otp(&user).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "OTP sent successfully to your phone".to_string(),
        }),
    ))
}

/// Verify the language-switch code and set the preferred language
#[utoipa::path(
    post,
    path = "/auth/language-otp/verify",
    request_body = LanguageOtpVerifyRequest,
    responses(
        (status = 200, description = "Language updated", body = PublicUser),
        (status = 400, description = "Invalid or expired code", body = ErrorResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse)
    ),
    tag = "Verification",
    security(("bearer_auth" = []))
)]
pub async fn verify_language_otp(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(req): ValidatedJson<LanguageOtpVerifyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state
        .account_service
        .verify_language_otp(&user, &req.code, req.language)
        .await?;
    Ok(Json(updated))
}
