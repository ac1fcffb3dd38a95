use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::AppError;
use std::net::SocketAddr;

use crate::{
    dtos::auth::{
        AuthResponse, LoginHistoryItem, LoginHistoryResponse, LoginRequest, MessageResponse,
        OtpPendingResponse, RegisterRequest, ResendLoginOtpRequest, UpdateProfileRequest,
        VerifyLoginOtpRequest,
    },
    dtos::ErrorResponse,
    middleware::{AuthUser, CurrentUser},
    models::PublicUser,
    services::{LoginOutcome, RejectReason, ResendOutcome},
    utils::ValidatedJson,
    AppState,
};

use super::request_context;

fn rejection(reason: RejectReason) -> AppError {
    let message = anyhow::anyhow!(reason.message());
    match reason {
        RejectReason::InvalidCredentials => AppError::AuthError(message),
        RejectReason::TimeRestricted => AppError::Forbidden(message),
        RejectReason::TokenInvalid => AppError::Unauthorized(message),
        RejectReason::OtpInvalid | RejectReason::OtpExpired | RejectReason::OtpNotPending => {
            AppError::BadRequest(message)
        }
    }
}

fn outcome_response(outcome: LoginOutcome) -> Result<Response, AppError> {
    match outcome {
        LoginOutcome::Granted { token, user } => Ok((
            StatusCode::OK,
            Json(AuthResponse {
                message: "Login successful".to_string(),
                token,
                user,
            }),
        )
            .into_response()),
        LoginOutcome::OtpPending {
            otp_token,
            channel,
            masked_destination,
        } => Ok((
            StatusCode::OK,
            Json(OtpPendingResponse {
                message: format!(
                    "OTP required. A verification code has been sent to {}.",
                    masked_destination
                ),
                otp_required: true,
                otp_token,
                channel,
                masked_destination,
            }),
        )
            .into_response()),
        LoginOutcome::Rejected { reason } => Err(rejection(reason)),
    }
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 409, description = "Email or username taken", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (user, token) = state.account_service.register(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            token,
            user,
        }),
    ))
}

/// Login with email and password
///
/// The device/browser/time policy decides the outcome: direct session,
/// OTP challenge, or rejection.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session granted or OTP challenge issued", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Time-restricted device", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    addr: Option<ConnectInfo<SocketAddr>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Response, AppError> {
    let ctx = request_context(&headers, addr);
    let outcome = state
        .login_service
        .login(&req.email, &req.password, &ctx)
        .await
        .map_err(AppError::from)?;
    outcome_response(outcome)
}

/// Complete a challenged login with the delivered code
#[utoipa::path(
    post,
    path = "/auth/login/verify-otp",
    request_body = VerifyLoginOtpRequest,
    responses(
        (status = 200, description = "Session granted", body = AuthResponse),
        (status = 400, description = "Invalid, expired, or missing OTP", body = ErrorResponse),
        (status = 401, description = "Invalid intermediate token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn verify_login_otp(
    State(state): State<AppState>,
    headers: HeaderMap,
    addr: Option<ConnectInfo<SocketAddr>>,
    ValidatedJson(req): ValidatedJson<VerifyLoginOtpRequest>,
) -> Result<Response, AppError> {
    let ctx = request_context(&headers, addr);
    let outcome = state
        .login_service
        .verify_login_otp(&req.otp_token, &req.code, &ctx)
        .await
        .map_err(AppError::from)?;
    outcome_response(outcome)
}

/// Re-deliver the login code for a pending challenge
#[utoipa::path(
    post,
    path = "/auth/login/resend-otp",
    request_body = ResendLoginOtpRequest,
    responses(
        (status = 200, description = "Code re-sent", body = MessageResponse),
        (status = 401, description = "Invalid intermediate token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn resend_login_otp(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ResendLoginOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    match state
        .login_service
        .resend_login_otp(&req.otp_token)
        .await
        .map_err(AppError::from)?
    {
        ResendOutcome::Sent {
            masked_destination, ..
        } => Ok((
            StatusCode::OK,
            Json(MessageResponse {
                message: format!("A new verification code has been sent to {}.", masked_destination),
            }),
        )),
        ResendOutcome::Rejected { reason } => Err(rejection(reason)),
    }
}

/// Get the current user's profile
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = PublicUser),
        (status = 401, description = "Invalid token", body = ErrorResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn me(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    Json(user.sanitized())
}

/// Update the current user's profile
#[utoipa::path(
    put,
    path = "/auth/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated user", body = PublicUser),
        (status = 401, description = "Invalid token", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state.account_service.update_profile(user, req).await?;
    Ok(Json(updated))
}

/// Get the current user's login history, newest first
#[utoipa::path(
    get,
    path = "/auth/login-history",
    responses(
        (status = 200, description = "Login history", body = LoginHistoryResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn login_history(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let entries = state.account_service.login_history(&claims.sub).await?;
    Ok(Json(LoginHistoryResponse {
        login_history: entries.into_iter().map(LoginHistoryItem::from).collect(),
    }))
}
