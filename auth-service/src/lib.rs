pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    bot_detection::bot_detection_middleware, rate_limit::ip_rate_limit_middleware,
    security_headers::security_headers_middleware, tracing::request_id_middleware,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AuthConfig;
use crate::services::{AccountService, JwtService, LoginService, UserStore};
use service_core::error::AppError;
use std::sync::Arc;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::metrics::metrics,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::verify_login_otp,
        handlers::auth::resend_login_otp,
        handlers::auth::me,
        handlers::auth::update_me,
        handlers::auth::login_history,
        handlers::password::request_password_reset,
        handlers::password::confirm_password_reset,
        handlers::verification::send_audio_otp,
        handlers::verification::verify_audio_otp,
        handlers::verification::audio_permission,
        handlers::verification::send_language_otp,
        handlers::verification::verify_language_otp,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::auth::RegisterRequest,
            dtos::auth::LoginRequest,
            dtos::auth::AuthResponse,
            dtos::auth::OtpPendingResponse,
            dtos::auth::VerifyLoginOtpRequest,
            dtos::auth::ResendLoginOtpRequest,
            dtos::auth::MessageResponse,
            dtos::auth::UpdateProfileRequest,
            dtos::auth::ResetMethod,
            dtos::auth::PasswordResetRequest,
            dtos::auth::PasswordResetConfirmRequest,
            dtos::auth::OtpCodeRequest,
            dtos::auth::LanguageOtpVerifyRequest,
            dtos::auth::AudioPermissionResponse,
            dtos::auth::LoginHistoryItem,
            dtos::auth::LoginHistoryResponse,
            models::PublicUser,
            models::Language,
            models::LoginStatus,
            models::AuthMethod,
            services::policy::OtpChannel,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login gate, OTP challenges, and account registration"),
        (name = "User", description = "Profile and login history"),
        (name = "Verification", description = "Per-purpose OTP verification gates"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AuthConfig,
    pub users: Arc<dyn UserStore>,
    pub jwt: JwtService,
    pub login_service: LoginService,
    pub account_service: AccountService,
    pub login_rate_limiter: service_core::middleware::rate_limit::IpRateLimiter,
    pub password_reset_rate_limiter: service_core::middleware::rate_limit::IpRateLimiter,
    pub ip_rate_limiter: service_core::middleware::rate_limit::IpRateLimiter,
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    // Login routes share a tighter per-IP limit than the rest of the API
    let login_limiter = state.login_rate_limiter.clone();
    let login_routes = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .layer(from_fn_with_state(login_limiter, ip_rate_limit_middleware));

    let reset_limiter = state.password_reset_rate_limiter.clone();
    let reset_request_route = Router::new()
        .route(
            "/auth/password-reset/request",
            post(handlers::password::request_password_reset),
        )
        .layer(from_fn_with_state(reset_limiter, ip_rate_limit_middleware));

    let session_routes = Router::new()
        .route(
            "/auth/me",
            get(handlers::auth::me).put(handlers::auth::update_me),
        )
        .route("/auth/login-history", get(handlers::auth::login_history))
        .route(
            "/auth/audio-otp/send",
            post(handlers::verification::send_audio_otp),
        )
        .route(
            "/auth/audio-otp/verify",
            post(handlers::verification::verify_audio_otp),
        )
        .route(
            "/auth/audio-otp/permission",
            get(handlers::verification::audio_permission),
        )
        .route(
            "/auth/language-otp/send",
            post(handlers::verification::send_language_otp),
        )
        .route(
            "/auth/language-otp/verify",
            post(handlers::verification::verify_language_otp),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let ip_limiter = state.ip_rate_limiter.clone();

    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics));

    let swagger_enabled = match state.config.environment {
        crate::config::Environment::Dev => true,
        crate::config::Environment::Prod => {
            state.config.swagger.enabled == crate::config::SwaggerMode::Public
        }
    };

    if swagger_enabled {
        app =
            app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    } else {
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { axum::Json(ApiDoc::openapi()) }),
        );
    }

    let app = app
        .route("/auth/register", post(handlers::auth::register))
        .route(
            "/auth/login/verify-otp",
            post(handlers::auth::verify_login_otp),
        )
        .route(
            "/auth/login/resend-otp",
            post(handlers::auth::resend_login_otp),
        )
        .route(
            "/auth/password-reset/confirm",
            post(handlers::password::confirm_password_reset),
        )
        .merge(login_routes)
        .merge(reset_request_route)
        .merge(session_routes)
        .with_state(state.clone())
        // Global IP rate limiting
        .layer(from_fn_with_state(ip_limiter, ip_rate_limit_middleware))
        // Add metrics middleware
        .layer(from_fn(middleware::metrics::metrics_middleware))
        // Add tracing layer
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        // Add security headers middleware
        .layer(from_fn(security_headers_middleware))
        // Add bot detection middleware
        .layer(from_fn(bot_detection_middleware))
        // Add CORS layer
        .layer(
            CorsLayer::new()
                .allow_origin(
                    state
                        .config
                        .security
                        .allowed_origins
                        .iter()
                        .map(|o| {
                            o.parse::<axum::http::HeaderValue>().unwrap_or_else(|e| {
                                tracing::error!(
                                    "Invalid CORS origin '{}': {}. Using fallback.",
                                    o,
                                    e
                                );
                                axum::http::HeaderValue::from_static("*")
                            })
                        })
                        .collect::<Vec<axum::http::HeaderValue>>(),
                )
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                ]),
        );

    Ok(app)
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Service is unhealthy")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<serde_json::Value>, AppError> {
    state.users.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Store health check failed");
        e
    })?;

    Ok(axum::Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "store": "up"
        }
    })))
}
