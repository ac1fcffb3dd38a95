use auth_service::{
    build_router,
    config::AuthConfig,
    services::{
        AccountService, EmailService, JwtService, LoginService, MongoStore, OtpService,
        TwilioSmsService,
    },
    AppState,
};
use service_core::middleware::rate_limit::create_ip_rate_limiter;
use service_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = AuthConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    // Initialize metrics
    auth_service::services::metrics::init_metrics();

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting authentication service"
    );

    // Initialize database connections
    tracing::info!("Initializing database connection");
    let store = MongoStore::connect(&config.mongodb.uri, &config.mongodb.database).await?;
    store.initialize_indexes().await?;
    tracing::info!("Database initialized successfully");

    let store = Arc::new(store);

    // Delivery providers
    let email = Arc::new(EmailService::new(&config.smtp)?);
    let sms = Arc::new(TwilioSmsService::new(&config.twilio));

    // Token signer
    let jwt = JwtService::new(&config.jwt);
    tracing::info!("JWT service initialized");

    // Rate limiters
    let login_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.login_attempts,
        config.rate_limit.login_window_seconds,
    );
    let password_reset_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.password_reset_attempts,
        config.rate_limit.password_reset_window_seconds,
    );
    let ip_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.global_ip_limit,
        config.rate_limit.global_ip_window_seconds,
    );
    tracing::info!("Rate limiters initialized: Login, Password Reset, and Global IP");

    // Core services
    let otp = OtpService::new(store.clone(), email, sms);
    let login_service = LoginService::new(store.clone(), store.clone(), otp.clone(), jwt.clone());
    let account_service =
        AccountService::new(store.clone(), store.clone(), otp, jwt.clone());

    let state = AppState {
        config: config.clone(),
        users: store,
        jwt,
        login_service,
        account_service,
        login_rate_limiter,
        password_reset_rate_limiter,
        ip_rate_limiter,
    };

    // Build application router
    let app = build_router(state).await?;

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
