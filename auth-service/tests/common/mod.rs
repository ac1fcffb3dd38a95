#![allow(dead_code)]

use auth_service::{
    build_router,
    config::AuthConfig,
    models::User,
    services::{
        AccountService, JwtService, LoginService, MemoryStore, MockEmailService, MockSmsService,
        OtpService,
    },
    utils::{hash_password, Password},
    AppState,
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use service_core::middleware::rate_limit::create_ip_rate_limiter;
use std::sync::Arc;
use tower::util::ServiceExt;

pub const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const EDGE_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.2210.91";
pub const FIREFOX_UA: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub email: MockEmailService,
    pub sms: MockSmsService,
}

pub async fn spawn_app() -> TestApp {
    let config = AuthConfig::from_env().expect("Failed to load test config");

    let store = Arc::new(MemoryStore::new());
    let email = MockEmailService::new();
    let sms = MockSmsService::new();
    let jwt = JwtService::new(&config.jwt);

    let otp = OtpService::new(store.clone(), Arc::new(email.clone()), Arc::new(sms.clone()));
    let login_service = LoginService::new(store.clone(), store.clone(), otp.clone(), jwt.clone());
    let account_service = AccountService::new(store.clone(), store.clone(), otp, jwt.clone());

    let state = AppState {
        config,
        users: store.clone(),
        jwt,
        login_service,
        account_service,
        login_rate_limiter: create_ip_rate_limiter(100, 60),
        password_reset_rate_limiter: create_ip_rate_limiter(100, 60),
        ip_rate_limiter: create_ip_rate_limiter(1000, 60),
    };

    let router = build_router(state).await.expect("Failed to build router");

    TestApp {
        router,
        store,
        email,
        sms,
    }
}

pub async fn seed_user(app: &TestApp, email: &str, password: &str, phone: Option<&str>) -> User {
    let password_hash = hash_password(&Password::new(password.to_string())).unwrap();
    let mut user = User::new(
        "Test User".to_string(),
        email.split('@').next().unwrap().to_string(),
        email.to_string(),
        password_hash.into_string(),
    );
    user.phone = phone.map(str::to_string);
    auth_service::services::UserStore::insert(app.store.as_ref(), &user)
        .await
        .unwrap();
    user
}

pub async fn request(
    app: &TestApp,
    method: &str,
    uri: &str,
    user_agent: &str,
    bearer: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .header("Accept", "application/json")
        .header("Accept-Language", "en-US")
        .header("Accept-Encoding", "gzip");

    if !user_agent.is_empty() {
        builder = builder.header("User-Agent", user_agent);
    }
    if let Some(token) = bearer {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }

    let body = match body {
        Some(json) => Body::from(json.to_string()),
        None => Body::empty(),
    };

    let response = app
        .router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, json)
}

pub async fn login(
    app: &TestApp,
    email: &str,
    password: &str,
    user_agent: &str,
) -> (StatusCode, serde_json::Value) {
    request(
        app,
        "POST",
        "/auth/login",
        user_agent,
        None,
        Some(serde_json::json!({ "email": email, "password": password })),
    )
    .await
}
