//! End-to-end login gate tests over the real router, backed by the
//! in-memory store and mock delivery providers.

mod common;

use auth_service::models::{AuthMethod, LoginStatus};
use axum::http::StatusCode;
use common::{login, request, seed_user, spawn_app, CHROME_UA, EDGE_UA, FIREFOX_UA};

#[tokio::test]
async fn test_edge_login_grants_session_directly() {
    let app = spawn_app().await;
    seed_user(&app, "edge@example.com", "correct_horse_9", None).await;

    let (status, body) = login(&app, "edge@example.com", "correct_horse_9", EDGE_UA).await;

    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().expect("token missing");
    assert!(!token.is_empty());
    assert_eq!(body["user"]["email"], "edge@example.com");
    // The password hash must never leave the service.
    assert!(body["user"].get("password_hash").is_none());

    // Exactly one success/direct history entry.
    let entries = app.store.history_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].login_status, LoginStatus::Success);
    assert_eq!(entries[0].auth_method, AuthMethod::Direct);

    // The issued token is a working session credential.
    let (status, body) = request(&app, "GET", "/auth/me", EDGE_UA, Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "edge@example.com");
}

#[tokio::test]
async fn test_chrome_login_requires_otp_then_grants() {
    let app = spawn_app().await;
    seed_user(&app, "chrome@example.com", "correct_horse_9", None).await;

    let (status, body) = login(&app, "chrome@example.com", "correct_horse_9", CHROME_UA).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["otp_required"], true);
    assert_eq!(body["channel"], "email");
    let otp_token = body["otp_token"].as_str().expect("otp_token missing").to_string();
    // The final session token is never returned at this stage.
    assert!(body.get("token").is_none());

    // The code went out to the user's address.
    let sent = app.email.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "chrome@example.com");
    let code = sent[0].code.clone();

    // The intermediate token is not a session credential.
    let (status, _) = request(&app, "GET", "/auth/me", CHROME_UA, Some(&otp_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A pending history entry was recorded.
    let entries = app.store.history_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].login_status, LoginStatus::OtpRequired);
    assert_eq!(entries[0].auth_method, AuthMethod::OtpEmail);

    // Verify the code: session granted, pending entry flipped in place.
    let (status, body) = request(
        &app,
        "POST",
        "/auth/login/verify-otp",
        CHROME_UA,
        None,
        Some(serde_json::json!({ "otp_token": otp_token, "code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().expect("token missing");

    let entries = app.store.history_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].login_status, LoginStatus::Success);

    let (status, _) = request(&app, "GET", "/auth/me", CHROME_UA, Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_firefox_is_challenged_by_default() {
    let app = spawn_app().await;
    seed_user(&app, "fox@example.com", "correct_horse_9", None).await;

    let (status, body) = login(&app, "fox@example.com", "correct_horse_9", FIREFOX_UA).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["otp_required"], true);
}

#[tokio::test]
async fn test_wrong_password_rejected_with_failed_history_entry() {
    let app = spawn_app().await;
    seed_user(&app, "victim@example.com", "correct_horse_9", None).await;

    let (status, body) = login(&app, "victim@example.com", "wrong_password", EDGE_UA).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    // Generic message: never discloses which half was wrong.
    assert_eq!(body["error"], "Invalid email or password");

    let entries = app.store.history_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].login_status, LoginStatus::Failed);
}

#[tokio::test]
async fn test_unknown_email_rejected_without_history_entry() {
    let app = spawn_app().await;

    let (status, body) = login(&app, "nobody@example.com", "whatever123", EDGE_UA).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");
    // No user to attribute the attempt to.
    assert!(app.store.history_entries().is_empty());
}

#[tokio::test]
async fn test_wrong_code_allows_retry_with_same_token() {
    let app = spawn_app().await;
    seed_user(&app, "retry@example.com", "correct_horse_9", None).await;

    let (_, body) = login(&app, "retry@example.com", "correct_horse_9", CHROME_UA).await;
    let otp_token = body["otp_token"].as_str().unwrap().to_string();
    let code = app.email.last_code().unwrap();
    let wrong = if code == "000000" { "111111" } else { "000000" };

    let (status, body) = request(
        &app,
        "POST",
        "/auth/login/verify-otp",
        CHROME_UA,
        None,
        Some(serde_json::json!({ "otp_token": otp_token, "code": wrong })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid OTP");

    // The intermediate token stays usable for a retry.
    let (status, _) = request(
        &app,
        "POST",
        "/auth/login/verify-otp",
        CHROME_UA,
        None,
        Some(serde_json::json!({ "otp_token": otp_token, "code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_resend_supersedes_previous_code_without_new_history() {
    let app = spawn_app().await;
    seed_user(&app, "resend@example.com", "correct_horse_9", None).await;

    let (_, body) = login(&app, "resend@example.com", "correct_horse_9", CHROME_UA).await;
    let otp_token = body["otp_token"].as_str().unwrap().to_string();
    let first_code = app.email.last_code().unwrap();

    let (status, _) = request(
        &app,
        "POST",
        "/auth/login/resend-otp",
        CHROME_UA,
        None,
        Some(serde_json::json!({ "otp_token": otp_token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let second_code = app.email.last_code().unwrap();

    // A resend is not a distinct login attempt.
    assert_eq!(app.store.history_entries().len(), 1);

    // The superseded code must not verify, even if unexpired.
    if first_code != second_code {
        let (status, _) = request(
            &app,
            "POST",
            "/auth/login/verify-otp",
            CHROME_UA,
            None,
            Some(serde_json::json!({ "otp_token": otp_token, "code": first_code })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _) = request(
        &app,
        "POST",
        "/auth/login/verify-otp",
        CHROME_UA,
        None,
        Some(serde_json::json!({ "otp_token": otp_token, "code": second_code })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_consumed_code_cannot_be_verified_twice() {
    let app = spawn_app().await;
    seed_user(&app, "once@example.com", "correct_horse_9", None).await;

    let (_, body) = login(&app, "once@example.com", "correct_horse_9", CHROME_UA).await;
    let otp_token = body["otp_token"].as_str().unwrap().to_string();
    let code = app.email.last_code().unwrap();

    let (status, _) = request(
        &app,
        "POST",
        "/auth/login/verify-otp",
        CHROME_UA,
        None,
        Some(serde_json::json!({ "otp_token": otp_token, "code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request(
        &app,
        "POST",
        "/auth/login/verify-otp",
        CHROME_UA,
        None,
        Some(serde_json::json!({ "otp_token": otp_token, "code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No OTP pending for this login");
}

#[tokio::test]
async fn test_session_token_is_rejected_as_otp_token() {
    let app = spawn_app().await;
    seed_user(&app, "mixed@example.com", "correct_horse_9", None).await;

    let (_, body) = login(&app, "mixed@example.com", "correct_horse_9", EDGE_UA).await;
    let session_token = body["token"].as_str().unwrap().to_string();

    let (status, _) = request(
        &app,
        "POST",
        "/auth/login/verify-otp",
        EDGE_UA,
        None,
        Some(serde_json::json!({ "otp_token": session_token, "code": "123456" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_otp_token_is_rejected() {
    let app = spawn_app().await;

    let (status, _) = request(
        &app,
        "POST",
        "/auth/login/resend-otp",
        CHROME_UA,
        None,
        Some(serde_json::json!({ "otp_token": "not.a.token" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
