//! Registration, password reset, and per-purpose verification flows.

mod common;

use axum::http::StatusCode;
use common::{login, request, seed_user, spawn_app, EDGE_UA};

#[tokio::test]
async fn test_register_then_login() {
    let app = spawn_app().await;

    let (status, body) = request(
        &app,
        "POST",
        "/auth/register",
        EDGE_UA,
        None,
        Some(serde_json::json!({
            "name": "New User",
            "username": "newuser",
            "email": "new@example.com",
            "password": "correct_horse_9"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["username"], "newuser");

    let (status, _) = login(&app, "new@example.com", "correct_horse_9", EDGE_UA).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let app = spawn_app().await;
    seed_user(&app, "taken@example.com", "correct_horse_9", None).await;

    let (status, _) = request(
        &app,
        "POST",
        "/auth/register",
        EDGE_UA,
        None,
        Some(serde_json::json!({
            "name": "Other",
            "username": "otheruser",
            "email": "taken@example.com",
            "password": "correct_horse_9"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_password_reset_flow_changes_password() {
    let app = spawn_app().await;
    seed_user(&app, "reset@example.com", "old_password_1", None).await;

    let (status, _) = request(
        &app,
        "POST",
        "/auth/password-reset/request",
        EDGE_UA,
        None,
        Some(serde_json::json!({ "method": "email", "value": "reset@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let sent = app.email.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].purpose_label, "password reset");
    let code = sent[0].code.clone();

    let (status, _) = request(
        &app,
        "POST",
        "/auth/password-reset/confirm",
        EDGE_UA,
        None,
        Some(serde_json::json!({
            "method": "email",
            "value": "reset@example.com",
            "code": code,
            "new_password": "new_password_2"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Old password is dead, new one works.
    let (status, _) = login(&app, "reset@example.com", "old_password_1", EDGE_UA).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = login(&app, "reset@example.com", "new_password_2", EDGE_UA).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_password_reset_limited_to_one_request_per_day() {
    let app = spawn_app().await;
    seed_user(&app, "limited@example.com", "correct_horse_9", None).await;

    let body = serde_json::json!({ "method": "email", "value": "limited@example.com" });

    let (status, _) = request(
        &app,
        "POST",
        "/auth/password-reset/request",
        EDGE_UA,
        None,
        Some(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(
        &app,
        "POST",
        "/auth/password-reset/request",
        EDGE_UA,
        None,
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_audio_otp_verification_stamps_user() {
    let app = spawn_app().await;
    seed_user(&app, "audio@example.com", "correct_horse_9", None).await;

    let (_, body) = login(&app, "audio@example.com", "correct_horse_9", EDGE_UA).await;
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) = request(&app, "POST", "/auth/audio-otp/send", EDGE_UA, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let code = app.email.last_code().unwrap();
    let (status, _) = request(
        &app,
        "POST",
        "/auth/audio-otp/verify",
        EDGE_UA,
        Some(&token),
        Some(serde_json::json!({ "code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The verify stamped the user document.
    let user = auth_service::services::UserStore::find_by_email(app.store.as_ref(), "audio@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(user.audio_upload_verified.is_some());
}

#[tokio::test]
async fn test_language_otp_goes_out_via_sms_and_updates_language() {
    let app = spawn_app().await;
    seed_user(
        &app,
        "lang@example.com",
        "correct_horse_9",
        Some("+15551234567"),
    )
    .await;

    let (_, body) = login(&app, "lang@example.com", "correct_horse_9", EDGE_UA).await;
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) = request(&app, "POST", "/auth/language-otp/send", EDGE_UA, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let sent = app.sms.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "+15551234567");
    let code = sent[0].code.clone();

    let (status, body) = request(
        &app,
        "POST",
        "/auth/language-otp/verify",
        EDGE_UA,
        Some(&token),
        Some(serde_json::json!({ "code": code, "language": "fr" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["preferred_language"], "fr");
}

#[tokio::test]
async fn test_language_otp_requires_phone_on_file() {
    let app = spawn_app().await;
    seed_user(&app, "nophone@example.com", "correct_horse_9", None).await;

    let (_, body) = login(&app, "nophone@example.com", "correct_horse_9", EDGE_UA).await;
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) = request(&app, "POST", "/auth/language-otp/send", EDGE_UA, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_history_endpoint_lists_attempts() {
    let app = spawn_app().await;
    seed_user(&app, "history@example.com", "correct_horse_9", None).await;

    // One failed, then one successful attempt.
    let (_, _) = login(&app, "history@example.com", "bad_password_1", EDGE_UA).await;
    let (_, body) = login(&app, "history@example.com", "correct_horse_9", EDGE_UA).await;
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = request(&app, "GET", "/auth/login-history", EDGE_UA, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let entries = body["login_history"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    let statuses: Vec<&str> = entries
        .iter()
        .map(|e| e["login_status"].as_str().unwrap())
        .collect();
    assert!(statuses.contains(&"failed"));
    assert!(statuses.contains(&"success"));
}
