//! `HttpBackend` against a local axum server speaking the backend's JSON shapes.

use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use dentsim_core::backend::{Backend, Credentials, PasswordChange, Registration};
use dentsim_core::error::ApiError;
use dentsim_core::http::HttpBackend;
use serde_json::{json, Value};

const TOKEN: &str = "tok-http";

fn bearer_ok(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["password"] == "parola123" {
        (
            StatusCode::OK,
            Json(json!({
                "token": TOKEN,
                "user": { "username": body["username"], "role": "Resident" }
            })),
        )
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Invalid credentials" })))
    }
}

async fn register() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn profile(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !bearer_ok(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Token expired" })));
    }
    (
        StatusCode::OK,
        Json(json!({
            "username": "anca",
            "role": "Resident",
            "xp": 2450,
            "streak": 3,
            "accuracy": 87.5,
            "cases_completed": 21,
            "earned_badges": ["first-diagnosis"],
            "last_active_date": "2026-10-15"
        })),
    )
}

async fn change_password() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Current password is incorrect" })),
    )
}

async fn start_case(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !bearer_ok(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Missing token" })));
    }
    (
        StatusCode::OK,
        Json(json!({ "session_id": "s-42", "message": "Hello doctor, my tooth hurts." })),
    )
}

async fn chat(Json(body): Json<Value>) -> Json<Value> {
    if body["session_id"] == "legacy" {
        return Json(json!({ "text": "wrong field" }));
    }
    Json(json!({ "reply": format!("You asked: {}", body["message"].as_str().unwrap_or("")) }))
}

async fn diagnose(Json(body): Json<Value>) -> Json<Value> {
    if body["session_id"] == "terse" {
        return Json(json!({ "correct": false, "correct_diagnosis": "Pulp Necrosis" }));
    }
    let correct = body["diagnosis"] == "Pulp Necrosis";
    if correct {
        Json(json!({ "correct": true, "xp_gained": 100, "message": "Well done" }))
    } else {
        Json(json!({
            "correct": false,
            "xp_gained": 10,
            "message": "Not quite.",
            "correct_diagnosis": "Pulp Necrosis"
        }))
    }
}

async fn spawn_server() -> HttpBackend {
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/profile", get(profile))
        .route("/auth/change-password", put(change_password))
        .route("/chat/start/random", post(start_case))
        .route("/chat", post(chat))
        .route("/chat/diagnose", post(diagnose));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    HttpBackend::new(format!("http://{addr}/")).with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn login_returns_token_and_user() {
    let backend = spawn_server().await;
    assert!(!backend.base_url().ends_with('/'));

    let creds = Credentials { username: "anca".into(), password: "parola123".into() };
    let login = backend.login(&creds).await.unwrap();
    assert_eq!(login.token, TOKEN);
    assert_eq!(login.user.username, "anca");
    assert_eq!(login.user.role.as_deref(), Some("Resident"));
}

#[tokio::test]
async fn rejected_login_is_unauthorized_with_server_message() {
    let backend = spawn_server().await;
    let creds = Credentials { username: "anca".into(), password: "nope".into() };
    let err = backend.login(&creds).await.unwrap_err();
    assert_eq!(err, ApiError::Unauthorized("Invalid credentials".into()));
    assert!(err.requires_login());
}

#[tokio::test]
async fn profile_requires_bearer_token() {
    let backend = spawn_server().await;

    let err = backend.profile("stale").await.unwrap_err();
    assert!(err.requires_login());

    let profile = backend.profile(TOKEN).await.unwrap();
    assert_eq!(profile.xp, 2450);
    assert_eq!(profile.cases_completed, 21);
    assert_eq!(profile.earned_badges, vec!["first-diagnosis"]);
    assert_eq!(
        profile.last_active_date,
        chrono::NaiveDate::from_ymd_opt(2026, 10, 15)
    );
}

#[tokio::test]
async fn error_body_message_is_surfaced() {
    let backend = spawn_server().await;
    let change = PasswordChange {
        current_password: "old".into(),
        new_password: "newer-secret".into(),
    };
    let err = backend.change_password(TOKEN, &change).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Server { status: 400, message: "Current password is incorrect".into() }
    );
    assert!(!err.requires_login());
}

#[tokio::test]
async fn non_json_error_body_gets_fallback_message() {
    let backend = spawn_server().await;
    let registration = Registration {
        username: "anca".into(),
        password: "parola123".into(),
        role: None,
        class_code: None,
    };
    match backend.register(&registration).await.unwrap_err() {
        ApiError::Server { status, message } => {
            assert_eq!(status, 500);
            assert!(message.contains("500"), "unexpected message: {message}");
        }
        other => panic!("expected server error, got {other:?}"),
    }
}

#[tokio::test]
async fn case_chat_and_diagnosis() {
    let backend = spawn_server().await;

    let started = backend.start_case(TOKEN).await.unwrap();
    assert_eq!(started.session_id, "s-42");
    assert_eq!(started.greeting.as_deref(), Some("Hello doctor, my tooth hurts."));

    let reply = backend.chat(TOKEN, "s-42", "Where does it hurt?").await.unwrap();
    assert_eq!(reply, "You asked: Where does it hurt?");

    let right = backend.diagnose(TOKEN, "s-42", "Pulp Necrosis").await.unwrap();
    assert!(right.correct);
    assert_eq!(right.xp_earned, 100);
    assert!(right.correct_diagnosis_name.is_none());

    let wrong = backend.diagnose(TOKEN, "s-42", "Cracked Tooth").await.unwrap();
    assert!(!wrong.correct);
    assert_eq!(wrong.feedback, "Not quite.");
    assert_eq!(wrong.correct_diagnosis_name.as_deref(), Some("Pulp Necrosis"));
}

#[tokio::test]
async fn verdict_without_xp_or_message_decodes() {
    let backend = spawn_server().await;
    let verdict = backend.diagnose(TOKEN, "terse", "Cracked Tooth").await.unwrap();
    assert!(!verdict.correct);
    assert_eq!(verdict.xp_earned, 0);
    assert_eq!(verdict.feedback, "");
    assert_eq!(verdict.correct_diagnosis_name.as_deref(), Some("Pulp Necrosis"));
}

#[tokio::test]
async fn unexpected_shape_is_decode_error() {
    let backend = spawn_server().await;
    let err = backend.chat(TOKEN, "legacy", "hello").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = HttpBackend::new(format!("http://{addr}")).with_timeout(Duration::from_secs(2));
    let err = backend.start_case(TOKEN).await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)), "got {err:?}");
}
