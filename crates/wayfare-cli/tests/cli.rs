//! CLI tests against a mock API.
//!
//! Each test starts a wiremock server and points the binary at it with an
//! isolated session file, so nothing touches the user's real session.

mod common;

use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{
    read_session, run_cli_with_env, run_cli_with_env_failure, run_cli_with_env_success,
    seed_session,
};

/// Exit status when the user has to sign in again.
const SIGN_IN_REQUIRED: i32 = 3;

fn session_file(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("session.json")
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({
            "email": "alice@example.com",
            "password": "secret123"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": "u1", "email": "alice@example.com", "role": "TOURIST" },
            "accessToken": "A1",
            "refreshToken": "R1"
        })))
        .expect(1)
        .mount(server)
        .await;
}

// The binary blocks, so it runs off the runtime threads serving the mock.
async fn cli(args: &'static [&'static str], token_file: std::path::PathBuf, url: String) -> std::process::Output {
    tokio::task::spawn_blocking(move || run_cli_with_env(args, &token_file, &url))
        .await
        .unwrap()
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    let stdout =
        run_cli_with_env_success(&["--version"], &session_file(&dir), "http://127.0.0.1:9");
    assert!(stdout.starts_with("wayfare "));
}

#[test]
fn test_long_version_names_target() {
    let dir = TempDir::new().unwrap();
    let stdout =
        run_cli_with_env_success(&["-V"], &session_file(&dir), "http://127.0.0.1:9");
    let long =
        run_cli_with_env_success(&["--version"], &session_file(&dir), "http://127.0.0.1:9");
    assert!(long.starts_with(stdout.trim_end()));
    assert!(long.trim_end().ends_with(')'));
}

#[test]
fn test_whoami_without_session() {
    let dir = TempDir::new().unwrap();
    let output = run_cli_with_env(&["auth", "whoami"], &session_file(&dir), "http://127.0.0.1:9");
    assert_eq!(output.status.code(), Some(SIGN_IN_REQUIRED));
    assert!(String::from_utf8_lossy(&output.stderr).contains("No active session"));
}

#[test]
fn test_bad_request_is_general_failure() {
    let dir = TempDir::new().unwrap();
    let args = ["api", "get", "/places", "--query", "missing-equals"];
    let output = run_cli_with_env(&args, &session_file(&dir), "http://127.0.0.1:9");
    assert_eq!(output.status.code(), Some(1));

    let stderr = run_cli_with_env_failure(&args, &session_file(&dir), "http://127.0.0.1:9");
    assert!(stderr.contains("Invalid query parameter 'missing-equals'"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_then_whoami() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let dir = TempDir::new().unwrap();
    let token_file = session_file(&dir);

    let output = cli(
        &["auth", "login", "--email", "alice@example.com", "--password", "secret123"],
        token_file.clone(),
        server.uri(),
    )
    .await;
    assert!(
        output.status.success(),
        "login failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("Logged in successfully"));

    let session = read_session(&token_file);
    assert_eq!(session["access_token"], "A1");
    assert_eq!(session["refresh_token"], "R1");

    // whoami reads the session file; the mock server is not involved.
    let stdout = run_cli_with_env_success(
        &["auth", "whoami", "--json"],
        &token_file,
        "http://127.0.0.1:9",
    );
    let user: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(user["email"], "alice@example.com");
    assert_eq!(user["role"], "TOURIST");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Invalid credentials"
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let token_file = session_file(&dir);

    let output = cli(
        &["auth", "login", "--email", "alice@example.com", "--password", "wrong"],
        token_file.clone(),
        server.uri(),
    )
    .await;

    assert_eq!(output.status.code(), Some(SIGN_IN_REQUIRED));
    assert!(
        String::from_utf8_lossy(&output.stderr)
            .to_lowercase()
            .contains("invalid credentials")
    );
    assert!(!token_file.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_expired_token_is_refreshed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/places"))
        .and(header("authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "p1" }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/places"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({ "refreshToken": "R1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "T2",
            "refreshToken": "R2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let token_file = session_file(&dir);
    seed_session(&token_file, "T1", Some("R1"));

    let output = cli(&["api", "get", "/places", "--compact"], token_file.clone(), server.uri()).await;
    assert!(
        output.status.success(),
        "request failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), r#"[{"id":"p1"}]"#);

    let session = read_session(&token_file);
    assert_eq!(session["access_token"], "T2");
    assert_eq!(session["refresh_token"], "R2");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_refresh_ends_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookings"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "jwt expired"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "message": "Refresh token invalid" }))
                .set_delay(Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let token_file = session_file(&dir);
    seed_session(&token_file, "T1", Some("R1"));

    let output = cli(&["api", "get", "/bookings"], token_file.clone(), server.uri()).await;

    assert_eq!(output.status.code(), Some(SIGN_IN_REQUIRED));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Session expired"));
    assert!(stderr.contains("jwt expired"));

    let session = read_session(&token_file);
    assert!(session.get("access_token").is_none());
    assert!(session.get("refresh_token").is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_logout_clears_session_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let token_file = session_file(&dir);
    seed_session(&token_file, "T1", Some("R1"));

    let output = cli(&["auth", "logout"], token_file.clone(), server.uri()).await;
    assert!(output.status.success());

    let session = read_session(&token_file);
    assert!(session.get("access_token").is_none());
    assert!(!String::from_utf8_lossy(&output.stderr).contains("Session expired"));
}
