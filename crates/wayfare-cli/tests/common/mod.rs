use std::path::Path;
use std::process::{Command, Output};

/// Run the CLI against `api_url` with an isolated session file.
pub fn run_cli_with_env(args: &[&str], token_file: &Path, api_url: &str) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_wayfare"));
    cmd.args(args);
    cmd.env("WAYFARE_API_URL", api_url);
    cmd.env("WAYFARE_TOKEN_FILE", token_file);
    cmd.env_remove("WAYFARE_PASSWORD");
    cmd.env_remove("WAYFARE_TIMEOUT_MS");
    cmd.env_remove("RUST_LOG");
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI with an isolated session file and expect success.
pub fn run_cli_with_env_success(args: &[&str], token_file: &Path, api_url: &str) -> String {
    let output = run_cli_with_env(args, token_file, api_url);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run the CLI with an isolated session file and expect failure.
pub fn run_cli_with_env_failure(args: &[&str], token_file: &Path, api_url: &str) -> String {
    let output = run_cli_with_env(args, token_file, api_url);
    if output.status.success() {
        panic!("CLI command should have failed: {:?}", args);
    }
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Write a session file holding the given tokens.
pub fn seed_session(token_file: &Path, access: &str, refresh: Option<&str>) {
    let mut session = serde_json::json!({ "access_token": access });
    if let Some(refresh) = refresh {
        session["refresh_token"] = refresh.into();
    }
    std::fs::write(token_file, session.to_string()).expect("Failed to seed session file");
}

/// Read the session file as JSON.
pub fn read_session(token_file: &Path) -> serde_json::Value {
    let json = std::fs::read_to_string(token_file).expect("Failed to read session file");
    serde_json::from_str(&json).expect("Session file is not JSON")
}
