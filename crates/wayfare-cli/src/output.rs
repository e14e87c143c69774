//! Output formatting helpers.
//!
//! Results go to stdout; progress, warnings and errors go to stderr so that
//! `wayfare api ... | jq` sees only the response body.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use wayfare_core::SessionUser;

/// Print a success message.
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a labeled field.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Print the fields of a signed-in user.
pub fn user(user: &SessionUser) {
    field("User", &user.email);
    field("ID", &user.id);
    if let Some(role) = &user.role {
        field("Role", role);
    }
}

/// Tell the user a failed refresh signed them out.
pub fn session_expired() {
    eprintln!(
        "{} {}",
        "!".yellow(),
        "Session expired. Run 'wayfare auth login' to sign in again."
    );
}

/// Print a value as compact JSON.
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Print a value as pretty-printed JSON.
pub fn json_pretty<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
