//! Auth endpoint paths and their request/response bodies.

use serde::{Deserialize, Serialize};

use wayfare_core::SessionUser;

// ============================================================================
// Endpoint Paths
// ============================================================================

pub const LOGIN: &str = "/auth/login";

pub const REGISTER: &str = "/auth/register";

pub const SOCIAL_LOGIN: &str = "/auth/social";

pub const REFRESH: &str = "/auth/refresh";

pub const LOGOUT: &str = "/auth/logout";

pub const REVOKE_ALL: &str = "/auth/revoke-all";

pub const FORGOT_PASSWORD: &str = "/auth/forgot-password";

pub const RESET_PASSWORD: &str = "/auth/reset-password";

/// Endpoints that establish a session and therefore never carry a bearer
/// token or trigger a refresh. Logout and revoke-all act on the current
/// session and are absent.
pub const AUTH_ENDPOINTS: &[&str] = &[
    LOGIN,
    REGISTER,
    SOCIAL_LOGIN,
    REFRESH,
    FORGOT_PASSWORD,
    RESET_PASSWORD,
];

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct SocialLoginRequest<'a> {
    pub provider: &'a str,
    pub token: &'a str,
    pub email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
}

/// Response from login, register and social login.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub user: Option<SessionUser>,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Response from the refresh endpoint.
///
/// Both fields are optional on the wire; a missing access token is a
/// refresh failure rather than a decode error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordRequest<'a> {
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest<'a> {
    pub email: &'a str,
    pub code: &'a str,
    pub new_password: &'a str,
}

/// Body of informational responses (`{ "message": ... }`).
#[derive(Debug, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}
