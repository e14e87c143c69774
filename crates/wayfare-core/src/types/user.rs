//! Cached user profile.

use serde::{Deserialize, Serialize};

/// The signed-in user as reported by the backend's auth responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_is_optional() {
        let user: SessionUser =
            serde_json::from_str(r#"{"id":"u1","email":"a@example.com"}"#).unwrap();
        assert_eq!(user.role, None);
        assert_eq!(user.email, "a@example.com");
    }
}
