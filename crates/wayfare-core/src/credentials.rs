//! Login and registration input types.

use std::fmt;

/// Email/password credentials for the login endpoint.
///
/// # Security
///
/// The password is never exposed in Debug output to prevent accidental logging.
///
/// # Example
///
/// ```
/// use wayfare_core::Credentials;
///
/// let creds = Credentials::new("alice@example.com", "hunter2");
/// assert_eq!(creds.email(), "alice@example.com");
/// ```
#[derive(Clone)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    /// Create new credentials.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Returns the account email.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the password.
    ///
    /// # Security
    ///
    /// Use this only when constructing authentication requests.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Account registration input.
#[derive(Clone)]
pub struct Registration {
    credentials: Credentials,
    name: Option<String>,
    role: Option<String>,
}

impl Registration {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            name: None,
            role: None,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Request a specific role. The backend decides whether to honour it.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("credentials", &self.credentials)
            .field("name", &self.name)
            .field("role", &self.role)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_hides_password_in_debug() {
        let creds = Credentials::new("alice@example.com", "secret123");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("alice@example.com"));
        assert!(!debug.contains("secret123"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn registration_hides_password_in_debug() {
        let reg = Registration::new(Credentials::new("bob@example.com", "pw-9876"))
            .with_name("Bob")
            .with_role("TOURIST");
        let debug = format!("{:?}", reg);
        assert!(debug.contains("Bob"));
        assert!(!debug.contains("pw-9876"));
        assert_eq!(reg.role(), Some("TOURIST"));
    }
}
