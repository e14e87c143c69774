//! wayfare-core - Core token, session and error types for the wayfare API client.

pub mod credentials;
pub mod error;
pub mod session_end;
pub mod store;
pub mod tokens;
pub mod traits;
pub mod types;

pub use credentials::{Credentials, Registration};
pub use error::Error;
pub use session_end::SessionEndNotifier;
pub use store::MemoryTokenStore;
pub use tokens::{AccessToken, RefreshToken};
pub use traits::TokenStore;
pub use types::{ApiUrl, SessionUser};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
