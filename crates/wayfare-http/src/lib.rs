//! wayfare-http - Authenticated HTTP client for the wayfare API.
//!
//! Every request made through [`ApiClient`] carries the stored access token
//! (auth endpoints excepted). When the backend rejects that token, the client
//! refreshes it once, shared by every request that failed in the meantime,
//! and replays each failed request with the new token. If the refresh itself
//! fails, stored tokens are cleared and the registered session-end callback
//! runs.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wayfare_core::{ApiUrl, MemoryTokenStore};
//! use wayfare_http::{ApiClient, ClientConfig};
//!
//! # async fn example() -> Result<(), wayfare_core::Error> {
//! let config = ClientConfig::new(ApiUrl::new("https://api.example.com")?);
//! let client = ApiClient::new(config, Arc::new(MemoryTokenStore::new()))?;
//! client.on_session_end(|| eprintln!("signed out"));
//!
//! let places: serde_json::Value = client.get("/places").await?;
//! println!("{places}");
//! # Ok(())
//! # }
//! ```

mod auth;
mod client;
mod config;
mod endpoints;
mod refresh;
mod request;

pub use auth::AuthSession;
pub use client::ApiClient;
pub use config::ClientConfig;
pub use request::{ApiRequest, ApiResponse};
