//! Core value types.
//!
//! These types validate their input at construction time.

mod api_url;
mod user;

pub use api_url::ApiUrl;
pub use user::SessionUser;
