#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the twitter-login crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod login;
pub mod middleware;
pub mod models;
pub mod oauth;
pub mod session;
pub mod settings;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use login::LoginError;
pub use middleware::{LoginOptions, TwitterLogin};
pub use models::{AccessToken, LoginFailure, RequestToken, UserProfile};
pub use oauth::{ConsumerConfig, OAuthClient, TwitterClient};
pub use session::LoginSession;
pub use settings::LoginSettings;
