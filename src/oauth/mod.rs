//! OAuth 1.0a client used by the login flow
//!
//! The flow only depends on the [`OAuthClient`] trait; [`TwitterClient`] is the
//! HTTP implementation that signs requests with HMAC-SHA1.

pub mod client;
pub mod config;
pub mod signing;

use async_trait::async_trait;

use crate::models::{AccessToken, RequestToken};

pub use client::{AuthorizedClient, TwitterClient};
pub use config::ConsumerConfig;
pub use signing::RequestSigner;

/// Request token issued by the provider together with the URL the user has to visit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTokenGrant {
    pub token: RequestToken,
    pub authorize_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Provider responded with status {status}")]
    Provider { status: u16 },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Operations the login flow needs from the provider
#[async_trait]
pub trait OAuthClient: Send + Sync {
    /// Obtain a request token; the provider will send the user back to `callback_url`
    async fn get_request_token(&self, callback_url: &str) -> Result<RequestTokenGrant, OAuthError>;

    /// Exchange an authorized request token and its verifier for an access token
    async fn get_access_token(
        &self,
        request_token: &RequestToken,
        verifier: &str,
    ) -> Result<AccessToken, OAuthError>;

    /// Signed GET of the profile-verification endpoint, returning the raw JSON body
    async fn verify_credentials(&self, access_token: &AccessToken) -> Result<String, OAuthError>;
}
