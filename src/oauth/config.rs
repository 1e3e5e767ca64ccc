use serde::{Deserialize, Serialize};

use crate::settings::TwitterSettings;

/// Default provider API root
pub const DEFAULT_SITE: &str = "http://api.twitter.com";
/// Default path users are sent to for granting access
pub const DEFAULT_AUTHORIZE_PATH: &str = "/oauth/authenticate";

const REQUEST_TOKEN_PATH: &str = "/oauth/request_token";
const ACCESS_TOKEN_PATH: &str = "/oauth/access_token";
const VERIFY_CREDENTIALS_PATH: &str = "/1/account/verify_credentials.json";

/// Process-wide consumer credentials and provider endpoints
///
/// Built once at startup and shared read-only with the middleware and with any
/// application handler that needs an authenticated client.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsumerConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub site: String,
    pub authorize_path: String,
}

impl std::fmt::Debug for ConsumerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerConfig")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("site", &self.site)
            .field("authorize_path", &self.authorize_path)
            .finish()
    }
}

impl ConsumerConfig {
    #[must_use]
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            site: DEFAULT_SITE.to_string(),
            authorize_path: DEFAULT_AUTHORIZE_PATH.to_string(),
        }
    }

    #[must_use]
    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = site.into();
        self
    }

    #[must_use]
    pub fn with_authorize_path(mut self, path: impl Into<String>) -> Self {
        self.authorize_path = path.into();
        self
    }

    /// Build from settings; the consumer credentials may come from the environment
    #[must_use]
    pub fn from_settings(settings: &TwitterSettings) -> Self {
        Self {
            consumer_key: settings.get_consumer_key().unwrap_or_default(),
            consumer_secret: settings.get_consumer_secret().unwrap_or_default(),
            site: settings.site.clone(),
            authorize_path: settings.authorize_path.clone(),
        }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.consumer_key.is_empty() && !self.consumer_secret.is_empty()
    }

    /// Absolute URL of a provider API path
    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.site.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    #[must_use]
    pub fn request_token_url(&self) -> String {
        self.api_url(REQUEST_TOKEN_PATH)
    }

    #[must_use]
    pub fn access_token_url(&self) -> String {
        self.api_url(ACCESS_TOKEN_PATH)
    }

    #[must_use]
    pub fn verify_credentials_url(&self) -> String {
        self.api_url(VERIFY_CREDENTIALS_PATH)
    }

    /// URL the user visits to grant access for `request_token`
    #[must_use]
    pub fn authorize_url(&self, request_token: &str) -> String {
        let base = self.api_url(&self.authorize_path);
        let separator = if base.contains('?') { '&' } else { '?' };
        format!(
            "{base}{separator}oauth_token={}",
            urlencoding::encode(request_token)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        let config = ConsumerConfig::new("abc", "123");
        assert_eq!(
            config.request_token_url(),
            "http://api.twitter.com/oauth/request_token"
        );
        assert_eq!(
            config.access_token_url(),
            "http://api.twitter.com/oauth/access_token"
        );
        assert_eq!(
            config.verify_credentials_url(),
            "http://api.twitter.com/1/account/verify_credentials.json"
        );
        assert_eq!(
            config.authorize_url("reqtok"),
            "http://api.twitter.com/oauth/authenticate?oauth_token=reqtok"
        );
    }

    #[test]
    fn test_custom_site_and_authorize_path() {
        let config = ConsumerConfig::new("abc", "123")
            .with_site("https://provider.example/")
            .with_authorize_path("/oauth/authorize?force_login=true");
        assert_eq!(
            config.authorize_url("a b"),
            "https://provider.example/oauth/authorize?force_login=true&oauth_token=a%20b"
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", ConsumerConfig::new("abc", "super-secret"));
        assert!(rendered.contains("abc"));
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn test_is_configured() {
        assert!(ConsumerConfig::new("abc", "123").is_configured());
        assert!(!ConsumerConfig::new("", "123").is_configured());
        assert!(!ConsumerConfig::new("abc", "").is_configured());
    }
}
