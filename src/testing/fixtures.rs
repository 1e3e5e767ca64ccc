//! Test fixtures providing pre-built test objects

use std::sync::Arc;

use actix_web::cookie::Cookie;
use serde_json::{json, Map};

use crate::middleware::{LoginOptions, TwitterLogin};
use crate::models::{AccessToken, RequestToken, UserProfile};
use crate::oauth::{ConsumerConfig, OAuthClient};
use crate::session::{CookieFactory, CookieSession, LoginSessionExt};
use crate::settings::LoginSettings;

use super::constants::{
    TEST_ACCESS_SECRET, TEST_ACCESS_TOKEN, TEST_CONSUMER_KEY, TEST_CONSUMER_SECRET,
    TEST_REQUEST_SECRET, TEST_REQUEST_TOKEN, TEST_SCREEN_NAME, TEST_SESSION_SECRET,
};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Consumer credentials `abc` / `123` against the default site
    #[must_use]
    pub fn consumer_config() -> ConsumerConfig {
        ConsumerConfig::new(TEST_CONSUMER_KEY, TEST_CONSUMER_SECRET)
    }

    /// Options with the default `/login` path and `/` return path
    #[must_use]
    pub fn login_options() -> LoginOptions {
        LoginOptions::new(Self::consumer_config())
    }

    #[must_use]
    pub fn cookie_factory() -> CookieFactory {
        CookieFactory::new(TEST_SESSION_SECRET, false, 24)
    }

    /// Middleware with default options talking to the given client
    #[must_use]
    pub fn middleware(client: Arc<dyn OAuthClient>) -> TwitterLogin {
        Self::middleware_with_options(Self::login_options(), client)
    }

    #[must_use]
    pub fn middleware_with_options(
        options: LoginOptions,
        client: Arc<dyn OAuthClient>,
    ) -> TwitterLogin {
        TwitterLogin::new(options, client, Self::cookie_factory())
    }

    /// Settings as a deployment with consumer `abc` / `123` would load them
    #[must_use]
    pub fn settings() -> LoginSettings {
        let mut settings = LoginSettings::default();
        settings.twitter.consumer_key = Some(TEST_CONSUMER_KEY.to_string());
        settings.twitter.consumer_secret = Some(TEST_CONSUMER_SECRET.to_string());
        settings.twitter.consumer_key_env = None;
        settings.twitter.consumer_secret_env = None;
        settings.session.session_secret = String::from_utf8_lossy(TEST_SESSION_SECRET).into_owned();
        settings
    }

    #[must_use]
    pub fn request_token() -> RequestToken {
        RequestToken::new(TEST_REQUEST_TOKEN, TEST_REQUEST_SECRET)
    }

    #[must_use]
    pub fn access_token() -> AccessToken {
        AccessToken::new(TEST_ACCESS_TOKEN, TEST_ACCESS_SECRET)
    }

    #[must_use]
    pub fn user_profile() -> UserProfile {
        let mut fields = Map::new();
        fields.insert("screen_name".to_string(), json!(TEST_SCREEN_NAME));
        fields.insert("followers_count".to_string(), json!(42));
        UserProfile::from_fields(fields)
    }

    /// Session waiting for the provider callback
    ///
    /// # Panics
    ///
    /// Panics if the token cannot be serialized.
    #[must_use]
    pub fn pending_session() -> CookieSession {
        let mut session = CookieSession::default();
        session.store_request_token(&Self::request_token()).unwrap();
        session
    }

    /// Session of a user who completed the login
    ///
    /// # Panics
    ///
    /// Panics if the token or profile cannot be serialized.
    #[must_use]
    pub fn logged_in_session() -> CookieSession {
        let mut session = CookieSession::default();
        session.exchange_request_token(&Self::access_token()).unwrap();
        session.store_user(&Self::user_profile()).unwrap();
        session
    }

    /// Encrypted cookie carrying `session`, as the browser would send it back
    ///
    /// # Panics
    ///
    /// Panics if encryption fails.
    #[must_use]
    pub fn session_cookie(session: &CookieSession) -> Cookie<'static> {
        Self::cookie_factory().create_session_cookie(session).unwrap()
    }
}
