//! Session Management Module
//!
//! The login flow reads and writes a small set of reserved keys in the
//! visitor's session. The store itself is abstracted behind [`SessionStore`]
//! so the flow does not care how the session is persisted.
//!
//! # Modules
//!
//! - [`cookie`] - Encrypted cookie-backed session store
//! - [`extractor`] - Request extractor exposing the session to application handlers

pub mod cookie;
pub mod extractor;

use std::collections::HashMap;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::models::{AccessToken, LoginFailure, RequestToken, UserProfile};

pub use cookie::{CookieFactory, CookieSession, DEFAULT_COOKIE_NAME, MAX_COOKIE_SIZE};
pub use extractor::{LoginSession, SessionHandle};

/// Pending request token, stored as `[token, secret]`
pub const REQUEST_TOKEN_KEY: &str = "twitter_request_token";
/// Access token, stored as `[token, secret]`
pub const ACCESS_TOKEN_KEY: &str = "twitter_access_token";
/// Filtered profile of the authenticated user
pub const USER_KEY: &str = "twitter_user";
/// Last login error, currently only `"user_denied"`
pub const ERROR_KEY: &str = "twitter_error";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to serialize session value for {key}: {source}")]
    Serialize {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode session cookie: {0}")]
    Cookie(#[from] anyhow::Error),
}

/// Key-value view of one visitor's session
///
/// A `Value::Null` entry is how some stores represent "unset"; readers treat
/// it the same as a missing key.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<Value>;

    fn insert(&mut self, key: &str, value: Value);

    fn remove(&mut self, key: &str) -> Option<Value>;
}

impl SessionStore for HashMap<String, Value> {
    fn get(&self, key: &str) -> Option<Value> {
        HashMap::get(self, key).cloned()
    }

    fn insert(&mut self, key: &str, value: Value) {
        HashMap::insert(self, key.to_string(), value);
    }

    fn remove(&mut self, key: &str) -> Option<Value> {
        HashMap::remove(self, key)
    }
}

/// Typed access to the reserved login keys on top of any [`SessionStore`]
pub trait LoginSessionExt: SessionStore {
    /// Read a key and decode it; null or malformed entries read as absent
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.get(key)? {
            Value::Null => None,
            value => match serde_json::from_value(value) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    log::debug!("Ignoring malformed session value for {key}: {e}");
                    None
                }
            },
        }
    }

    /// Encode and store a value under a reserved key
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized
    fn insert_as<T: Serialize>(&mut self, key: &'static str, value: &T) -> Result<(), SessionError> {
        let encoded =
            serde_json::to_value(value).map_err(|source| SessionError::Serialize { key, source })?;
        self.insert(key, encoded);
        Ok(())
    }

    /// Null the key first, then delete it. Both steps always run so stores that
    /// keep nulls around and stores that only honour deletes end up unset.
    fn clear(&mut self, key: &str) {
        self.insert(key, Value::Null);
        self.remove(key);
    }

    fn pending_request_token(&self) -> Option<RequestToken> {
        self.get_as(REQUEST_TOKEN_KEY)
    }

    /// # Errors
    ///
    /// Returns an error if the token cannot be serialized
    fn store_request_token(&mut self, token: &RequestToken) -> Result<(), SessionError> {
        self.insert_as(REQUEST_TOKEN_KEY, token)
    }

    fn clear_request_token(&mut self) {
        self.clear(REQUEST_TOKEN_KEY);
    }

    /// Replace the pending request token with the access token in one step
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be serialized; the request token is
    /// left in place in that case
    fn exchange_request_token(&mut self, access_token: &AccessToken) -> Result<(), SessionError> {
        let encoded = serde_json::to_value(access_token).map_err(|source| SessionError::Serialize {
            key: ACCESS_TOKEN_KEY,
            source,
        })?;
        self.remove(REQUEST_TOKEN_KEY);
        self.insert(ACCESS_TOKEN_KEY, encoded);
        Ok(())
    }

    fn access_token(&self) -> Option<AccessToken> {
        self.get_as(ACCESS_TOKEN_KEY)
    }

    /// # Errors
    ///
    /// Returns an error if the profile cannot be serialized
    fn store_user(&mut self, profile: &UserProfile) -> Result<(), SessionError> {
        self.insert_as(USER_KEY, profile)
    }

    fn twitter_user(&self) -> Option<UserProfile> {
        self.get_as(USER_KEY)
    }

    /// # Errors
    ///
    /// Returns an error if the failure cannot be serialized
    fn record_failure(&mut self, failure: LoginFailure) -> Result<(), SessionError> {
        self.insert_as(ERROR_KEY, &failure)
    }

    fn last_failure(&self) -> Option<LoginFailure> {
        self.get_as(ERROR_KEY)
    }

    fn clear_failure(&mut self) {
        self.clear(ERROR_KEY);
    }

    /// Forget the access token and profile
    fn logout(&mut self) {
        for key in [ACCESS_TOKEN_KEY, USER_KEY] {
            self.clear(key);
        }
    }
}

impl<S: SessionStore + ?Sized> LoginSessionExt for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Store that only ever marks keys as null, never really deleting them
    #[derive(Default)]
    struct NullingStore {
        state: HashMap<String, Value>,
        removes: Vec<String>,
    }

    impl SessionStore for NullingStore {
        fn get(&self, key: &str) -> Option<Value> {
            self.state.get(key).cloned()
        }

        fn insert(&mut self, key: &str, value: Value) {
            self.state.insert(key.to_string(), value);
        }

        fn remove(&mut self, key: &str) -> Option<Value> {
            self.removes.push(key.to_string());
            None
        }
    }

    #[test]
    fn test_clear_nulls_then_removes() {
        let mut store = NullingStore::default();
        store
            .store_request_token(&RequestToken::new("abc", "123"))
            .unwrap();

        store.clear_request_token();

        assert_eq!(store.state.get(REQUEST_TOKEN_KEY), Some(&Value::Null));
        assert_eq!(store.removes, vec![REQUEST_TOKEN_KEY.to_string()]);
        assert!(store.pending_request_token().is_none());
    }

    #[test]
    fn test_exchange_replaces_request_token() {
        let mut store: HashMap<String, Value> = HashMap::new();
        store
            .store_request_token(&RequestToken::new("reqtok", "reqsec"))
            .unwrap();

        store
            .exchange_request_token(&AccessToken::new("acc1", "sec1"))
            .unwrap();

        assert!(!store.contains_key(REQUEST_TOKEN_KEY));
        assert_eq!(store.get(ACCESS_TOKEN_KEY), Some(&json!(["acc1", "sec1"])));
        assert_eq!(store.access_token(), Some(AccessToken::new("acc1", "sec1")));
    }

    #[test]
    fn test_malformed_values_read_as_absent() {
        let mut store: HashMap<String, Value> = HashMap::new();
        SessionStore::insert(&mut store, REQUEST_TOKEN_KEY, json!("not-a-pair"));
        assert!(store.pending_request_token().is_none());
    }

    #[test]
    fn test_logout_clears_access_token_and_user() {
        let mut store: HashMap<String, Value> = HashMap::new();
        store
            .exchange_request_token(&AccessToken::new("acc1", "sec1"))
            .unwrap();
        store
            .store_user(&UserProfile::from_verify_credentials(r#"{"screen_name":"neo"}"#).unwrap())
            .unwrap();
        store.record_failure(LoginFailure::UserDenied).unwrap();

        store.logout();

        assert!(store.access_token().is_none());
        assert!(store.twitter_user().is_none());
        assert_eq!(store.last_failure(), Some(LoginFailure::UserDenied));
    }
}
