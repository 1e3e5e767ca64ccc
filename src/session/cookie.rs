use std::collections::HashMap;

use actix_web::{
    cookie::{time::Duration, Cookie, SameSite},
    HttpRequest,
};
use anyhow::{bail, Result};
use serde_json::Value;

use super::{SessionStore, USER_KEY};
use crate::models::UserProfile;
use crate::settings::SessionSettings;
use crate::utils::crypto::{decrypt_data, derive_encryption_key, encrypt_data, ENCRYPTION_KEY_SIZE};
use crate::utils::logging::LoggingHelper;

/// Cookie name used when the settings do not override it
pub const DEFAULT_COOKIE_NAME: &str = "twitter_login_session";
/// Largest `Set-Cookie` browsers accept; anything bigger is silently dropped
pub const MAX_COOKIE_SIZE: usize = 4096;
/// Browsers cap cookie lifetimes at 400 days
pub const MAX_SESSION_DURATION_HOURS: i64 = 400 * 24;

/// Session state carried in a single encrypted cookie
///
/// Tracks whether anything was written so the middleware only emits a
/// `Set-Cookie` header for sessions that actually changed.
#[derive(Debug, Clone, Default)]
pub struct CookieSession {
    state: HashMap<String, Value>,
    changed: bool,
}

impl CookieSession {
    #[must_use]
    pub fn from_state(state: HashMap<String, Value>) -> Self {
        Self {
            state,
            changed: false,
        }
    }

    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.values().all(Value::is_null)
    }

    #[must_use]
    pub fn state(&self) -> &HashMap<String, Value> {
        &self.state
    }
}

impl SessionStore for CookieSession {
    fn get(&self, key: &str) -> Option<Value> {
        self.state.get(key).cloned()
    }

    fn insert(&mut self, key: &str, value: Value) {
        self.changed = true;
        self.state.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) -> Option<Value> {
        let removed = self.state.remove(key);
        self.changed |= removed.is_some();
        removed
    }
}

/// Cookie factory for loading and writing encrypted session cookies
#[derive(Clone)]
pub struct CookieFactory {
    encryption_key: [u8; ENCRYPTION_KEY_SIZE],
    cookie_name: String,
    cookie_secure: bool,
    max_age: Duration,
}

impl CookieFactory {
    /// Create a new cookie factory from raw secret material
    ///
    /// Durations above [`MAX_SESSION_DURATION_HOURS`] are clamped.
    #[must_use]
    pub fn new(secret: &[u8], cookie_secure: bool, session_duration_hours: u64) -> Self {
        let hours = i64::try_from(session_duration_hours).unwrap_or(i64::MAX);
        if hours > MAX_SESSION_DURATION_HOURS {
            log::warn!(
                "⚠️  Session duration of {session_duration_hours}h exceeds the browser limit, using {MAX_SESSION_DURATION_HOURS}h"
            );
        }

        Self {
            encryption_key: derive_encryption_key(secret),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_secure,
            max_age: Duration::hours(hours.min(MAX_SESSION_DURATION_HOURS)),
        }
    }

    #[must_use]
    pub fn from_settings(settings: &SessionSettings) -> Self {
        Self::new(
            settings.session_secret.as_bytes(),
            settings.cookie_secure,
            settings.session_duration_hours,
        )
        .with_cookie_name(&settings.cookie_name)
    }

    #[must_use]
    pub fn with_cookie_name(mut self, name: &str) -> Self {
        if !name.is_empty() {
            self.cookie_name = name.to_string();
        }
        self
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Load the session carried by the request, or an empty one
    ///
    /// Missing, tampered or undecryptable cookies all start a fresh session.
    #[must_use]
    pub fn load(&self, req: &HttpRequest) -> CookieSession {
        req.cookie(&self.cookie_name)
            .and_then(|cookie| self.decode(cookie.value()))
            .unwrap_or_default()
    }

    /// Decrypt a raw cookie value into a session
    #[must_use]
    pub fn decode(&self, value: &str) -> Option<CookieSession> {
        if value.is_empty() {
            return None;
        }
        match decrypt_data::<HashMap<String, Value>>(value, &self.encryption_key) {
            Ok(state) => Some(CookieSession::from_state(state)),
            Err(e) => {
                log::debug!("Discarding unreadable session cookie: {e}");
                None
            }
        }
    }

    /// Create the cookie carrying the session
    ///
    /// An empty session produces an expired cookie so the browser drops it.
    /// A session too large for one cookie is retried with only the identity
    /// fields of the stored profile.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails or the session still exceeds
    /// [`MAX_COOKIE_SIZE`] after compaction
    pub fn create_session_cookie(&self, session: &CookieSession) -> Result<Cookie<'static>> {
        if session.is_empty() {
            return Ok(self.create_expired_cookie());
        }

        let live: HashMap<String, Value> = session
            .state
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let cookie = self.encode_cookie(&live)?;
        let size = cookie.to_string().len();
        if size <= MAX_COOKIE_SIZE {
            return Ok(cookie);
        }

        let compacted = self.encode_cookie(&compact_state(live))?;
        let compacted_size = compacted.to_string().len();
        LoggingHelper::log_session_cookie_compacted(size, compacted_size, MAX_COOKIE_SIZE);
        if compacted_size > MAX_COOKIE_SIZE {
            bail!("session cookie is {compacted_size} bytes, over the {MAX_COOKIE_SIZE} byte limit");
        }
        Ok(compacted)
    }

    fn encode_cookie(&self, state: &HashMap<String, Value>) -> Result<Cookie<'static>> {
        let value = encrypt_data(state, &self.encryption_key)?;
        Ok(self.build_cookie(value, self.max_age))
    }

    /// Create an expired cookie that removes the session from the browser
    #[must_use]
    pub fn create_expired_cookie(&self) -> Cookie<'static> {
        self.build_cookie(String::new(), Duration::seconds(-1))
    }

    fn build_cookie(&self, value: String, max_age: Duration) -> Cookie<'static> {
        Cookie::build(self.cookie_name.clone(), value)
            .http_only(true)
            .secure(self.cookie_secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(max_age)
            .finish()
    }
}

/// Replace the stored profile with its identity fields
fn compact_state(mut state: HashMap<String, Value>) -> HashMap<String, Value> {
    if let Some(user) = state.remove(USER_KEY) {
        let minimal = serde_json::from_value::<UserProfile>(user)
            .ok()
            .and_then(|profile| serde_json::to_value(profile.minimal()).ok());
        if let Some(minimal) = minimal {
            state.insert(USER_KEY.to_string(), minimal);
        }
    }
    state
}
