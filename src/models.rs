use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Short-lived provider credential identifying one pending authorization attempt.
///
/// Stored in the session as a `[token, secret]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct RequestToken {
    pub token: String,
    pub secret: String,
}

impl RequestToken {
    #[must_use]
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            secret: secret.into(),
        }
    }
}

impl From<(String, String)> for RequestToken {
    fn from((token, secret): (String, String)) -> Self {
        Self { token, secret }
    }
}

impl From<RequestToken> for (String, String) {
    fn from(value: RequestToken) -> Self {
        (value.token, value.secret)
    }
}

/// Long-lived credential authorizing API calls on behalf of the user.
///
/// Stored in the session as a `[token, secret]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct AccessToken {
    pub token: String,
    pub secret: String,
}

impl AccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            secret: secret.into(),
        }
    }
}

impl From<(String, String)> for AccessToken {
    fn from((token, secret): (String, String)) -> Self {
        Self { token, secret }
    }
}

impl From<AccessToken> for (String, String) {
    fn from(value: AccessToken) -> Self {
        (value.token, value.secret)
    }
}

/// Fields kept by [`UserProfile::minimal`]
pub const MINIMAL_PROFILE_FIELDS: [&str; 4] = ["id", "id_str", "screen_name", "name"];

/// Profile of the authenticated user, taken from the verify-credentials response.
///
/// Only the fields that survive [`UserProfile::is_excluded_key`] are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(Map<String, Value>);

impl UserProfile {
    /// Parse a verify-credentials body and drop the excluded fields
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not a JSON object
    pub fn from_verify_credentials(body: &str) -> Result<Self, serde_json::Error> {
        let fields: Map<String, Value> = serde_json::from_str(body)?;
        Ok(Self::from_fields(fields))
    }

    /// Build a profile from an already decoded object, applying the exclusion rule
    #[must_use]
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self(
            fields
                .into_iter()
                .filter(|(key, _)| !Self::is_excluded_key(key))
                .collect(),
        )
    }

    /// Identity fields only, for when the full profile does not fit the session
    #[must_use]
    pub fn minimal(&self) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(key, _)| MINIMAL_PROFILE_FIELDS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )
    }

    /// `status`, `profile_*` and `*_color` fields are never stored in the session.
    #[must_use]
    pub fn is_excluded_key(key: &str) -> bool {
        key == "status" || key.starts_with("profile_") || key.ends_with("_color")
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value of a field; numbers are rendered as text
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    #[must_use]
    pub fn screen_name(&self) -> Option<String> {
        self.get_str("screen_name")
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Last login failure recorded in the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginFailure {
    UserDenied,
}

impl LoginFailure {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserDenied => "user_denied",
        }
    }
}

impl std::fmt::Display for LoginFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
