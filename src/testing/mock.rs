//! Mock objects and fake implementations for testing
//!
//! [`MockOAuthClient`] stands in for Twitter: it hands out canned tokens and
//! records every call so tests can assert what the login flow asked for.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::models::{AccessToken, RequestToken};
use crate::oauth::{OAuthClient, OAuthError, RequestTokenGrant};

use super::constants::{
    TEST_ACCESS_SECRET, TEST_ACCESS_TOKEN, TEST_AUTHORIZE_URL, TEST_REQUEST_SECRET,
    TEST_REQUEST_TOKEN, TEST_SCREEN_NAME,
};

/// One call made against [`MockOAuthClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    RequestToken {
        callback_url: String,
    },
    AccessToken {
        request_token: RequestToken,
        verifier: String,
    },
    VerifyCredentials {
        access_token: AccessToken,
    },
}

/// Canned OAuth provider
pub struct MockOAuthClient {
    request_token: RequestToken,
    authorize_url: String,
    access_token: AccessToken,
    profile_body: String,
    fail_request_token: bool,
    fail_access_token: bool,
    fail_verify_credentials: bool,
    calls: Mutex<Vec<MockCall>>,
}

impl Default for MockOAuthClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOAuthClient {
    /// Provider that succeeds with `("reqtok","reqsec")`, `("acc1","sec1")`
    /// and a `{"screen_name":"neo"}` profile
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_token: RequestToken::new(TEST_REQUEST_TOKEN, TEST_REQUEST_SECRET),
            authorize_url: TEST_AUTHORIZE_URL.to_string(),
            access_token: AccessToken::new(TEST_ACCESS_TOKEN, TEST_ACCESS_SECRET),
            profile_body: format!(r#"{{"screen_name":"{TEST_SCREEN_NAME}"}}"#),
            fail_request_token: false,
            fail_access_token: false,
            fail_verify_credentials: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_request_token(mut self, token: RequestToken, authorize_url: &str) -> Self {
        self.request_token = token;
        self.authorize_url = authorize_url.to_string();
        self
    }

    #[must_use]
    pub fn with_access_token(mut self, token: AccessToken) -> Self {
        self.access_token = token;
        self
    }

    /// Raw body returned from verify-credentials
    #[must_use]
    pub fn with_profile_body(mut self, body: &str) -> Self {
        self.profile_body = body.to_string();
        self
    }

    #[must_use]
    pub fn failing_request_token(mut self) -> Self {
        self.fail_request_token = true;
        self
    }

    #[must_use]
    pub fn failing_access_token(mut self) -> Self {
        self.fail_access_token = true;
        self
    }

    #[must_use]
    pub fn failing_verify_credentials(mut self) -> Self {
        self.fail_verify_credentials = true;
        self
    }

    /// Wrap in an `Arc`, ready to hand to the middleware
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Calls recorded so far, in order
    ///
    /// # Panics
    ///
    /// Panics if the call log mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl OAuthClient for MockOAuthClient {
    async fn get_request_token(&self, callback_url: &str) -> Result<RequestTokenGrant, OAuthError> {
        self.record(MockCall::RequestToken {
            callback_url: callback_url.to_string(),
        });
        if self.fail_request_token {
            return Err(OAuthError::Provider { status: 401 });
        }
        Ok(RequestTokenGrant {
            token: self.request_token.clone(),
            authorize_url: self.authorize_url.clone(),
        })
    }

    async fn get_access_token(
        &self,
        request_token: &RequestToken,
        verifier: &str,
    ) -> Result<AccessToken, OAuthError> {
        self.record(MockCall::AccessToken {
            request_token: request_token.clone(),
            verifier: verifier.to_string(),
        });
        if self.fail_access_token {
            return Err(OAuthError::Provider { status: 401 });
        }
        Ok(self.access_token.clone())
    }

    async fn verify_credentials(&self, access_token: &AccessToken) -> Result<String, OAuthError> {
        self.record(MockCall::VerifyCredentials {
            access_token: access_token.clone(),
        });
        if self.fail_verify_credentials {
            return Err(OAuthError::Provider { status: 503 });
        }
        Ok(self.profile_body.clone())
    }
}
