use std::sync::Arc;

use crate::models::{AccessToken, LoginFailure, UserProfile};
use crate::oauth::{OAuthClient, OAuthError};
use crate::session::{LoginSessionExt, SessionStore};
use crate::utils::logging::LoggingHelper;

use super::classifier::{classify, LoginRequestKind};
use super::errors::LoginError;
use super::request::LoginRequest;
use super::response::{ResponseFormat, ResponseInstruction};

/// Drives the three-legged OAuth exchange for requests to the login path
#[derive(Clone)]
pub struct FlowController {
    client: Arc<dyn OAuthClient>,
    return_to: String,
}

impl FlowController {
    #[must_use]
    pub fn new(client: Arc<dyn OAuthClient>, return_to: impl Into<String>) -> Self {
        Self {
            client,
            return_to: return_to.into(),
        }
    }

    #[must_use]
    pub fn return_to(&self) -> &str {
        &self.return_to
    }

    /// Handle one login-path request against the caller's session
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::InvalidState`] for a callback without a pending
    /// request token, and a provider error when the provider refuses a token.
    pub async fn handle<S: SessionStore + ?Sized>(
        &self,
        request: &LoginRequest,
        session: &mut S,
    ) -> Result<ResponseInstruction, LoginError> {
        match classify(&request.query) {
            LoginRequestKind::LoginStart => self.start_login(request, session).await,
            LoginRequestKind::Denied(reason) => self.deny(request, &reason, session),
            LoginRequestKind::VerifierPresent(verifier) => {
                self.complete_login(request, &verifier, session).await
            }
        }
    }

    /// Absolute URL of the return path for this request's origin
    #[must_use]
    pub fn return_url(&self, request: &LoginRequest) -> String {
        if self.return_to.starts_with("http://") || self.return_to.starts_with("https://") {
            self.return_to.clone()
        } else {
            request.url_for(&self.return_to)
        }
    }

    async fn start_login<S: SessionStore + ?Sized>(
        &self,
        request: &LoginRequest,
        session: &mut S,
    ) -> Result<ResponseInstruction, LoginError> {
        let callback_url = request.url();
        LoggingHelper::log_login_started(&callback_url);

        let grant = self
            .client
            .get_request_token(&callback_url)
            .await
            .map_err(LoginError::RequestTokenFailed)?;
        session.store_request_token(&grant.token)?;

        let format = ResponseFormat::negotiate(request.accept.as_deref(), request.xhr);
        LoggingHelper::log_authorize_redirect(&grant.authorize_url, format.as_str());

        Ok(ResponseInstruction::Authorize {
            authorize_url: grant.authorize_url,
            format,
        })
    }

    fn deny<S: SessionStore + ?Sized>(
        &self,
        request: &LoginRequest,
        reason: &str,
        session: &mut S,
    ) -> Result<ResponseInstruction, LoginError> {
        LoggingHelper::log_access_denied(reason);
        session.clear_request_token();
        session.record_failure(LoginFailure::UserDenied)?;

        Ok(ResponseInstruction::Redirect {
            location: self.return_url(request),
        })
    }

    async fn complete_login<S: SessionStore + ?Sized>(
        &self,
        request: &LoginRequest,
        verifier: &str,
        session: &mut S,
    ) -> Result<ResponseInstruction, LoginError> {
        let Some(request_token) = session.pending_request_token() else {
            LoggingHelper::log_missing_request_token();
            return Err(LoginError::InvalidState);
        };

        let access_token = self
            .client
            .get_access_token(&request_token, verifier)
            .await
            .map_err(LoginError::AuthorizationFailed)?;
        session.exchange_request_token(&access_token)?;
        session.clear_failure();
        LoggingHelper::log_access_token_obtained();

        let profile = match self.fetch_profile(&access_token).await {
            Ok(profile) => profile,
            Err(error) => {
                LoggingHelper::log_profile_fetch_failed(&error);
                UserProfile::default()
            }
        };
        session.store_user(&profile)?;
        LoggingHelper::log_profile_stored(profile.screen_name().as_deref(), profile.len());

        Ok(ResponseInstruction::Delegate {
            fallback: self.return_url(request),
        })
    }

    async fn fetch_profile(
        &self,
        access_token: &AccessToken,
    ) -> Result<UserProfile, OAuthError> {
        let body = self.client.verify_credentials(access_token).await?;
        UserProfile::from_verify_credentials(&body)
            .map_err(|e| OAuthError::InvalidResponse(format!("verify_credentials body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RequestToken;
    use crate::session::{ACCESS_TOKEN_KEY, ERROR_KEY, REQUEST_TOKEN_KEY, USER_KEY};
    use crate::testing::mock::{MockCall, MockOAuthClient};
    use crate::utils::request_url::RequestOrigin;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn login_request(query: &str) -> LoginRequest {
        LoginRequest::new(RequestOrigin::new("http", "example.org", 80), "/login", query)
    }

    fn controller(mock: &Arc<MockOAuthClient>) -> FlowController {
        FlowController::new(mock.clone(), "/")
    }

    fn session_with_request_token() -> HashMap<String, Value> {
        let mut session = HashMap::new();
        session.insert(REQUEST_TOKEN_KEY.to_string(), json!(["reqtok", "reqsec"]));
        session
    }

    #[tokio::test]
    async fn test_login_start_stores_request_token() {
        let mock = Arc::new(MockOAuthClient::new());
        let mut session: HashMap<String, Value> = HashMap::new();

        let instruction = controller(&mock)
            .handle(&login_request(""), &mut session)
            .await
            .unwrap();

        assert_eq!(
            instruction,
            ResponseInstruction::Authorize {
                authorize_url: "http://provider.example/oauth".to_string(),
                format: ResponseFormat::Redirect,
            }
        );
        assert_eq!(
            session.pending_request_token(),
            Some(RequestToken::new("reqtok", "reqsec"))
        );
        assert_eq!(
            mock.calls(),
            vec![MockCall::RequestToken {
                callback_url: "http://example.org/login".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_login_start_passes_full_url_as_callback() {
        let mock = Arc::new(MockOAuthClient::new());
        let mut session: HashMap<String, Value> = HashMap::new();
        let request = LoginRequest::new(
            RequestOrigin::new("https", "example.org", 8443),
            "/login",
            "next=%2Fhome",
        )
        .with_accept("application/json");

        let instruction = controller(&mock).handle(&request, &mut session).await.unwrap();

        assert!(matches!(
            instruction,
            ResponseInstruction::Authorize {
                format: ResponseFormat::Json,
                ..
            }
        ));
        assert_eq!(
            mock.calls(),
            vec![MockCall::RequestToken {
                callback_url: "https://example.org:8443/login?next=%2Fhome".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_request_token_failure_leaves_session_untouched() {
        let mock = Arc::new(MockOAuthClient::new().failing_request_token());
        let mut session: HashMap<String, Value> = HashMap::new();

        let error = controller(&mock)
            .handle(&login_request(""), &mut session)
            .await
            .unwrap_err();

        assert!(matches!(error, LoginError::RequestTokenFailed(_)));
        assert!(session.is_empty());
    }

    #[tokio::test]
    async fn test_denied_clears_token_and_records_error() {
        let mock = Arc::new(MockOAuthClient::new());
        let mut session = session_with_request_token();

        let instruction = controller(&mock)
            .handle(&login_request("denied=OMG"), &mut session)
            .await
            .unwrap();

        assert_eq!(
            instruction,
            ResponseInstruction::Redirect {
                location: "http://example.org/".to_string()
            }
        );
        assert!(!session.contains_key(REQUEST_TOKEN_KEY));
        assert_eq!(session.get(ERROR_KEY), Some(&json!("user_denied")));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_verifier_without_request_token_is_invalid_state() {
        let mock = Arc::new(MockOAuthClient::new());
        let mut session: HashMap<String, Value> = HashMap::new();

        let error = controller(&mock)
            .handle(&login_request("oauth_verifier=v1"), &mut session)
            .await
            .unwrap_err();

        assert!(matches!(error, LoginError::InvalidState));
        assert!(mock.calls().is_empty());
        assert!(session.is_empty());
    }

    #[tokio::test]
    async fn test_verifier_exchange_completes_login() {
        let mock = Arc::new(MockOAuthClient::new().with_profile_body(r#"{"screen_name":"neo"}"#));
        let mut session = session_with_request_token();

        let instruction = controller(&mock)
            .handle(&login_request("oauth_verifier=v1"), &mut session)
            .await
            .unwrap();

        assert_eq!(
            instruction,
            ResponseInstruction::Delegate {
                fallback: "http://example.org/".to_string()
            }
        );
        assert!(!session.contains_key(REQUEST_TOKEN_KEY));
        assert_eq!(session.get(ACCESS_TOKEN_KEY), Some(&json!(["acc1", "sec1"])));
        assert_eq!(session.get(USER_KEY), Some(&json!({"screen_name": "neo"})));
        assert_eq!(
            mock.calls(),
            vec![
                MockCall::AccessToken {
                    request_token: RequestToken::new("reqtok", "reqsec"),
                    verifier: "v1".to_string(),
                },
                MockCall::VerifyCredentials {
                    access_token: AccessToken::new("acc1", "sec1"),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_successful_login_forgets_earlier_denial() {
        let mock = Arc::new(MockOAuthClient::new());
        let mut session = session_with_request_token();
        session.insert(ERROR_KEY.to_string(), json!("user_denied"));

        controller(&mock)
            .handle(&login_request("oauth_verifier=v1"), &mut session)
            .await
            .unwrap();

        assert!(!session.contains_key(ERROR_KEY));
        assert_eq!(session.last_failure(), None);
        assert_eq!(session.access_token(), Some(AccessToken::new("acc1", "sec1")));
    }

    #[tokio::test]
    async fn test_exchange_failure_keeps_earlier_denial() {
        let mock = Arc::new(MockOAuthClient::new().failing_access_token());
        let mut session = session_with_request_token();
        session.insert(ERROR_KEY.to_string(), json!("user_denied"));

        controller(&mock)
            .handle(&login_request("oauth_verifier=v1"), &mut session)
            .await
            .unwrap_err();

        assert_eq!(session.get(ERROR_KEY), Some(&json!("user_denied")));
    }

    #[tokio::test]
    async fn test_profile_is_filtered_before_storage() {
        let mock = Arc::new(MockOAuthClient::new().with_profile_body(
            r#"{"status":{"text":"hi"},"screen_name":"neo","profile_image_url":"http://img","followers_count":42,"favorite_color":"red"}"#,
        ));
        let mut session = session_with_request_token();

        controller(&mock)
            .handle(&login_request("oauth_verifier=v1"), &mut session)
            .await
            .unwrap();

        assert_eq!(
            session.get(USER_KEY),
            Some(&json!({"screen_name": "neo", "followers_count": 42}))
        );
    }

    #[tokio::test]
    async fn test_exchange_failure_keeps_request_token() {
        let mock = Arc::new(MockOAuthClient::new().failing_access_token());
        let mut session = session_with_request_token();

        let error = controller(&mock)
            .handle(&login_request("oauth_verifier=v1"), &mut session)
            .await
            .unwrap_err();

        assert!(matches!(error, LoginError::AuthorizationFailed(_)));
        assert!(session.contains_key(REQUEST_TOKEN_KEY));
        assert!(!session.contains_key(ACCESS_TOKEN_KEY));
    }

    #[tokio::test]
    async fn test_profile_failure_degrades_to_empty_profile() {
        let mock = Arc::new(MockOAuthClient::new().failing_verify_credentials());
        let mut session = session_with_request_token();

        let instruction = controller(&mock)
            .handle(&login_request("oauth_verifier=v1"), &mut session)
            .await
            .unwrap();

        assert!(matches!(instruction, ResponseInstruction::Delegate { .. }));
        assert_eq!(session.get(ACCESS_TOKEN_KEY), Some(&json!(["acc1", "sec1"])));
        assert_eq!(session.get(USER_KEY), Some(&json!({})));
    }

    #[tokio::test]
    async fn test_unparseable_profile_degrades_to_empty_profile() {
        let mock = Arc::new(MockOAuthClient::new().with_profile_body("not json"));
        let mut session = session_with_request_token();

        controller(&mock)
            .handle(&login_request("oauth_verifier=v1"), &mut session)
            .await
            .unwrap();

        assert_eq!(session.get(USER_KEY), Some(&json!({})));
    }

    #[test]
    fn test_absolute_return_to_is_used_verbatim() {
        let mock = Arc::new(MockOAuthClient::new());
        let controller = FlowController::new(mock, "https://app.example/home");
        assert_eq!(
            controller.return_url(&login_request("")),
            "https://app.example/home"
        );
    }
}
