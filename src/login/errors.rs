use actix_web::{http::StatusCode, HttpResponse, ResponseError};

use crate::oauth::OAuthError;
use crate::session::SessionError;
use crate::utils::response_builder::ResponseBuilder;

/// Failures of the login flow
///
/// Provider details stay in the `source` chain for logging; the HTTP response
/// only carries a generic description.
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    /// A verifier arrived but no request token is pending in the session
    #[error("OAuth callback without a pending request token")]
    InvalidState,
    /// The provider would not issue a request token
    #[error("failed to obtain a request token: {0}")]
    RequestTokenFailed(#[source] OAuthError),
    /// The provider rejected the verifier exchange
    #[error("authorization failed: {0}")]
    AuthorizationFailed(#[source] OAuthError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ResponseError for LoginError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidState => StatusCode::BAD_REQUEST,
            Self::RequestTokenFailed(_) | Self::AuthorizationFailed(_) | Self::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::InvalidState => ResponseBuilder::error_json(
                self.status_code(),
                "invalid_request",
                "No login is in progress for this session",
            ),
            Self::RequestTokenFailed(_) | Self::AuthorizationFailed(_) => {
                ResponseBuilder::error_json(
                    self.status_code(),
                    "server_error",
                    "Authorization with Twitter failed",
                )
            }
            Self::Session(_) => ResponseBuilder::error_json(
                self.status_code(),
                "server_error",
                "An internal server error occurred",
            ),
        }
    }
}
