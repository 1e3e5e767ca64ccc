//! Request-scoped session handle shared between the login middleware and
//! application handlers.

use std::cell::RefCell;
use std::future::{ready, Ready};
use std::rc::Rc;

use actix_web::{dev::Payload, error::ErrorInternalServerError, Error, FromRequest, HttpMessage, HttpRequest};

use super::{CookieSession, LoginSessionExt};
use crate::models::{AccessToken, LoginFailure, UserProfile};
use crate::oauth::{AuthorizedClient, ConsumerConfig, OAuthError};

/// Shared, request-local session state
///
/// The middleware installs one handle per request; handlers reach it through
/// the [`LoginSession`] extractor. Actix handles a request on a single worker
/// thread, so `Rc<RefCell<_>>` is enough.
#[derive(Clone, Default)]
pub struct SessionHandle(Rc<RefCell<CookieSession>>);

impl SessionHandle {
    #[must_use]
    pub fn new(session: CookieSession) -> Self {
        Self(Rc::new(RefCell::new(session)))
    }

    /// Install the handle into the request extensions
    pub fn install(&self, req: &impl HttpMessage) {
        req.extensions_mut().insert(self.clone());
    }

    #[must_use]
    pub fn from_request(req: &impl HttpMessage) -> Option<Self> {
        req.extensions().get::<Self>().cloned()
    }

    /// Move the session out so it can be held across an await point
    #[must_use]
    pub fn take(&self) -> CookieSession {
        self.0.take()
    }

    /// Put back a session previously obtained with [`SessionHandle::take`]
    pub fn restore(&self, session: CookieSession) {
        *self.0.borrow_mut() = session;
    }

    #[must_use]
    pub fn snapshot(&self) -> CookieSession {
        self.0.borrow().clone()
    }

    fn with<R>(&self, f: impl FnOnce(&CookieSession) -> R) -> R {
        f(&*self.0.borrow())
    }

    fn with_mut<R>(&self, f: impl FnOnce(&mut CookieSession) -> R) -> R {
        f(&mut *self.0.borrow_mut())
    }
}

/// Extractor giving application handlers access to the login state
///
/// ```ignore
/// async fn index(login: LoginSession) -> HttpResponse {
///     match login.twitter_user() {
///         Some(user) => HttpResponse::Ok().body(format!("Hello, @{}", user.screen_name().unwrap_or_default())),
///         None => HttpResponse::Ok().body("Not logged in"),
///     }
/// }
/// ```
#[derive(Clone)]
pub struct LoginSession {
    handle: SessionHandle,
}

impl LoginSession {
    #[must_use]
    pub fn new(handle: SessionHandle) -> Self {
        Self { handle }
    }

    /// Profile of the logged-in user, if any
    #[must_use]
    pub fn twitter_user(&self) -> Option<UserProfile> {
        self.handle.with(LoginSessionExt::twitter_user)
    }

    #[must_use]
    pub fn access_token(&self) -> Option<AccessToken> {
        self.handle.with(LoginSessionExt::access_token)
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.access_token().is_some()
    }

    /// Failure recorded by the last login attempt
    #[must_use]
    pub fn last_error(&self) -> Option<LoginFailure> {
        self.handle.with(LoginSessionExt::last_failure)
    }

    /// Client for signed API calls on behalf of the logged-in user
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn twitter_client(
        &self,
        consumer: &ConsumerConfig,
    ) -> Result<Option<AuthorizedClient>, OAuthError> {
        self.access_token()
            .map(|token| AuthorizedClient::new(consumer.clone(), token))
            .transpose()
    }

    /// Forget the access token and profile
    pub fn logout(&self) {
        self.handle.with_mut(LoginSessionExt::logout);
    }
}

impl FromRequest for LoginSession {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            SessionHandle::from_request(req)
                .map(LoginSession::new)
                .ok_or_else(|| {
                    log::error!("LoginSession extracted without the TwitterLogin middleware installed");
                    ErrorInternalServerError("session unavailable")
                }),
        )
    }
}
