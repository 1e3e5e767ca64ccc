//! actix-web middleware that owns the login path
//!
//! Every request gets a [`SessionHandle`] in its extensions. `GET` requests to
//! the login path are answered by the OAuth flow; everything else goes to the
//! wrapped application untouched.

use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{Method, StatusCode},
    Error,
};
use futures::future::LocalBoxFuture;

use crate::login::{FlowController, LoginError, LoginRequest, ResponseInstruction};
use crate::oauth::{ConsumerConfig, OAuthClient, OAuthError, TwitterClient};
use crate::session::{CookieFactory, SessionError, SessionHandle};
use crate::settings::LoginSettings;
use crate::utils::logging::LoggingHelper;
use crate::utils::response_builder::ResponseBuilder;

pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_RETURN_TO: &str = "/";

/// Per-instance options of the login middleware
#[derive(Debug, Clone)]
pub struct LoginOptions {
    pub consumer: ConsumerConfig,
    pub login_path: String,
    pub return_to: String,
}

impl LoginOptions {
    #[must_use]
    pub fn new(consumer: ConsumerConfig) -> Self {
        Self {
            consumer,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            return_to: DEFAULT_RETURN_TO.to_string(),
        }
    }

    #[must_use]
    pub fn with_login_path(mut self, login_path: &str) -> Self {
        self.login_path = login_path.to_string();
        self
    }

    #[must_use]
    pub fn with_return_to(mut self, return_to: &str) -> Self {
        self.return_to = return_to.to_string();
        self
    }

    #[must_use]
    pub fn from_settings(settings: &LoginSettings) -> Self {
        Self::new(ConsumerConfig::from_settings(&settings.twitter))
            .with_login_path(&settings.login.login_path)
            .with_return_to(&settings.login.return_to)
    }
}

/// Middleware factory; wrap an `App` with it
///
/// ```ignore
/// App::new()
///     .wrap(TwitterLogin::from_settings(&settings)?)
///     .route("/", web::get().to(index))
/// ```
#[derive(Clone)]
pub struct TwitterLogin {
    state: Arc<LoginState>,
}

struct LoginState {
    flow: FlowController,
    login_path: String,
    consumer: Arc<ConsumerConfig>,
    cookies: CookieFactory,
}

impl TwitterLogin {
    #[must_use]
    pub fn new(options: LoginOptions, client: Arc<dyn OAuthClient>, cookies: CookieFactory) -> Self {
        LoggingHelper::log_middleware_configured(
            &options.consumer,
            &options.login_path,
            &options.return_to,
        );
        Self {
            state: Arc::new(LoginState {
                flow: FlowController::new(client, options.return_to),
                login_path: options.login_path,
                consumer: Arc::new(options.consumer),
                cookies,
            }),
        }
    }

    /// Build the middleware talking to the real provider
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn from_settings(settings: &LoginSettings) -> Result<Self, OAuthError> {
        let options = LoginOptions::from_settings(settings);
        let client = TwitterClient::new(
            options.consumer.clone(),
            settings.twitter.provider_timeout(),
        )?;
        Ok(Self::new(
            options,
            Arc::new(client),
            CookieFactory::from_settings(&settings.session),
        ))
    }

    /// Consumer credentials, for handlers that call the API on the user's behalf
    #[must_use]
    pub fn consumer(&self) -> Arc<ConsumerConfig> {
        Arc::clone(&self.state.consumer)
    }
}

impl<S, B> Transform<S, ServiceRequest> for TwitterLogin
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = TwitterLoginMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TwitterLoginMiddleware {
            service: Rc::new(service),
            state: Arc::clone(&self.state),
        }))
    }
}

pub struct TwitterLoginMiddleware<S> {
    service: Rc<S>,
    state: Arc<LoginState>,
}

impl<S, B> Service<ServiceRequest> for TwitterLoginMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let state = Arc::clone(&self.state);

        Box::pin(async move {
            let handle = SessionHandle::new(state.cookies.load(req.request()));
            handle.install(&req);

            if !state.is_login_request(&req) {
                let res = service.call(req).await?;
                return state.persist(&handle, res.map_into_left_body());
            }

            let login_request = LoginRequest::from_http(req.request());
            let mut session = handle.take();
            let outcome = state.flow.handle(&login_request, &mut session).await;
            handle.restore(session);

            let res = match outcome {
                Ok(ResponseInstruction::Delegate { fallback }) => {
                    let res = service.call(req).await?;
                    if res.status() == StatusCode::NOT_FOUND {
                        LoggingHelper::log_app_not_found(&fallback);
                        let (http_req, _) = res.into_parts();
                        ServiceResponse::new(http_req, ResponseBuilder::redirect(&fallback))
                            .map_into_right_body()
                    } else {
                        res.map_into_left_body()
                    }
                }
                Ok(instruction) => match instruction.into_response() {
                    Some(response) => req.into_response(response).map_into_right_body(),
                    None => service.call(req).await?.map_into_left_body(),
                },
                Err(error) => {
                    LoggingHelper::log_flow_failed(&error);
                    req.error_response(error).map_into_right_body()
                }
            };

            state.persist(&handle, res)
        })
    }
}

impl LoginState {
    fn is_login_request(&self, req: &ServiceRequest) -> bool {
        req.method() == Method::GET && req.path() == self.login_path
    }

    /// Write the session cookie when the request changed the session
    fn persist<B>(
        &self,
        handle: &SessionHandle,
        mut res: ServiceResponse<B>,
    ) -> Result<ServiceResponse<B>, Error> {
        let session = handle.snapshot();
        if !session.is_changed() {
            return Ok(res);
        }

        let cookie = self
            .cookies
            .create_session_cookie(&session)
            .map_err(|e| LoginError::from(SessionError::from(e)))?;
        res.response_mut().add_cookie(&cookie)?;
        Ok(res)
    }
}
