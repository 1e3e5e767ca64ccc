use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;

use super::{ConsumerConfig, OAuthClient, OAuthError, RequestSigner, RequestTokenGrant};
use crate::models::{AccessToken, RequestToken};
use crate::utils::logging::LoggingHelper;

/// Timeout applied to provider calls when none is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP implementation of [`OAuthClient`] against the Twitter API
#[derive(Clone)]
pub struct TwitterClient {
    consumer: ConsumerConfig,
    http_client: reqwest::Client,
}

impl TwitterClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(consumer: ConsumerConfig, timeout: Duration) -> Result<Self, OAuthError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            consumer,
            http_client,
        })
    }

    #[must_use]
    pub fn consumer(&self) -> &ConsumerConfig {
        &self.consumer
    }

    async fn post_token_request(
        &self,
        endpoint: &'static str,
        url: &str,
        authorization: String,
    ) -> Result<(String, String), OAuthError> {
        let response = self
            .http_client
            .post(url)
            .header(AUTHORIZATION, authorization)
            .send()
            .await?;
        let body = read_success_body(endpoint, response).await?;
        parse_token_response(&body)
    }
}

#[async_trait]
impl OAuthClient for TwitterClient {
    async fn get_request_token(&self, callback_url: &str) -> Result<RequestTokenGrant, OAuthError> {
        let url = self.consumer.request_token_url();
        let authorization =
            RequestSigner::new(&self.consumer.consumer_key, &self.consumer.consumer_secret)
                .with_oauth_param("oauth_callback", callback_url)
                .authorization_header("POST", &url, &[])?;

        let (token, secret) = self
            .post_token_request("request_token", &url, authorization)
            .await?;
        let authorize_url = self.consumer.authorize_url(&token);

        Ok(RequestTokenGrant {
            token: RequestToken::new(token, secret),
            authorize_url,
        })
    }

    async fn get_access_token(
        &self,
        request_token: &RequestToken,
        verifier: &str,
    ) -> Result<AccessToken, OAuthError> {
        let url = self.consumer.access_token_url();
        let authorization =
            RequestSigner::new(&self.consumer.consumer_key, &self.consumer.consumer_secret)
                .with_token(&request_token.token, &request_token.secret)
                .with_oauth_param("oauth_verifier", verifier)
                .authorization_header("POST", &url, &[])?;

        let (token, secret) = self
            .post_token_request("access_token", &url, authorization)
            .await?;
        Ok(AccessToken::new(token, secret))
    }

    async fn verify_credentials(&self, access_token: &AccessToken) -> Result<String, OAuthError> {
        signed_get(
            &self.http_client,
            &self.consumer,
            access_token,
            &self.consumer.verify_credentials_url(),
        )
        .await
    }
}

/// Client for signed API calls on behalf of a logged-in user
#[derive(Clone)]
pub struct AuthorizedClient {
    consumer: ConsumerConfig,
    access_token: AccessToken,
    http_client: reqwest::Client,
}

impl AuthorizedClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(consumer: ConsumerConfig, access_token: AccessToken) -> Result<Self, OAuthError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            consumer,
            access_token,
            http_client,
        })
    }

    #[must_use]
    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// Signed GET of an API path relative to the provider site, e.g.
    /// `/1/statuses/home_timeline.json?count=5`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the provider rejects it
    pub async fn get(&self, path: &str) -> Result<String, OAuthError> {
        signed_get(
            &self.http_client,
            &self.consumer,
            &self.access_token,
            &self.consumer.api_url(path),
        )
        .await
    }

    /// Signed GET decoded as JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not valid JSON
    pub async fn get_json(&self, path: &str) -> Result<serde_json::Value, OAuthError> {
        let body = self.get(path).await?;
        serde_json::from_str(&body).map_err(|e| OAuthError::InvalidResponse(e.to_string()))
    }
}

async fn signed_get(
    http_client: &reqwest::Client,
    consumer: &ConsumerConfig,
    access_token: &AccessToken,
    url: &str,
) -> Result<String, OAuthError> {
    let authorization = RequestSigner::new(&consumer.consumer_key, &consumer.consumer_secret)
        .with_token(&access_token.token, &access_token.secret)
        .authorization_header("GET", url, &[])?;

    let response = http_client
        .get(url)
        .header(AUTHORIZATION, authorization)
        .send()
        .await?;
    read_success_body("api", response).await
}

async fn read_success_body(
    endpoint: &str,
    response: reqwest::Response,
) -> Result<String, OAuthError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        LoggingHelper::log_provider_error(endpoint, status.as_u16(), &body);
        return Err(OAuthError::Provider {
            status: status.as_u16(),
        });
    }
    Ok(body)
}

/// Parse `oauth_token=..&oauth_token_secret=..` form bodies
///
/// # Errors
///
/// Returns an error if either field is missing
pub fn parse_token_response(body: &str) -> Result<(String, String), OAuthError> {
    let mut token = None;
    let mut secret = None;
    for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
        match key.as_ref() {
            "oauth_token" => token = Some(value.into_owned()),
            "oauth_token_secret" => secret = Some(value.into_owned()),
            _ => {}
        }
    }

    match (token, secret) {
        (Some(token), Some(secret)) if !token.is_empty() => Ok((token, secret)),
        _ => Err(OAuthError::InvalidResponse(
            "token response is missing oauth_token or oauth_token_secret".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::net::TcpListener;
    use std::sync::Mutex;

    use actix_web::{dev::ServerHandle, http::header, web, App, HttpRequest, HttpResponse, HttpServer};
    use serde_json::json;

    /// `(uri, authorization)` of every request the local API server saw
    type SeenRequests = web::Data<Mutex<Vec<(String, String)>>>;

    async fn record_request(req: HttpRequest, seen: SeenRequests) -> HttpResponse {
        let authorization = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        seen.lock().unwrap().push((req.uri().to_string(), authorization));

        if req.path().starts_with("/private") {
            HttpResponse::Unauthorized().body("Could not authenticate you")
        } else {
            HttpResponse::Ok().json(json!({"screen_name": "neo"}))
        }
    }

    fn start_api_server(seen: SeenRequests) -> (String, ServerHandle) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let site = format!("http://{}", listener.local_addr().unwrap());
        let server = HttpServer::new(move || {
            App::new()
                .app_data(seen.clone())
                .default_service(web::to(record_request))
        })
        .workers(1)
        .listen(listener)
        .unwrap()
        .run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        (site, handle)
    }

    fn oauth_fields(authorization: &str) -> HashMap<String, String> {
        authorization
            .trim_start_matches("OAuth ")
            .split(", ")
            .filter_map(|field| field.split_once('='))
            .map(|(key, value)| {
                let value = urlencoding::decode(value.trim_matches('"')).unwrap();
                (key.to_string(), value.into_owned())
            })
            .collect()
    }

    #[test]
    fn test_parse_token_response() {
        let (token, secret) = parse_token_response(
            "oauth_token=reqtok&oauth_token_secret=reqsec&oauth_callback_confirmed=true",
        )
        .unwrap();
        assert_eq!(token, "reqtok");
        assert_eq!(secret, "reqsec");
    }

    #[test]
    fn test_parse_token_response_decodes_values() {
        let (token, secret) =
            parse_token_response("oauth_token_secret=a%2Bb&oauth_token=123-abc").unwrap();
        assert_eq!(token, "123-abc");
        assert_eq!(secret, "a+b");
    }

    #[test]
    fn test_parse_token_response_rejects_incomplete_bodies() {
        assert!(parse_token_response("oauth_token=reqtok").is_err());
        assert!(parse_token_response("oauth_token=&oauth_token_secret=x").is_err());
        assert!(parse_token_response("<html>Whoa there!</html>").is_err());
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_network_error() {
        let consumer = ConsumerConfig::new("abc", "123").with_site("http://127.0.0.1:9");
        let client = TwitterClient::new(consumer, Duration::from_secs(2)).unwrap();
        let result = client.get_request_token("http://example.org/login").await;
        assert!(matches!(result, Err(OAuthError::Network(_))));
    }

    #[test]
    fn test_authorized_client_keeps_token() {
        let client = AuthorizedClient::new(
            ConsumerConfig::new("abc", "123"),
            AccessToken::new("acc1", "sec1"),
        )
        .unwrap();
        assert_eq!(client.access_token(), &AccessToken::new("acc1", "sec1"));
    }

    #[actix_web::test]
    async fn test_authorized_get_is_signed_with_access_token() {
        let seen = SeenRequests::new(Mutex::new(Vec::new()));
        let (site, server) = start_api_server(seen.clone());
        let client = AuthorizedClient::new(
            ConsumerConfig::new("abc", "123").with_site(site.as_str()),
            AccessToken::new("acc1", "sec1"),
        )
        .unwrap();

        let body = client
            .get_json("/1/statuses/home_timeline.json?count=5")
            .await
            .unwrap();
        let (uri, authorization) = seen.lock().unwrap()[0].clone();
        server.stop(true).await;

        assert_eq!(body, json!({"screen_name": "neo"}));
        assert_eq!(uri, "/1/statuses/home_timeline.json?count=5");
        assert!(authorization.starts_with("OAuth "));
        assert!(authorization.contains("oauth_token=\"acc1\""));
        assert!(authorization.contains("oauth_consumer_key=\"abc\""));

        // The query string takes part in the signature
        let fields = oauth_fields(&authorization);
        let signer = RequestSigner::new("abc", "123")
            .with_token("acc1", "sec1")
            .with_nonce(fields["oauth_nonce"].as_str())
            .with_timestamp(fields["oauth_timestamp"].as_str());
        let with_query = format!("{site}/1/statuses/home_timeline.json?count=5");
        let without_query = format!("{site}/1/statuses/home_timeline.json");
        assert_eq!(
            fields["oauth_signature"],
            signer.signature("GET", &with_query, &[]).unwrap()
        );
        assert_ne!(
            fields["oauth_signature"],
            signer.signature("GET", &without_query, &[]).unwrap()
        );
    }

    #[actix_web::test]
    async fn test_authorized_get_reports_provider_rejection() {
        let seen = SeenRequests::new(Mutex::new(Vec::new()));
        let (site, server) = start_api_server(seen.clone());
        let client = AuthorizedClient::new(
            ConsumerConfig::new("abc", "123").with_site(site.as_str()),
            AccessToken::new("acc1", "sec1"),
        )
        .unwrap();

        let result = client.get("/private/messages.json").await;
        server.stop(true).await;

        assert!(matches!(result, Err(OAuthError::Provider { status: 401 })));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
