//! OAuth 1.0a request signing (RFC 5849, HMAC-SHA1)

use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use url::Url;

use super::OAuthError;
use crate::utils::crypto::generate_oauth_nonce;

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

/// RFC 3986 percent-encoding: everything except `A-Z a-z 0-9 - . _ ~`
#[must_use]
pub fn percent_encode(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}

/// Signs one request with consumer credentials and an optional token
#[derive(Debug, Clone)]
pub struct RequestSigner<'a> {
    consumer_key: &'a str,
    consumer_secret: &'a str,
    token: Option<&'a str>,
    token_secret: &'a str,
    extra: Vec<(&'a str, &'a str)>,
    nonce: String,
    timestamp: String,
}

impl<'a> RequestSigner<'a> {
    /// Signer with a fresh nonce and the current timestamp
    #[must_use]
    pub fn new(consumer_key: &'a str, consumer_secret: &'a str) -> Self {
        Self {
            consumer_key,
            consumer_secret,
            token: None,
            token_secret: "",
            extra: Vec::new(),
            nonce: generate_oauth_nonce(),
            timestamp: chrono::Utc::now().timestamp().to_string(),
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: &'a str, token_secret: &'a str) -> Self {
        self.token = Some(token);
        self.token_secret = token_secret;
        self
    }

    /// Additional protocol parameter such as `oauth_callback` or `oauth_verifier`
    #[must_use]
    pub fn with_oauth_param(mut self, name: &'a str, value: &'a str) -> Self {
        self.extra.push((name, value));
        self
    }

    #[must_use]
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = nonce.into();
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    fn oauth_params(&self) -> Vec<(&str, &str)> {
        let mut params = vec![
            ("oauth_consumer_key", self.consumer_key),
            ("oauth_nonce", self.nonce.as_str()),
            ("oauth_signature_method", SIGNATURE_METHOD),
            ("oauth_timestamp", self.timestamp.as_str()),
            ("oauth_version", OAUTH_VERSION),
        ];
        if let Some(token) = self.token {
            params.push(("oauth_token", token));
        }
        params.extend(self.extra.iter().copied());
        params
    }

    /// Signature base string: `METHOD&base-url&normalized-params`
    ///
    /// Query parameters of `url` and the form-encoded `body` parameters take
    /// part in the signature.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is not an absolute URL
    pub fn base_string(
        &self,
        method: &str,
        url: &str,
        body: &[(&str, &str)],
    ) -> Result<String, OAuthError> {
        let parsed = Url::parse(url)
            .map_err(|e| OAuthError::Configuration(format!("invalid request URL {url}: {e}")))?;

        let mut pairs: Vec<(String, String)> = self
            .oauth_params()
            .into_iter()
            .chain(body.iter().copied())
            .map(|(k, v)| (percent_encode(k), percent_encode(v)))
            .collect();
        pairs.extend(
            parsed
                .query_pairs()
                .map(|(k, v)| (percent_encode(&k), percent_encode(&v))),
        );
        pairs.sort();

        let normalized = pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        Ok(format!(
            "{}&{}&{}",
            method.to_ascii_uppercase(),
            percent_encode(&base_url(&parsed)),
            percent_encode(&normalized)
        ))
    }

    /// Base64 HMAC-SHA1 signature of the request
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is not an absolute URL
    pub fn signature(
        &self,
        method: &str,
        url: &str,
        body: &[(&str, &str)],
    ) -> Result<String, OAuthError> {
        let base = self.base_string(method, url, body)?;
        let key = format!(
            "{}&{}",
            percent_encode(self.consumer_secret),
            percent_encode(self.token_secret)
        );

        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|e| OAuthError::Configuration(format!("invalid signing key: {e}")))?;
        mac.update(base.as_bytes());
        Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Value of the `Authorization` header for the request
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is not an absolute URL
    pub fn authorization_header(
        &self,
        method: &str,
        url: &str,
        body: &[(&str, &str)],
    ) -> Result<String, OAuthError> {
        let signature = self.signature(method, url, body)?;
        let mut params = self.oauth_params();
        params.push(("oauth_signature", signature.as_str()));
        params.sort_unstable();

        let fields = params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("OAuth {fields}"))
    }
}

/// `scheme://host[:port]/path` with default ports dropped, as required for signing
fn base_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}://{host}:{port}{}", url.scheme(), url.path()),
        None => format!("{}://{host}{}", url.scheme(), url.path()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Worked example from Twitter's "Creating a signature" documentation
    const CONSUMER_KEY: &str = "xvz1evFS4wEEPTGEFPHBog";
    const CONSUMER_SECRET: &str = "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw";
    const TOKEN: &str = "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb";
    const TOKEN_SECRET: &str = "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE";
    const URL: &str = "https://api.twitter.com/1.1/statuses/update.json?include_entities=true";
    const STATUS: &str = "Hello Ladies + Gentlemen, a signed OAuth request!";

    fn documented_signer() -> RequestSigner<'static> {
        RequestSigner::new(CONSUMER_KEY, CONSUMER_SECRET)
            .with_token(TOKEN, TOKEN_SECRET)
            .with_nonce("kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg")
            .with_timestamp("1318622958")
    }

    #[test]
    fn test_base_string_matches_documented_example() {
        let base = documented_signer()
            .base_string("post", URL, &[("status", STATUS)])
            .unwrap();
        assert!(base.starts_with(
            "POST&https%3A%2F%2Fapi.twitter.com%2F1.1%2Fstatuses%2Fupdate.json&include_entities%3Dtrue%26oauth_consumer_key%3Dxvz1evFS4wEEPTGEFPHBog"
        ));
        assert!(base.ends_with(
            "status%3DHello%2520Ladies%2520%252B%2520Gentlemen%252C%2520a%2520signed%2520OAuth%2520request%2521"
        ));
    }

    #[test]
    fn test_signature_matches_documented_example() {
        let signature = documented_signer()
            .signature("POST", URL, &[("status", STATUS)])
            .unwrap();
        assert_eq!(signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
    }

    #[test]
    fn test_authorization_header_lists_protocol_params_only() {
        let header = RequestSigner::new("abc", "123")
            .with_oauth_param("oauth_callback", "http://example.org/login")
            .with_nonce("nonce")
            .with_timestamp("1")
            .authorization_header("POST", "http://api.twitter.com/oauth/request_token", &[])
            .unwrap();

        assert!(header.starts_with("OAuth oauth_callback=\"http%3A%2F%2Fexample.org%2Flogin\", "));
        assert!(header.contains("oauth_consumer_key=\"abc\""));
        assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
        assert!(header.contains("oauth_signature=\""));
        assert!(!header.contains("oauth_token="));
    }

    #[test]
    fn test_default_port_dropped_from_base_url() {
        let url = Url::parse("HTTPS://API.Example.com:443/path?x=1").unwrap();
        assert_eq!(base_url(&url), "https://api.example.com/path");
        let url = Url::parse("http://api.example.com:8080/path").unwrap();
        assert_eq!(base_url(&url), "http://api.example.com:8080/path");
    }

    #[test]
    fn test_relative_url_rejected() {
        assert!(RequestSigner::new("abc", "123")
            .signature("GET", "/relative", &[])
            .is_err());
    }

    #[test]
    fn test_percent_encode_is_rfc3986() {
        assert_eq!(percent_encode("a b+c~d-e.f_g"), "a%20b%2Bc~d-e.f_g");
        assert_eq!(percent_encode("☃"), "%E2%98%83");
    }
}
