//! HTTP request builders for testing the middleware and handlers
//!
//! [`RequestBuilder`] produces either an `HttpRequest` (unit tests of helpers)
//! or an `actix_web::test::TestRequest` (service tests via `call_service`).

use actix_web::cookie::Cookie;
use actix_web::http::{header, Method};
use actix_web::test::TestRequest;
use actix_web::HttpRequest;

use super::constants::{TEST_HOST, TEST_USER_AGENT};

/// Builder for creating HTTP requests for testing
pub struct RequestBuilder {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    cookies: Vec<Cookie<'static>>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    /// GET `/` on the test host
    #[must_use]
    pub fn new() -> Self {
        Self {
            method: Method::GET,
            uri: "/".to_string(),
            headers: vec![("Host".to_string(), TEST_HOST.to_string())],
            cookies: Vec::new(),
        }
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        self.uri = uri.to_string();
        self
    }

    /// Add a header, replacing any earlier value for the same name
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn host(self, host: &str) -> Self {
        self.header("Host", host)
    }

    /// Typical browser navigation headers
    #[must_use]
    pub fn browser_headers(self) -> Self {
        self.header(header::USER_AGENT.as_str(), TEST_USER_AGENT).header(
            header::ACCEPT.as_str(),
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
    }

    /// Client asking for JSON
    #[must_use]
    pub fn json_accept(self) -> Self {
        self.header(header::ACCEPT.as_str(), "application/json")
    }

    /// Client asking for a script
    #[must_use]
    pub fn script_accept(self) -> Self {
        self.header(header::ACCEPT.as_str(), "text/javascript, application/javascript, */*; q=0.01")
    }

    /// Mark the request as coming from `XMLHttpRequest`
    #[must_use]
    pub fn xhr(self) -> Self {
        self.header("X-Requested-With", "XMLHttpRequest")
    }

    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Build a `TestRequest` for `call_service`
    #[must_use]
    pub fn to_test_request(self) -> TestRequest {
        let mut req = TestRequest::default().method(self.method).uri(&self.uri);

        for (name, value) in self.headers {
            req = req.insert_header((name, value));
        }

        for cookie in self.cookies {
            req = req.cookie(cookie);
        }

        req
    }

    /// Build the final `HttpRequest`
    #[must_use]
    pub fn build(self) -> HttpRequest {
        self.to_test_request().to_http_request()
    }
}

/// Shortcuts for the request shapes the login flow distinguishes
pub struct TestRequestBuilder;

impl TestRequestBuilder {
    /// Browser navigation without any XHR markers
    #[must_use]
    pub fn browser_request() -> HttpRequest {
        RequestBuilder::new().browser_headers().build()
    }

    /// Client asking for JSON
    #[must_use]
    pub fn api_request() -> HttpRequest {
        RequestBuilder::new()
            .header(header::USER_AGENT.as_str(), "MyApp/1.0")
            .json_accept()
            .build()
    }

    /// `XMLHttpRequest` without an explicit `Accept`
    #[must_use]
    pub fn xhr_request() -> HttpRequest {
        RequestBuilder::new().xhr().build()
    }

    /// No headers besides `Host`
    #[must_use]
    pub fn empty_request() -> HttpRequest {
        RequestBuilder::new().build()
    }
}
