use std::collections::HashMap;

use actix_web::HttpRequest;

use crate::utils::headers::{accept_header, is_xhr_request};
use crate::utils::request_url::RequestOrigin;

/// What the flow controller needs to know about a login-path request
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub origin: RequestOrigin,
    pub path: String,
    pub query_string: String,
    pub query: HashMap<String, String>,
    pub accept: Option<String>,
    pub xhr: bool,
}

impl LoginRequest {
    #[must_use]
    pub fn new(origin: RequestOrigin, path: &str, query_string: &str) -> Self {
        Self {
            origin,
            path: path.to_string(),
            query_string: query_string.to_string(),
            query: parse_query(query_string),
            accept: None,
            xhr: false,
        }
    }

    #[must_use]
    pub fn from_http(req: &HttpRequest) -> Self {
        Self {
            accept: accept_header(req),
            xhr: is_xhr_request(req),
            ..Self::new(RequestOrigin::from_request(req), req.path(), req.query_string())
        }
    }

    #[must_use]
    pub fn with_accept(mut self, accept: &str) -> Self {
        self.accept = Some(accept.to_string());
        self
    }

    #[must_use]
    pub fn with_xhr(mut self, xhr: bool) -> Self {
        self.xhr = xhr;
        self
    }

    /// The exact URL of this request, used as the OAuth callback
    #[must_use]
    pub fn url(&self) -> String {
        self.origin.url_with_query(&self.path, &self.query_string)
    }

    /// Absolute URL for another path on the same origin
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        self.origin.url_for(path)
    }
}

/// First value wins when a parameter repeats
fn parse_query(query_string: &str) -> HashMap<String, String> {
    let mut query = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(query_string.as_bytes()) {
        query
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    query
}
