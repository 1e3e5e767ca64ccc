use actix_web::{http::header, HttpRequest};

/// Value of `X-Requested-With` sent by XHR-based clients
pub const XHR_HEADER_VALUE: &str = "XMLHttpRequest";

/// The request's `Accept` header, if present and readable
#[must_use]
pub fn accept_header(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string)
}

/// Determine if a request was made through `XMLHttpRequest`
#[must_use]
pub fn is_xhr_request(req: &HttpRequest) -> bool {
    req.headers()
        .get("x-requested-with")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case(XHR_HEADER_VALUE))
}

/// Whether an `Accept` header lists the given media type
///
/// Parameters such as `q=` are ignored; `*/*` does not count as a match.
#[must_use]
pub fn accepts(accept: Option<&str>, media_type: &str) -> bool {
    accept.is_some_and(|accept| {
        accept.split(',').any(|entry| {
            entry
                .split(';')
                .next()
                .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(media_type))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::requests::TestRequestBuilder;

    #[test]
    fn test_accepts_matches_listed_types() {
        assert!(accepts(Some("application/json"), "application/json"));
        assert!(accepts(
            Some("text/html, application/json;q=0.9"),
            "application/json"
        ));
        assert!(accepts(Some("Application/JavaScript"), "application/javascript"));
        assert!(!accepts(Some("*/*"), "application/json"));
        assert!(!accepts(Some("text/html"), "application/json"));
        assert!(!accepts(None, "application/json"));
    }

    #[test]
    fn test_is_xhr_request() {
        assert!(is_xhr_request(&TestRequestBuilder::xhr_request()));
        assert!(!is_xhr_request(&TestRequestBuilder::browser_request()));
        assert!(!is_xhr_request(&TestRequestBuilder::empty_request()));
    }

    #[test]
    fn test_accept_header() {
        assert_eq!(
            accept_header(&TestRequestBuilder::api_request()).as_deref(),
            Some("application/json")
        );
        assert!(accept_header(&TestRequestBuilder::empty_request()).is_none());
    }
}
