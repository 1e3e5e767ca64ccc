//! Assertion helpers for responses produced by the login middleware

use actix_web::dev::ServiceResponse;
use actix_web::http::header;

use crate::session::{CookieFactory, CookieSession};

/// Assert that a response has the expected status code
///
/// # Panics
///
/// Panics if the response status does not match the expected status code.
pub fn assert_status<B>(response: &ServiceResponse<B>, expected_status: u16) {
    assert_eq!(
        response.status().as_u16(),
        expected_status,
        "Expected status {expected_status}, got {}",
        response.status()
    );
}

/// Assert that a response header has a specific value
///
/// # Panics
///
/// Panics if the header is not present or has a different value.
pub fn assert_header_value<B>(response: &ServiceResponse<B>, header_name: &str, expected_value: &str) {
    if let Some(header_value) = response.headers().get(header_name) {
        assert_eq!(
            header_value.to_str().unwrap_or(""),
            expected_value,
            "Header '{header_name}' has wrong value"
        );
    } else {
        panic!("Header '{header_name}' not found in response");
    }
}

/// Assert a plain `302` redirect to `location`
///
/// # Panics
///
/// Panics if the response is not a `302` with that `Location`.
pub fn assert_redirect_to<B>(response: &ServiceResponse<B>, location: &str) {
    assert_status(response, 302);
    assert_header_value(response, header::LOCATION.as_str(), location);
}

/// Assert that the response does not touch the session cookie
///
/// # Panics
///
/// Panics if a `Set-Cookie` for `cookie_name` is present.
pub fn assert_no_session_cookie<B>(response: &ServiceResponse<B>, cookie_name: &str) {
    assert!(
        response
            .response()
            .cookies()
            .all(|cookie| cookie.name() != cookie_name),
        "Expected no '{cookie_name}' cookie in response"
    );
}

/// Decrypt the session written by the response, if any
#[must_use]
pub fn session_from_response<B>(
    response: &ServiceResponse<B>,
    factory: &CookieFactory,
) -> Option<CookieSession> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == factory.cookie_name())
        .and_then(|cookie| factory.decode(cookie.value()))
}
