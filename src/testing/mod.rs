//! Testing utilities for the login middleware
//!
//! Available to unit tests and, behind the `testing` feature, to the
//! integration tests under `tests/`.
//!
//! ## Organization
//!
//! - [`fixtures`] - Pre-built configuration, sessions and middleware
//! - [`mock`] - A canned OAuth provider that records its calls
//! - [`requests`] - HTTP request builders
//! - [`assertions`] - Assertion helpers for middleware responses
//!
//! ## Usage
//!
//! ```rust,ignore
//! use twitter_login::testing::{fixtures::TestFixtures, mock::MockOAuthClient};
//!
//! let mock = MockOAuthClient::new().shared();
//! let app = test::init_service(
//!     App::new()
//!         .wrap(TestFixtures::middleware(mock.clone()))
//!         .default_service(web::to(|| async { HttpResponse::NotFound().finish() })),
//! )
//! .await;
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mock;
pub mod requests;

// Re-export commonly used items for convenience
pub use assertions::*;
pub use fixtures::TestFixtures;
pub use mock::{MockCall, MockOAuthClient};
pub use requests::{RequestBuilder, TestRequestBuilder};

/// Common test constants
pub mod constants {
    /// Host the test requests are addressed to
    pub const TEST_HOST: &str = "example.org";

    pub const TEST_CONSUMER_KEY: &str = "abc";
    pub const TEST_CONSUMER_SECRET: &str = "123";

    /// Tokens handed out by the mock provider
    pub const TEST_REQUEST_TOKEN: &str = "reqtok";
    pub const TEST_REQUEST_SECRET: &str = "reqsec";
    pub const TEST_ACCESS_TOKEN: &str = "acc1";
    pub const TEST_ACCESS_SECRET: &str = "sec1";

    /// Authorize URL returned with the mock request token
    pub const TEST_AUTHORIZE_URL: &str = "http://provider.example/oauth";

    pub const TEST_SCREEN_NAME: &str = "neo";

    /// Cookie encryption secret used by the fixtures
    pub const TEST_SESSION_SECRET: &[u8] = b"test_key_32_bytes_long_for_test_";

    /// Default test user agent string
    pub const TEST_USER_AGENT: &str =
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";
}
