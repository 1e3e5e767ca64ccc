pub mod crypto;
pub mod headers;
pub mod logging;
pub mod request_url;
pub mod response_builder;
