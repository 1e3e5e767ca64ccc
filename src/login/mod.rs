//! The login flow: request classification, the OAuth exchange and the
//! response it produces.

pub mod classifier;
pub mod errors;
pub mod flow;
pub mod request;
pub mod response;

pub use classifier::{classify, LoginRequestKind};
pub use errors::LoginError;
pub use flow::FlowController;
pub use request::LoginRequest;
pub use response::{ResponseFormat, ResponseInstruction};
