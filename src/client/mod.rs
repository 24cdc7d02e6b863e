//! CLI chat client implementation.

mod error;
mod formatter;
mod session;

pub use error::ClientError;
pub use session::run_client;
