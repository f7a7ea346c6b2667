//! WSAPI transport: authenticated JSON requests with retry and error mapping

mod retry;
mod session;

pub use retry::RetryState;
pub use session::{RequestTiming, RestSession, SESSION_HEADER};
