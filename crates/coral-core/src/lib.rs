//! coral-core: Core abstractions and configuration for the CoralStor client
//!
//! This crate provides the closed error taxonomy, configuration structures,
//! and shared types used by the REST and SSH transports and the dispatcher.

pub mod config;
pub mod error;
pub mod sanitize;
pub mod types;

pub use config::{ClientConfig, MissingKeyPolicy, RestConfig, RetryConfig, SshConfig};
pub use error::{ClientError, ErrorDetails, ErrorKind, ProcessError};
pub use sanitize::sanitize_certificates;
pub use types::{SessionKey, WsApiVersion};
