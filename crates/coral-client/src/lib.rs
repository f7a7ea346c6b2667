//! coral-client: Unified client for CoralStor storage arrays
//!
//! A CoralStor array exposes two control surfaces: the JSON/HTTPS WSAPI and a
//! CLI reachable over SSH for operations the WSAPI does not cover. This crate
//! presents one API over both, routing each operation to the right transport
//! and projecting CLI output into the same JSON-shaped results the WSAPI
//! returns.
//!
//! Entry point is [`CoralClient`]; see [`coral_core::config::ClientConfig`]
//! for transport settings.

pub mod client;
pub mod resources;
pub mod rest;
pub mod ssh;

pub use client::{CoralClient, WSAPI_MIN_BUILD, WSAPI_MIN_BUILD_FILTERED_QUERY};
pub use resources::remotecopy::RecoveryAction;
pub use rest::{RequestTiming, RestSession};
pub use ssh::{CommandPolicy, OptValue, SshExecutor};

pub use coral_core::{ClientError, ErrorKind};
pub use coral_protocol::CommandResult;
