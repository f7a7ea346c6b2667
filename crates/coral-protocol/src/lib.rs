//! coral-protocol: CLI text protocol for CoralStor arrays
//!
//! This crate turns the line-oriented TCL/CSV output of the array CLI into
//! the same JSON-shaped result objects the WSAPI produces, so callers see a
//! single data model regardless of transport.

pub mod error;
pub mod interface;
pub mod result;
pub mod tcl;

pub use error::ProtocolError;
pub use interface::{parse_interfaces, project, Descriptor, FieldKey};
pub use result::CommandResult;
pub use tcl::{parse, serialize, TclNode};
