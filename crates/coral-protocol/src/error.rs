//! Protocol error types

use thiserror::Error;

/// Errors that can occur while parsing array CLI output
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Closing brace without a matching opening brace
    #[error("Unbalanced braces: unexpected '}}' at byte {position}")]
    UnexpectedClose { position: usize },

    /// Input ended while brace groups were still open
    #[error("Unbalanced braces: {depth} group(s) left open at end of input")]
    UnclosedGroup { depth: usize },

    /// An interface entry did not start with a command name
    #[error("Malformed interface entry: {0}")]
    MalformedInterface(String),
}
