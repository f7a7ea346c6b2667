//! Closed error taxonomy for the CoralStor client
//!
//! Every failure surfaced by the client is one of these variants, regardless
//! of which transport produced it. Errors are plain values: they carry no
//! references to live transport state.

use coral_protocol::ProtocolError;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// The closed set of error kinds upper layers switch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed request (HTTP 400)
    BadRequest,
    /// Missing or expired session (HTTP 401)
    Unauthorized,
    /// Operation not permitted (HTTP 403)
    Forbidden,
    /// Resource does not exist (HTTP 404)
    NotFound,
    /// Verb not supported on this resource (HTTP 405)
    MethodNotAllowed,
    /// Resource state conflict (HTTP 409)
    Conflict,
    /// Request exceeds an array limit (HTTP 413)
    OverLimit,
    /// Array temporarily unable to serve (HTTP 503)
    ServiceUnavailable,
    /// Array-side failure or unmapped status (HTTP 500, others)
    InternalError,
    /// Gateway timed out (HTTP 504)
    GatewayTimeout,
    /// TLS negotiation or certificate failure
    SslFailure,
    /// Request timed out
    Timeout,
    /// Redirect limit exceeded
    TooManyRedirects,
    /// Socket-level connection failure
    ConnectionError,
    /// SSH transport or output-extraction failure
    SshException,
    /// Shell metacharacter detected in a command argument
    SshInjection,
    /// CLI command exited non-zero
    ProcessExecution,
    /// Array WSAPI build below the supported minimum
    UnsupportedVersion,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not-found",
            ErrorKind::MethodNotAllowed => "method-not-allowed",
            ErrorKind::Conflict => "conflict",
            ErrorKind::OverLimit => "over-limit",
            ErrorKind::ServiceUnavailable => "service-unavailable",
            ErrorKind::InternalError => "internal-error",
            ErrorKind::GatewayTimeout => "gateway-timeout",
            ErrorKind::SslFailure => "ssl-failure",
            ErrorKind::Timeout => "timeout",
            ErrorKind::TooManyRedirects => "too-many-redirects",
            ErrorKind::ConnectionError => "connection-error",
            ErrorKind::SshException => "ssh-exception",
            ErrorKind::SshInjection => "ssh-injection",
            ErrorKind::ProcessExecution => "process-execution",
            ErrorKind::UnsupportedVersion => "unsupported-version",
        };
        write!(f, "{name}")
    }
}

/// Structured payload of an HTTP-origin error
#[derive(Debug, Clone, Default)]
pub struct ErrorDetails {
    /// HTTP status that produced the error
    pub status: u16,
    /// Array error code, when the body was structured
    pub code: Option<i64>,
    /// Array error description
    pub description: Option<String>,
    /// Array reference string
    pub reference: Option<String>,
    /// First debug field
    pub debug1: Option<String>,
    /// Second debug field
    pub debug2: Option<String>,
    /// Raw body text, kept when the body was not structured JSON
    pub body: Option<String>,
}

impl ErrorDetails {
    /// Decode an HTTP error body, preserving the array's structured fields
    /// when present and the raw text otherwise.
    pub fn from_body(status: u16, body: &str) -> Self {
        let mut details = Self {
            status,
            ..Self::default()
        };

        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => {
                details.code = map.get("code").and_then(Value::as_i64);
                details.description = string_field(&map, "desc");
                details.reference = string_field(&map, "ref");
                details.debug1 = string_field(&map, "debug1");
                details.debug2 = string_field(&map, "debug2");
                if details.code.is_none() && details.description.is_none() {
                    details.body = Some(body.to_string());
                }
            }
            _ => {
                if !body.is_empty() {
                    details.body = Some(body.to_string());
                }
            }
        }

        details
    }
}

fn string_field(map: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(code) = self.code {
            write!(f, ", code {code}")?;
        }
        if let Some(desc) = &self.description {
            write!(f, ": {desc}")?;
        } else if let Some(body) = &self.body {
            write!(f, ": {body}")?;
        }
        if let Some(reference) = &self.reference {
            write!(f, " (ref: {reference})")?;
        }
        Ok(())
    }
}

/// Payload of a failed CLI command execution
#[derive(Debug, Clone)]
pub struct ProcessError {
    /// The command tokens that were executed
    pub command: Vec<String>,
    /// Remote exit status, when one was reported
    pub exit_code: Option<u32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "command '{}' failed", self.command.join(" "))?;
        match self.exit_code {
            Some(code) => write!(f, " with exit code {code}")?,
            None => write!(f, " without reporting an exit code")?,
        }
        if !self.stderr.is_empty() {
            write!(f, ": {}", self.stderr.trim_end())?;
        }
        Ok(())
    }
}

/// Top-level error type for the CoralStor client
#[derive(Error, Debug)]
pub enum ClientError {
    /// Malformed request
    #[error("Bad request: {0}")]
    BadRequest(ErrorDetails),

    /// Missing or expired session
    #[error("Unauthorized: {0}")]
    Unauthorized(ErrorDetails),

    /// Operation not permitted
    #[error("Forbidden: {0}")]
    Forbidden(ErrorDetails),

    /// Resource does not exist
    #[error("Not found: {0}")]
    NotFound(ErrorDetails),

    /// Verb not supported on this resource
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(ErrorDetails),

    /// Resource state conflict
    #[error("Conflict: {0}")]
    Conflict(ErrorDetails),

    /// Request exceeds an array limit
    #[error("Over limit: {0}")]
    OverLimit(ErrorDetails),

    /// Array temporarily unable to serve
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(ErrorDetails),

    /// Array-side failure or unmapped status
    #[error("Internal error: {0}")]
    InternalError(ErrorDetails),

    /// Gateway timed out
    #[error("Gateway timeout: {0}")]
    GatewayTimeout(ErrorDetails),

    /// TLS negotiation or certificate failure
    #[error("SSL failure: {0}")]
    SslFailure(String),

    /// Request timed out
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Redirect limit exceeded
    #[error("Too many redirects: {0}")]
    TooManyRedirects(String),

    /// Socket-level connection failure
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// SSH transport or output-extraction failure
    #[error("SSH error: {0}")]
    SshException(String),

    /// Shell metacharacter detected in a command argument
    #[error("Shell injection detected in argument: {0}")]
    SshInjection(String),

    /// CLI command exited non-zero
    #[error("{0}")]
    ProcessExecution(ProcessError),

    /// Array WSAPI build below the supported minimum
    #[error("Unsupported WSAPI build {build}; minimum supported build is {minimum}")]
    UnsupportedVersion {
        /// Build number reported by the array
        build: u32,
        /// Minimum build the client supports
        minimum: u32,
    },
}

impl ClientError {
    /// Map an HTTP error response to its taxonomy variant.
    ///
    /// Unmapped statuses ≥400 become [`ClientError::InternalError`] with the
    /// real status preserved in the payload.
    pub fn from_http(status: u16, body: &str) -> Self {
        let details = ErrorDetails::from_body(status, body);
        match status {
            400 => ClientError::BadRequest(details),
            401 => ClientError::Unauthorized(details),
            403 => ClientError::Forbidden(details),
            404 => ClientError::NotFound(details),
            405 => ClientError::MethodNotAllowed(details),
            409 => ClientError::Conflict(details),
            413 => ClientError::OverLimit(details),
            503 => ClientError::ServiceUnavailable(details),
            504 => ClientError::GatewayTimeout(details),
            _ => ClientError::InternalError(details),
        }
    }

    /// The taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::BadRequest(_) => ErrorKind::BadRequest,
            ClientError::Unauthorized(_) => ErrorKind::Unauthorized,
            ClientError::Forbidden(_) => ErrorKind::Forbidden,
            ClientError::NotFound(_) => ErrorKind::NotFound,
            ClientError::MethodNotAllowed(_) => ErrorKind::MethodNotAllowed,
            ClientError::Conflict(_) => ErrorKind::Conflict,
            ClientError::OverLimit(_) => ErrorKind::OverLimit,
            ClientError::ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
            ClientError::InternalError(_) => ErrorKind::InternalError,
            ClientError::GatewayTimeout(_) => ErrorKind::GatewayTimeout,
            ClientError::SslFailure(_) => ErrorKind::SslFailure,
            ClientError::Timeout(_) => ErrorKind::Timeout,
            ClientError::TooManyRedirects(_) => ErrorKind::TooManyRedirects,
            ClientError::ConnectionError(_) => ErrorKind::ConnectionError,
            ClientError::SshException(_) => ErrorKind::SshException,
            ClientError::SshInjection(_) => ErrorKind::SshInjection,
            ClientError::ProcessExecution(_) => ErrorKind::ProcessExecution,
            ClientError::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
        }
    }

    /// Whether the retry loop may re-attempt the request
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ServiceUnavailable | ErrorKind::ConnectionError
        )
    }

    /// Whether the one-shot re-authentication applies.
    ///
    /// Covers both expired sessions and the array answering 403 to a stale
    /// key, which the source treated the same way.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.kind(), ErrorKind::Unauthorized | ErrorKind::Forbidden)
    }
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        ClientError::SshException(format!("failed to parse CLI output: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status_map() {
        let cases = [
            (400, ErrorKind::BadRequest),
            (401, ErrorKind::Unauthorized),
            (403, ErrorKind::Forbidden),
            (404, ErrorKind::NotFound),
            (405, ErrorKind::MethodNotAllowed),
            (409, ErrorKind::Conflict),
            (413, ErrorKind::OverLimit),
            (500, ErrorKind::InternalError),
            (503, ErrorKind::ServiceUnavailable),
            (504, ErrorKind::GatewayTimeout),
            (418, ErrorKind::InternalError),
        ];
        for (status, kind) in cases {
            assert_eq!(ClientError::from_http(status, "").kind(), kind);
        }
    }

    #[test]
    fn test_from_http_structured_body() {
        let body = r#"{"code": 23, "desc": "volume does not exist", "ref": "VV-1"}"#;
        let err = ClientError::from_http(404, body);
        let ClientError::NotFound(details) = err else {
            panic!("expected NotFound");
        };
        assert_eq!(details.code, Some(23));
        assert_eq!(details.description.as_deref(), Some("volume does not exist"));
        assert_eq!(details.reference.as_deref(), Some("VV-1"));
        assert!(details.body.is_none());
    }

    #[test]
    fn test_from_http_plain_body_kept() {
        let err = ClientError::from_http(500, "<html>oops</html>");
        let ClientError::InternalError(details) = err else {
            panic!("expected InternalError");
        };
        assert_eq!(details.body.as_deref(), Some("<html>oops</html>"));
        assert_eq!(details.status, 500);
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ClientError::from_http(503, "").is_retryable());
        assert!(ClientError::ConnectionError("refused".to_string()).is_retryable());
        assert!(!ClientError::from_http(400, "").is_retryable());
        assert!(!ClientError::Timeout("30s".to_string()).is_retryable());
    }

    #[test]
    fn test_auth_failure_kinds() {
        assert!(ClientError::from_http(401, "").is_auth_failure());
        assert!(ClientError::from_http(403, "").is_auth_failure());
        assert!(!ClientError::from_http(404, "").is_auth_failure());
    }

    #[test]
    fn test_kind_display_is_kebab() {
        assert_eq!(ErrorKind::ServiceUnavailable.to_string(), "service-unavailable");
        assert_eq!(ErrorKind::SshInjection.to_string(), "ssh-injection");
        assert_eq!(ErrorKind::UnsupportedVersion.to_string(), "unsupported-version");
    }
}
