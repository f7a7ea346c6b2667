//! Shared domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque session token issued by the array on successful authentication
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionKey(pub String);

impl SessionKey {
    /// Wrap a raw key string
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the raw key for the session header
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// The key is a credential; keep it out of debug output.
impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionKey(…)")
    }
}

/// WSAPI version report from the unauthenticated version endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsApiVersion {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
    /// Revision
    #[serde(default)]
    pub revision: u32,
    /// Array build number, compared against the supported minimum
    pub build: u32,
}

impl fmt::Display for WsApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{} (build {})",
            self.major, self.minor, self.revision, self.build
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_debug_redacted() {
        let key = SessionKey::new("0-8c2df1fc9cd6c1af65b0c49f8f9a2e45-eca1cbe2");
        assert_eq!(format!("{:?}", key), "SessionKey(…)");
        assert_eq!(key.as_str(), "0-8c2df1fc9cd6c1af65b0c49f8f9a2e45-eca1cbe2");
    }

    #[test]
    fn test_version_deserialize() {
        let version: WsApiVersion =
            serde_json::from_str(r#"{"major":1,"minor":6,"revision":0,"build":30202390}"#).unwrap();
        assert_eq!(version.major, 1);
        assert_eq!(version.build, 30202390);
        assert_eq!(version.to_string(), "1.6.0 (build 30202390)");
    }
}
