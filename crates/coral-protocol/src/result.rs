//! Unified result shape shared by both transports

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of a command-style call, identical in structure to a WSAPI
/// collection response.
///
/// Invariants: `total == members.len()`, and `message` is set only when the
/// transport returned a human-readable line instead of structured data (in
/// which case `total` is 0 and `members` is empty).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    /// Human-readable output when the command produced no structured data
    pub message: Option<String>,
    /// Number of members
    pub total: usize,
    /// JSON-shaped records, one per parsed row
    pub members: Vec<Value>,
}

impl CommandResult {
    /// Build a result from projected members
    pub fn from_members(members: Vec<Value>) -> Self {
        Self {
            message: None,
            total: members.len(),
            members,
        }
    }

    /// Build a message-only result for non-structured output
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            total: 0,
            members: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_members_counts() {
        let result = CommandResult::from_members(vec![json!({"a": 1}), json!({"a": 2})]);
        assert_eq!(result.total, 2);
        assert_eq!(result.members.len(), result.total);
        assert!(result.message.is_none());
    }

    #[test]
    fn test_from_message_is_empty() {
        let result = CommandResult::from_message("Error: foo not found");
        assert_eq!(result.total, 0);
        assert!(result.members.is_empty());
        assert_eq!(result.message.as_deref(), Some("Error: foo not found"));
    }
}
