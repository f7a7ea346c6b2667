//! Remote-copy group management
//!
//! Group lifecycle runs over REST; role reversal after a disaster is only
//! exposed through the CLI, so those actions go over SSH. On the surviving
//! array the mirrored group carries the local group name suffixed with the
//! originating system id, which is recomputed here so callers can keep using
//! the name they created the group with.

use serde_json::{json, Value};

use coral_core::ClientError;

use super::merge_optional;
use crate::client::CoralClient;
use crate::ssh::OptValue;

/// Role-reversal action for a remote-copy group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Take over the secondary side after losing the primary
    Failover,
    /// Resynchronize after the failed side returns
    Recover,
    /// Restore the original role assignment
    Restore,
}

impl RecoveryAction {
    /// CLI token for the action
    pub fn token(self) -> &'static str {
        match self {
            RecoveryAction::Failover => "failover",
            RecoveryAction::Recover => "recover",
            RecoveryAction::Restore => "restore",
        }
    }
}

impl CoralClient {
    /// Remote-copy capability and link information
    pub async fn get_remote_copy_info(&self) -> Result<Value, ClientError> {
        let (_, body) = self.rest_get("/remotecopy").await?;
        Ok(body)
    }

    /// List all remote-copy groups
    pub async fn get_remote_copy_groups(&self) -> Result<Value, ClientError> {
        let (_, body) = self.rest_get("/remotecopygroups").await?;
        Ok(body)
    }

    /// Fetch one remote-copy group
    pub async fn get_remote_copy_group(&self, name: &str) -> Result<Value, ClientError> {
        let (_, body) = self.rest_get(&format!("/remotecopygroups/{name}")).await?;
        Ok(body)
    }

    /// Create a remote-copy group against one or more targets
    pub async fn create_remote_copy_group(
        &self,
        name: &str,
        targets: &Value,
        optional: Option<&Value>,
    ) -> Result<(), ClientError> {
        let mut body = json!({ "name": name, "targets": targets });
        merge_optional(&mut body, optional);
        self.rest_post("/remotecopygroups", &body).await?;
        Ok(())
    }

    /// Delete a remote-copy group
    pub async fn delete_remote_copy_group(&self, name: &str) -> Result<(), ClientError> {
        self.rest_delete(&format!("/remotecopygroups/{name}")).await?;
        Ok(())
    }

    /// Add a volume to a remote-copy group
    pub async fn add_volume_to_remote_copy_group(
        &self,
        name: &str,
        volume: &str,
        targets: &Value,
        optional: Option<&Value>,
    ) -> Result<(), ClientError> {
        let mut body = json!({ "volumeName": volume, "targets": targets });
        merge_optional(&mut body, optional);
        self.rest_post(&format!("/remotecopygroups/{name}/volumes"), &body)
            .await?;
        Ok(())
    }

    /// Start replication for a group
    pub async fn start_remote_copy_group(&self, name: &str) -> Result<(), ClientError> {
        let body = json!({ "action": 3 });
        self.rest_put(&format!("/remotecopygroups/{name}"), &body)
            .await?;
        Ok(())
    }

    /// Stop replication for a group
    pub async fn stop_remote_copy_group(&self, name: &str) -> Result<(), ClientError> {
        let body = json!({ "action": 4 });
        self.rest_put(&format!("/remotecopygroups/{name}"), &body)
            .await?;
        Ok(())
    }

    /// Reverse the roles of a remote-copy group (SSH).
    ///
    /// When the given name is the one the group was created with, the
    /// remote-side name `{name}.r{system_id}` is derived automatically;
    /// names already carrying a remote suffix are used as-is.
    pub async fn recover_remote_copy_group(
        &self,
        name: &str,
        action: RecoveryAction,
    ) -> Result<Vec<String>, ClientError> {
        let target_group = if name.contains(".r") {
            name.to_string()
        } else {
            let system_id = self.system_id().await?;
            format!("{name}.r{system_id}")
        };

        self.ssh_build_and_run(
            "setrcopygroup",
            &[action.token(), target_group.as_str()],
            &[("f", OptValue::Flag(true))],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_tokens() {
        assert_eq!(RecoveryAction::Failover.token(), "failover");
        assert_eq!(RecoveryAction::Recover.token(), "recover");
        assert_eq!(RecoveryAction::Restore.token(), "restore");
    }
}
