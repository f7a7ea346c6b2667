//! System information and task queries

use serde_json::Value;

use coral_core::ClientError;
use coral_protocol::CommandResult;

use crate::client::CoralClient;

impl CoralClient {
    /// Array identity and configuration summary (pure REST)
    pub async fn get_storage_system_info(&self) -> Result<Value, ClientError> {
        let (_, body) = self.rest_get("/system").await?;
        Ok(body)
    }

    /// Overall capacity report (pure REST)
    pub async fn get_overall_system_capacity(&self) -> Result<Value, ClientError> {
        let (_, body) = self.rest_get("/capacity").await?;
        Ok(body)
    }

    /// All array tasks (SSH with projection).
    ///
    /// An idle array reports a plain sentinel line instead of structured
    /// output; the dispatcher drops it, so an empty task list comes back as
    /// zero members rather than a message.
    pub async fn get_tasks(&self) -> Result<CommandResult, ClientError> {
        self.ssh_run_and_project("gettask", &[], &[]).await
    }

    /// One task by id (SSH with projection)
    pub async fn get_task(&self, task_id: u32) -> Result<CommandResult, ClientError> {
        let id = task_id.to_string();
        self.ssh_run_and_project("gettask", &[id.as_str()], &[]).await
    }
}
