//! Volume-set and host-set management (pure REST)

use serde_json::{json, Value};

use coral_core::ClientError;

use super::merge_optional;
use crate::client::CoralClient;

/// Set-membership edit action codes understood by the WSAPI
const SET_MEM_ADD: u32 = 1;
const SET_MEM_REMOVE: u32 = 2;

impl CoralClient {
    /// List all volume sets
    pub async fn get_volume_sets(&self) -> Result<Value, ClientError> {
        let (_, body) = self.rest_get("/volumesets").await?;
        Ok(body)
    }

    /// Fetch one volume set
    pub async fn get_volume_set(&self, name: &str) -> Result<Value, ClientError> {
        let (_, body) = self.rest_get(&format!("/volumesets/{name}")).await?;
        Ok(body)
    }

    /// Create a volume set, optionally with initial members
    pub async fn create_volume_set(
        &self,
        name: &str,
        members: Option<&[&str]>,
        optional: Option<&Value>,
    ) -> Result<(), ClientError> {
        let mut body = json!({ "name": name });
        if let Some(members) = members {
            body["setmembers"] = json!(members);
        }
        merge_optional(&mut body, optional);
        self.rest_post("/volumesets", &body).await?;
        Ok(())
    }

    /// Add volumes to a volume set
    pub async fn add_volumes_to_volume_set(
        &self,
        name: &str,
        members: &[&str],
    ) -> Result<(), ClientError> {
        self.modify_set("/volumesets", name, SET_MEM_ADD, members)
            .await
    }

    /// Remove volumes from a volume set
    pub async fn remove_volumes_from_volume_set(
        &self,
        name: &str,
        members: &[&str],
    ) -> Result<(), ClientError> {
        self.modify_set("/volumesets", name, SET_MEM_REMOVE, members)
            .await
    }

    /// Delete a volume set
    pub async fn delete_volume_set(&self, name: &str) -> Result<(), ClientError> {
        self.rest_delete(&format!("/volumesets/{name}")).await?;
        Ok(())
    }

    /// List all host sets
    pub async fn get_host_sets(&self) -> Result<Value, ClientError> {
        let (_, body) = self.rest_get("/hostsets").await?;
        Ok(body)
    }

    /// Fetch one host set
    pub async fn get_host_set(&self, name: &str) -> Result<Value, ClientError> {
        let (_, body) = self.rest_get(&format!("/hostsets/{name}")).await?;
        Ok(body)
    }

    /// Create a host set, optionally with initial members
    pub async fn create_host_set(
        &self,
        name: &str,
        members: Option<&[&str]>,
        optional: Option<&Value>,
    ) -> Result<(), ClientError> {
        let mut body = json!({ "name": name });
        if let Some(members) = members {
            body["setmembers"] = json!(members);
        }
        merge_optional(&mut body, optional);
        self.rest_post("/hostsets", &body).await?;
        Ok(())
    }

    /// Add hosts to a host set
    pub async fn add_hosts_to_host_set(
        &self,
        name: &str,
        members: &[&str],
    ) -> Result<(), ClientError> {
        self.modify_set("/hostsets", name, SET_MEM_ADD, members).await
    }

    /// Remove hosts from a host set
    pub async fn remove_hosts_from_host_set(
        &self,
        name: &str,
        members: &[&str],
    ) -> Result<(), ClientError> {
        self.modify_set("/hostsets", name, SET_MEM_REMOVE, members)
            .await
    }

    /// Delete a host set
    pub async fn delete_host_set(&self, name: &str) -> Result<(), ClientError> {
        self.rest_delete(&format!("/hostsets/{name}")).await?;
        Ok(())
    }

    async fn modify_set(
        &self,
        base: &str,
        name: &str,
        action: u32,
        members: &[&str],
    ) -> Result<(), ClientError> {
        let body = json!({ "action": action, "setmembers": members });
        self.rest_put(&format!("{base}/{name}"), &body).await?;
        Ok(())
    }
}
