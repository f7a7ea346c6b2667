//! Host management (pure REST)

use serde_json::{json, Value};

use coral_core::ClientError;

use super::merge_optional;
use crate::client::CoralClient;

impl CoralClient {
    /// List all hosts
    pub async fn get_hosts(&self) -> Result<Value, ClientError> {
        let (_, body) = self.rest_get("/hosts").await?;
        Ok(body)
    }

    /// Fetch one host
    pub async fn get_host(&self, name: &str) -> Result<Value, ClientError> {
        let (_, body) = self.rest_get(&format!("/hosts/{name}")).await?;
        Ok(body)
    }

    /// Create a host with its initiator paths
    pub async fn create_host(
        &self,
        name: &str,
        iscsi_names: Option<&[&str]>,
        fc_wwns: Option<&[&str]>,
        optional: Option<&Value>,
    ) -> Result<(), ClientError> {
        let mut body = json!({ "name": name });
        if let Some(names) = iscsi_names {
            body["iSCSINames"] = json!(names);
        }
        if let Some(wwns) = fc_wwns {
            body["FCWWNs"] = json!(wwns);
        }
        merge_optional(&mut body, optional);
        self.rest_post("/hosts", &body).await?;
        Ok(())
    }

    /// Change host attributes or paths
    pub async fn modify_host(&self, name: &str, params: &Value) -> Result<(), ClientError> {
        self.rest_put(&format!("/hosts/{name}"), params).await?;
        Ok(())
    }

    /// Delete a host
    pub async fn delete_host(&self, name: &str) -> Result<(), ClientError> {
        self.rest_delete(&format!("/hosts/{name}")).await?;
        Ok(())
    }
}
