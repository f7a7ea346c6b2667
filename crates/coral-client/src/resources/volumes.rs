//! Volume management (pure REST)

use serde_json::{json, Value};

use coral_core::ClientError;

use super::merge_optional;
use crate::client::CoralClient;

impl CoralClient {
    /// List all volumes
    pub async fn get_volumes(&self) -> Result<Value, ClientError> {
        let (_, body) = self.rest_get("/volumes").await?;
        Ok(body)
    }

    /// Fetch one volume.
    ///
    /// Uses a server-side filtered query when the array supports it, which
    /// avoids transferring the full volume listing.
    pub async fn get_volume(&self, name: &str) -> Result<Value, ClientError> {
        if self.filtered_query_supported() {
            let path = format!("/volumes?query=\"name EQ {name}\"");
            let (_, body) = self.rest_get(&path).await?;
            return Ok(body);
        }
        let (_, body) = self.rest_get(&format!("/volumes/{name}")).await?;
        Ok(body)
    }

    /// Create a volume on a CPG
    pub async fn create_volume(
        &self,
        name: &str,
        cpg: &str,
        size_mib: u64,
        optional: Option<&Value>,
    ) -> Result<(), ClientError> {
        let mut body = json!({ "name": name, "cpg": cpg, "sizeMiB": size_mib });
        merge_optional(&mut body, optional);
        self.rest_post("/volumes", &body).await?;
        Ok(())
    }

    /// Change volume attributes
    pub async fn modify_volume(&self, name: &str, params: &Value) -> Result<(), ClientError> {
        self.rest_put(&format!("/volumes/{name}"), params).await?;
        Ok(())
    }

    /// Grow a volume by `amount_mib`
    pub async fn grow_volume(&self, name: &str, amount_mib: u64) -> Result<(), ClientError> {
        let body = json!({ "action": "growVolume", "sizeMiB": amount_mib });
        self.rest_put(&format!("/volumes/{name}"), &body).await?;
        Ok(())
    }

    /// Delete a volume
    pub async fn delete_volume(&self, name: &str) -> Result<(), ClientError> {
        self.rest_delete(&format!("/volumes/{name}")).await?;
        Ok(())
    }

    /// Create a snapshot of a volume
    pub async fn create_snapshot(
        &self,
        name: &str,
        base_volume: &str,
        optional: Option<&Value>,
    ) -> Result<(), ClientError> {
        let mut parameters = json!({ "name": name });
        merge_optional(&mut parameters, optional);
        let body = json!({ "action": "createSnapshot", "parameters": parameters });
        self.rest_post(&format!("/volumes/{base_volume}"), &body)
            .await?;
        Ok(())
    }
}
