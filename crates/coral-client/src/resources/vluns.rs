//! VLUN management (pure REST)

use reqwest::header::LOCATION;
use serde_json::{json, Value};

use coral_core::ClientError;

use crate::client::CoralClient;

impl CoralClient {
    /// List all VLUNs
    pub async fn get_vluns(&self) -> Result<Value, ClientError> {
        let (_, body) = self.rest_get("/vluns").await?;
        Ok(body)
    }

    /// VLUNs exporting one volume.
    ///
    /// With filtered-query support this is answered server-side; otherwise
    /// the full listing is filtered here.
    pub async fn get_host_vluns(&self, volume: &str) -> Result<Value, ClientError> {
        if self.filtered_query_supported() {
            let path = format!("/vluns?query=\"volumeName EQ {volume}\"");
            let (_, body) = self.rest_get(&path).await?;
            return Ok(body);
        }

        let (_, body) = self.rest_get("/vluns").await?;
        let members: Vec<Value> = body
            .get("members")
            .and_then(Value::as_array)
            .map(|all| {
                all.iter()
                    .filter(|m| m.get("volumeName").and_then(Value::as_str) == Some(volume))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(json!({ "total": members.len(), "members": members }))
    }

    /// Export a volume to a host.
    ///
    /// Returns the location of the created export, which carries the
    /// assigned LUN when `auto` is set.
    pub async fn create_vlun(
        &self,
        volume: &str,
        lun: u32,
        host: &str,
        auto: bool,
    ) -> Result<Option<String>, ClientError> {
        let body = json!({
            "volumeName": volume,
            "lun": lun,
            "hostname": host,
            "autoLun": auto,
            "maxAutoLun": 0,
        });
        let (headers, _) = self.rest_post("/vluns", &body).await?;
        Ok(headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string))
    }

    /// Remove an export
    pub async fn delete_vlun(&self, volume: &str, lun: u32, host: &str) -> Result<(), ClientError> {
        self.rest_delete(&format!("/vluns/{volume},{lun},{host}"))
            .await?;
        Ok(())
    }
}
