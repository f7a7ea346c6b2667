//! QoS rule management (pure REST)

use serde_json::{json, Value};

use coral_core::ClientError;

use super::merge_optional;
use crate::client::CoralClient;

impl CoralClient {
    /// List all QoS rules
    pub async fn query_qos_rules(&self) -> Result<Value, ClientError> {
        let (_, body) = self.rest_get("/qos").await?;
        Ok(body)
    }

    /// Fetch the QoS rule for one target
    pub async fn query_qos_rule(
        &self,
        target_type: &str,
        target_name: &str,
    ) -> Result<Value, ClientError> {
        let (_, body) = self
            .rest_get(&format!("/qos/{target_type}:{target_name}"))
            .await?;
        Ok(body)
    }

    /// Create a QoS rule on a target
    pub async fn create_qos_rules(
        &self,
        target_type: &str,
        target_name: &str,
        rules: &Value,
    ) -> Result<(), ClientError> {
        let mut body = json!({ "type": target_type, "name": target_name });
        merge_optional(&mut body, Some(rules));
        self.rest_post("/qos", &body).await?;
        Ok(())
    }

    /// Change an existing QoS rule
    pub async fn modify_qos_rules(
        &self,
        target_type: &str,
        target_name: &str,
        rules: &Value,
    ) -> Result<(), ClientError> {
        self.rest_put(&format!("/qos/{target_type}:{target_name}"), rules)
            .await?;
        Ok(())
    }

    /// Delete the QoS rule for one target
    pub async fn delete_qos_rules(
        &self,
        target_type: &str,
        target_name: &str,
    ) -> Result<(), ClientError> {
        self.rest_delete(&format!("/qos/{target_type}:{target_name}"))
            .await?;
        Ok(())
    }
}
