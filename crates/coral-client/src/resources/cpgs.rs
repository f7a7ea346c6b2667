//! CPG management (pure REST)

use serde_json::{json, Value};

use coral_core::ClientError;

use super::merge_optional;
use crate::client::CoralClient;

impl CoralClient {
    /// List all CPGs
    pub async fn get_cpgs(&self) -> Result<Value, ClientError> {
        let (_, body) = self.rest_get("/cpgs").await?;
        Ok(body)
    }

    /// Fetch one CPG
    pub async fn get_cpg(&self, name: &str) -> Result<Value, ClientError> {
        let (_, body) = self.rest_get(&format!("/cpgs/{name}")).await?;
        Ok(body)
    }

    /// Create a CPG
    pub async fn create_cpg(&self, name: &str, optional: Option<&Value>) -> Result<(), ClientError> {
        let mut body = json!({ "name": name });
        merge_optional(&mut body, optional);
        self.rest_post("/cpgs", &body).await?;
        Ok(())
    }

    /// Delete a CPG
    pub async fn delete_cpg(&self, name: &str) -> Result<(), ClientError> {
        self.rest_delete(&format!("/cpgs/{name}")).await?;
        Ok(())
    }

    /// Space available for new volumes on a CPG
    pub async fn get_cpg_available_space(&self, name: &str) -> Result<Value, ClientError> {
        let body = json!({ "cpg": name });
        let (_, response) = self.rest_post("/spacereporter", &body).await?;
        Ok(response)
    }
}
