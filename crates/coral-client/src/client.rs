//! Unified dispatcher over the REST and SSH transports
//!
//! [`CoralClient`] is the entry point applications use. Each operation names
//! its realization: pure REST (JSON straight from the WSAPI), pure SSH (raw
//! CLI lines), or SSH with projection (CLI output parsed and projected into
//! the same JSON shape the WSAPI returns).

use dashmap::DashMap;
use reqwest::header::HeaderMap;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use coral_core::config::ClientConfig;
use coral_core::{ClientError, ErrorDetails, WsApiVersion};
use coral_protocol::{parse, parse_interfaces, CommandResult, Descriptor, TclNode};

use crate::rest::RestSession;
use crate::ssh::{OptValue, SshExecutor};

/// Oldest array build the client can talk to
pub const WSAPI_MIN_BUILD: u32 = 30102422;

/// Build at which server-side filtered queries became available
pub const WSAPI_MIN_BUILD_FILTERED_QUERY: u32 = 30201292;

/// CLI command describing the field layout of structured commands
const INTERFACE_COMMAND: &str = "gettpdinterface";

/// Commands whose descriptors are retained from the interface report.
///
/// Only these are kept so the cache stays bounded no matter what the array
/// reports.
const INTERFACE_COMMANDS: [&str; 9] = [
    "getfs",
    "getvfs",
    "getfpg",
    "getfstore",
    "getfshare",
    "getfsnap",
    "getfsquota",
    "gettask",
    "getfsip",
];

/// Line the task query emits when nothing is running; dropped before parsing
const TASK_IDLE_SENTINEL: &str = "No task active";

/// Unified client for one CoralStor array
#[derive(Debug)]
pub struct CoralClient {
    rest: RestSession,
    ssh: Option<SshExecutor>,
    descriptors: DashMap<String, Descriptor>,
    descriptors_loaded: Mutex<bool>,
    api_version: WsApiVersion,
    filtered_query_supported: bool,
    system_id: RwLock<Option<String>>,
}

impl CoralClient {
    /// Probe the array and construct a client.
    ///
    /// Fails with `unsupported-version` when the array build is older than
    /// [`WSAPI_MIN_BUILD`]. No authentication happens here; call
    /// [`CoralClient::login`] next.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let rest = RestSession::new(config.rest)?;

        let api_version = rest.ws_api_version().await?;
        if api_version.build < WSAPI_MIN_BUILD {
            return Err(ClientError::UnsupportedVersion {
                build: api_version.build,
                minimum: WSAPI_MIN_BUILD,
            });
        }
        let filtered_query_supported = api_version.build >= WSAPI_MIN_BUILD_FILTERED_QUERY;
        tracing::debug!(
            version = %api_version,
            filtered_query_supported,
            "connected to WSAPI"
        );

        let ssh = config.ssh.map(SshExecutor::new);

        Ok(Self {
            rest,
            ssh,
            descriptors: DashMap::new(),
            descriptors_loaded: Mutex::new(false),
            api_version,
            filtered_query_supported,
            system_id: RwLock::new(None),
        })
    }

    /// WSAPI version reported by the array at construction
    pub fn api_version(&self) -> WsApiVersion {
        self.api_version
    }

    /// Whether the array supports server-side filtered queries
    pub fn filtered_query_supported(&self) -> bool {
        self.filtered_query_supported
    }

    /// Authenticate against the WSAPI
    pub async fn login(
        &self,
        user: &str,
        password: &str,
        options: Option<Value>,
    ) -> Result<(), ClientError> {
        self.rest.login(user, password, options).await
    }

    /// Close the WSAPI session
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.rest.logout().await
    }

    /// The underlying REST session, for timing control and direct access
    pub fn rest(&self) -> &RestSession {
        &self.rest
    }

    // ---- collaborator surface for resource wrappers ----

    /// GET a WSAPI resource
    pub async fn rest_get(&self, path: &str) -> Result<(HeaderMap, Value), ClientError> {
        self.rest.get(path).await
    }

    /// POST to a WSAPI resource
    pub async fn rest_post(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<(HeaderMap, Value), ClientError> {
        self.rest.post(path, body).await
    }

    /// PUT to a WSAPI resource
    pub async fn rest_put(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<(HeaderMap, Value), ClientError> {
        self.rest.put(path, body).await
    }

    /// DELETE a WSAPI resource
    pub async fn rest_delete(&self, path: &str) -> Result<(HeaderMap, Value), ClientError> {
        self.rest.delete(path).await
    }

    /// Build and run a CLI command, returning its raw output lines
    pub async fn ssh_build_and_run(
        &self,
        name: &str,
        args: &[&str],
        opts: &[(&str, OptValue)],
    ) -> Result<Vec<String>, ClientError> {
        self.ssh()?.build_and_run(name, args, opts).await
    }

    /// Build and run a CLI command, projecting its output into the unified
    /// result shape
    pub async fn ssh_run_and_project(
        &self,
        name: &str,
        args: &[&str],
        opts: &[(&str, OptValue)],
    ) -> Result<CommandResult, ClientError> {
        let lines = self.ssh()?.build_and_run(name, args, opts).await?;
        self.project_output(name, lines).await
    }

    /// Mark a CLI command as requiring the non-interactive flag. Idempotent.
    pub fn register_force(&self, name: &str) -> Result<(), ClientError> {
        self.ssh()?.policies().register_force(name);
        Ok(())
    }

    /// Mark a CLI command as requiring the details flag. Idempotent.
    pub fn register_details(&self, name: &str) -> Result<(), ClientError> {
        self.ssh()?.policies().register_details(name);
        Ok(())
    }

    /// Mark a CLI command as protocol-first. Idempotent.
    pub fn register_protocol_first(&self, name: &str) -> Result<(), ClientError> {
        self.ssh()?.policies().register_protocol_first(name);
        Ok(())
    }

    // ---- internals ----

    fn ssh(&self) -> Result<&SshExecutor, ClientError> {
        self.ssh.as_ref().ok_or_else(|| {
            ClientError::SshException("CLI-over-SSH transport is not configured".to_string())
        })
    }

    /// Fetch and cache the interface descriptors, once per client.
    ///
    /// The cache is written exactly once; later callers only read it.
    async fn ensure_descriptors(&self) -> Result<(), ClientError> {
        let mut loaded = self.descriptors_loaded.lock().await;
        if *loaded {
            return Ok(());
        }

        let lines = self.ssh()?.build_and_run(INTERFACE_COMMAND, &[], &[]).await?;
        let items = parse(&lines.join("\n"))?;
        let interfaces = parse_interfaces(&items)?;

        let mut kept = 0;
        for (name, descriptor) in interfaces {
            if INTERFACE_COMMANDS.contains(&name.as_str()) {
                self.descriptors.insert(name, descriptor);
                kept += 1;
            }
        }
        tracing::debug!(kept, "interface descriptors cached");

        *loaded = true;
        Ok(())
    }

    /// Turn raw CLI lines into the unified result shape.
    ///
    /// Output that does not start with a brace is surfaced as a message;
    /// otherwise each parsed top item is projected with the command's cached
    /// descriptor.
    async fn project_output(
        &self,
        name: &str,
        mut lines: Vec<String>,
    ) -> Result<CommandResult, ClientError> {
        if name == "gettask" {
            lines.retain(|line| line.trim() != TASK_IDLE_SENTINEL);
        }

        let joined = lines.join("\n");
        if !joined.trim_start().starts_with('{') {
            return Ok(CommandResult::from_message(joined.trim().to_string()));
        }

        self.ensure_descriptors().await?;
        let Some(descriptor) = self.descriptors.get(name).map(|d| d.value().clone()) else {
            return Ok(CommandResult::from_message(joined.trim().to_string()));
        };

        let mut items = parse(&joined)?;
        if name == "getfsquota" {
            items = unwrap_extra_level(items);
        }

        let members: Vec<Value> = items
            .iter()
            .filter_map(TclNode::as_list)
            .map(|fields| {
                coral_protocol::project(&descriptor, fields, |inner| {
                    self.descriptors.get(inner).map(|d| d.value().clone())
                })
            })
            .collect();

        Ok(CommandResult::from_members(members))
    }

    /// Array system id, fetched once and cached; used to derive remote-side
    /// replication group names.
    pub(crate) async fn system_id(&self) -> Result<String, ClientError> {
        if let Some(id) = self.system_id.read().await.clone() {
            return Ok(id);
        }

        let (_, body) = self.rest.get("/system").await?;
        let id = body
            .get("id")
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .ok_or_else(|| {
                ClientError::InternalError(ErrorDetails {
                    status: 200,
                    body: Some("system info did not include an id".to_string()),
                    ..ErrorDetails::default()
                })
            })?;

        *self.system_id.write().await = Some(id.clone());
        Ok(id)
    }
}

/// Drop the extra nesting level some commands wrap their rows in
fn unwrap_extra_level(items: Vec<TclNode>) -> Vec<TclNode> {
    if items.len() == 1 {
        if let TclNode::List(inner) = &items[0] {
            if inner.iter().all(|node| matches!(node, TclNode::List(_))) {
                return inner.clone();
            }
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use coral_core::config::RestConfig;
    use coral_protocol::FieldKey;
    use serde_json::json;

    #[test]
    fn test_unwrap_extra_level() {
        let items = parse("{{{a 1} {b 2}}}").unwrap();
        let unwrapped = unwrap_extra_level(items);
        assert_eq!(unwrapped, parse("{{a 1} {b 2}}").unwrap());
    }

    #[test]
    fn test_unwrap_leaves_flat_rows_alone() {
        let items = parse("{{a 1} {b 2}}").unwrap();
        let unwrapped = unwrap_extra_level(items.clone());
        assert_eq!(unwrapped, items);
    }

    /// Client with no transports attached, for exercising the projection
    /// path in isolation
    fn offline_client() -> CoralClient {
        CoralClient {
            rest: RestSession::new(RestConfig::default()).unwrap(),
            ssh: None,
            descriptors: DashMap::new(),
            descriptors_loaded: Mutex::new(false),
            api_version: WsApiVersion {
                major: 1,
                minor: 6,
                revision: 0,
                build: WSAPI_MIN_BUILD,
            },
            filtered_query_supported: true,
            system_id: RwLock::new(None),
        }
    }

    async fn seed_descriptor(client: &CoralClient, name: &str, keys: Vec<FieldKey>) {
        client
            .descriptors
            .insert(name.to_string(), Descriptor { keys });
        *client.descriptors_loaded.lock().await = true;
    }

    #[tokio::test]
    async fn test_project_output_message_path() {
        let client = offline_client();
        let result = client
            .project_output("getfs", vec!["Error: foo not found".to_string()])
            .await
            .unwrap();
        assert_eq!(result.message.as_deref(), Some("Error: foo not found"));
        assert_eq!(result.total, 0);
        assert!(result.members.is_empty());
    }

    #[tokio::test]
    async fn test_project_output_structured() {
        let client = offline_client();
        seed_descriptor(
            &client,
            "getfs",
            vec![
                FieldKey::Scalar("name".to_string()),
                FieldKey::Nested {
                    header: "pair".to_string(),
                    sub_keys: vec!["k".to_string(), "v".to_string()],
                },
            ],
        )
        .await;

        let result = client
            .project_output("getfs", vec!["{{a 1} {b {x y}}}".to_string()])
            .await
            .unwrap();

        assert!(result.message.is_none());
        assert_eq!(result.total, 2);
        assert_eq!(result.members.len(), result.total);
        assert_eq!(result.members[0], json!({"name": "a", "pair": [{"k": "1"}]}));
        assert_eq!(
            result.members[1],
            json!({"name": "b", "pair": [{"k": "x", "v": "y"}]})
        );
    }

    #[tokio::test]
    async fn test_project_output_unknown_command_is_message() {
        let client = offline_client();
        // Cache loaded but holds no descriptor for this command.
        *client.descriptors_loaded.lock().await = true;

        let result = client
            .project_output("getfoo", vec!["{{a 1}}".to_string()])
            .await
            .unwrap();
        assert_eq!(result.message.as_deref(), Some("{{a 1}}"));
        assert_eq!(result.total, 0);
        assert!(result.members.is_empty());
    }

    #[tokio::test]
    async fn test_project_output_task_sentinel_dropped() {
        let client = offline_client();
        seed_descriptor(
            &client,
            "gettask",
            vec![
                FieldKey::Scalar("id".to_string()),
                FieldKey::Scalar("status".to_string()),
            ],
        )
        .await;

        // Idle array: only the sentinel line, no structured output.
        let result = client
            .project_output("gettask", vec!["No task active".to_string()])
            .await
            .unwrap();
        assert_eq!(result.total, 0);
        assert!(result.members.is_empty());

        // Sentinel mixed with real rows is dropped before parsing.
        let result = client
            .project_output(
                "gettask",
                vec!["No task active".to_string(), "{{17 done}}".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.members[0], json!({"id": "17", "status": "done"}));
    }

    #[tokio::test]
    async fn test_project_output_quota_unwrap() {
        let client = offline_client();
        seed_descriptor(
            &client,
            "getfsquota",
            vec![
                FieldKey::Scalar("id".to_string()),
                FieldKey::Scalar("limit".to_string()),
            ],
        )
        .await;

        let result = client
            .project_output("getfsquota", vec!["{{{q1 10} {q2 20}}}".to_string()])
            .await
            .unwrap();
        assert_eq!(result.total, 2);
        assert_eq!(result.members[0], json!({"id": "q1", "limit": "10"}));
        assert_eq!(result.members[1], json!({"id": "q2", "limit": "20"}));
    }

    #[tokio::test]
    async fn test_ssh_surface_requires_transport() {
        let client = offline_client();
        let err = client.ssh_build_and_run("showvv", &[], &[]).await.unwrap_err();
        assert!(matches!(err, ClientError::SshException(_)));
        assert!(client.register_force("removevv").is_err());
    }
}
