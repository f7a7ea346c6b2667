//! CLI-over-SSH transport configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Settings for the CLI-over-SSH control surface
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    /// Array management address
    pub ip: String,

    /// SSH port
    pub port: u16,

    /// CLI user name
    pub login: String,

    /// Password authentication; ignored when a private key is configured
    pub password: Option<String>,

    /// Private-key authentication
    pub private_key_path: Option<PathBuf>,

    /// Connection establishment timeout
    #[serde(with = "super::secs")]
    pub conn_timeout: Duration,

    /// Known-hosts file consulted by the `reject` policy
    pub known_hosts_file: Option<PathBuf>,

    /// What to do with a host key that is not already known
    pub missing_key_policy: MissingKeyPolicy,

    /// Transport keep-alive interval, so idle pooled connections stay valid
    #[serde(with = "super::secs")]
    pub keepalive_interval: Duration,

    /// Number of pooled connections retained when idle
    pub pool_min_size: usize,

    /// Upper bound on concurrently open connections
    pub pool_max_size: usize,

    /// Attempts per command run; transport failures trigger the retry
    pub run_attempts: u32,

    /// Raise on non-zero exit status
    pub check_exit_code: bool,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            ip: String::new(),
            port: 22,
            login: String::new(),
            password: None,
            private_key_path: None,
            conn_timeout: Duration::from_secs(30),
            known_hosts_file: None,
            missing_key_policy: MissingKeyPolicy::AutoAdd,
            keepalive_interval: Duration::from_secs(30),
            pool_min_size: 1,
            pool_max_size: 4,
            run_attempts: 2,
            check_exit_code: true,
        }
    }
}

impl SshConfig {
    /// The `host:port` address to dial
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

/// Host-key policy for servers not present in the known-hosts file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingKeyPolicy {
    /// Accept and continue
    AutoAdd,
    /// Accept but log a warning
    Warn,
    /// Refuse unless the key is present in the known-hosts file
    Reject,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SshConfig::default();
        assert_eq!(config.port, 22);
        assert_eq!(config.conn_timeout, Duration::from_secs(30));
        assert_eq!(config.missing_key_policy, MissingKeyPolicy::AutoAdd);
        assert_eq!(config.pool_max_size, 4);
        assert_eq!(config.run_attempts, 2);
        assert!(config.check_exit_code);
    }

    #[test]
    fn test_address() {
        let config = SshConfig {
            ip: "10.0.1.20".to_string(),
            port: 2222,
            ..SshConfig::default()
        };
        assert_eq!(config.address(), "10.0.1.20:2222");
    }

    #[test]
    fn test_policy_kebab_serde() {
        #[derive(Serialize, Deserialize)]
        struct Wrap {
            policy: MissingKeyPolicy,
        }
        let wrap: Wrap = toml::from_str("policy = \"auto-add\"").unwrap();
        assert_eq!(wrap.policy, MissingKeyPolicy::AutoAdd);
        let text = toml::to_string(&Wrap {
            policy: MissingKeyPolicy::Reject,
        })
        .unwrap();
        assert!(text.contains("reject"));
    }
}
