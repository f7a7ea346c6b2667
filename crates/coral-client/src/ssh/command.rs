//! CLI command construction
//!
//! A small closed set of per-command behaviors (non-interactive force flag,
//! details flag, protocol-first argument order) is kept in a registry seeded
//! from a static table; resource wrappers may extend it at init time through
//! the idempotent registration hooks.

use dashmap::DashMap;

/// Per-command construction behavior
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandPolicy {
    /// Append the non-interactive `-f` flag, overriding the caller
    pub force: bool,
    /// Append the `-d` details flag, overriding the caller
    pub details: bool,
    /// First positional argument is a protocol subcommand emitted right
    /// after the command name
    pub protocol_first: bool,
}

/// Commands that must never prompt interactively
const FORCE_COMMANDS: [&str; 6] = [
    "removevv",
    "removevfs",
    "removefstore",
    "removefshare",
    "removefsnap",
    "removefpg",
];

/// Commands that always report full details
const DETAILS_COMMANDS: [&str; 7] = [
    "getfs",
    "getvfs",
    "getfpg",
    "getfstore",
    "getfshare",
    "getfsnap",
    "getfsquota",
];

/// Commands whose first argument is the share protocol (`nfs`, `smb`, `obj`)
const PROTOCOL_FIRST_COMMANDS: [&str; 4] = [
    "createfshare",
    "setfshare",
    "getfshare",
    "removefshare",
];

/// Option value for [`build_command`]
#[derive(Debug, Clone)]
pub enum OptValue {
    /// Skipped entirely
    None,
    /// `true` emits a bare `-key` flag; `false` is skipped
    Flag(bool),
    /// Emits `-key value`
    Text(String),
}

impl From<&str> for OptValue {
    fn from(value: &str) -> Self {
        OptValue::Text(value.to_string())
    }
}

impl From<String> for OptValue {
    fn from(value: String) -> Self {
        OptValue::Text(value)
    }
}

impl From<bool> for OptValue {
    fn from(value: bool) -> Self {
        OptValue::Flag(value)
    }
}

impl<T: Into<OptValue>> From<Option<T>> for OptValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => OptValue::None,
        }
    }
}

/// Registry of per-command construction policies
pub struct PolicyRegistry {
    policies: DashMap<String, CommandPolicy>,
}

impl PolicyRegistry {
    /// Registry seeded with the built-in command table
    pub fn with_defaults() -> Self {
        let registry = Self {
            policies: DashMap::new(),
        };
        for name in FORCE_COMMANDS {
            registry.register_force(name);
        }
        for name in DETAILS_COMMANDS {
            registry.register_details(name);
        }
        for name in PROTOCOL_FIRST_COMMANDS {
            registry.register_protocol_first(name);
        }
        registry
    }

    /// Mark a command as requiring the non-interactive flag. Idempotent.
    pub fn register_force(&self, name: &str) {
        self.policies.entry(name.to_string()).or_default().force = true;
    }

    /// Mark a command as requiring the details flag. Idempotent.
    pub fn register_details(&self, name: &str) {
        self.policies.entry(name.to_string()).or_default().details = true;
    }

    /// Mark a command as protocol-first. Idempotent.
    pub fn register_protocol_first(&self, name: &str) {
        self.policies
            .entry(name.to_string())
            .or_default()
            .protocol_first = true;
    }

    /// Policy for a command; unregistered commands get the default
    pub fn policy(&self, name: &str) -> CommandPolicy {
        self.policies
            .get(name)
            .map(|entry| *entry.value())
            .unwrap_or_default()
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Build the token list for a CLI command.
///
/// Layout: name, protocol subcommand (when the policy says so), options,
/// policy-forced flags, then the remaining positional specifiers. Options
/// valued [`OptValue::None`] or `Flag(false)` are skipped; caller-supplied
/// `f`/`d` options are silently dropped when the policy forces them; values
/// keyed `comment` are quoted.
pub fn build_command(
    policy: CommandPolicy,
    name: &str,
    args: &[&str],
    opts: &[(&str, OptValue)],
) -> Vec<String> {
    let mut tokens = vec![name.to_string()];

    let specifiers = if policy.protocol_first && !args.is_empty() {
        tokens.push(args[0].to_string());
        &args[1..]
    } else {
        args
    };

    for (key, value) in opts {
        if (policy.force && *key == "f") || (policy.details && *key == "d") {
            continue;
        }
        match value {
            OptValue::None | OptValue::Flag(false) => {}
            OptValue::Flag(true) => tokens.push(format!("-{key}")),
            OptValue::Text(text) => {
                tokens.push(format!("-{key}"));
                if *key == "comment" {
                    tokens.push(format!("\"{}\"", text.replace('"', "\\\"")));
                } else {
                    tokens.push(text.clone());
                }
            }
        }
    }

    if policy.force {
        tokens.push("-f".to_string());
    }
    if policy.details {
        tokens.push("-d".to_string());
    }

    tokens.extend(specifiers.iter().map(|s| s.to_string()));
    tokens
}
