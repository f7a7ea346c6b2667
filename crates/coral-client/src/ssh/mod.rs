//! CLI-over-SSH transport: pooled shell-channel execution with injection
//! safety and deterministic output extraction

mod command;
mod connection;
mod guard;
mod pool;
mod shell;

pub use command::{build_command, CommandPolicy, OptValue, PolicyRegistry};
pub use connection::SshConnection;
pub use guard::check_command;
pub use pool::{PooledConnection, SshPool};
pub use shell::{SshExecutor, CSV_PROLOGUE};
