//! Shell-channel command execution
//!
//! Commands run in an interactive CLI shell: a fixed prologue switches the
//! session into structured CSV/TCL output, the command follows, and `exit`
//! closes the shell. The shell echoes the typed input and its prompt back
//! into the stream, so the stripper has to carve the real command output out
//! of that noise before anyone parses it.

use bytes::BytesMut;
use rand::Rng;
use russh::ChannelMsg;
use std::time::Duration;

use coral_core::config::SshConfig;
use coral_core::{sanitize_certificates, ClientError, ProcessError};

use super::command::{build_command, OptValue, PolicyRegistry};
use super::guard::check_command;
use super::pool::SshPool;

/// Prologue sent before every command to coerce structured output
pub const CSV_PROLOGUE: &str = "setclienv csvtable 1";

/// Raw capture of one command run
struct RawOutput {
    stdout: String,
    stderr: String,
    exit_code: Option<u32>,
}

/// Pooled CLI command executor for one array
pub struct SshExecutor {
    config: SshConfig,
    pool: SshPool,
    policies: PolicyRegistry,
}

impl std::fmt::Debug for SshExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshExecutor").finish_non_exhaustive()
    }
}

impl SshExecutor {
    /// Create an executor; connections are dialed lazily by the pool
    pub fn new(config: SshConfig) -> Self {
        let pool = SshPool::new(config.clone());
        Self {
            config,
            pool,
            policies: PolicyRegistry::with_defaults(),
        }
    }

    /// The per-command policy registry
    pub fn policies(&self) -> &PolicyRegistry {
        &self.policies
    }

    /// Build a command from its parts and run it
    pub async fn build_and_run(
        &self,
        name: &str,
        args: &[&str],
        opts: &[(&str, OptValue)],
    ) -> Result<Vec<String>, ClientError> {
        let tokens = build_command(self.policies.policy(name), name, args, opts);
        self.run(&tokens).await
    }

    /// Run a prepared token list and return the command's output lines.
    ///
    /// Every token passes the injection guard before any channel is opened.
    /// Transport failures are retried (fresh connection each time, small
    /// randomized sleep in between); a command that ran but exited non-zero
    /// is not retried.
    pub async fn run(&self, tokens: &[String]) -> Result<Vec<String>, ClientError> {
        check_command(tokens)?;
        let joined = tokens.join(" ");

        let attempts = self.config.run_attempts.max(1);
        let mut attempt = 0;
        let raw = loop {
            attempt += 1;
            match self.run_once(&joined).await {
                Ok(raw) => break raw,
                Err(err) if attempt < attempts => {
                    let pause = Duration::from_millis(rand::thread_rng().gen_range(200..=5000));
                    tracing::warn!(
                        command = %joined,
                        error = %err,
                        "CLI run failed, retrying in {:?}",
                        pause
                    );
                    tokio::time::sleep(pause).await;
                }
                Err(err) => return Err(err),
            }
        };

        tracing::debug!(
            command = %joined,
            output = %sanitize_certificates(&raw.stdout),
            "CLI command output"
        );

        if self.config.check_exit_code {
            if let Some(code) = raw.exit_code {
                if code != 0 {
                    return Err(ClientError::ProcessExecution(ProcessError {
                        command: tokens.to_vec(),
                        exit_code: Some(code),
                        stdout: raw.stdout,
                        stderr: raw.stderr,
                    }));
                }
            }
        }

        let lines: Vec<String> = raw.stdout.lines().map(str::to_string).collect();
        strip_output(&joined, &lines)
    }

    /// One full exchange: checkout, shell, write, drain, checkin
    async fn run_once(&self, joined: &str) -> Result<RawOutput, ClientError> {
        let pooled = self.pool.checkout().await?;

        let result = self.exchange(&pooled, joined).await;
        match result {
            Ok(raw) => {
                self.pool.checkin(pooled).await;
                Ok(raw)
            }
            // A failed exchange leaves the channel state unknown; drop the
            // connection rather than returning it.
            Err(err) => Err(err),
        }
    }

    async fn exchange(
        &self,
        pooled: &super::pool::PooledConnection,
        joined: &str,
    ) -> Result<RawOutput, ClientError> {
        let mut channel = pooled.conn.open_session().await?;

        channel
            .request_pty(false, "vt100", 250, 24, 0, 0, &[])
            .await
            .map_err(ssh_err("failed to request pty"))?;
        channel
            .request_shell(false)
            .await
            .map_err(ssh_err("failed to start shell"))?;

        let input = format!("{CSV_PROLOGUE}\n{joined}\nexit\n");
        channel
            .data(input.as_bytes())
            .await
            .map_err(ssh_err("failed to write command"))?;
        channel
            .eof()
            .await
            .map_err(ssh_err("failed to signal eof"))?;

        let mut stdout = BytesMut::with_capacity(8192);
        let mut stderr = BytesMut::new();
        let mut exit_code = None;

        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext: 1 } => stderr.extend_from_slice(data),
                ChannelMsg::ExitStatus { exit_status } => exit_code = Some(exit_status),
                ChannelMsg::Close => break,
                _ => {}
            }
        }

        Ok(RawOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_code,
        })
    }
}

fn ssh_err(context: &'static str) -> impl Fn(russh::Error) -> ClientError {
    move |e| ClientError::SshException(format!("{context}: {e}"))
}

/// Extract the command's own output from the echoed shell session.
///
/// The stream contains, in order: the echo of the typed input (prologue,
/// command, `exit`), the prompt re-displaying the prologue, the prompt
/// re-displaying the command (possibly wrapped across lines), the real
/// output, and finally the prompt with `exit` plus a trailing blank.
pub(crate) fn strip_output(joined_cmd: &str, lines: &[String]) -> Result<Vec<String>, ClientError> {
    // 1. Skip the echoed input block, which ends with the typed `exit`.
    let exit_index = lines
        .iter()
        .position(|line| line.trim_end_matches('\r').trim_end() == "exit")
        .ok_or_else(|| {
            ClientError::SshException("echoed 'exit' not found in CLI output".to_string())
        })?;

    // 2. The next line shows the prompt running the prologue; everything
    //    before the marker is the prompt.
    let marker_line = lines.get(exit_index + 1).ok_or_else(|| {
        ClientError::SshException("CLI output ended before the prologue echo".to_string())
    })?;
    let marker_pos = marker_line.find(CSV_PROLOGUE).ok_or_else(|| {
        ClientError::SshException(format!(
            "prologue echo not found after 'exit': {marker_line:?}"
        ))
    })?;
    let prompt = marker_line[..marker_pos].trim_end();

    // 3. Join echoed command lines until they reconstruct the prompt plus
    //    the command; the echo may wrap across several lines.
    let expected = format!("{prompt} {joined_cmd}");
    let mut echoed = String::new();
    let mut body_start = None;
    for (offset, line) in lines[exit_index + 2..].iter().enumerate() {
        echoed.push_str(line.trim_end_matches('\r'));
        if echoed == expected {
            body_start = Some(exit_index + 2 + offset + 1);
            break;
        }
        if echoed.len() > expected.len() {
            break;
        }
    }
    let body_start = body_start.ok_or_else(|| {
        ClientError::SshException("echoed command not found in CLI output".to_string())
    })?;

    // 4. Everything up to the closing prompt + exit and the trailing blank
    //    is the command's output.
    let body_end = lines.len().saturating_sub(2).max(body_start);
    Ok(lines[body_start..body_end].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_injection_rejected_before_any_connection() {
        // TEST-NET address: if the guard ever let this through, the test
        // would hang on the dial instead of failing fast.
        let executor = SshExecutor::new(SshConfig {
            ip: "192.0.2.1".to_string(),
            login: "cliadmin".to_string(),
            password: Some("secret".to_string()),
            ..SshConfig::default()
        });

        let err = executor
            .build_and_run("showvv", &["foo;rm -rf /"], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::SshInjection(_)));
        assert_eq!(executor.pool.idle_len().await, 0);
    }

    fn to_lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_strip_basic_session() {
        let lines = to_lines(&[
            "setclienv csvtable 1",
            "showvv -showcols name",
            "exit",
            "cs-array cli% setclienv csvtable 1",
            "cs-array cli% showvv -showcols name",
            "{{vol1} {vol2}}",
            "cs-array cli% exit",
            "",
        ]);
        let body = strip_output("showvv -showcols name", &lines).unwrap();
        assert_eq!(body, vec!["{{vol1} {vol2}}"]);
    }

    #[test]
    fn test_strip_wrapped_command_echo() {
        let lines = to_lines(&[
            "setclienv csvtable 1",
            "showvv -showcols name,state vol1",
            "exit",
            "cs-array cli% setclienv csvtable 1",
            "cs-array cli% showvv -showcols na",
            "me,state vol1",
            "line one",
            "line two",
            "cs-array cli% exit",
            "",
        ]);
        let body = strip_output("showvv -showcols name,state vol1", &lines).unwrap();
        assert_eq!(body, vec!["line one", "line two"]);
    }

    #[test]
    fn test_strip_empty_body() {
        let lines = to_lines(&[
            "setclienv csvtable 1",
            "setvv -comment x vol1",
            "exit",
            "cs-array cli% setclienv csvtable 1",
            "cs-array cli% setvv -comment x vol1",
            "cs-array cli% exit",
            "",
        ]);
        let body = strip_output("setvv -comment x vol1", &lines).unwrap();
        assert!(body.is_empty());
    }

    #[test]
    fn test_strip_missing_exit_echo() {
        let lines = to_lines(&["garbage", "more garbage"]);
        let err = strip_output("showvv", &lines).unwrap_err();
        assert!(matches!(err, ClientError::SshException(_)));
    }

    #[test]
    fn test_strip_missing_prologue_marker() {
        let lines = to_lines(&["exit", "no marker here", "x", ""]);
        let err = strip_output("showvv", &lines).unwrap_err();
        assert!(matches!(err, ClientError::SshException(_)));
    }

    #[test]
    fn test_strip_unmatched_command_echo() {
        let lines = to_lines(&[
            "exit",
            "cs-array cli% setclienv csvtable 1",
            "cs-array cli% somethingelse",
            "body",
            "cs-array cli% exit",
            "",
        ]);
        let err = strip_output("showvv", &lines).unwrap_err();
        assert!(matches!(err, ClientError::SshException(_)));
    }
}
