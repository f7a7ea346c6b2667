//! Shell-injection guard
//!
//! Every token of a CLI command is checked before it is written to the shell
//! channel. A token may carry shell metacharacters only when it is fully
//! enclosed in matching quotes with interior quotes backslash-escaped;
//! anything else is rejected before a channel is ever opened.

use coral_core::ClientError;

/// Metacharacters that would let a token escape the command.
///
/// The multi-character forms `||`, `&&` and `>>` are covered by their
/// single-character members.
const METACHARACTERS: [char; 7] = ['`', '$', '|', ';', '&', '>', '<'];

/// Check every token of a command line
pub fn check_command(tokens: &[String]) -> Result<(), ClientError> {
    for token in tokens {
        check_token(token)?;
    }
    Ok(())
}

/// Check one token.
///
/// Tokens without metacharacters pass. Tokens with metacharacters must be
/// fully quoted: first and last character are the same quote, and every
/// interior quote of that kind is backslash-escaped.
fn check_token(token: &str) -> Result<(), ClientError> {
    if !token.contains(METACHARACTERS) {
        return Ok(());
    }

    let mut chars = token.chars();
    let quote = match chars.next() {
        Some(c @ ('"' | '\'')) => c,
        _ => return Err(ClientError::SshInjection(token.to_string())),
    };

    let interior: Vec<char> = chars.collect();
    let Some((&last, body)) = interior.split_last() else {
        return Err(ClientError::SshInjection(token.to_string()));
    };
    if last != quote {
        return Err(ClientError::SshInjection(token.to_string()));
    }

    let mut escaped = false;
    for &c in body {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            // Unescaped interior quote ends the quoted region early
            return Err(ClientError::SshInjection(token.to_string()));
        }
    }
    if escaped {
        // Trailing backslash escapes the closing quote
        return Err(ClientError::SshInjection(token.to_string()));
    }

    Ok(())
}
