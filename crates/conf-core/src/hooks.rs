//! Post-sync commands
//!
//! Entries may declare shell commands to run after a successful pull or
//! init (and after init's seeding push). Commands run in order through the
//! shell with inherited stdio; the first failure aborts the sequence.

use std::process::Command;

use crate::{Error, Result};

/// Run the configured post-sync commands, fail-fast.
///
/// Blank entries are skipped.
///
/// # Errors
///
/// Returns an error naming the index and command of the first failure.
pub fn run_post_sync(commands: &[String]) -> Result<()> {
    for (index, command) in commands.iter().enumerate() {
        if command.trim().is_empty() {
            continue;
        }
        tracing::debug!(index, command, "running post-sync command");
        let status = shell(command).status().map_err(|e| Error::HookFailed {
            index,
            command: command.clone(),
            message: e.to_string(),
        })?;
        if !status.success() {
            return Err(Error::HookFailed {
                index,
                command: command.clone(),
                message: format!("exited with {status}"),
            });
        }
    }
    Ok(())
}

#[cfg(unix)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}
