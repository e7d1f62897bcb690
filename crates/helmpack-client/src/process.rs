//! External command execution

use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::{ClientError, Result};

/// Run a command to completion and return its stdout
pub(crate) fn run(binary: &str, args: &[String]) -> Result<String> {
    run_with_stdin(binary, args, None)
}

/// Run a command, optionally feeding `input` on stdin
pub(crate) fn run_with_stdin(binary: &str, args: &[String], input: Option<&str>) -> Result<String> {
    let command_line = display_command(binary, args);
    tracing::debug!(command = %command_line, "running");

    let mut cmd = Command::new(binary);
    cmd.args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ClientError::ToolNotFound {
            binary: binary.to_string(),
        },
        _ => ClientError::Io(e),
    })?;

    if let Some(input) = input {
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.as_bytes())?;
        }
    }

    let output = child.wait_with_output()?;

    if !output.status.success() {
        let status = output
            .status
            .code()
            .map(|c| format!("exit code {}", c))
            .unwrap_or_else(|| "terminated by signal".to_string());
        return Err(ClientError::CommandFailed {
            command: command_line,
            status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Check whether a binary can be executed
pub fn check_available(binary: &str) -> bool {
    Command::new(binary)
        .arg("version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn display_command(binary: &str, args: &[String]) -> String {
    let mut parts = vec![binary.to_string()];
    parts.extend(args.iter().cloned());
    parts.join(" ")
}
