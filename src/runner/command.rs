//! Command execution
//!
//! This module handles executing shell commands through the configured
//! interpreter. Stdin and stderr are always inherited; stdout is either
//! inherited or captured.

use crate::error::{ExecutionError, ExecutionResult};
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

/// A fully substituted command, ready to run
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec<'a> {
    /// Command line handed to the interpreter
    pub command: &'a str,
    /// Working directory
    pub dir: &'a Path,
    /// Variables added on top of the inherited environment, applied in order
    pub env: &'a [(String, String)],
}

/// Run a command with stdout going to the terminal
pub async fn run_inherited(spec: CommandSpec<'_>, interpreter: &[String]) -> ExecutionResult<()> {
    let mut command = build(spec, interpreter)?;
    command.stdout(Stdio::inherit());

    tracing::debug!(command = spec.command, dir = %spec.dir.display(), "spawning");
    let status = command.status().await.map_err(|source| spawn_error(spec, source))?;

    check_status(status)
}

/// Run a command and return its stdout with surrounding whitespace trimmed
pub async fn run_captured(spec: CommandSpec<'_>, interpreter: &[String]) -> ExecutionResult<String> {
    let mut command = build(spec, interpreter)?;
    command.stdout(Stdio::piped());

    tracing::debug!(command = spec.command, dir = %spec.dir.display(), "spawning (captured)");
    // `output()` would pipe stderr too; spawn so it stays on the terminal.
    let child = command.spawn().map_err(|source| spawn_error(spec, source))?;
    let output = child
        .wait_with_output()
        .await
        .map_err(|source| spawn_error(spec, source))?;

    check_status(output.status)?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn build(spec: CommandSpec<'_>, interpreter: &[String]) -> ExecutionResult<Command> {
    let (program, args) = interpreter.split_first().ok_or_else(|| {
        spawn_error(
            spec,
            io::Error::new(io::ErrorKind::InvalidInput, "no interpreter configured"),
        )
    })?;

    let mut command = Command::new(program);
    command.args(args);
    command.arg(spec.command);
    command.current_dir(spec.dir);
    command.envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    command.stdin(Stdio::inherit());
    command.stderr(Stdio::inherit());

    Ok(command)
}

fn check_status(status: ExitStatus) -> ExecutionResult<()> {
    if status.success() {
        Ok(())
    } else {
        Err(ExecutionError::CommandFailed(status.code()))
    }
}

fn spawn_error(spec: CommandSpec<'_>, source: io::Error) -> ExecutionError {
    ExecutionError::Spawn {
        command: spec.command.to_string(),
        source,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh() -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string()]
    }

    fn spec<'a>(command: &'a str, dir: &'a Path, env: &'a [(String, String)]) -> CommandSpec<'a> {
        CommandSpec { command, dir, env }
    }

    #[tokio::test]
    async fn test_execute_simple_command() {
        let dir = TempDir::new().unwrap();
        let result = run_inherited(spec("true", dir.path(), &[]), &sh()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_execute_failing_command() {
        let dir = TempDir::new().unwrap();
        let result = run_inherited(spec("exit 3", dir.path(), &[]), &sh()).await;
        assert!(matches!(result, Err(ExecutionError::CommandFailed(Some(3)))));
    }

    #[tokio::test]
    async fn test_capture_trims_output() {
        let dir = TempDir::new().unwrap();
        let out = run_captured(spec("printf '  hello \\n\\n'", dir.path(), &[]), &sh())
            .await
            .unwrap();
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn test_capture_failure_is_error() {
        let dir = TempDir::new().unwrap();
        let result = run_captured(spec("echo partial; false", dir.path(), &[]), &sh()).await;
        assert!(matches!(result, Err(ExecutionError::CommandFailed(Some(1)))));
    }

    #[tokio::test]
    async fn test_working_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();
        let out = run_captured(spec("ls", dir.path(), &[]), &sh()).await.unwrap();
        assert_eq!(out, "marker.txt");
    }

    #[tokio::test]
    async fn test_environment_is_extended() {
        let dir = TempDir::new().unwrap();
        let env = vec![
            ("CHORE_TEST_A".to_string(), "first".to_string()),
            ("CHORE_TEST_A".to_string(), "second".to_string()),
        ];
        let out = run_captured(spec("printf %s \"$CHORE_TEST_A:$PATH\"", dir.path(), &env), &sh())
            .await
            .unwrap();
        assert!(out.starts_with("second:"));
        assert!(out.len() > "second:".len());
    }

    #[tokio::test]
    async fn test_missing_interpreter() {
        let dir = TempDir::new().unwrap();
        let result = run_inherited(
            spec("true", dir.path(), &[]),
            &["/definitely/not/a/shell".to_string()],
        )
        .await;
        assert!(matches!(result, Err(ExecutionError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_empty_interpreter() {
        let dir = TempDir::new().unwrap();
        let result = run_inherited(spec("true", dir.path(), &[]), &[]).await;
        assert!(matches!(result, Err(ExecutionError::Spawn { .. })));
    }
}
