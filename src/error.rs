//! Error types for Chore

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias for Chore operations
pub type Result<T> = std::result::Result<T, ChoreError>;

/// Error raised while loading a Taskfile
#[derive(Error, Debug)]
pub enum ChoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Taskfile parsing and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find Taskfile (searched: {0})")]
    NotFound(String),

    #[error("Failed to read '{path}': {error}")]
    Read { path: PathBuf, error: io::Error },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid task name '{0}'")]
    InvalidTaskName(String),

    #[error("Task '{task}' sets invalid environment variable name '{name}'")]
    InvalidSetName { task: String, name: String },
}

/// Task execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Task \"{0}\" not found")]
    TaskNotFound(String),

    #[error("Cyclic dependency detected: {0}")]
    CyclicDependency(String),

    #[error(transparent)]
    Interpolation(#[from] InterpolationError),

    #[error("Command failed with exit code {0:?}")]
    CommandFailed(Option<i32>),

    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to run task \"{task}\": {source}")]
    TaskRun {
        task: String,
        #[source]
        source: Box<ExecutionError>,
    },

    #[error("Cancelled after a sibling dependency failed")]
    Cancelled,

    /// A failure recorded once and handed to every task that waited on it
    #[error(transparent)]
    Shared(Arc<ExecutionError>),
}

impl ExecutionError {
    /// Wrap an error with the name of the task it occurred in
    pub fn in_task(task: impl Into<String>, source: ExecutionError) -> Self {
        ExecutionError::TaskRun {
            task: task.into(),
            source: Box::new(source),
        }
    }

    /// The innermost error, looking through task context and shared results
    pub fn root_cause(&self) -> &ExecutionError {
        match self {
            ExecutionError::TaskRun { source, .. } => source.root_cause(),
            ExecutionError::Shared(inner) => inner.root_cause(),
            other => other,
        }
    }
}

/// Variable interpolation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterpolationError {
    #[error("Variable '{0}' is not defined")]
    UndefinedVariable(String),
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

/// Specialized result type for interpolation operations
pub type InterpolationResult<T> = std::result::Result<T, InterpolationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_context() {
        let err = ExecutionError::in_task(
            "build",
            ExecutionError::Shared(Arc::new(ExecutionError::in_task(
                "lint",
                ExecutionError::CommandFailed(Some(2)),
            ))),
        );
        assert!(matches!(
            err.root_cause(),
            ExecutionError::CommandFailed(Some(2))
        ));
    }

    #[test]
    fn test_task_run_message_names_task() {
        let err = ExecutionError::in_task("build", ExecutionError::CommandFailed(Some(1)));
        assert_eq!(
            err.to_string(),
            "Failed to run task \"build\": Command failed with exit code Some(1)"
        );
    }
}
