//! Configuration validation
//!
//! Structural checks on a parsed Taskfile. Graph-level checks (cycles)
//! happen in the runner, once, right before execution.

use crate::config::types::{Config, Task};
use crate::error::{ConfigError, ConfigResult};

/// Validate a complete configuration
pub fn validate_config(config: &Config) -> ConfigResult<()> {
    for (name, task) in &config.tasks {
        validate_task(name, task)?;
    }

    if let Some(interpreter) = &config.interpreter {
        if interpreter.is_empty() || interpreter[0].trim().is_empty() {
            return Err(ConfigError::Invalid(
                "interpreter must name a program".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validate a single task
pub fn validate_task(name: &str, task: &Task) -> ConfigResult<()> {
    if name.is_empty() || name.chars().any(char::is_whitespace) || name.starts_with('^') {
        return Err(ConfigError::InvalidTaskName(name.to_string()));
    }

    if !task.set.is_empty() && !is_valid_env_name(&task.set) {
        return Err(ConfigError::InvalidSetName {
            task: name.to_string(),
            name: task.set.clone(),
        });
    }

    if task.sources.is_empty() != task.generates.is_empty() {
        tracing::warn!(
            task = name,
            "only one of sources/generates is set; the task will always run"
        );
    }

    Ok(())
}

/// Whether `name` can be used as an environment variable name
pub fn is_valid_env_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('=') && !name.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(name: &str, task: Task) -> Config {
        let mut tasks = HashMap::new();
        tasks.insert(name.to_string(), task);
        Config {
            tasks,
            ..Config::default()
        }
    }

    #[test]
    fn test_validate_valid_config() {
        let task = Task {
            desc: Some("Test task".to_string()),
            cmds: vec!["echo test".to_string()],
            ..Task::default()
        };
        assert!(validate_config(&config_with("test", task)).is_ok());
    }

    #[test]
    fn test_validate_task_name_with_space() {
        let result = validate_config(&config_with("bad name", Task::default()));
        assert!(matches!(result, Err(ConfigError::InvalidTaskName(_))));
    }

    #[test]
    fn test_validate_task_name_with_marker() {
        let result = validate_config(&config_with("^build", Task::default()));
        assert!(matches!(result, Err(ConfigError::InvalidTaskName(_))));
    }

    #[test]
    fn test_validate_invalid_set_name() {
        let task = Task {
            set: "A=B".to_string(),
            ..Task::default()
        };
        let result = validate_config(&config_with("capture", task));
        assert!(matches!(result, Err(ConfigError::InvalidSetName { .. })));
    }

    #[test]
    fn test_sources_without_generates_is_allowed() {
        let task = Task {
            sources: vec!["*.rs".to_string()],
            ..Task::default()
        };
        assert!(validate_config(&config_with("build", task)).is_ok());
    }

    #[test]
    fn test_validate_empty_interpreter() {
        let config = Config {
            interpreter: Some(vec![]),
            ..Config::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_env_names() {
        assert!(is_valid_env_name("OUT"));
        assert!(!is_valid_env_name(""));
        assert!(!is_valid_env_name("A=B"));
    }
}
