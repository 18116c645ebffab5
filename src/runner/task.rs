//! Task definitions and the task registry
//!
//! This module contains the runtime representation of tasks. A task's name
//! is the registry key; it is not stored on the task itself.

use crate::config;
use crate::error::{ExecutionError, ExecutionResult};
use std::collections::HashMap;

/// Prefix marking a command step that invokes another task
pub const SUBTASK_MARKER: char = '^';

/// Runtime task representation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Task {
    /// Short description for listings
    pub desc: Option<String>,

    /// Commands, run strictly in order
    pub cmds: Vec<String>,

    /// Tasks (possibly templated names) to run first
    pub deps: Vec<String>,

    /// Input file patterns
    pub sources: Vec<String>,

    /// Output file patterns
    pub generates: Vec<String>,

    /// Working directory template; empty means the run's directory
    pub dir: String,

    /// Variable templates, resolved at every use
    pub vars: HashMap<String, String>,

    /// Variable receiving captured stdout, if any
    pub set: Option<String>,

    /// Environment templates added to every command
    pub env: HashMap<String, String>,
}

impl Task {
    /// Create a new task from configuration
    pub fn from_config(config: config::Task) -> Self {
        Task {
            desc: config.desc,
            cmds: config.cmds,
            deps: config.deps,
            sources: config.sources,
            generates: config.generates,
            dir: config.dir,
            vars: config.vars,
            set: Some(config.set).filter(|s| !s.is_empty()),
            env: config.env,
        }
    }

    /// Names of tasks invoked through sub-task command steps
    pub fn subtask_refs(&self) -> impl Iterator<Item = &str> {
        self.cmds.iter().filter_map(|cmd| subtask_name(cmd))
    }
}

/// If `cmd` is a sub-task step, the name of the task it invokes
pub fn subtask_name(cmd: &str) -> Option<&str> {
    cmd.strip_prefix(SUBTASK_MARKER).map(str::trim)
}

/// The set of tasks known to a run
///
/// Built once, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    tasks: HashMap<String, Task>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a parsed Taskfile
    pub fn from_config(config: &config::Config) -> Self {
        config
            .tasks
            .iter()
            .map(|(name, task)| (name.clone(), Task::from_config(task.clone())))
            .collect()
    }

    /// Add or replace a task
    pub fn insert(&mut self, name: impl Into<String>, task: Task) {
        self.tasks.insert(name.into(), task);
    }

    /// Look up a task by name
    pub fn get(&self, name: &str) -> ExecutionResult<&Task> {
        self.tasks
            .get(name)
            .ok_or_else(|| ExecutionError::TaskNotFound(name.to_string()))
    }

    /// Whether a task with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// All task names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tasks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl FromIterator<(String, Task)> for Registry {
    fn from_iter<I: IntoIterator<Item = (String, Task)>>(iter: I) -> Self {
        Registry {
            tasks: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_empty_set_is_none() {
        let task = Task::from_config(config::Task {
            cmds: vec!["echo hi".to_string()],
            ..config::Task::default()
        });
        assert_eq!(task.set, None);
        assert_eq!(task.cmds, vec!["echo hi"]);
    }

    #[test]
    fn test_from_config_keeps_set() {
        let task = Task::from_config(config::Task {
            set: "OUT".to_string(),
            ..config::Task::default()
        });
        assert_eq!(task.set.as_deref(), Some("OUT"));
    }

    #[test]
    fn test_subtask_name() {
        assert_eq!(subtask_name("^build"), Some("build"));
        assert_eq!(subtask_name("^ build "), Some("build"));
        assert_eq!(subtask_name("echo ^build"), None);
    }

    #[test]
    fn test_subtask_refs() {
        let task = Task {
            cmds: vec![
                "echo start".to_string(),
                "^lint".to_string(),
                "^test".to_string(),
            ],
            ..Task::default()
        };
        assert_eq!(task.subtask_refs().collect::<Vec<_>>(), vec!["lint", "test"]);
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = Registry::new();
        registry.insert("build", Task::default());

        assert!(registry.get("build").is_ok());
        assert!(matches!(
            registry.get("missing"),
            Err(ExecutionError::TaskNotFound(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_registry_names_sorted() {
        let registry: Registry = ["zeta", "alpha", "mid"]
            .into_iter()
            .map(|name| (name.to_string(), Task::default()))
            .collect();
        assert_eq!(registry.names(), vec!["alpha", "mid", "zeta"]);
        assert_eq!(registry.len(), 3);
    }
}
