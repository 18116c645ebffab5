//! Static dependency-graph checks
//!
//! Runs once over the whole registry before anything executes. Edges are the
//! literal entries of `deps` and literal `^name` command steps; templated names
//! and names missing from the registry contribute no edge here (they are
//! resolved, and reported, at run time).

use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::{has_placeholders, Registry, Task};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Fail with `CyclicDependency` if any task can reach itself
pub fn check_cycles(registry: &Registry) -> ExecutionResult<()> {
    match find_cycle(registry) {
        Some(path) => Err(ExecutionError::CyclicDependency(path.join(" -> "))),
        None => Ok(()),
    }
}

/// Whether any task is reachable from itself
pub fn has_cycle(registry: &Registry) -> bool {
    find_cycle(registry).is_some()
}

/// Find one cycle, returned as the path that closes it (`a, b, a`)
pub fn find_cycle(registry: &Registry) -> Option<Vec<String>> {
    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut path: Vec<&str> = Vec::new();

    for name in registry.names() {
        if marks.contains_key(name) {
            continue;
        }
        if let Some(cycle) = visit(registry, name, &mut marks, &mut path) {
            return Some(cycle);
        }
    }

    None
}

fn visit<'r>(
    registry: &'r Registry,
    name: &'r str,
    marks: &mut HashMap<&'r str, Mark>,
    path: &mut Vec<&'r str>,
) -> Option<Vec<String>> {
    let task = registry.get(name).ok()?;

    marks.insert(name, Mark::InProgress);
    path.push(name);

    for next in edges(task) {
        if !registry.contains(next) {
            continue;
        }
        match marks.get(next) {
            Some(Mark::InProgress) => {
                let start = path.iter().position(|n| *n == next).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(next.to_string());
                return Some(cycle);
            }
            Some(Mark::Done) => {}
            None => {
                if let Some(cycle) = visit(registry, next, marks, path) {
                    return Some(cycle);
                }
            }
        }
    }

    path.pop();
    marks.insert(name, Mark::Done);
    None
}

fn edges(task: &Task) -> impl Iterator<Item = &str> {
    task.deps
        .iter()
        .map(String::as_str)
        .chain(task.subtask_refs())
        .filter(|name| !has_placeholders(name))
}
