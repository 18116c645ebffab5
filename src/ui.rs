//! Terminal output for users
//!
//! Everything a user is meant to read goes to stderr through a [`Printer`],
//! so stdout stays reserved for the commands being run.

use crate::runner::{Registry, Verbosity};
use colored::Colorize;
use std::io::{self, Write};

/// Verbosity-aware writer for user-facing messages
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    verbosity: Verbosity,
}

impl Printer {
    pub fn new(verbosity: Verbosity) -> Self {
        Printer { verbosity }
    }

    /// Echo a command before it runs
    pub fn command(&self, command: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{}", command.bold());
        }
    }

    pub fn up_to_date(&self, task: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{} Task \"{}\" is up to date", "chore:".dimmed(), task);
        }
    }

    pub fn info(&self, message: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{} {}", "chore:".dimmed(), message);
        }
    }

    /// Print the available tasks with their descriptions
    pub fn task_list(&self, registry: &Registry) {
        if self.verbosity < Verbosity::Quiet {
            return;
        }
        let mut stderr = io::stderr().lock();
        // Listing is best effort; a closed stderr is not worth failing over.
        let _ = write_task_list(&mut stderr, registry);
    }
}

/// Write an aligned `name  description` listing of every task
pub fn write_task_list<W: Write>(out: &mut W, registry: &Registry) -> io::Result<()> {
    if registry.is_empty() {
        return writeln!(out, "No tasks defined");
    }

    let width = registry.names().iter().map(|n| n.len()).max().unwrap_or(0);

    writeln!(out, "Available tasks:")?;
    for name in registry.names() {
        let desc = registry
            .get(name)
            .ok()
            .and_then(|task| task.desc.as_deref())
            .unwrap_or("");
        if desc.is_empty() {
            writeln!(out, "  {}", name.green())?;
        } else {
            let padded = format!("{:<width$}", name, width = width);
            writeln!(out, "  {}  {}", padded.green(), desc)?;
        }
    }
    Ok(())
}
