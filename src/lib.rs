//! Chore - a dependency-aware YAML task runner
//!
//! Tasks declare commands, dependencies, input and output file patterns,
//! variables and environment. Running a task first runs its dependencies
//! concurrently, then skips the task if its outputs are newer than its
//! inputs, and otherwise runs its commands in order.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod ui;

// Re-export commonly used types
pub use error::{ChoreError, Result};
pub use runner::{Context, Engine, Registry, Task};

/// Current version of Chore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
