//! Task execution engine
//!
//! This module handles the execution of tasks, including dependency
//! resolution, up-to-date checks, variable substitution and command running.

pub mod cancel;
pub mod command;
pub mod context;
pub mod engine;
pub mod freshness;
pub mod graph;
pub mod interpolate;
pub mod task;

// Re-export main types
pub use cancel::CancelToken;
pub use context::*;
pub use engine::{Engine, DEFAULT_TASK};
pub use freshness::is_up_to_date;
pub use graph::{check_cycles, find_cycle, has_cycle};
pub use interpolate::*;
pub use task::*;
