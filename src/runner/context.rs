//! Run configuration
//!
//! Everything that used to be process-wide (flags, interpreter, working
//! directory, command-line variables) is bundled here, built once per run
//! and handed to the engine.

use std::collections::HashMap;
use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::thread;

/// Settings shared by every task in a run
#[derive(Debug, Clone)]
pub struct Context {
    /// Base directory for `dir` and for freshness patterns
    pub working_dir: PathBuf,

    /// Interpreter that receives each command as its last argument
    pub interpreter: Vec<String>,

    /// Verbosity level
    pub verbosity: Verbosity,

    /// Run tasks even when they are up to date
    pub force: bool,

    /// Maximum number of commands running at once
    pub jobs: usize,

    /// Run each dependency at most once per top-level task instead of once
    /// per dependency edge
    pub dedupe: bool,

    /// Variables given on the command line; they win over everything else
    pub overrides: HashMap<String, String>,
}

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

impl Context {
    /// Create a new context with default settings
    pub fn new() -> Self {
        Context {
            working_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            interpreter: default_interpreter(),
            verbosity: Verbosity::Normal,
            force: false,
            jobs: default_jobs(),
            dedupe: false,
            overrides: HashMap::new(),
        }
    }

    /// Create a context with a specific working directory
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = dir;
        self
    }

    /// Set the interpreter
    pub fn with_interpreter(mut self, interpreter: Vec<String>) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Set verbosity level
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Limit concurrent commands; zero means "use the default"
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = if jobs == 0 { default_jobs() } else { jobs };
        self
    }

    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }

    /// Set command-line variable overrides
    pub fn with_overrides(mut self, vars: HashMap<String, String>) -> Self {
        self.overrides = vars;
        self
    }

    /// Set a single override
    pub fn set_override(&mut self, key: String, value: String) {
        self.overrides.insert(key, value);
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

fn default_interpreter() -> Vec<String> {
    if cfg!(windows) {
        vec!["cmd".to_string(), "/C".to_string()]
    } else {
        vec!["sh".to_string(), "-c".to_string()]
    }
}

fn default_jobs() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
