//! Main CLI application

use crate::config::{parse_config_auto, parse_config_file, validate_config, Config};
use crate::error::ExecutionError;
use crate::runner::{Context, Engine, Verbosity};
use crate::ui::{write_task_list, Printer};
use anyhow::{anyhow, Context as _};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;
use std::collections::HashMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "CHORE_LOG";

/// What the user asked for on the command line
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Tasks to run, in order
    pub tasks: Vec<String>,
    /// `KEY=VALUE` overrides
    pub vars: HashMap<String, String>,
    pub force: bool,
    /// Run shared dependencies once per requested task
    pub dedupe: bool,
    pub list: bool,
    /// Zero means "pick a default"
    pub jobs: usize,
    pub verbosity: Verbosity,
    pub taskfile: Option<PathBuf>,
    pub completions: Option<Shell>,
}

impl Invocation {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let args: Vec<String> = matches
            .get_many::<String>("tasks")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        let (tasks, vars) = split_args(args);

        Invocation {
            tasks,
            vars,
            force: matches.get_flag("force"),
            dedupe: matches.get_flag("dedupe"),
            list: matches.get_flag("list"),
            jobs: matches.get_one::<usize>("jobs").copied().unwrap_or(0),
            verbosity: get_verbosity(matches),
            taskfile: matches.get_one::<PathBuf>("taskfile").cloned(),
            completions: matches.get_one::<Shell>("completions").copied(),
        }
    }
}

/// Build the clap command
pub fn build_command() -> Command {
    Command::new("chore")
        .version(crate::VERSION)
        .about("A dependency-aware YAML task runner")
        .arg(
            Arg::new("tasks")
                .value_name("TASK|VAR=VALUE")
                .num_args(0..)
                .action(ArgAction::Append)
                .help("Tasks to run, and variables to set for every task"),
        )
        .arg(
            Arg::new("force")
                .short('f')
                .long("force")
                .help("Run tasks even when they are up to date")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dedupe")
                .long("dedupe")
                .help("Run a dependency shared by several tasks only once")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("taskfile")
                .short('t')
                .long("taskfile")
                .value_name("FILE")
                .help("Path to the Taskfile (default: search upwards for Taskfile.yml)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .help("List available tasks")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .value_name("N")
                .help("Maximum number of commands running at once")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print command output and errors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("completions")
                .long("completions")
                .value_name("SHELL")
                .help("Print a shell completion script")
                .value_parser(value_parser!(Shell)),
        )
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Separate task names from `KEY=VALUE` variable overrides
pub fn split_args(args: Vec<String>) -> (Vec<String>, HashMap<String, String>) {
    let mut tasks = Vec::new();
    let mut vars = HashMap::new();

    for arg in args {
        match arg.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                vars.insert(key.to_string(), value.to_string());
            }
            _ => tasks.push(arg),
        }
    }

    (tasks, vars)
}

/// Install the tracing subscriber; `CHORE_LOG` overrides the default filter
fn init_logging(verbosity: Verbosity) {
    let default = if verbosity >= Verbosity::Verbose {
        "chore=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Load the Taskfile and the directory tasks run from
fn load_taskfile(path: Option<&Path>) -> anyhow::Result<(Config, PathBuf)> {
    let (config, path) = match path {
        Some(path) => {
            let config = parse_config_file(path)
                .map_err(|e| anyhow!("failed to load {}: {}", path.display(), e))?;
            (config, path.to_path_buf())
        }
        None => parse_config_auto()?,
    };

    validate_config(&config).map_err(|e| anyhow!("invalid Taskfile {}: {}", path.display(), e))?;

    let base_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => std::env::current_dir().context("failed to get current directory")?,
    };

    tracing::debug!(taskfile = %path.display(), base_dir = %base_dir.display(), "loaded taskfile");
    Ok((config, base_dir))
}

/// Run the CLI application with the process arguments
pub async fn run() -> anyhow::Result<()> {
    run_from(std::env::args_os()).await
}

/// Run the CLI application with the given arguments
pub async fn run_from<I, T>(args: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_command().get_matches_from(args);
    let invocation = Invocation::from_matches(&matches);

    init_logging(invocation.verbosity);

    if let Some(shell) = invocation.completions {
        let mut command = build_command();
        clap_complete::generate(shell, &mut command, "chore", &mut io::stdout());
        return Ok(());
    }

    let (config, base_dir) = load_taskfile(invocation.taskfile.as_deref())?;

    let ctx = Context::new()
        .with_working_dir(base_dir)
        .with_verbosity(invocation.verbosity)
        .with_force(invocation.force)
        .with_dedupe(invocation.dedupe)
        .with_jobs(invocation.jobs)
        .with_overrides(invocation.vars.clone());
    let engine = Engine::from_config(&config, ctx);

    if invocation.list {
        write_task_list(&mut io::stdout().lock(), engine.registry())?;
        return Ok(());
    }

    match engine.run(&invocation.tasks).await {
        Ok(()) => Ok(()),
        Err(err @ ExecutionError::TaskNotFound(_)) => {
            Printer::new(invocation.verbosity).task_list(engine.registry());
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(args: &[&str]) -> Invocation {
        let matches = build_command()
            .try_get_matches_from(std::iter::once("chore").chain(args.iter().copied()))
            .unwrap();
        Invocation::from_matches(&matches)
    }

    #[test]
    fn test_get_verbosity_normal() {
        assert_eq!(invocation(&[]).verbosity, Verbosity::Normal);
        assert_eq!(invocation(&["-q"]).verbosity, Verbosity::Quiet);
        assert_eq!(invocation(&["--silent", "-v"]).verbosity, Verbosity::Silent);
        assert_eq!(invocation(&["-v"]).verbosity, Verbosity::Verbose);
    }

    #[test]
    fn test_tasks_and_vars() {
        let inv = invocation(&["build", "MODE=release", "test", "EMPTY="]);
        assert_eq!(inv.tasks, vec!["build", "test"]);
        assert_eq!(inv.vars.get("MODE").map(String::as_str), Some("release"));
        assert_eq!(inv.vars.get("EMPTY").map(String::as_str), Some(""));
    }

    #[test]
    fn test_flags() {
        let inv = invocation(&["-f", "-j", "3", "-t", "other.yml", "--list"]);
        assert!(inv.force);
        assert!(!inv.dedupe);
        assert!(inv.list);
        assert_eq!(inv.jobs, 3);
        assert_eq!(inv.taskfile, Some(PathBuf::from("other.yml")));
        assert!(inv.tasks.is_empty());
    }

    #[test]
    fn test_dedupe_flag() {
        assert!(invocation(&["--dedupe", "build"]).dedupe);
    }

    #[test]
    fn test_completions_flag() {
        let inv = invocation(&["--completions", "bash"]);
        assert_eq!(inv.completions, Some(Shell::Bash));
    }

    #[test]
    fn test_split_args_leading_equals_is_task() {
        let (tasks, vars) = split_args(vec!["=odd".to_string()]);
        assert_eq!(tasks, vec!["=odd"]);
        assert!(vars.is_empty());
    }

    #[test]
    fn test_command_is_valid() {
        build_command().debug_assert();
    }
}
