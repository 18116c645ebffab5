//! Task execution engine
//!
//! Runs a task's dependency graph: dependencies of a task are driven
//! concurrently and must all succeed before the task's own commands run,
//! one after another. The first failing dependency cancels its siblings.
//!
//! Captured command output (`set`) lives in a table owned by the engine
//! rather than in the process environment. It is visible to every later
//! variable resolution and is exported to every later command.

use crate::config::Config;
use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::command::{self, CommandSpec};
use crate::runner::{
    freshness, graph, interpolate, interpolate_map, resolve_task_vars, subtask_name, CancelToken,
    Context, Registry, Task,
};
use crate::ui::Printer;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::{OnceCell, Semaphore};
use tracing::Instrument;

/// Name of the task run when none is requested
pub const DEFAULT_TASK: &str = "default";

type SharedResult = Result<(), Arc<ExecutionError>>;

/// Results of dependency tasks within one top-level invocation
#[derive(Default)]
struct Memo {
    cells: Mutex<HashMap<String, Arc<OnceCell<SharedResult>>>>,
}

impl Memo {
    fn cell(&self, name: &str) -> Arc<OnceCell<SharedResult>> {
        let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        cells.entry(name.to_string()).or_default().clone()
    }
}

/// Per-call state passed down the dependency chain
#[derive(Clone)]
struct Frame<'m> {
    cancel: CancelToken,
    /// Tasks currently being run on this path, outermost first
    stack: Vec<String>,
    memo: &'m Memo,
}

impl<'m> Frame<'m> {
    fn root(memo: &'m Memo) -> Self {
        Frame {
            cancel: CancelToken::new(),
            stack: Vec::new(),
            memo,
        }
    }

    fn enter(&self, name: &str) -> Self {
        let mut frame = self.clone();
        frame.stack.push(name.to_string());
        frame
    }

    fn with_cancel(&self, cancel: CancelToken) -> Self {
        Frame {
            cancel,
            ..self.clone()
        }
    }

    /// Fail if `name` is already running on this path
    fn guard(&self, name: &str) -> ExecutionResult<()> {
        if self.stack.iter().any(|n| n == name) {
            let mut path = self.stack.clone();
            path.push(name.to_string());
            return Err(ExecutionError::CyclicDependency(path.join(" -> ")));
        }
        Ok(())
    }
}

/// Executes tasks from a registry
pub struct Engine {
    registry: Registry,
    globals: HashMap<String, String>,
    ctx: Context,
    printer: Printer,
    outputs: RwLock<HashMap<String, String>>,
    limiter: Semaphore,
}

impl Engine {
    pub fn new(registry: Registry, ctx: Context) -> Self {
        Engine {
            registry,
            globals: HashMap::new(),
            printer: Printer::new(ctx.verbosity),
            outputs: RwLock::new(HashMap::new()),
            limiter: Semaphore::new(ctx.jobs.max(1)),
            ctx,
        }
    }

    /// Build an engine for a parsed Taskfile
    ///
    /// The Taskfile's interpreter, when given, replaces the context's.
    pub fn from_config(config: &Config, mut ctx: Context) -> Self {
        if let Some(interpreter) = &config.interpreter {
            ctx = ctx.with_interpreter(interpreter.clone());
        }
        Engine::new(Registry::from_config(config), ctx).with_globals(config.vars.clone())
    }

    /// Set variables visible to every task
    pub fn with_globals(mut self, globals: HashMap<String, String>) -> Self {
        self.globals = globals;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// A value captured by a task's `set`
    pub fn output(&self, name: &str) -> Option<String> {
        self.read_outputs().get(name).cloned()
    }

    /// Run the requested tasks one after another
    ///
    /// With no names, runs the `default` task. The whole registry is checked
    /// for cycles, and every name for existence, before anything runs.
    pub async fn run(&self, names: &[String]) -> ExecutionResult<()> {
        let names: Vec<String> = if names.is_empty() {
            self.printer.info("No argument given, trying default task");
            vec![DEFAULT_TASK.to_string()]
        } else {
            names.to_vec()
        };

        graph::check_cycles(&self.registry)?;

        for name in &names {
            self.registry.get(name)?;
        }

        for name in &names {
            self.run_task(name).await?;
        }
        Ok(())
    }

    /// Run one task and everything it depends on
    pub async fn run_task(&self, name: &str) -> ExecutionResult<()> {
        let memo = Memo::default();
        self.execute(name.to_string(), Frame::root(&memo)).await
    }

    /// Full run path of a task: dependencies, freshness, commands
    fn execute<'a>(&'a self, name: String, frame: Frame<'a>) -> BoxFuture<'a, ExecutionResult<()>> {
        let span = tracing::debug_span!("task", task = %name);

        async move {
            if frame.cancel.is_cancelled() {
                tracing::debug!("cancelled before start");
                return Err(ExecutionError::Cancelled);
            }
            frame.guard(&name)?;

            let task = self.registry.get(&name)?;
            let frame = frame.enter(&name);

            self.run_deps(task, &frame).await?;

            if !self.ctx.force && freshness::is_up_to_date(task, &self.ctx.working_dir) {
                self.printer.up_to_date(&name);
                return Ok(());
            }

            for index in 0..task.cmds.len() {
                self.run_command(task, index, &frame)
                    .await
                    .map_err(|e| ExecutionError::in_task(name.as_str(), e))?;
            }

            tracing::debug!("finished");
            Ok(())
        }
        .instrument(span)
        .boxed()
    }

    /// Run every dependency concurrently and wait for all of them
    ///
    /// Returns the first error observed. Once a dependency fails, siblings
    /// that have not started a task yet are cancelled; running commands are
    /// left to finish.
    async fn run_deps(&self, task: &Task, frame: &Frame<'_>) -> ExecutionResult<()> {
        if task.deps.is_empty() {
            return Ok(());
        }

        let vars = self.resolve_vars(task)?;
        let cancel = frame.cancel.child();

        let mut pending: FuturesUnordered<_> = task
            .deps
            .iter()
            .map(|dep| {
                let frame = frame.with_cancel(cancel.clone());
                let vars = &vars;
                async move {
                    match interpolate(dep, vars) {
                        Ok(name) => self.run_dependency(name, frame).await,
                        Err(e) => Err(e.into()),
                    }
                }
            })
            .collect();

        let mut first_error = None;
        while let Some(result) = pending.next().await {
            if let Err(e) = result {
                cancel.cancel();
                if first_error.is_none() {
                    first_error = Some(e);
                } else {
                    tracing::debug!(error = %e, "further dependency failure");
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Run a dependency, sharing the result with other requesters when
    /// deduplication is on
    async fn run_dependency(&self, name: String, frame: Frame<'_>) -> ExecutionResult<()> {
        if !self.ctx.dedupe {
            return self.execute(name, frame).await;
        }

        // Waiting on our own cell would never finish.
        frame.guard(&name)?;

        let cell = frame.memo.cell(&name);
        let init = {
            let frame = frame.clone();
            move || async move { self.execute(name, frame).await.map_err(Arc::new) }
        };
        let result = cell.get_or_init(init).await;

        result.clone().map_err(ExecutionError::Shared)
    }

    /// Run the command at `index` of a task that must run
    async fn run_command(&self, task: &Task, index: usize, frame: &Frame<'_>) -> ExecutionResult<()> {
        let vars = self.resolve_vars(task)?;
        let cmd = interpolate(&task.cmds[index], &vars)?;

        if let Some(subtask) = subtask_name(&cmd) {
            return self.execute(subtask.to_string(), frame.clone()).await;
        }

        let dir = self.resolve_dir(task, &vars)?;
        let env = self.build_env(task, &vars)?;
        let spec = CommandSpec {
            command: &cmd,
            dir: &dir,
            env: &env,
        };

        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| ExecutionError::Cancelled)?;

        match &task.set {
            None => {
                self.printer.command(&cmd);
                command::run_inherited(spec, &self.ctx.interpreter).await
            }
            Some(var) => {
                let value = command::run_captured(spec, &self.ctx.interpreter).await?;
                tracing::debug!(var = %var, value = %value, "captured output");
                self.write_outputs().insert(var.clone(), value);
                Ok(())
            }
        }
    }

    /// Resolve a task's variables against the current state of the run
    fn resolve_vars(&self, task: &Task) -> ExecutionResult<HashMap<String, String>> {
        let mut base = self.globals.clone();
        base.extend(
            self.read_outputs()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        Ok(resolve_task_vars(&task.vars, &base, &self.ctx.overrides)?)
    }

    fn resolve_dir(&self, task: &Task, vars: &HashMap<String, String>) -> ExecutionResult<PathBuf> {
        if task.dir.is_empty() {
            return Ok(self.ctx.working_dir.clone());
        }
        let dir = interpolate(&task.dir, vars)?;
        Ok(self.ctx.working_dir.join(dir))
    }

    /// Captured outputs followed by the task's own `env`, so `env` wins
    fn build_env(&self, task: &Task, vars: &HashMap<String, String>) -> ExecutionResult<Vec<(String, String)>> {
        let mut env: Vec<(String, String)> = self
            .read_outputs()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        env.extend(interpolate_map(&task.env, vars)?);
        Ok(env)
    }

    fn read_outputs(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, String>> {
        self.outputs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_outputs(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, String>> {
        self.outputs.write().unwrap_or_else(PoisonError::into_inner)
    }
}
