//! Run configuration: how many tasks, which protocol, whether to print.
//!
//! The command line takes at most one positional argument, the task count.
//! The protocol comes from the `RWSUM_POLICY` environment variable.

use std::env;

use crate::{
    error::{Error, Result},
    shared::Policy,
};

/// Tasks per run when no count is given.
pub const DEFAULT_TASKS: usize = 10;

/// Smallest run that still has room for one incrementer and one decrementer.
pub const MIN_TASKS: usize = 2;

pub const POLICY_VAR: &str = "RWSUM_POLICY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config
{
    /// Tasks spawned by a run.
    pub tasks: usize,
    /// Upper bound on tasks the pool accepts over its lifetime.
    pub capacity: usize,
    pub policy: Policy,
    /// Print one progress line per finished task.
    pub echo: bool,
}

impl Config
{
    /// A quiet, reader-preferring run of `tasks` tasks with no spare capacity.
    pub fn new(tasks: usize) -> Self
    {
        Self {
            tasks,
            capacity: tasks,
            policy: Policy::default(),
            echo: false,
        }
    }

    /// Parses `program [tasks]`. The first item is the program name.
    pub fn from_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let program = args.next().unwrap_or_else(|| env!("CARGO_PKG_NAME").to_owned());
        let rest: Vec<String> = args.collect();

        let tasks = match rest.as_slice() {
            [] => DEFAULT_TASKS,
            [count] => parse_tasks(count)?,
            _ => return Err(Error::Usage { program }),
        };

        let mut config = Self::new(tasks);
        config.echo = true;
        Ok(config)
    }

    /// Applies `RWSUM_POLICY` if it is set.
    pub fn with_policy_env(self) -> Result<Self>
    {
        match env::var(POLICY_VAR) {
            Ok(value) => self.with_policy_str(&value),
            Err(_) => Ok(self),
        }
    }

    fn with_policy_str(mut self, value: &str) -> Result<Self>
    {
        self.policy = value.parse()?;
        Ok(self)
    }

    pub fn policy(mut self, policy: Policy) -> Self
    {
        self.policy = policy;
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self
    {
        self.capacity = capacity;
        self
    }

    pub fn echo(mut self, echo: bool) -> Self
    {
        self.echo = echo;
        self
    }
}

impl Default for Config
{
    fn default() -> Self { Self::new(DEFAULT_TASKS) }
}

fn parse_tasks(arg: &str) -> Result<usize>
{
    let tasks: usize = arg
        .trim()
        .parse()
        .map_err(|_| Error::InvalidTaskCount(arg.to_owned()))?;

    if tasks < MIN_TASKS {
        return Err(Error::TooFewTasks {
            requested: tasks,
            minimum: MIN_TASKS,
        });
    }
    Ok(tasks)
}
