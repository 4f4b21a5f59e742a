//! Errors. Every one of them is fatal to the run that raised it.

use std::{collections::TryReserveError, io};

use thiserror::Error;

use crate::task::TaskKind;

#[derive(Debug, Error)]
pub enum Error
{
    #[error("invalid number of arguments (usage: {program} [tasks])")]
    Usage { program: String },

    #[error("invalid number of tasks `{0}`")]
    InvalidTaskCount(String),

    #[error("too few tasks: {requested}, must be at least {minimum}")]
    TooFewTasks { requested: usize, minimum: usize },

    #[error("exceeded maximum tasks: {requested} requested, capacity is {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },

    #[error("unknown policy `{0}`, expected `reader` or `fair`")]
    UnknownPolicy(String),

    #[error("failed to allocate room for {tasks} tasks")]
    Allocation
    {
        tasks: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("failed to create {kind} thread {id}")]
    Spawn
    {
        kind: TaskKind,
        id: usize,
        #[source]
        source: io::Error,
    },

    #[error("failed to join {kind} thread {id}: {reason}")]
    Join
    {
        kind: TaskKind,
        id: usize,
        reason: String,
    },

    #[error("session has already been torn down")]
    SessionClosed,
}

impl Error
{
    /// Whether the error was caused by the requested configuration rather
    /// than by a resource failing at run time.
    pub fn is_configuration(&self) -> bool
    {
        matches!(
            self,
            Error::Usage { .. }
                | Error::InvalidTaskCount(_)
                | Error::TooFewTasks { .. }
                | Error::CapacityExceeded { .. }
                | Error::UnknownPolicy(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
