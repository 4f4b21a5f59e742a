//! # Run lifecycle
//!
//! A [`Session`] owns one run: the shared context, the worker pool, and the
//! counter left behind once every worker is gone.
//!
//! ```text
//! Uninitialized -> Ready -> Running -> Draining -> Destroyed
//!                    |                   ^
//!                    +-------------------+   (error path)
//! ```
//!
//! Teardown joins whatever is still running, then takes the shared context
//! apart. It runs at most once: later calls, including the one from `Drop`,
//! find the session `Destroyed` and do nothing.

use std::{fmt, sync::Arc};

use crate::{
    config::Config,
    counter::{SharedCounter, WriterId},
    error::{Error, Result},
    output,
    pool::{Partition, WorkerPool},
    shared::Shared,
    task::{Outcome, TaskKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State
{
    Uninitialized,
    Ready,
    Running,
    Draining,
    Destroyed,
}

pub struct Session
{
    state: State,
    shared: Option<Arc<Shared>>,
    pool: Option<WorkerPool>,
    counts: [usize; 3],
    remains: Option<SharedCounter>,
}

impl Session
{
    /// Creates the shared context and the pool for `config`.
    ///
    /// If the pool cannot be set up, whatever was already created is torn
    /// down before the error is returned.
    pub fn open(config: &Config) -> Result<Self>
    {
        let mut session = Session {
            state: State::Uninitialized,
            shared: None,
            pool: None,
            counts: [0; 3],
            remains: None,
        };

        let shared = Arc::new(Shared::new(config.policy));
        session.shared = Some(Arc::clone(&shared));

        match WorkerPool::new(shared, config.capacity) {
            Ok(pool) => {
                session.pool = Some(pool.echo(config.echo));
                session.state = State::Ready;
                Ok(session)
            }
            Err(err) => {
                // No pool exists yet, so there is nothing to join.
                let _ = session.teardown();
                Err(err)
            }
        }
    }

    pub fn state(&self) -> State { self.state }

    /// The shared context, while the session still has one.
    pub fn shared(&self) -> Option<&Arc<Shared>> { self.shared.as_ref() }

    /// Starts `count` tasks of `kind`. See [`WorkerPool::spawn`].
    ///
    /// Any failure tears the session down.
    pub fn spawn(&mut self, kind: TaskKind, count: usize) -> Result<usize>
    {
        let res = self.pool_mut().and_then(|pool| pool.spawn(kind, count));
        self.settle_spawn(res)
    }

    /// Starts a whole partition, or nothing if it does not fit.
    pub fn spawn_partition(&mut self, partition: Partition) -> Result<usize>
    {
        let res = self
            .pool_mut()
            .and_then(|pool| pool.spawn_partition(partition));
        self.settle_spawn(res)
    }

    /// Waits for every spawned task. The session is back to `Ready` and can
    /// spawn again if capacity is left.
    ///
    /// A join failure tears the session down.
    pub fn join_all(&mut self) -> Result<Vec<Outcome>>
    {
        let res = self.pool_mut().and_then(WorkerPool::join_all);

        match res {
            Ok(outcomes) => {
                self.state = State::Ready;
                Ok(outcomes)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Runs a whole partition to completion and tears the session down.
    pub fn run(&mut self, partition: Partition) -> Result<Summary>
    {
        self.spawn_partition(partition)?;
        self.join_all()?;
        self.teardown()?;
        self.summary().ok_or(Error::SessionClosed)
    }

    /// Joins anything still running and releases the shared state. Returns
    /// the final counter on the first call, `None` afterwards.
    ///
    /// The session ends up `Destroyed` either way. If a straggler failed,
    /// the counter is still kept in [`remains`](Self::remains) and the join
    /// failure is returned.
    ///
    /// If a caller of [`shared`](Self::shared) still holds the context, the
    /// counter is copied out as a reader, which blocks until any `Writing`
    /// taken through that handle is dropped. Holding one on the calling
    /// thread deadlocks.
    pub fn teardown(&mut self) -> Result<Option<SharedCounter>>
    {
        if self.state == State::Destroyed {
            return Ok(None);
        }
        self.state = State::Draining;

        let mut joined = Ok(());
        if let Some(mut pool) = self.pool.take() {
            joined = pool.join_all().map(drop);
            self.counts = TaskKind::ALL.map(|kind| pool.spawned(kind));
        }

        let counter = self.shared.take().map(|shared| match Arc::try_unwrap(shared) {
            Ok(shared) => shared.into_counter(),
            // Every worker has been joined, so this handle can only be
            // shared with a caller of `Session::shared`.
            Err(shared) => SharedCounter::clone(&shared.reading()),
        });

        self.remains = counter.clone();
        self.state = State::Destroyed;
        joined.map(|()| counter)
    }

    /// The counter as teardown left it.
    pub fn remains(&self) -> Option<&SharedCounter> { self.remains.as_ref() }

    /// Task counts and final counter, once the session is torn down.
    pub fn summary(&self) -> Option<Summary>
    {
        let counter = self.remains.clone()?;
        Some(Summary {
            incrementers: self.counts[TaskKind::Increment.index()],
            decrementers: self.counts[TaskKind::Decrement.index()],
            readers: self.counts[TaskKind::Read.index()],
            counter,
        })
    }

    fn pool_mut(&mut self) -> Result<&mut WorkerPool> { self.pool.as_mut().ok_or(Error::SessionClosed) }

    fn settle_spawn(&mut self, res: Result<usize>) -> Result<usize>
    {
        match res {
            Ok(len) => {
                if len > 0 {
                    self.state = State::Running;
                }
                Ok(len)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Tears down after `err`. A later failure while draining is dropped in
    /// favour of the first one.
    fn fail<T>(&mut self, err: Error) -> Result<T>
    {
        let _ = self.teardown();
        Err(err)
    }
}

impl Drop for Session
{
    fn drop(&mut self)
    {
        if let Err(err) = self.teardown() {
            output::warning(&err);
        }
    }
}

/// What a finished run reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary
{
    pub incrementers: usize,
    pub decrementers: usize,
    pub readers: usize,
    pub counter: SharedCounter,
}

impl fmt::Display for Summary
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        writeln!(
            f,
            "There were {} readers, {} incrementers and {} decrementers",
            self.readers, self.incrementers, self.decrementers
        )?;
        writeln!(f, "The final state of the data is:")?;
        writeln!(f, "\tlast incrementer {}", WriterId(self.counter.last_incrementer()))?;
        writeln!(f, "\tlast decrementer {}", WriterId(self.counter.last_decrementer()))?;
        writeln!(f, "\ttotal writers {}", self.counter.writer_count())?;
        write!(f, "\tsum {}", self.counter.sum())
    }
}
