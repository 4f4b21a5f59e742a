//! # Worker pool
//!
//! One OS thread per task. The pool keeps a roster of everything it spawned
//! and never runs more tasks than its capacity; a batch that would overflow
//! is refused before any of its threads start.

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};

use rand::Rng;

use crate::{
    config::MIN_TASKS,
    error::{Error, Result},
    shared::Shared,
    task::{Outcome, Task, TaskKind},
};

/// How many tasks of each kind a run spawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition
{
    pub incrementers: usize,
    pub decrementers: usize,
    pub readers: usize,
}

impl Partition
{
    pub fn new(incrementers: usize, decrementers: usize, readers: usize) -> Self
    {
        Self {
            incrementers,
            decrementers,
            readers,
        }
    }

    /// Splits `total` tasks at random: between 1 and `total / 2` incrementers,
    /// as many again decrementers at most, and readers for the rest.
    ///
    /// Returns `None` for fewer than [`MIN_TASKS`] tasks, which leaves no room
    /// for one writer of each kind.
    pub fn random<R: Rng>(total: usize, rng: &mut R) -> Option<Self>
    {
        if total < MIN_TASKS {
            return None;
        }
        let half = total / 2;
        let incrementers = rng.gen_range(1..=half);
        let decrementers = rng.gen_range(1..=half);
        Some(Self {
            incrementers,
            decrementers,
            readers: total - incrementers - decrementers,
        })
    }

    /// Tasks in the partition, saturating at `usize::MAX`.
    pub fn total(&self) -> usize
    {
        self.incrementers
            .saturating_add(self.decrementers)
            .saturating_add(self.readers)
    }

    pub fn count(&self, kind: TaskKind) -> usize
    {
        match kind {
            TaskKind::Increment => self.incrementers,
            TaskKind::Decrement => self.decrementers,
            TaskKind::Read => self.readers,
        }
    }
}

pub struct WorkerPool
{
    shared: Arc<Shared>,
    capacity: usize,
    roster: Vec<(Task, JoinHandle<Outcome>)>,
    next_id: [usize; 3],
    spawned: [usize; 3],
    echo: bool,
}

impl WorkerPool
{
    /// Creates an empty pool for at most `capacity` tasks.
    ///
    /// The roster is reserved up front, so a pool that cannot hold its
    /// capacity fails here instead of halfway through spawning.
    pub fn new(shared: Arc<Shared>, capacity: usize) -> Result<Self>
    {
        let mut roster = Vec::new();
        roster
            .try_reserve_exact(capacity)
            .map_err(|source| Error::Allocation {
                tasks: capacity,
                source,
            })?;

        Ok(Self {
            shared,
            capacity,
            roster,
            next_id: [0; 3],
            spawned: [0; 3],
            echo: false,
        })
    }

    /// Print a progress line as each task finishes.
    pub fn echo(mut self, echo: bool) -> Self
    {
        self.echo = echo;
        self
    }

    pub fn capacity(&self) -> usize { self.capacity }

    /// Tasks spawned and not yet joined.
    pub fn len(&self) -> usize { self.roster.len() }

    pub fn is_empty(&self) -> bool { self.roster.is_empty() }

    /// Tasks of `kind` spawned over the pool's lifetime.
    pub fn spawned(&self, kind: TaskKind) -> usize { self.spawned[kind.index()] }

    /// Room left before the pool reaches its capacity.
    pub fn remaining(&self) -> usize { self.capacity - self.total_spawned() }

    fn total_spawned(&self) -> usize { self.spawned.iter().sum() }

    /// Fails unless `count` more tasks fit. A request too large to count
    /// is reported as `usize::MAX`.
    fn check_room(&self, count: usize) -> Result<()>
    {
        let requested = self.total_spawned().saturating_add(count);
        if requested > self.capacity {
            return Err(Error::CapacityExceeded {
                requested,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Starts `count` tasks of `kind` and returns the roster size.
    ///
    /// Ids continue from the previous batch of the same kind.
    pub fn spawn(&mut self, kind: TaskKind, count: usize) -> Result<usize>
    {
        self.check_room(count)?;

        for _ in 0..count {
            let task = Task::new(kind, self.next_id[kind.index()]);
            let handle = self.start(task)?;
            self.next_id[kind.index()] += 1;
            self.spawned[kind.index()] += 1;
            self.roster.push((task, handle));
        }

        Ok(self.roster.len())
    }

    /// Spawns a whole partition, refusing it up front if it does not fit.
    pub fn spawn_partition(&mut self, partition: Partition) -> Result<usize>
    {
        self.check_room(partition.total())?;

        for kind in TaskKind::ALL {
            self.spawn(kind, partition.count(kind))?;
        }
        Ok(self.roster.len())
    }

    /// Waits for every task in the roster.
    ///
    /// All threads are joined even if one of them fails; the first failure
    /// is then reported.
    pub fn join_all(&mut self) -> Result<Vec<Outcome>>
    {
        let mut outcomes = Vec::with_capacity(self.roster.len());
        let mut failure = None;

        for (task, handle) in self.roster.drain(..) {
            match handle.join() {
                Ok(outcome) => outcomes.push(outcome),
                Err(payload) if failure.is_none() => {
                    failure = Some(Error::Join {
                        kind: task.kind,
                        id: task.id,
                        reason: panic_message(payload.as_ref()),
                    });
                }
                Err(_) => {}
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(outcomes),
        }
    }

    /// Puts an already running thread on the roster.
    #[cfg(test)]
    pub(crate) fn adopt(&mut self, task: Task, handle: JoinHandle<Outcome>)
    {
        self.roster.push((task, handle));
    }

    fn start(&self, task: Task) -> Result<JoinHandle<Outcome>>
    {
        let shared = Arc::clone(&self.shared);
        let echo = self.echo;

        thread::Builder::new()
            .name(format!("{}-{}", task.kind, task.id))
            .spawn(move || {
                let outcome = task.run(&shared);
                if echo {
                    println!("{}", outcome);
                }
                outcome
            })
            .map_err(|source| Error::Spawn {
                kind: task.kind,
                id: task.id,
                source,
            })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String
{
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "thread panicked".to_owned()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::shared::Policy;
    use rand::{rngs::StdRng, SeedableRng};

    fn pool(capacity: usize) -> WorkerPool
    {
        WorkerPool::new(Arc::new(Shared::new(Policy::ReaderPreferring)), capacity).unwrap()
    }

    #[test]
    fn random_partitions_stay_in_bounds()
    {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for total in 2..40 {
            for _ in 0..50 {
                let p = Partition::random(total, &mut rng).unwrap();
                assert!((1..=total / 2).contains(&p.incrementers), "{:?}", p);
                assert!((1..=total / 2).contains(&p.decrementers), "{:?}", p);
                assert_eq!(p.total(), total);
            }
        }
    }

    #[test]
    fn ids_are_scoped_to_kind()
    {
        let mut pool = pool(6);
        assert_eq!(pool.spawn(TaskKind::Increment, 2).unwrap(), 2);
        assert_eq!(pool.spawn(TaskKind::Read, 2).unwrap(), 4);
        assert_eq!(pool.spawn(TaskKind::Increment, 1).unwrap(), 5);

        let mut ids: Vec<_> = pool
            .join_all()
            .unwrap()
            .into_iter()
            .map(|o| (o.task.kind, o.task.id))
            .collect();
        ids.sort_by_key(|&(kind, id)| (kind.index(), id));

        assert_eq!(
            ids,
            vec![
                (TaskKind::Increment, 0),
                (TaskKind::Increment, 1),
                (TaskKind::Increment, 2),
                (TaskKind::Read, 0),
                (TaskKind::Read, 1),
            ]
        );
        assert!(pool.is_empty());
        assert_eq!(pool.spawned(TaskKind::Increment), 3);
    }

    #[test]
    fn overflowing_batch_spawns_nothing()
    {
        let mut pool = pool(3);
        pool.spawn(TaskKind::Read, 2).unwrap();

        let err = pool.spawn(TaskKind::Increment, 2).unwrap_err();
        assert!(matches!(
            err,
            Error::CapacityExceeded {
                requested: 4,
                capacity: 3
            }
        ));
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.spawned(TaskKind::Increment), 0);
        assert_eq!(pool.remaining(), 1);

        pool.join_all().unwrap();
    }

    #[test]
    fn overflowing_partition_spawns_nothing()
    {
        let mut pool = pool(10);
        let err = pool.spawn_partition(Partition::new(5, 5, 1)).unwrap_err();
        assert!(err.is_configuration());
        assert!(pool.is_empty());
        assert_eq!(pool.remaining(), 10);
    }

    #[test]
    fn random_partition_needs_two_tasks()
    {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(Partition::random(0, &mut rng), None);
        assert_eq!(Partition::random(1, &mut rng), None);
        assert_eq!(Partition::random(2, &mut rng), Some(Partition::new(1, 1, 0)));
    }

    #[test]
    fn huge_requests_do_not_wrap_past_capacity()
    {
        let mut pool = pool(2);
        pool.spawn(TaskKind::Read, 1).unwrap();

        assert!(matches!(
            pool.spawn(TaskKind::Read, usize::MAX),
            Err(Error::CapacityExceeded {
                requested: usize::MAX,
                capacity: 2
            })
        ));
        assert!(matches!(
            pool.spawn_partition(Partition::new(usize::MAX, 1, 0)),
            Err(Error::CapacityExceeded {
                requested: usize::MAX,
                capacity: 2
            })
        ));
        assert_eq!(Partition::new(usize::MAX, usize::MAX, 3).total(), usize::MAX);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.remaining(), 1);

        pool.join_all().unwrap();
    }

    #[test]
    fn join_reports_panics()
    {
        let mut pool = pool(2);
        pool.spawn(TaskKind::Read, 1).unwrap();
        pool.adopt(
            Task::new(TaskKind::Increment, 9),
            thread::spawn(|| -> Outcome { panic!("boom") }),
        );

        match pool.join_all() {
            Err(Error::Join { kind, id, reason }) => {
                assert_eq!((kind, id), (TaskKind::Increment, 9));
                assert_eq!(reason, "boom");
            }
            other => panic!("expected a join failure, got {:?}", other.map(|o| o.len())),
        }
        assert!(pool.is_empty());
    }
}
