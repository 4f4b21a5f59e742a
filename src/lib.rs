//! A counter shared by readers and writers, guarded by the classic
//! first-reader / last-reader protocol.
//!
//! Writers (incrementers and decrementers) take the Data lock for themselves.
//! Readers take it as a group: the first reader in acquires it, the last one
//! out releases it, and everyone in between reads concurrently. A reader gate
//! (the admission lock) serializes the group's head count.
//!
//! The counter is only reachable through tokens that prove the lock is held:
//! [`Writing`] for exclusive access, [`Reading`] for group access. Everything
//! lives in an owned [`Shared`] context; there is no global state.
//!
//! ```
//! use rwsum::{Config, Partition, Session};
//!
//! let mut session = Session::open(&Config::new(10))?;
//! let summary = session.run(Partition::new(3, 2, 5))?;
//!
//! assert_eq!(summary.counter.sum(), 1);
//! assert_eq!(summary.counter.writer_count(), 5);
//! # Ok::<(), rwsum::Error>(())
//! ```
//!
//! The default protocol prefers readers: a steady stream of overlapping
//! readers can keep a writer waiting forever. [`Policy::Fair`] queues readers
//! and writers on a FIFO turnstile instead.

pub mod admission;
pub mod config;
pub mod counter;
pub mod error;
pub mod lifecycle;
pub mod output;
pub mod pool;
pub mod semaphore;
pub mod shared;
pub mod task;
pub mod ticket;


pub use config::Config;
pub use counter::SharedCounter;
pub use error::{Error, Result};
pub use lifecycle::{Session, State, Summary};
pub use pool::{Partition, WorkerPool};
pub use shared::{Policy, Reading, Shared, Writing};
pub use task::{Outcome, Task, TaskKind};
