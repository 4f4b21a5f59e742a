//! # The shared context
//!
//! `Shared` owns everything the workers synchronize on: the Data lock with
//! the counter inside it, the reader admission gate and the turnstile used by
//! [`Policy::Fair`]. One `Shared` is created per run and handed to every task
//! behind an `Arc`; nothing here is global.
//!
//! Access goes through two kinds of tokens:
//!
//! * [`Writing`] is the Data lock's guard. It is the only way to get a
//!   `&mut SharedCounter`.
//! * [`Reading`] is a reader's ticket into the current reader group. While any
//!   `Reading` exists the group holds the Data lock, so it derefs to
//!   `&SharedCounter`.

use std::{fmt, ops::Deref, str::FromStr};

use crate::{
    admission::ReaderAdmission, counter::SharedCounter, error::Error, semaphore::RawSemaphore,
    ticket::RawTicketLock,
};

pub(crate) type DataLock = lock_api::Mutex<RawSemaphore, SharedCounter>;

/// Exclusive access to the counter. Dropping it releases the Data lock.
pub type Writing<'a> = lock_api::MutexGuard<'a, RawSemaphore, SharedCounter>;

type Turn<'a> = lock_api::MutexGuard<'a, RawTicketLock, ()>;

/// Which side of the readers–writers protocol gets through first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Policy
{
    /// First-reader / last-reader protocol. A steady stream of overlapping
    /// readers can hold a writer off indefinitely.
    #[default]
    ReaderPreferring,

    /// Everyone queues on a FIFO turnstile before entering. A writer waiting
    /// for the Data lock keeps the turnstile, so later readers queue behind
    /// it instead of joining the current reader group.
    Fair,
}

impl fmt::Display for Policy
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(match self {
            Policy::ReaderPreferring => "reader",
            Policy::Fair => "fair",
        })
    }
}

impl FromStr for Policy
{
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.trim().to_ascii_lowercase().as_str() {
            "reader" | "reader-preferring" => Ok(Policy::ReaderPreferring),
            "fair" => Ok(Policy::Fair),
            _ => Err(Error::UnknownPolicy(s.to_owned())),
        }
    }
}

pub struct Shared
{
    data: DataLock,
    admission: ReaderAdmission,
    turnstile: lock_api::Mutex<RawTicketLock, ()>,
    policy: Policy,
}

impl Shared
{
    pub fn new(policy: Policy) -> Self
    {
        Self {
            data: DataLock::new(SharedCounter::new()),
            admission: ReaderAdmission::new(),
            turnstile: lock_api::Mutex::new(()),
            policy,
        }
    }

    pub fn policy(&self) -> Policy { self.policy }

    /// Joins the reader group, blocking if a writer holds the Data lock and
    /// this reader would be the first of a new epoch.
    pub fn reading(&self) -> Reading<'_>
    {
        let turn = self.take_turn();
        // The group's hold on the Data lock is not tied to any guard: it is
        // released by whichever `Reading` drops last.
        self.admission.enter(unsafe { self.data.raw() });
        drop(turn);
        Reading { shared: self }
    }

    /// Takes the Data lock exclusively.
    pub fn writing(&self) -> Writing<'_>
    {
        let turn = self.take_turn();
        let guard = self.data.lock();
        drop(turn);
        guard
    }

    /// Non-blocking writer acquisition. Ignores the turnstile.
    pub fn try_writing(&self) -> Option<Writing<'_>> { self.data.try_lock() }

    /// Readers currently inside the reader group.
    pub fn active_readers(&self) -> usize { self.admission.active_readers() }

    /// Whether a writer or the reader group currently holds the Data lock.
    pub fn is_data_locked(&self) -> bool { self.data.is_locked() }

    /// Threads holding or queued on the fair turnstile. Always zero under
    /// `Policy::ReaderPreferring`.
    pub fn queued(&self) -> usize { unsafe { self.turnstile.raw() }.queued() }

    /// Consumes the context once no task can reach it any more.
    pub fn into_counter(self) -> SharedCounter { self.data.into_inner() }

    fn rejoin(&self) -> Reading<'_>
    {
        // A live `Reading` keeps the count above zero, so `enter` never
        // reaches the Data lock here and the turnstile is not needed.
        self.admission.enter(unsafe { self.data.raw() });
        Reading { shared: self }
    }

    fn take_turn(&self) -> Option<Turn<'_>>
    {
        match self.policy {
            Policy::ReaderPreferring => None,
            Policy::Fair => Some(self.turnstile.lock()),
        }
    }
}

impl Default for Shared
{
    fn default() -> Self { Self::new(Policy::default()) }
}

impl fmt::Debug for Shared
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Shared")
            .field("policy", &self.policy)
            .field("data_locked", &self.is_data_locked())
            .finish()
    }
}

/// Membership in the current reader group.
///
/// Dropping it lets the reader out; the last one out releases the Data lock.
#[must_use = "the reader leaves the group as soon as the token is dropped"]
pub struct Reading<'a>
{
    shared: &'a Shared,
}

impl<'a> Reading<'a>
{
    /// Joins the same reader group again. Never blocks on the Data lock,
    /// since the group already holds it.
    pub fn also(&self) -> Reading<'a> { self.shared.rejoin() }
}

impl Deref for Reading<'_>
{
    type Target = SharedCounter;

    fn deref(&self) -> &SharedCounter
    {
        // The reader group holds the Data lock for as long as this token
        // lives, so no `Writing` can exist.
        unsafe { &*self.shared.data.data_ptr() }
    }
}

impl Drop for Reading<'_>
{
    fn drop(&mut self)
    {
        unsafe {
            self.shared.admission.leave(self.shared.data.raw());
        }
    }
}

impl fmt::Debug for Reading<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Reading").field("sum", &self.read()).finish()
    }
}
