//! # Binary semaphore
//!
//! The Data lock has to be released by whoever holds it *logically*. For a
//! writer that is the writer thread; for the reader group it is whichever
//! reader leaves last, usually not the one that came in first. A plain mutex
//! forbids that, so the Data lock is a binary semaphore: a flag guarded by a
//! `parking_lot` mutex, with a condition variable for the waiters.
//!
//! It implements `lock_api::RawMutex` with `GuardSend`, so
//! `lock_api::Mutex<RawSemaphore, T>` hands out guards that may be dropped on
//! any thread.

use std::mem;

use lock_api::{GuardSend, RawMutex};
use parking_lot::{Condvar, Mutex};

pub struct RawSemaphore
{
    available: Mutex<bool>,
    released: Condvar,
}

impl RawSemaphore
{
    pub const fn new() -> Self
    {
        Self {
            available: parking_lot::const_mutex(true),
            released: Condvar::new(),
        }
    }
}

impl Default for RawSemaphore
{
    fn default() -> Self { Self::new() }
}

unsafe impl RawMutex for RawSemaphore
{
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = Self::new();

    type GuardMarker = GuardSend;

    fn lock(&self)
    {
        let mut available = self.available.lock();
        while !*available {
            self.released.wait(&mut available);
        }
        *available = false;
    }

    fn try_lock(&self) -> bool { mem::replace(&mut *self.available.lock(), false) }

    unsafe fn unlock(&self)
    {
        let mut available = self.available.lock();
        debug_assert!(!*available, "released a semaphore nobody held");
        *available = true;
        drop(available);
        self.released.notify_one();
    }

    fn is_locked(&self) -> bool { !*self.available.lock() }
}
