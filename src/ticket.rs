//! # FIFO turnstile
//!
//! A ticket lock: every arriving thread draws the next ticket and waits until
//! it is being served, so threads get through in arrival order. Used as the
//! turnstile of [`Policy::Fair`](crate::Policy::Fair).
//!
//! Release is a plain store: only the holder may release, so nobody races
//! on `now_serving`.

use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::{Backoff, CachePadded};
use lock_api::{GuardSend, RawMutex};

pub struct RawTicketLock
{
    next_ticket: CachePadded<AtomicUsize>,
    now_serving: CachePadded<AtomicUsize>,
}

impl RawTicketLock
{
    pub const fn new() -> Self
    {
        Self {
            next_ticket: CachePadded::new(AtomicUsize::new(0)),
            now_serving: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// Number of threads holding or waiting for the lock.
    pub fn queued(&self) -> usize
    {
        let serving = self.now_serving.load(Ordering::Relaxed);
        self.next_ticket.load(Ordering::Relaxed).wrapping_sub(serving)
    }
}

impl Default for RawTicketLock
{
    fn default() -> Self { Self::new() }
}

unsafe impl RawMutex for RawTicketLock
{
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = Self::new();

    type GuardMarker = GuardSend;

    fn lock(&self)
    {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);

        let backoff = Backoff::new();
        while self.now_serving.load(Ordering::Acquire) != ticket {
            backoff.snooze();
        }
    }

    fn try_lock(&self) -> bool
    {
        let serving = self.now_serving.load(Ordering::Acquire);
        self.next_ticket
            .compare_exchange(serving, serving.wrapping_add(1), Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    unsafe fn unlock(&self)
    {
        let next = self.now_serving.load(Ordering::Relaxed).wrapping_add(1);
        self.now_serving.store(next, Ordering::Release);
    }

    fn is_locked(&self) -> bool { self.queued() != 0 }
}
