//! # Reader admission
//!
//! The first-reader / last-reader gate. Readers never take the Data lock one
//! by one: the first reader of an epoch takes it for the whole group and the
//! last reader of the epoch gives it back.
//!
//! The count lives behind its own `parking_lot` mutex (the admission lock).
//! The first reader blocks on the Data lock while still holding the
//! admission lock; this is the only nested acquisition and it always happens
//! in the order admission → Data.

use lock_api::{GuardSend, RawMutex};
use parking_lot::Mutex;

#[derive(Debug, Default)]
pub struct ReaderAdmission
{
    active_readers: Mutex<usize>,
}

impl ReaderAdmission
{
    pub const fn new() -> Self
    {
        Self {
            active_readers: parking_lot::const_mutex(0),
        }
    }

    /// Admits one reader. Returns `true` if this reader opened a new epoch,
    /// i.e. acquired `data` on behalf of the group.
    pub fn enter<R>(&self, data: &R) -> bool
    where
        R: RawMutex<GuardMarker = GuardSend>,
    {
        let mut readers = self.active_readers.lock();
        *readers += 1;
        let first = *readers == 1;
        if first {
            data.lock();
        }
        first
    }

    /// Lets one reader out. Returns `true` if this reader closed the epoch,
    /// i.e. released `data` on behalf of the group.
    ///
    /// # Safety
    ///
    /// The caller must be a reader admitted by a matching [`enter`] on the
    /// same `data`, not yet let out.
    ///
    /// [`enter`]: ReaderAdmission::enter
    pub unsafe fn leave<R>(&self, data: &R) -> bool
    where
        R: RawMutex<GuardMarker = GuardSend>,
    {
        let mut readers = self.active_readers.lock();
        debug_assert!(*readers > 0, "reader left without entering");
        *readers -= 1;
        let last = *readers == 0;
        if last {
            data.unlock();
        }
        last
    }

    /// Readers currently between `enter` and `leave`.
    pub fn active_readers(&self) -> usize { *self.active_readers.lock() }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::semaphore::RawSemaphore;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn one_epoch_one_acquisition()
    {
        let data = RawSemaphore::new();
        let gate = ReaderAdmission::new();

        assert!(gate.enter(&data));
        assert!(data.is_locked());
        assert!(!gate.enter(&data));
        assert!(!gate.enter(&data));
        assert_eq!(gate.active_readers(), 3);

        unsafe {
            assert!(!gate.leave(&data));
            assert!(!gate.leave(&data));
            assert!(data.is_locked());
            assert!(gate.leave(&data));
        }
        assert!(!data.is_locked());
        assert_eq!(gate.active_readers(), 0);
    }

    #[test]
    fn first_reader_waits_for_writer()
    {
        let data = Arc::new(RawSemaphore::new());
        let gate = Arc::new(ReaderAdmission::new());

        // Writer holds the Data lock.
        data.lock();

        let reader = {
            let data = Arc::clone(&data);
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                let first = gate.enter(&*data);
                unsafe { gate.leave(&*data) };
                first
            })
        };

        // The reader parks on the Data lock while holding the admission lock.
        thread::sleep(Duration::from_millis(20));
        assert!(!reader.is_finished());

        unsafe { data.unlock() }
        assert!(reader.join().unwrap());
        assert!(!data.is_locked());
    }

    #[test]
    fn last_out_need_not_be_first_in()
    {
        let data = Arc::new(RawSemaphore::new());
        let gate = Arc::new(ReaderAdmission::new());

        assert!(gate.enter(&*data));

        let late = {
            let data = Arc::clone(&data);
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                assert!(!gate.enter(&*data));
                data
            })
        };
        let data = late.join().unwrap();

        unsafe {
            assert!(!gate.leave(&*data));
        }

        let gate2 = Arc::clone(&gate);
        let data2 = Arc::clone(&data);
        let closed = thread::spawn(move || unsafe { gate2.leave(&*data2) })
            .join()
            .unwrap();

        assert!(closed);
        assert!(!data.is_locked());
    }
}
