//! # The protected counter
//!
//! `SharedCounter` holds no synchronization of its own. It is stored inside
//! the Data lock of a [`Shared`](crate::Shared) context, so the only ways to
//! reach it are a `Writing` guard (mutable) or a `Reading` token (shared).

use std::fmt;

/// Integer state plus bookkeeping about the writers that touched it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedCounter
{
    sum: i64,
    last_incrementer: Option<usize>,
    last_decrementer: Option<usize>,
    writer_count: usize,
}

impl SharedCounter
{
    pub const fn new() -> Self
    {
        Self {
            sum: 0,
            last_incrementer: None,
            last_decrementer: None,
            writer_count: 0,
        }
    }

    /// Current value of the sum.
    pub fn read(&self) -> i64 { self.sum }

    /// Adds `delta` to the sum on behalf of `task_id` and returns the new sum.
    ///
    /// A positive delta records the task as the last incrementer, a negative
    /// one as the last decrementer. Every call counts as one write, a zero
    /// delta included.
    pub fn apply_write(&mut self, delta: i64, task_id: usize) -> i64
    {
        self.sum += delta;
        if delta > 0 {
            self.last_incrementer = Some(task_id);
        } else if delta < 0 {
            self.last_decrementer = Some(task_id);
        }
        self.writer_count += 1;
        self.sum
    }

    pub fn sum(&self) -> i64 { self.sum }

    pub fn last_incrementer(&self) -> Option<usize> { self.last_incrementer }

    pub fn last_decrementer(&self) -> Option<usize> { self.last_decrementer }

    /// Number of completed writes. Never decreases.
    pub fn writer_count(&self) -> usize { self.writer_count }
}

/// Writes a task id, or `none` when no task of that kind ever wrote.
pub(crate) struct WriterId(pub(crate) Option<usize>);

impl fmt::Display for WriterId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self.0 {
            Some(id) => write!(f, "{}", id),
            None => f.write_str("none"),
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn fresh_counter_has_no_writers()
    {
        let c = SharedCounter::new();
        assert_eq!(c.read(), 0);
        assert_eq!(c.last_incrementer(), None);
        assert_eq!(c.last_decrementer(), None);
        assert_eq!(c.writer_count(), 0);
        assert_eq!(c, SharedCounter::default());
    }

    #[test]
    fn writes_record_their_authors()
    {
        let mut c = SharedCounter::new();

        assert_eq!(c.apply_write(1, 4), 1);
        assert_eq!(c.apply_write(1, 2), 2);
        assert_eq!(c.apply_write(-1, 7), 1);

        assert_eq!(c.last_incrementer(), Some(2));
        assert_eq!(c.last_decrementer(), Some(7));
        assert_eq!(c.writer_count(), 3);
        assert_eq!(c.sum(), 1);
    }

    #[test]
    fn zero_delta_counts_but_names_nobody()
    {
        let mut c = SharedCounter::new();
        assert_eq!(c.apply_write(0, 3), 0);
        assert_eq!(c.writer_count(), 1);
        assert_eq!(c.last_incrementer(), None);
        assert_eq!(c.last_decrementer(), None);
    }

    #[test]
    fn writer_id_display()
    {
        assert_eq!(WriterId(Some(3)).to_string(), "3");
        assert_eq!(WriterId(None).to_string(), "none");
    }
}
