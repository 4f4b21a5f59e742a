use std::fmt;

use crate::shared::Shared;

/// What a worker does with its single turn at the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind
{
    Increment,
    Decrement,
    Read,
}

impl TaskKind
{
    pub const ALL: [TaskKind; 3] = [TaskKind::Increment, TaskKind::Decrement, TaskKind::Read];

    /// Change applied to the sum, `None` for readers.
    pub fn delta(self) -> Option<i64>
    {
        match self {
            TaskKind::Increment => Some(1),
            TaskKind::Decrement => Some(-1),
            TaskKind::Read => None,
        }
    }

    pub fn is_writer(self) -> bool { self.delta().is_some() }

    pub(crate) fn index(self) -> usize
    {
        match self {
            TaskKind::Increment => 0,
            TaskKind::Decrement => 1,
            TaskKind::Read => 2,
        }
    }
}

impl fmt::Display for TaskKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(match self {
            TaskKind::Increment => "incrementer",
            TaskKind::Decrement => "decrementer",
            TaskKind::Read => "reader",
        })
    }
}

/// A unit of work handed to exactly one thread.
///
/// `id` numbers tasks of the same kind from zero; an incrementer and a reader
/// may both be task 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task
{
    pub id: usize,
    pub kind: TaskKind,
}

impl Task
{
    pub fn new(kind: TaskKind, id: usize) -> Self { Self { id, kind } }

    /// Performs the task's one synchronized operation.
    pub fn run(self, shared: &Shared) -> Outcome
    {
        let value = match self.kind.delta() {
            Some(delta) => shared.writing().apply_write(delta, self.id),
            None => shared.reading().read(),
        };
        Outcome { task: self, value }
    }
}

/// The value a task saw (readers) or produced (writers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome
{
    pub task: Task,
    pub value: i64,
}

impl fmt::Display for Outcome
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let Task { id, kind } = self.task;
        match kind {
            TaskKind::Increment => write!(f, "Incrementer {} set sum = {}", id, self.value),
            TaskKind::Decrement => write!(f, "Decrementer {} set sum = {}", id, self.value),
            TaskKind::Read => write!(f, "Reader {} got {}", id, self.value),
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::shared::Policy;

    #[test]
    fn each_kind_runs_its_bracket()
    {
        let shared = Shared::new(Policy::ReaderPreferring);

        let inc = Task::new(TaskKind::Increment, 0).run(&shared);
        let inc2 = Task::new(TaskKind::Increment, 1).run(&shared);
        let dec = Task::new(TaskKind::Decrement, 0).run(&shared);
        let read = Task::new(TaskKind::Read, 0).run(&shared);

        assert_eq!((inc.value, inc2.value, dec.value, read.value), (1, 2, 1, 1));
        assert!(!shared.is_data_locked());
        assert_eq!(shared.active_readers(), 0);

        let counter = shared.into_counter();
        assert_eq!(counter.writer_count(), 3);
        assert_eq!(counter.last_incrementer(), Some(1));
        assert_eq!(counter.last_decrementer(), Some(0));
    }

    #[test]
    fn progress_lines()
    {
        let line = |kind, id, value| Outcome { task: Task::new(kind, id), value }.to_string();

        assert_eq!(line(TaskKind::Read, 2, -1), "Reader 2 got -1");
        assert_eq!(line(TaskKind::Increment, 0, 3), "Incrementer 0 set sum = 3");
        assert_eq!(line(TaskKind::Decrement, 4, 0), "Decrementer 4 set sum = 0");
    }

    #[test]
    fn kinds()
    {
        assert!(TaskKind::Increment.is_writer());
        assert!(TaskKind::Decrement.is_writer());
        assert!(!TaskKind::Read.is_writer());
        for (i, kind) in TaskKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }
}
