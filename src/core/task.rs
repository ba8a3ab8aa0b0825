//=========================================================================
// Tasks
//=========================================================================
//
// One-shot completion handles for asynchronous collaborators.
//
// Architecture:
//   collaborator ── Task::pending() ──> (Task, TaskCompleter)
//        │                                 │
//        └─ keeps TaskCompleter            └─ Task returned to orchestrator
//
//   TaskCompleter::complete(value) ──> bounded(1) channel ──> Task::poll()
//
// The orchestrator never blocks on a task. It polls once per tick and
// suspends the pipeline while the task reports `Pending`.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::{Arc, Weak};

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};

//=== Internal Dependencies ===============================================

use crate::core::error::HookError;

//=== Aliases =============================================================

/// Task returned by scene and node hooks.
pub type HookTask = Task<Result<(), HookError>>;

//=== TaskPoll ============================================================

/// Result of polling a [`Task`].
#[derive(Debug, PartialEq, Eq)]
pub enum TaskPoll<T> {
    /// The producer has not delivered a value yet.
    Pending,

    /// The value is available. A task yields its value exactly once.
    Ready(T),

    /// The producer dropped its completer without delivering a value, or
    /// the value was already taken.
    Abandoned,
}

//=== Task ================================================================

/// Consumer side of a one-shot asynchronous result.
///
/// Create an already finished task with [`Task::ready`] or a pending one
/// with [`Task::pending`], which also returns the [`TaskCompleter`] the
/// producer uses to deliver the value later.
#[derive(Debug)]
pub struct Task<T> {
    state: TaskState<T>,
}

#[derive(Debug)]
enum TaskState<T> {
    Ready(Option<T>),
    // The Arc is the liveness token the completer watches.
    Pending(Receiver<T>, Arc<()>),
}

impl<T> Task<T> {
    /// Creates a task that is already complete.
    pub fn ready(value: T) -> Self {
        Self {
            state: TaskState::Ready(Some(value)),
        }
    }

    /// Creates a pending task and the completer that resolves it.
    pub fn pending() -> (Self, TaskCompleter<T>) {
        let (sender, receiver) = bounded(1);
        let alive = Arc::new(());
        let completer = TaskCompleter {
            sender,
            alive: Arc::downgrade(&alive),
        };
        let task = Self {
            state: TaskState::Pending(receiver, alive),
        };
        (task, completer)
    }

    /// Polls the task without blocking.
    pub fn poll(&mut self) -> TaskPoll<T> {
        match &mut self.state {
            TaskState::Ready(value) => match value.take() {
                Some(value) => TaskPoll::Ready(value),
                None => TaskPoll::Abandoned,
            },
            TaskState::Pending(receiver, _) => match receiver.try_recv() {
                Ok(value) => {
                    self.state = TaskState::Ready(None);
                    TaskPoll::Ready(value)
                }
                Err(TryRecvError::Empty) => TaskPoll::Pending,
                Err(TryRecvError::Disconnected) => TaskPoll::Abandoned,
            },
        }
    }
}

impl Task<()> {
    /// Creates a finished unit task.
    pub fn done() -> Self {
        Self::ready(())
    }
}

impl HookTask {
    /// Creates a hook task that finished successfully.
    pub fn ok() -> Self {
        Self::ready(Ok(()))
    }

    /// Creates a hook task that finished with an error.
    pub fn failed(error: HookError) -> Self {
        Self::ready(Err(error))
    }
}

//=== TaskCompleter =======================================================

/// Producer side of a [`Task`].
///
/// Dropping a completer without calling [`TaskCompleter::complete`]
/// abandons the task.
#[derive(Debug)]
pub struct TaskCompleter<T> {
    sender: Sender<T>,
    alive: Weak<()>,
}

impl<T> TaskCompleter<T> {
    /// Delivers the value. Does nothing if the task was already dropped.
    pub fn complete(self, value: T) {
        let _ = self.sender.send(value);
    }

    /// Returns true if the consuming task has been dropped.
    pub fn is_cancelled(&self) -> bool {
        self.alive.strong_count() == 0
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_task_yields_once() {
        let mut task = Task::ready(7);

        assert_eq!(task.poll(), TaskPoll::Ready(7));
        assert_eq!(task.poll(), TaskPoll::Abandoned);
    }

    #[test]
    fn pending_task_resolves_after_complete() {
        let (mut task, completer) = Task::pending();

        assert_eq!(task.poll(), TaskPoll::Pending);
        assert_eq!(task.poll(), TaskPoll::Pending);

        completer.complete("loaded");

        assert_eq!(task.poll(), TaskPoll::Ready("loaded"));
        assert_eq!(task.poll(), TaskPoll::Abandoned);
    }

    #[test]
    fn dropped_completer_abandons_task() {
        let (mut task, completer) = Task::<u32>::pending();
        drop(completer);

        assert_eq!(task.poll(), TaskPoll::Abandoned);
    }

    #[test]
    fn completer_sees_dropped_task() {
        let (task, completer) = Task::<u32>::pending();
        assert!(!completer.is_cancelled());

        drop(task);

        assert!(completer.is_cancelled());
        completer.complete(1);
    }

    #[test]
    fn hook_task_helpers() {
        let mut ok = HookTask::ok();
        assert_eq!(ok.poll(), TaskPoll::Ready(Ok(())));

        let mut failed = HookTask::failed(HookError::new("boom"));
        assert_eq!(failed.poll(), TaskPoll::Ready(Err(HookError::new("boom"))));
    }
}
