//! The deferred-execution contract futures depend on.

use crate::task_queue::Task;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

/// Runs actions after the current synchronous execution completes.
///
/// Implementations must preserve FIFO order among scheduled tasks and must
/// never run a task from inside `schedule` itself. Futures rely on this to
/// guarantee that a handler never runs before `then` has returned.
pub trait Scheduler {
    /// Queues `task` for deferred execution.
    fn schedule(&self, task: Task);
}

/// Shared handle to a scheduler, held by every future.
pub type SchedulerRef = Rc<dyn Scheduler>;

/// Which queue of the event loop receives scheduled future reactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulingMode {
    /// Reactions run as ordinary tasks, one per event-loop turn, like a
    /// zero-delay timer.
    #[default]
    Macrotask,
    /// Reactions run as microtasks, drained after the current task.
    Microtask,
}

impl fmt::Display for SchedulingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulingMode::Macrotask => f.write_str("macrotask"),
            SchedulingMode::Microtask => f.write_str("microtask"),
        }
    }
}

impl FromStr for SchedulingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "macrotask" | "task" => Ok(SchedulingMode::Macrotask),
            "microtask" => Ok(SchedulingMode::Microtask),
            other => Err(format!("unknown scheduling mode: {}", other)),
        }
    }
}
