//! Event loop implementation.
//!
//! This module provides the event loop that futures schedule their reactions
//! on. It coordinates a task queue, a microtask queue and a virtual-clock
//! timer queue.

use crate::scheduler::{Scheduler, SchedulingMode};
use crate::task_queue::{Task, TaskQueue, TimerQueue};
use core_types::JsError;
use std::cell::{Cell, RefCell};

/// Default budget of turns for [`EventLoop::run_until_done`].
pub const DEFAULT_MAX_TURNS: usize = 100_000;

/// The event loop.
///
/// Each iteration (turn) of the loop:
/// 1. Takes the oldest task from the task queue and executes it; if the task
///    queue is empty, fires the earliest timer instead, advancing the clock
/// 2. Drains all microtasks, including ones queued while draining
/// 3. Repeats
///
/// The queues use interior mutability so that running tasks can schedule
/// further work. Share the loop as `Rc<EventLoop>`; it implements
/// [`Scheduler`], placing future reactions on the queue selected by its
/// [`SchedulingMode`].
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, Task};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let event_loop = EventLoop::new();
/// let ran = Rc::new(Cell::new(false));
///
/// let flag = ran.clone();
/// event_loop.enqueue_task(Task::new(move || {
///     flag.set(true);
///     Ok(())
/// }));
///
/// assert_eq!(event_loop.run_until_done().unwrap(), 1);
/// assert!(ran.get());
/// ```
#[derive(Debug)]
pub struct EventLoop {
    mode: SchedulingMode,
    max_turns: usize,
    task_queue: RefCell<TaskQueue>,
    microtask_queue: RefCell<TaskQueue>,
    timers: RefCell<TimerQueue>,
    clock: Cell<u64>,
}

impl EventLoop {
    /// Creates a new EventLoop with empty queues, macrotask scheduling and
    /// the default turn budget.
    pub fn new() -> Self {
        Self {
            mode: SchedulingMode::default(),
            max_turns: DEFAULT_MAX_TURNS,
            task_queue: RefCell::new(TaskQueue::new()),
            microtask_queue: RefCell::new(TaskQueue::new()),
            timers: RefCell::new(TimerQueue::new()),
            clock: Cell::new(0),
        }
    }

    /// Sets the queue that scheduled future reactions go to.
    pub fn with_mode(mut self, mode: SchedulingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the turn budget.
    ///
    /// A single microtask drain is bounded by the same number of microtasks.
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// The scheduling mode in effect.
    pub fn mode(&self) -> SchedulingMode {
        self.mode
    }

    /// The turn budget in effect.
    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.clock.get()
    }

    /// Adds a task to the task queue.
    pub fn enqueue_task(&self, task: Task) {
        self.task_queue.borrow_mut().enqueue(task);
    }

    /// Adds a microtask to the microtask queue.
    pub fn enqueue_microtask(&self, microtask: Task) {
        self.microtask_queue.borrow_mut().enqueue(microtask);
    }

    /// Schedules `task` to run once `delay_ms` of virtual time has passed.
    ///
    /// Timers only fire when both queues are empty; the clock then jumps to
    /// the timer's due time. A zero delay therefore does not interleave with
    /// queued tasks: `set_timeout(0, a)` followed by a macrotask-mode future
    /// reaction `b` runs `b` first. Use [`enqueue_task`](Self::enqueue_task)
    /// for strict FIFO order with reactions.
    pub fn set_timeout(&self, delay_ms: u64, task: Task) {
        let due = self.clock.get().saturating_add(delay_ms);
        self.timers.borrow_mut().insert(due, task);
    }

    /// Returns true if the task queue is empty.
    pub fn is_task_queue_empty(&self) -> bool {
        self.task_queue.borrow().is_empty()
    }

    /// Returns true if the microtask queue is empty.
    pub fn is_microtask_queue_empty(&self) -> bool {
        self.microtask_queue.borrow().is_empty()
    }

    /// Number of queued tasks, microtasks and timers.
    pub fn pending_tasks(&self) -> usize {
        self.task_queue.borrow().len()
            + self.microtask_queue.borrow().len()
            + self.timers.borrow().len()
    }

    /// Returns true if there is nothing left to run.
    pub fn is_idle(&self) -> bool {
        self.pending_tasks() == 0
    }

    /// Runs the event loop until all tasks, microtasks and timers are processed.
    ///
    /// # Returns
    ///
    /// The number of tasks and microtasks executed, or the first error raised
    /// by a task. Exceeding the turn budget is an `InternalError`.
    pub fn run_until_done(&self) -> Result<usize, JsError> {
        let mut executed = 0;
        let mut turns = 0;
        while !self.is_idle() {
            if turns >= self.max_turns {
                log::warn!(
                    "event loop exceeded {} turns with {} tasks pending",
                    self.max_turns,
                    self.pending_tasks()
                );
                return Err(JsError::internal(format!(
                    "event loop exceeded {} turns",
                    self.max_turns
                )));
            }
            turns += 1;
            executed += self.process_one_cycle()?;
        }
        Ok(executed)
    }

    /// Processes one complete cycle: one task followed by all microtasks.
    ///
    /// Returns the number of tasks and microtasks executed.
    pub fn process_one_cycle(&self) -> Result<usize, JsError> {
        let mut executed = 0;
        if let Some(task) = self.next_task() {
            log::trace!("running task at t={}ms", self.now());
            task.run()?;
            executed += 1;
        }
        Ok(executed + self.run_all_microtasks()?)
    }

    /// Runs all microtasks in the queue until empty.
    ///
    /// New microtasks added during execution are also processed before this
    /// method returns.
    pub fn run_all_microtasks(&self) -> Result<usize, JsError> {
        let mut executed = 0;
        loop {
            // The borrow must end before the microtask runs: it may enqueue more.
            let next = self.microtask_queue.borrow_mut().dequeue();
            let Some(microtask) = next else {
                return Ok(executed);
            };
            if executed >= self.max_turns {
                log::warn!("microtask drain exceeded {} microtasks", self.max_turns);
                return Err(JsError::internal(format!(
                    "microtask drain exceeded {} microtasks",
                    self.max_turns
                )));
            }
            microtask.run()?;
            executed += 1;
        }
    }

    /// Runs all tasks in the queue (without processing microtasks between them).
    ///
    /// Timers are not fired. This is primarily for testing purposes.
    pub fn run_all_tasks(&self) -> Result<usize, JsError> {
        let mut executed = 0;
        loop {
            let next = self.task_queue.borrow_mut().dequeue();
            match next {
                Some(task) => {
                    task.run()?;
                    executed += 1;
                }
                None => return Ok(executed),
            }
        }
    }

    fn next_task(&self) -> Option<Task> {
        let queued = self.task_queue.borrow_mut().dequeue();
        if queued.is_some() || !self.is_microtask_queue_empty() {
            return queued;
        }
        let (due, task) = self.timers.borrow_mut().pop()?;
        if due > self.clock.get() {
            self.clock.set(due);
        }
        Some(task)
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for EventLoop {
    fn schedule(&self, task: Task) {
        match self.mode {
            SchedulingMode::Macrotask => self.enqueue_task(task),
            SchedulingMode::Microtask => self.enqueue_microtask(task),
        }
    }
}
