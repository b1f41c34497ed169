//! Future implementation following the Promise/A+ specification.
//!
//! A [`Future`] is a single-assignment container for the eventual outcome of
//! an asynchronous operation. It settles at most once, either fulfilled with
//! a value or rejected with a reason, and every continuation registered with
//! [`Future::then`] runs through the future's [`Scheduler`], never inside
//! the caller's own call stack.
//!
//! [`Scheduler`]: crate::Scheduler

use crate::resolution::resolve_future;
use crate::scheduler::SchedulerRef;
use crate::task_queue::Task;
use core_types::{Function, HostObject, JsError, Value};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_FUTURE_ID: AtomicU64 = AtomicU64::new(1);

/// The state of a Future.
///
/// Once settled (Fulfilled or Rejected), a Future cannot change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FutureState {
    /// The initial state; the future is neither fulfilled nor rejected.
    Pending,
    /// The future has been fulfilled with a value.
    Fulfilled,
    /// The future has been rejected with a reason.
    Rejected,
}

/// Continuation receiving the settled payload.
type Reaction = Box<dyn FnOnce(Value)>;

struct Inner {
    state: FutureState,
    value: Option<Value>,
    reason: Option<Value>,
    fulfill_callbacks: Vec<Reaction>,
    reject_callbacks: Vec<Reaction>,
}

/// Shared state behind a [`Future`] handle.
///
/// The two settle operations are crate-private: user code reaches them only
/// through the [`Resolver`] handed to an initializer.
pub(crate) struct FutureCell {
    id: u64,
    scheduler: SchedulerRef,
    inner: RefCell<Inner>,
}

impl FutureCell {
    pub(crate) fn fulfill(&self, value: Value) {
        self.settle(FutureState::Fulfilled, value);
    }

    pub(crate) fn reject(&self, reason: Value) {
        self.settle(FutureState::Rejected, reason);
    }

    fn settle(&self, state: FutureState, payload: Value) {
        let callbacks = {
            let mut inner = self.inner.borrow_mut();
            if inner.state != FutureState::Pending {
                log::trace!(
                    "future#{} already {:?}, ignoring {:?}",
                    self.id,
                    inner.state,
                    state
                );
                return;
            }
            inner.state = state;
            let (taken, dropped) = if state == FutureState::Fulfilled {
                inner.value = Some(payload.clone());
                (
                    std::mem::take(&mut inner.fulfill_callbacks),
                    std::mem::take(&mut inner.reject_callbacks),
                )
            } else {
                inner.reason = Some(payload.clone());
                (
                    std::mem::take(&mut inner.reject_callbacks),
                    std::mem::take(&mut inner.fulfill_callbacks),
                )
            };
            drop(dropped);
            taken
        };
        log::trace!(
            "future#{} {:?} with {:?}, {} reactions",
            self.id,
            state,
            payload,
            callbacks.len()
        );
        for callback in callbacks {
            callback(payload.clone());
        }
    }

    /// Registers reactions; they are called immediately if already settled.
    fn subscribe(&self, on_fulfilled: Reaction, on_rejected: Reaction) {
        let mut inner = self.inner.borrow_mut();
        match inner.state {
            FutureState::Pending => {
                inner.fulfill_callbacks.push(on_fulfilled);
                inner.reject_callbacks.push(on_rejected);
            }
            FutureState::Fulfilled => {
                let value = inner.value.clone().unwrap_or_default();
                drop(inner);
                on_fulfilled(value);
            }
            FutureState::Rejected => {
                let reason = inner.reason.clone().unwrap_or_default();
                drop(inner);
                on_rejected(reason);
            }
        }
    }
}

impl HostObject for FutureCell {
    fn class_name(&self) -> &str {
        "Future"
    }

    fn get(&self, key: &str) -> Result<Value, Value> {
        let method = match key {
            "then" => Function::method(|this, args| {
                let future = receiver(this, "then")?;
                Ok(future.then(function_arg(args, 0), function_arg(args, 1)).into())
            }),
            "catch" => Function::method(|this, args| {
                let future = receiver(this, "catch")?;
                Ok(future.catch(function_arg(args, 0)).into())
            }),
            "finally" => Function::method(|this, args| {
                let future = receiver(this, "finally")?;
                Ok(future.finally(function_arg(args, 0)).into())
            }),
            _ => return Ok(Value::Undefined),
        };
        Ok(method.named(key).into())
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

fn receiver(this: &Value, method: &str) -> Result<Future, Value> {
    Future::from_value(this).ok_or_else(|| {
        JsError::type_error(format!(
            "Future.prototype.{} called on incompatible receiver {}",
            method, this
        ))
        .into()
    })
}

fn function_arg(args: &[Value], index: usize) -> Option<Function> {
    args.get(index).and_then(Value::as_function).cloned()
}

/// A deferred value.
///
/// `Future` is a cheap, cloneable handle; clones refer to the same future.
/// Futures are single-threaded (`!Send`) and hold the [`SchedulerRef`] their
/// reactions are queued on; futures derived through `then`, `catch` and
/// `finally` inherit it.
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, Future, FutureState};
/// use core_types::{Function, Value};
/// use std::rc::Rc;
///
/// let event_loop = Rc::new(EventLoop::new());
///
/// let future = Future::new(event_loop.clone(), |resolver| {
///     resolver.resolve(Value::Smi(1));
///     Ok(())
/// });
/// let next = future.then(
///     Some(Function::new(|args| match args[0] {
///         Value::Smi(n) => Ok(Value::Smi(n + 1)),
///         _ => Err(Value::from("not a number")),
///     })),
///     None,
/// );
///
/// // Handlers never run synchronously.
/// assert_eq!(next.state(), FutureState::Pending);
///
/// event_loop.run_until_done().unwrap();
/// assert_eq!(next.value(), Some(Value::Smi(2)));
/// ```
#[derive(Clone)]
pub struct Future {
    pub(crate) cell: Rc<FutureCell>,
}

impl Future {
    /// Creates a future and runs `initializer` synchronously.
    ///
    /// The initializer receives the future's [`Resolver`]. Returning `Err`
    /// rejects the future with the thrown value, unless it has already been
    /// resolved.
    pub fn new<F>(scheduler: SchedulerRef, initializer: F) -> Future
    where
        F: FnOnce(&Resolver) -> Result<(), Value>,
    {
        let future = Future::pending(scheduler);
        let resolver = Resolver::new(future.clone());
        if let Err(reason) = initializer(&resolver) {
            resolver.reject(reason);
        }
        future
    }

    pub(crate) fn pending(scheduler: SchedulerRef) -> Future {
        let id = NEXT_FUTURE_ID.fetch_add(1, Ordering::Relaxed);
        log::trace!("future#{} created", id);
        Future {
            cell: Rc::new(FutureCell {
                id,
                scheduler,
                inner: RefCell::new(Inner {
                    state: FutureState::Pending,
                    value: None,
                    reason: None,
                    fulfill_callbacks: Vec::new(),
                    reject_callbacks: Vec::new(),
                }),
            }),
        }
    }

    /// Returns `value` itself if it already holds a `Future`, otherwise a new
    /// future resolved with `value`.
    ///
    /// A foreign thenable is adopted rather than stored as the fulfillment
    /// value.
    pub fn resolve(scheduler: SchedulerRef, value: Value) -> Future {
        if let Some(future) = Future::from_value(&value) {
            return future;
        }
        Future::new(scheduler, move |resolver| {
            resolver.resolve(value);
            Ok(())
        })
    }

    /// Returns a new future already rejected with `reason`.
    pub fn reject(scheduler: SchedulerRef, reason: Value) -> Future {
        Future::new(scheduler, move |resolver| {
            resolver.reject(reason);
            Ok(())
        })
    }

    /// Registers continuations and returns the downstream future.
    ///
    /// A missing `on_fulfilled` passes the value through; a missing
    /// `on_rejected` re-raises the reason. The handler's return value is fed
    /// to the resolution procedure against the downstream future; a thrown
    /// value rejects it.
    pub fn then(&self, on_fulfilled: Option<Function>, on_rejected: Option<Function>) -> Future {
        let downstream = Future::pending(self.cell.scheduler.clone());
        let fulfilled_target = downstream.clone();
        let rejected_target = downstream.clone();
        self.when_settled(
            move |value| run_handler(&fulfilled_target, on_fulfilled.as_ref(), Ok(value)),
            move |reason| run_handler(&rejected_target, on_rejected.as_ref(), Err(reason)),
        );
        downstream
    }

    /// Shorthand for `then(None, on_rejected)`.
    pub fn catch(&self, on_rejected: Option<Function>) -> Future {
        self.then(None, on_rejected)
    }

    /// Runs `on_settled` on either outcome, then forwards the original outcome.
    ///
    /// If `on_settled` returns a future (or any thenable), forwarding waits
    /// for it. If `on_settled` throws, or what it returned rejects, that
    /// rejection replaces the original outcome.
    pub fn finally(&self, on_settled: Option<Function>) -> Future {
        let Some(on_settled) = on_settled else {
            return self.then(None, None);
        };
        let on_fulfilled = settled_then(self.cell.scheduler.clone(), on_settled.clone(), Ok);
        let on_rejected = settled_then(self.cell.scheduler.clone(), on_settled, Err);
        self.then(Some(on_fulfilled), Some(on_rejected))
    }

    /// Schedules `on_fulfilled` or `on_rejected` once this future settles.
    ///
    /// The chosen continuation always runs as a scheduled task, even when the
    /// future is already settled.
    pub(crate) fn when_settled<F, R>(&self, on_fulfilled: F, on_rejected: R)
    where
        F: FnOnce(Value) + 'static,
        R: FnOnce(Value) + 'static,
    {
        self.cell.subscribe(
            deferred(self.cell.scheduler.clone(), on_fulfilled),
            deferred(self.cell.scheduler.clone(), on_rejected),
        );
    }

    /// Current state.
    pub fn state(&self) -> FutureState {
        self.cell.inner.borrow().state
    }

    /// Returns true while the future has not settled.
    pub fn is_pending(&self) -> bool {
        self.state() == FutureState::Pending
    }

    /// The fulfillment value, if fulfilled.
    pub fn value(&self) -> Option<Value> {
        self.cell.inner.borrow().value.clone()
    }

    /// The rejection reason, if rejected.
    pub fn reason(&self) -> Option<Value> {
        self.cell.inner.borrow().reason.clone()
    }

    /// Process-unique identifier, as used in log lines.
    pub fn id(&self) -> u64 {
        self.cell.id
    }

    /// Returns true if both handles refer to the same future.
    pub fn ptr_eq(&self, other: &Future) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    /// Wraps this future as a thenable object value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.cell.clone())
    }

    /// Recovers the future held by `value`, if any.
    pub fn from_value(value: &Value) -> Option<Future> {
        match value {
            Value::Object(obj) => obj
                .clone()
                .into_any()
                .downcast::<FutureCell>()
                .ok()
                .map(|cell| Future { cell }),
            _ => None,
        }
    }
}

impl From<Future> for Value {
    fn from(future: Future) -> Self {
        Value::Object(future.cell)
    }
}

impl fmt::Debug for Future {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.cell.inner.borrow();
        let mut out = f.debug_struct("Future");
        out.field("id", &self.cell.id).field("state", &inner.state);
        match inner.state {
            FutureState::Pending => {}
            FutureState::Fulfilled => {
                out.field("value", &inner.value);
            }
            FutureState::Rejected => {
                out.field("reason", &inner.reason);
            }
        }
        out.finish()
    }
}

fn deferred<F>(scheduler: SchedulerRef, job: F) -> Reaction
where
    F: FnOnce(Value) + 'static,
{
    let task_scheduler = scheduler.clone();
    Box::new(move |payload| {
        task_scheduler.schedule(Task::new(move || {
            job(payload);
            Ok(())
        }));
    })
}

fn run_handler(downstream: &Future, handler: Option<&Function>, settled: Result<Value, Value>) {
    let outcome = match (handler, settled) {
        (Some(handler), Ok(payload)) | (Some(handler), Err(payload)) => handler.call1(payload),
        (None, passthrough) => passthrough,
    };
    match outcome {
        Ok(x) => resolve_future(downstream, x),
        Err(reason) => downstream.cell.reject(reason),
    }
}

/// Builds one side of `finally`: call `on_settled`, wait for what it
/// returned, then replay the original outcome through `forward`.
fn settled_then(
    scheduler: SchedulerRef,
    on_settled: Function,
    forward: fn(Value) -> Result<Value, Value>,
) -> Function {
    Function::new(move |args| {
        let original = args.first().cloned().unwrap_or_default();
        let returned = on_settled.call(&Value::Undefined, &[])?;
        let replay = Function::new(move |_| forward(original.clone()));
        Ok(Future::resolve(scheduler.clone(), returned)
            .then(Some(replay), None)
            .into())
    })
}

/// The settle capabilities handed to a future's initializer.
///
/// Only the first call to [`resolve`](Resolver::resolve) or
/// [`reject`](Resolver::reject) has any effect. After resolving with a
/// thenable the future stays pending until the thenable settles, and further
/// calls are still ignored.
#[derive(Clone)]
pub struct Resolver {
    future: Future,
    already_resolved: Rc<Cell<bool>>,
}

impl Resolver {
    fn new(future: Future) -> Self {
        Self {
            future,
            already_resolved: Rc::new(Cell::new(false)),
        }
    }

    /// Resolves the future with `value`, adopting it if it is a thenable.
    pub fn resolve(&self, value: Value) {
        if self.already_resolved.replace(true) {
            return;
        }
        resolve_future(&self.future, value);
    }

    /// Rejects the future with `reason`.
    pub fn reject(&self, reason: Value) {
        if self.already_resolved.replace(true) {
            return;
        }
        self.future.cell.reject(reason);
    }

    /// The future this resolver settles.
    pub fn future(&self) -> Future {
        self.future.clone()
    }

    /// `resolve` as a callable value, for handing to foreign code.
    pub fn resolve_function(&self) -> Function {
        let resolver = self.clone();
        Function::new(move |args| {
            resolver.resolve(args.first().cloned().unwrap_or_default());
            Ok(Value::Undefined)
        })
        .named("resolve")
    }

    /// `reject` as a callable value, for handing to foreign code.
    pub fn reject_function(&self) -> Function {
        let resolver = self.clone();
        Function::new(move |args| {
            resolver.reject(args.first().cloned().unwrap_or_default());
            Ok(Value::Undefined)
        })
        .named("reject")
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("future", &self.future.id())
            .field("already_resolved", &self.already_resolved.get())
            .finish()
    }
}
