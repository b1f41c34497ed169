//! Async runtime: deferred values and the loop that drives them.
//!
//! This crate provides:
//! - [`Future`] - a Promise/A+ compliant deferred value with `then`,
//!   `catch`, `finally` and the `resolve`/`reject` helpers
//! - [`resolve_future`] - the resolution procedure that adopts thenables,
//!   including foreign ones, and detects chaining cycles
//! - [`Scheduler`] - the deferred-execution contract futures depend on
//! - [`EventLoop`] - task queue, microtask queue and virtual-clock timers
//!
//! Everything is single-threaded; "asynchrony" is deferred scheduling.
//!
//! # Examples
//!
//! ## Chaining
//!
//! ```
//! use async_runtime::{EventLoop, Future};
//! use core_types::{Function, Value};
//! use std::rc::Rc;
//!
//! let event_loop = Rc::new(EventLoop::new());
//!
//! let chained = Future::reject(event_loop.clone(), Value::from("e"))
//!     .then(Some(Function::new(|_| Ok(Value::from("unreachable")))), None)
//!     .catch(Some(Function::new(|args| Ok(args[0].clone()))));
//!
//! event_loop.run_until_done().unwrap();
//! assert_eq!(chained.value(), Some(Value::from("e")));
//! ```
//!
//! ## Foreign thenables
//!
//! ```
//! use async_runtime::{EventLoop, Future};
//! use core_types::{Function, PlainObject, Value};
//! use std::rc::Rc;
//!
//! let event_loop = Rc::new(EventLoop::new());
//!
//! let thenable = PlainObject::new()
//!     .with(
//!         "then",
//!         Function::method(|_this, args| {
//!             let resolve = args[0].as_function().cloned().unwrap();
//!             resolve.call1(Value::Smi(7))
//!         })
//!         .into(),
//!     )
//!     .into_value();
//!
//! let future = Future::resolve(event_loop.clone(), thenable);
//! event_loop.run_until_done().unwrap();
//! assert_eq!(future.value(), Some(Value::Smi(7)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod event_loop;
pub mod future;
pub mod resolution;
pub mod scheduler;
pub mod task_queue;

// Re-export main types at crate root
pub use event_loop::{EventLoop, DEFAULT_MAX_TURNS};
pub use future::{Future, FutureState, Resolver};
pub use resolution::{resolve_future, CHAINING_CYCLE_MESSAGE, MAX_THENABLE_DEPTH};
pub use scheduler::{Scheduler, SchedulerRef, SchedulingMode};
pub use task_queue::{Task, TaskQueue, TimerQueue};
