//! The resolution procedure.
//!
//! Every value that could settle a future goes through [`resolve_future`]:
//! handler return values, values passed to a [`Resolver`], and values
//! delivered by an adopted thenable. Plain values fulfill the future,
//! thenables are adopted, and resolving a future with itself is a
//! `TypeError`.
//!
//! [`Resolver`]: crate::Resolver

use crate::future::Future;
use core_types::{ErrorKind, Function, JsError, Value};
use std::cell::Cell;
use std::rc::Rc;

/// Rejection message for a future resolved with itself.
pub const CHAINING_CYCLE_MESSAGE: &str = "Chaining cycle detected for future";

/// How many foreign thenables may resolve synchronously inside one another
/// before the future is rejected with a `RangeError`.
pub const MAX_THENABLE_DEPTH: usize = 64;

/// What a candidate value turned out to be.
enum Resolvable {
    /// Not a thenable: fulfill with it as is.
    PlainValue(Value),
    /// One of our own futures: adopt its state.
    NativeFuture(Future),
    /// A foreign object with a callable `then`: drive it through the
    /// two-callback protocol.
    ExternalThenable { receiver: Value, then: Function },
}

impl Resolvable {
    /// Classifies `x`. Reading `then` may throw, which is returned as `Err`.
    fn probe(x: Value) -> Result<Resolvable, Value> {
        if !x.is_object_like() {
            return Ok(Resolvable::PlainValue(x));
        }
        if let Some(future) = Future::from_value(&x) {
            return Ok(Resolvable::NativeFuture(future));
        }
        match x.get("then")? {
            Value::Function(then) => Ok(Resolvable::ExternalThenable { receiver: x, then }),
            _ => Ok(Resolvable::PlainValue(x)),
        }
    }
}

/// Single-use flag shared by the callbacks handed to one thenable.
#[derive(Clone, Default)]
struct CallGuard(Rc<Cell<bool>>);

impl CallGuard {
    /// Returns true the first time it is called, false afterwards.
    fn trip(&self) -> bool {
        !self.0.replace(true)
    }
}

/// Settles `downstream` according to `x`.
///
/// 1. `x` is `downstream` itself: reject with a `TypeError`.
/// 2. `x` is object-like: read `then`. A throwing read rejects. A native
///    future is adopted through scheduled reactions. A callable `then` is
///    invoked with `x` as receiver and a guarded pair of callbacks; only the
///    first callback invocation counts, and a throw from `then` after that
///    is ignored. A non-callable `then` fulfills with `x`.
/// 3. Anything else fulfills with `x`.
///
/// Foreign thenables that resolve synchronously with further thenables
/// nest at most [`MAX_THENABLE_DEPTH`] deep; past that the future is
/// rejected with a `RangeError`.
pub fn resolve_future(downstream: &Future, x: Value) {
    resolve_nested(downstream, x, 0);
}

/// `depth` counts the foreign `then` calls currently on the stack.
fn resolve_nested(downstream: &Future, x: Value, depth: usize) {
    if Future::from_value(&x).is_some_and(|candidate| candidate.ptr_eq(downstream)) {
        log::debug!("future#{} resolved with itself", downstream.id());
        downstream
            .cell
            .reject(JsError::type_error(CHAINING_CYCLE_MESSAGE).into());
        return;
    }

    match Resolvable::probe(x) {
        Err(thrown) => downstream.cell.reject(thrown),
        Ok(Resolvable::PlainValue(value)) => downstream.cell.fulfill(value),
        Ok(Resolvable::NativeFuture(source)) => adopt(downstream, &source),
        Ok(Resolvable::ExternalThenable { receiver, then }) => {
            call_then(downstream, &receiver, &then, depth)
        }
    }
}

fn adopt(downstream: &Future, source: &Future) {
    log::trace!("future#{} adopting future#{}", downstream.id(), source.id());
    let on_fulfilled = downstream.clone();
    let on_rejected = downstream.clone();
    source.when_settled(
        move |y| resolve_future(&on_fulfilled, y),
        move |r| on_rejected.cell.reject(r),
    );
}

fn call_then(downstream: &Future, receiver: &Value, then: &Function, depth: usize) {
    if depth >= MAX_THENABLE_DEPTH {
        log::debug!(
            "future#{}: thenables nested more than {} deep",
            downstream.id(),
            MAX_THENABLE_DEPTH
        );
        downstream.cell.reject(
            JsError::new(
                ErrorKind::RangeError,
                format!("thenables nested more than {} deep", MAX_THENABLE_DEPTH),
            )
            .into(),
        );
        return;
    }
    let guard = CallGuard::default();

    let resolve = {
        let guard = guard.clone();
        let downstream = downstream.clone();
        Function::new(move |args| {
            if guard.trip() {
                let y = args.first().cloned().unwrap_or_default();
                resolve_nested(&downstream, y, depth + 1);
            } else {
                log::debug!("future#{}: ignoring extra thenable callback", downstream.id());
            }
            Ok(Value::Undefined)
        })
        .named("resolve")
    };
    let reject = {
        let guard = guard.clone();
        let downstream = downstream.clone();
        Function::new(move |args| {
            if guard.trip() {
                downstream
                    .cell
                    .reject(args.first().cloned().unwrap_or_default());
            } else {
                log::debug!("future#{}: ignoring extra thenable callback", downstream.id());
            }
            Ok(Value::Undefined)
        })
        .named("reject")
    };

    if let Err(thrown) = then.call(receiver, &[resolve.into(), reject.into()]) {
        if guard.trip() {
            downstream.cell.reject(thrown);
        } else {
            log::debug!(
                "future#{}: ignoring throw from settled thenable: {}",
                downstream.id(),
                thrown
            );
        }
    }
}
