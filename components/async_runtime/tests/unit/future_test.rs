//! Unit tests for Future
//!
//! Cover settlement, handler ordering, default handlers, chaining and
//! `finally`, each run under both scheduling modes where it matters.

use super::support::{add, entries, event_loop, handler, log, record};
use async_runtime::{
    EventLoop, Future, FutureState, SchedulingMode, Task, CHAINING_CYCLE_MESSAGE,
};
use core_types::{ErrorKind, Function, JsError, Value};
use std::cell::RefCell;
use std::rc::Rc;

fn both_modes() -> [Rc<EventLoop>; 2] {
    [
        Rc::new(EventLoop::new().with_mode(SchedulingMode::Macrotask)),
        Rc::new(EventLoop::new().with_mode(SchedulingMode::Microtask)),
    ]
}

fn assert_type_error(reason: Option<Value>, message: &str) {
    match reason {
        Some(Value::Error(JsError { kind, message: m })) => {
            assert_eq!(kind, ErrorKind::TypeError);
            assert_eq!(m, message);
        }
        other => panic!("expected TypeError, got {:?}", other),
    }
}

#[test]
fn test_resolve_then_chain() {
    for el in both_modes() {
        let result = Future::resolve(el.clone(), Value::Smi(1)).then(add(1), None);
        el.run_until_done().unwrap();
        assert_eq!(result.value(), Some(Value::Smi(2)));
    }
}

#[test]
fn test_async_resolution_through_timer() {
    let el = event_loop();
    let timer_loop = el.clone();
    let future = Future::new(el.clone(), move |resolver| {
        let resolver = resolver.clone();
        timer_loop.set_timeout(
            1000,
            Task::new(move || {
                resolver.resolve(Value::from("Success!"));
                Ok(())
            }),
        );
        Ok(())
    });
    let seen = log();
    future.then(record(&seen, "then"), None);

    assert!(future.is_pending());
    el.run_until_done().unwrap();
    assert_eq!(entries(&seen), vec!["then:Success!"]);
    assert_eq!(el.now(), 1000);
}

#[test]
fn test_settles_at_most_once() {
    let el = event_loop();
    let rejected_first = Future::new(el.clone(), |r| {
        r.reject(Value::from("no"));
        r.resolve(Value::from("yes"));
        Ok(())
    });
    assert_eq!(rejected_first.state(), FutureState::Rejected);
    assert_eq!(rejected_first.value(), None);
    assert_eq!(rejected_first.reason(), Some(Value::from("no")));
}

#[test]
fn test_handlers_never_run_synchronously() {
    for el in both_modes() {
        let order = log();
        let settled = Future::resolve(el.clone(), Value::Smi(1));
        settled.then(record(&order, "handler"), None);
        order.borrow_mut().push("sync".to_string());

        assert_eq!(entries(&order), vec!["sync"]);
        el.run_until_done().unwrap();
        assert_eq!(entries(&order), vec!["sync", "handler:1"]);
    }
}

#[test]
fn test_handlers_run_in_registration_order() {
    for el in both_modes() {
        let order = log();
        let captured = Rc::new(RefCell::new(None));
        let slot = captured.clone();
        let future = Future::new(el.clone(), move |r| {
            *slot.borrow_mut() = Some(r.clone());
            Ok(())
        });
        future.then(record(&order, "h1"), None);
        future.then(record(&order, "h2"), None);
        future.then(record(&order, "h3"), None);

        captured
            .borrow()
            .as_ref()
            .unwrap()
            .resolve(Value::from("x"));
        el.run_until_done().unwrap();
        assert_eq!(entries(&order), vec!["h1:x", "h2:x", "h3:x"]);
    }
}

#[test]
fn test_handlers_registered_after_settlement_keep_order() {
    let el = event_loop();
    let order = log();
    let future = Future::reject(el.clone(), Value::from("r"));
    future.catch(record(&order, "a"));
    future.then(None, record(&order, "b"));
    el.run_until_done().unwrap();
    assert_eq!(entries(&order), vec!["a:r", "b:r"]);
}

#[test]
fn test_only_matching_handler_runs() {
    let el = event_loop();
    let order = log();
    Future::resolve(el.clone(), Value::Smi(1)).then(record(&order, "ok"), record(&order, "err"));
    Future::reject(el.clone(), Value::Smi(2)).then(record(&order, "ok"), record(&order, "err"));
    el.run_until_done().unwrap();
    assert_eq!(entries(&order), vec!["ok:1", "err:2"]);
}

#[test]
fn test_missing_handlers_pass_through() {
    for el in both_modes() {
        let fulfilled = Future::resolve(el.clone(), Value::Smi(5))
            .then(None, handler(|_| Ok(Value::Smi(-1))))
            .then(None, None);
        let rejected = Future::reject(el.clone(), Value::Smi(5))
            .then(handler(Ok), None)
            .then(None, None)
            .catch(handler(Ok));
        el.run_until_done().unwrap();
        assert_eq!(fulfilled.value(), Some(Value::Smi(5)));
        assert_eq!(rejected.value(), Some(Value::Smi(5)));
    }
}

#[test]
fn test_handler_throw_rejects_downstream() {
    let el = event_loop();
    let downstream = Future::resolve(el.clone(), Value::Smi(1))
        .then(handler(|_| Err(Value::from("boom"))), None);
    let recovered = downstream.catch(handler(|r| Ok(Value::from(format!("caught {}", r)))));
    el.run_until_done().unwrap();
    assert_eq!(downstream.reason(), Some(Value::from("boom")));
    assert_eq!(recovered.value(), Some(Value::from("caught boom")));
}

#[test]
fn test_rejection_handler_return_fulfills() {
    let el = event_loop();
    let next = Future::reject(el.clone(), Value::from("e")).then(None, handler(|_| Ok(Value::Null)));
    el.run_until_done().unwrap();
    assert_eq!(next.state(), FutureState::Fulfilled);
    assert_eq!(next.value(), Some(Value::Null));
}

#[test]
fn test_handler_returning_future_is_flattened() {
    for el in both_modes() {
        let inner_loop = el.clone();
        let outer = Future::resolve(el.clone(), Value::Smi(1)).then(
            handler(move |_| Ok(Future::resolve(inner_loop.clone(), Value::Smi(42)).into())),
            None,
        );
        el.run_until_done().unwrap();
        assert_eq!(outer.value(), Some(Value::Smi(42)));
    }
}

#[test]
fn test_resolver_with_future_adopts_it() {
    let el = event_loop();
    let inner = Future::reject(el.clone(), Value::from("inner"));
    let outer = Future::new(el.clone(), |r| {
        r.resolve(inner.to_value());
        r.resolve(Value::from("ignored"));
        Ok(())
    });
    assert!(outer.is_pending());
    el.run_until_done().unwrap();
    assert_eq!(outer.reason(), Some(Value::from("inner")));
}

#[test]
fn test_static_resolve_returns_same_future() {
    let el = event_loop();
    let original = Future::resolve(el.clone(), Value::Smi(1));
    let again = Future::resolve(el, original.to_value());
    assert!(again.ptr_eq(&original));
}

#[test]
fn test_then_returning_its_own_future_is_a_cycle() {
    for el in both_modes() {
        let slot: Rc<RefCell<Option<Future>>> = Rc::new(RefCell::new(None));
        let inner = slot.clone();
        let p2 = Future::resolve(el.clone(), Value::Smi(1)).then(
            handler(move |_| Ok(inner.borrow().as_ref().map(Future::to_value).unwrap_or_default())),
            None,
        );
        *slot.borrow_mut() = Some(p2.clone());

        el.run_until_done().unwrap();
        assert_type_error(p2.reason(), CHAINING_CYCLE_MESSAGE);
    }
}

#[test]
fn test_resolver_with_own_future_is_a_cycle() {
    let el = event_loop();
    let future = Future::new(el, |r| {
        r.resolve(r.future().to_value());
        Ok(())
    });
    assert_type_error(future.reason(), CHAINING_CYCLE_MESSAGE);
}

#[test]
fn test_finally_preserves_outcome() {
    for el in both_modes() {
        let calls = log();
        let fulfilled = Future::resolve(el.clone(), Value::Smi(1))
            .finally(record(&calls, "finally"))
            .then(handler(Ok), None);
        let rejected = Future::reject(el.clone(), Value::from("e"))
            .finally(handler(|_| Ok(Value::Smi(99))))
            .catch(handler(Ok));
        el.run_until_done().unwrap();

        assert_eq!(fulfilled.value(), Some(Value::Smi(1)));
        assert_eq!(rejected.value(), Some(Value::from("e")));
        assert_eq!(entries(&calls), vec!["finally:undefined"]);
    }
}

#[test]
fn test_finally_throw_replaces_outcome() {
    let el = event_loop();
    let next = Future::resolve(el.clone(), Value::Smi(1))
        .finally(handler(|_| Err(Value::from("cleanup failed"))));
    el.run_until_done().unwrap();
    assert_eq!(next.reason(), Some(Value::from("cleanup failed")));
}

#[test]
fn test_finally_rejected_future_replaces_outcome() {
    let el = event_loop();
    let inner_loop = el.clone();
    let next = Future::reject(el.clone(), Value::from("original")).finally(handler(move |_| {
        Ok(Future::reject(inner_loop.clone(), Value::from("replacement")).into())
    }));
    el.run_until_done().unwrap();
    assert_eq!(next.reason(), Some(Value::from("replacement")));
}

#[test]
fn test_finally_waits_for_returned_future() {
    let el = event_loop();
    let order = log();
    let timer_loop = el.clone();
    let timer_order = order.clone();
    let next = Future::resolve(el.clone(), Value::from("v")).finally(handler(move |_| {
        let timer_loop = timer_loop.clone();
        let timer_order = timer_order.clone();
        Ok(Future::new(timer_loop.clone(), move |r| {
            let r = r.clone();
            timer_loop.set_timeout(
                50,
                Task::new(move || {
                    timer_order.borrow_mut().push("cleanup done".to_string());
                    r.resolve(Value::Undefined);
                    Ok(())
                }),
            );
            Ok(())
        })
        .into())
    }));
    next.then(record(&order, "after"), None);

    el.run_until_done().unwrap();
    assert_eq!(entries(&order), vec!["cleanup done", "after:v"]);
    assert_eq!(next.value(), Some(Value::from("v")));
}

#[test]
fn test_finally_without_callback_passes_through() {
    let el = event_loop();
    let next = Future::reject(el.clone(), Value::Smi(3)).finally(None);
    el.run_until_done().unwrap();
    assert_eq!(next.reason(), Some(Value::Smi(3)));
}

#[test]
fn test_then_via_object_protocol() {
    let el = event_loop();
    let future = Future::resolve(el.clone(), Value::Smi(10)).to_value();
    let then = future.get("then").unwrap();
    let then = then.as_function().unwrap();
    let doubled = Function::new(|args| Ok(Value::Smi(args[0].as_number().unwrap() as i32 * 2)));

    let chained = then.call(&future, &[doubled.into()]).unwrap();
    let chained = Future::from_value(&chained).unwrap();
    el.run_until_done().unwrap();
    assert_eq!(chained.value(), Some(Value::Smi(20)));
}

#[test]
fn test_then_on_incompatible_receiver_throws() {
    let el = event_loop();
    let future = Future::resolve(el, Value::Smi(1)).to_value();
    let then = future.get("then").unwrap();
    let thrown = then
        .as_function()
        .unwrap()
        .call(&Value::Smi(1), &[])
        .unwrap_err();
    match thrown {
        Value::Error(e) => assert_eq!(e.kind, ErrorKind::TypeError),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_resolver_functions_settle_once() {
    let el = event_loop();
    let future = Future::new(el, |r| {
        let resolve = r.resolve_function();
        let reject = r.reject_function();
        assert_eq!(resolve.name(), "resolve");
        assert_eq!(reject.name(), "reject");

        assert_eq!(reject.call1(Value::from("offline")), Ok(Value::Undefined));
        resolve.call1(Value::from("late"))?;
        Ok(())
    });
    assert_eq!(future.reason(), Some(Value::from("offline")));
}

#[test]
fn test_resolve_function_adopts_futures() {
    let el = event_loop();
    let inner = Future::resolve(el.clone(), Value::Smi(5));
    let resolve = Rc::new(RefCell::new(None));
    let slot = resolve.clone();
    let future = Future::new(el.clone(), move |r| {
        *slot.borrow_mut() = Some(r.resolve_function());
        Ok(())
    });

    // Called later by code that only sees a plain function value.
    let callback = Value::from(resolve.borrow().clone().unwrap());
    callback
        .as_function()
        .unwrap()
        .call(&Value::Undefined, &[inner.to_value()])
        .unwrap();
    assert!(future.is_pending());

    el.run_until_done().unwrap();
    assert_eq!(future.value(), Some(Value::Smi(5)));
}
