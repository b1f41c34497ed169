//! Demonstration scenarios.
//!
//! Each scenario drives futures on a fresh event loop, records what its
//! handlers print, and checks the observable outcome. The first three replay
//! the classic console walkthrough of a hand-written promise; the rest
//! exercise one guarantee each.

use crate::error::CliResult;
use async_runtime::{EventLoop, Future, SchedulerRef, Task, CHAINING_CYCLE_MESSAGE};
use core_types::{ErrorKind, Function, HostObject, JsError, PlainObject, Value};
use serde::Serialize;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// A named, self-checking demonstration.
#[derive(Clone, Copy)]
pub struct Scenario {
    /// Name used with `--scenario`
    pub name: &'static str,
    /// One-line summary shown by `--list`
    pub description: &'static str,
    body: fn(&Session) -> Result<(), JsError>,
}

/// Outcome of one scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Scenario name
    pub name: String,
    /// True when every check held
    pub passed: bool,
    /// Tasks and microtasks the event loop executed
    pub tasks_run: usize,
    /// Virtual time at the end of the run, in milliseconds
    pub elapsed_ms: u64,
    /// Lines printed by the scenario's handlers, in order
    pub output: Vec<String>,
    /// Checks that did not hold
    pub failures: Vec<String>,
}

impl Scenario {
    /// Runs the scenario on `event_loop`, which should be fresh.
    pub fn run(&self, event_loop: Rc<EventLoop>) -> CliResult<ScenarioReport> {
        log::info!("scenario {}: start ({})", self.name, event_loop.mode());
        let session = Session::new(event_loop);
        (self.body)(&session)?;
        let report = session.into_report(self.name);
        log::info!(
            "scenario {}: {} after {} tasks",
            self.name,
            if report.passed { "passed" } else { "failed" },
            report.tasks_run
        );
        Ok(report)
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario").field("name", &self.name).finish()
    }
}

/// Looks a scenario up by name.
pub fn find(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|scenario| scenario.name == name)
}

/// Every scenario, in the order they run by default.
pub static SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "basic-chain",
        description: "initializer runs synchronously; then-chain passes values along",
        body: basic_chain,
    },
    Scenario {
        name: "async-resolve",
        description: "a timer resolves the future after 1000ms of virtual time",
        body: async_resolve,
    },
    Scenario {
        name: "static-helpers",
        description: "Future::resolve and Future::reject feed then and catch",
        body: static_helpers,
    },
    Scenario {
        name: "single-settlement",
        description: "only the first resolve or reject takes effect",
        body: single_settlement,
    },
    Scenario {
        name: "ordering",
        description: "handlers run after the current code, in registration order",
        body: ordering,
    },
    Scenario {
        name: "passthrough",
        description: "missing handlers forward values and reasons",
        body: passthrough,
    },
    Scenario {
        name: "nested-future",
        description: "resolving with a future adopts its outcome",
        body: nested_future,
    },
    Scenario {
        name: "cycle-detection",
        description: "a handler returning its own downstream future is a TypeError",
        body: cycle_detection,
    },
    Scenario {
        name: "finally",
        description: "finally observes settlement without changing the outcome",
        body: finally,
    },
    Scenario {
        name: "thenable-interop",
        description: "foreign thenables are adopted and futures act as thenables",
        body: thenable_interop,
    },
    Scenario {
        name: "misbehaving-thenable",
        description: "extra callbacks, late throws and throwing getters are contained",
        body: misbehaving_thenable,
    },
];

/// State shared by a scenario body and its handlers.
struct Session {
    event_loop: Rc<EventLoop>,
    output: Rc<RefCell<Vec<String>>>,
    failures: RefCell<Vec<String>>,
    tasks_run: Cell<usize>,
}

impl Session {
    fn new(event_loop: Rc<EventLoop>) -> Self {
        Self {
            event_loop,
            output: Rc::new(RefCell::new(Vec::new())),
            failures: RefCell::new(Vec::new()),
            tasks_run: Cell::new(0),
        }
    }

    fn scheduler(&self) -> SchedulerRef {
        self.event_loop.clone()
    }

    fn print(&self, line: impl Into<String>) {
        self.output.borrow_mut().push(line.into());
    }

    /// Handler that prints `label: value` and returns the value.
    fn printer(&self, label: &'static str) -> Function {
        let output = self.output.clone();
        Function::new(move |args| {
            let value = args.first().cloned().unwrap_or_default();
            output.borrow_mut().push(format!("{}: {}", label, value));
            Ok(value)
        })
        .named(label)
    }

    /// Drives the event loop until nothing is left.
    fn settle(&self) -> Result<(), JsError> {
        let executed = self.event_loop.run_until_done()?;
        self.tasks_run.set(self.tasks_run.get() + executed);
        Ok(())
    }

    fn check(&self, what: &str, holds: bool) {
        if !holds {
            log::debug!("check failed: {}", what);
            self.failures.borrow_mut().push(what.to_string());
        }
    }

    fn expect_value(&self, what: &str, future: &Future, expected: Value) {
        match future.value() {
            Some(actual) if actual == expected => {}
            _ => self.fail(what, format!("fulfilled with {}", expected), future),
        }
    }

    fn expect_reason(&self, what: &str, future: &Future, expected: Value) {
        match future.reason() {
            Some(actual) if actual == expected => {}
            _ => self.fail(what, format!("rejected with {}", expected), future),
        }
    }

    fn expect_output(&self, expected: &[&str]) {
        let output = self.output.borrow();
        if output.iter().map(String::as_str).ne(expected.iter().copied()) {
            self.failures.borrow_mut().push(format!(
                "output: expected {:?}, got {:?}",
                expected, *output
            ));
        }
    }

    fn fail(&self, what: &str, expected: String, future: &Future) {
        self.failures
            .borrow_mut()
            .push(format!("{}: expected {}, got {:?}", what, expected, future));
    }

    fn into_report(self, name: &str) -> ScenarioReport {
        let failures = self.failures.into_inner();
        ScenarioReport {
            name: name.to_string(),
            passed: failures.is_empty(),
            tasks_run: self.tasks_run.into_inner(),
            elapsed_ms: self.event_loop.now(),
            output: self.output.borrow().clone(),
            failures,
        }
    }
}

fn handler<F>(f: F) -> Option<Function>
where
    F: Fn(Value) -> Result<Value, Value> + 'static,
{
    Some(Function::new(move |args| {
        f(args.first().cloned().unwrap_or_default())
    }))
}

/// Builds a plain object whose `then` calls `body(resolve, reject)`.
fn thenable<F>(body: F) -> Value
where
    F: Fn(&Function, &Function) -> Result<Value, Value> + 'static,
{
    let then = Function::method(move |_this, args| {
        let callback = |i: usize| {
            args.get(i)
                .and_then(Value::as_function)
                .cloned()
                .ok_or_else(|| Value::from(JsError::type_error("then expects two callbacks")))
        };
        body(&callback(0)?, &callback(1)?)
    });
    PlainObject::new().with("then", then.into()).into_value()
}

fn is_cycle_error(reason: Option<Value>) -> bool {
    matches!(
        reason,
        Some(Value::Error(JsError { kind: ErrorKind::TypeError, ref message }))
            if message == CHAINING_CYCLE_MESSAGE
    )
}

fn basic_chain(s: &Session) -> Result<(), JsError> {
    let output = s.output.clone();
    let on_fulfilled = s.printer("on_fulfilled");
    let end = Future::new(s.scheduler(), |resolver| {
        output.borrow_mut().push("initializer runs".to_string());
        resolver.resolve(Value::from("success"));
        Ok(())
    })
    .then(
        handler(move |value| {
            on_fulfilled.call1(value)?;
            Ok(Value::from("chained"))
        }),
        Some(s.printer("on_rejected")),
    )
    .then(Some(s.printer("chain result")), None);

    s.settle()?;
    s.expect_output(&[
        "initializer runs",
        "on_fulfilled: success",
        "chain result: chained",
    ]);
    s.expect_value("end of chain", &end, Value::from("chained"));
    Ok(())
}

fn async_resolve(s: &Session) -> Result<(), JsError> {
    let timers = s.event_loop.clone();
    let output = s.output.clone();
    let future = Future::new(s.scheduler(), move |resolver| {
        let resolver = resolver.clone();
        timers.set_timeout(
            1000,
            Task::new(move || {
                output.borrow_mut().push("timer fired".to_string());
                resolver.resolve(Value::from("async success"));
                Ok(())
            }),
        );
        Ok(())
    });
    future.then(Some(s.printer("async result")), None);
    s.check("future pending before the timer fires", future.is_pending());

    s.settle()?;
    s.expect_output(&["timer fired", "async result: async success"]);
    s.check("clock advanced to 1000ms", s.event_loop.now() == 1000);
    Ok(())
}

fn static_helpers(s: &Session) -> Result<(), JsError> {
    let resolved = Future::resolve(s.scheduler(), Value::from("static resolve"))
        .then(Some(s.printer("resolve result")), None);
    let caught = Future::reject(s.scheduler(), Value::from("static reject"))
        .catch(Some(s.printer("reject result")));

    s.settle()?;
    s.expect_output(&[
        "resolve result: static resolve",
        "reject result: static reject",
    ]);
    s.expect_value("resolve chain", &resolved, Value::from("static resolve"));
    s.expect_value("catch recovers", &caught, Value::from("static reject"));
    Ok(())
}

fn single_settlement(s: &Session) -> Result<(), JsError> {
    let future = Future::new(s.scheduler(), |resolver| {
        resolver.resolve(Value::from("a"));
        resolver.reject(Value::from("b"));
        resolver.resolve(Value::from("c"));
        Err(Value::from("thrown after settling"))
    });
    future.then(Some(s.printer("settled")), Some(s.printer("rejected")));

    s.settle()?;
    s.expect_value("first resolve wins", &future, Value::from("a"));
    s.expect_output(&["settled: a"]);
    Ok(())
}

fn ordering(s: &Session) -> Result<(), JsError> {
    let future = Future::resolve(s.scheduler(), Value::from("x"));
    future.then(Some(s.printer("h1")), None);
    future.then(Some(s.printer("h2")), None);
    s.print("registration returned");
    s.check(
        "no handler ran synchronously",
        s.output.borrow().len() == 1,
    );

    s.settle()?;
    s.expect_output(&["registration returned", "h1: x", "h2: x"]);
    Ok(())
}

fn passthrough(s: &Session) -> Result<(), JsError> {
    let value_forwarded = Future::resolve(s.scheduler(), Value::Smi(5))
        .then(None, handler(|_| Ok(Value::Smi(-1))));
    let reason_forwarded = Future::reject(s.scheduler(), Value::Smi(5))
        .then(handler(Ok), None)
        .catch(handler(Ok));
    let reason_kept = Future::reject(s.scheduler(), Value::from("r"))
        .then(None, None)
        .then(None, None);

    s.settle()?;
    s.expect_value("missing on_rejected", &value_forwarded, Value::Smi(5));
    s.expect_value("missing on_fulfilled", &reason_forwarded, Value::Smi(5));
    s.expect_reason("two empty links", &reason_kept, Value::from("r"));
    Ok(())
}

fn nested_future(s: &Session) -> Result<(), JsError> {
    let inner = Future::resolve(s.scheduler(), Value::Smi(42));
    let outer = Future::new(s.scheduler(), |resolver| {
        resolver.resolve(inner.to_value());
        Ok(())
    });
    let scheduler = s.scheduler();
    let from_handler = Future::resolve(s.scheduler(), Value::Null).then(
        handler(move |_| Ok(Future::reject(scheduler.clone(), Value::from("inner failure")).into())),
        None,
    );
    outer.then(Some(s.printer("nested")), None);

    s.settle()?;
    s.expect_value("resolver adopts", &outer, Value::Smi(42));
    s.expect_reason("handler result adopted", &from_handler, Value::from("inner failure"));
    s.expect_output(&["nested: 42"]);
    Ok(())
}

fn cycle_detection(s: &Session) -> Result<(), JsError> {
    let slot: Rc<RefCell<Option<Future>>> = Rc::new(RefCell::new(None));
    let own = slot.clone();
    let downstream = Future::resolve(s.scheduler(), Value::Smi(1)).then(
        handler(move |_| {
            Ok(own
                .borrow()
                .as_ref()
                .map(Future::to_value)
                .unwrap_or_default())
        }),
        None,
    );
    *slot.borrow_mut() = Some(downstream.clone());
    downstream.catch(Some(s.printer("caught")));

    let self_resolved = Future::new(s.scheduler(), |resolver| {
        resolver.resolve(resolver.future().to_value());
        Ok(())
    });

    s.settle()?;

    s.check("handler cycle is a TypeError", is_cycle_error(downstream.reason()));
    s.check("resolver cycle is a TypeError", is_cycle_error(self_resolved.reason()));
    s.expect_output(&["caught: TypeError: Chaining cycle detected for future"]);
    Ok(())
}

fn finally(s: &Session) -> Result<(), JsError> {
    let fulfilled = Future::resolve(s.scheduler(), Value::Smi(1))
        .finally(handler(|_| Ok(Value::Smi(99))));
    let rejected = Future::reject(s.scheduler(), Value::from("e"))
        .finally(Some(s.printer("cleanup")))
        .catch(handler(Ok));
    let replaced = Future::resolve(s.scheduler(), Value::Smi(1))
        .finally(handler(|_| Err(Value::from("cleanup failed"))));

    let timers = s.event_loop.clone();
    let output = s.output.clone();
    let scheduler = s.scheduler();
    let waited = Future::resolve(s.scheduler(), Value::from("v")).finally(handler(move |_| {
        let timers = timers.clone();
        let output = output.clone();
        Ok(Future::new(scheduler.clone(), move |resolver| {
            let resolver = resolver.clone();
            timers.set_timeout(
                20,
                Task::new(move || {
                    output.borrow_mut().push("slow cleanup done".to_string());
                    resolver.resolve(Value::Undefined);
                    Ok(())
                }),
            );
            Ok(())
        })
        .into())
    }));
    waited.then(Some(s.printer("after slow cleanup")), None);

    s.settle()?;
    s.expect_value("fulfilled outcome kept", &fulfilled, Value::Smi(1));
    s.expect_value("rejected outcome kept", &rejected, Value::from("e"));
    s.expect_reason("throwing callback replaces", &replaced, Value::from("cleanup failed"));
    s.expect_value("waits for returned future", &waited, Value::from("v"));
    s.expect_output(&[
        "cleanup: undefined",
        "slow cleanup done",
        "after slow cleanup: v",
    ]);
    Ok(())
}

fn thenable_interop(s: &Session) -> Result<(), JsError> {
    let adopted = Future::resolve(
        s.scheduler(),
        thenable(|resolve, _| resolve.call1(Value::Smi(7))),
    );
    let rejected = Future::resolve(s.scheduler(), Value::Null).then(
        handler(|_| Ok(thenable(|_, reject| reject.call1(Value::from("foreign no"))))),
        None,
    );
    let not_thenable = PlainObject::new()
        .with("then", Value::Smi(3))
        .into_value();
    let plain = Future::resolve(s.scheduler(), not_thenable.clone());

    // Foreign code consuming a future only through its `then` property.
    let native = Future::resolve(s.scheduler(), Value::from("native")).to_value();
    let then = native.get("then").map_err(thrown_to_error)?;
    let foreign_view = match then.as_function() {
        Some(then) => then
            .call(&native, &[s.printer("foreign saw").into()])
            .map_err(thrown_to_error)?,
        None => Value::Undefined,
    };

    // A callback-style foreign API settling a future through the resolver.
    let feed = PlainObject::new()
        .with(
            "subscribe",
            Function::new(|args| match args.first().and_then(Value::as_function) {
                Some(on_value) => on_value.call1(Value::from("event")),
                None => Ok(Value::Undefined),
            })
            .into(),
        )
        .into_value();
    let subscribed = Future::new(s.scheduler(), |resolver| {
        if let Some(subscribe) = feed.get("subscribe")?.as_function() {
            let callbacks: [Value; 2] = [
                resolver.resolve_function().into(),
                resolver.reject_function().into(),
            ];
            subscribe.call(&feed, &callbacks)?;
        }
        Ok(())
    });

    s.settle()?;
    s.expect_value("thenable fulfilled", &adopted, Value::Smi(7));
    s.expect_value("callback API via resolver", &subscribed, Value::from("event"));
    s.expect_reason("thenable rejected", &rejected, Value::from("foreign no"));
    s.expect_value("non-callable then", &plain, not_thenable);
    s.check(
        "then via property returns a future",
        Future::from_value(&foreign_view).is_some(),
    );
    s.expect_output(&["foreign saw: native"]);
    Ok(())
}

/// Host object whose `then` getter throws.
struct ExplodingThen;

impl HostObject for ExplodingThen {
    fn class_name(&self) -> &str {
        "ExplodingThen"
    }

    fn get(&self, key: &str) -> Result<Value, Value> {
        match key {
            "then" => Err(Value::from("then getter exploded")),
            _ => Ok(Value::Undefined),
        }
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

fn misbehaving_thenable(s: &Session) -> Result<(), JsError> {
    let chatty = Future::resolve(
        s.scheduler(),
        thenable(|resolve, reject| {
            resolve.call1(Value::from("first"))?;
            reject.call1(Value::from("second"))?;
            resolve.call1(Value::from("third"))?;
            Err(Value::from("late throw"))
        }),
    );
    let throws_early = Future::resolve(
        s.scheduler(),
        thenable(|_, _| Err(Value::from("then threw"))),
    );
    let getter = Future::resolve(s.scheduler(), Value::Object(Rc::new(ExplodingThen)));

    s.settle()?;
    s.expect_value("first callback wins", &chatty, Value::from("first"));
    s.expect_reason("throw before callbacks", &throws_early, Value::from("then threw"));
    s.expect_reason("throwing getter", &getter, Value::from("then getter exploded"));
    Ok(())
}

fn thrown_to_error(thrown: Value) -> JsError {
    match thrown {
        Value::Error(error) => error,
        other => JsError::new(ErrorKind::Error, other.to_string()),
    }
}
