//! Callable values.

use crate::Value;
use std::fmt;
use std::rc::Rc;

type Callback = dyn Fn(&Value, &[Value]) -> Result<Value, Value>;

/// A callable value.
///
/// A function receives a receiver (`this`) and its arguments, and either
/// returns a value or throws one. The error arm of the result carries the
/// thrown value, which may be any [`Value`], not only an error record.
///
/// Cloning a `Function` shares the underlying closure; two clones are the
/// same function for [`Function::ptr_eq`] and for `Value` equality.
///
/// # Examples
///
/// ```
/// use core_types::{Function, Value};
///
/// let double = Function::new(|args| match args.first() {
///     Some(Value::Smi(n)) => Ok(Value::Smi(n * 2)),
///     other => Err(Value::from(format!("not a number: {:?}", other))),
/// });
///
/// assert_eq!(double.call1(Value::Smi(21)), Ok(Value::Smi(42)));
/// assert!(double.call1(Value::Null).is_err());
/// ```
#[derive(Clone)]
pub struct Function {
    name: Rc<str>,
    callback: Rc<Callback>,
}

impl Function {
    /// Creates an anonymous function that ignores its receiver.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, Value> + 'static,
    {
        Self::method(move |_this, args| f(args))
    }

    /// Creates an anonymous function that sees its receiver.
    pub fn method<F>(f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, Value> + 'static,
    {
        Self {
            name: Rc::from(""),
            callback: Rc::new(f),
        }
    }

    /// Returns a copy of this function carrying a display name.
    pub fn named(mut self, name: &str) -> Self {
        self.name = Rc::from(name);
        self
    }

    /// The display name, empty for anonymous functions.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Calls the function with the given receiver and arguments.
    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value, Value> {
        (self.callback)(this, args)
    }

    /// Calls the function with an `undefined` receiver and one argument.
    pub fn call1(&self, arg: Value) -> Result<Value, Value> {
        self.call(&Value::Undefined, &[arg])
    }

    /// Returns true if both handles refer to the same function.
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.callback, &other.callback)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.name)
    }
}
