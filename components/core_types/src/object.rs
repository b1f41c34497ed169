//! Host objects: duck-typed values with properties.

use crate::Value;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// An object whose properties are looked up by name.
///
/// Property reads can fail, which models getters that throw. This is what
/// lets the future resolution procedure treat any object with a callable
/// `then` property as a thenable, however that object is implemented.
pub trait HostObject: Any {
    /// The class name used when the object is displayed.
    fn class_name(&self) -> &str {
        "Object"
    }

    /// Reads a property. Missing properties read as `undefined`.
    fn get(&self, key: &str) -> Result<Value, Value>;

    /// Upcasts the shared handle for downcasting to a concrete host type.
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

/// An ordinary object: a bag of named properties.
///
/// A plain object is a thenable exactly when its `then` property holds a
/// function.
///
/// # Examples
///
/// ```
/// use core_types::{PlainObject, Value};
///
/// let obj = PlainObject::new();
/// obj.set("answer", Value::Smi(42));
///
/// let value = obj.into_value();
/// assert_eq!(value.get("answer"), Ok(Value::Smi(42)));
/// assert_eq!(value.get("then"), Ok(Value::Undefined));
/// ```
#[derive(Debug, Default)]
pub struct PlainObject {
    properties: RefCell<HashMap<String, Value>>,
}

impl PlainObject {
    /// Creates an empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property, replacing any previous value.
    pub fn set(&self, key: &str, value: Value) {
        self.properties.borrow_mut().insert(key.to_string(), value);
    }

    /// Builder form of [`PlainObject::set`].
    pub fn with(self, key: &str, value: Value) -> Self {
        self.set(key, value);
        self
    }

    /// Wraps the object in a shared `Value::Object`.
    pub fn into_value(self) -> Value {
        Value::Object(Rc::new(self))
    }
}

impl HostObject for PlainObject {
    fn get(&self, key: &str) -> Result<Value, Value> {
        Ok(self
            .properties
            .borrow()
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}
