//! Core value types and error handling.
//!
//! This crate provides the dynamic value model shared by the runtime
//! components: the values futures are settled with, callable values, host
//! objects that may act as thenables, and structured error records.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of dynamic values
//! - [`Function`] - Callable values that return or throw a `Value`
//! - [`HostObject`] - Duck-typed objects with (possibly throwing) properties
//! - [`PlainObject`] - Ordinary property bags
//! - [`JsError`] / [`ErrorKind`] - Structured errors
//!
//! # Examples
//!
//! ```
//! use core_types::{Function, JsError, PlainObject, Value};
//!
//! let num = Value::Smi(42);
//! assert!(num.is_truthy());
//! assert_eq!(num.type_of(), "number");
//!
//! // An object with a callable `then` property is a thenable.
//! let thenable = PlainObject::new()
//!     .with("then", Value::from(Function::new(|_| Ok(Value::Undefined))))
//!     .into_value();
//! assert!(thenable.get("then").unwrap().as_function().is_some());
//!
//! let error = Value::from(JsError::type_error("undefined is not a function"));
//! assert_eq!(error.to_string(), "TypeError: undefined is not a function");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod function;
mod object;
mod value;

pub use error::{ErrorKind, JsError};
pub use function::Function;
pub use object::{HostObject, PlainObject};
pub use value::Value;
