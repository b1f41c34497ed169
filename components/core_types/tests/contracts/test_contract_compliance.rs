//! Contract compliance tests for core_types
//!
//! These tests pin the public surface the runtime components depend on.

use core_types::{ErrorKind, Function, HostObject, JsError, PlainObject, Value};
use std::rc::Rc;

#[cfg(test)]
mod value_contract_tests {
    use super::*;

    /// Contract: Value enum has every variant the runtime matches on
    #[test]
    fn test_value_has_all_variants() {
        let _: Value = Value::Undefined;
        let _: Value = Value::Null;
        let _: Value = Value::Boolean(true);
        let _: Value = Value::Smi(0);
        let _: Value = Value::Double(0.0);
        let _: Value = Value::String(String::new());
        let _: Value = Value::Error(JsError::type_error(""));
        let _: Value = Value::Function(Function::new(|_| Ok(Value::Undefined)));
        let _: Value = Value::Object(Rc::new(PlainObject::new()));
    }

    /// Contract: Value is cheap to clone and defaults to undefined
    #[test]
    fn test_value_clone_and_default() {
        let value = Value::default();
        let copy = value.clone();
        assert_eq!(value, copy);
    }

    /// Contract: property reads return Result<Value, Value>
    #[test]
    fn test_value_get_signature() {
        let result: Result<Value, Value> = Value::Null.get("then");
        assert!(result.is_ok());
    }

    #[test]
    fn test_value_type_of_returns_str() {
        let _: &str = Value::Undefined.type_of();
    }
}

#[cfg(test)]
mod function_contract_tests {
    use super::*;

    /// Contract: functions return or throw a Value
    #[test]
    fn test_function_call_signature() {
        let f = Function::new(|_| Ok(Value::Undefined));
        let result: Result<Value, Value> = f.call(&Value::Undefined, &[]);
        assert!(result.is_ok());
    }
}

#[cfg(test)]
mod host_object_contract_tests {
    use super::*;

    /// Contract: PlainObject is usable as a trait object
    #[test]
    fn test_plain_object_is_host_object() {
        let obj: Rc<dyn HostObject> = Rc::new(PlainObject::new());
        assert_eq!(obj.class_name(), "Object");
        assert_eq!(obj.get("missing"), Ok(Value::Undefined));
    }
}

#[cfg(test)]
mod error_contract_tests {
    use super::*;

    /// Contract: ErrorKind enum has every variant the runtime matches on
    #[test]
    fn test_error_kind_has_all_variants() {
        let _: ErrorKind = ErrorKind::Error;
        let _: ErrorKind = ErrorKind::TypeError;
        let _: ErrorKind = ErrorKind::RangeError;
        let _: ErrorKind = ErrorKind::InternalError;
    }

    /// Contract: JsError has public kind and message fields
    #[test]
    fn test_js_error_fields() {
        let error = JsError {
            kind: ErrorKind::TypeError,
            message: "undefined is not a function".to_string(),
        };
        assert_eq!(error.kind, ErrorKind::TypeError);
        assert_eq!(error.message, "undefined is not a function");
    }

    /// Contract: JsError converts into a thrown Value
    #[test]
    fn test_js_error_into_value() {
        let value: Value = JsError::type_error("x").into();
        assert!(matches!(value, Value::Error(_)));
    }
}
