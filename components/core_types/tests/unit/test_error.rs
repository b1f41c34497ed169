//! Unit tests for JsError and ErrorKind

use core_types::{ErrorKind, JsError, Value};

#[cfg(test)]
mod error_kind_tests {
    use super::*;

    #[test]
    fn test_error_kind_is_copy() {
        let kind = ErrorKind::TypeError;
        let copy = kind;
        assert_eq!(kind, copy);
    }

    #[test]
    fn test_error_kind_names() {
        assert_eq!(ErrorKind::Error.to_string(), "Error");
        assert_eq!(ErrorKind::TypeError.to_string(), "TypeError");
        assert_eq!(ErrorKind::RangeError.to_string(), "RangeError");
        assert_eq!(ErrorKind::InternalError.to_string(), "InternalError");
    }
}

#[cfg(test)]
mod js_error_tests {
    use super::*;

    #[test]
    fn test_type_error_constructor() {
        let error = JsError::type_error("Chaining cycle detected for future");
        assert_eq!(error.kind, ErrorKind::TypeError);
        assert_eq!(error.message, "Chaining cycle detected for future");
    }

    #[test]
    fn test_internal_constructor() {
        let error = JsError::internal("event loop exceeded 10 turns");
        assert_eq!(error.kind, ErrorKind::InternalError);
    }

    #[test]
    fn test_display_includes_kind_and_message() {
        let error = JsError::new(ErrorKind::RangeError, "out of range");
        assert_eq!(error.to_string(), "RangeError: out of range");
    }

    #[test]
    fn test_is_std_error() {
        fn takes_error(_: &dyn std::error::Error) {}
        takes_error(&JsError::type_error("x"));
    }

    #[test]
    fn test_errors_compare_by_kind_and_message() {
        assert_eq!(JsError::type_error("a"), JsError::type_error("a"));
        assert_ne!(JsError::type_error("a"), JsError::internal("a"));
        assert_ne!(JsError::type_error("a"), JsError::type_error("b"));
    }

    #[test]
    fn test_error_into_value() {
        let value: Value = JsError::type_error("boom").into();
        assert!(matches!(value, Value::Error(ref e) if e.kind == ErrorKind::TypeError));
        assert_eq!(value.type_of(), "object");
    }
}
