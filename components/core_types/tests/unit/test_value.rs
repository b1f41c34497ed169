//! Unit tests for Value enum

use core_types::{Function, JsError, PlainObject, Value};

#[cfg(test)]
mod value_creation_tests {
    use super::*;

    #[test]
    fn test_value_from_primitives() {
        assert!(matches!(Value::from(true), Value::Boolean(true)));
        assert!(matches!(Value::from(42), Value::Smi(42)));
        assert!(matches!(Value::from(1.5), Value::Double(n) if n == 1.5));
        assert!(matches!(Value::from("a"), Value::String(ref s) if s == "a"));
        assert!(matches!(Value::from(String::from("b")), Value::String(ref s) if s == "b"));
    }

    #[test]
    fn test_value_smi_bounds() {
        assert!(matches!(Value::Smi(i32::MAX), Value::Smi(n) if n == i32::MAX));
        assert!(matches!(Value::Smi(i32::MIN), Value::Smi(n) if n == i32::MIN));
    }
}

#[cfg(test)]
mod truthiness_tests {
    use super::*;

    #[test]
    fn test_falsy_values() {
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(!Value::Smi(0).is_truthy());
        assert!(!Value::Double(0.0).is_truthy());
        assert!(!Value::Double(-0.0).is_truthy());
        assert!(!Value::Double(f64::NAN).is_truthy());
        assert!(!Value::from("").is_truthy());
    }

    #[test]
    fn test_truthy_values() {
        assert!(Value::Boolean(true).is_truthy());
        assert!(Value::Smi(-1).is_truthy());
        assert!(Value::Double(f64::INFINITY).is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(Value::from(JsError::type_error("x")).is_truthy());
        assert!(PlainObject::new().into_value().is_truthy());
        assert!(Value::from(Function::new(|_| Ok(Value::Undefined))).is_truthy());
    }
}

#[cfg(test)]
mod display_tests {
    use super::*;

    #[test]
    fn test_primitive_display() {
        assert_eq!(Value::Undefined.to_string(), "undefined");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Boolean(false).to_string(), "false");
        assert_eq!(Value::Smi(-7).to_string(), "-7");
        assert_eq!(Value::from("hi").to_string(), "hi");
    }

    #[test]
    fn test_double_display() {
        assert_eq!(Value::Double(3.5).to_string(), "3.5");
        assert_eq!(Value::Double(99.0).to_string(), "99");
        assert_eq!(Value::Double(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Double(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Value::Double(f64::NEG_INFINITY).to_string(), "-Infinity");
    }

    #[test]
    fn test_debug_output() {
        assert_eq!(format!("{:?}", Value::Smi(1)), "Smi(1)");
        assert_eq!(format!("{:?}", Value::Undefined), "Undefined");
        assert_eq!(format!("{:?}", Value::from("s")), "String(\"s\")");
    }
}

#[cfg(test)]
mod equality_tests {
    use super::*;

    #[test]
    fn test_no_coercion() {
        assert_ne!(Value::Undefined, Value::Null);
        assert_ne!(Value::Smi(0), Value::Boolean(false));
        assert_ne!(Value::from("5"), Value::Smi(5));
    }

    #[test]
    fn test_numbers_compare_numerically() {
        assert_eq!(Value::Smi(2), Value::Double(2.0));
        assert_ne!(Value::Smi(2), Value::Double(2.5));
    }

    #[test]
    fn test_functions_compare_by_identity() {
        let f = Function::new(|_| Ok(Value::Undefined));
        let g = Function::new(|_| Ok(Value::Undefined));
        assert_eq!(Value::from(f.clone()), Value::from(f.clone()));
        assert_ne!(Value::from(f), Value::from(g));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;

    #[test]
    fn test_as_function() {
        let f = Function::new(|_| Ok(Value::Undefined));
        assert!(Value::from(f).as_function().is_some());
        assert!(Value::Smi(1).as_function().is_none());
        assert!(PlainObject::new().into_value().as_function().is_none());
    }

    #[test]
    fn test_functions_have_no_properties() {
        let f = Value::from(Function::new(|_| Ok(Value::Undefined)));
        assert_eq!(f.get("then"), Ok(Value::Undefined));
    }

    #[test]
    fn test_object_get() {
        let obj = PlainObject::new().with("then", Value::Smi(3)).into_value();
        assert_eq!(obj.get("then"), Ok(Value::Smi(3)));
    }
}
