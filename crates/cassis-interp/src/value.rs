//! Runtime values

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use cassis_types::TypeName;

/// An instance of a program class
#[derive(Debug)]
pub struct Object {
    pub class: TypeName,
    pub fields: BTreeMap<String, Value>,
}

/// A runtime value
#[derive(Clone, Debug)]
pub enum Value {
    Unit,
    Boolean(bool),
    Integer(i64),
    String(String),
    /// Shared, mutable instance
    Object(Rc<RefCell<Object>>),
}

impl Value {
    pub fn object(class: TypeName, fields: BTreeMap<String, Value>) -> Self {
        Value::Object(Rc::new(RefCell::new(Object { class, fields })))
    }

    /// Name of the value's runtime type, for error messages
    pub fn type_name(&self) -> String {
        match self {
            Value::Unit => "unit".to_string(),
            Value::Boolean(_) => "boolean".to_string(),
            Value::Integer(_) => "integer".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Object(object) => object.borrow().class.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            // Identity, not structure
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => f.write_str("()"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
            Value::Object(object) => write!(f, "<{}>", object.borrow().class),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objects_compare_by_identity() {
        let a = Value::object(TypeName::of("a.Box"), BTreeMap::new());
        let b = Value::object(TypeName::of("a.Box"), BTreeMap::new());
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "<a.Box>");
    }
}
