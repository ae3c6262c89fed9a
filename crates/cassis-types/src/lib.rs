//! Type system for Cassis
//!
//! Defines the type representations shared by the IR, the closure lifter
//! and the evaluator. Types are resolved by the front end; nothing in this
//! crate performs inference.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fully-qualified reference to a declared type (e.g. `com.example.Outer`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(String);

/// Infix used when synthesizing names for lifted closures
pub const ANONYMOUS_INFIX: &str = "_Anonymous_";

impl TypeName {
    pub fn of(qualified_name: impl Into<String>) -> Self {
        TypeName(qualified_name.into())
    }

    /// The fully-qualified name
    pub fn qualified_name(&self) -> &str {
        &self.0
    }

    /// Last segment of the qualified name, used for display
    pub fn own_name(&self) -> &str {
        match self.0.rfind('.') {
            Some(index) => &self.0[index + 1..],
            None => &self.0,
        }
    }

    /// Package portion of the qualified name, if any
    pub fn package(&self) -> Option<&str> {
        self.0.rfind('.').map(|index| &self.0[..index])
    }

    /// Check if this name was synthesized for a lifted closure
    pub fn is_synthesized(&self) -> bool {
        self.strip_anonymous_suffix().is_some()
    }

    /// The nearest named (non-synthesized) type this name derives from.
    ///
    /// `a.Outer_Anonymous_3` yields `a.Outer`; names that were not
    /// synthesized are returned unchanged.
    pub fn named_origin(&self) -> TypeName {
        let mut current = self.0.as_str();
        while let Some(stripped) = strip_anonymous_suffix(current) {
            current = stripped;
        }
        TypeName(current.to_string())
    }

    fn strip_anonymous_suffix(&self) -> Option<&str> {
        strip_anonymous_suffix(&self.0)
    }
}

fn strip_anonymous_suffix(name: &str) -> Option<&str> {
    let index = name.rfind(ANONYMOUS_INFIX)?;
    let counter = &name[index + ANONYMOUS_INFIX.len()..];
    if !counter.is_empty() && counter.bytes().all(|b| b.is_ascii_digit()) {
        Some(&name[..index])
    } else {
        None
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Well-known scalar types understood by every back end
pub mod scalars {
    pub const UNIT: &str = "cassis.Unit";
    pub const BOOLEAN: &str = "cassis.Boolean";
    pub const INTEGER: &str = "cassis.Integer";
    pub const STRING: &str = "cassis.String";
    pub const OBJECT: &str = "cassis.Object";
}

/// A type parameter declared on a generic class or method
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeParameter {
    /// The class or method that declares this parameter
    pub declaration: TypeName,
    /// Name of the parameter (e.g. "T")
    pub name: String,
}

impl TypeParameter {
    pub fn new(declaration: TypeName, name: impl Into<String>) -> Self {
        Self {
            declaration,
            name: name.into(),
        }
    }
}

/// Core type representation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Type {
    /// A non-generic type (or a generic type used raw)
    Scalar { name: TypeName },
    /// A reference to a type parameter (e.g. `T`)
    Parameter { parameter: TypeParameter },
    /// A type parameter whose value is known at this use
    Bound {
        parameter: TypeParameter,
        value: Box<Type>,
    },
    /// A generic type instantiation (e.g. `List<T>`)
    Parameterized {
        raw: TypeName,
        parameters: Vec<Type>,
    },
}

impl Type {
    pub fn scalar(name: impl Into<String>) -> Self {
        Type::Scalar {
            name: TypeName::of(name),
        }
    }

    pub fn named(name: TypeName) -> Self {
        Type::Scalar { name }
    }

    pub fn parameter(parameter: TypeParameter) -> Self {
        Type::Parameter { parameter }
    }

    pub fn parameterized(raw: TypeName, parameters: Vec<Type>) -> Self {
        Type::Parameterized { raw, parameters }
    }

    pub fn unit() -> Self {
        Type::scalar(scalars::UNIT)
    }

    pub fn boolean() -> Self {
        Type::scalar(scalars::BOOLEAN)
    }

    pub fn integer() -> Self {
        Type::scalar(scalars::INTEGER)
    }

    pub fn string() -> Self {
        Type::scalar(scalars::STRING)
    }

    pub fn object() -> Self {
        Type::scalar(scalars::OBJECT)
    }

    /// The declared type this type refers to, ignoring type arguments.
    /// Type parameters resolve through their bound value when known.
    pub fn erasure(&self) -> Option<&TypeName> {
        match self {
            Type::Scalar { name } => Some(name),
            Type::Parameterized { raw, .. } => Some(raw),
            Type::Bound { value, .. } => value.erasure(),
            Type::Parameter { .. } => None,
        }
    }

    /// Collect every type parameter occurring in this type, in order of appearance.
    ///
    /// Bound parameters contribute the parameters of their value rather than
    /// themselves.
    pub fn type_parameters(&self) -> Vec<&TypeParameter> {
        let mut found = Vec::new();
        collect_type_parameters(self, &mut found);
        found
    }
}

fn collect_type_parameters<'a>(ty: &'a Type, found: &mut Vec<&'a TypeParameter>) {
    match ty {
        Type::Scalar { .. } => {}
        Type::Parameter { parameter } => found.push(parameter),
        Type::Bound { value, .. } => collect_type_parameters(value, found),
        Type::Parameterized { parameters, .. } => {
            for parameter in parameters {
                collect_type_parameters(parameter, found);
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Scalar { name } => write!(f, "{}", name),
            Type::Parameter { parameter } => write!(f, "{}", parameter.name),
            Type::Bound { value, .. } => write!(f, "{}", value),
            Type::Parameterized { raw, parameters } => {
                write!(f, "{}<", raw)?;
                for (index, parameter) in parameters.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", parameter)?;
                }
                write!(f, ">")
            }
        }
    }
}
