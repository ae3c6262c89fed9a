//! Hierarchical identifiers
//!
//! An identifier is the full path from the compilation unit root down to a
//! declaration (`a.Outer / run() / x`). Variable identity is always decided
//! by comparing identifiers, never display names.

use cassis_types::TypeName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of an identifier path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Segment {
    /// A class, by qualified name
    Type(String),
    /// The constructor of the enclosing class
    Constructor,
    /// A method of the enclosing class
    Method(String),
    /// A variable (formal parameter, local, temporary)
    Variable(String),
    /// The implicit instance of the enclosing class
    This,
}

/// Structural path identifying a declaration
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier {
    segments: Vec<Segment>,
}

impl Identifier {
    /// The root of every compilation unit
    pub const TOP: Identifier = Identifier {
        segments: Vec::new(),
    };

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_top(&self) -> bool {
        self.segments.is_empty()
    }

    fn extend(&self, segment: Segment) -> Identifier {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Identifier { segments }
    }

    pub fn type_(&self, qualified_name: &str) -> Identifier {
        self.extend(Segment::Type(qualified_name.to_string()))
    }

    pub fn constructor(&self) -> Identifier {
        self.extend(Segment::Constructor)
    }

    pub fn method(&self, name: &str) -> Identifier {
        self.extend(Segment::Method(name.to_string()))
    }

    pub fn variable(&self, name: &str) -> Identifier {
        self.extend(Segment::Variable(name.to_string()))
    }

    /// Identifier of the implicit instance of `class`
    pub fn this_of(class: &TypeName) -> Identifier {
        Identifier::TOP
            .type_(class.qualified_name())
            .extend(Segment::This)
    }

    /// The enclosing path, or `None` at the root
    pub fn parent(&self) -> Option<Identifier> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Identifier {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Check if `self` is `other` or lies underneath it
    pub fn starts_with(&self, other: &Identifier) -> bool {
        self.segments.starts_with(&other.segments)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<top>");
        }
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                f.write_str("/")?;
            }
            match segment {
                Segment::Type(name) => f.write_str(name)?,
                Segment::Constructor => f.write_str("<init>")?,
                Segment::Method(name) => write!(f, "{}()", name)?,
                Segment::Variable(name) => f.write_str(name)?,
                Segment::This => f.write_str("this")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality() {
        let a = Identifier::TOP.type_("a.Outer").method("run").variable("x");
        let b = Identifier::TOP.type_("a.Outer").method("run").variable("x");
        let c = Identifier::TOP.type_("a.Outer").method("walk").variable("x");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_display() {
        let id = Identifier::TOP.type_("a.Outer").constructor().variable("x");
        assert_eq!(id.to_string(), "a.Outer/<init>/x");
        assert_eq!(Identifier::this_of(&TypeName::of("a.Outer")).to_string(), "a.Outer/this");
        assert_eq!(Identifier::TOP.to_string(), "<top>");
    }

    #[test]
    fn test_parent_and_prefix() {
        let method = Identifier::TOP.type_("a.Outer").method("run");
        let var = method.variable("x");
        assert_eq!(var.parent(), Some(method.clone()));
        assert!(var.starts_with(&method));
        assert!(!method.starts_with(&var));
        assert_eq!(Identifier::TOP.parent(), None);
    }
}
