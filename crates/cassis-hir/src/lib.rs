//! High-level Intermediate Representation (HIR) for Cassis
//!
//! The HIR is a language-neutral tree of classes, methods, statements and
//! expressions. This crate also owns the identifier allocator that every
//! lowering step uses to mint collision-free names.

pub mod identifier;
pub mod ir;
pub mod scope;
pub mod structure;

pub use identifier::{Identifier, Segment};
pub use ir::*;
pub use scope::{Scope, ScopeError, ScopeTable};
pub use structure::NodeRef;
