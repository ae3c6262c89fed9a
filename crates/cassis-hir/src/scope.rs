//! Identifier and scope allocation
//!
//! A `ScopeTable` is the only mutable state of a lowering pass. It is created
//! once per compilation unit and shared by every `Scope` derived from it, so
//! names minted in sibling branches of the traversal never collide.
//!
//! ```
//! use cassis_hir::ScopeTable;
//! use cassis_types::{Type, TypeName};
//!
//! let mut table = ScopeTable::new();
//! let mut root = table.root();
//! let mut class = root.enter_class(&TypeName::of("a.Outer"));
//! let mut method = class.enter_method("run");
//! let first = method.fresh_variable("x", Type::integer());
//! let second = method.fresh_variable("x", Type::integer());
//! assert_eq!(first.name, "x");
//! assert_eq!(second.name, "x_0");
//! ```

use std::collections::{HashMap, HashSet};

use cassis_types::{Type, TypeName, ANONYMOUS_INFIX};
use log::trace;
use thiserror::Error;

use crate::identifier::Identifier;
use crate::ir::{Expr, Program, VariableDeclaration};
use crate::structure::NodeRef;

/// Prefix for temporaries minted by the lowering pass
pub const DEFAULT_TEMPORARY_PREFIX: &str = "_cassis_tmp_";

/// Errors raised by the allocator when the caller misuses a source key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("key `{key}` is already bound in {scope}")]
    AlreadyBound { key: String, scope: Identifier },

    #[error("variable not found: {key}")]
    Unbound { key: String },

    #[error("identifier {id} is declared more than once")]
    Redeclared { id: Identifier },
}

/// Per-unit identifier table and counters
#[derive(Debug)]
pub struct ScopeTable {
    identifiers: HashSet<Identifier>,
    /// Source keys, bound per scope segment
    keys: HashMap<(Identifier, String), VariableDeclaration>,
    next_anonymous: usize,
    next_temporary: usize,
    temporary_prefix: String,
}

impl Default for ScopeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTable {
    pub fn new() -> Self {
        Self::with_temporary_prefix(DEFAULT_TEMPORARY_PREFIX)
    }

    pub fn with_temporary_prefix(prefix: impl Into<String>) -> Self {
        Self {
            identifiers: HashSet::new(),
            keys: HashMap::new(),
            next_anonymous: 0,
            next_temporary: 0,
            temporary_prefix: prefix.into(),
        }
    }

    /// Scope positioned at the root of the unit
    pub fn root(&mut self) -> Scope<'_> {
        Scope {
            table: self,
            path: Identifier::TOP,
        }
    }

    /// Record an identifier minted elsewhere. Returns false if it was already taken.
    pub fn reserve(&mut self, id: Identifier) -> bool {
        self.identifiers.insert(id)
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.identifiers.contains(id)
    }

    /// Record every class name and variable already declared in `program`.
    ///
    /// Fails if two declarations in the program share one identifier.
    pub fn reserve_program(&mut self, program: &Program) -> Result<(), ScopeError> {
        let mut declared = Vec::new();
        for class in &program.classes {
            declared.push(Identifier::TOP.type_(class.name.qualified_name()));
            NodeRef::Class(class).walk(&mut |node| {
                if let NodeRef::Expr(Expr::AnonymousClass(anonymous)) = node {
                    declared.push(Identifier::TOP.type_(anonymous.class.qualified_name()));
                }
                declared.extend(node.declarations().into_iter().map(|d| d.id.clone()));
            });
        }
        for id in declared {
            if !self.identifiers.insert(id.clone()) {
                return Err(ScopeError::Redeclared { id });
            }
        }
        trace!(
            "reserved {} identifiers for unit {}",
            self.identifiers.len(),
            program.name
        );
        Ok(())
    }

    /// Number of class names handed out so far
    pub fn anonymous_count(&self) -> usize {
        self.next_anonymous
    }
}

/// A position in the identifier hierarchy, backed by the unit's table
#[derive(Debug)]
pub struct Scope<'t> {
    table: &'t mut ScopeTable,
    path: Identifier,
}

impl<'t> Scope<'t> {
    /// The current path
    pub fn path(&self) -> &Identifier {
        &self.path
    }

    fn enter(&mut self, path: Identifier) -> Scope<'_> {
        Scope {
            table: &mut *self.table,
            path,
        }
    }

    pub fn enter_class(&mut self, name: &TypeName) -> Scope<'_> {
        let path = self.path.type_(name.qualified_name());
        self.enter(path)
    }

    pub fn enter_constructor(&mut self) -> Scope<'_> {
        let path = self.path.constructor();
        self.enter(path)
    }

    pub fn enter_method(&mut self, name: &str) -> Scope<'_> {
        let path = self.path.method(name);
        self.enter(path)
    }

    /// Mint a variable under the current path, suffixing `_0`, `_1`, ...
    /// only when `name` is already taken here.
    pub fn fresh_variable(&mut self, name: &str, ty: Type) -> VariableDeclaration {
        let mut chosen = name.to_string();
        let mut id = self.path.variable(&chosen);
        let mut index = 0;
        while self.table.identifiers.contains(&id) {
            chosen = format!("{}_{}", name, index);
            id = self.path.variable(&chosen);
            index += 1;
        }
        self.table.identifiers.insert(id.clone());
        trace!("fresh variable {}", id);
        VariableDeclaration::new(id, chosen, ty)
    }

    /// Mint a variable with the reserved temporary prefix
    pub fn fresh_temporary(&mut self, ty: Type) -> VariableDeclaration {
        let name = format!("{}{}", self.table.temporary_prefix, self.table.next_temporary);
        self.table.next_temporary += 1;
        self.fresh_variable(&name, ty)
    }

    /// Declare the variable for source key `key` in the current segment
    pub fn declare_variable(
        &mut self,
        key: &str,
        name: &str,
        ty: Type,
    ) -> Result<VariableDeclaration, ScopeError> {
        let slot = (self.path.clone(), key.to_string());
        if self.table.keys.contains_key(&slot) {
            return Err(ScopeError::AlreadyBound {
                key: key.to_string(),
                scope: self.path.clone(),
            });
        }
        let declaration = self.fresh_variable(name, ty);
        self.table.keys.insert(slot, declaration.clone());
        Ok(declaration)
    }

    /// Resolve `key` from the current segment outwards
    pub fn lookup(&self, key: &str) -> Result<&VariableDeclaration, ScopeError> {
        let mut path = Some(self.path.clone());
        while let Some(current) = path {
            if let Some(declaration) = self.table.keys.get(&(current.clone(), key.to_string())) {
                return Ok(declaration);
            }
            path = current.parent();
        }
        Err(ScopeError::Unbound {
            key: key.to_string(),
        })
    }

    /// A reference expression to the variable bound to `key`
    pub fn reference(&self, key: &str) -> Result<Expr, ScopeError> {
        self.lookup(key).map(Expr::var)
    }

    /// Name for a closure lifted out of `enclosing`.
    ///
    /// The name derives from the nearest named ancestor of `enclosing` and a
    /// counter shared by the whole unit. Names already declared in the unit
    /// are skipped.
    pub fn fresh_class_name(&mut self, enclosing: &TypeName) -> TypeName {
        let origin = enclosing.named_origin();
        loop {
            let candidate = TypeName::of(format!(
                "{}{}{}",
                origin.qualified_name(),
                ANONYMOUS_INFIX,
                self.table.next_anonymous
            ));
            self.table.next_anonymous += 1;
            if self
                .table
                .identifiers
                .insert(Identifier::TOP.type_(candidate.qualified_name()))
            {
                trace!("fresh class name {}", candidate);
                return candidate;
            }
        }
    }
}
