//! Free-variable analysis
//!
//! A reference inside a closure body is free when its referent is declared
//! outside the body. Everything here is a pure query over the tree: a
//! declaration anywhere underneath the analysed nodes binds the variable,
//! including declarations of closures nested in the body.

use std::collections::{BTreeSet, HashSet};

use cassis_hir::{Expr, Identifier, NodeRef, Reference, VariableDeclaration};
use cassis_types::{TypeName, TypeParameter};

/// Collect every free reference under `nodes`, deduplicated, in order of first occurrence.
///
/// Self references are free unless they name `own_class`, the class whose
/// body is being analysed (anonymous classes refer to their own instance).
pub fn find_free_references(nodes: &[NodeRef<'_>], own_class: Option<&TypeName>) -> Vec<Reference> {
    let descendants: Vec<NodeRef<'_>> = nodes
        .iter()
        .flat_map(|node| node.descendants_and_self())
        .collect();

    let declared: HashSet<&Identifier> = descendants
        .iter()
        .flat_map(|node| node.declarations())
        .map(|declaration| &declaration.id)
        .collect();

    let mut seen: HashSet<Identifier> = HashSet::new();
    let mut free = Vec::new();
    for node in &descendants {
        let reference = match node {
            NodeRef::Expr(Expr::Reference(reference)) => reference,
            _ => continue,
        };
        let is_free = match reference {
            Reference::Variable(declaration) => !declared.contains(&declaration.id),
            Reference::This(class) => own_class != Some(class),
        };
        if is_free && seen.insert(reference.key()) {
            free.push(reference.clone());
        }
    }
    free
}

/// Free variables under `nodes`, in order of first occurrence
pub fn find_free_variables(nodes: &[NodeRef<'_>]) -> Vec<VariableDeclaration> {
    find_free_references(nodes, None)
        .into_iter()
        .filter_map(|reference| match reference {
            Reference::Variable(declaration) => Some(declaration),
            Reference::This(_) => None,
        })
        .collect()
}

/// Type parameters occurring under `nodes` that no node underneath binds.
///
/// Every occurrence counts, so this over-approximates what the body truly
/// depends on.
pub fn find_free_type_parameters(nodes: &[NodeRef<'_>]) -> BTreeSet<TypeParameter> {
    let descendants: Vec<NodeRef<'_>> = nodes
        .iter()
        .flat_map(|node| node.descendants_and_self())
        .collect();

    let bound: HashSet<&TypeParameter> = descendants
        .iter()
        .flat_map(|node| node.declared_type_parameters())
        .collect();

    descendants
        .iter()
        .flat_map(|node| node.types())
        .flat_map(|ty| ty.type_parameters())
        .filter(|parameter| !bound.contains(parameter))
        .cloned()
        .collect()
}
