//! Closure Lifting
//!
//! Turns a closure body into a standalone class:
//! - one field per captured binding, in first-occurrence order
//! - a constructor taking one argument per capture and storing it
//! - the body's methods, with captured references rewritten to field reads
//!
//! The caller appends the class to the program and replaces the closure
//! literal with `GeneratedClosure::construction()`.

use std::collections::{HashMap, HashSet};

use cassis_diagnostics::Span;
use cassis_hir::{
    AnonymousClassExpr, ClassNode, ConstructorNode, Expr, FieldDeclaration, Identifier, MethodNode, NodeRef, Reference,
    Scope, Stmt, VariableDeclaration,
};
use cassis_types::{Type, TypeName, TypeParameter};
use log::{debug, trace};

use crate::capture;
use crate::error::LiftError;
use crate::free_vars::{find_free_references, find_free_type_parameters};
use crate::options::LiftOptions;
use crate::rename::Renaming;

/// A closure as handed over by the front end
#[derive(Debug, Clone, PartialEq)]
pub struct ClosureBody {
    /// Interface the lifted class implements
    pub functional_interface: TypeName,
    pub functional_method_name: String,
    pub formal_parameters: Vec<VariableDeclaration>,
    pub return_type: Type,
    pub statements: Vec<Stmt>,
    /// Only non-empty for closures that declare their own fields
    pub declared_fields: Vec<FieldDeclaration>,
    pub span: Span,
}

/// Something a lifted class holds a copy of
#[derive(Debug, Clone, PartialEq)]
pub enum Capture {
    /// A variable of the enclosing scope
    Variable(VariableDeclaration),
    /// The enclosing instance
    This(TypeName),
    /// A value computed once where the closure is created
    Value {
        temporary: VariableDeclaration,
        value: Expr,
    },
}

impl Capture {
    fn from_reference(reference: Reference, values: &[(VariableDeclaration, Expr)]) -> Self {
        match reference {
            Reference::Variable(declaration) => {
                match values.iter().find(|(temporary, _)| temporary.id == declaration.id) {
                    Some((temporary, value)) => Capture::Value {
                        temporary: temporary.clone(),
                        value: value.clone(),
                    },
                    None => Capture::Variable(declaration),
                }
            }
            Reference::This(class) => Capture::This(class),
        }
    }

    /// Identity of the captured binding
    pub fn key(&self) -> Identifier {
        match self {
            Capture::Variable(declaration) => declaration.id.clone(),
            Capture::This(class) => Identifier::this_of(class),
            Capture::Value { temporary, .. } => temporary.id.clone(),
        }
    }

    pub fn ty(&self) -> Type {
        match self {
            Capture::Variable(declaration) => declaration.ty.clone(),
            Capture::This(class) => Type::named(class.clone()),
            Capture::Value { temporary, .. } => temporary.ty.clone(),
        }
    }

    /// Name the capture field gets when nothing clashes with it
    pub fn preferred_name<'a>(&'a self, options: &'a LiftOptions) -> &'a str {
        match self {
            Capture::Variable(declaration) => &declaration.name,
            Capture::This(_) => &options.self_field_name,
            Capture::Value { temporary, .. } => &temporary.name,
        }
    }

    /// The captured binding as a declaration
    pub fn declaration(&self) -> VariableDeclaration {
        match self {
            Capture::Variable(declaration) => declaration.clone(),
            Capture::This(class) => {
                VariableDeclaration::new(Identifier::this_of(class), "this", Type::named(class.clone()))
            }
            Capture::Value { temporary, .. } => temporary.clone(),
        }
    }

    /// Constructor argument supplying this capture, evaluated in the enclosing scope
    pub fn argument(&self) -> Expr {
        match self {
            Capture::Variable(declaration) => Expr::var(declaration),
            Capture::This(class) => Expr::this(class.clone()),
            Capture::Value { value, .. } => value.clone(),
        }
    }
}

/// A lifted closure
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedClosure {
    pub class_node: ClassNode,
    /// Captures in constructor argument order
    pub captures: Vec<Capture>,
    /// Field holding each capture, parallel to `captures`
    pub capture_fields: Vec<String>,
}

impl GeneratedClosure {
    /// Captured bindings, in first-occurrence order
    pub fn captured_variables(&self) -> Vec<VariableDeclaration> {
        self.captures.iter().map(Capture::declaration).collect()
    }

    /// Expression instantiating the lifted class at the closure's original position
    pub fn construction(&self) -> Expr {
        let class = &self.class_node;
        let ty = if class.type_params.is_empty() {
            Type::named(class.name.clone())
        } else {
            Type::parameterized(
                class.name.clone(),
                class.type_params.iter().cloned().map(Type::parameter).collect(),
            )
        };
        Expr::construct(ty, self.captures.iter().map(Capture::argument).collect())
    }
}

/// The class being synthesized, before captures are known
pub(crate) struct ClassShape {
    pub name: TypeName,
    pub super_types: Vec<TypeName>,
    pub declared_fields: Vec<FieldDeclaration>,
    pub methods: Vec<MethodNode>,
    /// Class whose self references stay bound inside the body
    pub own_class: Option<TypeName>,
    pub span: Span,
}

/// Lift `body` out of `enclosing` into a fresh class
pub fn lift(
    scope: &mut Scope<'_>,
    enclosing: &TypeName,
    body: ClosureBody,
    options: &LiftOptions,
) -> Result<GeneratedClosure, LiftError> {
    if body.functional_method_name.is_empty() {
        return Err(LiftError::MissingFunctionalMethod { span: body.span });
    }
    let name = scope.fresh_class_name(enclosing);
    lift_as(scope, name, body, Vec::new(), options)
}

/// Lift `body` under an already minted class name.
///
/// `values` pairs temporaries referenced by the body with the expressions
/// that initialise them when the closure is created.
pub(crate) fn lift_as(
    scope: &mut Scope<'_>,
    name: TypeName,
    body: ClosureBody,
    values: Vec<(VariableDeclaration, Expr)>,
    options: &LiftOptions,
) -> Result<GeneratedClosure, LiftError> {
    let method = MethodNode::new(
        body.functional_method_name,
        body.formal_parameters,
        body.return_type,
        body.statements,
    );
    let shape = ClassShape {
        name,
        super_types: vec![body.functional_interface],
        declared_fields: body.declared_fields,
        methods: vec![method],
        own_class: None,
        span: body.span,
    };
    class_with_capture(scope, shape, &values, options)
}

pub(crate) fn class_with_capture(
    scope: &mut Scope<'_>,
    shape: ClassShape,
    values: &[(VariableDeclaration, Expr)],
    options: &LiftOptions,
) -> Result<GeneratedClosure, LiftError> {
    let ClassShape {
        name,
        super_types,
        declared_fields,
        methods,
        own_class,
        span,
    } = shape;

    let mut nodes: Vec<NodeRef<'_>> = declared_fields.iter().map(NodeRef::Field).collect();
    nodes.extend(methods.iter().map(NodeRef::Method));

    let captures: Vec<Capture> = find_free_references(&nodes, own_class.as_ref())
        .into_iter()
        .map(|reference| Capture::from_reference(reference, values))
        .collect();
    let type_params: Vec<TypeParameter> = find_free_type_parameters(&nodes).into_iter().collect();

    let mut taken: HashSet<String> = declared_fields.iter().map(|f| f.name.clone()).collect();
    let capture_fields: Vec<String> = captures
        .iter()
        .map(|capture| claim_field_name(&mut taken, capture.preferred_name(options)))
        .collect();

    let capture_access = |field: &str, ty: Type| Expr::field(Expr::this(name.clone()), field, ty);

    let lookup: HashMap<Identifier, Expr> = captures
        .iter()
        .zip(&capture_fields)
        .map(|(capture, field)| (capture.key(), capture_access(field, capture.ty())))
        .collect();

    let methods = methods
        .into_iter()
        .map(|method| {
            let body = capture::rewrite(&method.body, &lookup).map_err(|err| err.at(span))?;
            Ok(MethodNode { body, ..method })
        })
        .collect::<Result<Vec<_>, LiftError>>()?;

    let constructor = {
        let mut class_scope = scope.enter_class(&name);
        let mut constructor_scope = class_scope.enter_constructor();
        let mut params = Vec::with_capacity(captures.len());
        let mut body = Vec::with_capacity(captures.len());
        for (capture, field) in captures.iter().zip(&capture_fields) {
            let param = constructor_scope.fresh_variable(capture.preferred_name(options), capture.ty());
            trace!("capture {} -> {}.{} via {}", capture.key(), name, field, param.id);
            body.push(Stmt::assign(capture_access(field, capture.ty()), Expr::var(&param)));
            params.push(param);
        }
        ConstructorNode { params, body }
    };

    let mut fields = declared_fields;
    fields.extend(
        captures
            .iter()
            .zip(&capture_fields)
            .map(|(capture, field)| FieldDeclaration::new(field.clone(), capture.ty())),
    );

    debug!(
        "lifted closure {} with {} capture(s) and {} type parameter(s)",
        name,
        captures.len(),
        type_params.len()
    );

    Ok(GeneratedClosure {
        class_node: ClassNode {
            name,
            type_params,
            super_types,
            fields,
            constructor,
            methods,
            span,
        },
        captures,
        capture_fields,
    })
}

/// Reserve `preferred`, or the first free `preferred_N`
fn claim_field_name(taken: &mut HashSet<String>, preferred: &str) -> String {
    let mut candidate = preferred.to_string();
    let mut index = 0;
    while taken.contains(&candidate) {
        candidate = format!("{}_{}", preferred, index);
        index += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

/// Lift an anonymous class body out of `enclosing`.
///
/// The class is renamed from its front-end name to a fresh name; references
/// to its own instance stay bound.
pub fn lift_anonymous_class(
    scope: &mut Scope<'_>,
    enclosing: &TypeName,
    mut class: AnonymousClassExpr,
    options: &LiftOptions,
) -> Result<GeneratedClosure, LiftError> {
    let name = scope.fresh_class_name(enclosing);
    trace!("anonymous class {} lifted as {}", class.class, name);
    let renaming = Renaming {
        from: &class.class,
        to: &name,
    };
    renaming.fields(&mut class.fields);
    renaming.methods(&mut class.methods);

    let shape = ClassShape {
        name: name.clone(),
        super_types: class.super_types,
        declared_fields: class.fields,
        methods: class.methods,
        own_class: Some(name),
        span: class.span,
    };
    class_with_capture(scope, shape, &[], options)
}
