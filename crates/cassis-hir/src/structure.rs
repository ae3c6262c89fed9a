//! Uniform structural view over HIR nodes
//!
//! Analyses that only care about "what is underneath this node" (free
//! variables, declared identifiers, occurring types) walk `NodeRef`s instead
//! of matching every node kind themselves. Children are always yielded in
//! syntactic order, so a pre-order walk visits nodes in first-occurrence order.

use cassis_types::{Type, TypeParameter};

use crate::ir::*;

/// Borrowed reference to any node in the tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Class(&'a ClassNode),
    Field(&'a FieldDeclaration),
    Constructor(&'a ConstructorNode),
    Method(&'a MethodNode),
    Stmt(&'a Stmt),
    Expr(&'a Expr),
}

impl<'a> NodeRef<'a> {
    /// Immediate children, in syntactic order
    pub fn children(self) -> Vec<NodeRef<'a>> {
        match self {
            NodeRef::Class(class) => {
                let mut children: Vec<NodeRef<'a>> =
                    class.fields.iter().map(NodeRef::Field).collect();
                children.push(NodeRef::Constructor(&class.constructor));
                children.extend(class.methods.iter().map(NodeRef::Method));
                children
            }
            NodeRef::Field(_) => Vec::new(),
            NodeRef::Constructor(constructor) => stmts(&constructor.body),
            NodeRef::Method(method) => stmts(&method.body),
            NodeRef::Stmt(stmt) => stmt_children(stmt),
            NodeRef::Expr(expr) => expr_children(expr),
        }
    }

    /// Variables introduced by this node (formal parameters, local declarations)
    pub fn declarations(self) -> Vec<&'a VariableDeclaration> {
        match self {
            NodeRef::Constructor(constructor) => constructor.params.iter().collect(),
            NodeRef::Method(method) => method.params.iter().collect(),
            NodeRef::Stmt(Stmt::Local { declaration, .. }) => vec![declaration],
            NodeRef::Expr(Expr::Lambda(lambda)) => lambda.params.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Type parameters bound by this node
    pub fn declared_type_parameters(self) -> &'a [TypeParameter] {
        match self {
            NodeRef::Class(class) => &class.type_params,
            NodeRef::Method(method) => &method.type_params,
            _ => &[],
        }
    }

    /// Types written at this node: declared types, signatures,
    /// instantiated types and explicit type arguments
    pub fn types(self) -> Vec<&'a Type> {
        match self {
            NodeRef::Class(_) => Vec::new(),
            NodeRef::Constructor(constructor) => constructor.params.iter().map(|p| &p.ty).collect(),
            NodeRef::Field(field) => vec![&field.ty],
            NodeRef::Method(method) => {
                let mut types: Vec<&'a Type> = method.params.iter().map(|p| &p.ty).collect();
                types.push(&method.return_type);
                types
            }
            NodeRef::Stmt(Stmt::Local { declaration, .. }) => vec![&declaration.ty],
            NodeRef::Stmt(_) => Vec::new(),
            NodeRef::Expr(expr) => match expr {
                Expr::Reference(Reference::Variable(declaration)) => vec![&declaration.ty],
                Expr::MethodCall { type_args, .. } | Expr::StaticMethodCall { type_args, .. } => {
                    type_args.iter().collect()
                }
                Expr::ConstructorCall { ty, .. } => vec![ty],
                Expr::Lambda(lambda) => {
                    let mut types: Vec<&'a Type> = lambda.params.iter().map(|p| &p.ty).collect();
                    types.push(&lambda.return_type);
                    types
                }
                Expr::MethodReference(reference) => {
                    let mut types: Vec<&'a Type> = reference.param_types.iter().collect();
                    types.push(&reference.return_type);
                    types
                }
                _ => Vec::new(),
            },
        }
    }

    /// Visit this node and everything underneath it in pre-order
    pub fn walk<F: FnMut(NodeRef<'a>)>(self, visit: &mut F) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// This node followed by all of its descendants, in pre-order
    pub fn descendants_and_self(self) -> Vec<NodeRef<'a>> {
        let mut nodes = Vec::new();
        self.walk(&mut |node| nodes.push(node));
        nodes
    }
}

fn stmts(body: &[Stmt]) -> Vec<NodeRef<'_>> {
    body.iter().map(NodeRef::Stmt).collect()
}

fn stmt_children(stmt: &Stmt) -> Vec<NodeRef<'_>> {
    match stmt {
        Stmt::Expr(expr) => vec![NodeRef::Expr(expr)],
        Stmt::Return(value) => value.iter().map(NodeRef::Expr).collect(),
        Stmt::Local { init, .. } => vec![NodeRef::Expr(init)],
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let mut children = vec![NodeRef::Expr(condition)];
            children.extend(then_branch.iter().map(NodeRef::Stmt));
            children.extend(else_branch.iter().map(NodeRef::Stmt));
            children
        }
        Stmt::While { condition, body } => {
            let mut children = vec![NodeRef::Expr(condition)];
            children.extend(body.iter().map(NodeRef::Stmt));
            children
        }
    }
}

fn expr_children(expr: &Expr) -> Vec<NodeRef<'_>> {
    match expr {
        Expr::Literal(_) | Expr::Reference(_) => Vec::new(),
        Expr::Assign { target, value } => vec![NodeRef::Expr(target), NodeRef::Expr(value)],
        Expr::FieldAccess { receiver, .. } => vec![NodeRef::Expr(receiver)],
        Expr::MethodCall { receiver, args, .. } => {
            let mut children = vec![NodeRef::Expr(receiver.as_ref())];
            children.extend(args.iter().map(NodeRef::Expr));
            children
        }
        Expr::StaticMethodCall { args, .. }
        | Expr::ConstructorCall { args, .. }
        | Expr::Operation { args, .. } => args.iter().map(NodeRef::Expr).collect(),
        Expr::Conditional {
            condition,
            if_true,
            if_false,
            ..
        } => vec![
            NodeRef::Expr(condition),
            NodeRef::Expr(if_true),
            NodeRef::Expr(if_false),
        ],
        Expr::Lambda(lambda) => stmts(&lambda.body),
        Expr::MethodReference(reference) => match &reference.target {
            MethodReferenceTarget::Static(_) => Vec::new(),
            MethodReferenceTarget::Instance(receiver) => vec![NodeRef::Expr(receiver)],
        },
        Expr::AnonymousClass(class) => {
            let mut children: Vec<NodeRef<'_>> = class.fields.iter().map(NodeRef::Field).collect();
            children.extend(class.methods.iter().map(NodeRef::Method));
            children
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::Identifier;
    use cassis_types::TypeName;

    fn var(name: &str) -> VariableDeclaration {
        VariableDeclaration::new(
            Identifier::TOP.type_("a.Outer").method("run").variable(name),
            name,
            Type::integer(),
        )
    }

    #[test]
    fn test_pre_order_follows_syntax() {
        let x = var("x");
        let y = var("y");
        let body = Stmt::ret(Expr::add(Expr::var(&x), Expr::var(&y)));
        let nodes = NodeRef::Stmt(&body).descendants_and_self();
        let refs: Vec<&str> = nodes
            .iter()
            .filter_map(|node| match node {
                NodeRef::Expr(Expr::Reference(Reference::Variable(d))) => Some(d.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(refs, vec!["x", "y"]);
        assert!(matches!(nodes[0], NodeRef::Stmt(_)));
    }

    #[test]
    fn test_lambda_params_are_declarations() {
        let p = var("p");
        let lambda = Expr::Lambda(Box::new(LambdaExpr {
            interface: TypeName::of("a.Function"),
            method: "apply".to_string(),
            params: vec![p.clone()],
            return_type: Type::integer(),
            body: vec![Stmt::ret(Expr::var(&p))],
            span: Default::default(),
        }));
        assert_eq!(NodeRef::Expr(&lambda).declarations(), vec![&p]);
        assert_eq!(NodeRef::Expr(&lambda).descendants_and_self().len(), 3);
    }

    #[test]
    fn test_if_children_in_order() {
        let x = var("x");
        let stmt = Stmt::If {
            condition: Expr::bool(true),
            then_branch: vec![Stmt::ret(Expr::var(&x))],
            else_branch: vec![Stmt::ret(Expr::int(0))],
        };
        let children = NodeRef::Stmt(&stmt).children();
        assert_eq!(children.len(), 3);
        assert!(matches!(children[0], NodeRef::Expr(Expr::Literal(_))));
    }
}
