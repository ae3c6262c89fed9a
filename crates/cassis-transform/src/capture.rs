//! Capture reference rewriting
//!
//! Replaces every reference to a captured binding with a read of the
//! corresponding field on the lifted instance. The tree is otherwise copied
//! unchanged.

use std::collections::HashMap;

use cassis_hir::{Expr, Identifier, MethodReferenceTarget, Stmt};

use crate::error::LiftError;

/// Rewrite `body`, replacing references whose key is in `captures`
pub fn rewrite(body: &[Stmt], captures: &HashMap<Identifier, Expr>) -> Result<Vec<Stmt>, LiftError> {
    let mut body = body.to_vec();
    substitute_captures_in_stmts(&mut body, captures)?;
    Ok(body)
}

fn substitute_captures_in_stmts(
    stmts: &mut [Stmt],
    captures: &HashMap<Identifier, Expr>,
) -> Result<(), LiftError> {
    for stmt in stmts {
        substitute_captures_in_stmt(stmt, captures)?;
    }
    Ok(())
}

fn substitute_captures_in_stmt(
    stmt: &mut Stmt,
    captures: &HashMap<Identifier, Expr>,
) -> Result<(), LiftError> {
    match stmt {
        Stmt::Expr(expr) => substitute_captures(expr, captures),
        Stmt::Return(value) => match value {
            Some(expr) => substitute_captures(expr, captures),
            None => Ok(()),
        },
        Stmt::Local { init, .. } => substitute_captures(init, captures),
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            substitute_captures(condition, captures)?;
            substitute_captures_in_stmts(then_branch, captures)?;
            substitute_captures_in_stmts(else_branch, captures)
        }
        Stmt::While { condition, body } => {
            substitute_captures(condition, captures)?;
            substitute_captures_in_stmts(body, captures)
        }
    }
}

fn substitute_captures(expr: &mut Expr, captures: &HashMap<Identifier, Expr>) -> Result<(), LiftError> {
    match expr {
        Expr::Literal(_) => {}
        Expr::Reference(reference) => {
            if let Some(replacement) = captures.get(&reference.key()) {
                *expr = replacement.clone();
            }
        }
        Expr::Assign { target, value } => {
            substitute_captures(target, captures)?;
            substitute_captures(value, captures)?;
        }
        Expr::FieldAccess { receiver, .. } => {
            substitute_captures(receiver, captures)?;
        }
        Expr::MethodCall { receiver, args, .. } => {
            substitute_captures(receiver, captures)?;
            for arg in args {
                substitute_captures(arg, captures)?;
            }
        }
        Expr::StaticMethodCall { args, .. }
        | Expr::ConstructorCall { args, .. }
        | Expr::Operation { args, .. } => {
            for arg in args {
                substitute_captures(arg, captures)?;
            }
        }
        Expr::Conditional {
            condition,
            if_true,
            if_false,
            ..
        } => {
            substitute_captures(condition, captures)?;
            substitute_captures(if_true, captures)?;
            substitute_captures(if_false, captures)?;
        }
        Expr::Lambda(lambda) => {
            return Err(LiftError::UnsupportedConstruct {
                construct: "lambda".to_string(),
                span: lambda.span,
            });
        }
        Expr::MethodReference(reference) => {
            let construct = match reference.target {
                MethodReferenceTarget::Static(_) => "static method reference",
                MethodReferenceTarget::Instance(_) => "bound method reference",
            };
            return Err(LiftError::UnsupportedConstruct {
                construct: construct.to_string(),
                span: reference.span,
            });
        }
        Expr::AnonymousClass(class) => {
            return Err(LiftError::UnsupportedConstruct {
                construct: format!("anonymous class {}", class.class),
                span: class.span,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cassis_hir::{LambdaExpr, VariableDeclaration};
    use cassis_types::{Type, TypeName};

    fn var(name: &str) -> VariableDeclaration {
        VariableDeclaration::new(
            Identifier::TOP.type_("a.Outer").method("run").variable(name),
            name,
            Type::integer(),
        )
    }

    fn field_of_generated(name: &str) -> Expr {
        Expr::field(
            Expr::this(TypeName::of("a.Outer_Anonymous_0")),
            name,
            Type::integer(),
        )
    }

    #[test]
    fn test_captured_references_become_field_reads() {
        let y = var("y");
        let y2 = var("y2");
        let body = vec![
            Stmt::local(y2.clone(), Expr::add(Expr::var(&y), Expr::int(1))),
            Stmt::ret(Expr::var(&y2)),
        ];
        let captures = HashMap::from([(y.id.clone(), field_of_generated("y"))]);

        let rewritten = rewrite(&body, &captures).unwrap();
        assert_eq!(
            rewritten,
            vec![
                Stmt::local(y2.clone(), Expr::add(field_of_generated("y"), Expr::int(1))),
                Stmt::ret(Expr::var(&y2)),
            ]
        );
    }

    #[test]
    fn test_nested_statements_are_rewritten() {
        let x = var("x");
        let body = vec![Stmt::While {
            condition: Expr::operation(
                cassis_hir::Operator::Less,
                vec![Expr::var(&x), Expr::int(10)],
                Type::boolean(),
            ),
            body: vec![Stmt::If {
                condition: Expr::bool(true),
                then_branch: vec![Stmt::Expr(Expr::call(
                    Expr::var(&x),
                    "run",
                    vec![Expr::var(&x)],
                    Type::unit(),
                ))],
                else_branch: Vec::new(),
            }],
        }];
        let captures = HashMap::from([(x.id.clone(), field_of_generated("x"))]);

        let rewritten = rewrite(&body, &captures).unwrap();
        let remaining = cassis_hir::NodeRef::Stmt(&rewritten[0])
            .descendants_and_self()
            .into_iter()
            .filter(|node| matches!(node, cassis_hir::NodeRef::Expr(Expr::Reference(r)) if r.key() == x.id))
            .count();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_empty_capture_map_is_identity() {
        let body = vec![Stmt::ret(Expr::int(42))];
        assert_eq!(rewrite(&body, &HashMap::new()).unwrap(), body);
    }

    #[test]
    fn test_unlifted_closure_is_unsupported() {
        let body = vec![Stmt::ret(Expr::Lambda(Box::new(LambdaExpr {
            interface: TypeName::of("a.Supplier"),
            method: "get".to_string(),
            params: Vec::new(),
            return_type: Type::integer(),
            body: vec![Stmt::ret(Expr::int(1))],
            span: Default::default(),
        })))];
        let err = rewrite(&body, &HashMap::new()).unwrap_err();
        assert!(matches!(err, LiftError::UnsupportedConstruct { ref construct, .. } if construct == "lambda"));
    }
}
