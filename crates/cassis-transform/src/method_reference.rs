//! Method reference desugaring
//!
//! `Type::method` and `receiver::method` become a lambda whose formal
//! arguments are `arg0..argN` and whose body forwards to the target method.
//! A receiver that is not a plain reference is evaluated once, when the
//! closure is created, and held in a capture field.

use cassis_hir::{Expr, MethodReferenceExpr, MethodReferenceTarget, Scope, Stmt};
use cassis_types::{Type, TypeName};
use log::trace;

use crate::closure::{lift_as, ClosureBody, GeneratedClosure};
use crate::error::LiftError;
use crate::options::LiftOptions;

/// Lift a method reference out of `enclosing` into a fresh class
pub fn lift_method_reference(
    scope: &mut Scope<'_>,
    enclosing: &TypeName,
    reference: MethodReferenceExpr,
    options: &LiftOptions,
) -> Result<GeneratedClosure, LiftError> {
    if reference.method.is_empty() {
        return Err(LiftError::MissingFunctionalMethod {
            span: reference.span,
        });
    }
    let name = scope.fresh_class_name(enclosing);

    let mut values = Vec::new();
    let (params, call) = {
        let mut class_scope = scope.enter_class(&name);
        let mut method_scope = class_scope.enter_method(&reference.method);
        let params: Vec<_> = reference
            .param_types
            .iter()
            .enumerate()
            .map(|(index, ty)| method_scope.fresh_variable(&format!("arg{}", index), ty.clone()))
            .collect();
        let args: Vec<Expr> = params.iter().map(Expr::var).collect();

        let call = match reference.target {
            MethodReferenceTarget::Static(class) => {
                Expr::static_call(class, reference.target_method, args, reference.return_type.clone())
            }
            MethodReferenceTarget::Instance(receiver) => {
                let receiver = match receiver {
                    Expr::Reference(_) => receiver,
                    other => {
                        let temporary = method_scope.fresh_temporary(other.ty());
                        trace!("binding method reference receiver to {}", temporary.name);
                        let bound = Expr::var(&temporary);
                        values.push((temporary, other));
                        bound
                    }
                };
                Expr::call(receiver, reference.target_method, args, reference.return_type.clone())
            }
        };
        (params, call)
    };

    let statements = if reference.return_type == Type::unit() {
        vec![Stmt::Expr(call), Stmt::Return(None)]
    } else {
        vec![Stmt::ret(call)]
    };

    let body = ClosureBody {
        functional_interface: reference.interface,
        functional_method_name: reference.method,
        formal_parameters: params,
        return_type: reference.return_type,
        statements,
        declared_fields: Vec::new(),
        span: reference.span,
    };
    lift_as(scope, name, body, values, options)
}
