//! Whole-program closure conversion
//!
//! Walks every class of a compilation unit in order, lifts each closure
//! literal (innermost first), replaces it with the construction of its lifted
//! class and appends the lifted classes to the program.

use cassis_diagnostics::{Diagnostic, DiagnosticCode, Span};
use cassis_hir::{ClassNode, Expr, Literal, MethodReferenceTarget, Program, Scope, ScopeTable, Stmt};
use cassis_types::TypeName;
use log::debug;
use serde::Serialize;

use crate::closure::{lift, lift_anonymous_class, ClosureBody, GeneratedClosure};
use crate::error::LiftError;
use crate::method_reference::lift_method_reference;
use crate::options::LiftOptions;
use crate::rename::Renaming;

/// Which kind of closure literal a class was lifted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosureForm {
    Lambda,
    MethodReference,
    AnonymousClass,
}

/// Summary of one lifted closure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiftReport {
    pub class_name: TypeName,
    pub form: ClosureForm,
    /// Named class the closure was written in
    pub enclosing: TypeName,
    /// Capture fields, in constructor argument order
    pub captures: Vec<String>,
    /// Capture fields that had to be renamed: (preferred, actual)
    pub renamed: Vec<(String, String)>,
    pub span: Span,
}

impl LiftReport {
    fn new(
        generated: &GeneratedClosure,
        form: ClosureForm,
        enclosing: &TypeName,
        span: Span,
        options: &LiftOptions,
    ) -> Self {
        let renamed = generated
            .captures
            .iter()
            .zip(&generated.capture_fields)
            .filter(|(capture, field)| capture.preferred_name(options) != field.as_str())
            .map(|(capture, field)| (capture.preferred_name(options).to_string(), field.clone()))
            .collect();
        Self {
            class_name: generated.class_node.name.clone(),
            form,
            enclosing: enclosing.named_origin(),
            captures: generated.capture_fields.clone(),
            renamed,
            span,
        }
    }

    /// Warnings for capture fields that could not keep their preferred name
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.renamed
            .iter()
            .map(|(preferred, actual)| {
                Diagnostic::warning(
                    DiagnosticCode::RenamedCaptureField,
                    format!(
                        "capture field `{}` of {} renamed to `{}`",
                        preferred, self.class_name, actual
                    ),
                )
                .with_span(self.span)
                .with_note("the preferred name is already a field of the lifted class")
                .build()
            })
            .collect()
    }
}

/// Lift every closure in `program`.
///
/// One `ScopeTable` is created for the unit, so generated names are unique
/// within it and identical across runs on the same input.
pub fn convert_closures(program: &mut Program, options: &LiftOptions) -> Result<Vec<LiftReport>, LiftError> {
    let mut table = ScopeTable::with_temporary_prefix(options.temporary_prefix.clone());
    table.reserve_program(program)?;

    let mut converter = Converter {
        options,
        lifted: Vec::new(),
        reports: Vec::new(),
    };
    let mut root = table.root();
    for class in &mut program.classes {
        let name = class.name.clone();
        let span = class.span;
        let mut class_scope = root.enter_class(&name);
        converter
            .convert_class(&mut class_scope, &name, class)
            .map_err(|err| err.at(span))?;
    }

    debug!(
        "lifted {} closure(s) in {}",
        converter.reports.len(),
        program.name
    );
    program.classes.extend(converter.lifted);
    Ok(converter.reports)
}

struct Converter<'o> {
    options: &'o LiftOptions,
    lifted: Vec<ClassNode>,
    reports: Vec<LiftReport>,
}

impl Converter<'_> {
    fn convert_class(
        &mut self,
        class_scope: &mut Scope<'_>,
        enclosing: &TypeName,
        class: &mut ClassNode,
    ) -> Result<(), LiftError> {
        {
            let mut constructor_scope = class_scope.enter_constructor();
            self.convert_stmts(&mut constructor_scope, enclosing, &mut class.constructor.body)?;
        }
        for method in &mut class.methods {
            let mut method_scope = class_scope.enter_method(&method.name);
            self.convert_stmts(&mut method_scope, enclosing, &mut method.body)?;
        }
        Ok(())
    }

    fn convert_stmts(
        &mut self,
        scope: &mut Scope<'_>,
        enclosing: &TypeName,
        stmts: &mut [Stmt],
    ) -> Result<(), LiftError> {
        for stmt in stmts {
            self.convert_stmt(scope, enclosing, stmt)?;
        }
        Ok(())
    }

    fn convert_stmt(&mut self, scope: &mut Scope<'_>, enclosing: &TypeName, stmt: &mut Stmt) -> Result<(), LiftError> {
        match stmt {
            Stmt::Expr(expr) | Stmt::Return(Some(expr)) | Stmt::Local { init: expr, .. } => {
                self.convert_expr(scope, enclosing, expr)
            }
            Stmt::Return(None) => Ok(()),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.convert_expr(scope, enclosing, condition)?;
                self.convert_stmts(scope, enclosing, then_branch)?;
                self.convert_stmts(scope, enclosing, else_branch)
            }
            Stmt::While { condition, body } => {
                self.convert_expr(scope, enclosing, condition)?;
                self.convert_stmts(scope, enclosing, body)
            }
        }
    }

    fn convert_expr(&mut self, scope: &mut Scope<'_>, enclosing: &TypeName, expr: &mut Expr) -> Result<(), LiftError> {
        let nested_from = self.lifted.len();
        // Children first, so nested closures are lifted before the closure containing them
        match expr {
            Expr::Literal(_) | Expr::Reference(_) => {}
            Expr::Assign { target, value } => {
                self.convert_expr(scope, enclosing, target)?;
                self.convert_expr(scope, enclosing, value)?;
            }
            Expr::FieldAccess { receiver, .. } => self.convert_expr(scope, enclosing, receiver)?,
            Expr::MethodCall { receiver, args, .. } => {
                self.convert_expr(scope, enclosing, receiver)?;
                for arg in args {
                    self.convert_expr(scope, enclosing, arg)?;
                }
            }
            Expr::StaticMethodCall { args, .. }
            | Expr::ConstructorCall { args, .. }
            | Expr::Operation { args, .. } => {
                for arg in args {
                    self.convert_expr(scope, enclosing, arg)?;
                }
            }
            Expr::Conditional {
                condition,
                if_true,
                if_false,
                ..
            } => {
                self.convert_expr(scope, enclosing, condition)?;
                self.convert_expr(scope, enclosing, if_true)?;
                self.convert_expr(scope, enclosing, if_false)?;
            }
            Expr::Lambda(lambda) => self.convert_stmts(scope, enclosing, &mut lambda.body)?,
            Expr::MethodReference(reference) => {
                if let MethodReferenceTarget::Instance(receiver) = &mut reference.target {
                    self.convert_expr(scope, enclosing, receiver)?;
                }
            }
            Expr::AnonymousClass(class) => {
                let name = class.class.clone();
                let mut class_scope = scope.enter_class(&name);
                for method in &mut class.methods {
                    let mut method_scope = class_scope.enter_method(&method.name);
                    // Closures in the body are named after the class the anonymous one sits in
                    self.convert_stmts(&mut method_scope, enclosing, &mut method.body)?;
                }
            }
        }

        if expr.is_closure() {
            let closure = std::mem::replace(expr, Expr::Literal(Literal::Unit));
            *expr = self.lift_closure(scope, enclosing, closure, nested_from)?;
        }
        Ok(())
    }

    /// Lift one closure literal whose nested closures are already lifted.
    ///
    /// `self.lifted[nested_from..]` holds the classes lifted out of its body.
    fn lift_closure(
        &mut self,
        scope: &mut Scope<'_>,
        enclosing: &TypeName,
        closure: Expr,
        nested_from: usize,
    ) -> Result<Expr, LiftError> {
        let span = closure.closure_span().unwrap_or_default();
        let (form, generated) = match closure {
            Expr::Lambda(lambda) => {
                let lambda = *lambda;
                let body = ClosureBody {
                    functional_interface: lambda.interface,
                    functional_method_name: lambda.method,
                    formal_parameters: lambda.params,
                    return_type: lambda.return_type,
                    statements: lambda.body,
                    declared_fields: Vec::new(),
                    span: lambda.span,
                };
                (ClosureForm::Lambda, lift(scope, enclosing, body, self.options))
            }
            Expr::MethodReference(reference) => (
                ClosureForm::MethodReference,
                lift_method_reference(scope, enclosing, *reference, self.options),
            ),
            Expr::AnonymousClass(class) => {
                let front_end_name = class.class.clone();
                let generated = lift_anonymous_class(scope, enclosing, *class, self.options);
                if let Ok(generated) = &generated {
                    let renaming = Renaming {
                        from: &front_end_name,
                        to: &generated.class_node.name,
                    };
                    for nested in &mut self.lifted[nested_from..] {
                        renaming.class(nested);
                    }
                }
                (ClosureForm::AnonymousClass, generated)
            }
            other => return Ok(other),
        };
        let generated = generated.map_err(|err| err.at(span))?;

        self.reports
            .push(LiftReport::new(&generated, form, enclosing, span, self.options));
        let construction = generated.construction();
        self.lifted.push(generated.class_node);
        Ok(construction)
    }
}
