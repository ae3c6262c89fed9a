//! Class renaming
//!
//! Anonymous classes arrive under a front-end name and are renamed once the
//! unit counter has assigned them their lifted name. Every `this`, type and
//! static target naming the old class is rewritten in place.

use cassis_hir::{
    ClassNode, ConstructorNode, Expr, FieldDeclaration, MethodNode, MethodReferenceTarget, Reference, Stmt,
    VariableDeclaration,
};
use cassis_types::{Type, TypeName, TypeParameter};

/// Old and new name of one class
pub struct Renaming<'a> {
    pub from: &'a TypeName,
    pub to: &'a TypeName,
}

impl Renaming<'_> {
    pub fn class(&self, class: &mut ClassNode) {
        self.name(&mut class.name);
        for parameter in &mut class.type_params {
            self.type_parameter(parameter);
        }
        for super_type in &mut class.super_types {
            self.name(super_type);
        }
        self.fields(&mut class.fields);
        self.constructor(&mut class.constructor);
        self.methods(&mut class.methods);
    }

    pub fn fields(&self, fields: &mut [FieldDeclaration]) {
        for field in fields {
            self.ty(&mut field.ty);
        }
    }

    pub fn methods(&self, methods: &mut [MethodNode]) {
        for method in methods {
            for parameter in &mut method.type_params {
                self.type_parameter(parameter);
            }
            self.declarations(&mut method.params);
            self.ty(&mut method.return_type);
            self.stmts(&mut method.body);
        }
    }

    fn constructor(&self, constructor: &mut ConstructorNode) {
        self.declarations(&mut constructor.params);
        self.stmts(&mut constructor.body);
    }

    fn name(&self, name: &mut TypeName) {
        if name == self.from {
            *name = self.to.clone();
        }
    }

    fn type_parameter(&self, parameter: &mut TypeParameter) {
        self.name(&mut parameter.declaration);
    }

    fn ty(&self, ty: &mut Type) {
        match ty {
            Type::Scalar { name } => self.name(name),
            Type::Parameter { parameter } => self.type_parameter(parameter),
            Type::Bound { parameter, value } => {
                self.type_parameter(parameter);
                self.ty(value);
            }
            Type::Parameterized { raw, parameters } => {
                self.name(raw);
                for parameter in parameters {
                    self.ty(parameter);
                }
            }
        }
    }

    fn types(&self, types: &mut [Type]) {
        for ty in types {
            self.ty(ty);
        }
    }

    fn declaration(&self, declaration: &mut VariableDeclaration) {
        self.ty(&mut declaration.ty);
    }

    fn declarations(&self, declarations: &mut [VariableDeclaration]) {
        for declaration in declarations {
            self.declaration(declaration);
        }
    }

    fn stmts(&self, stmts: &mut [Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Expr(expr) | Stmt::Return(Some(expr)) => self.expr(expr),
            Stmt::Return(None) => {}
            Stmt::Local { declaration, init } => {
                self.declaration(declaration);
                self.expr(init);
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.expr(condition);
                self.stmts(then_branch);
                self.stmts(else_branch);
            }
            Stmt::While { condition, body } => {
                self.expr(condition);
                self.stmts(body);
            }
        }
    }

    fn exprs(&self, exprs: &mut [Expr]) {
        for expr in exprs {
            self.expr(expr);
        }
    }

    fn expr(&self, expr: &mut Expr) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Reference(Reference::Variable(declaration)) => self.declaration(declaration),
            Expr::Reference(Reference::This(class)) => self.name(class),
            Expr::Assign { target, value } => {
                self.expr(target);
                self.expr(value);
            }
            Expr::FieldAccess { receiver, ty, .. } => {
                self.expr(receiver);
                self.ty(ty);
            }
            Expr::MethodCall {
                receiver,
                args,
                type_args,
                ty,
                ..
            } => {
                self.expr(receiver);
                self.exprs(args);
                self.types(type_args);
                self.ty(ty);
            }
            Expr::StaticMethodCall {
                class,
                args,
                type_args,
                ty,
                ..
            } => {
                self.name(class);
                self.exprs(args);
                self.types(type_args);
                self.ty(ty);
            }
            Expr::ConstructorCall { ty, args } => {
                self.ty(ty);
                self.exprs(args);
            }
            Expr::Operation { args, ty, .. } => {
                self.exprs(args);
                self.ty(ty);
            }
            Expr::Conditional {
                condition,
                if_true,
                if_false,
                ty,
            } => {
                self.expr(condition);
                self.expr(if_true);
                self.expr(if_false);
                self.ty(ty);
            }
            Expr::Lambda(lambda) => {
                self.name(&mut lambda.interface);
                self.declarations(&mut lambda.params);
                self.ty(&mut lambda.return_type);
                self.stmts(&mut lambda.body);
            }
            Expr::MethodReference(reference) => {
                self.name(&mut reference.interface);
                self.types(&mut reference.param_types);
                self.ty(&mut reference.return_type);
                match &mut reference.target {
                    MethodReferenceTarget::Static(class) => self.name(class),
                    MethodReferenceTarget::Instance(receiver) => self.expr(receiver),
                }
            }
            Expr::AnonymousClass(class) => {
                for super_type in &mut class.super_types {
                    self.name(super_type);
                }
                self.fields(&mut class.fields);
                self.methods(&mut class.methods);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cassis_hir::Identifier;

    #[test]
    fn test_renames_this_types_and_static_targets() {
        let from = TypeName::of("a.Outer$1");
        let to = TypeName::of("a.Outer_Anonymous_3");
        let holder = VariableDeclaration::new(
            Identifier::TOP.type_("a.Outer").method("run").variable("holder"),
            "holder",
            Type::parameterized(TypeName::of("a.Box"), vec![Type::named(from.clone())]),
        );
        let mut class = ClassNode::new(TypeName::of("a.Outer_Anonymous_0"));
        class.fields.push(FieldDeclaration::new("_this", Type::named(from.clone())));
        class.methods.push(MethodNode::new(
            "get",
            Vec::new(),
            Type::integer(),
            vec![
                Stmt::local(holder.clone(), Expr::this(from.clone())),
                Stmt::ret(Expr::static_call(from.clone(), "seven", Vec::new(), Type::integer())),
            ],
        ));

        Renaming { from: &from, to: &to }.class(&mut class);

        assert_eq!(class.name, TypeName::of("a.Outer_Anonymous_0"));
        assert_eq!(class.fields[0].ty, Type::named(to.clone()));
        let Stmt::Local { declaration, init } = &class.methods[0].body[0] else {
            panic!("expected a local");
        };
        assert_eq!(
            declaration.ty,
            Type::parameterized(TypeName::of("a.Box"), vec![Type::named(to.clone())])
        );
        assert_eq!(declaration.id, holder.id);
        assert_eq!(*init, Expr::this(to.clone()));
        assert_eq!(
            class.methods[0].body[1],
            Stmt::ret(Expr::static_call(to, "seven", Vec::new(), Type::integer()))
        );
    }
}
