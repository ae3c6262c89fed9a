//! HIR (High-level Intermediate Representation) definitions
//!
//! The HIR is a language-neutral tree of classes, methods, statements and
//! expressions. Front ends produce it, the closure lifter rewrites it and
//! back ends print it. Closure literals only exist until lifting; afterwards
//! every function value is an ordinary class instance.

use cassis_diagnostics::{SourceFiles, Span};
use cassis_types::{Type, TypeName, TypeParameter};
use serde::{Deserialize, Serialize};

use crate::identifier::Identifier;

/// A complete compilation unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Unit name (usually the source path of the top-level class)
    pub name: String,
    /// Source files referenced by spans in this unit
    #[serde(default)]
    pub files: SourceFiles,
    /// Flat list of classes; lifted closures are appended here
    pub classes: Vec<ClassNode>,
}

impl Program {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: SourceFiles::new(),
            classes: Vec::new(),
        }
    }

    pub fn find_class(&self, name: &TypeName) -> Option<&ClassNode> {
        self.classes.iter().find(|c| c.name == *name)
    }
}

/// A variable introduced by a formal parameter, a local declaration or a capture
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableDeclaration {
    /// Identity of the variable; the only thing compared when resolving references
    pub id: Identifier,
    /// Display name
    pub name: String,
    pub ty: Type,
}

impl VariableDeclaration {
    pub fn new(id: Identifier, name: impl Into<String>, ty: Type) -> Self {
        Self {
            id,
            name: name.into(),
            ty,
        }
    }
}

/// A class definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassNode {
    pub name: TypeName,
    /// Generic type parameters
    #[serde(default)]
    pub type_params: Vec<TypeParameter>,
    /// Superclass and implemented interfaces
    #[serde(default)]
    pub super_types: Vec<TypeName>,
    #[serde(default)]
    pub fields: Vec<FieldDeclaration>,
    #[serde(default)]
    pub constructor: ConstructorNode,
    #[serde(default)]
    pub methods: Vec<MethodNode>,
    #[serde(default)]
    pub span: Span,
}

impl ClassNode {
    pub fn new(name: TypeName) -> Self {
        Self {
            name,
            type_params: Vec::new(),
            super_types: Vec::new(),
            fields: Vec::new(),
            constructor: ConstructorNode::default(),
            methods: Vec::new(),
            span: Span::DUMMY,
        }
    }

    pub fn find_method(&self, name: &str, arity: usize) -> Option<&MethodNode> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.params.len() == arity)
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldDeclaration> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A field declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    pub name: String,
    pub ty: Type,
    #[serde(default)]
    pub is_static: bool,
}

impl FieldDeclaration {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            is_static: false,
        }
    }
}

/// A constructor; classes without an explicit one get the empty default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstructorNode {
    pub params: Vec<VariableDeclaration>,
    pub body: Vec<Stmt>,
}

/// A method definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodNode {
    pub name: String,
    #[serde(default)]
    pub is_static: bool,
    /// Method's own type parameters
    #[serde(default)]
    pub type_params: Vec<TypeParameter>,
    pub params: Vec<VariableDeclaration>,
    pub return_type: Type,
    pub body: Vec<Stmt>,
}

impl MethodNode {
    pub fn new(
        name: impl Into<String>,
        params: Vec<VariableDeclaration>,
        return_type: Type,
        body: Vec<Stmt>,
    ) -> Self {
        Self {
            name: name.into(),
            is_static: false,
            type_params: Vec::new(),
            params,
            return_type,
            body,
        }
    }

    pub fn static_method(
        name: impl Into<String>,
        params: Vec<VariableDeclaration>,
        return_type: Type,
        body: Vec<Stmt>,
    ) -> Self {
        Self {
            is_static: true,
            ..Self::new(name, params, return_type, body)
        }
    }
}

/// Statement in a method or constructor body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    /// Expression statement
    Expr(Expr),
    /// Return statement
    Return(Option<Expr>),
    /// Local variable declaration with initial value
    Local {
        declaration: VariableDeclaration,
        init: Expr,
    },
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        #[serde(default)]
        else_branch: Vec<Stmt>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
}

impl Stmt {
    pub fn ret(expr: Expr) -> Self {
        Stmt::Return(Some(expr))
    }

    pub fn local(declaration: VariableDeclaration, init: Expr) -> Self {
        Stmt::Local { declaration, init }
    }

    /// `target = value;`
    pub fn assign(target: Expr, value: Expr) -> Self {
        Stmt::Expr(Expr::Assign {
            target: Box::new(target),
            value: Box::new(value),
        })
    }
}

/// A node whose meaning is "read something declared elsewhere"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reference {
    /// Read the current value of a variable
    Variable(VariableDeclaration),
    /// Read the current instance of the named class
    This(TypeName),
}

impl Reference {
    /// Identity of the referent; variables by declaration, `this` by class
    pub fn key(&self) -> Identifier {
        match self {
            Reference::Variable(declaration) => declaration.id.clone(),
            Reference::This(class) => Identifier::this_of(class),
        }
    }

    pub fn ty(&self) -> Type {
        match self {
            Reference::Variable(declaration) => declaration.ty.clone(),
            Reference::This(class) => Type::named(class.clone()),
        }
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Unit,
    Boolean(bool),
    Integer(i64),
    String(String),
}

impl Literal {
    pub fn ty(&self) -> Type {
        match self {
            Literal::Unit => Type::unit(),
            Literal::Boolean(_) => Type::boolean(),
            Literal::Integer(_) => Type::integer(),
            Literal::String(_) => Type::string(),
        }
    }
}

/// Built-in operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,
    Equals,
    NotEquals,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    BooleanNot,
    BooleanAnd,
    BooleanOr,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulus => "%",
            Operator::Equals => "==",
            Operator::NotEquals => "!=",
            Operator::Greater => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::Less => "<",
            Operator::LessOrEqual => "<=",
            Operator::BooleanNot => "!",
            Operator::BooleanAnd => "&&",
            Operator::BooleanOr => "||",
        }
    }
}

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Literal(Literal),

    /// Variable or `this` read
    Reference(Reference),

    /// Assignment; the target is a variable reference or a field access
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },

    /// Instance field read: receiver.field
    FieldAccess {
        receiver: Box<Expr>,
        field: String,
        ty: Type,
    },

    /// Instance method call: receiver.method<type_args>(args)
    MethodCall {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
        #[serde(default)]
        type_args: Vec<Type>,
        ty: Type,
    },

    /// Static method call: Class.method<type_args>(args)
    StaticMethodCall {
        class: TypeName,
        method: String,
        args: Vec<Expr>,
        #[serde(default)]
        type_args: Vec<Type>,
        ty: Type,
    },

    /// Class instantiation
    ConstructorCall {
        ty: Type,
        args: Vec<Expr>,
    },

    /// Operator application
    Operation {
        operator: Operator,
        args: Vec<Expr>,
        ty: Type,
    },

    /// Ternary conditional
    Conditional {
        condition: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
        ty: Type,
    },

    // Closure literals; removed by lifting
    Lambda(Box<LambdaExpr>),
    MethodReference(Box<MethodReferenceExpr>),
    AnonymousClass(Box<AnonymousClassExpr>),
}

/// Inline function value implementing a functional interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LambdaExpr {
    /// The functional interface this lambda implements
    pub interface: TypeName,
    /// Name of the interface's single abstract method
    pub method: String,
    pub params: Vec<VariableDeclaration>,
    pub return_type: Type,
    pub body: Vec<Stmt>,
    #[serde(default)]
    pub span: Span,
}

/// `Type::method` or `receiver::method` used as a function value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodReferenceExpr {
    pub interface: TypeName,
    /// Functional method implemented by the reference
    pub method: String,
    /// Parameter types of the functional method
    pub param_types: Vec<Type>,
    pub return_type: Type,
    pub target: MethodReferenceTarget,
    /// The method being referenced
    pub target_method: String,
    #[serde(default)]
    pub span: Span,
}

/// What a method reference is bound to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodReferenceTarget {
    /// `Type::method`
    Static(TypeName),
    /// `receiver::method`; the receiver is evaluated once, where the reference is created
    Instance(Expr),
}

/// An anonymous class body, already named by the front end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnonymousClassExpr {
    pub class: TypeName,
    pub super_types: Vec<TypeName>,
    #[serde(default)]
    pub fields: Vec<FieldDeclaration>,
    pub methods: Vec<MethodNode>,
    #[serde(default)]
    pub span: Span,
}

impl Expr {
    pub fn var(declaration: &VariableDeclaration) -> Self {
        Expr::Reference(Reference::Variable(declaration.clone()))
    }

    pub fn this(class: TypeName) -> Self {
        Expr::Reference(Reference::This(class))
    }

    pub fn int(value: i64) -> Self {
        Expr::Literal(Literal::Integer(value))
    }

    pub fn bool(value: bool) -> Self {
        Expr::Literal(Literal::Boolean(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Literal(Literal::String(value.into()))
    }

    pub fn field(receiver: Expr, field: impl Into<String>, ty: Type) -> Self {
        Expr::FieldAccess {
            receiver: Box::new(receiver),
            field: field.into(),
            ty,
        }
    }

    pub fn call(receiver: Expr, method: impl Into<String>, args: Vec<Expr>, ty: Type) -> Self {
        Expr::MethodCall {
            receiver: Box::new(receiver),
            method: method.into(),
            args,
            type_args: Vec::new(),
            ty,
        }
    }

    pub fn static_call(class: TypeName, method: impl Into<String>, args: Vec<Expr>, ty: Type) -> Self {
        Expr::StaticMethodCall {
            class,
            method: method.into(),
            args,
            type_args: Vec::new(),
            ty,
        }
    }

    pub fn construct(ty: Type, args: Vec<Expr>) -> Self {
        Expr::ConstructorCall { ty, args }
    }

    pub fn operation(operator: Operator, args: Vec<Expr>, ty: Type) -> Self {
        Expr::Operation { operator, args, ty }
    }

    /// Integer addition
    pub fn add(left: Expr, right: Expr) -> Self {
        Expr::operation(Operator::Add, vec![left, right], Type::integer())
    }

    /// Static type of the expression
    pub fn ty(&self) -> Type {
        match self {
            Expr::Literal(literal) => literal.ty(),
            Expr::Reference(reference) => reference.ty(),
            Expr::Assign { value, .. } => value.ty(),
            Expr::FieldAccess { ty, .. }
            | Expr::MethodCall { ty, .. }
            | Expr::StaticMethodCall { ty, .. }
            | Expr::ConstructorCall { ty, .. }
            | Expr::Operation { ty, .. }
            | Expr::Conditional { ty, .. } => ty.clone(),
            Expr::Lambda(lambda) => Type::named(lambda.interface.clone()),
            Expr::MethodReference(reference) => Type::named(reference.interface.clone()),
            Expr::AnonymousClass(class) => Type::named(class.class.clone()),
        }
    }

    /// Check if this is a closure literal that still needs lifting
    pub fn is_closure(&self) -> bool {
        matches!(
            self,
            Expr::Lambda(_) | Expr::MethodReference(_) | Expr::AnonymousClass(_)
        )
    }

    /// Span of a closure literal, if this is one
    pub fn closure_span(&self) -> Option<Span> {
        match self {
            Expr::Lambda(lambda) => Some(lambda.span),
            Expr::MethodReference(reference) => Some(reference.span),
            Expr::AnonymousClass(class) => Some(class.span),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_keys() {
        let x = VariableDeclaration::new(
            Identifier::TOP.type_("a.Outer").method("run").variable("x"),
            "x",
            Type::integer(),
        );
        assert_eq!(Reference::Variable(x.clone()).key(), x.id);
        assert_eq!(
            Reference::This(TypeName::of("a.Outer")).key(),
            Identifier::this_of(&TypeName::of("a.Outer"))
        );
    }

    #[test]
    fn test_expression_types() {
        let x = VariableDeclaration::new(Identifier::TOP.variable("x"), "x", Type::integer());
        assert_eq!(Expr::add(Expr::var(&x), Expr::int(1)).ty(), Type::integer());
        assert_eq!(
            Expr::this(TypeName::of("a.Outer")).ty(),
            Type::named(TypeName::of("a.Outer"))
        );
        let assign = Expr::Assign {
            target: Box::new(Expr::var(&x)),
            value: Box::new(Expr::bool(true)),
        };
        assert_eq!(assign.ty(), Type::boolean());
    }

    #[test]
    fn test_program_round_trips_through_json() {
        let mut program = Program::new("Outer.java");
        let x = VariableDeclaration::new(
            Identifier::TOP.type_("a.Outer").method("run").variable("x"),
            "x",
            Type::integer(),
        );
        let mut class = ClassNode::new(TypeName::of("a.Outer"));
        class.methods.push(MethodNode::new(
            "run",
            vec![x.clone()],
            Type::integer(),
            vec![Stmt::ret(Expr::add(Expr::var(&x), Expr::int(1)))],
        ));
        program.classes.push(class);

        let json = serde_json::to_string(&program).unwrap();
        let back: Program = serde_json::from_str(&json).unwrap();
        assert_eq!(back, program);
    }
}
