//! Evaluator for closure-free programs

use std::collections::{BTreeMap, HashMap};

use cassis_hir::{ClassNode, Expr, Identifier, Literal, MethodNode, Operator, Program, Reference, Stmt};
use cassis_types::{Type, TypeName};
use log::trace;
use thiserror::Error;

use crate::value::Value;

/// Calls nested deeper than this abort evaluation.
///
/// Each call level costs a dozen native frames in debug builds; the limit
/// keeps the deepest evaluation well inside a 2 MiB thread stack.
pub const MAX_CALL_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unknown class {0}")]
    UnknownClass(TypeName),

    #[error("no method {class}.{method} taking {arity} argument(s)")]
    UnknownMethod {
        class: TypeName,
        method: String,
        arity: usize,
    },

    #[error("{class} has no field `{field}`")]
    UnknownField { class: TypeName, field: String },

    #[error("variable `{0}` read before assignment")]
    UnboundVariable(String),

    #[error("`this` of {0} is not available here")]
    MissingThis(TypeName),

    #[error("expected an object, found {0}")]
    NotAnObject(String),

    #[error("operator `{operator}` cannot be applied to {found}")]
    TypeMismatch { operator: &'static str, found: String },

    #[error("condition must be a boolean, found {0}")]
    ConditionNotBoolean(String),

    #[error("expression cannot be assigned to")]
    InvalidAssignmentTarget,

    #[error("division by zero")]
    DivisionByZero,

    #[error("type {0} cannot be instantiated")]
    NotInstantiable(Type),

    #[error("closure literal reached the evaluator; run closure conversion first")]
    UnliftedClosure,

    #[error("call depth exceeded {0}")]
    StackOverflow(usize),
}

type Result<T> = std::result::Result<T, EvalError>;

/// Outcome of executing a statement
enum Flow {
    Normal,
    Return(Value),
}

/// Locals and receiver of one method activation
struct Frame {
    this: Option<Value>,
    locals: HashMap<Identifier, Value>,
}

/// Evaluates a program whose closures have been lifted
pub struct Interpreter<'p> {
    classes: HashMap<&'p TypeName, &'p ClassNode>,
}

impl<'p> Interpreter<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self {
            classes: program.classes.iter().map(|class| (&class.name, class)).collect(),
        }
    }

    fn class(&self, name: &TypeName) -> Result<&'p ClassNode> {
        self.classes
            .get(name)
            .copied()
            .ok_or_else(|| EvalError::UnknownClass(name.clone()))
    }

    fn method(&self, class: &'p ClassNode, name: &str, arity: usize) -> Result<&'p MethodNode> {
        class
            .find_method(name, arity)
            .ok_or_else(|| EvalError::UnknownMethod {
                class: class.name.clone(),
                method: name.to_string(),
                arity,
            })
    }

    /// Call a static method
    pub fn call_static(&self, class: &TypeName, method: &str, args: Vec<Value>) -> Result<Value> {
        self.call_static_at(class, method, args, 0)
    }

    /// Call an instance method on `receiver`
    pub fn call_method(&self, receiver: Value, method: &str, args: Vec<Value>) -> Result<Value> {
        self.call_method_at(receiver, method, args, 0)
    }

    /// Instantiate `ty` and run its constructor
    pub fn construct(&self, ty: &Type, args: Vec<Value>) -> Result<Value> {
        self.construct_at(ty, args, 0)
    }

    fn call_static_at(&self, class: &TypeName, method: &str, args: Vec<Value>, depth: usize) -> Result<Value> {
        let class = self.class(class)?;
        let method = self.method(class, method, args.len())?;
        trace!("call {}.{}", class.name, method.name);
        self.invoke(&method.params, &method.body, None, args, depth)
    }

    fn call_method_at(&self, receiver: Value, method: &str, args: Vec<Value>, depth: usize) -> Result<Value> {
        let class_name = match &receiver {
            Value::Object(object) => object.borrow().class.clone(),
            other => return Err(EvalError::NotAnObject(other.type_name())),
        };
        let class = self.class(&class_name)?;
        let method = self.method(class, method, args.len())?;
        trace!("call {}#{}", class.name, method.name);
        self.invoke(&method.params, &method.body, Some(receiver), args, depth)
    }

    fn construct_at(&self, ty: &Type, args: Vec<Value>, depth: usize) -> Result<Value> {
        let name = ty
            .erasure()
            .ok_or_else(|| EvalError::NotInstantiable(ty.clone()))?;
        let class = self.class(name)?;
        if class.constructor.params.len() != args.len() {
            return Err(EvalError::UnknownMethod {
                class: class.name.clone(),
                method: "<init>".to_string(),
                arity: args.len(),
            });
        }
        let fields: BTreeMap<String, Value> = class
            .fields
            .iter()
            .filter(|field| !field.is_static)
            .map(|field| (field.name.clone(), Value::Unit))
            .collect();
        let object = Value::object(class.name.clone(), fields);
        trace!("new {}", class.name);
        self.invoke(
            &class.constructor.params,
            &class.constructor.body,
            Some(object.clone()),
            args,
            depth,
        )?;
        Ok(object)
    }

    fn invoke(
        &self,
        params: &[cassis_hir::VariableDeclaration],
        body: &[Stmt],
        this: Option<Value>,
        args: Vec<Value>,
        depth: usize,
    ) -> Result<Value> {
        if depth >= MAX_CALL_DEPTH {
            return Err(EvalError::StackOverflow(MAX_CALL_DEPTH));
        }
        let mut frame = Frame {
            this,
            locals: params
                .iter()
                .map(|param| param.id.clone())
                .zip(args)
                .collect(),
        };
        match self.exec_block(&mut frame, body, depth + 1)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Unit),
        }
    }

    fn exec_block(&self, frame: &mut Frame, stmts: &[Stmt], depth: usize) -> Result<Flow> {
        for stmt in stmts {
            if let Flow::Return(value) = self.exec(frame, stmt, depth)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&self, frame: &mut Frame, stmt: &Stmt, depth: usize) -> Result<Flow> {
        match stmt {
            Stmt::Expr(expr) => {
                self.eval(frame, expr, depth)?;
                Ok(Flow::Normal)
            }
            Stmt::Return(None) => Ok(Flow::Return(Value::Unit)),
            Stmt::Return(Some(expr)) => Ok(Flow::Return(self.eval(frame, expr, depth)?)),
            Stmt::Local { declaration, init } => {
                let value = self.eval(frame, init, depth)?;
                frame.locals.insert(declaration.id.clone(), value);
                Ok(Flow::Normal)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval_condition(frame, condition, depth)? {
                    self.exec_block(frame, then_branch, depth)
                } else {
                    self.exec_block(frame, else_branch, depth)
                }
            }
            Stmt::While { condition, body } => {
                while self.eval_condition(frame, condition, depth)? {
                    if let Flow::Return(value) = self.exec_block(frame, body, depth)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
        }
    }

    fn eval_condition(&self, frame: &mut Frame, condition: &Expr, depth: usize) -> Result<bool> {
        match self.eval(frame, condition, depth)? {
            Value::Boolean(b) => Ok(b),
            other => Err(EvalError::ConditionNotBoolean(other.type_name())),
        }
    }

    fn eval_all(&self, frame: &mut Frame, exprs: &[Expr], depth: usize) -> Result<Vec<Value>> {
        exprs.iter().map(|expr| self.eval(frame, expr, depth)).collect()
    }

    fn eval(&self, frame: &mut Frame, expr: &Expr, depth: usize) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::Unit => Value::Unit,
                Literal::Boolean(b) => Value::Boolean(*b),
                Literal::Integer(n) => Value::Integer(*n),
                Literal::String(s) => Value::String(s.clone()),
            }),

            Expr::Reference(Reference::Variable(declaration)) => frame
                .locals
                .get(&declaration.id)
                .cloned()
                .ok_or_else(|| EvalError::UnboundVariable(declaration.name.clone())),

            Expr::Reference(Reference::This(class)) => match &frame.this {
                Some(Value::Object(object)) if object.borrow().class == *class => {
                    Ok(Value::Object(object.clone()))
                }
                _ => Err(EvalError::MissingThis(class.clone())),
            },

            Expr::Assign { target, value } => {
                let value = self.eval(frame, value, depth)?;
                match target.as_ref() {
                    Expr::Reference(Reference::Variable(declaration)) => {
                        frame.locals.insert(declaration.id.clone(), value.clone());
                    }
                    Expr::FieldAccess { receiver, field, .. } => {
                        let receiver = self.eval(frame, receiver, depth)?;
                        set_field(&receiver, field, value.clone())?;
                    }
                    _ => return Err(EvalError::InvalidAssignmentTarget),
                }
                Ok(value)
            }

            Expr::FieldAccess { receiver, field, .. } => {
                let receiver = self.eval(frame, receiver, depth)?;
                get_field(&receiver, field)
            }

            Expr::MethodCall {
                receiver,
                method,
                args,
                ..
            } => {
                let receiver = self.eval(frame, receiver, depth)?;
                let args = self.eval_all(frame, args, depth)?;
                self.call_method_at(receiver, method, args, depth)
            }

            Expr::StaticMethodCall {
                class, method, args, ..
            } => {
                let args = self.eval_all(frame, args, depth)?;
                self.call_static_at(class, method, args, depth)
            }

            Expr::ConstructorCall { ty, args } => {
                let args = self.eval_all(frame, args, depth)?;
                self.construct_at(ty, args, depth)
            }

            Expr::Operation { operator, args, .. } => self.eval_operation(frame, *operator, args, depth),

            Expr::Conditional {
                condition,
                if_true,
                if_false,
                ..
            } => {
                if self.eval_condition(frame, condition, depth)? {
                    self.eval(frame, if_true, depth)
                } else {
                    self.eval(frame, if_false, depth)
                }
            }

            Expr::Lambda(_) | Expr::MethodReference(_) | Expr::AnonymousClass(_) => {
                Err(EvalError::UnliftedClosure)
            }
        }
    }

    fn eval_operation(&self, frame: &mut Frame, operator: Operator, args: &[Expr], depth: usize) -> Result<Value> {
        // Short-circuiting operators evaluate their right operand lazily
        match (operator, args) {
            (Operator::BooleanAnd, [left, right]) => {
                return Ok(Value::Boolean(
                    self.eval_condition(frame, left, depth)? && self.eval_condition(frame, right, depth)?,
                ));
            }
            (Operator::BooleanOr, [left, right]) => {
                return Ok(Value::Boolean(
                    self.eval_condition(frame, left, depth)? || self.eval_condition(frame, right, depth)?,
                ));
            }
            _ => {}
        }

        let values = self.eval_all(frame, args, depth)?;
        let mismatch = |values: &[Value]| EvalError::TypeMismatch {
            operator: operator.symbol(),
            found: values
                .iter()
                .map(Value::type_name)
                .collect::<Vec<_>>()
                .join(", "),
        };

        match (operator, values.as_slice()) {
            (Operator::Add, [Value::Integer(a), Value::Integer(b)]) => Ok(Value::Integer(a.wrapping_add(*b))),
            (Operator::Add, [Value::String(a), b]) => Ok(Value::String(format!("{}{}", a, b))),
            (Operator::Add, [a, Value::String(b)]) => Ok(Value::String(format!("{}{}", a, b))),
            (Operator::Subtract, [Value::Integer(a), Value::Integer(b)]) => Ok(Value::Integer(a.wrapping_sub(*b))),
            (Operator::Multiply, [Value::Integer(a), Value::Integer(b)]) => Ok(Value::Integer(a.wrapping_mul(*b))),
            (Operator::Divide | Operator::Modulus, [Value::Integer(_), Value::Integer(0)]) => {
                Err(EvalError::DivisionByZero)
            }
            (Operator::Divide, [Value::Integer(a), Value::Integer(b)]) => Ok(Value::Integer(a.wrapping_div(*b))),
            (Operator::Modulus, [Value::Integer(a), Value::Integer(b)]) => Ok(Value::Integer(a.wrapping_rem(*b))),
            (Operator::Equals, [a, b]) => Ok(Value::Boolean(a == b)),
            (Operator::NotEquals, [a, b]) => Ok(Value::Boolean(a != b)),
            (Operator::Greater, [Value::Integer(a), Value::Integer(b)]) => Ok(Value::Boolean(a > b)),
            (Operator::GreaterOrEqual, [Value::Integer(a), Value::Integer(b)]) => Ok(Value::Boolean(a >= b)),
            (Operator::Less, [Value::Integer(a), Value::Integer(b)]) => Ok(Value::Boolean(a < b)),
            (Operator::LessOrEqual, [Value::Integer(a), Value::Integer(b)]) => Ok(Value::Boolean(a <= b)),
            (Operator::BooleanNot, [Value::Boolean(b)]) => Ok(Value::Boolean(!b)),
            _ => Err(mismatch(values.as_slice())),
        }
    }
}

fn get_field(receiver: &Value, field: &str) -> Result<Value> {
    match receiver {
        Value::Object(object) => {
            let object = object.borrow();
            object
                .fields
                .get(field)
                .cloned()
                .ok_or_else(|| EvalError::UnknownField {
                    class: object.class.clone(),
                    field: field.to_string(),
                })
        }
        other => Err(EvalError::NotAnObject(other.type_name())),
    }
}

fn set_field(receiver: &Value, field: &str, value: Value) -> Result<()> {
    match receiver {
        Value::Object(object) => {
            let mut object = object.borrow_mut();
            if !object.fields.contains_key(field) {
                return Err(EvalError::UnknownField {
                    class: object.class.clone(),
                    field: field.to_string(),
                });
            }
            object.fields.insert(field.to_string(), value);
            Ok(())
        }
        other => Err(EvalError::NotAnObject(other.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cassis_hir::{FieldDeclaration, VariableDeclaration};

    fn counter_program() -> Program {
        let counter = TypeName::of("a.Counter");
        let this = || Expr::this(TypeName::of("a.Counter"));
        let start = VariableDeclaration::new(
            Identifier::TOP.type_("a.Counter").constructor().variable("start"),
            "start",
            Type::integer(),
        );

        let mut class = ClassNode::new(counter.clone());
        class.fields.push(FieldDeclaration::new("count", Type::integer()));
        class.constructor.params.push(start.clone());
        class.constructor.body.push(Stmt::assign(
            Expr::field(this(), "count", Type::integer()),
            Expr::var(&start),
        ));
        class.methods.push(MethodNode::new(
            "next",
            Vec::new(),
            Type::integer(),
            vec![
                Stmt::assign(
                    Expr::field(this(), "count", Type::integer()),
                    Expr::add(Expr::field(this(), "count", Type::integer()), Expr::int(1)),
                ),
                Stmt::ret(Expr::field(this(), "count", Type::integer())),
            ],
        ));

        let i = VariableDeclaration::new(
            Identifier::TOP.type_("a.Counter").method("main").variable("i"),
            "i",
            Type::integer(),
        );
        let c = VariableDeclaration::new(
            Identifier::TOP.type_("a.Counter").method("main").variable("c"),
            "c",
            Type::named(counter.clone()),
        );
        class.methods.push(MethodNode::static_method(
            "main",
            Vec::new(),
            Type::integer(),
            vec![
                Stmt::local(c.clone(), Expr::construct(Type::named(counter), vec![Expr::int(10)])),
                Stmt::local(i.clone(), Expr::int(0)),
                Stmt::While {
                    condition: Expr::operation(
                        Operator::Less,
                        vec![Expr::var(&i), Expr::int(3)],
                        Type::boolean(),
                    ),
                    body: vec![
                        Stmt::Expr(Expr::call(Expr::var(&c), "next", Vec::new(), Type::integer())),
                        Stmt::assign(Expr::var(&i), Expr::add(Expr::var(&i), Expr::int(1))),
                    ],
                },
                Stmt::ret(Expr::call(Expr::var(&c), "next", Vec::new(), Type::integer())),
            ],
        ));

        let mut program = Program::new("Counter.java");
        program.classes.push(class);
        program
    }

    #[test]
    fn test_objects_loops_and_fields() {
        let program = counter_program();
        let interpreter = Interpreter::new(&program);
        let result = interpreter
            .call_static(&TypeName::of("a.Counter"), "main", Vec::new())
            .unwrap();
        assert_eq!(result, Value::Integer(14));
    }

    #[test]
    fn test_string_concatenation_and_conditionals() {
        let mut class = ClassNode::new(TypeName::of("a.Main"));
        class.methods.push(MethodNode::static_method(
            "main",
            Vec::new(),
            Type::string(),
            vec![Stmt::ret(Expr::Conditional {
                condition: Box::new(Expr::operation(
                    Operator::Equals,
                    vec![Expr::int(2), Expr::int(2)],
                    Type::boolean(),
                )),
                if_true: Box::new(Expr::operation(
                    Operator::Add,
                    vec![Expr::string("n="), Expr::int(2)],
                    Type::string(),
                )),
                if_false: Box::new(Expr::string("never")),
                ty: Type::string(),
            })],
        ));
        let mut program = Program::new("Main.java");
        program.classes.push(class);

        let result = Interpreter::new(&program)
            .call_static(&TypeName::of("a.Main"), "main", Vec::new())
            .unwrap();
        assert_eq!(result, Value::String("n=2".to_string()));
    }

    #[test]
    fn test_division_by_zero() {
        let mut class = ClassNode::new(TypeName::of("a.Main"));
        class.methods.push(MethodNode::static_method(
            "main",
            Vec::new(),
            Type::integer(),
            vec![Stmt::ret(Expr::operation(
                Operator::Divide,
                vec![Expr::int(1), Expr::int(0)],
                Type::integer(),
            ))],
        ));
        let mut program = Program::new("Main.java");
        program.classes.push(class);

        let err = Interpreter::new(&program)
            .call_static(&TypeName::of("a.Main"), "main", Vec::new())
            .unwrap_err();
        assert_eq!(err, EvalError::DivisionByZero);
    }

    #[test]
    fn test_unknown_method() {
        let program = counter_program();
        let err = Interpreter::new(&program)
            .call_static(&TypeName::of("a.Counter"), "missing", Vec::new())
            .unwrap_err();
        assert!(matches!(err, EvalError::UnknownMethod { ref method, .. } if method == "missing"));
    }

    /// a.R.f(n) = n == 0 ? 0 : 1 + a.R.f(n - 1)
    fn recursive_program() -> Program {
        let n = VariableDeclaration::new(
            Identifier::TOP.type_("a.R").method("f").variable("n"),
            "n",
            Type::integer(),
        );
        let recurse = Expr::static_call(
            TypeName::of("a.R"),
            "f",
            vec![Expr::operation(
                Operator::Subtract,
                vec![Expr::var(&n), Expr::int(1)],
                Type::integer(),
            )],
            Type::integer(),
        );
        let mut class = ClassNode::new(TypeName::of("a.R"));
        class.methods.push(MethodNode::static_method(
            "f",
            vec![n.clone()],
            Type::integer(),
            vec![Stmt::ret(Expr::Conditional {
                condition: Box::new(Expr::operation(
                    Operator::Equals,
                    vec![Expr::var(&n), Expr::int(0)],
                    Type::boolean(),
                )),
                if_true: Box::new(Expr::int(0)),
                if_false: Box::new(Expr::add(Expr::int(1), recurse)),
                ty: Type::integer(),
            })],
        ));
        let mut program = Program::new("R.java");
        program.classes.push(class);
        program
    }

    #[test]
    fn test_recursion_within_limit() {
        let program = recursive_program();
        let result = Interpreter::new(&program)
            .call_static(&TypeName::of("a.R"), "f", vec![Value::Integer(50)])
            .unwrap();
        assert_eq!(result, Value::Integer(50));
    }

    #[test]
    fn test_runaway_recursion_is_an_error() {
        let program = recursive_program();
        let err = Interpreter::new(&program)
            .call_static(&TypeName::of("a.R"), "f", vec![Value::Integer(10_000)])
            .unwrap_err();
        assert_eq!(err, EvalError::StackOverflow(MAX_CALL_DEPTH));
    }
}
