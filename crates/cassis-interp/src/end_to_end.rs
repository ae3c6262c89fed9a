//! Lift programs with `convert_closures`, then run them

use cassis_diagnostics::Span;
use cassis_hir::{
    AnonymousClassExpr, ClassNode, Expr, FieldDeclaration, Identifier, LambdaExpr, MethodNode,
    MethodReferenceExpr, MethodReferenceTarget, Program, Stmt, VariableDeclaration,
};
use cassis_transform::{convert_closures, LiftOptions};
use cassis_types::{Type, TypeName};

use crate::{EvalError, Interpreter, Value};

fn outer() -> TypeName {
    TypeName::of("a.Outer")
}

fn var(method: &str, name: &str, ty: Type) -> VariableDeclaration {
    VariableDeclaration::new(
        Identifier::TOP.type_("a.Outer").method(method).variable(name),
        name,
        ty,
    )
}

fn supplier(body: Vec<Stmt>) -> Expr {
    Expr::Lambda(Box::new(LambdaExpr {
        interface: TypeName::of("a.IntSupplier"),
        method: "get".to_string(),
        params: Vec::new(),
        return_type: Type::integer(),
        body,
        span: Span::DUMMY,
    }))
}

fn function(param: VariableDeclaration, body: Vec<Stmt>) -> Expr {
    Expr::Lambda(Box::new(LambdaExpr {
        interface: TypeName::of("a.IntFunction"),
        method: "apply".to_string(),
        params: vec![param],
        return_type: Type::integer(),
        body,
        span: Span::DUMMY,
    }))
}

fn get(receiver: Expr) -> Expr {
    Expr::call(receiver, "get", Vec::new(), Type::integer())
}

fn program(classes: Vec<ClassNode>) -> Program {
    let mut program = Program::new("Outer.java");
    program.classes = classes;
    program
}

fn outer_class(methods: Vec<MethodNode>) -> ClassNode {
    let mut class = ClassNode::new(outer());
    class.methods = methods;
    class
}

fn lift_and_run(mut program: Program) -> Result<Value, EvalError> {
    convert_closures(&mut program, &LiftOptions::default()).unwrap();
    Interpreter::new(&program).call_static(&outer(), "main", Vec::new())
}

/// a.Counter with `count` starting at the constructor argument and `next()` incrementing it
fn counter_class() -> ClassNode {
    let counter = TypeName::of("a.Counter");
    let count = || Expr::field(Expr::this(TypeName::of("a.Counter")), "count", Type::integer());
    let start = VariableDeclaration::new(
        Identifier::TOP.type_("a.Counter").constructor().variable("start"),
        "start",
        Type::integer(),
    );
    let mut class = ClassNode::new(counter);
    class.fields.push(FieldDeclaration::new("count", Type::integer()));
    class.constructor.params.push(start.clone());
    class.constructor.body.push(Stmt::assign(count(), Expr::var(&start)));
    class.methods.push(MethodNode::new(
        "next",
        Vec::new(),
        Type::integer(),
        vec![
            Stmt::assign(count(), Expr::add(count(), Expr::int(1))),
            Stmt::ret(count()),
        ],
    ));
    class
}

fn capture_local_program() -> Program {
    let x = var("main", "x", Type::integer());
    let f = var("main", "f", Type::named(TypeName::of("a.IntSupplier")));
    program(vec![outer_class(vec![MethodNode::static_method(
        "main",
        Vec::new(),
        Type::integer(),
        vec![
            Stmt::local(x.clone(), Expr::int(4)),
            Stmt::local(
                f.clone(),
                supplier(vec![Stmt::ret(Expr::add(Expr::var(&x), Expr::int(1)))]),
            ),
            Stmt::ret(get(Expr::var(&f))),
        ],
    )])])
}

#[test]
fn test_captured_local_evaluates() {
    assert_eq!(lift_and_run(capture_local_program()).unwrap(), Value::Integer(5));
}

#[test]
fn test_unlifted_program_is_rejected() {
    let program = capture_local_program();
    let err = Interpreter::new(&program)
        .call_static(&outer(), "main", Vec::new())
        .unwrap_err();
    assert_eq!(err, EvalError::UnliftedClosure);
}

#[test]
fn test_captured_value_is_a_snapshot() {
    // Reassigning the local after the closure is created does not reach the capture
    let x = var("main", "x", Type::integer());
    let f = var("main", "f", Type::named(TypeName::of("a.IntSupplier")));
    let result = lift_and_run(program(vec![outer_class(vec![MethodNode::static_method(
        "main",
        Vec::new(),
        Type::integer(),
        vec![
            Stmt::local(x.clone(), Expr::int(4)),
            Stmt::local(f.clone(), supplier(vec![Stmt::ret(Expr::var(&x))])),
            Stmt::assign(Expr::var(&x), Expr::int(100)),
            Stmt::ret(get(Expr::var(&f))),
        ],
    )])]));
    assert_eq!(result.unwrap(), Value::Integer(4));
}

#[test]
fn test_enclosing_instance_capture() {
    let base = || Expr::field(Expr::this(outer()), "base", Type::integer());
    let start = VariableDeclaration::new(
        Identifier::TOP.type_("a.Outer").constructor().variable("start"),
        "start",
        Type::integer(),
    );
    let o = var("main", "o", Type::named(outer()));

    let mut class = outer_class(vec![
        MethodNode::new(
            "make",
            Vec::new(),
            Type::named(TypeName::of("a.IntSupplier")),
            vec![Stmt::ret(supplier(vec![Stmt::ret(Expr::add(base(), Expr::int(1)))]))],
        ),
        MethodNode::static_method(
            "main",
            Vec::new(),
            Type::integer(),
            vec![
                Stmt::local(o.clone(), Expr::construct(Type::named(outer()), vec![Expr::int(41)])),
                Stmt::ret(get(Expr::call(
                    Expr::var(&o),
                    "make",
                    Vec::new(),
                    Type::named(TypeName::of("a.IntSupplier")),
                ))),
            ],
        ),
    ]);
    class.fields.push(FieldDeclaration::new("base", Type::integer()));
    class.constructor.params.push(start.clone());
    class.constructor.body.push(Stmt::assign(base(), Expr::var(&start)));

    assert_eq!(lift_and_run(program(vec![class])).unwrap(), Value::Integer(42));
}

#[test]
fn test_nested_closures_capture_per_level() {
    let x = var("main", "x", Type::integer());
    let p = var("main", "p", Type::integer());
    let q = var("main", "q", Type::integer());
    let inner = var("main", "inner", Type::named(TypeName::of("a.IntFunction")));

    let inner_fn = function(
        q.clone(),
        vec![Stmt::ret(Expr::add(
            Expr::add(Expr::var(&x), Expr::var(&p)),
            Expr::var(&q),
        ))],
    );
    let outer_fn = function(
        p.clone(),
        vec![
            Stmt::local(inner.clone(), inner_fn),
            Stmt::ret(Expr::call(
                Expr::var(&inner),
                "apply",
                vec![Expr::int(100)],
                Type::integer(),
            )),
        ],
    );
    let result = lift_and_run(program(vec![outer_class(vec![MethodNode::static_method(
        "main",
        Vec::new(),
        Type::integer(),
        vec![
            Stmt::local(x.clone(), Expr::int(4)),
            Stmt::ret(Expr::call(outer_fn, "apply", vec![Expr::int(10)], Type::integer())),
        ],
    )])]));
    assert_eq!(result.unwrap(), Value::Integer(114));
}

#[test]
fn test_static_method_reference() {
    let n = var("twice", "n", Type::integer());
    let twice = MethodNode::static_method(
        "twice",
        vec![n.clone()],
        Type::integer(),
        vec![Stmt::ret(Expr::operation(
            cassis_hir::Operator::Multiply,
            vec![Expr::var(&n), Expr::int(2)],
            Type::integer(),
        ))],
    );
    let reference = Expr::MethodReference(Box::new(MethodReferenceExpr {
        interface: TypeName::of("a.IntFunction"),
        method: "apply".to_string(),
        param_types: vec![Type::integer()],
        return_type: Type::integer(),
        target: MethodReferenceTarget::Static(outer()),
        target_method: "twice".to_string(),
        span: Span::DUMMY,
    }));
    let main = MethodNode::static_method(
        "main",
        Vec::new(),
        Type::integer(),
        vec![Stmt::ret(Expr::call(reference, "apply", vec![Expr::int(21)], Type::integer()))],
    );
    assert_eq!(
        lift_and_run(program(vec![outer_class(vec![twice, main])])).unwrap(),
        Value::Integer(42)
    );
}

#[test]
fn test_bound_receiver_is_evaluated_once() {
    let f = var("main", "f", Type::named(TypeName::of("a.IntSupplier")));
    let reference = Expr::MethodReference(Box::new(MethodReferenceExpr {
        interface: TypeName::of("a.IntSupplier"),
        method: "get".to_string(),
        param_types: Vec::new(),
        return_type: Type::integer(),
        target: MethodReferenceTarget::Instance(Expr::construct(
            Type::scalar("a.Counter"),
            vec![Expr::int(10)],
        )),
        target_method: "next".to_string(),
        span: Span::DUMMY,
    }));
    let main = MethodNode::static_method(
        "main",
        Vec::new(),
        Type::integer(),
        vec![
            Stmt::local(f.clone(), reference),
            Stmt::Expr(get(Expr::var(&f))),
            Stmt::ret(get(Expr::var(&f))),
        ],
    );
    let result = lift_and_run(program(vec![outer_class(vec![main]), counter_class()]));
    assert_eq!(result.unwrap(), Value::Integer(12));
}

#[test]
fn test_anonymous_class_with_own_field() {
    let anonymous = TypeName::of("a.Outer$1");
    let seen = || Expr::field(Expr::this(TypeName::of("a.Outer$1")), "seen", Type::integer());
    let x = var("main", "x", Type::integer());
    let class = Expr::AnonymousClass(Box::new(AnonymousClassExpr {
        class: anonymous,
        super_types: vec![TypeName::of("a.IntSupplier")],
        fields: vec![FieldDeclaration::new("seen", Type::integer())],
        methods: vec![MethodNode::new(
            "get",
            Vec::new(),
            Type::integer(),
            vec![
                Stmt::assign(seen(), Expr::int(2)),
                Stmt::ret(Expr::add(seen(), Expr::var(&x))),
            ],
        )],
        span: Span::DUMMY,
    }));
    let main = MethodNode::static_method(
        "main",
        Vec::new(),
        Type::integer(),
        vec![
            Stmt::local(x.clone(), Expr::int(5)),
            Stmt::ret(get(class)),
        ],
    );
    assert_eq!(
        lift_and_run(program(vec![outer_class(vec![main])])).unwrap(),
        Value::Integer(7)
    );
}

#[test]
fn test_lambda_inside_anonymous_class_reads_its_fields() {
    let anonymous = TypeName::of("a.Outer$1");
    let seen = || Expr::field(Expr::this(TypeName::of("a.Outer$1")), "seen", Type::integer());
    let x = var("main", "x", Type::integer());
    let class = Expr::AnonymousClass(Box::new(AnonymousClassExpr {
        class: anonymous,
        super_types: vec![TypeName::of("a.IntSupplier")],
        fields: vec![FieldDeclaration::new("seen", Type::integer())],
        methods: vec![MethodNode::new(
            "get",
            Vec::new(),
            Type::integer(),
            vec![
                Stmt::assign(seen(), Expr::int(3)),
                Stmt::ret(get(supplier(vec![Stmt::ret(Expr::add(seen(), Expr::var(&x)))]))),
            ],
        )],
        span: Span::DUMMY,
    }));
    let main = MethodNode::static_method(
        "main",
        Vec::new(),
        Type::integer(),
        vec![
            Stmt::local(x.clone(), Expr::int(5)),
            Stmt::ret(get(class)),
        ],
    );
    assert_eq!(
        lift_and_run(program(vec![outer_class(vec![main])])).unwrap(),
        Value::Integer(8)
    );
}
