//! Tests for the tree-walking interpreter.

use alloc::sync::Arc;
use std::sync::Mutex;

use pretty_assertions::assert_eq;

use crate::{
    HostObject, String, Vec,
    api::{Configuration, FailureMode, Namespaces, options::DEFAULT_MAX_EVAL_DEPTH},
    evaluator::{
        Context, EvalError, ExecutionError, MapContext, ResourceExceededError, StandardArithmetic,
        evaluate,
    },
    format,
    introspection::Introspector,
    parser::{self, Literal, Node, NodeKind, Span},
    values::Value,
    vec,
};

fn config_with(namespaces: Namespaces, strict: bool, max_eval_depth: usize) -> Configuration {
    let arithmetic = if strict {
        StandardArithmetic::strict()
    } else {
        StandardArithmetic::lenient()
    };
    Configuration::new(
        Arc::new(Introspector),
        Arc::new(arithmetic),
        namespaces,
        FailureMode::Strict,
        max_eval_depth,
    )
}

fn run_in(
    config: &Configuration,
    source: &str,
    ctx: &mut dyn Context,
) -> Result<Value, ExecutionError> {
    let tree = parser::translate(source).unwrap();
    evaluate(config, &tree.root, ctx)
}

fn run(source: &str) -> Result<Value, ExecutionError> {
    run_in(&Configuration::shared_default(), source, &mut MapContext::new())
}

fn value(source: &str) -> Value {
    run(source).unwrap_or_else(|e| panic!("`{source}` failed: {e}"))
}

fn runtime_error(result: Result<Value, ExecutionError>) -> EvalError {
    match result {
        Err(ExecutionError::Runtime { error, .. }) => error,
        other => panic!("expected a runtime error, got {other:?}"),
    }
}

#[test]
fn test_integer_arithmetic() {
    assert_eq!(value("1 + 2;"), Value::Int(3));
    assert_eq!(value("2 + 3 * 4;"), Value::Int(14));
    assert_eq!(value("(2 + 3) * 4;"), Value::Int(20));
    assert_eq!(value("10 - 4 - 3;"), Value::Int(3));
    assert_eq!(value("7 / 2;"), Value::Int(3));
    assert_eq!(value("7 % 3;"), Value::Int(1));
    assert_eq!(value("-5 + 2;"), Value::Int(-3));
    assert_eq!(value("10 div 5 mod 3;"), Value::Int(2));
}

#[test]
fn test_float_arithmetic() {
    assert_eq!(value("1.5 + 1.5;"), Value::Float(3.0));
    assert_eq!(value("1 + 0.5;"), Value::Float(1.5));
    assert_eq!(value("1.0 / 0;").as_float(), Some(f64::INFINITY));
}

#[test]
fn test_division_by_zero() {
    assert_eq!(runtime_error(run("1 / 0;")), EvalError::DivisionByZero);
    assert_eq!(runtime_error(run("1 % 0;")), EvalError::DivisionByZero);
}

#[test]
fn test_string_concatenation() {
    assert_eq!(value("'a' + 'b';").as_str(), Some("ab"));
    assert_eq!(value("'n=' + 1;").as_str(), Some("n=1"));
    assert_eq!(value("\"x\" + true;").as_str(), Some("xtrue"));
}

#[test]
fn test_comparisons() {
    assert_eq!(value("1 < 2;"), Value::Bool(true));
    assert_eq!(value("2 <= 2;"), Value::Bool(true));
    assert_eq!(value("3 gt 4;"), Value::Bool(false));
    assert_eq!(value("1 == 1.0;"), Value::Bool(true));
    assert_eq!(value("'a' != 'b';"), Value::Bool(true));
    assert_eq!(value("'abc' < 'abd';"), Value::Bool(true));
    assert_eq!(value("null == null;"), Value::Bool(true));
}

#[test]
fn test_logical_operators_short_circuit() {
    // `missing` is never evaluated.
    assert_eq!(value("false && missing;"), Value::Bool(false));
    assert_eq!(value("true || missing;"), Value::Bool(true));
    assert_eq!(value("not false and true;"), Value::Bool(true));
    assert_eq!(value("!(1 < 2);"), Value::Bool(false));
}

#[test]
fn test_ternary() {
    assert_eq!(value("1 < 2 ? 'yes' : 'no';").as_str(), Some("yes"));
    assert_eq!(value("false ? 1 : true ? 2 : 3;"), Value::Int(2));
}

#[test]
fn test_variables_and_assignment() {
    let config = Configuration::shared_default();
    let mut ctx = MapContext::new().with("x", 20);

    let result = run_in(&config, "y = x + 1; y * 2;", &mut ctx).unwrap();
    assert_eq!(result, Value::Int(42));
    assert_eq!(ctx.get("y"), Some(Value::Int(21)));
    // Assignment is an expression.
    assert_eq!(run_in(&config, "z = 5;", &mut ctx).unwrap(), Value::Int(5));
}

#[test]
fn test_undefined_variable() {
    assert_eq!(
        runtime_error(run("nope + 1;")),
        EvalError::UndefinedVariable {
            name: String::from("nope")
        }
    );
}

#[test]
fn test_if_else_and_blocks() {
    assert_eq!(value("if (1 < 2) { 'then'; } else { 'else'; }").as_str(), Some("then"));
    assert_eq!(value("if (false) 1;"), Value::Null);
    assert_eq!(value("if (false) 1; else 2;"), Value::Int(2));
    assert_eq!(value("{ 1; 2; 3 }"), Value::Int(3));
    assert_eq!(value(";;"), Value::Null);
}

#[test]
fn test_while_loop() {
    let config = Configuration::shared_default();
    let mut ctx = MapContext::new();
    let result = run_in(
        &config,
        "i = 0; total = 0; while (i < 5) { total = total + i; i = i + 1; } total;",
        &mut ctx,
    )
    .unwrap();
    assert_eq!(result, Value::Int(10));
    assert_eq!(ctx.get("i"), Some(Value::Int(5)));
}

#[test]
fn test_string_methods_and_fields() {
    assert_eq!(value("'Sable'.toUpperCase();").as_str(), Some("SABLE"));
    assert_eq!(value("'  pad '.trim().length;"), Value::Int(3));
    assert_eq!(value("'hello'.substring(1, 3);").as_str(), Some("el"));
    assert_eq!(value("'hello'.startsWith('he');"), Value::Bool(true));
}

#[test]
fn test_arrays_and_maps() {
    assert_eq!(value("[1, 2, 3][1];"), Value::Int(2));
    assert_eq!(value("[1, 2, 3].size();"), Value::Int(3));
    assert_eq!(value("[].isEmpty();"), Value::Bool(true));
    assert_eq!(
        runtime_error(run("[1][5];")),
        EvalError::IndexOutOfBounds { index: 5, len: 1 }
    );

    let mut entries = hashbrown::HashMap::new();
    entries.insert(String::from("k"), Value::Int(7));
    let mut ctx = MapContext::new().with("m", Value::map(entries));
    let config = Configuration::shared_default();
    assert_eq!(run_in(&config, "m.k;", &mut ctx).unwrap(), Value::Int(7));
    assert_eq!(run_in(&config, "m['k'];", &mut ctx).unwrap(), Value::Int(7));
    assert_eq!(run_in(&config, "m.other;", &mut ctx).unwrap(), Value::Null);
    assert_eq!(
        run_in(&config, "m.containsKey('k');", &mut ctx).unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn test_builtin_functions() {
    assert_eq!(value("size('abc');"), Value::Int(3));
    assert_eq!(value("size([1, 2]);"), Value::Int(2));
    assert_eq!(value("empty(null);"), Value::Bool(true));
    assert_eq!(value("empty('');"), Value::Bool(true));
    assert_eq!(value("empty([0]);"), Value::Bool(false));
    assert!(matches!(
        runtime_error(run("size(1, 2);")),
        EvalError::WrongArgumentCount { expected: 1, got: 2, .. }
    ));
}

#[derive(Debug, Default)]
struct MathNamespace;

impl HostObject for MathNamespace {
    fn type_name(&self) -> &'static str {
        "Math"
    }

    fn call(&self, name: &str, args: &[Value]) -> Option<Result<Value, String>> {
        match name {
            "max" => Some(
                args.iter()
                    .map(|v| v.as_int().ok_or_else(|| format!("not an int: {v}")))
                    .collect::<Result<Vec<_>, _>>()
                    .map(|ints| Value::from(ints.into_iter().max())),
            ),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Register {
    value: Mutex<i64>,
}

impl HostObject for Register {
    fn get(&self, name: &str) -> Option<Value> {
        (name == "value").then(|| Value::Int(*self.value.lock().unwrap()))
    }

    fn set(&self, name: &str, value: Value) -> Option<Result<(), String>> {
        if name != "value" {
            return None;
        }
        Some(
            value
                .as_int()
                .map(|v| *self.value.lock().unwrap() = v)
                .ok_or_else(|| String::from("value must be an int")),
        )
    }
}

#[test]
fn test_namespace_functions() {
    let mut builder = Namespaces::builder();
    builder.register("math", MathNamespace).register("", MathNamespace);
    let namespaces = builder.build().unwrap();
    let config = config_with(namespaces, false, 64);
    let mut ctx = MapContext::new();

    assert_eq!(
        run_in(&config, "math:max(3, 9, 4);", &mut ctx).unwrap(),
        Value::Int(9)
    );
    // Unprefixed calls go to the namespace registered under the empty name.
    assert_eq!(run_in(&config, "max(1, 2);", &mut ctx).unwrap(), Value::Int(2));
    assert_eq!(run_in(&config, "math:max();", &mut ctx).unwrap(), Value::Null);

    assert_eq!(
        runtime_error(run_in(&config, "nope:max(1);", &mut ctx)),
        EvalError::UnknownNamespace {
            name: String::from("nope")
        }
    );
    assert!(matches!(
        runtime_error(run_in(&config, "math:min(1);", &mut ctx)),
        EvalError::UnknownMethod { .. }
    ));
    assert_eq!(
        runtime_error(run_in(&config, "math:max('a');", &mut ctx)),
        EvalError::Host(String::from("not an int: \"a\""))
    );
}

#[test]
fn test_unprefixed_call_without_default_namespace() {
    assert_eq!(
        runtime_error(run("frobnicate(1);")),
        EvalError::UnknownFunction {
            name: String::from("frobnicate")
        }
    );
}

#[test]
fn test_field_assignment_on_host_object() {
    let register = Arc::new(Register::default());
    let mut ctx = MapContext::new().with("reg", Value::Object(register.clone()));
    let config = Configuration::shared_default();

    let result = run_in(&config, "reg.value = 41; reg.value + 1;", &mut ctx).unwrap();
    assert_eq!(result, Value::Int(42));
    assert_eq!(*register.value.lock().unwrap(), 41);

    assert!(matches!(
        runtime_error(run_in(&config, "reg.value = 'x';", &mut ctx)),
        EvalError::Host(_)
    ));
}

#[test]
fn test_strict_arithmetic_rejects_null_and_coercion() {
    let lenient = config_with(Namespaces::empty(), false, 64);
    let strict = config_with(Namespaces::empty(), true, 64);
    let mut ctx = MapContext::new().with("n", Value::Null);

    assert_eq!(run_in(&lenient, "n + 1;", &mut ctx).unwrap(), Value::Int(1));
    assert_eq!(run_in(&lenient, "'2' * 3;", &mut ctx).unwrap(), Value::Int(6));

    assert!(matches!(
        runtime_error(run_in(&strict, "n + 1;", &mut ctx)),
        EvalError::NullOperand { .. }
    ));
    assert!(matches!(
        runtime_error(run_in(&strict, "'2' * 3;", &mut ctx)),
        EvalError::TypeMismatch { .. }
    ));
}

#[test]
fn test_runtime_error_carries_span() {
    let source = "1 + (2 / 0);";
    match run(source) {
        Err(ExecutionError::Runtime { error, span }) => {
            assert_eq!(error, EvalError::DivisionByZero);
            assert_eq!(span.str_of(source), "2 / 0");
        }
        other => panic!("expected runtime error, got {other:?}"),
    }
}

#[test]
fn test_eval_depth_limit() {
    let config = config_with(Namespaces::empty(), false, 16);
    // Parentheses do not add nodes; right-nested additions do.
    let parens = format!("{}1{};", "(".repeat(20), ")".repeat(20));
    let nested = format!("{}0{};", "1 + (".repeat(20), ")".repeat(20));

    let mut ctx = MapContext::new();
    assert_eq!(run_in(&config, &parens, &mut ctx).unwrap(), Value::Int(1));
    match run_in(&config, &nested, &mut ctx) {
        Err(ExecutionError::ResourceExceeded(ResourceExceededError::StackOverflow {
            max_depth,
            ..
        })) => assert_eq!(max_depth, 16),
        other => panic!("expected stack overflow, got {other:?}"),
    }

    let roomy = config_with(Namespaces::empty(), false, 64);
    assert_eq!(run_in(&roomy, &nested, &mut ctx).unwrap(), Value::Int(20));
}

fn negations(count: usize) -> Node {
    let mut node = Node::leaf(NodeKind::Literal(Literal::Int(1)), Span::new(0, 1));
    for _ in 0..count {
        node = Node::new(NodeKind::Neg, Span::new(0, 1), vec![node]);
    }
    node
}

#[test]
fn test_default_eval_depth_limit() {
    let config = Configuration::shared_default();
    assert_eq!(config.max_eval_depth(), DEFAULT_MAX_EVAL_DEPTH);

    // Each negation and the innermost literal take one level.
    let fits = negations(DEFAULT_MAX_EVAL_DEPTH - 1);
    let expected = if (DEFAULT_MAX_EVAL_DEPTH - 1) % 2 == 0 { 1 } else { -1 };
    assert_eq!(
        evaluate(&config, &fits, &mut MapContext::new()).unwrap(),
        Value::Int(expected)
    );

    let too_deep = negations(DEFAULT_MAX_EVAL_DEPTH);
    match evaluate(&config, &too_deep, &mut MapContext::new()) {
        Err(ExecutionError::ResourceExceeded(ResourceExceededError::StackOverflow {
            depth,
            max_depth,
        })) => {
            assert_eq!(depth, DEFAULT_MAX_EVAL_DEPTH);
            assert_eq!(max_depth, DEFAULT_MAX_EVAL_DEPTH);
        }
        other => panic!("expected stack overflow, got {other:?}"),
    }
}

#[test]
fn test_left_nested_runs_do_not_add_depth() {
    let config = config_with(Namespaces::empty(), false, 8);
    let mut ctx = MapContext::new().with("yes", true).with("no", false);

    let sum = format!("{}0;", "1 + ".repeat(500));
    assert_eq!(run_in(&config, &sum, &mut ctx).unwrap(), Value::Int(500));

    let all = format!("{}yes;", "yes && ".repeat(300));
    assert_eq!(run_in(&config, &all, &mut ctx).unwrap(), Value::Bool(true));

    let calls = format!("' a '{};", ".trim()".repeat(200));
    assert_eq!(run_in(&config, &calls, &mut ctx).unwrap(), Value::from("a"));

    let compare = "1 < 2 == true != false;";
    assert_eq!(run_in(&config, compare, &mut ctx).unwrap(), Value::Bool(true));
}

#[test]
fn test_chained_logic_short_circuits() {
    let mut ctx = MapContext::new();
    let config = Configuration::shared_default();
    // `missing` is never read, so no undefined-variable error surfaces.
    assert_eq!(
        run_in(&config, "false && missing && missing;", &mut ctx).unwrap(),
        Value::Bool(false)
    );
    assert_eq!(
        run_in(&config, "true || missing || missing;", &mut ctx).unwrap(),
        Value::Bool(true)
    );
    assert_eq!(
        run_in(&config, "(false || true) && 1 == 1;", &mut ctx).unwrap(),
        Value::Bool(true)
    );
    assert_eq!(
        runtime_error(run_in(&config, "false || missing;", &mut ctx)),
        EvalError::UndefinedVariable {
            name: String::from("missing")
        }
    );
}
