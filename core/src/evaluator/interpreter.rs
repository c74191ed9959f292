//! Core evaluation logic.

use core::cmp::Ordering;

use crate::{
    String, Vec,
    api::Configuration,
    evaluator::{Context, EvalError, ExecutionError, ResourceExceededError},
    parser::{ComparisonOp, Literal, Node, NodeKind},
    format,
    values::Value,
};

/// Tree-walking evaluator.
///
/// Reads the tree and the configuration; the only state it mutates is the
/// caller's [`Context`] and its own depth counter.
pub struct Interpreter<'a> {
    config: &'a Configuration,
    context: &'a mut dyn Context,
    depth: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(config: &'a Configuration, context: &'a mut dyn Context) -> Self {
        Self {
            config,
            context,
            depth: 0,
        }
    }

    /// Evaluate a node, tracking recursion depth.
    pub fn eval(&mut self, node: &Node) -> Result<Value, ExecutionError> {
        let max_depth = self.config.max_eval_depth();
        if self.depth >= max_depth {
            return Err(ResourceExceededError::StackOverflow {
                depth: self.depth,
                max_depth,
            }
            .into());
        }

        self.depth += 1;
        let result = self.eval_inner(node);
        self.depth -= 1;

        result
    }

    fn runtime(node: &Node) -> impl FnOnce(EvalError) -> ExecutionError + '_ {
        move |error| ExecutionError::Runtime {
            error,
            span: node.span.clone(),
        }
    }

    fn truthy(&mut self, node: &Node) -> Result<bool, ExecutionError> {
        let value = self.eval(node)?;
        self.truth_of(&value, node)
    }

    fn truth_of(&self, value: &Value, node: &Node) -> Result<bool, ExecutionError> {
        self.config
            .arithmetic()
            .truthy(value)
            .map_err(Self::runtime(node))
    }

    fn eval_all(&mut self, nodes: &[Node]) -> Result<Vec<Value>, ExecutionError> {
        nodes.iter().map(|n| self.eval(n)).collect()
    }

    /// Inner evaluation logic (no depth tracking).
    fn eval_inner(&mut self, node: &Node) -> Result<Value, ExecutionError> {
        if left_operand(node).is_some() {
            return self.eval_chain(node);
        }

        let children = node.children.as_slice();
        match (&node.kind, children) {
            (NodeKind::Script | NodeKind::Block, statements) => self.eval_statements(statements),
            (NodeKind::Empty, _) => Ok(Value::Null),
            (NodeKind::If, [cond, then_branch, rest @ ..]) => {
                self.eval_branch(cond, then_branch, rest.first())
            }
            (NodeKind::Ternary, [cond, then_branch, else_branch]) => {
                self.eval_branch(cond, then_branch, Some(else_branch))
            }
            (NodeKind::While, [cond, body]) => self.eval_while(cond, body),
            (NodeKind::Assign, [target, value]) => self.eval_assign(target, value),
            (NodeKind::Not, [operand]) => Ok(Value::Bool(!self.truthy(operand)?)),
            (NodeKind::Neg, [operand]) => self.eval_neg(node, operand),
            (NodeKind::Literal(lit), _) => Ok(literal_value(lit)),
            (NodeKind::Ident(name), _) => self.lookup(node, name),
            (NodeKind::FunctionCall { namespace, name }, args) => {
                let args = self.eval_all(args)?;
                self.call_function(namespace.as_deref(), name, &args)
                    .map_err(Self::runtime(node))
            }
            (NodeKind::Array, items) => Ok(Value::from(self.eval_all(items)?)),
            _ => Err(Self::malformed(node)),
        }
    }

    /// Evaluates a left-nested run of binary and postfix operators.
    ///
    /// `a + b + c` nests to the left, so the run is walked down to its
    /// leftmost operand once and then folded back up in a loop. Only the
    /// right-hand operands recurse.
    fn eval_chain(&mut self, node: &Node) -> Result<Value, ExecutionError> {
        let mut links = Vec::new();
        let mut current = node;
        while let Some(left) = left_operand(current) {
            links.push(current);
            current = left;
        }

        let mut value = self.eval(current)?;
        for link in links.into_iter().rev() {
            value = self.apply_link(link, value)?;
        }
        Ok(value)
    }

    /// Applies one operator of a chain to the value of its left operand.
    fn apply_link(&mut self, link: &Node, left_value: Value) -> Result<Value, ExecutionError> {
        match (&link.kind, link.children.as_slice()) {
            (NodeKind::Or, [left, right]) => {
                let result = self.truth_of(&left_value, left)? || self.truthy(right)?;
                Ok(Value::Bool(result))
            }
            (NodeKind::And, [left, right]) => {
                let result = self.truth_of(&left_value, left)? && self.truthy(right)?;
                Ok(Value::Bool(result))
            }
            (NodeKind::Compare(op), [_, right]) => {
                let right = self.eval(right)?;
                self.compare(*op, &left_value, &right)
                    .map(Value::Bool)
                    .map_err(Self::runtime(link))
            }
            (NodeKind::Binary(op), [_, right]) => {
                let right = self.eval(right)?;
                self.config
                    .arithmetic()
                    .binary(*op, &left_value, &right)
                    .map_err(Self::runtime(link))
            }
            (NodeKind::Field(name), [_]) => self
                .config
                .resolver()
                .get_property(&left_value, name)
                .map_err(Self::runtime(link)),
            (NodeKind::Index, [_, index]) => {
                let index = self.eval(index)?;
                self.config
                    .resolver()
                    .index(&left_value, &index)
                    .map_err(Self::runtime(link))
            }
            (NodeKind::MethodCall(name), [_, args @ ..]) => {
                let args = self.eval_all(args)?;
                self.config
                    .resolver()
                    .invoke_method(&left_value, name, &args)
                    .map_err(Self::runtime(link))
            }
            _ => Err(Self::malformed(link)),
        }
    }

    fn eval_statements(&mut self, statements: &[Node]) -> Result<Value, ExecutionError> {
        // Empty statements leave the running value untouched.
        let mut last = Value::Null;
        for statement in statements {
            if statement.kind != NodeKind::Empty {
                last = self.eval(statement)?;
            }
        }
        Ok(last)
    }

    fn eval_branch(
        &mut self,
        cond: &Node,
        then_branch: &Node,
        else_branch: Option<&Node>,
    ) -> Result<Value, ExecutionError> {
        if self.truthy(cond)? {
            self.eval(then_branch)
        } else if let Some(else_branch) = else_branch {
            self.eval(else_branch)
        } else {
            Ok(Value::Null)
        }
    }

    fn eval_while(&mut self, cond: &Node, body: &Node) -> Result<Value, ExecutionError> {
        let mut last = Value::Null;
        while self.truthy(cond)? {
            last = self.eval(body)?;
        }
        Ok(last)
    }

    fn eval_assign(&mut self, target: &Node, value: &Node) -> Result<Value, ExecutionError> {
        let value = self.eval(value)?;
        self.assign(target, value.clone())?;
        Ok(value)
    }

    fn eval_neg(&mut self, node: &Node, operand: &Node) -> Result<Value, ExecutionError> {
        let value = self.eval(operand)?;
        self.config
            .arithmetic()
            .negate(&value)
            .map_err(Self::runtime(node))
    }

    fn lookup(&self, node: &Node, name: &str) -> Result<Value, ExecutionError> {
        self.context
            .get(name)
            .ok_or_else(|| ExecutionError::Runtime {
                error: EvalError::UndefinedVariable {
                    name: String::from(name),
                },
                span: node.span.clone(),
            })
    }

    fn malformed(node: &Node) -> ExecutionError {
        ExecutionError::Runtime {
            error: EvalError::Host(format!(
                "malformed {} node with {} children",
                node.kind.tag(),
                node.children.len()
            )),
            span: node.span.clone(),
        }
    }

    fn compare(&self, op: ComparisonOp, left: &Value, right: &Value) -> Result<bool, EvalError> {
        let arithmetic = self.config.arithmetic();
        Ok(match op {
            ComparisonOp::Eq => arithmetic.equals(left, right)?,
            ComparisonOp::Neq => !arithmetic.equals(left, right)?,
            ComparisonOp::Lt => arithmetic.compare(left, right)? == Ordering::Less,
            ComparisonOp::Le => arithmetic.compare(left, right)? != Ordering::Greater,
            ComparisonOp::Gt => arithmetic.compare(left, right)? == Ordering::Greater,
            ComparisonOp::Ge => arithmetic.compare(left, right)? != Ordering::Less,
        })
    }

    fn assign(&mut self, target: &Node, value: Value) -> Result<(), ExecutionError> {
        match (&target.kind, target.children.as_slice()) {
            (NodeKind::Ident(name), _) => {
                self.context.set(name, value);
                Ok(())
            }
            (NodeKind::Field(name), [object]) => {
                let object = self.eval(object)?;
                self.config
                    .resolver()
                    .set_property(&object, name, value)
                    .map_err(Self::runtime(target))
            }
            (kind, _) => Err(ExecutionError::Runtime {
                error: EvalError::NotAssignable {
                    target: String::from(kind.tag()),
                },
                span: target.span.clone(),
            }),
        }
    }

    /// Resolves `ns:name(args)` and `name(args)` calls.
    ///
    /// Unprefixed calls try the `size` and `empty` built-ins first, then the
    /// namespace registered under the empty key.
    fn call_function(
        &self,
        namespace: Option<&str>,
        name: &str,
        args: &[Value],
    ) -> Result<Value, EvalError> {
        let resolver = self.config.resolver();
        if namespace.is_none() {
            match (name, args) {
                ("size", [arg]) => return Ok(Value::Int(resolver.size_of(arg)? as i64)),
                ("empty", [arg]) => {
                    let empty = match arg {
                        Value::Null => true,
                        other => resolver.size_of(other).map(|n| n == 0).unwrap_or(false),
                    };
                    return Ok(Value::Bool(empty));
                }
                ("size" | "empty", _) => {
                    return Err(EvalError::WrongArgumentCount {
                        name: String::from(name),
                        expected: 1,
                        got: args.len(),
                    });
                }
                _ => {}
            }
        }

        let key = namespace.unwrap_or("");
        let Some(object) = self.config.namespaces().get(key) else {
            return Err(match namespace {
                Some(ns) => EvalError::UnknownNamespace {
                    name: String::from(ns),
                },
                None => EvalError::UnknownFunction {
                    name: String::from(name),
                },
            });
        };
        resolver.invoke_method(&Value::Object(object.clone()), name, args)
    }
}

/// The left operand of a node that continues a left-nested chain.
fn left_operand(node: &Node) -> Option<&Node> {
    match node.kind {
        NodeKind::Or
        | NodeKind::And
        | NodeKind::Compare(_)
        | NodeKind::Binary(_)
        | NodeKind::Field(_)
        | NodeKind::Index
        | NodeKind::MethodCall(_) => node.children.first(),
        _ => None,
    }
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(i) => Value::Int(*i),
        Literal::Float(f) => Value::Float(*f),
        Literal::Str(s) => Value::from(s.as_str()),
    }
}
