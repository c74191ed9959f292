use alloc::string::ToString;
use core::cell::Cell;

use lazy_static::lazy_static;
use pest::Parser;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest_derive::Parser;

use crate::parser::error::{ParseError, ParseErrorKind, TranslateError, convert_pest_error};
use crate::parser::{BinaryOp, ComparisonOp, Literal, Node, NodeKind, Span, Tree};
use crate::{String, Vec, format, vec};

lazy_static! {
    // Note: precedence is defined lowest to highest.
    static ref PRATT_PARSER: PrattParser<Rule> = PrattParser::new()
        // (lowest precedence)
        // Logical operators.
        .op(Op::infix(Rule::or, Assoc::Left))            // `||`, `or`
        .op(Op::infix(Rule::and, Assoc::Left))           // `&&`, `and`

        // Comparison operators.
        .op(
            Op::infix(Rule::eq, Assoc::Left) |
            Op::infix(Rule::ne, Assoc::Left)
        )                                               // `==`, `!=`
        .op(
            Op::infix(Rule::lt, Assoc::Left) |
            Op::infix(Rule::le, Assoc::Left) |
            Op::infix(Rule::gt, Assoc::Left) |
            Op::infix(Rule::ge, Assoc::Left)
        )                                               // `<`, `<=`, `>`, `>=`

        // Arithmetic operators.
        .op(
            Op::infix(Rule::add, Assoc::Left) |
            Op::infix(Rule::sub, Assoc::Left)
        )                                               // `+`, `-`
        .op(
            Op::infix(Rule::mul, Assoc::Left) |
            Op::infix(Rule::div, Assoc::Left) |
            Op::infix(Rule::modulo, Assoc::Left)
        )                                               // `*`, `/`, `%`
        .op(Op::prefix(Rule::neg) |
            Op::prefix(Rule::not))                       // `-`, `!`

        // Postfix operators.
        .op(Op::postfix(Rule::method_op) |
            Op::postfix(Rule::field_op) |
            Op::postfix(Rule::index_op))                 // `.m()`, `.f`, `[]`
        // (highest precedence)
        ;
}

#[derive(Parser)]
#[grammar = "parser/grammar.pest"]
pub struct ScriptParser;

/// Converts normalized source text into a [`Tree`].
///
/// Implementations may keep state between calls (buffers, counters) and are
/// therefore only required to be `Send`: the engine serializes access to its
/// single instance. Each call must be logically independent of the previous
/// ones and deterministic for identical input.
pub trait Translate: Send {
    fn translate(&mut self, source: &str) -> Result<Tree, TranslateError>;
}

/// The bundled pest-based translator.
///
/// Holds the nesting-depth counter used while building one tree. The
/// counter is not `Sync`, so sharing a translator requires external
/// synchronization.
///
/// Depth counts one level per statement and one per expression: each pair
/// of parentheses, array item, call argument, index and ternary branch
/// opens a new expression. A run of prefix operators (`- - !x`) counts one
/// level per operator.
#[derive(Debug)]
pub struct PestTranslator {
    max_depth: usize,
    depth: Cell<usize>,
    translations: u64,
}

/// Default maximum nesting depth accepted by the translator.
///
/// Building a tree recurses once per level, so the limit keeps deeply
/// nested input well inside a 2 MiB thread stack in unoptimized builds.
pub const DEFAULT_MAX_PARSE_DEPTH: usize = 32;

impl Default for PestTranslator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PARSE_DEPTH)
    }
}

impl PestTranslator {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            depth: Cell::new(0),
            translations: 0,
        }
    }

    /// Number of translations performed by this instance.
    pub fn translations(&self) -> u64 {
        self.translations
    }

    fn reset(&mut self) {
        self.depth.set(0);
    }
}

impl Translate for PestTranslator {
    fn translate(&mut self, source: &str) -> Result<Tree, TranslateError> {
        self.reset();
        self.translations += 1;

        let ctx = BuildContext {
            source,
            depth: &self.depth,
            max_depth: self.max_depth,
        };
        let root = ctx.build()?;
        Ok(Tree::new(source, root))
    }
}

/// Failure while turning pest pairs into nodes.
enum BuildError {
    Syntax(pest::error::Error<Rule>),
    DepthExceeded { max_depth: usize, span: Span },
    Internal(String),
}

impl From<pest::error::Error<Rule>> for BuildError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        BuildError::Syntax(err)
    }
}

fn custom_error(message: String, span: pest::Span<'_>) -> BuildError {
    BuildError::Syntax(pest::error::Error::new_from_span(
        pest::error::ErrorVariant::CustomError { message },
        span,
    ))
}

fn internal_error(pair: &Pair<Rule>) -> BuildError {
    BuildError::Internal(format!(
        "Unhandled rule {:?} at {}..{}",
        pair.as_rule(),
        pair.as_span().start(),
        pair.as_span().end()
    ))
}

struct BuildContext<'t, 'input> {
    source: &'input str,
    depth: &'t Cell<usize>,
    max_depth: usize,
}

impl<'t, 'input> BuildContext<'t, 'input> {
    fn build(&self) -> Result<Node, TranslateError> {
        let result = ScriptParser::parse(Rule::script, self.source)
            .map_err(BuildError::from)
            .and_then(|mut pairs| {
                let pair = pairs
                    .next()
                    .ok_or_else(|| BuildError::Internal("missing script pair".to_string()))?;
                self.build_script(pair)
            });
        result.map_err(|err| match err {
            BuildError::Syntax(e) => {
                tracing::debug!("Pest parser failed with: {:?}", e);
                TranslateError::Syntax(convert_pest_error(e, self.source))
            }
            BuildError::DepthExceeded { max_depth, span } => {
                TranslateError::Syntax(ParseError::new(
                    ParseErrorKind::MaxDepthExceeded {
                        depth: max_depth + 1,
                        max_depth,
                    },
                    self.source.to_string(),
                    span,
                ))
            }
            BuildError::Internal(message) => TranslateError::Internal(message),
        })
    }

    fn check_depth(&self, pair: &Pair<Rule>) -> Result<(), BuildError> {
        self.reserve_depth(1, pair)?;
        self.depth.set(self.depth.get() + 1);
        Ok(())
    }

    /// Fails when `levels` more levels would go past the limit.
    fn reserve_depth(&self, levels: usize, pair: &Pair<Rule>) -> Result<(), BuildError> {
        if self.depth.get() + levels > self.max_depth {
            return Err(BuildError::DepthExceeded {
                max_depth: self.max_depth,
                span: pair.as_span().into(),
            });
        }
        Ok(())
    }

    fn build_script(&self, pair: Pair<Rule>) -> Result<Node, BuildError> {
        let span: Span = pair.as_span().into();
        let children = pair
            .into_inner()
            .filter(|p| p.as_rule() != Rule::EOI)
            .map(|p| self.build_statement(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Node::new(NodeKind::Script, span, children))
    }

    fn build_statement(&self, pair: Pair<Rule>) -> Result<Node, BuildError> {
        self.check_depth(&pair)?;
        let result = self.build_statement_inner(pair);
        self.depth.set(self.depth.get() - 1);
        result
    }

    fn build_statement_inner(&self, pair: Pair<Rule>) -> Result<Node, BuildError> {
        let span: Span = pair.as_span().into();
        match pair.as_rule() {
            Rule::empty => Ok(Node::leaf(NodeKind::Empty, span)),
            Rule::block => {
                let children = pair
                    .into_inner()
                    .map(|p| self.build_statement(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Node::new(NodeKind::Block, span, children))
            }
            Rule::if_stmt => {
                // Keyword pairs are atomic and come through as children.
                let children = pair
                    .into_inner()
                    .filter(|p| !matches!(p.as_rule(), Rule::kw_if | Rule::kw_else))
                    .map(|p| match p.as_rule() {
                        Rule::expression => self.build_expr(p),
                        _ => self.build_statement(p),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Node::new(NodeKind::If, span, children))
            }
            Rule::while_stmt => {
                let children = pair
                    .into_inner()
                    .filter(|p| p.as_rule() != Rule::kw_while)
                    .map(|p| match p.as_rule() {
                        Rule::expression => self.build_expr(p),
                        _ => self.build_statement(p),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Node::new(NodeKind::While, span, children))
            }
            Rule::assignment => {
                let mut inner = pair.into_inner();
                let target = self.build_lvalue(self.next_pair(&mut inner, span.clone())?)?;
                let value = self.build_expr(self.next_pair(&mut inner, span.clone())?)?;
                Ok(Node::new(NodeKind::Assign, span, vec![target, value]))
            }
            Rule::expr_stmt => {
                let mut inner = pair.into_inner();
                self.build_expr(self.next_pair(&mut inner, span)?)
            }
            _ => Err(internal_error(&pair)),
        }
    }

    fn next_pair<'p>(
        &self,
        pairs: &mut Pairs<'p, Rule>,
        span: Span,
    ) -> Result<Pair<'p, Rule>, BuildError> {
        pairs.next().ok_or_else(|| {
            BuildError::Internal(format!(
                "missing expected pair in rule at {}..{}",
                span.0.start, span.0.end
            ))
        })
    }

    fn build_lvalue(&self, pair: Pair<Rule>) -> Result<Node, BuildError> {
        let mut inner = pair.into_inner();
        let head = self.next_pair(&mut inner, Span::new(0, 0))?;
        let mut node = Node::leaf(
            NodeKind::Ident(head.as_str().to_string()),
            head.as_span().into(),
        );
        for member in inner {
            let span = Span::combine(&node.span, &member.as_span().into());
            node = Node::new(
                NodeKind::Field(member.as_str().to_string()),
                span,
                vec![node],
            );
        }
        Ok(node)
    }

    fn build_expr(&self, pair: Pair<Rule>) -> Result<Node, BuildError> {
        if pair.as_rule() != Rule::expression {
            return self.build_expr_inner(pair);
        }
        self.check_depth(&pair)?;
        let result = self.build_expr_inner(pair);
        self.depth.set(self.depth.get() - 1);
        result
    }

    fn build_expr_inner(&self, pair: Pair<Rule>) -> Result<Node, BuildError> {
        let span: Span = pair.as_span().into();
        match pair.as_rule() {
            Rule::expression => {
                let mut inner = pair.into_inner();
                let operation = self.build_expr(self.next_pair(&mut inner, span.clone())?)?;
                match inner.next() {
                    None => Ok(operation),
                    Some(then_pair) => {
                        let then_branch = self.build_expr(then_pair)?;
                        let else_branch = self.build_expr(self.next_pair(&mut inner, span.clone())?)?;
                        Ok(Node::new(
                            NodeKind::Ternary,
                            span,
                            vec![operation, then_branch, else_branch],
                        ))
                    }
                }
            }
            Rule::operation => {
                // The Pratt parser recurses once per prefix operator.
                let prefixes = longest_prefix_run(pair.clone().into_inner());
                self.reserve_depth(prefixes, &pair)?;
                self.depth.set(self.depth.get() + prefixes);
                let result = self.build_operation(pair.into_inner());
                self.depth.set(self.depth.get() - prefixes);
                result
            }
            Rule::grouped => {
                let mut inner = pair.into_inner();
                self.build_expr(self.next_pair(&mut inner, span)?)
            }
            Rule::array => {
                let items = pair
                    .into_inner()
                    .map(|p| self.build_expr(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Node::new(NodeKind::Array, span, items))
            }
            Rule::ns_call => {
                let mut inner = pair.into_inner();
                let target = self.next_pair(&mut inner, span.clone())?;
                let mut target_parts = target.into_inner();
                let namespace = self.next_pair(&mut target_parts, span.clone())?;
                let name = self.next_pair(&mut target_parts, span.clone())?;
                let args = inner
                    .map(|p| self.build_expr(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Node::new(
                    NodeKind::FunctionCall {
                        namespace: Some(namespace.as_str().to_string()),
                        name: name.as_str().to_string(),
                    },
                    span,
                    args,
                ))
            }
            Rule::fn_call => {
                let mut inner = pair.into_inner();
                let name = self.next_pair(&mut inner, span.clone())?;
                let args = inner
                    .map(|p| self.build_expr(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Node::new(
                    NodeKind::FunctionCall {
                        namespace: None,
                        name: name.as_str().to_string(),
                    },
                    span,
                    args,
                ))
            }
            Rule::integer => {
                let value = pair.as_str().parse().map_err(|_| {
                    custom_error("invalid integer literal".to_string(), pair.as_span())
                })?;
                Ok(Node::leaf(NodeKind::Literal(Literal::Int(value)), span))
            }
            Rule::float => {
                let value = pair.as_str().parse().map_err(|_| {
                    custom_error("invalid float literal".to_string(), pair.as_span())
                })?;
                Ok(Node::leaf(NodeKind::Literal(Literal::Float(value)), span))
            }
            Rule::boolean => {
                let value = match pair.as_str() {
                    "true" => true,
                    "false" => false,
                    _ => {
                        return Err(custom_error(
                            "invalid boolean literal".to_string(),
                            pair.as_span(),
                        ));
                    }
                };
                Ok(Node::leaf(NodeKind::Literal(Literal::Bool(value)), span))
            }
            Rule::null => Ok(Node::leaf(NodeKind::Literal(Literal::Null), span)),
            Rule::string => {
                let mut inner = pair.into_inner();
                let body = self.next_pair(&mut inner, span.clone())?;
                let value = self.unescape(&body)?;
                Ok(Node::leaf(NodeKind::Literal(Literal::Str(value)), span))
            }
            Rule::ident => Ok(Node::leaf(
                NodeKind::Ident(pair.as_str().to_string()),
                span,
            )),
            _ => Err(internal_error(&pair)),
        }
    }

    fn build_operation(&self, pairs: Pairs<Rule>) -> Result<Node, BuildError> {
        PRATT_PARSER
            .map_primary(|primary| self.build_expr(primary))
            .map_prefix(|op, rhs| {
                let operand = rhs?;
                let span = Span::combine(&op.as_span().into(), &operand.span);
                let kind = match op.as_rule() {
                    Rule::neg => NodeKind::Neg,
                    Rule::not => NodeKind::Not,
                    _ => return Err(internal_error(&op)),
                };
                Ok(Node::new(kind, span, vec![operand]))
            })
            .map_infix(|lhs, op, rhs| {
                let left = lhs?;
                let right = rhs?;
                let span = Span::combine(&left.span, &right.span);
                let kind = match op.as_rule() {
                    Rule::or => NodeKind::Or,
                    Rule::and => NodeKind::And,
                    Rule::eq => NodeKind::Compare(ComparisonOp::Eq),
                    Rule::ne => NodeKind::Compare(ComparisonOp::Neq),
                    Rule::lt => NodeKind::Compare(ComparisonOp::Lt),
                    Rule::le => NodeKind::Compare(ComparisonOp::Le),
                    Rule::gt => NodeKind::Compare(ComparisonOp::Gt),
                    Rule::ge => NodeKind::Compare(ComparisonOp::Ge),
                    Rule::add => NodeKind::Binary(BinaryOp::Add),
                    Rule::sub => NodeKind::Binary(BinaryOp::Sub),
                    Rule::mul => NodeKind::Binary(BinaryOp::Mul),
                    Rule::div => NodeKind::Binary(BinaryOp::Div),
                    Rule::modulo => NodeKind::Binary(BinaryOp::Mod),
                    _ => return Err(internal_error(&op)),
                };
                Ok(Node::new(kind, span, vec![left, right]))
            })
            .map_postfix(|lhs, op| {
                let target = lhs?;
                let span = Span::combine(&target.span, &op.as_span().into());
                match op.as_rule() {
                    Rule::field_op => {
                        let mut inner = op.into_inner();
                        let member = self.next_pair(&mut inner, span.clone())?;
                        Ok(Node::new(
                            NodeKind::Field(member.as_str().to_string()),
                            span,
                            vec![target],
                        ))
                    }
                    Rule::method_op => {
                        let mut inner = op.into_inner();
                        let member = self.next_pair(&mut inner, span.clone())?;
                        let mut children = vec![target];
                        for arg in inner {
                            children.push(self.build_expr(arg)?);
                        }
                        Ok(Node::new(
                            NodeKind::MethodCall(member.as_str().to_string()),
                            span,
                            children,
                        ))
                    }
                    Rule::index_op => {
                        let mut inner = op.into_inner();
                        let index = self.build_expr(self.next_pair(&mut inner, span.clone())?)?;
                        Ok(Node::new(NodeKind::Index, span, vec![target, index]))
                    }
                    _ => Err(internal_error(&op)),
                }
            })
            .parse(pairs)
    }

    fn unescape(&self, body: &Pair<Rule>) -> Result<String, BuildError> {
        let mut buf = String::with_capacity(body.as_str().len());
        let mut chars = body.as_str().chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                buf.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => buf.push('\n'),
                Some('t') => buf.push('\t'),
                Some('r') => buf.push('\r'),
                Some('0') => buf.push('\0'),
                Some(other @ ('\\' | '\'' | '"')) => buf.push(other),
                Some(other) => {
                    return Err(custom_error(
                        format!("invalid escape sequence '\\{}'", other),
                        body.as_span(),
                    ));
                }
                None => {
                    return Err(custom_error(
                        "unterminated escape sequence".to_string(),
                        body.as_span(),
                    ));
                }
            }
        }
        Ok(buf)
    }
}

fn longest_prefix_run(pairs: Pairs<Rule>) -> usize {
    let mut longest = 0;
    let mut run = 0;
    for pair in pairs {
        if matches!(pair.as_rule(), Rule::neg | Rule::not) {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    longest
}
