//! Stack-machine evaluation of parsed programs.
//!
//! Evaluation walks the AST with a single explicit value stack, resolving
//! identifiers against a [`Scope`] and dispatching calls onto host objects
//! through the capability traits in [`crate::describer`]. Function nodes
//! evaluate to *unbound* closures: the call's arguments are captured
//! eagerly, but invocation waits until a chain (or a top-level statement,
//! for global calls) supplies the receiver.
//!
//! Lambdas are not evaluated at all. Declaring one resolves its lexical
//! identifiers against the current scope, producing a new sub-tree in which
//! only `"field"` references remain unresolved; the result is a reusable
//! predicate for the per-record evaluator in [`crate::stateful`].

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use rust_decimal::{prelude::FromPrimitive, prelude::ToPrimitive, Decimal};

use crate::ast::nodes::*;
use crate::ast::tokens::{Position, TokenType};
use crate::parser::{parse, ParseError};
use crate::scope::Scope;
use crate::value::Value;

/// Errors raised while evaluating a program.
///
/// None of these are fatal to the process: they terminate the current
/// evaluation and surface as ordinary values for the caller to display.
#[derive(Debug, Clone)]
pub enum EvalError {
    /// The script failed to parse (only from [`evaluate`]/`eval_str`)
    Parse(ParseError),
    /// An identifier had no binding in scope
    Undefined {
        name: String,
        available: Vec<String>,
    },
    /// A `var` declaration rebound an existing name
    Redefined(String),
    /// Operand or argument types did not fit the operation
    TypeError(String),
    /// No chain method / property / dynamic method under the name; the
    /// message suggests the correct operator when one would have matched
    MissingMethod(String),
    /// A value could not be converted to the requested host type
    Conversion(String),
    /// A host method panicked; the panic was caught at the call boundary
    HostPanic {
        func: String,
        receiver: String,
        message: String,
    },
    DivisionByZero,
    /// Broken internal invariant, e.g. stack underflow
    Internal(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Parse(e) => write!(f, "{e}"),
            EvalError::Undefined { name, available } => {
                write!(
                    f,
                    "name \"{name}\" is undefined. Names in scope: {}",
                    available.join(", ")
                )
            }
            EvalError::Redefined(name) => {
                write!(f, "attempted to redefine {name}, vars are immutable")
            }
            EvalError::TypeError(message) => write!(f, "type error: {message}"),
            EvalError::MissingMethod(message) => f.write_str(message),
            EvalError::Conversion(message) => write!(f, "conversion error: {message}"),
            EvalError::HostPanic {
                func,
                receiver,
                message,
            } => {
                write!(f, "error calling \"{func}\" on {receiver}: {message}")
            }
            EvalError::DivisionByZero => f.write_str("division by zero"),
            EvalError::Internal(message) => write!(f, "internal error: {message}"),
        }
    }
}

impl std::error::Error for EvalError {}

impl From<ParseError> for EvalError {
    fn from(e: ParseError) -> Self {
        EvalError::Parse(e)
    }
}

/// Where the evaluator sends non-fatal diagnostics, such as the
/// property-operator deprecation warning. Passed into the evaluator rather
/// than held in process-wide state.
pub trait DiagnosticSink {
    fn deprecation(&mut self, pos: Position, message: &str);
}

/// Default sink: forwards to `tracing` at WARN level.
#[derive(Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn deprecation(&mut self, pos: Position, message: &str) {
        tracing::warn!(line = pos.line, char = pos.char, "{message}");
    }
}

/// One entry of the evaluation stack.
///
/// Identifiers and function calls stay symbolic until the construct that
/// consumes them decides how to resolve them: a chain right-hand side needs
/// the *name*, not the value.
enum Item {
    Value(Value),
    Ident { name: String, pos: Position },
    Func(UnboundFunc),
}

/// A function call whose arguments are captured but whose receiver is not
/// yet known.
struct UnboundFunc {
    kind: FuncKind,
    name: String,
    args: Vec<Value>,
    pos: Position,
}

/// Parse and evaluate a script against a scope.
pub fn evaluate(script: &str, scope: &mut Scope) -> Result<(), EvalError> {
    Evaluator::new().eval_str(script, scope)
}

/// The tree-walking stack machine.
pub struct Evaluator {
    stack: Vec<Item>,
    sink: Box<dyn DiagnosticSink>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Evaluator {
            stack: Vec::new(),
            sink: Box::new(TracingSink),
        }
    }

    /// Use a custom diagnostic sink instead of the tracing default.
    pub fn with_sink(sink: impl DiagnosticSink + 'static) -> Self {
        Evaluator {
            stack: Vec::new(),
            sink: Box::new(sink),
        }
    }

    /// Parse `script` and evaluate it against `scope`.
    pub fn eval_str(&mut self, script: &str, scope: &mut Scope) -> Result<(), EvalError> {
        let root = parse(script)?;
        self.eval(&root, scope)
    }

    /// Evaluate an already-parsed program against `scope`. Bindings made by
    /// `var` declarations are visible in the scope afterwards.
    pub fn eval(&mut self, root: &Node, scope: &mut Scope) -> Result<(), EvalError> {
        self.stack.clear();
        self.eval_node(root, scope)
    }

    fn eval_node(&mut self, node: &Node, scope: &mut Scope) -> Result<(), EvalError> {
        match node {
            Node::List(list) => {
                for statement in &list.nodes {
                    self.eval_node(statement, scope)?;
                    // Statements run for effect; a leftover global call is
                    // invoked, anything else is discarded
                    if let Some(item) = self.stack.pop() {
                        if let Item::Func(uf) = item
                            && uf.kind == FuncKind::Global
                        {
                            self.call_function(uf, None, scope)?;
                        }
                    }
                    self.stack.clear();
                }
                Ok(())
            }
            Node::Comment(_) => Ok(()),
            Node::Number(n) => {
                let value = match n.num {
                    Num::Int(i) => Value::Int(i),
                    Num::Float(x) => Value::Float(x),
                };
                self.stack.push(Item::Value(value));
                Ok(())
            }
            Node::Duration(n) => {
                self.stack.push(Item::Value(Value::Duration(n.dur)));
                Ok(())
            }
            Node::Bool(n) => {
                self.stack.push(Item::Value(Value::Bool(n.bool_value)));
                Ok(())
            }
            Node::String(n) => {
                self.stack
                    .push(Item::Value(Value::String(n.literal.clone())));
                Ok(())
            }
            Node::Regex(n) => {
                self.stack.push(Item::Value(Value::Regex(n.regex.clone())));
                Ok(())
            }
            Node::Star(_) => {
                self.stack.push(Item::Value(Value::Star));
                Ok(())
            }
            Node::Reference(n) => {
                self.stack
                    .push(Item::Value(Value::Reference(n.reference.clone())));
                Ok(())
            }
            Node::Identifier(n) => {
                self.stack.push(Item::Ident {
                    name: n.ident.clone(),
                    pos: n.pos,
                });
                Ok(())
            }
            Node::Lambda(n) => {
                // Resolve lexical identifiers now; leave "field" references
                // for the per-record evaluator. The parsed tree is never
                // mutated, so the same AST can be re-evaluated against a
                // different scope.
                let resolved = resolve_idents(&n.expr, scope)?;
                self.stack.push(Item::Value(Value::Lambda(Rc::new(LambdaNode {
                    pos: n.pos,
                    expr: Box::new(resolved),
                    comment: None,
                }))));
                Ok(())
            }
            Node::Unary(n) => {
                self.eval_node(&n.node, scope)?;
                let operand = self.pop_value(scope)?;
                let value = apply_unary(n.operator, &operand)?;
                self.stack.push(Item::Value(value));
                Ok(())
            }
            Node::Binary(n) => {
                self.eval_node(&n.left, scope)?;
                let left = self.pop_value(scope)?;
                self.eval_node(&n.right, scope)?;
                let right = self.pop_value(scope)?;
                let value = apply_binop(n.operator, &left, &right)?;
                self.stack.push(Item::Value(value));
                Ok(())
            }
            Node::Declaration(n) => {
                self.eval_node(&n.right, scope)?;
                let value = self.pop_value(scope)?;
                scope.set(n.left.ident.clone(), value)
            }
            Node::Chain(n) => {
                self.eval_node(&n.left, scope)?;
                self.eval_node(&n.right, scope)?;
                let right = self.pop_item()?;
                let left = self.pop_item()?;
                let receiver = self.resolve_item(left, scope)?;
                let result = match right {
                    Item::Func(uf) => self.call_function(uf, Some(receiver), scope)?,
                    Item::Ident { name, pos } => self.property_read(&receiver, &name, pos)?,
                    Item::Value(_) => {
                        return Err(EvalError::Internal(format!(
                            "chain right side at {} is neither a function nor an identifier",
                            n.pos
                        )));
                    }
                };
                self.stack.push(Item::Value(result));
                Ok(())
            }
            Node::Function(n) => {
                let mut args = Vec::with_capacity(n.args.len());
                for arg in &n.args {
                    self.eval_node(arg, scope)?;
                    args.push(self.pop_value(scope)?);
                }
                self.stack.push(Item::Func(UnboundFunc {
                    kind: n.kind,
                    name: n.func.clone(),
                    args,
                    pos: n.pos,
                }));
                Ok(())
            }
        }
    }

    fn pop_item(&mut self) -> Result<Item, EvalError> {
        self.stack
            .pop()
            .ok_or_else(|| EvalError::Internal("evaluation stack underflow".to_string()))
    }

    /// Pop and fully resolve: identifiers through scope, receiverless
    /// global calls invoked on the spot.
    fn pop_value(&mut self, scope: &mut Scope) -> Result<Value, EvalError> {
        let item = self.pop_item()?;
        self.resolve_item(item, scope)
    }

    fn resolve_item(&mut self, item: Item, scope: &mut Scope) -> Result<Value, EvalError> {
        match item {
            Item::Value(v) => Ok(v),
            Item::Ident { name, .. } => scope.get(&name),
            Item::Func(uf) if uf.kind == FuncKind::Global => self.call_function(uf, None, scope),
            Item::Func(uf) => Err(EvalError::Internal(format!(
                "{} function \"{}\" at {} has no receiver",
                uf.kind.operator(),
                uf.name,
                uf.pos
            ))),
        }
    }

    /// Invoke an unbound function against its receiver, following the
    /// dispatch rules of its kind.
    fn call_function(
        &mut self,
        uf: UnboundFunc,
        receiver: Option<Value>,
        scope: &mut Scope,
    ) -> Result<Value, EvalError> {
        match uf.kind {
            FuncKind::Global => {
                if receiver.is_some() {
                    return Err(EvalError::Internal(format!(
                        "global function \"{}\" at {} called with a receiver",
                        uf.name, uf.pos
                    )));
                }
                match scope.get(&uf.name)? {
                    Value::Func(f) => guarded_call(&uf, "scope", || f(&uf.args)),
                    other => Err(EvalError::TypeError(format!(
                        "\"{}\" at {} is not a function, it is a {}",
                        uf.name,
                        uf.pos,
                        other.type_name()
                    ))),
                }
            }
            FuncKind::Chain => {
                let receiver = receiver.expect("chain call has a receiver");
                let Value::Object(obj) = &receiver else {
                    return Err(EvalError::TypeError(format!(
                        "invalid receiver of type {} for chain method \"{}\" at {}",
                        receiver.type_name(),
                        uf.name,
                        uf.pos
                    )));
                };
                if obj.borrow().has_chain_method(&uf.name) {
                    let desc = obj.borrow().describe();
                    let obj = obj.clone();
                    return guarded_call(&uf, &desc, || {
                        obj.borrow_mut().call_chain_method(&uf.name, &uf.args)
                    });
                }
                let desc = obj.borrow().describe();
                if obj.borrow().has_property(&uf.name) {
                    return Err(EvalError::MissingMethod(format!(
                        "no chain method \"{}\" on {desc} at {}; \"{}\" is a property, use '.' instead of '|'",
                        uf.name, uf.pos, uf.name
                    )));
                }
                if scope.dynamic_method(&uf.name).is_some() {
                    return Err(EvalError::MissingMethod(format!(
                        "no chain method \"{}\" on {desc} at {}; \"{}\" is a dynamic method, use '@' instead of '|'",
                        uf.name, uf.pos, uf.name
                    )));
                }
                Err(EvalError::MissingMethod(format!(
                    "no chain method \"{}\" on {desc} at {}",
                    uf.name, uf.pos
                )))
            }
            FuncKind::Property => {
                let receiver = receiver.expect("property call has a receiver");
                let Value::Object(obj) = &receiver else {
                    return Err(EvalError::TypeError(format!(
                        "invalid receiver of type {} for property \"{}\" at {}",
                        receiver.type_name(),
                        uf.name,
                        uf.pos
                    )));
                };
                if obj.borrow().has_property(&uf.name) {
                    let desc = obj.borrow().describe();
                    let obj_ref = obj.clone();
                    guarded_call(&uf, &desc, || {
                        obj_ref
                            .borrow_mut()
                            .set_property(&uf.name, &uf.args)
                            .map(|()| Value::Star)
                    })?;
                    // Property calls return the receiver so they chain
                    return Ok(receiver.clone());
                }
                if obj.borrow().has_chain_method(&uf.name) {
                    // Transitional compatibility: accept but warn
                    self.sink.deprecation(
                        uf.pos,
                        &format!(
                            "calling chain method \"{}\" with '.' is deprecated, use '|' instead",
                            uf.name
                        ),
                    );
                    let desc = obj.borrow().describe();
                    let obj = obj.clone();
                    return guarded_call(&uf, &desc, || {
                        obj.borrow_mut().call_chain_method(&uf.name, &uf.args)
                    });
                }
                let desc = obj.borrow().describe();
                if scope.dynamic_method(&uf.name).is_some() {
                    return Err(EvalError::MissingMethod(format!(
                        "no property \"{}\" on {desc} at {}; \"{}\" is a dynamic method, use '@' instead of '.'",
                        uf.name, uf.pos, uf.name
                    )));
                }
                Err(EvalError::MissingMethod(format!(
                    "no property \"{}\" on {desc} at {}",
                    uf.name, uf.pos
                )))
            }
            FuncKind::Dynamic => {
                let receiver = receiver.expect("dynamic call has a receiver");
                if let Some(f) = scope.dynamic_method(&uf.name) {
                    let desc = receiver.type_name();
                    return guarded_call(&uf, desc, || f(&receiver, &uf.args));
                }
                if let Value::Object(obj) = &receiver {
                    let desc = obj.borrow().describe();
                    if obj.borrow().has_property(&uf.name) {
                        return Err(EvalError::MissingMethod(format!(
                            "no dynamic method \"{}\" at {}; \"{}\" is a property on {desc}, use '.' instead of '@'",
                            uf.name, uf.pos, uf.name
                        )));
                    }
                    if obj.borrow().has_chain_method(&uf.name) {
                        return Err(EvalError::MissingMethod(format!(
                            "no dynamic method \"{}\" at {}; \"{}\" is a chain method on {desc}, use '|' instead of '@'",
                            uf.name, uf.pos, uf.name
                        )));
                    }
                }
                Err(EvalError::MissingMethod(format!(
                    "no dynamic method \"{}\" at {}",
                    uf.name, uf.pos
                )))
            }
        }
    }

    /// Bare identifier on the right of a `.` chain: a property read.
    fn property_read(
        &mut self,
        receiver: &Value,
        name: &str,
        pos: Position,
    ) -> Result<Value, EvalError> {
        let Value::Object(obj) = receiver else {
            return Err(EvalError::TypeError(format!(
                "value of type {} has no properties (reading \"{name}\" at {pos})",
                receiver.type_name()
            )));
        };
        let desc = obj.borrow().describe();
        if obj.borrow().has_property(name) {
            return obj.borrow().property(name).ok_or_else(|| {
                EvalError::MissingMethod(format!(
                    "property \"{name}\" on {desc} at {pos} is write-only"
                ))
            });
        }
        if obj.borrow().has_chain_method(name) {
            return Err(EvalError::MissingMethod(format!(
                "no property \"{name}\" on {desc} at {pos}; \"{name}\" is a chain method, use '|' instead of '.'"
            )));
        }
        Err(EvalError::MissingMethod(format!(
            "no property \"{name}\" on {desc} at {pos}"
        )))
    }
}

/// Run a host callable, converting any panic into a positioned error. A
/// host panic must never cross the evaluator boundary uncaught.
fn guarded_call(
    uf: &UnboundFunc,
    receiver_desc: &str,
    f: impl FnOnce() -> Result<Value, EvalError>,
) -> Result<Value, EvalError> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let mut message = if let Some(s) = payload.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "panic of unknown type".to_string()
            };
            message.push_str(&format!(" (at {})", uf.pos));
            if uf
                .args
                .iter()
                .any(|arg| matches!(arg, Value::Reference(_)))
            {
                message.push_str("; did you use double quotes instead of single quotes?");
            }
            Err(EvalError::HostPanic {
                func: uf.name.clone(),
                receiver: receiver_desc.to_string(),
                message,
            })
        }
    }
}

/// Replace every lexical identifier in a lambda body with a literal node
/// holding its current scope value, returning a new tree. `"field"`
/// references are left untouched for per-record resolution.
pub fn resolve_idents(node: &Node, scope: &Scope) -> Result<Node, EvalError> {
    match node {
        Node::Identifier(ident) => {
            let value = scope.get(&ident.ident)?;
            value_to_node(&value, ident.pos)
        }
        Node::Unary(unary) => Ok(Node::Unary(UnaryNode {
            pos: unary.pos,
            operator: unary.operator,
            node: Box::new(resolve_idents(&unary.node, scope)?),
            comment: unary.comment.clone(),
        })),
        Node::Binary(binary) => Ok(Node::Binary(BinaryNode {
            pos: binary.pos,
            operator: binary.operator,
            left: Box::new(resolve_idents(&binary.left, scope)?),
            right: Box::new(resolve_idents(&binary.right, scope)?),
            parens: binary.parens,
            multi_line: binary.multi_line,
            comment: binary.comment.clone(),
        })),
        Node::Function(function) => {
            let mut args = Vec::with_capacity(function.args.len());
            for arg in &function.args {
                args.push(resolve_idents(arg, scope)?);
            }
            Ok(Node::Function(FunctionNode {
                pos: function.pos,
                kind: function.kind,
                func: function.func.clone(),
                args,
                multi_line: function.multi_line,
                comment: function.comment.clone(),
            }))
        }
        Node::Lambda(lambda) => Ok(Node::Lambda(LambdaNode {
            pos: lambda.pos,
            expr: Box::new(resolve_idents(&lambda.expr, scope)?),
            comment: lambda.comment.clone(),
        })),
        Node::Number(_)
        | Node::Duration(_)
        | Node::Bool(_)
        | Node::String(_)
        | Node::Regex(_)
        | Node::Star(_)
        | Node::Reference(_) => Ok(node.clone()),
        other => Err(EvalError::Internal(format!(
            "unexpected {} inside a lambda expression",
            other.kind_name()
        ))),
    }
}

/// Turn a scope value back into a literal node for embedding in a resolved
/// lambda. Negative numbers and durations embed as unary minus over a
/// positive literal.
fn value_to_node(value: &Value, pos: Position) -> Result<Node, EvalError> {
    let node = match value {
        Value::Bool(b) => Node::Bool(BoolNode {
            pos,
            bool_value: *b,
            comment: None,
        }),
        Value::Int(i) => {
            if *i < 0 {
                let magnitude = i
                    .checked_neg()
                    .ok_or_else(|| EvalError::Conversion(format!("cannot embed {i} in a lambda")))?;
                Node::Unary(UnaryNode {
                    pos,
                    operator: TokenType::Minus,
                    node: Box::new(Node::Number(NumberNode {
                        pos,
                        num: Num::Int(magnitude),
                        comment: None,
                    })),
                    comment: None,
                })
            } else {
                Node::Number(NumberNode {
                    pos,
                    num: Num::Int(*i),
                    comment: None,
                })
            }
        }
        Value::Float(f) => {
            if *f < 0.0 {
                Node::Unary(UnaryNode {
                    pos,
                    operator: TokenType::Minus,
                    node: Box::new(Node::Number(NumberNode {
                        pos,
                        num: Num::Float(-f),
                        comment: None,
                    })),
                    comment: None,
                })
            } else {
                Node::Number(NumberNode {
                    pos,
                    num: Num::Float(*f),
                    comment: None,
                })
            }
        }
        Value::Duration(d) => {
            if d.nanos() < 0 {
                Node::Unary(UnaryNode {
                    pos,
                    operator: TokenType::Minus,
                    node: Box::new(Node::Duration(DurationNode {
                        pos,
                        dur: -*d,
                        comment: None,
                    })),
                    comment: None,
                })
            } else {
                Node::Duration(DurationNode {
                    pos,
                    dur: *d,
                    comment: None,
                })
            }
        }
        Value::String(s) => Node::String(StringNode {
            pos,
            literal: s.clone(),
            triple: false,
            comment: None,
        }),
        Value::Regex(r) => Node::Regex(RegexNode {
            pos,
            regex: r.clone(),
            literal: r.as_str().replace('/', "\\/"),
            comment: None,
        }),
        Value::Lambda(l) => {
            // Embedding a lambda splices its body; parenthesize so the
            // formatted form reads unambiguously
            let mut expr = (*l.expr).clone();
            if let Node::Binary(binary) = &mut expr {
                binary.parens = true;
            }
            expr
        }
        Value::Star => Node::Star(StarNode { pos, comment: None }),
        other => {
            return Err(EvalError::Conversion(format!(
                "cannot embed a value of type {} in a lambda expression",
                other.type_name()
            )));
        }
    };
    Ok(node)
}

/// Apply a unary operator: `-` on numbers and durations, `!` on booleans.
pub(crate) fn apply_unary(operator: TokenType, operand: &Value) -> Result<Value, EvalError> {
    match (operator, operand) {
        (TokenType::Minus, Value::Int(i)) => Ok(Value::Int(-i)),
        (TokenType::Minus, Value::Float(f)) => Ok(Value::Float(-f)),
        (TokenType::Minus, Value::Duration(d)) => Ok(Value::Duration(-*d)),
        (TokenType::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (op, v) => Err(EvalError::TypeError(format!(
            "invalid unary {op} of type {}",
            v.type_name()
        ))),
    }
}

/// The shared binary-operator kernel, used by the main evaluator and the
/// per-record expression evaluator.
pub(crate) fn apply_binop(
    operator: TokenType,
    left: &Value,
    right: &Value,
) -> Result<Value, EvalError> {
    use TokenType::*;
    match operator {
        And | Or => {
            let (l, r) = (left.to_bool()?, right.to_bool()?);
            Ok(Value::Bool(if operator == And { l && r } else { l || r }))
        }
        Equal => Ok(Value::Bool(values_equal(left, right)?)),
        NotEqual => Ok(Value::Bool(!values_equal(left, right)?)),
        Less | Greater | LessEqual | GreaterEqual => {
            let ordering = compare_values(left, right)?;
            Ok(Value::Bool(match operator {
                Less => ordering.is_lt(),
                Greater => ordering.is_gt(),
                LessEqual => ordering.is_le(),
                _ => ordering.is_ge(),
            }))
        }
        RegexEqual | RegexNotEqual => match (left, right) {
            (l, Value::Regex(pattern)) => {
                let matched = pattern.is_match(l.to_str()?);
                Ok(Value::Bool(if operator == RegexEqual {
                    matched
                } else {
                    !matched
                }))
            }
            (l, r) => Err(EvalError::TypeError(format!(
                "invalid {operator} operation between {} and {}",
                l.type_name(),
                r.type_name()
            ))),
        },
        Plus | Minus | Mult | Div | Mod => apply_math(operator, left, right),
        op => Err(EvalError::Internal(format!(
            "{op} is not a binary operator"
        ))),
    }
}

fn apply_math(operator: TokenType, left: &Value, right: &Value) -> Result<Value, EvalError> {
    use TokenType::*;
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => match operator {
            Plus => Ok(Value::Int(a + b)),
            Minus => Ok(Value::Int(a - b)),
            Mult => Ok(Value::Int(a * b)),
            Div => {
                if *b == 0 {
                    Err(EvalError::DivisionByZero)
                } else {
                    Ok(Value::Int(a / b))
                }
            }
            Mod => {
                if *b == 0 {
                    Err(EvalError::DivisionByZero)
                } else {
                    Ok(Value::Int(a % b))
                }
            }
            _ => unreachable!(),
        },
        (Value::Float(a), Value::Float(b)) => match operator {
            Plus => Ok(Value::Float(a + b)),
            Minus => Ok(Value::Float(a - b)),
            Mult => Ok(Value::Float(a * b)),
            Div => Ok(Value::Float(a / b)),
            Mod => Ok(Value::Float(a % b)),
            _ => unreachable!(),
        },
        // Mixed int/float math goes through decimals so whole results stay
        // integers
        (Value::Int(a), Value::Float(b)) => {
            if let Some(ad) = Decimal::from_i64(*a)
                && let Some(bd) = Decimal::from_f64(*b)
            {
                return decimal_math(operator, ad, bd);
            }
            float_math(operator, *a as f64, *b)
        }
        (Value::Float(a), Value::Int(b)) => {
            if let Some(ad) = Decimal::from_f64(*a)
                && let Some(bd) = Decimal::from_i64(*b)
            {
                return decimal_math(operator, ad, bd);
            }
            float_math(operator, *a, *b as f64)
        }
        (Value::String(a), Value::String(b)) if operator == Plus => {
            Ok(Value::String(format!("{a}{b}")))
        }
        (Value::Duration(a), Value::Duration(b)) if operator == Plus => Ok(Value::Duration(*a + *b)),
        (Value::Duration(a), Value::Duration(b)) if operator == Minus => {
            Ok(Value::Duration(*a - *b))
        }
        (Value::Duration(a), Value::Int(b)) if operator == Mult => Ok(Value::Duration(*a * *b)),
        (Value::Int(a), Value::Duration(b)) if operator == Mult => Ok(Value::Duration(*b * *a)),
        (Value::Duration(a), Value::Int(b)) if operator == Div => {
            if *b == 0 {
                Err(EvalError::DivisionByZero)
            } else {
                Ok(Value::Duration(*a / *b))
            }
        }
        (a, b) => Err(EvalError::TypeError(format!(
            "invalid {operator} operation between {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn float_math(operator: TokenType, a: f64, b: f64) -> Result<Value, EvalError> {
    use TokenType::*;
    Ok(Value::Float(match operator {
        Plus => a + b,
        Minus => a - b,
        Mult => a * b,
        Div => a / b,
        Mod => a % b,
        _ => unreachable!(),
    }))
}

fn decimal_math(operator: TokenType, a: Decimal, b: Decimal) -> Result<Value, EvalError> {
    use TokenType::*;
    let result = match operator {
        Plus => a + b,
        Minus => a - b,
        Mult => a * b,
        Div => {
            if b.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            a / b
        }
        Mod => {
            if b.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            a % b
        }
        _ => unreachable!(),
    };
    if result.is_integer()
        && let Some(i) = result.to_i64()
    {
        Ok(Value::Int(i))
    } else if let Some(f) = result.to_f64() {
        Ok(Value::Float(f))
    } else {
        Err(EvalError::TypeError(
            "numeric result out of range".to_string(),
        ))
    }
}

fn values_equal(left: &Value, right: &Value) -> Result<bool, EvalError> {
    match (left, right) {
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
            match (Decimal::from_i64(*a), Decimal::from_f64(*b)) {
                (Some(ad), Some(bd)) => Ok(ad == bd),
                _ => Ok(*a as f64 == *b),
            }
        }
        (Value::Bool(_), Value::Bool(_))
        | (Value::Int(_), Value::Int(_))
        | (Value::Float(_), Value::Float(_))
        | (Value::Duration(_), Value::Duration(_))
        | (Value::String(_), Value::String(_))
        | (Value::Regex(_), Value::Regex(_)) => Ok(left == right),
        (a, b) => Err(EvalError::TypeError(format!(
            "cannot compare {} with {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn compare_values(left: &Value, right: &Value) -> Result<std::cmp::Ordering, EvalError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Duration(a), Value::Duration(b)) => Ok(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => a
            .partial_cmp(b)
            .ok_or_else(|| EvalError::TypeError("cannot order NaN".to_string())),
        (Value::Int(a), Value::Float(b)) => (*a as f64)
            .partial_cmp(b)
            .ok_or_else(|| EvalError::TypeError("cannot order NaN".to_string())),
        (Value::Float(a), Value::Int(b)) => a
            .partial_cmp(&(*b as f64))
            .ok_or_else(|| EvalError::TypeError("cannot order NaN".to_string())),
        (a, b) => Err(EvalError::TypeError(format!(
            "cannot order {} against {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}
