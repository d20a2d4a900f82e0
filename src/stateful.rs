//! Per-record evaluation of resolved lambda expressions.
//!
//! A lambda declared in a script has already had its lexical identifiers
//! replaced by literals; what remains are `"field"` references. An
//! [`ExprEvaluator`] takes such a resolved lambda once and evaluates it
//! repeatedly against per-record field bindings, which is how predicates
//! run over a stream of records without re-touching the lexical scope.
//!
//! Only the expression operator set is supported here. Function calls
//! inside record expressions belong to the streaming integration, which is
//! outside this crate.

use std::collections::HashMap;

use crate::ast::nodes::{LambdaNode, Node, Num};
use crate::ast::tokens::TokenType;
use crate::evaluator::{apply_binop, apply_unary, EvalError};
use crate::value::Value;

/// Field bindings for one record.
pub type Fields = HashMap<String, Value>;

/// Evaluates one resolved lambda against successive records.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use plumb_lang::{evaluate, ExprEvaluator, Scope, Value};
///
/// let mut scope = Scope::new();
/// evaluate("var t = 42\nvar f = lambda: \"value\" > t", &mut scope).unwrap();
///
/// let expr = ExprEvaluator::from_value(&scope.get("f").unwrap()).unwrap();
/// let mut fields = HashMap::new();
/// fields.insert("value".to_string(), Value::Int(100));
/// assert_eq!(expr.eval(&fields).unwrap(), Value::Bool(true));
/// ```
pub struct ExprEvaluator {
    expr: Node,
}

impl ExprEvaluator {
    pub fn new(lambda: &LambdaNode) -> Self {
        ExprEvaluator {
            expr: (*lambda.expr).clone(),
        }
    }

    /// Build from a scope value, which must hold a lambda.
    pub fn from_value(value: &Value) -> Result<Self, EvalError> {
        match value {
            Value::Lambda(lambda) => Ok(ExprEvaluator::new(lambda)),
            other => Err(EvalError::TypeError(format!(
                "expected a lambda, got {}",
                other.type_name()
            ))),
        }
    }

    /// Evaluate against one record's fields.
    pub fn eval(&self, fields: &Fields) -> Result<Value, EvalError> {
        eval_expr(&self.expr, fields)
    }

    /// Evaluate a predicate; errors if the expression is not boolean.
    pub fn eval_bool(&self, fields: &Fields) -> Result<bool, EvalError> {
        self.eval(fields)?.to_bool()
    }
}

fn eval_expr(node: &Node, fields: &Fields) -> Result<Value, EvalError> {
    match node {
        Node::Number(n) => Ok(match n.num {
            Num::Int(i) => Value::Int(i),
            Num::Float(f) => Value::Float(f),
        }),
        Node::Duration(n) => Ok(Value::Duration(n.dur)),
        Node::Bool(n) => Ok(Value::Bool(n.bool_value)),
        Node::String(n) => Ok(Value::String(n.literal.clone())),
        Node::Regex(n) => Ok(Value::Regex(n.regex.clone())),
        Node::Star(_) => Ok(Value::Star),
        Node::Reference(n) => {
            fields
                .get(&n.reference)
                .cloned()
                .ok_or_else(|| EvalError::Undefined {
                    name: format!("\"{}\"", n.reference),
                    available: {
                        let mut names: Vec<String> = fields.keys().cloned().collect();
                        names.sort();
                        names
                    },
                })
        }
        Node::Identifier(n) => Err(EvalError::Internal(format!(
            "unresolved identifier \"{}\" in a record expression; the lambda was not resolved against a scope",
            n.ident
        ))),
        Node::Unary(n) => {
            let operand = eval_expr(&n.node, fields)?;
            apply_unary(n.operator, &operand)
        }
        Node::Binary(n) => {
            // AND/OR short-circuit per record
            if matches!(n.operator, TokenType::And | TokenType::Or) {
                let left = eval_expr(&n.left, fields)?.to_bool()?;
                match (n.operator, left) {
                    (TokenType::And, false) => return Ok(Value::Bool(false)),
                    (TokenType::Or, true) => return Ok(Value::Bool(true)),
                    _ => {}
                }
                return Ok(Value::Bool(eval_expr(&n.right, fields)?.to_bool()?));
            }
            let left = eval_expr(&n.left, fields)?;
            let right = eval_expr(&n.right, fields)?;
            apply_binop(n.operator, &left, &right)
        }
        Node::Lambda(n) => eval_expr(&n.expr, fields),
        Node::Function(n) => Err(EvalError::TypeError(format!(
            "function \"{}\" is not supported in record expressions",
            n.func
        ))),
        other => Err(EvalError::Internal(format!(
            "unexpected {} in a record expression",
            other.kind_name()
        ))),
    }
}
