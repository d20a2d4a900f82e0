use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use regex::Regex;
use rust_decimal::{prelude::FromPrimitive, prelude::ToPrimitive, Decimal};

use crate::ast::{format_node, LambdaNode, Node};
use crate::describer::SelfDescriber;
use crate::duration::Duration;
use crate::evaluator::EvalError;

/// A callable bound directly into scope, invoked by bare `name(...)` calls.
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value, EvalError>>;

/// A host object participating in capability dispatch.
pub type ObjectRef = Rc<RefCell<dyn SelfDescriber>>;

/// A runtime value bound in scope or flowing through evaluation.
///
/// The scalar kinds mirror the literal grammar; `Lambda` holds a resolved
/// lambda sub-tree awaiting per-record evaluation; `Object` is an opaque
/// host object seen only through capability dispatch; `Func` is a callable
/// bound under a name in scope.
#[derive(Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Duration(Duration),
    String(String),
    Regex(Regex),
    Lambda(Rc<LambdaNode>),
    List(Vec<Value>),
    /// `*` wildcard marker
    Star,
    /// An unresolved `"field"` reference that leaked out of its per-record
    /// context, kept so call errors can point at the quoting mistake
    Reference(String),
    Object(ObjectRef),
    Func(NativeFn),
}

impl Value {
    /// Wrap a host object for capability dispatch.
    pub fn object(host: impl SelfDescriber + 'static) -> Value {
        Value::Object(Rc::new(RefCell::new(host)))
    }

    /// Wrap a callable for direct (global) invocation from scripts.
    pub fn func(f: impl Fn(&[Value]) -> Result<Value, EvalError> + 'static) -> Value {
        Value::Func(Rc::new(f))
    }

    /// A short name for the value's kind, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Duration(_) => "duration",
            Value::String(_) => "string",
            Value::Regex(_) => "regex",
            Value::Lambda(_) => "lambda",
            Value::List(_) => "list",
            Value::Star => "star",
            Value::Reference(_) => "reference",
            Value::Object(_) => "object",
            Value::Func(_) => "function",
        }
    }

    /// Convert to an integer target.
    ///
    /// Ints pass through; whole floats convert exactly; numeric strings
    /// convert; everything else is a descriptive error.
    pub fn to_i64(&self) -> Result<i64, EvalError> {
        match self {
            Value::Int(i) => Ok(*i),
            Value::Float(f) => {
                if let Some(d) = Decimal::from_f64(*f)
                    && d.is_integer()
                    && let Some(i) = d.to_i64()
                {
                    Ok(i)
                } else {
                    Err(EvalError::Conversion(format!(
                        "cannot convert float {f} to an integer without losing precision"
                    )))
                }
            }
            Value::String(s) => {
                if let Ok(i) = s.parse::<i64>() {
                    return Ok(i);
                }
                if let Ok(f) = s.parse::<f64>()
                    && let Some(d) = Decimal::from_f64(f)
                    && d.is_integer()
                    && let Some(i) = d.to_i64()
                {
                    return Ok(i);
                }
                Err(EvalError::Conversion(format!(
                    "cannot convert string {s:?} to an integer: not a number"
                )))
            }
            other => Err(EvalError::Conversion(format!(
                "cannot convert {} to an integer",
                other.type_name()
            ))),
        }
    }

    /// Convert to a float target. Integers widen losslessly by value.
    pub fn to_f64(&self) -> Result<f64, EvalError> {
        match self {
            Value::Int(i) => Ok(*i as f64),
            Value::Float(f) => Ok(*f),
            Value::String(s) => s.parse::<f64>().map_err(|_| {
                EvalError::Conversion(format!(
                    "cannot convert string {s:?} to a float: not a number"
                ))
            }),
            other => Err(EvalError::Conversion(format!(
                "cannot convert {} to a float",
                other.type_name()
            ))),
        }
    }

    pub fn to_bool(&self) -> Result<bool, EvalError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(EvalError::Conversion(format!(
                "cannot convert {} to a boolean",
                other.type_name()
            ))),
        }
    }

    pub fn to_duration(&self) -> Result<Duration, EvalError> {
        match self {
            Value::Duration(d) => Ok(*d),
            other => Err(EvalError::Conversion(format!(
                "cannot convert {} to a duration",
                other.type_name()
            ))),
        }
    }

    /// Convert to a string target. A leaked `"field"` reference gets the
    /// quoting hint, since that is almost always what happened.
    pub fn to_str(&self) -> Result<&str, EvalError> {
        match self {
            Value::String(s) => Ok(s),
            Value::Reference(r) => Err(EvalError::Conversion(format!(
                "cannot use field reference \"{r}\" as a string: did you use double quotes instead of single quotes?"
            ))),
            other => Err(EvalError::Conversion(format!(
                "cannot convert {} to a string",
                other.type_name()
            ))),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Value::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Value::Duration(d) => f.debug_tuple("Duration").field(d).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Regex(r) => f.debug_tuple("Regex").field(&r.as_str()).finish(),
            Value::Lambda(l) => f
                .debug_tuple("Lambda")
                .field(&format_node(&Node::Lambda((**l).clone())))
                .finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Star => f.write_str("Star"),
            Value::Reference(r) => f.debug_tuple("Reference").field(r).finish(),
            Value::Object(o) => f
                .debug_tuple("Object")
                .field(&o.borrow().describe())
                .finish(),
            Value::Func(_) => f.write_str("Func"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Duration(d) => write!(f, "{d}"),
            Value::String(s) => f.write_str(s),
            Value::Regex(r) => write!(f, "/{}/", r.as_str()),
            Value::Lambda(l) => f.write_str(&format_node(&Node::Lambda((**l).clone()))),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Star => f.write_str("*"),
            Value::Reference(r) => write!(f, "\"{r}\""),
            Value::Object(o) => f.write_str(&o.borrow().describe()),
            Value::Func(_) => f.write_str("<function>"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Regex(a), Value::Regex(b)) => a.as_str() == b.as_str(),
            (Value::Lambda(a), Value::Lambda(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Star, Value::Star) => true,
            (Value::Reference(a), Value::Reference(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Func(a), Value::Func(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
