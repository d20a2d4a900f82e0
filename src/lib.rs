pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod describer;
pub mod duration;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod scope;
pub mod stateful;
pub mod value;

pub use ast::{format, FuncKind, Node, Position, Token, TokenType};
pub use describer::{Describer, SelfDescriber};
pub use duration::Duration;
pub use evaluator::{evaluate, DiagnosticSink, EvalError, Evaluator, TracingSink};
pub use lexer::Lexer;
pub use parser::{parse, ParseError, Parser};
pub use scope::Scope;
pub use stateful::ExprEvaluator;
pub use value::Value;
