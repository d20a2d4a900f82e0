use regex::Regex;

use crate::ast::tokens::{Position, TokenType};
use crate::duration::Duration;

/// A numeric literal is exclusively an integer or a float; the two never
/// coerce inside the AST. Literals are always non-negative: negation is
/// represented by a [`UnaryNode`] wrapping a positive literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    pub fn is_int(self) -> bool {
        matches!(self, Num::Int(_))
    }

    pub fn is_float(self) -> bool {
        matches!(self, Num::Float(_))
    }
}

/// Integer or float literal.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberNode {
    pub pos: Position,
    pub num: Num,
    pub comment: Option<CommentNode>,
}

/// Duration literal, e.g. `10s`, `1h30m`.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationNode {
    pub pos: Position,
    pub dur: Duration,
    pub comment: Option<CommentNode>,
}

/// `TRUE` or `FALSE`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoolNode {
    pub pos: Position,
    pub bool_value: bool,
    pub comment: Option<CommentNode>,
}

/// Single- or triple-quoted string literal.
///
/// `triple` only affects formatting: triple-quoted strings re-emit raw,
/// single-quoted strings re-escape their delimiter.
#[derive(Debug, Clone, PartialEq)]
pub struct StringNode {
    pub pos: Position,
    pub literal: String,
    pub triple: bool,
    pub comment: Option<CommentNode>,
}

/// `/.../` regex literal. Keeps the original source text so the formatter
/// can round-trip the exact spelling.
#[derive(Debug, Clone)]
pub struct RegexNode {
    pub pos: Position,
    pub regex: Regex,
    pub literal: String,
    pub comment: Option<CommentNode>,
}

impl PartialEq for RegexNode {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos && self.literal == other.literal && self.comment == other.comment
    }
}

/// `*` wildcard marker.
#[derive(Debug, Clone, PartialEq)]
pub struct StarNode {
    pub pos: Position,
    pub comment: Option<CommentNode>,
}

/// Bare identifier, resolved against the lexical scope at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierNode {
    pub pos: Position,
    pub ident: String,
    pub comment: Option<CommentNode>,
}

/// Double-quoted field reference, e.g. `"value"`.
///
/// Unlike an identifier, a reference is not resolved against the lexical
/// scope: it names a field in the per-record evaluation context and is left
/// intact by lambda identifier resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceNode {
    pub pos: Position,
    pub reference: String,
    pub comment: Option<CommentNode>,
}

/// Unary `-` or `!` applied to an operand.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryNode {
    pub pos: Position,
    pub operator: TokenType,
    pub node: Box<Node>,
    pub comment: Option<CommentNode>,
}

/// Binary operation inside a lambda/primary expression.
///
/// `parens` and `multi_line` are formatting metadata only: whether the
/// source spelled explicit parentheses, and whether the operands spanned a
/// newline.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryNode {
    pub pos: Position,
    pub operator: TokenType,
    pub left: Box<Node>,
    pub right: Box<Node>,
    pub parens: bool,
    pub multi_line: bool,
    pub comment: Option<CommentNode>,
}

/// `var name = expr`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclarationNode {
    pub pos: Position,
    pub left: IdentifierNode,
    pub right: Box<Node>,
    pub comment: Option<CommentNode>,
}

/// One link of a method chain: `left <op> right` where the operator is one
/// of `.` (property), `|` (chain call), `@` (dynamic call).
///
/// `right` is always a [`FunctionNode`] or an [`IdentifierNode`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChainNode {
    pub pos: Position,
    pub operator: TokenType,
    pub left: Box<Node>,
    pub right: Box<Node>,
    pub comment: Option<CommentNode>,
}

/// How a function call binds to its receiver. Determined by the operator
/// that introduced the call and fixed at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncKind {
    /// Leading bare call, looked up directly in scope, no receiver
    Global,
    /// `|` pipe call, dispatched through the receiver's chain methods
    Chain,
    /// `.` call, dispatched through the receiver's properties
    Property,
    /// `@` call, dispatched through the scope's dynamic methods
    Dynamic,
}

impl FuncKind {
    /// The chain operator that selects this kind, as written in scripts.
    pub fn operator(self) -> &'static str {
        match self {
            FuncKind::Global => "",
            FuncKind::Chain => "|",
            FuncKind::Property => ".",
            FuncKind::Dynamic => "@",
        }
    }
}

/// A function call form. Evaluation defers invocation until a receiver is
/// supplied (or explicitly omitted, for global calls).
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionNode {
    pub pos: Position,
    pub kind: FuncKind,
    pub func: String,
    pub args: Vec<Node>,
    pub multi_line: bool,
    pub comment: Option<CommentNode>,
}

/// `lambda: expr` — a deferred sub-expression, evaluated per-record later
/// rather than eagerly.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaNode {
    pub pos: Position,
    pub expr: Box<Node>,
    pub comment: Option<CommentNode>,
}

/// The program root: an ordered sequence of statements, plus an optional
/// trailing comment block that had no statement to attach to.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListNode {
    pub pos: Position,
    pub nodes: Vec<Node>,
    pub trailing: Option<CommentNode>,
}

/// One or more adjacent `//` lines, trimmed of the comment marker.
/// Owned by exactly one following node.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentNode {
    pub pos: Position,
    pub lines: Vec<String>,
}

/// The closed AST node family.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Number(NumberNode),
    Duration(DurationNode),
    Bool(BoolNode),
    String(StringNode),
    Regex(RegexNode),
    Star(StarNode),
    Identifier(IdentifierNode),
    Reference(ReferenceNode),
    Unary(UnaryNode),
    Binary(BinaryNode),
    Declaration(DeclarationNode),
    Chain(ChainNode),
    Function(FunctionNode),
    Lambda(LambdaNode),
    List(ListNode),
    Comment(CommentNode),
}

impl Node {
    pub fn position(&self) -> Position {
        match self {
            Node::Number(n) => n.pos,
            Node::Duration(n) => n.pos,
            Node::Bool(n) => n.pos,
            Node::String(n) => n.pos,
            Node::Regex(n) => n.pos,
            Node::Star(n) => n.pos,
            Node::Identifier(n) => n.pos,
            Node::Reference(n) => n.pos,
            Node::Unary(n) => n.pos,
            Node::Binary(n) => n.pos,
            Node::Declaration(n) => n.pos,
            Node::Chain(n) => n.pos,
            Node::Function(n) => n.pos,
            Node::Lambda(n) => n.pos,
            Node::List(n) => n.pos,
            Node::Comment(n) => n.pos,
        }
    }

    /// Attach a comment block to this node. Comments attach to statements,
    /// declarations, and primaries; the program list keeps its own trailing
    /// block instead.
    pub fn set_comment(&mut self, comment: CommentNode) {
        match self {
            Node::Number(n) => n.comment = Some(comment),
            Node::Duration(n) => n.comment = Some(comment),
            Node::Bool(n) => n.comment = Some(comment),
            Node::String(n) => n.comment = Some(comment),
            Node::Regex(n) => n.comment = Some(comment),
            Node::Star(n) => n.comment = Some(comment),
            Node::Identifier(n) => n.comment = Some(comment),
            Node::Reference(n) => n.comment = Some(comment),
            Node::Unary(n) => n.comment = Some(comment),
            Node::Binary(n) => n.comment = Some(comment),
            Node::Declaration(n) => n.comment = Some(comment),
            Node::Chain(n) => n.comment = Some(comment),
            Node::Function(n) => n.comment = Some(comment),
            Node::Lambda(n) => n.comment = Some(comment),
            Node::List(n) => n.trailing = Some(comment),
            Node::Comment(_) => {}
        }
    }

    /// A short name for the node kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Number(_) => "number",
            Node::Duration(_) => "duration",
            Node::Bool(_) => "boolean",
            Node::String(_) => "string",
            Node::Regex(_) => "regex",
            Node::Star(_) => "star",
            Node::Identifier(_) => "identifier",
            Node::Reference(_) => "reference",
            Node::Unary(_) => "unary expression",
            Node::Binary(_) => "binary expression",
            Node::Declaration(_) => "declaration",
            Node::Chain(_) => "chain",
            Node::Function(_) => "function call",
            Node::Lambda(_) => "lambda",
            Node::List(_) => "program",
            Node::Comment(_) => "comment",
        }
    }
}
