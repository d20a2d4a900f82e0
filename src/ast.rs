//! # Abstract syntax tree for the plumb pipeline language
//!
//! This module defines the token stream and AST for plumb, a small scripting
//! language describing chained, pipeline-style invocation programs.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens, token types, and source positions
//! - **[nodes]** - The closed AST node family
//! - **[format]** - Canonical formatting of nodes back to script text
//!
//! ## Quick Start
//!
//! ```text
//! var x = stream
//!     |window()
//!         .period(10s)
//!         .every(10s)
//! ```
//!
//! This declares `x` as the result of piping `stream` through `window()` and
//! configuring it with two property calls.
//!
//! ## Core Concepts
//!
//! ### Chains
//!
//! Expressions connect a receiver to following calls through three
//! operators with distinct dispatch semantics:
//!
//! - `|` - chain call (pipe a value into a chain method)
//! - `.` - property access or property call
//! - `@` - dynamic call (host-registered methods)
//!
//! ### Lambdas
//!
//! A `lambda:` expression is not evaluated eagerly. Lexical identifiers are
//! resolved once, at declaration time; double-quoted `"field"` references
//! stay unresolved until the expression runs against a record.
//!
//! ### Literals
//!
//! Numbers (integer xor float), durations (`10s`, `1h30m`), booleans
//! (`TRUE`/`FALSE`), single- and triple-quoted strings, `/regex/` literals,
//! and the `*` wildcard.
pub mod format;
pub mod nodes;
pub mod tokens;

pub use format::{format, format_node};
pub use nodes::{
    BinaryNode, BoolNode, ChainNode, CommentNode, DeclarationNode, DurationNode, FuncKind,
    FunctionNode, IdentifierNode, LambdaNode, ListNode, Node, Num, NumberNode, ReferenceNode,
    RegexNode, StarNode, StringNode, UnaryNode,
};
pub use tokens::{Position, Token, TokenType};
