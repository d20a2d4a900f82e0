//! Canonical formatting of AST nodes.
//!
//! Every node knows how to re-serialize itself given an indent prefix and
//! whether it starts a fresh line. The result is the normalized form of the
//! script: pipe chains indent one step, dot continuations two, attached
//! comments are re-emitted immediately before their node, and literals keep
//! their original spelling (integer vs float, quote style, regex source).
//!
//! Formatting is idempotent: formatting already-canonical output reproduces
//! it byte for byte.

use crate::ast::nodes::*;
use crate::ast::tokens::TokenType;
use crate::parser::{parse, ParseError};

/// One indentation step.
pub const INDENT_STEP: &str = "    ";

/// Parse a script and return its canonical form.
pub fn format(script: &str) -> Result<String, ParseError> {
    let root = parse(script)?;
    Ok(format_node(&root))
}

/// Canonical form of an already-parsed tree.
pub fn format_node(node: &Node) -> String {
    let mut buf = String::new();
    node.format(&mut buf, "", true);
    buf
}

/// Emit an attached comment (if any) and leave the buffer positioned for
/// the owning node's first character, indent included.
fn open(buf: &mut String, indent: &str, at_line_start: bool, comment: &Option<CommentNode>) {
    if let Some(c) = comment {
        if !at_line_start && !buf.is_empty() {
            buf.push('\n');
        }
        c.write_lines(buf, indent);
        buf.push_str(indent);
    } else if at_line_start {
        buf.push_str(indent);
    }
}

impl Node {
    pub fn format(&self, buf: &mut String, indent: &str, at_line_start: bool) {
        match self {
            Node::Number(n) => n.format(buf, indent, at_line_start),
            Node::Duration(n) => n.format(buf, indent, at_line_start),
            Node::Bool(n) => n.format(buf, indent, at_line_start),
            Node::String(n) => n.format(buf, indent, at_line_start),
            Node::Regex(n) => n.format(buf, indent, at_line_start),
            Node::Star(n) => n.format(buf, indent, at_line_start),
            Node::Identifier(n) => n.format(buf, indent, at_line_start),
            Node::Reference(n) => n.format(buf, indent, at_line_start),
            Node::Unary(n) => n.format(buf, indent, at_line_start),
            Node::Binary(n) => n.format(buf, indent, at_line_start),
            Node::Declaration(n) => n.format(buf, indent, at_line_start),
            Node::Chain(n) => n.format(buf, indent, at_line_start),
            Node::Function(n) => n.format(buf, indent, at_line_start),
            Node::Lambda(n) => n.format(buf, indent, at_line_start),
            Node::List(n) => n.format(buf),
            Node::Comment(n) => n.write_lines(buf, indent),
        }
    }
}

impl NumberNode {
    pub fn format(&self, buf: &mut String, indent: &str, at_line_start: bool) {
        open(buf, indent, at_line_start, &self.comment);
        match self.num {
            Num::Int(i) => buf.push_str(&i.to_string()),
            Num::Float(f) => {
                // A whole float keeps a trailing .0 so it re-parses as a float
                if f.is_finite() && f.fract() == 0.0 {
                    buf.push_str(&format!("{f:.1}"));
                } else {
                    buf.push_str(&f.to_string());
                }
            }
        }
    }
}

impl DurationNode {
    pub fn format(&self, buf: &mut String, indent: &str, at_line_start: bool) {
        open(buf, indent, at_line_start, &self.comment);
        buf.push_str(&self.dur.to_string());
    }
}

impl BoolNode {
    pub fn format(&self, buf: &mut String, indent: &str, at_line_start: bool) {
        open(buf, indent, at_line_start, &self.comment);
        buf.push_str(if self.bool_value { "TRUE" } else { "FALSE" });
    }
}

impl StringNode {
    pub fn format(&self, buf: &mut String, indent: &str, at_line_start: bool) {
        open(buf, indent, at_line_start, &self.comment);
        if self.triple {
            buf.push_str("'''");
            buf.push_str(&self.literal);
            buf.push_str("'''");
        } else {
            buf.push('\'');
            for c in self.literal.chars() {
                match c {
                    '\\' => buf.push_str("\\\\"),
                    '\'' => buf.push_str("\\'"),
                    c => buf.push(c),
                }
            }
            buf.push('\'');
        }
    }
}

impl RegexNode {
    pub fn format(&self, buf: &mut String, indent: &str, at_line_start: bool) {
        open(buf, indent, at_line_start, &self.comment);
        buf.push('/');
        buf.push_str(&self.literal);
        buf.push('/');
    }
}

impl StarNode {
    pub fn format(&self, buf: &mut String, indent: &str, at_line_start: bool) {
        open(buf, indent, at_line_start, &self.comment);
        buf.push('*');
    }
}

impl IdentifierNode {
    pub fn format(&self, buf: &mut String, indent: &str, at_line_start: bool) {
        open(buf, indent, at_line_start, &self.comment);
        buf.push_str(&self.ident);
    }
}

impl ReferenceNode {
    pub fn format(&self, buf: &mut String, indent: &str, at_line_start: bool) {
        open(buf, indent, at_line_start, &self.comment);
        buf.push('"');
        for c in self.reference.chars() {
            match c {
                '\\' => buf.push_str("\\\\"),
                '"' => buf.push_str("\\\""),
                c => buf.push(c),
            }
        }
        buf.push('"');
    }
}

impl UnaryNode {
    pub fn format(&self, buf: &mut String, indent: &str, at_line_start: bool) {
        open(buf, indent, at_line_start, &self.comment);
        buf.push_str(self.operator.literal());
        self.node.format(buf, indent, false);
    }
}

impl BinaryNode {
    pub fn format(&self, buf: &mut String, indent: &str, at_line_start: bool) {
        open(buf, indent, at_line_start, &self.comment);
        if self.parens {
            buf.push('(');
        }
        self.left.format(buf, indent, false);
        buf.push(' ');
        buf.push_str(self.operator.literal());
        if self.multi_line {
            buf.push('\n');
            let deeper = format!("{indent}{INDENT_STEP}");
            buf.push_str(&deeper);
            self.right.format(buf, &deeper, false);
        } else {
            buf.push(' ');
            self.right.format(buf, indent, false);
        }
        if self.parens {
            buf.push(')');
        }
    }
}

impl DeclarationNode {
    pub fn format(&self, buf: &mut String, indent: &str, at_line_start: bool) {
        open(buf, indent, at_line_start, &self.comment);
        buf.push_str("var ");
        buf.push_str(&self.left.ident);
        buf.push_str(" = ");
        self.right.format(buf, indent, false);
    }
}

impl ChainNode {
    pub fn format(&self, buf: &mut String, indent: &str, at_line_start: bool) {
        open(buf, indent, at_line_start, &self.comment);
        self.left.format(buf, indent, false);
        buf.push('\n');
        // Pipe and dynamic chains step once; dot continuations step twice
        let mut child = format!("{indent}{INDENT_STEP}");
        if self.operator == TokenType::Dot {
            child.push_str(INDENT_STEP);
        }
        buf.push_str(&child);
        buf.push_str(self.operator.literal());
        self.right.format(buf, &child, false);
    }
}

impl FunctionNode {
    pub fn format(&self, buf: &mut String, indent: &str, at_line_start: bool) {
        open(buf, indent, at_line_start, &self.comment);
        buf.push_str(&self.func);
        buf.push('(');
        if self.multi_line && self.args.len() > 1 {
            let deeper = format!("{indent}{INDENT_STEP}");
            buf.push('\n');
            for arg in &self.args {
                buf.push_str(&deeper);
                arg.format(buf, &deeper, false);
                buf.push_str(",\n");
            }
            buf.push_str(indent);
        } else {
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    buf.push_str(", ");
                }
                arg.format(buf, indent, false);
            }
        }
        buf.push(')');
    }
}

impl LambdaNode {
    pub fn format(&self, buf: &mut String, indent: &str, at_line_start: bool) {
        open(buf, indent, at_line_start, &self.comment);
        buf.push_str("lambda: ");
        self.expr.format(buf, indent, false);
    }
}

impl ListNode {
    pub fn format(&self, buf: &mut String) {
        for node in &self.nodes {
            node.format(buf, "", true);
            buf.push('\n');
        }
        if let Some(trailing) = &self.trailing {
            trailing.write_lines(buf, "");
        }
    }
}

impl CommentNode {
    /// Each line re-prefixed with `// ` (bare `//` for blank lines) at the
    /// current indent, newline-terminated.
    pub fn write_lines(&self, buf: &mut String, indent: &str) {
        for line in &self.lines {
            buf.push_str(indent);
            if line.is_empty() {
                buf.push_str("//\n");
            } else {
                buf.push_str("// ");
                buf.push_str(line);
                buf.push('\n');
            }
        }
    }
}
