use std::collections::VecDeque;
use std::fmt;

use regex::Regex;

use crate::ast::nodes::*;
use crate::ast::tokens::{Position, Token, TokenType};
use crate::duration::Duration;
use crate::lexer::Lexer;

/// Parse a script into its AST root (a [`ListNode`] of statements).
pub fn parse(text: &str) -> Result<Node, ParseError> {
    Parser::new(text).parse_program()
}

/// Errors produced while turning script text into an AST.
///
/// The first error is terminal: there is no recovery or continuation.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The lexer hit an unlexable construct
    Lex {
        line: usize,
        char: usize,
        message: String,
    },
    /// The token stream did not match the grammar
    Unexpected {
        found: String,
        line: usize,
        char: usize,
        /// Single-line slice of the source around the offending token
        context: String,
        /// Token types that would have been acceptable
        expected: Vec<TokenType>,
    },
    /// A literal lexed fine but did not parse (number overflow, bad
    /// duration, invalid regex)
    BadLiteral {
        line: usize,
        char: usize,
        message: String,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Lex { line, char, message } => {
                write!(f, "lex error line {line} char {char}: {message}")
            }
            ParseError::Unexpected {
                found,
                line,
                char,
                context,
                expected,
            } => {
                write!(
                    f,
                    "unexpected {found} line {line} char {char} in \"{context}\". expected: "
                )?;
                for (i, tt) in expected.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "\"{}\"", tt.literal())?;
                }
                Ok(())
            }
            ParseError::BadLiteral { line, char, message } => {
                write!(f, "invalid literal line {line} char {char}: {message}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

const PRIMARY_EXPECTED: &[TokenType] = &[
    TokenType::Number,
    TokenType::Duration,
    TokenType::String,
    TokenType::Reference,
    TokenType::True,
    TokenType::False,
    TokenType::Regex,
    TokenType::Mult,
    TokenType::Ident,
    TokenType::LParen,
    TokenType::Minus,
    TokenType::Not,
];

/// Recursive-descent parser with a two-token lookahead buffer over the
/// lexer, plus the original text for error snippets and newline-span
/// detection.
pub struct Parser {
    text: String,
    lexer: Lexer,
    buffer: VecDeque<Token>,
    /// Byte offset of the start of each line, for lazy line/char resolution
    line_starts: Vec<usize>,
}

impl Parser {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Parser {
            text: text.to_string(),
            lexer: Lexer::new(text),
            buffer: VecDeque::with_capacity(2),
            line_starts,
        }
    }

    fn fill(&mut self, n: usize) {
        while self.buffer.len() < n {
            let token = self.lexer.next_token();
            self.buffer.push_back(token);
        }
    }

    fn peek(&mut self) -> &Token {
        self.fill(1);
        &self.buffer[0]
    }

    fn peek2(&mut self) -> &Token {
        self.fill(2);
        &self.buffer[1]
    }

    fn next(&mut self) -> Token {
        self.fill(1);
        self.buffer.pop_front().expect("lookahead buffer filled")
    }

    /// Resolve a byte offset into a 1-based line/char position.
    fn position(&self, offset: usize) -> Position {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        Position::new(offset, line, offset - self.line_starts[line - 1] + 1)
    }

    /// True if the source between two byte offsets spans a newline. Drives
    /// the formatting-only multi-line flags.
    fn span_has_newline(&self, from: usize, to: usize) -> bool {
        from <= to && to <= self.text.len() && self.text[from..to].contains('\n')
    }

    /// A single-line slice of roughly twenty bytes around the offset.
    fn context_snippet(&self, offset: usize) -> String {
        let len = self.text.len();
        let offset = offset.min(len);
        let line_start = self.text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let line_end = self.text[offset..]
            .find('\n')
            .map(|i| offset + i)
            .unwrap_or(len);
        let mut start = line_start.max(offset.saturating_sub(10));
        let mut end = line_end.min(offset + 10);
        while start < len && !self.text.is_char_boundary(start) {
            start += 1;
        }
        while end > start && !self.text.is_char_boundary(end) {
            end -= 1;
        }
        self.text[start..end].to_string()
    }

    fn lex_error(&self, token: &Token) -> ParseError {
        let pos = self.position(token.pos);
        ParseError::Lex {
            line: pos.line,
            char: pos.char,
            message: token.text.clone(),
        }
    }

    fn unexpected(&self, token: &Token, expected: &[TokenType]) -> ParseError {
        if token.token_type == TokenType::Error {
            return self.lex_error(token);
        }
        let pos = self.position(token.pos);
        let found = if token.token_type == TokenType::Eof {
            "EOF".to_string()
        } else {
            format!("token \"{}\"", token.text)
        };
        ParseError::Unexpected {
            found,
            line: pos.line,
            char: pos.char,
            context: self.context_snippet(token.pos),
            expected: expected.to_vec(),
        }
    }

    fn bad_literal(&self, offset: usize, message: impl Into<String>) -> ParseError {
        let pos = self.position(offset);
        ParseError::BadLiteral {
            line: pos.line,
            char: pos.char,
            message: message.into(),
        }
    }

    fn expect(&mut self, token_type: TokenType) -> Result<Token, ParseError> {
        let token = self.peek().clone();
        if token.token_type == token_type {
            Ok(self.next())
        } else {
            Err(self.unexpected(&token, &[token_type]))
        }
    }

    /// `Program := Statement* EOF`
    pub fn parse_program(&mut self) -> Result<Node, ParseError> {
        let mut list = ListNode {
            pos: self.position(0),
            nodes: Vec::new(),
            trailing: None,
        };
        loop {
            match self.peek().token_type {
                TokenType::Eof => break,
                TokenType::Error => {
                    let token = self.peek().clone();
                    return Err(self.lex_error(&token));
                }
                TokenType::Comment => {
                    let comment = self.parse_comment();
                    if self.peek().token_type == TokenType::Eof {
                        // No following construct: the block trails the program
                        list.trailing = Some(comment);
                        break;
                    }
                    let mut statement = self.parse_statement()?;
                    statement.set_comment(comment);
                    list.nodes.push(statement);
                }
                _ => list.nodes.push(self.parse_statement()?),
            }
        }
        Ok(Node::List(list))
    }

    /// Collect a run of adjacent `//` lines into one comment block.
    fn parse_comment(&mut self) -> CommentNode {
        let offset = self.peek().pos;
        let pos = self.position(offset);
        let mut lines = Vec::new();
        while self.peek().token_type == TokenType::Comment {
            let token = self.next();
            let line = token.text.strip_prefix("//").unwrap_or(&token.text);
            let line = line.strip_prefix(' ').unwrap_or(line);
            lines.push(line.trim_end().to_string());
        }
        CommentNode { pos, lines }
    }

    fn parse_statement(&mut self) -> Result<Node, ParseError> {
        match self.peek().token_type {
            TokenType::Var => self.parse_declaration(),
            _ => self.parse_expression(),
        }
    }

    /// `Declaration := 'var' Ident '=' Expression`
    fn parse_declaration(&mut self) -> Result<Node, ParseError> {
        let var_token = self.next();
        let ident_token = self.expect(TokenType::Ident)?;
        let left = IdentifierNode {
            pos: self.position(ident_token.pos),
            ident: ident_token.text,
            comment: None,
        };
        self.expect(TokenType::Asgn)?;
        let right = self.parse_expression()?;
        Ok(Node::Declaration(DeclarationNode {
            pos: self.position(var_token.pos),
            left,
            right: Box::new(right),
            comment: None,
        }))
    }

    /// An expression starting with an identifier is a chain-capable term;
    /// otherwise it is a lambda or a plain primary expression.
    fn parse_expression(&mut self) -> Result<Node, ParseError> {
        match self.peek().token_type {
            TokenType::Ident => {
                let term = self.parse_func_or_ident(FuncKind::Global)?;
                self.parse_chain(term)
            }
            TokenType::Lambda => self.parse_lambda(),
            _ => self.parse_primary_expr(),
        }
    }

    /// Left-associative chaining over `.`, `|`, `@`.
    fn parse_chain(&mut self, mut left: Node) -> Result<Node, ParseError> {
        loop {
            let operator = self.peek().token_type;
            let kind = match operator {
                TokenType::Pipe => FuncKind::Chain,
                TokenType::At => FuncKind::Dynamic,
                TokenType::Dot => FuncKind::Property,
                _ => break,
            };
            let op_token = self.next();
            let right = match operator {
                // Pipe and dynamic chains always take a call form
                TokenType::Pipe | TokenType::At => self.parse_function(kind)?,
                // Dot takes a call if '(' follows, else a bare property read
                _ => self.parse_func_or_ident(kind)?,
            };
            left = Node::Chain(ChainNode {
                pos: self.position(op_token.pos),
                operator,
                left: Box::new(left),
                right: Box::new(right),
                comment: None,
            });
        }
        Ok(left)
    }

    fn parse_func_or_ident(&mut self, kind: FuncKind) -> Result<Node, ParseError> {
        if self.peek().token_type == TokenType::Ident
            && self.peek2().token_type == TokenType::LParen
        {
            self.parse_function(kind)
        } else {
            let token = self.expect(TokenType::Ident)?;
            Ok(Node::Identifier(IdentifierNode {
                pos: self.position(token.pos),
                ident: token.text,
                comment: None,
            }))
        }
    }

    fn parse_function(&mut self, kind: FuncKind) -> Result<Node, ParseError> {
        let name_token = self.expect(TokenType::Ident)?;
        self.expect(TokenType::LParen)?;
        let mut args = Vec::new();
        if self.peek().token_type != TokenType::RParen {
            loop {
                args.push(self.parse_parameter()?);
                if self.peek().token_type == TokenType::Comma {
                    self.next();
                    // Trailing comma is tolerated
                    if self.peek().token_type == TokenType::RParen {
                        break;
                    }
                } else {
                    break;
                }
            }
        }
        self.expect(TokenType::RParen)?;
        let multi_line = match (args.first(), args.last()) {
            (Some(first), Some(last)) if args.len() > 1 => {
                self.span_has_newline(first.position().offset, last.position().offset)
            }
            _ => false,
        };
        Ok(Node::Function(FunctionNode {
            pos: self.position(name_token.pos),
            kind,
            func: name_token.text,
            args,
            multi_line,
            comment: None,
        }))
    }

    /// `Parameter := Expression | 'lambda:' LambdaExpr | Primary`
    fn parse_parameter(&mut self) -> Result<Node, ParseError> {
        match self.peek().token_type {
            TokenType::Lambda => self.parse_lambda(),
            TokenType::Ident => {
                let term = self.parse_func_or_ident(FuncKind::Global)?;
                self.parse_chain(term)
            }
            _ => self.parse_primary_expr(),
        }
    }

    fn parse_lambda(&mut self) -> Result<Node, ParseError> {
        let token = self.next();
        let expr = self.parse_primary_expr()?;
        Ok(Node::Lambda(LambdaNode {
            pos: self.position(token.pos),
            expr: Box::new(expr),
            comment: None,
        }))
    }

    /// Precedence-climbing expression entry point.
    fn parse_primary_expr(&mut self) -> Result<Node, ParseError> {
        let lhs = self.parse_primary()?;
        self.climb(lhs, 0)
    }

    /// Operator-precedence climb. Runs of equal-or-higher precedence on the
    /// right-hand side associate to the right.
    fn climb(&mut self, mut lhs: Node, min_precedence: u8) -> Result<Node, ParseError> {
        loop {
            let look = self.peek().token_type;
            if !look.is_expr_operator() || look.precedence() < min_precedence {
                break;
            }
            let op_token = self.next();
            let operator = op_token.token_type;
            let mut rhs = self.parse_primary()?;
            loop {
                let ahead = self.peek().token_type;
                if ahead.is_expr_operator() && ahead.precedence() >= operator.precedence() {
                    rhs = self.climb(rhs, ahead.precedence())?;
                } else {
                    break;
                }
            }
            let multi_line =
                self.span_has_newline(lhs.position().offset, rhs.position().offset);
            lhs = Node::Binary(BinaryNode {
                pos: self.position(op_token.pos),
                operator,
                left: Box::new(lhs),
                right: Box::new(rhs),
                parens: false,
                multi_line,
                comment: None,
            });
        }
        Ok(lhs)
    }

    fn parse_primary(&mut self) -> Result<Node, ParseError> {
        // A comment run directly before a primary belongs to it
        let comment = if self.peek().token_type == TokenType::Comment {
            Some(self.parse_comment())
        } else {
            None
        };

        let token = self.peek().clone();
        let mut node = match token.token_type {
            TokenType::LParen => {
                self.next();
                let mut expr = self.parse_primary_expr()?;
                self.expect(TokenType::RParen)?;
                if let Node::Binary(binary) = &mut expr {
                    binary.parens = true;
                }
                expr
            }
            TokenType::Number => {
                self.next();
                self.number_node(&token)?
            }
            TokenType::Duration => {
                self.next();
                let dur = Duration::parse(&token.text)
                    .map_err(|message| self.bad_literal(token.pos, message))?;
                Node::Duration(DurationNode {
                    pos: self.position(token.pos),
                    dur,
                    comment: None,
                })
            }
            TokenType::String => {
                self.next();
                let (literal, triple) = unquote_string(&token.text);
                Node::String(StringNode {
                    pos: self.position(token.pos),
                    literal,
                    triple,
                    comment: None,
                })
            }
            TokenType::Reference => {
                self.next();
                Node::Reference(ReferenceNode {
                    pos: self.position(token.pos),
                    reference: unquote_reference(&token.text),
                    comment: None,
                })
            }
            TokenType::Regex => {
                self.next();
                self.regex_node(&token)?
            }
            TokenType::True | TokenType::False => {
                self.next();
                Node::Bool(BoolNode {
                    pos: self.position(token.pos),
                    bool_value: token.token_type == TokenType::True,
                    comment: None,
                })
            }
            TokenType::Mult => {
                self.next();
                Node::Star(StarNode {
                    pos: self.position(token.pos),
                    comment: None,
                })
            }
            TokenType::Ident => {
                if self.peek2().token_type == TokenType::LParen {
                    self.parse_function(FuncKind::Global)?
                } else {
                    self.next();
                    Node::Identifier(IdentifierNode {
                        pos: self.position(token.pos),
                        ident: token.text.clone(),
                        comment: None,
                    })
                }
            }
            TokenType::Minus | TokenType::Not => {
                self.next();
                let operand = self.parse_primary()?;
                Node::Unary(UnaryNode {
                    pos: self.position(token.pos),
                    operator: token.token_type,
                    node: Box::new(operand),
                    comment: None,
                })
            }
            _ => return Err(self.unexpected(&token, PRIMARY_EXPECTED)),
        };

        if let Some(comment) = comment {
            node.set_comment(comment);
        }
        Ok(node)
    }

    fn number_node(&self, token: &Token) -> Result<Node, ParseError> {
        let num = if token.text.contains('.') {
            let value: f64 = token
                .text
                .parse()
                .map_err(|_| self.bad_literal(token.pos, format!("bad float {:?}", token.text)))?;
            Num::Float(value)
        } else {
            let value: i64 = token.text.parse().map_err(|_| {
                self.bad_literal(token.pos, format!("integer {:?} out of range", token.text))
            })?;
            Num::Int(value)
        };
        Ok(Node::Number(NumberNode {
            pos: self.position(token.pos),
            num,
            comment: None,
        }))
    }

    fn regex_node(&self, token: &Token) -> Result<Node, ParseError> {
        let literal = token.text[1..token.text.len() - 1].to_string();
        // Only the delimiter escape is script-level; everything else is
        // regex syntax passed through
        let pattern = literal.replace("\\/", "/");
        let regex = Regex::new(&pattern)
            .map_err(|e| self.bad_literal(token.pos, format!("invalid regex: {e}")))?;
        Ok(Node::Regex(RegexNode {
            pos: self.position(token.pos),
            regex,
            literal,
            comment: None,
        }))
    }
}

/// Strip quotes and process escapes for a string literal.
///
/// Triple-quoted strings are raw. Single-quoted strings unescape only the
/// delimiter and the backslash; any other escape keeps its backslash.
fn unquote_string(raw: &str) -> (String, bool) {
    if let Some(inner) = raw
        .strip_prefix("'''")
        .and_then(|r| r.strip_suffix("'''"))
    {
        return (inner.to_string(), true);
    }
    let inner = raw
        .strip_prefix('\'')
        .and_then(|r| r.strip_suffix('\''))
        .unwrap_or(raw);
    (unescape(inner, '\''), false)
}

fn unquote_reference(raw: &str) -> String {
    let inner = raw
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .unwrap_or(raw);
    unescape(inner, '"')
}

fn unescape(inner: &str, delimiter: char) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) if next == delimiter || next == '\\' => out.push(next),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
