use crate::ast::{Token, TokenType};

/// Pull-based lexer over the script text.
///
/// The parser drives it synchronously through [`Lexer::next_token`]; there
/// is no background producer. After a lexical error the lexer latches: every
/// further call returns the same `Error` token.
pub struct Lexer {
    input: String,
    position: usize,
    /// Type of the last emitted token. `/` opens a regex literal only
    /// immediately after `=`, `=~`, or `!~`.
    last: TokenType,
    errored: Option<Token>,
}

const DURATION_UNIT_CHARS: &str = "uµsmhdw";

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.to_string(),
            position: 0,
            last: TokenType::Eof,
            errored: None,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input[self.position..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.current_char() {
            self.position += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn emit(&mut self, token_type: TokenType, start: usize) -> Token {
        self.last = token_type;
        Token::new(token_type, start, &self.input[start..self.position])
    }

    fn error(&mut self, start: usize, message: impl Into<String>) -> Token {
        let token = Token::new(TokenType::Error, start, message);
        self.last = TokenType::Error;
        self.errored = Some(token.clone());
        token
    }

    /// Produce the next token. Returns `Eof` forever once the input is
    /// exhausted, or the same `Error` token forever after a lexical error.
    pub fn next_token(&mut self) -> Token {
        if let Some(err) = &self.errored {
            return err.clone();
        }
        self.skip_whitespace();
        let start = self.position;

        let Some(ch) = self.current_char() else {
            return self.emit(TokenType::Eof, start);
        };

        // Context-sensitive: a regex literal is only reachable right after
        // `=`, `=~`, or `!~`
        if ch == '/'
            && matches!(
                self.last,
                TokenType::Asgn | TokenType::RegexEqual | TokenType::RegexNotEqual
            )
        {
            return self.read_regex(start);
        }

        match ch {
            '/' if self.peek_char(1) == Some('/') => self.read_comment(start),
            '/' => {
                self.advance();
                self.emit(TokenType::Div, start)
            }
            '.' => {
                self.advance();
                self.emit(TokenType::Dot, start)
            }
            '|' => {
                self.advance();
                self.emit(TokenType::Pipe, start)
            }
            '@' => {
                self.advance();
                self.emit(TokenType::At, start)
            }
            '(' => {
                self.advance();
                self.emit(TokenType::LParen, start)
            }
            ')' => {
                self.advance();
                self.emit(TokenType::RParen, start)
            }
            ',' => {
                self.advance();
                self.emit(TokenType::Comma, start)
            }
            '+' => {
                self.advance();
                self.emit(TokenType::Plus, start)
            }
            '-' => {
                // Always an operator; the parser builds unary minus
                self.advance();
                self.emit(TokenType::Minus, start)
            }
            '*' => {
                self.advance();
                self.emit(TokenType::Mult, start)
            }
            '%' => {
                self.advance();
                self.emit(TokenType::Mod, start)
            }
            '=' => {
                self.advance();
                match self.current_char() {
                    Some('=') => {
                        self.advance();
                        self.emit(TokenType::Equal, start)
                    }
                    Some('~') => {
                        self.advance();
                        self.emit(TokenType::RegexEqual, start)
                    }
                    _ => self.emit(TokenType::Asgn, start),
                }
            }
            '!' => {
                self.advance();
                match self.current_char() {
                    Some('=') => {
                        self.advance();
                        self.emit(TokenType::NotEqual, start)
                    }
                    Some('~') => {
                        self.advance();
                        self.emit(TokenType::RegexNotEqual, start)
                    }
                    _ => self.emit(TokenType::Not, start),
                }
            }
            '<' => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    self.emit(TokenType::LessEqual, start)
                } else {
                    self.emit(TokenType::Less, start)
                }
            }
            '>' => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    self.emit(TokenType::GreaterEqual, start)
                } else {
                    self.emit(TokenType::Greater, start)
                }
            }
            '"' => self.read_reference(start),
            '\'' => self.read_string(start),
            c if c.is_ascii_digit() => self.read_number_or_duration(start),
            c if c.is_alphabetic() || c == '_' => self.read_identifier_or_keyword(start),
            c => self.error(start, format!("unexpected character {c:?}")),
        }
    }

    fn read_identifier_or_keyword(&mut self, start: usize) -> Token {
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
        let ident = &self.input[start..self.position];
        match ident {
            "AND" => self.emit(TokenType::And, start),
            "OR" => self.emit(TokenType::Or, start),
            "TRUE" => self.emit(TokenType::True, start),
            "FALSE" => self.emit(TokenType::False, start),
            "var" => self.emit(TokenType::Var, start),
            "lambda" => {
                if self.current_char() == Some(':') {
                    self.advance();
                    self.emit(TokenType::Lambda, start)
                } else {
                    self.error(start, "expected ':' after \"lambda\"")
                }
            }
            _ => self.emit(TokenType::Ident, start),
        }
    }

    fn read_number_or_duration(&mut self, start: usize) -> Token {
        let mut seen_dot = false;
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                self.advance();
            } else if ch == '.' {
                if seen_dot {
                    return self.error(start, "bad number syntax: multiple decimal points");
                }
                seen_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        // A duration-unit suffix turns the literal into a duration; keep
        // scanning unit/digit runs so multi-unit forms like 1h30m lex as one
        // token
        if self
            .current_char()
            .is_some_and(|c| DURATION_UNIT_CHARS.contains(c))
        {
            while let Some(ch) = self.current_char() {
                if ch.is_ascii_digit() || DURATION_UNIT_CHARS.contains(ch) {
                    self.advance();
                } else {
                    break;
                }
            }
            self.emit(TokenType::Duration, start)
        } else {
            self.emit(TokenType::Number, start)
        }
    }

    fn read_reference(&mut self, start: usize) -> Token {
        self.advance(); // opening quote
        while let Some(ch) = self.current_char() {
            match ch {
                '"' => {
                    self.advance();
                    return self.emit(TokenType::Reference, start);
                }
                '\\' => {
                    self.advance();
                    self.advance();
                }
                '\n' => break,
                _ => self.advance(),
            }
        }
        self.error(start, "unterminated field reference, missing closing '\"'")
    }

    fn read_string(&mut self, start: usize) -> Token {
        if self.input[self.position..].starts_with("'''") {
            self.position += 3;
            while self.position < self.input.len() {
                if self.input[self.position..].starts_with("'''") {
                    self.position += 3;
                    return self.emit(TokenType::String, start);
                }
                self.advance();
            }
            return self.error(start, "unterminated string, missing closing \"'''\"");
        }
        self.advance(); // opening quote
        while let Some(ch) = self.current_char() {
            match ch {
                '\'' => {
                    self.advance();
                    return self.emit(TokenType::String, start);
                }
                '\\' => {
                    self.advance();
                    self.advance();
                }
                '\n' => break,
                _ => self.advance(),
            }
        }
        self.error(start, "unterminated string, missing closing \"'\"")
    }

    fn read_regex(&mut self, start: usize) -> Token {
        self.advance(); // opening slash
        while let Some(ch) = self.current_char() {
            match ch {
                '/' => {
                    self.advance();
                    return self.emit(TokenType::Regex, start);
                }
                '\\' => {
                    self.advance();
                    self.advance();
                }
                '\n' => break,
                _ => self.advance(),
            }
        }
        self.error(start, "unterminated regex, missing closing '/'")
    }

    fn read_comment(&mut self, start: usize) -> Token {
        while let Some(ch) = self.current_char() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
        self.emit(TokenType::Comment, start)
    }
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("var AND OR TRUE FALSE");
    assert_eq!(lexer.next_token().token_type, TokenType::Var);
    assert_eq!(lexer.next_token().token_type, TokenType::And);
    assert_eq!(lexer.next_token().token_type, TokenType::Or);
    assert_eq!(lexer.next_token().token_type, TokenType::True);
    assert_eq!(lexer.next_token().token_type, TokenType::False);
    assert_eq!(lexer.next_token().token_type, TokenType::Eof);
}

#[test]
fn test_chain() {
    let mut lexer = Lexer::new("stream|window().period(10s)");
    assert_eq!(lexer.next_token().text, "stream");
    assert_eq!(lexer.next_token().token_type, TokenType::Pipe);
    assert_eq!(lexer.next_token().text, "window");
    assert_eq!(lexer.next_token().token_type, TokenType::LParen);
    assert_eq!(lexer.next_token().token_type, TokenType::RParen);
    assert_eq!(lexer.next_token().token_type, TokenType::Dot);
    assert_eq!(lexer.next_token().text, "period");
    assert_eq!(lexer.next_token().token_type, TokenType::LParen);
    let dur = lexer.next_token();
    assert_eq!(dur.token_type, TokenType::Duration);
    assert_eq!(dur.text, "10s");
    assert_eq!(dur.pos, 23);
    assert_eq!(lexer.next_token().token_type, TokenType::RParen);
}

#[test]
fn test_regex_only_after_assignment_context() {
    let mut lexer = Lexer::new("\"host\" =~ /server.*/");
    assert_eq!(lexer.next_token().token_type, TokenType::Reference);
    assert_eq!(lexer.next_token().token_type, TokenType::RegexEqual);
    let regex = lexer.next_token();
    assert_eq!(regex.token_type, TokenType::Regex);
    assert_eq!(regex.text, "/server.*/");

    // Without the context, '/' is division
    let mut lexer = Lexer::new("10 / 2");
    assert_eq!(lexer.next_token().token_type, TokenType::Number);
    assert_eq!(lexer.next_token().token_type, TokenType::Div);
    assert_eq!(lexer.next_token().token_type, TokenType::Number);
}

#[test]
fn test_lambda_requires_colon() {
    let mut lexer = Lexer::new("lambda: TRUE");
    let token = lexer.next_token();
    assert_eq!(token.token_type, TokenType::Lambda);
    assert_eq!(token.text, "lambda:");

    let mut lexer = Lexer::new("lambda TRUE");
    assert_eq!(lexer.next_token().token_type, TokenType::Error);
}

#[test]
fn test_error_latches() {
    let mut lexer = Lexer::new("1.2.3 TRUE");
    assert_eq!(lexer.next_token().token_type, TokenType::Error);
    assert_eq!(lexer.next_token().token_type, TokenType::Error);
}
