// tests/lexer_tests.rs

use plumb_lang::ast::TokenType;
use plumb_lang::lexer::Lexer;

fn token_types(input: &str) -> Vec<TokenType> {
    let mut lexer = Lexer::new(input);
    let mut types = Vec::new();
    loop {
        let token = lexer.next_token();
        let tt = token.token_type;
        types.push(tt);
        if tt == TokenType::Eof || tt == TokenType::Error {
            break;
        }
    }
    types
}

fn texts(input: &str) -> Vec<String> {
    let mut lexer = Lexer::new(input);
    let mut out = Vec::new();
    loop {
        let token = lexer.next_token();
        if token.token_type == TokenType::Eof {
            break;
        }
        out.push(token.text);
    }
    out
}

// ============================================================================
// Identifiers, keywords, and structural tokens
// ============================================================================

#[test]
fn test_declaration_stream() {
    assert_eq!(
        token_types("var x = stream"),
        vec![
            TokenType::Var,
            TokenType::Ident,
            TokenType::Asgn,
            TokenType::Ident,
            TokenType::Eof,
        ]
    );
}

#[test]
fn test_identifiers_with_underscores_and_digits() {
    assert_eq!(
        texts("_internal x9 mixed_case_2"),
        vec!["_internal", "x9", "mixed_case_2"]
    );
}

#[test]
fn test_chain_operators() {
    assert_eq!(
        token_types("a|b().c@d()"),
        vec![
            TokenType::Ident,
            TokenType::Pipe,
            TokenType::Ident,
            TokenType::LParen,
            TokenType::RParen,
            TokenType::Dot,
            TokenType::Ident,
            TokenType::At,
            TokenType::Ident,
            TokenType::LParen,
            TokenType::RParen,
            TokenType::Eof,
        ]
    );
}

#[test]
fn test_booleans_are_keywords() {
    assert_eq!(
        token_types("TRUE FALSE"),
        vec![TokenType::True, TokenType::False, TokenType::Eof]
    );
    // Lowercase is a plain identifier
    assert_eq!(
        token_types("true"),
        vec![TokenType::Ident, TokenType::Eof]
    );
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_greedy_multi_char_operators() {
    assert_eq!(
        token_types("== != <= >= =~ !~ < > = !"),
        vec![
            TokenType::Equal,
            TokenType::NotEqual,
            TokenType::LessEqual,
            TokenType::GreaterEqual,
            TokenType::RegexEqual,
            TokenType::RegexNotEqual,
            TokenType::Less,
            TokenType::Greater,
            TokenType::Asgn,
            TokenType::Not,
            TokenType::Eof,
        ]
    );
}

#[test]
fn test_math_operators() {
    assert_eq!(
        token_types("1 + 2 - 3 * 4 / 5 % 6"),
        vec![
            TokenType::Number,
            TokenType::Plus,
            TokenType::Number,
            TokenType::Minus,
            TokenType::Number,
            TokenType::Mult,
            TokenType::Number,
            TokenType::Div,
            TokenType::Number,
            TokenType::Mod,
            TokenType::Number,
            TokenType::Eof,
        ]
    );
}

#[test]
fn test_minus_is_always_an_operator() {
    // Negative literals do not exist at the lexical level
    assert_eq!(
        token_types("-5"),
        vec![TokenType::Minus, TokenType::Number, TokenType::Eof]
    );
    assert_eq!(
        token_types("-x"),
        vec![TokenType::Minus, TokenType::Ident, TokenType::Eof]
    );
}

// ============================================================================
// Numbers and durations
// ============================================================================

#[test]
fn test_integer_and_float() {
    let mut lexer = Lexer::new("42 3.15");
    let int = lexer.next_token();
    assert_eq!(int.token_type, TokenType::Number);
    assert_eq!(int.text, "42");
    let float = lexer.next_token();
    assert_eq!(float.token_type, TokenType::Number);
    assert_eq!(float.text, "3.15");
}

#[test]
fn test_multiple_decimal_points_is_an_error() {
    let mut lexer = Lexer::new("1.2.3");
    let token = lexer.next_token();
    assert_eq!(token.token_type, TokenType::Error);
    assert!(token.text.contains("decimal"), "{}", token.text);
}

#[test]
fn test_duration_units() {
    for input in ["3u", "3µ", "250ms", "10s", "5m", "2h", "1d", "1w"] {
        let mut lexer = Lexer::new(input);
        let token = lexer.next_token();
        assert_eq!(token.token_type, TokenType::Duration, "{input}");
        assert_eq!(token.text, input);
    }
}

#[test]
fn test_multi_unit_duration_is_one_token() {
    let mut lexer = Lexer::new("1h30m");
    let token = lexer.next_token();
    assert_eq!(token.token_type, TokenType::Duration);
    assert_eq!(token.text, "1h30m");
    assert_eq!(lexer.next_token().token_type, TokenType::Eof);
}

#[test]
fn test_ms_disambiguation() {
    // 'm' followed by 's' is milliseconds, not minutes
    let mut lexer = Lexer::new("5ms 5m");
    assert_eq!(lexer.next_token().text, "5ms");
    assert_eq!(lexer.next_token().text, "5m");
}

// ============================================================================
// Strings, references, regexes
// ============================================================================

#[test]
fn test_single_quoted_string() {
    let mut lexer = Lexer::new(r"'hello world'");
    let token = lexer.next_token();
    assert_eq!(token.token_type, TokenType::String);
    assert_eq!(token.text, r"'hello world'");
}

#[test]
fn test_escaped_quote_in_string() {
    let mut lexer = Lexer::new(r"'it\'s'");
    let token = lexer.next_token();
    assert_eq!(token.token_type, TokenType::String);
    assert_eq!(token.text, r"'it\'s'");
}

#[test]
fn test_triple_quoted_string() {
    let mut lexer = Lexer::new("'''no \\escapes 'here' at all'''");
    let token = lexer.next_token();
    assert_eq!(token.token_type, TokenType::String);
    assert_eq!(token.text, "'''no \\escapes 'here' at all'''");
}

#[test]
fn test_reference() {
    let mut lexer = Lexer::new(r#""value" "esc\"aped""#);
    let first = lexer.next_token();
    assert_eq!(first.token_type, TokenType::Reference);
    assert_eq!(first.text, r#""value""#);
    let second = lexer.next_token();
    assert_eq!(second.token_type, TokenType::Reference);
    assert_eq!(second.text, r#""esc\"aped""#);
}

#[test]
fn test_unterminated_string_is_an_error() {
    let mut lexer = Lexer::new("'oops");
    let token = lexer.next_token();
    assert_eq!(token.token_type, TokenType::Error);
    assert!(token.text.contains("unterminated"), "{}", token.text);
}

#[test]
fn test_unterminated_reference_is_an_error() {
    let mut lexer = Lexer::new("\"oops");
    assert_eq!(lexer.next_token().token_type, TokenType::Error);
}

#[test]
fn test_regex_after_regex_operators() {
    let mut lexer = Lexer::new(r#""host" !~ /^db\d+/"#);
    lexer.next_token(); // reference
    assert_eq!(lexer.next_token().token_type, TokenType::RegexNotEqual);
    let regex = lexer.next_token();
    assert_eq!(regex.token_type, TokenType::Regex);
    assert_eq!(regex.text, r"/^db\d+/");
}

#[test]
fn test_regex_after_assignment() {
    let mut lexer = Lexer::new(r"var re = /server\/0/");
    lexer.next_token(); // var
    lexer.next_token(); // re
    assert_eq!(lexer.next_token().token_type, TokenType::Asgn);
    let regex = lexer.next_token();
    assert_eq!(regex.token_type, TokenType::Regex);
    assert_eq!(regex.text, r"/server\/0/");
}

#[test]
fn test_slash_is_division_outside_regex_context() {
    assert_eq!(
        token_types("10 / 2"),
        vec![
            TokenType::Number,
            TokenType::Div,
            TokenType::Number,
            TokenType::Eof,
        ]
    );
}

#[test]
fn test_unterminated_regex_is_an_error() {
    let mut lexer = Lexer::new("var re = /oops");
    lexer.next_token();
    lexer.next_token();
    lexer.next_token();
    assert_eq!(lexer.next_token().token_type, TokenType::Error);
}

// ============================================================================
// Comments
// ============================================================================

#[test]
fn test_comment_runs_to_end_of_line() {
    let mut lexer = Lexer::new("// a comment\nvar");
    let comment = lexer.next_token();
    assert_eq!(comment.token_type, TokenType::Comment);
    assert_eq!(comment.text, "// a comment");
    assert_eq!(lexer.next_token().token_type, TokenType::Var);
}

#[test]
fn test_lambda_keyword() {
    let mut lexer = Lexer::new("lambda: \"x\" > 1");
    assert_eq!(lexer.next_token().token_type, TokenType::Lambda);
    assert_eq!(lexer.next_token().token_type, TokenType::Reference);
    assert_eq!(lexer.next_token().token_type, TokenType::Greater);
    assert_eq!(lexer.next_token().token_type, TokenType::Number);
}

#[test]
fn test_unknown_character_is_an_error() {
    let mut lexer = Lexer::new("var x = #");
    lexer.next_token();
    lexer.next_token();
    lexer.next_token();
    let token = lexer.next_token();
    assert_eq!(token.token_type, TokenType::Error);
    assert!(token.text.contains('#'), "{}", token.text);
}

#[test]
fn test_byte_positions() {
    let mut lexer = Lexer::new("var x = 10s");
    assert_eq!(lexer.next_token().pos, 0);
    assert_eq!(lexer.next_token().pos, 4);
    assert_eq!(lexer.next_token().pos, 6);
    assert_eq!(lexer.next_token().pos, 8);
}
