// tests/parser_tests.rs

use plumb_lang::ast::{FuncKind, Node, Num, TokenType};
use plumb_lang::parser::{parse, ParseError};

fn parse_statements(script: &str) -> Vec<Node> {
    match parse(script).unwrap() {
        Node::List(list) => list.nodes,
        other => panic!("expected a program list, got {other:?}"),
    }
}

fn parse_single(script: &str) -> Node {
    let mut nodes = parse_statements(script);
    assert_eq!(nodes.len(), 1, "expected one statement");
    nodes.remove(0)
}

fn declaration_rhs(script: &str) -> Node {
    match parse_single(script) {
        Node::Declaration(decl) => *decl.right,
        other => panic!("expected a declaration, got {other:?}"),
    }
}

// ============================================================================
// Literals and primitives
// ============================================================================

#[test]
fn test_parse_integer() {
    let node = declaration_rhs("var x = 42");
    assert!(matches!(node, Node::Number(n) if n.num == Num::Int(42)));
}

#[test]
fn test_parse_float() {
    let node = declaration_rhs("var x = 3.15");
    assert!(matches!(node, Node::Number(n) if n.num == Num::Float(3.15)));
}

#[test]
fn test_integer_and_float_stay_distinct() {
    let int = declaration_rhs("var x = 10");
    let float = declaration_rhs("var x = 10.0");
    assert!(matches!(int, Node::Number(n) if n.num.is_int()));
    assert!(matches!(float, Node::Number(n) if n.num.is_float()));
}

#[test]
fn test_parse_duration() {
    let node = declaration_rhs("var x = 1h30m");
    match node {
        Node::Duration(d) => assert_eq!(d.dur.to_string(), "1h30m"),
        other => panic!("expected duration, got {other:?}"),
    }
}

#[test]
fn test_parse_bool() {
    assert!(matches!(
        declaration_rhs("var x = TRUE"),
        Node::Bool(b) if b.bool_value
    ));
    assert!(matches!(
        declaration_rhs("var x = FALSE"),
        Node::Bool(b) if !b.bool_value
    ));
}

#[test]
fn test_parse_string_unescapes_delimiter() {
    let node = declaration_rhs(r"var x = 'it\'s'");
    match node {
        Node::String(s) => {
            assert_eq!(s.literal, "it's");
            assert!(!s.triple);
        }
        other => panic!("expected string, got {other:?}"),
    }
}

#[test]
fn test_parse_triple_string_is_raw() {
    let node = declaration_rhs(r"var x = '''a \' b'''");
    match node {
        Node::String(s) => {
            assert_eq!(s.literal, r"a \' b");
            assert!(s.triple);
        }
        other => panic!("expected string, got {other:?}"),
    }
}

#[test]
fn test_parse_regex_keeps_source_text() {
    let node = declaration_rhs(r"var re = /^server\/\d+$/");
    match node {
        Node::Regex(r) => {
            assert_eq!(r.literal, r"^server\/\d+$");
            assert!(r.regex.is_match("server/12"));
        }
        other => panic!("expected regex, got {other:?}"),
    }
}

#[test]
fn test_invalid_regex_is_a_parse_error() {
    let err = parse("var re = /(/").unwrap_err();
    assert!(matches!(err, ParseError::BadLiteral { .. }), "{err}");
}

#[test]
fn test_decimal_duration_is_a_parse_error() {
    let err = parse("var d = 1.5s").unwrap_err();
    assert!(matches!(err, ParseError::BadLiteral { .. }), "{err}");
    assert!(err.to_string().contains("decimal"), "{err}");
}

#[test]
fn test_unary_minus_wraps_positive_literal() {
    let node = declaration_rhs("var x = -5");
    match node {
        Node::Unary(u) => {
            assert_eq!(u.operator, TokenType::Minus);
            assert!(matches!(*u.node, Node::Number(n) if n.num == Num::Int(5)));
        }
        other => panic!("expected unary, got {other:?}"),
    }
}

// ============================================================================
// Expression precedence
// ============================================================================

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    // 1 + 2 * 3 parses as 1 + (2 * 3)
    let node = declaration_rhs("var x = 1 + 2 * 3");
    match node {
        Node::Binary(b) => {
            assert_eq!(b.operator, TokenType::Plus);
            assert!(matches!(*b.left, Node::Number(ref n) if n.num == Num::Int(1)));
            assert!(matches!(*b.right, Node::Binary(ref m) if m.operator == TokenType::Mult));
        }
        other => panic!("expected binary, got {other:?}"),
    }
}

#[test]
fn test_equal_precedence_associates_right() {
    // Equal-precedence runs on the right-hand side group rightward
    let node = declaration_rhs("var x = 1 - 2 - 3");
    match node {
        Node::Binary(b) => {
            assert_eq!(b.operator, TokenType::Minus);
            assert!(matches!(*b.left, Node::Number(ref n) if n.num == Num::Int(1)));
            assert!(matches!(*b.right, Node::Binary(ref m) if m.operator == TokenType::Minus));
        }
        other => panic!("expected binary, got {other:?}"),
    }
}

#[test]
fn test_boolean_precedence() {
    // OR binds loosest: a AND b OR c parses as (a AND b) OR c
    let node = declaration_rhs("var x = TRUE AND FALSE OR TRUE");
    match node {
        Node::Binary(b) => {
            assert_eq!(b.operator, TokenType::Or);
            assert!(matches!(*b.left, Node::Binary(ref m) if m.operator == TokenType::And));
        }
        other => panic!("expected binary, got {other:?}"),
    }
}

#[test]
fn test_parenthesized_expression_sets_parens_flag() {
    let node = declaration_rhs("var x = (1 + 2) * 3");
    match node {
        Node::Binary(b) => {
            assert_eq!(b.operator, TokenType::Mult);
            match *b.left {
                Node::Binary(ref inner) => {
                    assert_eq!(inner.operator, TokenType::Plus);
                    assert!(inner.parens);
                }
                ref other => panic!("expected parenthesized binary, got {other:?}"),
            }
        }
        other => panic!("expected binary, got {other:?}"),
    }
}

#[test]
fn test_comparison_in_lambda() {
    let node = declaration_rhs("var f = lambda: \"value\" > 10");
    match node {
        Node::Lambda(l) => match *l.expr {
            Node::Binary(b) => {
                assert_eq!(b.operator, TokenType::Greater);
                assert!(matches!(*b.left, Node::Reference(ref r) if r.reference == "value"));
            }
            other => panic!("expected binary, got {other:?}"),
        },
        other => panic!("expected lambda, got {other:?}"),
    }
}

// ============================================================================
// Chains
// ============================================================================

#[test]
fn test_chain_shape_matches_operators() {
    // var x = stream|window().period(10s).every(10s)
    // parses as Chain(., Chain(., Chain(|, stream, window()), period), every)
    let node = declaration_rhs("var x = stream|window().period(10s).every(10s)");
    let Node::Chain(every_chain) = node else {
        panic!("expected chain");
    };
    assert_eq!(every_chain.operator, TokenType::Dot);
    match *every_chain.right {
        Node::Function(ref f) => {
            assert_eq!(f.func, "every");
            assert_eq!(f.kind, FuncKind::Property);
            assert_eq!(f.args.len(), 1);
        }
        ref other => panic!("expected function, got {other:?}"),
    }

    let Node::Chain(period_chain) = *every_chain.left else {
        panic!("expected chain");
    };
    assert_eq!(period_chain.operator, TokenType::Dot);
    assert!(matches!(
        *period_chain.right,
        Node::Function(ref f) if f.func == "period" && f.kind == FuncKind::Property
    ));

    let Node::Chain(window_chain) = *period_chain.left else {
        panic!("expected chain");
    };
    assert_eq!(window_chain.operator, TokenType::Pipe);
    assert!(matches!(
        *window_chain.left,
        Node::Identifier(ref i) if i.ident == "stream"
    ));
    assert!(matches!(
        *window_chain.right,
        Node::Function(ref f) if f.func == "window" && f.kind == FuncKind::Chain
    ));
}

#[test]
fn test_dynamic_chain_kind() {
    let node = declaration_rhs("var x = host@custom(1)");
    let Node::Chain(chain) = node else {
        panic!("expected chain");
    };
    assert_eq!(chain.operator, TokenType::At);
    assert!(matches!(
        *chain.right,
        Node::Function(ref f) if f.kind == FuncKind::Dynamic
    ));
}

#[test]
fn test_bare_property_read() {
    let node = declaration_rhs("var p = w.period");
    let Node::Chain(chain) = node else {
        panic!("expected chain");
    };
    assert_eq!(chain.operator, TokenType::Dot);
    assert!(matches!(*chain.right, Node::Identifier(ref i) if i.ident == "period"));
}

#[test]
fn test_pipe_requires_a_call() {
    let err = parse("var x = a|b").unwrap_err();
    assert!(matches!(err, ParseError::Unexpected { .. }), "{err}");
}

#[test]
fn test_leading_global_call() {
    let node = declaration_rhs("var t = now()");
    assert!(matches!(
        node,
        Node::Function(ref f) if f.kind == FuncKind::Global && f.args.is_empty()
    ));
}

#[test]
fn test_nested_chain_argument() {
    let node = declaration_rhs("var x = parent|adopt(other|spawn())");
    let Node::Chain(chain) = node else {
        panic!("expected chain");
    };
    let Node::Function(adopt) = *chain.right else {
        panic!("expected function");
    };
    assert_eq!(adopt.args.len(), 1);
    assert!(matches!(adopt.args[0], Node::Chain(ref inner) if inner.operator == TokenType::Pipe));
}

#[test]
fn test_trailing_comma_is_tolerated() {
    let node = declaration_rhs("var x = f(1, 2,)");
    assert!(matches!(node, Node::Function(ref f) if f.args.len() == 2));
}

#[test]
fn test_star_argument() {
    let node = declaration_rhs("var x = groups|groupBy(*)");
    let Node::Chain(chain) = node else {
        panic!("expected chain");
    };
    let Node::Function(group_by) = *chain.right else {
        panic!("expected function");
    };
    assert!(matches!(group_by.args[0], Node::Star(_)));
}

// ============================================================================
// Multi-line flags
// ============================================================================

#[test]
fn test_binary_multi_line_flag() {
    let single = declaration_rhs("var f = lambda: \"a\" > 1 AND \"b\" < 2");
    let multi = declaration_rhs("var f = lambda: \"a\" > 1 AND\n    \"b\" < 2");
    let flag = |node: Node| match node {
        Node::Lambda(l) => match *l.expr {
            Node::Binary(b) => b.multi_line,
            other => panic!("expected binary, got {other:?}"),
        },
        other => panic!("expected lambda, got {other:?}"),
    };
    assert!(!flag(single));
    assert!(flag(multi));
}

#[test]
fn test_function_multi_line_flag() {
    let single = declaration_rhs("var x = f(1, 2)");
    let multi = declaration_rhs("var x = f(\n    1,\n    2,\n)");
    let flag = |node: Node| match node {
        Node::Function(f) => f.multi_line,
        other => panic!("expected function, got {other:?}"),
    };
    assert!(!flag(single));
    assert!(flag(multi));
}

// ============================================================================
// Comments
// ============================================================================

#[test]
fn test_comment_attaches_to_following_declaration() {
    let node = parse_single("// rate threshold\n// in requests\nvar x = 1");
    match node {
        Node::Declaration(decl) => {
            let comment = decl.comment.expect("comment attached");
            assert_eq!(comment.lines, vec!["rate threshold", "in requests"]);
        }
        other => panic!("expected declaration, got {other:?}"),
    }
}

#[test]
fn test_trailing_comment_attaches_to_list() {
    let root = parse("var x = 1\n// the end\n").unwrap();
    let Node::List(list) = root else {
        panic!("expected list");
    };
    assert_eq!(list.nodes.len(), 1);
    let trailing = list.trailing.expect("trailing comment");
    assert_eq!(trailing.lines, vec!["the end"]);
}

// ============================================================================
// Positions and errors
// ============================================================================

#[test]
fn test_positions_are_one_based() {
    let node = parse_single("var x = 1");
    let Node::Declaration(decl) = node else {
        panic!("expected declaration");
    };
    assert_eq!(decl.pos.line, 1);
    assert_eq!(decl.pos.char, 1);
    assert_eq!(decl.left.pos.char, 5);
    assert_eq!(decl.right.position().char, 9);
}

#[test]
fn test_positions_across_lines() {
    let node = parse_single("var x = stream\n    |window()");
    let Node::Declaration(decl) = node else {
        panic!("expected declaration");
    };
    let Node::Chain(chain) = *decl.right else {
        panic!("expected chain");
    };
    let window = chain.right.position();
    assert_eq!(window.line, 2);
    assert_eq!(window.char, 6);
}

#[test]
fn test_unexpected_token_error_details() {
    let err = parse("var = 5").unwrap_err();
    match err {
        ParseError::Unexpected {
            found,
            line,
            char,
            context,
            expected,
        } => {
            assert_eq!(found, "token \"=\"");
            assert_eq!(line, 1);
            assert_eq!(char, 5);
            assert!(context.contains("var ="), "{context}");
            assert_eq!(expected, vec![TokenType::Ident]);
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn test_error_context_is_clipped_to_one_line() {
    let err = parse("var x = 1\nvar = 2\nvar z = 3").unwrap_err();
    match err {
        ParseError::Unexpected { line, context, .. } => {
            assert_eq!(line, 2);
            assert!(!context.contains('\n'), "{context}");
            assert!(context.contains("var ="), "{context}");
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn test_unexpected_eof() {
    let err = parse("var x =").unwrap_err();
    match err {
        ParseError::Unexpected { found, .. } => assert_eq!(found, "EOF"),
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn test_lex_error_surfaces_with_position() {
    let err = parse("var x = 'oops").unwrap_err();
    match err {
        ParseError::Lex { line, char, message } => {
            assert_eq!(line, 1);
            assert_eq!(char, 9);
            assert!(message.contains("unterminated"), "{message}");
        }
        other => panic!("expected lex error, got {other:?}"),
    }
}

#[test]
fn test_first_error_is_terminal() {
    // Both statements are bad; only the first is reported
    let err = parse("var = 1\nvar = 2").unwrap_err();
    match err {
        ParseError::Unexpected { line, .. } => assert_eq!(line, 1),
        other => panic!("expected syntax error, got {other:?}"),
    }
}
