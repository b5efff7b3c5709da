use cinder::lexer::token::{Keyword, Operator, Punctuation, TokenKind};
use cinder::{lexical_errors, tokenize};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source).into_iter().map(|token| token.kind).collect()
}

#[test]
fn lexes_declaration_with_positions() {
    let tokens = tokenize("int x = 42;");
    assert_eq!(tokens[0].kind, TokenKind::Reserved(Keyword::Int));
    assert_eq!(tokens[1].kind, TokenKind::Identifier("x".to_string()));
    assert_eq!(tokens[1].column, 5);
    assert_eq!(tokens[2].kind, TokenKind::Operator(Operator::Equal));
    assert_eq!(tokens[3].kind, TokenKind::Integer(42));
    assert_eq!(tokens[4].kind, TokenKind::Punctuation(Punctuation::Semicolon));
    assert_eq!(tokens[5].kind, TokenKind::Eof);
}

#[test]
fn lexes_two_character_operators() {
    assert_eq!(
        kinds("<= >= == != && || << >> < >"),
        vec![
            TokenKind::Operator(Operator::LessEqual),
            TokenKind::Operator(Operator::GreaterEqual),
            TokenKind::Operator(Operator::EqualEqual),
            TokenKind::Operator(Operator::BangEqual),
            TokenKind::Operator(Operator::AndAnd),
            TokenKind::Operator(Operator::OrOr),
            TokenKind::Operator(Operator::ShiftLeft),
            TokenKind::Operator(Operator::ShiftRight),
            TokenKind::Operator(Operator::Less),
            TokenKind::Operator(Operator::Greater),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lexes_real_and_string_literals() {
    let tokens = tokenize("3.25 \"a\\tb\"");
    assert_eq!(tokens[0].kind, TokenKind::Real(3.25));
    assert_eq!(tokens[1].kind, TokenKind::Str("a\tb".to_string()));
}

#[test]
fn skips_comments_and_tracks_lines() {
    let tokens = tokenize("// first\n/* block\ncomment */ cout");
    assert_eq!(tokens[0].kind, TokenKind::Reserved(Keyword::Cout));
    assert_eq!(tokens[0].line, 3);
    assert_eq!(tokens[0].column, 12);
}

#[test]
fn second_decimal_point_is_reported_at_its_column() {
    let tokens = tokenize("34.34.34");
    let errors = lexical_errors(&tokens);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].column, 6);
    assert_eq!(errors[0].length, 1);
    assert!(errors[0].message.contains("decimal point"));
}

#[test]
fn letters_inside_a_number_form_one_error() {
    let tokens = tokenize("x = 12abc;");
    let errors = lexical_errors(&tokens);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].column, 7);
    assert_eq!(errors[0].length, 3);
    assert!(matches!(tokens[3].kind, TokenKind::Punctuation(Punctuation::Semicolon)));
}

#[test]
fn trailing_decimal_point_is_an_error() {
    let errors = lexical_errors(&tokenize("5."));
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("digits after decimal point"));
}

#[test]
fn integer_overflow_is_an_error() {
    let errors = lexical_errors(&tokenize("99999999999999999999"));
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("out of range"));
}

#[test]
fn unterminated_string_points_at_the_quote() {
    let errors = lexical_errors(&tokenize("cout << \"abc\nx"));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].line, 1);
    assert_eq!(errors[0].column, 9);
}

#[test]
fn unterminated_block_comment_is_an_error() {
    let tokens = tokenize("int /* never closed");
    let errors = lexical_errors(&tokens);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].length, 2);
}

#[test]
fn lone_ampersand_and_unknown_characters_are_errors() {
    let errors = lexical_errors(&tokenize("a & b @"));
    assert_eq!(errors.len(), 2);
    assert!(errors[0].message.contains("&&"));
    assert!(errors[1].message.contains("'@'"));
}

#[test]
fn lexing_continues_after_an_error() {
    let tokens = tokenize("$ int y;");
    assert!(tokens[0].kind.is_error());
    assert_eq!(tokens[1].kind, TokenKind::Reserved(Keyword::Int));
    assert_eq!(tokens.last().map(|t| &t.kind), Some(&TokenKind::Eof));
}
