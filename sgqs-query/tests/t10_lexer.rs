//! T10: Scanner
//!
//! Whole-query tokenization and lexical error reporting.

use sgqs_query::{Error, ErrorCode, TokenType, tokenize};

fn types(source: &str) -> Vec<TokenType> {
    tokenize(source)
        .unwrap()
        .into_iter()
        .map(|t| t.token_type)
        .collect()
}

#[test]
fn test_full_query_tokens() {
    use TokenType::*;
    assert_eq!(
        types(r#"MATCH (n:Node {skill: "foo"})-[:LINKS_TO*1..3]->(m) WHERE m.name STARTS WITH "a" RETURN DISTINCT m.id AS id"#),
        vec![
            Match, LeftParen, Identifier, Label, LeftBrace, Identifier, Colon, String, RightBrace,
            RightParen, Dash, LeftBracket, Label, Asterisk, Integer, DotDot, Integer, RightBracket,
            RightArrow, LeftParen, Identifier, RightParen, Where, Identifier, Dot, Identifier,
            Starts, With, String, Return, Distinct, Identifier, Dot, Identifier, As, Identifier,
            Eof,
        ]
    );
}

#[test]
fn test_positions_track_lines_and_columns() {
    let tokens = tokenize("MATCH (n)\n  RETURN n.id").unwrap();
    let ret = tokens
        .iter()
        .find(|t| t.token_type == TokenType::Return)
        .unwrap();
    assert_eq!(ret.position.line, 2);
    assert_eq!(ret.position.column, 3);
    assert_eq!(ret.position.offset, 12);

    let eof = tokens.last().unwrap();
    assert_eq!(eof.token_type, TokenType::Eof);
    assert_eq!(eof.position.offset, "MATCH (n)\n  RETURN n.id".len());
}

#[test]
fn test_empty_input_is_only_eof() {
    assert_eq!(types(""), vec![TokenType::Eof]);
    assert_eq!(types("  -- just a comment"), vec![TokenType::Eof]);
}

#[test]
fn test_comment_lines_are_skipped() {
    let with_comments = types("-- header\nMATCH -- every node\n(n) RETURN n.id -- done");
    let without = types("MATCH (n) RETURN n.id");
    assert_eq!(with_comments, without);
}

#[test]
fn test_double_dash_after_pattern_is_a_relationship() {
    use TokenType::*;
    assert_eq!(
        types("(a)--(b)"),
        vec![LeftParen, Identifier, RightParen, Dash, Dash, LeftParen, Identifier, RightParen, Eof]
    );
}

#[test]
fn test_lexical_error_codes() {
    let err = tokenize("MATCH (n) RETURN n.id ; ").unwrap_err();
    assert!(matches!(err, Error::UnexpectedCharacter { ch: ';', .. }));
    let info = err.to_info();
    assert_eq!(info.code, ErrorCode::E001);
    assert_eq!(info.line, Some(1));
    assert_eq!(info.column, Some(23));

    let err = tokenize("MATCH (n {name: \"open").unwrap_err();
    assert_eq!(err.code(), ErrorCode::E002);
    assert_eq!(err.position().map(|p| p.column), Some(17));
}
