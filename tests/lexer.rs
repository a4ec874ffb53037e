mod common;

use common::{kind_names, tokens};
use fratm::lexer::scan;
use fratm::{LexErrorKind, TokenKind, tokenize, tokenize_lossy};

#[test]
fn declaration_and_log() {
    assert_eq!(
        kind_names("chist è nome = \"Gennaro\"\nstamm a dì(nome)"),
        vec![
            "const-intro",
            "identifier",
            "operator",
            "string",
            "console-log",
            "punctuation",
            "identifier",
            "punctuation",
        ]
    );
}

#[test]
fn scan_leaves_words_unresolved() {
    let raw = scan("chist è x");
    assert!(raw.iter().all(|t| t.kind == TokenKind::Identifier));
    assert_eq!(raw.len(), 3);
}

#[test]
fn token_text_is_exact_source_slice() {
    let input = "tien  s = 'a\\tb' /* c */ + 2.50";
    for token in tokens(input) {
        assert_eq!(&input[token.span.start..token.span.end], token.text);
    }
}

#[test]
fn string_value_is_unescaped() {
    let toks = tokens(r#""a\"b\\c""#);
    assert_eq!(toks[0].kind, TokenKind::String("a\"b\\c".to_string()));
}

#[test]
fn columns_count_characters() {
    let toks = tokens("sfòls è x");
    // `sfòls` is one token; `è` alone is an identifier
    assert_eq!(toks[0].kind, TokenKind::False);
    assert_eq!(toks[1].span.column, 7);
    assert_eq!(toks[2].span.column, 9);
    assert_eq!(toks[0].char_len(), 5);
    assert_eq!(toks[0].span.len(), 6);
}

#[test]
fn newlines_are_tokens() {
    let toks = tokens("a\n\nb");
    let kinds: Vec<_> = toks.iter().map(|t| t.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Identifier,
            TokenKind::Newline,
            TokenKind::Newline,
            TokenKind::Identifier,
        ]
    );
    assert_eq!(toks[3].span.line, 3);
}

#[test]
fn crlf_line_endings() {
    let toks = tokens("a\r\nb");
    assert_eq!(toks.len(), 3);
    assert_eq!(toks[2].span.line, 2);
    assert_eq!(toks[2].span.column, 1);
}

#[test]
fn unexpected_character() {
    let err = tokenize("tien x = 1 # 2").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('#'));
    assert_eq!(err.span.column, 12);
    assert_eq!(err.to_string(), "unexpected character: # at line 1, column 12");
}

#[test]
fn unterminated_string_reports_opening_quote() {
    let err = tokenize("x = 1\ny = \"no end").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::UnterminatedString);
    assert_eq!((err.span.line, err.span.column), (2, 5));
}

#[test]
fn unterminated_comment() {
    let err = tokenize("/* aperto").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::UnterminatedComment);
    assert_eq!(
        err.kind.suggestion().as_deref(),
        Some("close the comment with '*/'")
    );
}

#[test]
fn lossy_keeps_going_after_errors() {
    let toks = tokenize_lossy("a # b");
    let kinds: Vec<_> = toks.iter().map(|t| t.kind.name()).collect();
    assert_eq!(kinds, vec!["identifier", "invalid", "identifier"]);
}

#[test]
fn delimiters_inside_strings_are_not_tokens() {
    let toks = tokens("'{' \"}\" // (");
    assert!(toks.iter().all(|t| !t.kind.is_punctuation()));
}
