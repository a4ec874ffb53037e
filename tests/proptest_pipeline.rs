//! Property-based tests with proptest.
//!
//! Random text checks that token spans tile the source; generated programs
//! check that compilation is deterministic; random bracket soup checks the
//! delimiter counts.

use fratm::{
    CompileOptions, ParseErrorKind, check_delimiters, compile, tokenize, tokenize_lossy,
};
use proptest::prelude::*;

// -- Span tiling --

/// Text mixing words (some of them keywords), numbers, strings, comments,
/// operators and characters the lexer rejects.
fn source_text() -> impl Strategy<Value = String> {
    let words = prop_oneof![
        "[a-zàèìòù_]{1,6}",
        Just("chist è".to_string()),
        Just("stamm a dì".to_string()),
        Just("e si schiatta".to_string()),
    ];
    let literals = prop_oneof![
        "[0-9]{1,4}(\\.[0-9]{1,2})?",
        "\"[a-z {}()]{0,6}\"?",
        "'[a-z]{0,4}'",
        "//[a-z ]{0,8}",
        "/\\*[a-z\n ]{0,6}(\\*/)?",
    ];
    let symbols = prop_oneof![
        "[-+*/%=<>!?:;,.(){}\\[\\]]{1,3}",
        "[ \t\r\n]{1,3}",
        "[#@$`~^&|]",
    ];
    let piece = prop_oneof![words, literals, symbols];
    prop::collection::vec(piece, 0..24).prop_map(|pieces| pieces.concat())
}

proptest! {
    #[test]
    fn token_spans_tile_the_source(input in source_text()) {
        let tokens = tokenize_lossy(&input);
        let mut pos = 0;
        for token in &tokens {
            prop_assert!(token.span.start >= pos, "overlapping tokens in {:?}", input);
            let gap = &input[pos..token.span.start];
            prop_assert!(
                gap.chars().all(|c| matches!(c, ' ' | '\t' | '\r')),
                "gap {:?} in {:?}", gap, input
            );
            prop_assert_eq!(&input[token.span.start..token.span.end], token.text.as_str());
            pos = token.span.end;
        }
        prop_assert!(input[pos..].chars().all(|c| matches!(c, ' ' | '\t' | '\r')));
    }

    #[test]
    fn line_and_column_agree_with_offsets(input in source_text()) {
        for token in tokenize_lossy(&input) {
            let before = &input[..token.span.start];
            let line = before.matches('\n').count() + 1;
            let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
            prop_assert_eq!((token.span.line, token.span.column), (line, column));
        }
    }
}

// -- Deterministic compilation --

/// Identifiers that can never collide with a keyword.
fn ident() -> impl Strategy<Value = String> {
    "[a-z]{1,5}".prop_map(|s| format!("v_{s}"))
}

fn statement() -> impl Strategy<Value = String> {
    prop_oneof![
        (ident(), 0u32..1000).prop_map(|(x, n)| format!("tien {x} = {n}")),
        (ident(), ident()).prop_map(|(x, y)| format!("chist è {x} = [{y}, \"{y}\"]")),
        (ident(), 0u32..100).prop_map(|(x, n)| format!("stamm a dì({x} + {n})")),
        (ident(), ident(), 0u32..100)
            .prop_map(|(x, y, n)| format!("si ({x} > {n}) {{\n  {y} = {x} ** 2\n}} sinnò {{\n  {y}--\n}}")),
        (ident(), ident(), 1u32..10)
            .prop_map(|(f, p, n)| format!("facc {f}({p}) {{\n  piglie -{p} * ({p} - {n})\n}}")),
        (ident(), ident())
            .prop_map(|(c, m)| format!("na famiglie {c} {{\n  facc {m}() {{\n    caccia stu cos\n  }}\n}}")),
        (ident(), ident()).prop_map(|(x, y)| format!("{x} = {{ k: {y} }}.k")),
    ]
}

fn program() -> impl Strategy<Value = String> {
    prop::collection::vec(statement(), 1..8).prop_map(|s| s.join("\n"))
}

proptest! {
    #[test]
    fn compilation_is_deterministic(input in program()) {
        let options = CompileOptions::new().source_map(true);
        let first = compile(&input, &options);
        prop_assert!(first.is_ok(), "{:?} failed: {:?}", input, first);
        prop_assert_eq!(first, compile(&input, &options));
    }

    #[test]
    fn generated_mappings_decode(input in program()) {
        let options = CompileOptions::new().source_map(true);
        let output = compile(&input, &options).expect("compile failed");
        let map = output.source_map.expect("source map");
        let lines = input.lines().count();
        let mappings = map.decode_mappings().expect("decode");
        prop_assert!(!mappings.is_empty());
        for mapping in mappings {
            prop_assert!((mapping.original_line as usize) < lines);
        }
    }
}

// -- Delimiter counts --

proptest! {
    #[test]
    fn delimiter_imbalance_is_exact(
        pieces in prop::collection::vec(
            prop::sample::select(vec![
                "{", "}", "(", ")", "[", "]", "x", " ", "\n", "\"{(\"", "// ]\n",
            ]),
            0..40,
        )
    ) {
        let input = pieces.concat();
        let count = |open: &str, close: &str| -> i64 {
            let net = |p: &&str| match *p {
                p if p == open => 1,
                p if p == close => -1,
                _ => 0,
            };
            pieces.iter().map(net).sum()
        };
        let braces = count("{", "}");
        let parens = count("(", ")");
        let brackets = count("[", "]");

        let tokens = tokenize(&input).expect("tokenize failed");
        match check_delimiters(&tokens) {
            Ok(()) => prop_assert_eq!((braces, parens, brackets), (0, 0, 0)),
            Err(err) => prop_assert_eq!(
                err.kind,
                ParseErrorKind::UnbalancedDelimiters { braces, parens, brackets }
            ),
        }
    }
}
