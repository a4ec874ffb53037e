use crate::parser::{ParseError, ParseErrorKind};
use crate::token::{Span, Token, TokenKind};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Brace,
    Paren,
    Bracket,
}

const fn classify(kind: &TokenKind) -> Option<(Delimiter, bool)> {
    match kind {
        TokenKind::LeftBrace => Some((Delimiter::Brace, true)),
        TokenKind::RightBrace => Some((Delimiter::Brace, false)),
        TokenKind::LeftParen => Some((Delimiter::Paren, true)),
        TokenKind::RightParen => Some((Delimiter::Paren, false)),
        TokenKind::LeftBracket => Some((Delimiter::Bracket, true)),
        TokenKind::RightBracket => Some((Delimiter::Bracket, false)),
        _ => None,
    }
}

/// Check that `{}`, `()` and `[]` tokens balance, counting each kind on
/// its own. Delimiters inside strings and comments are never tokens, so
/// they do not count.
///
/// # Errors
///
/// Returns `UnbalancedDelimiters` with the signed imbalance (opens minus
/// closes) of every kind. The span points at the first surplus closer of
/// an over-closed kind, otherwise at the innermost opener left unclosed.
pub fn check_delimiters(tokens: &[Token]) -> Result<(), ParseError> {
    let mut open: Vec<(Delimiter, Span)> = Vec::new();
    let mut surplus: Vec<(Delimiter, Span)> = Vec::new();
    let mut braces = 0i64;
    let mut parens = 0i64;
    let mut brackets = 0i64;

    for token in tokens {
        let Some((delimiter, opens)) = classify(&token.kind) else {
            continue;
        };
        let delta = if opens { 1 } else { -1 };
        match delimiter {
            Delimiter::Brace => braces += delta,
            Delimiter::Paren => parens += delta,
            Delimiter::Bracket => brackets += delta,
        }
        if opens {
            open.push((delimiter, token.span));
        } else if let Some(i) = open.iter().rposition(|(d, _)| *d == delimiter) {
            open.remove(i);
        } else {
            surplus.push((delimiter, token.span));
        }
    }

    if braces == 0 && parens == 0 && brackets == 0 {
        return Ok(());
    }

    let net = |delimiter: Delimiter| match delimiter {
        Delimiter::Brace => braces,
        Delimiter::Paren => parens,
        Delimiter::Bracket => brackets,
    };
    let span = surplus
        .iter()
        .find(|(d, _)| net(*d) < 0)
        .or_else(|| open.iter().rev().find(|(d, _)| net(*d) > 0))
        .map_or_else(Span::default, |(_, span)| *span);

    Err(ParseError {
        kind: ParseErrorKind::UnbalancedDelimiters {
            braces,
            parens,
            brackets,
        },
        span,
    })
}
