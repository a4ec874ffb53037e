use std::fmt;

use log::debug;

use crate::compound;
use crate::token::{Span, Token, TokenKind};

/// Classifies a lexer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Character that cannot start any token.
    UnexpectedCharacter(char),
    /// String literal without its closing quote.
    UnterminatedString,
    /// `/*` comment without its closing `*/`.
    UnterminatedComment,
}

impl LexErrorKind {
    /// A short hint on how to fix the error, when one is known.
    #[must_use]
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::UnexpectedCharacter(_) => None,
            Self::UnterminatedString => Some("close the string with a matching quote".to_string()),
            Self::UnterminatedComment => Some("close the comment with '*/'".to_string()),
        }
    }
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedCharacter(ch) => {
                write!(f, "unexpected character: {ch}")
            }
            Self::UnterminatedString => {
                write!(f, "unterminated string literal")
            }
            Self::UnterminatedComment => {
                write!(f, "unterminated block comment")
            }
        }
    }
}

/// Error produced during lexing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

/// Tokenize FratmScript source and resolve keywords.
///
/// Words come back as keyword kinds where the keyword table says so,
/// with multi-word compounds merged into a single token.
///
/// # Errors
///
/// Returns `LexError` for the first unterminated string, unterminated
/// block comment, or character that cannot start a token.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let raw = scan(input);
    if let Some(err) = raw.iter().find_map(invalid_to_error) {
        return Err(err);
    }
    let tokens = compound::resolve(input, raw);
    debug!("lexed {} tokens", tokens.len());
    Ok(tokens)
}

/// Like [`tokenize`], but never fails: lexical errors stay in the stream
/// as [`TokenKind::Invalid`] tokens. Meant for syntax highlighting.
#[must_use]
pub fn tokenize_lossy(input: &str) -> Vec<Token> {
    compound::resolve(input, scan(input))
}

/// Raw scan without keyword resolution; every word is an identifier.
#[must_use]
pub fn scan(input: &str) -> Vec<Token> {
    Lexer::new(input).run()
}

fn invalid_to_error(token: &Token) -> Option<LexError> {
    match &token.kind {
        TokenKind::Invalid(kind) => Some(LexError {
            kind: kind.clone(),
            span: token.span,
        }),
        _ => None,
    }
}

#[derive(Clone, Copy)]
struct Mark {
    pos: usize,
    line: usize,
    col: usize,
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    col: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        let start = if input.starts_with('\u{FEFF}') {
            '\u{FEFF}'.len_utf8()
        } else {
            0
        };
        Self {
            input,
            pos: start,
            line: 1,
            col: 1,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        while let Some(ch) = self.peek() {
            let start = self.mark();
            match ch {
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                '\n' => {
                    self.advance();
                    self.push(TokenKind::Newline, start);
                }
                '/' if self.peek_at(1) == Some('/') => self.read_line_comment(start),
                '/' if self.peek_at(1) == Some('*') => self.read_block_comment(start),
                '"' | '\'' => self.read_string(ch, start),
                c if c.is_ascii_digit() => self.read_number(start),
                c if c.is_alphabetic() || c == '_' => self.read_word(start),
                _ => self.read_symbol(ch, start),
            }
        }
        self.tokens
    }

    const fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            col: self.col,
        }
    }

    const fn span_from(&self, start: Mark) -> Span {
        Span {
            start: start.pos,
            end: self.pos,
            line: start.line,
            column: start.col,
            end_line: self.line,
            end_column: self.col,
        }
    }

    fn push(&mut self, kind: TokenKind, start: Mark) {
        self.tokens.push(Token {
            kind,
            text: self.input[start.pos..self.pos].to_string(),
            span: self.span_from(start),
        });
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn read_line_comment(&mut self, start: Mark) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
        self.push(TokenKind::Comment, start);
    }

    fn read_block_comment(&mut self, start: Mark) {
        self.advance(); // /
        self.advance(); // *
        loop {
            match self.advance() {
                None => {
                    self.push(TokenKind::Invalid(LexErrorKind::UnterminatedComment), start);
                    return;
                }
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    break;
                }
                Some(_) => {}
            }
        }
        self.push(TokenKind::Comment, start);
    }

    fn read_string(&mut self, quote: char, start: Mark) {
        self.advance(); // opening quote

        let mut value = String::new();
        loop {
            match self.advance() {
                None => {
                    self.push(TokenKind::Invalid(LexErrorKind::UnterminatedString), start);
                    return;
                }
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('0') => value.push('\0'),
                    // \\, \", \' and unknown escapes keep the escaped character
                    Some(c) => value.push(c),
                    None => {
                        self.push(TokenKind::Invalid(LexErrorKind::UnterminatedString), start);
                        return;
                    }
                },
                Some(c) if c == quote => break,
                Some(c) => value.push(c),
            }
        }

        self.push(TokenKind::String(value), start);
    }

    fn read_number(&mut self, start: Mark) {
        self.consume_digits();
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            self.consume_digits();
        }
        let value = self.input[start.pos..self.pos]
            .parse::<f64>()
            .unwrap_or_default();
        self.push(TokenKind::Number(value), start);
    }

    fn consume_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn read_word(&mut self, start: Mark) {
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        self.push(TokenKind::Identifier, start);
    }

    fn read_symbol(&mut self, ch: char, start: Mark) {
        self.advance();
        let kind = match ch {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '?' => TokenKind::Question,
            '=' => {
                if self.eat('=') {
                    if self.eat('=') {
                        TokenKind::EqualEqualEqual
                    } else {
                        TokenKind::EqualEqual
                    }
                } else if self.eat('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Equal
                }
            }
            '!' => {
                if self.eat('=') {
                    if self.eat('=') {
                        TokenKind::BangEqualEqual
                    } else {
                        TokenKind::BangEqual
                    }
                } else {
                    TokenKind::Not
                }
            }
            '+' => {
                if self.eat('+') {
                    TokenKind::PlusPlus
                } else if self.eat('=') {
                    TokenKind::PlusEqual
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.eat('-') {
                    TokenKind::MinusMinus
                } else if self.eat('=') {
                    TokenKind::MinusEqual
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.eat('*') {
                    TokenKind::StarStar
                } else if self.eat('=') {
                    TokenKind::StarEqual
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.eat('=') {
                    TokenKind::SlashEqual
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.eat('=') {
                    TokenKind::PercentEqual
                } else {
                    TokenKind::Percent
                }
            }
            '<' => {
                if self.eat('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                if self.eat('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                }
            }
            other => TokenKind::Invalid(LexErrorKind::UnexpectedCharacter(other)),
        };
        self.push(kind, start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        scan(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn simple_words() {
        let tokens = scan("tien nome");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "tien");
        assert_eq!(tokens[1].text, "nome");
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Identifier));
    }

    #[test]
    fn accented_words() {
        let tokens = scan("sinnò sfòls dì");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].text, "sinnò");
        assert_eq!(tokens[2].text, "dì");
    }

    #[test]
    fn braces_and_newlines() {
        assert_eq!(
            kinds("{\n  x\n}\n"),
            vec![
                TokenKind::LeftBrace,
                TokenKind::Newline,
                TokenKind::Identifier,
                TokenKind::Newline,
                TokenKind::RightBrace,
                TokenKind::Newline,
            ]
        );
    }

    #[test]
    fn string_literals() {
        let tokens = scan(r#""Uè" 'guagliò'"#);
        assert_eq!(tokens[0].kind, TokenKind::String("Uè".to_string()));
        assert_eq!(tokens[0].text, "\"Uè\"");
        assert_eq!(tokens[1].kind, TokenKind::String("guagliò".to_string()));
    }

    #[test]
    fn string_escapes() {
        let tokens = scan(r#""a\n\t\"b\'\\\0\q""#);
        assert_eq!(
            tokens[0].kind,
            TokenKind::String("a\n\t\"b'\\\0q".to_string())
        );
    }

    #[test]
    fn string_spans_lines() {
        let tokens = scan("\"a\nb\" x");
        assert_eq!(tokens[0].kind, TokenKind::String("a\nb".to_string()));
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[1].span.column, 4);
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("42 2.5 7."),
            vec![
                TokenKind::Number(42.0),
                TokenKind::Number(2.5),
                TokenKind::Number(7.0),
                TokenKind::Dot,
            ]
        );
    }

    #[test]
    fn comments() {
        let tokens = scan("x // nota\n/* a\nb */ y");
        assert_eq!(tokens[1].kind, TokenKind::Comment);
        assert_eq!(tokens[1].text, "// nota");
        assert_eq!(tokens[3].kind, TokenKind::Comment);
        assert_eq!(tokens[3].text, "/* a\nb */");
        assert_eq!(tokens[4].span.line, 3);
    }

    #[test]
    fn operators_longest_match() {
        assert_eq!(
            kinds("=== == => = !== != ! ++ += + -- -= - ** *= * /= / %= % <= < >= >"),
            vec![
                TokenKind::EqualEqualEqual,
                TokenKind::EqualEqual,
                TokenKind::Arrow,
                TokenKind::Equal,
                TokenKind::BangEqualEqual,
                TokenKind::BangEqual,
                TokenKind::Not,
                TokenKind::PlusPlus,
                TokenKind::PlusEqual,
                TokenKind::Plus,
                TokenKind::MinusMinus,
                TokenKind::MinusEqual,
                TokenKind::Minus,
                TokenKind::StarStar,
                TokenKind::StarEqual,
                TokenKind::Star,
                TokenKind::SlashEqual,
                TokenKind::Slash,
                TokenKind::PercentEqual,
                TokenKind::Percent,
                TokenKind::LessEqual,
                TokenKind::Less,
                TokenKind::GreaterEqual,
                TokenKind::Greater,
            ]
        );
    }

    #[test]
    fn unterminated_string() {
        let err = tokenize("stamm a dì(\"ciao").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        assert_eq!(err.span.line, 1);
        assert_eq!(err.span.column, 12);
    }

    #[test]
    fn unterminated_comment() {
        let err = tokenize("x /* mai chiuso").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedComment);
        assert_eq!(err.span.column, 3);
    }

    #[test]
    fn unexpected_character() {
        let err = tokenize("tien x = 1 @ 2").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('@'));
        assert_eq!(err.span.column, 12);
        assert_eq!(
            err.to_string(),
            "unexpected character: @ at line 1, column 12"
        );
    }

    #[test]
    fn lossy_keeps_invalid_tokens() {
        let tokens = tokenize_lossy("x # y");
        assert_eq!(tokens.len(), 3);
        assert_eq!(
            tokens[1].kind,
            TokenKind::Invalid(LexErrorKind::UnexpectedCharacter('#'))
        );
        assert_eq!(tokens[2].text, "y");
    }

    #[test]
    fn lossy_unterminated_string_consumes_rest() {
        let tokens = tokenize_lossy("x 'abc\ndef");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].text, "'abc\ndef");
    }

    #[test]
    fn bom_stripping() {
        let tokens = scan("\u{FEFF}tien");
        assert_eq!(tokens[0].text, "tien");
        assert_eq!(tokens[0].span.column, 1);
    }

    #[test]
    fn span_tracking() {
        let tokens = scan("a\nbè c");
        assert_eq!(tokens[0].span.line, 1);
        assert_eq!(tokens[0].span.column, 1);
        // newline token
        assert_eq!(tokens[1].span.line, 1);
        assert_eq!(tokens[1].span.end_line, 2);
        assert_eq!(tokens[2].span.line, 2);
        assert_eq!(tokens[2].span.column, 1);
        assert_eq!(tokens[2].span.end_column, 3);
        assert_eq!(tokens[3].span.column, 4);
        assert_eq!(tokens[3].span.start, 6);
    }

    #[test]
    fn tokenize_resolves_keywords() {
        let tokens = tokenize("chist è x = 1").expect("should tokenize");
        assert_eq!(tokens[0].kind, TokenKind::Const);
        assert_eq!(tokens[0].text, "chist è");
        assert_eq!(tokens[1].text, "x");
    }
}
