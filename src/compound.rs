//! Compound keyword resolution.
//!
//! Runs over the raw token stream and rewrites words into keyword tokens.
//! A keyword's words must be consecutive tokens, so a newline or comment
//! between them breaks the compound and each word is read on its own.

use log::trace;

use crate::keywords::{self, Context, Keyword};
use crate::token::{Token, TokenKind};

/// Resolve keywords in a raw token stream produced by [`crate::lexer::scan`].
///
/// `source` must be the text the tokens were scanned from; merged compound
/// tokens take their text from it so inner whitespace is preserved.
#[must_use]
pub fn resolve(source: &str, tokens: Vec<Token>) -> Vec<Token> {
    Resolver::new(source).run(tokens)
}

struct Resolver<'a> {
    source: &'a str,
    out: Vec<Token>,
    /// One entry per open `{`: whether it opened a `pruvamm` block.
    braces: Vec<bool>,
    /// The last significant token was `pruvamm`.
    try_pending: bool,
    /// The last significant token closed a `pruvamm` block.
    after_try: bool,
}

impl<'a> Resolver<'a> {
    const fn new(source: &'a str) -> Self {
        Self {
            source,
            out: Vec::new(),
            braces: Vec::new(),
            try_pending: false,
            after_try: false,
        }
    }

    fn run(mut self, tokens: Vec<Token>) -> Vec<Token> {
        self.out.reserve(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            let token = if tokens[i].kind == TokenKind::Identifier {
                match self.match_keyword(&tokens[i..]) {
                    Some((keyword, len)) => {
                        let merged = self.merge(keyword, &tokens[i..i + len]);
                        i += len;
                        merged
                    }
                    None => {
                        i += 1;
                        tokens[i - 1].clone()
                    }
                }
            } else {
                i += 1;
                tokens[i - 1].clone()
            };
            self.track(&token);
            self.out.push(token);
        }
        self.out
    }

    fn previous_significant(&self) -> Option<&TokenKind> {
        self.out
            .iter()
            .rev()
            .map(|t| &t.kind)
            .find(|k| !k.is_trivia())
    }

    fn context_holds(&self, context: Context) -> bool {
        match context {
            Context::Anywhere => true,
            Context::AfterTryBlock => self.after_try,
            Context::AfterFor => matches!(self.previous_significant(), Some(TokenKind::For)),
        }
    }

    /// Longest table entry whose words start at `tokens[0]`.
    fn match_keyword(&self, tokens: &[Token]) -> Option<(&'static Keyword, usize)> {
        let head = &tokens[0].text;
        keywords::compounds_starting_with(head)
            .into_iter()
            .find(|keyword| {
                let len = keyword.word_count();
                len <= tokens.len()
                    && keyword
                        .words()
                        .zip(&tokens[..len])
                        .all(|(word, t)| t.kind == TokenKind::Identifier && t.text == word)
                    && self.context_holds(keyword.context)
            })
            .map(|keyword| (keyword, keyword.word_count()))
    }

    fn merge(&self, keyword: &Keyword, words: &[Token]) -> Token {
        let first = &words[0];
        let last = &words[words.len() - 1];
        let span = first.span.to(last.span);
        if words.len() > 1 {
            trace!(
                "resolved compound `{}` at line {}, column {}",
                keyword.lexeme, span.line, span.column
            );
        }
        Token {
            kind: keyword.kind.clone(),
            text: self.source[span.start..span.end].to_string(),
            span,
        }
    }

    fn track(&mut self, token: &Token) {
        if token.kind.is_trivia() {
            return;
        }
        self.after_try = false;
        match token.kind {
            TokenKind::LeftBrace => {
                self.braces.push(self.try_pending);
                self.try_pending = false;
            }
            TokenKind::RightBrace => {
                self.after_try = self.braces.pop().unwrap_or(false);
                self.try_pending = false;
            }
            TokenKind::Try => self.try_pending = true,
            _ => self.try_pending = false,
        }
    }
}
