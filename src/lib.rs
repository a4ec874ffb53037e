//! FratmScript to JavaScript compiler.
//!
//! FratmScript is JavaScript with Neapolitan keywords, several of which
//! span more than one word (`chist è`, `stamm a dì`, `e si schiatta`).
//! This crate lexes it, resolves the multi-word keywords, parses a typed
//! AST and prints equivalent JavaScript, optionally with a source map.
//!
//! # Quick start
//!
//! ```
//! use fratm::{compile, CompileOptions};
//!
//! let input = "chist è nome = \"Gennaro\"\nstamm a dì(nome)\n";
//! let output = compile(input, &CompileOptions::default()).unwrap();
//! assert_eq!(output.code, "const nome = \"Gennaro\";\nconsole.log(nome);\n");
//! ```
//!
//! ## Step by step, with a source map
//!
//! ```
//! use fratm::{CompileOptions, generate, parse, tokenize};
//!
//! let tokens = tokenize("tien x = 1").unwrap();
//! let program = parse(&tokens).unwrap();
//! let options = CompileOptions::new().source_map(true).filename("x.fratm");
//! let output = generate(&program, &options);
//! let map = output.source_map.unwrap();
//! assert_eq!(map.sources, vec!["x.fratm".to_string()]);
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod ast;
pub mod codegen;
pub mod compound;
pub mod delimiters;
pub mod diagnostics;
pub mod keywords;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod sourcemap;
pub mod token;

use log::debug;

pub use ast::{Expr, ExprKind, Program, Stmt, StmtKind};
pub use codegen::{Output, generate, generate_with_source};
pub use delimiters::check_delimiters;
pub use lexer::{LexError, LexErrorKind, tokenize, tokenize_lossy};
pub use options::CompileOptions;
pub use parser::{DEFAULT_MAX_DEPTH, ParseError, ParseErrorKind, parse, parse_with_limit};
pub use sourcemap::{SourceMap, SourceMapBuilder};
pub use token::{Span, Token, TokenKind};

/// Unified error type covering both lexing and parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A lexer error.
    #[error("{0}")]
    Lex(#[from] LexError),
    /// A parser error.
    #[error("{0}")]
    Parse(#[from] ParseError),
}

impl Error {
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Lex(err) => err.span,
            Self::Parse(err) => err.span,
        }
    }

    /// 1-indexed line of the error.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.span().line
    }

    /// 1-indexed column of the error, in characters.
    #[must_use]
    pub const fn column(&self) -> usize {
        self.span().column
    }

    /// The error message without its location.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Lex(err) => err.kind.to_string(),
            Self::Parse(err) => err.kind.to_string(),
        }
    }

    #[must_use]
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Lex(err) => err.kind.suggestion(),
            Self::Parse(err) => err.kind.suggestion(),
        }
    }
}

/// Compile FratmScript source to JavaScript in one step.
pub fn compile(source: &str, options: &CompileOptions) -> Result<Output, Error> {
    debug!("compiling {}", options.source_name());
    let tokens = tokenize(source)?;
    let program = parse_with_limit(&tokens, options.max_depth)?;
    Ok(generate_with_source(&program, source, options))
}

/// The crate version.
#[must_use]
pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_reports_lex_errors() {
        let err = compile("tien s = \"aperta", &CompileOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Lex(_)));
        assert_eq!((err.line(), err.column()), (1, 10));
        assert_eq!(err.message(), "unterminated string literal");
        assert_eq!(
            err.suggestion().as_deref(),
            Some("close the string with a matching quote")
        );
    }

    #[test]
    fn compile_reports_parse_errors() {
        let err = compile("chist x = 1", &CompileOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert_eq!(err.to_string(), "'chist' must be followed by 'è' at line 1, column 1");
        assert_eq!(err.suggestion().as_deref(), Some("write 'chist è'"));
    }

    #[test]
    fn compile_respects_depth_limit() {
        let source = format!("x = {}1{}", "(".repeat(12), ")".repeat(12));
        let options = CompileOptions::new().max_depth(8);
        let err = compile(&source, &options).unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ParseError {
                kind: ParseErrorKind::TooDeeplyNested { limit: 8 },
                ..
            })
        ));
        assert!(compile(&source, &CompileOptions::default()).is_ok());
    }

    #[test]
    fn compile_embeds_source_content() {
        let options = CompileOptions::new()
            .source_map(true)
            .include_source_content(true);
        let output = compile("tien x", &options).expect("should compile");
        let map = output.source_map.expect("source map");
        assert_eq!(map.sources_content, Some(vec![Some("tien x".to_string())]));
    }

    #[test]
    fn version_matches_manifest() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }
}
