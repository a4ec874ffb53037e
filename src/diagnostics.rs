//! Serializable results for hosts that cannot take a Rust `Result`:
//! editors, playgrounds, and other tools that exchange JSON.
//!
//! Nothing here panics or returns an error; every failure becomes data.

use serde::Serialize;

use crate::lexer::tokenize_lossy;
use crate::options::CompileOptions;
use crate::token::TokenKind;
use crate::{Error, compile};

/// Outcome of [`compile_response`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Source map as JSON text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_map: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl CompileResponse {
    fn failure(diagnostic: Diagnostic) -> Self {
        Self {
            success: false,
            error: Some(diagnostic.message),
            line: Some(diagnostic.line),
            column: Some(diagnostic.column),
            suggestion: diagnostic.suggestion,
            ..Self::default()
        }
    }
}

/// A located, human-readable failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl From<&Error> for Diagnostic {
    fn from(err: &Error) -> Self {
        Self {
            message: err.message(),
            line: err.line(),
            column: err.column(),
            suggestion: err.suggestion(),
        }
    }
}

/// Compile `source` and fold the result into a [`CompileResponse`].
#[must_use]
pub fn compile_response(source: &str, generate_source_map: bool) -> CompileResponse {
    let options = CompileOptions::new().source_map(generate_source_map);
    let output = match compile(source, &options) {
        Ok(output) => output,
        Err(err) => return CompileResponse::failure(Diagnostic::from(&err)),
    };
    let source_map = match output
        .source_map
        .as_ref()
        .map(crate::SourceMap::to_json)
        .transpose()
    {
        Ok(json) => json,
        Err(err) => {
            return CompileResponse::failure(Diagnostic {
                message: format!("could not serialize source map: {err}"),
                line: 1,
                column: 1,
                suggestion: None,
            });
        }
    };
    CompileResponse {
        success: true,
        code: Some(output.code),
        source_map,
        ..CompileResponse::default()
    }
}

/// One highlighted token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
    /// Length in characters.
    pub length: usize,
}

/// Every token of `source` in order, including comments and invalid
/// input. Newlines are left out.
#[must_use]
pub fn token_infos(source: &str) -> Vec<TokenInfo> {
    tokenize_lossy(source)
        .into_iter()
        .filter(|token| token.kind != TokenKind::Newline)
        .map(|token| TokenInfo {
            kind: token.kind.name(),
            length: token.char_len(),
            line: token.span.line,
            column: token.span.column,
            lexeme: token.text,
        })
        .collect()
}

/// The crate version, for hosts that report it alongside results.
#[must_use]
pub const fn version() -> &'static str {
    crate::version()
}
