//! The FratmScript keyword table.
//!
//! One static, read-only table maps every surface lexeme (one to three
//! words) to its token kind, together with the metadata editor tooling
//! needs for hover text, completion, and highlighting. The lexer's
//! compound resolver and the exported JSON artifact both read this table,
//! so the two can never disagree.

use serde::{Serialize, Serializer};

use crate::token::TokenKind;

/// Grouping used by editor tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Declaration,
    ControlFlow,
    Class,
    ErrorHandling,
    Module,
    Operator,
    Literal,
    Output,
}

/// Where a keyword is allowed to be recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Context {
    /// Recognized wherever the words appear.
    Anywhere,
    /// Only right after the closing brace of a `pruvamm` block.
    AfterTryBlock,
    /// Only right after `pe`.
    AfterFor,
}

/// A keyword table entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyword {
    /// Surface form, words separated by a single space.
    pub lexeme: &'static str,
    #[serde(rename = "tokenType", serialize_with = "serialize_kind")]
    pub kind: TokenKind,
    pub category: Category,
    /// JavaScript equivalent; empty for filler words.
    pub js: &'static str,
    pub description: &'static str,
    pub context: Context,
}

impl Keyword {
    /// The words making up the lexeme, in order.
    pub fn words(&self) -> impl Iterator<Item = &'static str> + use<> {
        self.lexeme.split(' ')
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        self.words().count()
    }

    #[must_use]
    pub fn first_word(&self) -> &'static str {
        self.lexeme.split(' ').next().unwrap_or(self.lexeme)
    }

    #[must_use]
    pub fn is_compound(&self) -> bool {
        self.lexeme.contains(' ')
    }
}

fn serialize_kind<S: Serializer>(kind: &TokenKind, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(kind.name())
}

const fn entry(
    lexeme: &'static str,
    kind: TokenKind,
    category: Category,
    js: &'static str,
    description: &'static str,
) -> Keyword {
    Keyword {
        lexeme,
        kind,
        category,
        js,
        description,
        context: Context::Anywhere,
    }
}

const fn contextual(
    lexeme: &'static str,
    kind: TokenKind,
    category: Category,
    js: &'static str,
    description: &'static str,
    context: Context,
) -> Keyword {
    Keyword {
        lexeme,
        kind,
        category,
        js,
        description,
        context,
    }
}

static KEYWORDS: &[Keyword] = &[
    // Declarations
    entry(
        "chist è",
        TokenKind::Const,
        Category::Declaration,
        "const",
        "Declares a constant: `chist è nome = \"Gennaro\"`.",
    ),
    entry(
        "tien",
        TokenKind::Let,
        Category::Declaration,
        "let",
        "Declares a variable that can be reassigned.",
    ),
    entry(
        "facc",
        TokenKind::Function,
        Category::Declaration,
        "function",
        "Declares a function: `facc saluta(nome) { ... }`.",
    ),
    entry(
        "piglie",
        TokenKind::Return,
        Category::Declaration,
        "return",
        "Returns a value from the current function.",
    ),
    entry(
        "mo vir",
        TokenKind::Async,
        Category::Declaration,
        "async",
        "Marks the following `facc` as asynchronous.",
    ),
    entry(
        "aspett",
        TokenKind::Await,
        Category::Declaration,
        "await",
        "Waits for a promise inside a `mo vir facc` function.",
    ),
    entry(
        "caccia",
        TokenKind::Yield,
        Category::Declaration,
        "yield",
        "Yields a value; the enclosing function becomes a generator.",
    ),
    // Control flow
    entry(
        "si",
        TokenKind::If,
        Category::ControlFlow,
        "if",
        "Conditional: `si (x > 0) { ... }`.",
    ),
    entry(
        "sinnò",
        TokenKind::Else,
        Category::ControlFlow,
        "else",
        "Alternative branch of a `si`.",
    ),
    entry(
        "mentre che",
        TokenKind::While,
        Category::ControlFlow,
        "while",
        "Loop while a condition holds: `mentre che (x < 10) { ... }`.",
    ),
    entry(
        "pe",
        TokenKind::For,
        Category::ControlFlow,
        "for",
        "Three-clause loop: `pe (tien i = 0; i < 10; i++) { ... }`.",
    ),
    contextual(
        "ogni",
        TokenKind::LoopFiller,
        Category::ControlFlow,
        "",
        "Optional filler after `pe`: `pe ogni (...)`.",
        Context::AfterFor,
    ),
    entry(
        "rompe",
        TokenKind::Break,
        Category::ControlFlow,
        "break",
        "Leaves the innermost loop.",
    ),
    entry(
        "salta",
        TokenKind::Continue,
        Category::ControlFlow,
        "continue",
        "Skips to the next loop iteration.",
    ),
    // Classes
    entry(
        "na famiglie",
        TokenKind::Class,
        Category::Class,
        "class",
        "Declares a class; `facc costruttore(...)` is its constructor.",
    ),
    entry(
        "nu bell",
        TokenKind::New,
        Category::Class,
        "new",
        "Creates an instance: `nu bell Persona(\"Ciro\")`.",
    ),
    entry(
        "stu cos",
        TokenKind::This,
        Category::Class,
        "this",
        "The current instance.",
    ),
    // Error handling
    entry(
        "pruvamm",
        TokenKind::Try,
        Category::ErrorHandling,
        "try",
        "Starts a protected block, closed by `e si schiatta`.",
    ),
    contextual(
        "e si schiatta",
        TokenKind::Catch,
        Category::ErrorHandling,
        "catch",
        "Handles an error thrown inside the preceding `pruvamm` block.",
        Context::AfterTryBlock,
    ),
    entry(
        "iett",
        TokenKind::Throw,
        Category::ErrorHandling,
        "throw",
        "Throws a value.",
    ),
    entry(
        "fermete",
        TokenKind::Debugger,
        Category::ErrorHandling,
        "debugger",
        "Pauses execution in an attached debugger.",
    ),
    // Modules
    entry(
        "chiamm",
        TokenKind::Import,
        Category::Module,
        "import",
        "Imports bindings: `chiamm { a, b } da \"./mod.js\"`.",
    ),
    entry(
        "da",
        TokenKind::From,
        Category::Module,
        "from",
        "Names the module an import comes from.",
    ),
    entry(
        "mann for",
        TokenKind::Export,
        Category::Module,
        "export",
        "Exports a declaration or, with `predefinit`, a default value.",
    ),
    entry(
        "predefinit",
        TokenKind::Default,
        Category::Module,
        "default",
        "Marks the default export.",
    ),
    // Operators
    entry(
        "e",
        TokenKind::And,
        Category::Operator,
        "&&",
        "Logical and.",
    ),
    entry(
        "pure",
        TokenKind::And,
        Category::Operator,
        "&&",
        "Logical and (alias of `e`).",
    ),
    entry("o", TokenKind::Or, Category::Operator, "||", "Logical or."),
    entry("no", TokenKind::Not, Category::Operator, "!", "Logical not."),
    entry(
        "manco",
        TokenKind::Not,
        Category::Operator,
        "!",
        "Logical not (alias of `no`).",
    ),
    entry(
        "leva",
        TokenKind::Delete,
        Category::Operator,
        "delete",
        "Removes a property from an object.",
    ),
    entry(
        "chè è",
        TokenKind::TypeOf,
        Category::Operator,
        "typeof",
        "The type name of a value.",
    ),
    // Literals
    entry(
        "overo",
        TokenKind::True,
        Category::Literal,
        "true",
        "Boolean true.",
    ),
    entry(
        "sfòls",
        TokenKind::False,
        Category::Literal,
        "false",
        "Boolean false.",
    ),
    entry(
        "nisciun",
        TokenKind::Null,
        Category::Literal,
        "null",
        "The null value.",
    ),
    entry(
        "boh",
        TokenKind::Undefined,
        Category::Literal,
        "undefined",
        "The undefined value.",
    ),
    // Output
    entry(
        "stamm a dì",
        TokenKind::Log,
        Category::Output,
        "console.log",
        "Prints to standard output: `stamm a dì(\"Uè!\")`.",
    ),
    entry(
        "avvis a dì",
        TokenKind::Warn,
        Category::Output,
        "console.warn",
        "Prints a warning.",
    ),
    entry(
        "scrive a dì",
        TokenKind::ErrorLog,
        Category::Output,
        "console.error",
        "Prints an error message.",
    ),
];

/// The whole keyword table.
#[must_use]
pub fn table() -> &'static [Keyword] {
    KEYWORDS
}

/// Find the entry for an exact lexeme (`"mentre che"`, `"tien"`).
#[must_use]
pub fn lookup(lexeme: &str) -> Option<&'static Keyword> {
    KEYWORDS.iter().find(|k| k.lexeme == lexeme)
}

/// Entries whose first word is `word`, longest lexeme first.
#[must_use]
pub fn compounds_starting_with(word: &str) -> Vec<&'static Keyword> {
    let mut found: Vec<_> = KEYWORDS.iter().filter(|k| k.first_word() == word).collect();
    found.sort_by_key(|k| std::cmp::Reverse(k.word_count()));
    found
}

/// The compound a dangling head word belongs to.
///
/// Returns `None` when `word` is a keyword on its own (`e`, `pe`), since
/// then its standalone reading is valid.
#[must_use]
pub fn completion_for(word: &str) -> Option<&'static Keyword> {
    let candidates = compounds_starting_with(word);
    if candidates.iter().any(|k| !k.is_compound()) {
        return None;
    }
    candidates.into_iter().next()
}

/// Serialize the table as the JSON artifact consumed by editor tooling.
pub fn to_json() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(KEYWORDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexemes_are_unique() {
        for (i, a) in KEYWORDS.iter().enumerate() {
            for b in &KEYWORDS[i + 1..] {
                assert_ne!(a.lexeme, b.lexeme, "duplicate entry");
            }
        }
    }

    #[test]
    fn every_entry_is_a_keyword_kind() {
        for k in KEYWORDS {
            assert!(k.kind.is_keyword(), "{} maps to {:?}", k.lexeme, k.kind);
        }
    }

    #[test]
    fn compounds_have_at_most_three_words() {
        for k in KEYWORDS {
            assert!((1..=3).contains(&k.word_count()), "{}", k.lexeme);
        }
    }

    #[test]
    fn longest_compound_first() {
        let found = compounds_starting_with("e");
        assert_eq!(found[0].lexeme, "e si schiatta");
        assert_eq!(found[1].lexeme, "e");
    }

    #[test]
    fn completion_for_dangling_heads() {
        assert_eq!(completion_for("chist").map(|k| k.lexeme), Some("chist è"));
        assert_eq!(completion_for("stamm").map(|k| k.lexeme), Some("stamm a dì"));
        assert_eq!(completion_for("nu").map(|k| k.lexeme), Some("nu bell"));
        assert!(completion_for("e").is_none());
        assert!(completion_for("pizza").is_none());
    }

    #[test]
    fn json_artifact_lists_every_entry() {
        let json = to_json().expect("serialize");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        let entries = value.as_array().expect("array");
        assert_eq!(entries.len(), KEYWORDS.len());
        assert_eq!(entries[0]["lexeme"], "chist è");
        assert_eq!(entries[0]["tokenType"], "const-intro");
        assert_eq!(entries[0]["category"], "declaration");
    }
}
