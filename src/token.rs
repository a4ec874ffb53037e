use crate::lexer::LexErrorKind;

/// Source location of a token or AST node.
///
/// `start..end` is a half-open byte range. `line`/`column` locate the first
/// character and `end_line`/`end_column` the position just past the last
/// one. Lines and columns are 1-indexed; columns count characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Span {
    /// Span covering `self` through the end of `other`.
    #[must_use]
    pub const fn to(self, other: Self) -> Self {
        Self {
            start: self.start,
            end: other.end,
            line: self.line,
            column: self.column,
            end_line: other.end_line,
            end_column: other.end_column,
        }
    }

    /// Empty span positioned at the end of `self`.
    #[must_use]
    pub const fn end_point(self) -> Self {
        Self {
            start: self.end,
            end: self.end,
            line: self.end_line,
            column: self.end_column,
            end_line: self.end_line,
            end_column: self.end_column,
        }
    }

    /// Length in bytes.
    #[must_use]
    pub const fn len(self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }
}

impl Default for Span {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            line: 1,
            column: 1,
            end_line: 1,
            end_column: 1,
        }
    }
}

/// Token kinds produced by the lexer and the compound resolver.
///
/// The lexer only ever produces `Identifier` for words; keyword kinds are
/// assigned afterwards by [`crate::compound::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier,

    /// `chist è`
    Const,
    /// `tien`
    Let,
    /// `facc`
    Function,
    /// `piglie`
    Return,
    /// `mo vir`
    Async,
    /// `aspett`
    Await,
    /// `caccia`
    Yield,
    /// `si`
    If,
    /// `sinnò`
    Else,
    /// `mentre che`
    While,
    /// `pe`
    For,
    /// `ogni`, accepted and discarded after `pe`.
    LoopFiller,
    /// `rompe`
    Break,
    /// `salta`
    Continue,
    /// `na famiglie`
    Class,
    /// `nu bell`
    New,
    /// `stu cos`
    This,
    /// `pruvamm`
    Try,
    /// `e si schiatta`
    Catch,
    /// `iett`
    Throw,
    /// `fermete`
    Debugger,
    /// `chiamm`
    Import,
    /// `da`
    From,
    /// `mann for`
    Export,
    /// `predefinit`
    Default,
    /// `leva`
    Delete,
    /// `chè è`
    TypeOf,
    /// `e`, `pure`
    And,
    /// `o`
    Or,
    /// `no`, `manco`, `!`
    Not,
    /// `overo`
    True,
    /// `sfòls`
    False,
    /// `nisciun`
    Null,
    /// `boh`
    Undefined,
    /// `stamm a dì`
    Log,
    /// `avvis a dì`
    Warn,
    /// `scrive a dì`
    ErrorLog,

    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,
    Colon,
    Semicolon,
    Question,
    Arrow,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    StarStar,
    PlusPlus,
    MinusMinus,
    EqualEqual,
    EqualEqualEqual,
    BangEqual,
    BangEqualEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,

    /// String literal with escapes decoded.
    String(String),
    /// Decimal numeric literal.
    Number(f64),
    /// `// ...` or `/* ... */`.
    Comment,
    /// Line separator (`\n`).
    Newline,
    /// Lexically invalid input, only kept by [`crate::lexer::tokenize_lossy`].
    Invalid(LexErrorKind),
}

impl TokenKind {
    /// Stable type name used by editor tooling.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::Const => "const-intro",
            Self::Let => "let",
            Self::Function => "function",
            Self::Return => "return",
            Self::Async => "async-intro",
            Self::Await => "await",
            Self::Yield => "yield",
            Self::If => "if",
            Self::Else => "else",
            Self::While => "while",
            Self::For => "for",
            Self::LoopFiller => "loop-filler",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::Class => "class-intro",
            Self::New => "new-intro",
            Self::This => "this-intro",
            Self::Try => "try",
            Self::Catch => "catch-intro",
            Self::Throw => "throw",
            Self::Debugger => "debugger",
            Self::Import => "import",
            Self::From => "from",
            Self::Export => "export",
            Self::Default => "default",
            Self::Delete => "delete",
            Self::TypeOf => "typeof",
            Self::And => "logical-and",
            Self::Or => "logical-or",
            Self::Not => "logical-not",
            Self::True => "literal-true",
            Self::False => "literal-false",
            Self::Null => "literal-null",
            Self::Undefined => "literal-undefined",
            Self::Log => "console-log",
            Self::Warn => "console-warn",
            Self::ErrorLog => "console-error",
            Self::LeftParen
            | Self::RightParen
            | Self::LeftBrace
            | Self::RightBrace
            | Self::LeftBracket
            | Self::RightBracket
            | Self::Comma
            | Self::Dot
            | Self::Colon
            | Self::Semicolon
            | Self::Question
            | Self::Arrow => "punctuation",
            Self::Plus
            | Self::Minus
            | Self::Star
            | Self::Slash
            | Self::Percent
            | Self::StarStar
            | Self::PlusPlus
            | Self::MinusMinus
            | Self::EqualEqual
            | Self::EqualEqualEqual
            | Self::BangEqual
            | Self::BangEqualEqual
            | Self::Less
            | Self::Greater
            | Self::LessEqual
            | Self::GreaterEqual
            | Self::Equal
            | Self::PlusEqual
            | Self::MinusEqual
            | Self::StarEqual
            | Self::SlashEqual
            | Self::PercentEqual => "operator",
            Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::Comment => "comment",
            Self::Newline => "newline",
            Self::Invalid(_) => "invalid",
        }
    }

    /// Comments and newlines, which the parser mostly steps over.
    #[must_use]
    pub const fn is_trivia(&self) -> bool {
        matches!(self, Self::Comment | Self::Newline)
    }

    #[must_use]
    pub const fn is_punctuation(&self) -> bool {
        matches!(
            self,
            Self::LeftParen
                | Self::RightParen
                | Self::LeftBrace
                | Self::RightBrace
                | Self::LeftBracket
                | Self::RightBracket
                | Self::Comma
                | Self::Dot
                | Self::Colon
                | Self::Semicolon
                | Self::Question
                | Self::Arrow
        )
    }

    /// True for every kind assigned from the keyword table.
    #[must_use]
    pub const fn is_keyword(&self) -> bool {
        !matches!(
            self,
            Self::Identifier
                | Self::String(_)
                | Self::Number(_)
                | Self::Comment
                | Self::Newline
                | Self::Invalid(_)
        ) && !self.is_punctuation()
            && !self.is_operator()
    }

    #[must_use]
    pub const fn is_operator(&self) -> bool {
        matches!(
            self,
            Self::Plus
                | Self::Minus
                | Self::Star
                | Self::Slash
                | Self::Percent
                | Self::StarStar
                | Self::PlusPlus
                | Self::MinusMinus
                | Self::EqualEqual
                | Self::EqualEqualEqual
                | Self::BangEqual
                | Self::BangEqualEqual
                | Self::Less
                | Self::Greater
                | Self::LessEqual
                | Self::GreaterEqual
                | Self::Equal
                | Self::PlusEqual
                | Self::MinusEqual
                | Self::StarEqual
                | Self::SlashEqual
                | Self::PercentEqual
        )
    }
}

/// A single token with its kind, exact source text, and location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    /// Length of the token in characters.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
