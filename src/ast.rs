use crate::token::Span;

/// A whole source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// A name together with where it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

/// Brace-delimited statement list.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    VarDecl(VarDecl),
    FunctionDecl(Function),
    ClassDecl(Class),
    Return(Option<Expr>),
    /// `si` with any number of `sinnò si` arms, kept flat.
    If {
        branches: Vec<IfBranch>,
        alternate: Option<Else>,
    },
    While {
        test: Expr,
        body: Block,
    },
    For {
        init: Option<ForInit>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Block,
    },
    Break,
    Continue,
    Debugger,
    Try {
        block: Block,
        /// The `e si schiatta` keyword.
        catch_keyword: Span,
        catch_param: Option<Ident>,
        handler: Block,
    },
    Throw(Expr),
    Import(Import),
    Export(Exported),
    Block(Block),
    Expression(Expr),
}

/// `chist è x = ...` (immutable) or `tien x = ...` (mutable).
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub mutable: bool,
    pub name: Ident,
    pub init: Option<Expr>,
}

/// Function declaration or class method.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Ident,
    pub params: Vec<Ident>,
    pub body: Block,
    pub is_async: bool,
    /// Set when the body contains `caccia` outside any nested function.
    pub is_generator: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub name: Ident,
    pub constructor: Option<Function>,
    pub methods: Vec<Function>,
}

/// One tested arm of an if statement.
#[derive(Debug, Clone, PartialEq)]
pub struct IfBranch {
    /// The `sinnò` before an else-if arm; `None` on the first arm.
    pub else_keyword: Option<Span>,
    /// The `si` keyword.
    pub keyword: Span,
    pub test: Expr,
    pub consequent: Block,
}

/// Final `sinnò { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Else {
    pub keyword: Span,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    Declaration(VarDecl),
    Expression(Expr),
}

/// `chiamm { a, b } da "src"` or `chiamm a da "src"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub names: Vec<Ident>,
    pub source: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Exported {
    /// `mann for <declaration>`
    Declaration(Box<Stmt>),
    /// `mann for predefinit <expression>`
    Default(Expr),
}

impl Exported {
    #[must_use]
    pub const fn is_default(&self) -> bool {
        matches!(self, Self::Default(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Identifier(String),
    This,
    Array(Vec<Expr>),
    Object(Vec<Property>),
    Binary {
        op: BinaryOp,
        op_span: Span,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        op_span: Span,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        argument: Box<Expr>,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        argument: Box<Expr>,
    },
    Delete(Box<Expr>),
    Await(Box<Expr>),
    Yield(Option<Box<Expr>>),
    Assignment {
        op: AssignOp,
        op_span: Span,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    New {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: MemberProperty,
    },
    Arrow {
        params: Vec<Ident>,
        body: ArrowBody,
    },
    Console {
        method: ConsoleMethod,
        arguments: Vec<Expr>,
    },
}

impl ExprKind {
    /// Whether the expression may appear on the left of an assignment or
    /// as the operand of `++`/`--`.
    #[must_use]
    pub const fn is_assignable(&self) -> bool {
        matches!(self, Self::Identifier(_) | Self::Member { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Bool(bool),
    Null,
    Undefined,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: PropertyKey,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKey {
    /// Bare word key, including keyword words like `si`.
    Identifier(String),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberProperty {
    /// `obj.name`
    Named(Ident),
    /// `obj[expr]`
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrowBody {
    Expression(Box<Expr>),
    Block(Block),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Exp,
    Eq,
    StrictEq,
    NotEq,
    StrictNotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
}

impl BinaryOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Exp => "**",
            Self::Eq => "==",
            Self::StrictEq => "===",
            Self::NotEq => "!=",
            Self::StrictNotEq => "!==",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
    TypeOf,
}

impl UnaryOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Negate => "-",
            Self::Not => "!",
            Self::TypeOf => "typeof ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

impl UpdateOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Increment => "++",
            Self::Decrement => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl AssignOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::Add => "+=",
            Self::Sub => "-=",
            Self::Mul => "*=",
            Self::Div => "/=",
            Self::Rem => "%=",
        }
    }
}

/// `stamm a dì`, `avvis a dì`, `scrive a dì`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleMethod {
    Log,
    Warn,
    Error,
}

impl ConsoleMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}
