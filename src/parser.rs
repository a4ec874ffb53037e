use std::fmt;

use log::debug;

use crate::ast::{
    ArrowBody, AssignOp, BinaryOp, Block, Class, ConsoleMethod, Else, Exported, Expr, ExprKind,
    ForInit, Function, Ident, IfBranch, Import, Literal, LogicalOp, MemberProperty, Program, Property,
    PropertyKey, Stmt, StmtKind, UnaryOp, UpdateOp, VarDecl,
};
use crate::delimiters::check_delimiters;
use crate::keywords;
use crate::token::{Span, Token, TokenKind};

/// Nesting limit used by [`parse`].
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Classifies a parser error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A token that cannot appear here. `found` is already quoted.
    UnexpectedToken { expected: String, found: String },
    /// Input ended in the middle of a construct.
    UnexpectedEof { expected: String },
    /// The first word of a compound keyword without the words that
    /// complete it, e.g. `chist` without `è`.
    MissingCompoundPartner {
        head: String,
        partner: &'static str,
    },
    /// A `pruvamm` block not followed by `e si schiatta`.
    MissingCatch,
    /// Net count (opens minus closes) per delimiter kind.
    UnbalancedDelimiters {
        braces: i64,
        parens: i64,
        brackets: i64,
    },
    InvalidAssignmentTarget,
    DuplicateConstructor { class: String },
    YieldOutsideFunction,
    TooDeeplyNested { limit: usize },
}

impl ParseErrorKind {
    /// A short hint on how to fix the error, when one is known.
    #[must_use]
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::MissingCompoundPartner { head, partner } => {
                Some(format!("write '{head} {partner}'"))
            }
            Self::MissingCatch => {
                Some("add 'e si schiatta { ... }' after the 'pruvamm' block".to_string())
            }
            Self::UnbalancedDelimiters {
                braces,
                parens,
                brackets,
            } => [(*braces, '}'), (*parens, ')'), (*brackets, ']')]
                .into_iter()
                .find(|(n, _)| *n != 0)
                .map(|(n, close)| {
                    if n > 0 {
                        format!("add {n} closing '{close}'")
                    } else {
                        format!("remove {} extra '{close}'", -n)
                    }
                }),
            Self::InvalidAssignmentTarget => {
                Some("only variables and properties can be assigned".to_string())
            }
            Self::DuplicateConstructor { .. } => {
                Some("keep a single 'costruttore' per class".to_string())
            }
            Self::YieldOutsideFunction => Some("use 'caccia' inside a 'facc' body".to_string()),
            Self::TooDeeplyNested { .. } => {
                Some("split the code into smaller functions or shorter expressions".to_string())
            }
            Self::UnexpectedToken { .. } | Self::UnexpectedEof { .. } => None,
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken { expected, found } => {
                write!(f, "expected {expected}, got {found}")
            }
            Self::UnexpectedEof { expected } => {
                write!(f, "unexpected end of input, expected {expected}")
            }
            Self::MissingCompoundPartner { head, partner } => {
                write!(f, "'{head}' must be followed by '{partner}'")
            }
            Self::MissingCatch => {
                write!(f, "'pruvamm' block must be followed by 'e si schiatta'")
            }
            Self::UnbalancedDelimiters {
                braces,
                parens,
                brackets,
            } => {
                let parts: Vec<String> = [(*braces, '}'), (*parens, ')'), (*brackets, ']')]
                    .into_iter()
                    .filter(|(n, _)| *n != 0)
                    .map(|(n, close)| {
                        if n > 0 {
                            format!("missing {n} closing '{close}'")
                        } else {
                            format!("{} unmatched closing '{close}'", -n)
                        }
                    })
                    .collect();
                write!(f, "unbalanced delimiters: {}", parts.join(", "))
            }
            Self::InvalidAssignmentTarget => {
                write!(f, "invalid assignment target")
            }
            Self::DuplicateConstructor { class } => {
                write!(f, "class '{class}' has more than one constructor")
            }
            Self::YieldOutsideFunction => {
                write!(f, "'caccia' outside a function")
            }
            Self::TooDeeplyNested { limit } => {
                write!(f, "code nested deeper than {limit} levels")
            }
        }
    }
}

/// Error produced during parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

/// Parse a resolved token stream into a `Program`.
///
/// Delimiter balance is checked first, so an unclosed `{` is reported as
/// such rather than as whatever token the grammar trips over.
///
/// # Errors
///
/// Returns the first `ParseError` found; there is no recovery.
pub fn parse(tokens: &[Token]) -> Result<Program, ParseError> {
    parse_with_limit(tokens, DEFAULT_MAX_DEPTH)
}

/// [`parse`] with an explicit nesting limit.
pub fn parse_with_limit(tokens: &[Token], max_depth: usize) -> Result<Program, ParseError> {
    check_delimiters(tokens)?;
    let program = Parser::new(tokens, max_depth).parse_program()?;
    debug!("parsed {} top-level statements", program.body.len());
    Ok(program)
}

/// Function-like scopes, innermost last.
enum Scope {
    Function { yields: bool },
    Arrow,
}

enum Prefix {
    Unary(UnaryOp),
    Update(UpdateOp),
    Delete,
    Await,
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    /// Index of the last consumed significant token.
    last: Option<usize>,
    /// Open `(`, `[` or object `{` around the cursor; newlines are
    /// insignificant while this is non-zero.
    nesting: usize,
    depth: usize,
    max_depth: usize,
    scopes: Vec<Scope>,
    /// First token of the expression statement being parsed.
    stmt_start: Option<usize>,
}

impl<'a> Parser<'a> {
    const fn new(tokens: &'a [Token], max_depth: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            last: None,
            nesting: 0,
            depth: 0,
            max_depth,
            scopes: Vec::new(),
            stmt_start: None,
        }
    }

    fn parse_program(mut self) -> Result<Program, ParseError> {
        let mut body = Vec::new();
        loop {
            self.skip_separators();
            if self.peek().is_none() {
                break;
            }
            body.push(self.parse_statement()?);
        }
        let span = match (self.tokens.first(), self.tokens.last()) {
            (Some(first), Some(last)) => first.span.to(last.span),
            _ => Span::default(),
        };
        Ok(Program { body, span })
    }

    // Statements

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let Some(token) = self.peek() else {
            return Err(self.error_here("statement"));
        };
        let start = token.span;
        let kind = match token.kind {
            TokenKind::Const | TokenKind::Let => {
                let decl = self.parse_var_decl()?;
                self.expect_terminator()?;
                StmtKind::VarDecl(decl)
            }
            TokenKind::Function | TokenKind::Async => StmtKind::FunctionDecl(self.parse_function()?),
            TokenKind::Class => StmtKind::ClassDecl(self.parse_class()?),
            TokenKind::Return => {
                self.advance();
                let argument = if self.at_terminator() {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.expect_terminator()?;
                StmtKind::Return(argument)
            }
            TokenKind::If => self.parse_if()?,
            TokenKind::While => {
                self.advance();
                let test = self.parse_condition()?;
                let body = self.parse_block()?;
                StmtKind::While { test, body }
            }
            TokenKind::For => self.parse_for()?,
            TokenKind::Break | TokenKind::Continue | TokenKind::Debugger => {
                let kind = match token.kind {
                    TokenKind::Break => StmtKind::Break,
                    TokenKind::Continue => StmtKind::Continue,
                    _ => StmtKind::Debugger,
                };
                self.advance();
                self.expect_terminator()?;
                kind
            }
            TokenKind::Try => self.parse_try()?,
            TokenKind::Throw => {
                self.advance();
                let argument = self.parse_expression()?;
                self.expect_terminator()?;
                StmtKind::Throw(argument)
            }
            TokenKind::Import => self.parse_import()?,
            TokenKind::Export => self.parse_export()?,
            TokenKind::LeftBrace => StmtKind::Block(self.parse_block()?),
            _ => StmtKind::Expression(self.parse_expression_statement()?),
        };
        Ok(Stmt {
            kind,
            span: start.to(self.prev_span()),
        })
    }

    fn parse_var_decl(&mut self) -> Result<VarDecl, ParseError> {
        let mutable = self.advance().is_some_and(|t| t.kind == TokenKind::Let);
        let name = self.expect_ident()?;
        let init = if self.eat(&TokenKind::Equal) {
            self.skip_newlines();
            Some(self.parse_expression()?)
        } else if mutable {
            None
        } else {
            return Err(self.error_here("'='"));
        };
        Ok(VarDecl {
            mutable,
            name,
            init,
        })
    }

    fn parse_function(&mut self) -> Result<Function, ParseError> {
        let start = self.peek_span();
        let is_async = self.eat(&TokenKind::Async);
        self.expect(&TokenKind::Function, "'facc'")?;
        let name = self.expect_ident()?;
        let params = self.parse_params()?;

        self.scopes.push(Scope::Function { yields: false });
        let body = self.parse_block();
        let scope = self.scopes.pop();
        let body = body?;

        Ok(Function {
            name,
            params,
            body,
            is_async,
            is_generator: matches!(scope, Some(Scope::Function { yields: true })),
            span: start.to(self.prev_span()),
        })
    }

    fn parse_params(&mut self) -> Result<Vec<Ident>, ParseError> {
        self.expect(&TokenKind::LeftParen, "'('")?;
        self.nested(|p| {
            let mut params = Vec::new();
            loop {
                if p.eat(&TokenKind::RightParen) {
                    break;
                }
                params.push(p.expect_ident()?);
                if !p.eat(&TokenKind::Comma) {
                    p.expect(&TokenKind::RightParen, "')'")?;
                    break;
                }
            }
            Ok(params)
        })
    }

    fn parse_class(&mut self) -> Result<Class, ParseError> {
        self.advance(); // na famiglie
        let name = self.expect_ident()?;
        self.skip_newlines();
        self.expect(&TokenKind::LeftBrace, "'{'")?;

        let mut constructor = None;
        let mut methods = Vec::new();
        loop {
            self.skip_separators();
            match self.peek_kind() {
                Some(TokenKind::RightBrace) => {
                    self.advance();
                    break;
                }
                Some(TokenKind::Function | TokenKind::Async) => {
                    let method = self.parse_function()?;
                    if !matches!(method.name.name.as_str(), "costruttore" | "constructor") {
                        methods.push(method);
                    } else if constructor.is_some() {
                        return Err(ParseError {
                            kind: ParseErrorKind::DuplicateConstructor {
                                class: name.name.clone(),
                            },
                            span: method.name.span,
                        });
                    } else {
                        constructor = Some(method);
                    }
                }
                _ => return Err(self.error_here("'facc' or '}'")),
            }
        }

        Ok(Class {
            name,
            constructor,
            methods,
        })
    }

    fn parse_if(&mut self) -> Result<StmtKind, ParseError> {
        let mut branches = vec![self.parse_if_branch(None)?];
        let mut alternate = None;
        while self.peek_past_newlines() == Some(&TokenKind::Else) {
            self.skip_newlines();
            let else_keyword = self.peek_span();
            self.advance();
            if self.check(&TokenKind::If) {
                branches.push(self.parse_if_branch(Some(else_keyword))?);
            } else {
                alternate = Some(Else {
                    keyword: else_keyword,
                    body: self.parse_block()?,
                });
                break;
            }
        }
        Ok(StmtKind::If {
            branches,
            alternate,
        })
    }

    fn parse_if_branch(&mut self, else_keyword: Option<Span>) -> Result<IfBranch, ParseError> {
        let keyword = self.peek_span();
        self.advance(); // si
        let test = self.parse_condition()?;
        let consequent = self.parse_block()?;
        Ok(IfBranch {
            else_keyword,
            keyword,
            test,
            consequent,
        })
    }

    fn parse_for(&mut self) -> Result<StmtKind, ParseError> {
        self.advance(); // pe
        self.eat(&TokenKind::LoopFiller);
        self.expect(&TokenKind::LeftParen, "'('")?;
        let (init, test, update) = self.nested(|p| {
            let init = match p.peek_kind() {
                Some(TokenKind::Semicolon) => None,
                Some(TokenKind::Const | TokenKind::Let) => {
                    Some(ForInit::Declaration(p.parse_var_decl()?))
                }
                _ => Some(ForInit::Expression(p.parse_expression()?)),
            };
            p.expect(&TokenKind::Semicolon, "';'")?;
            let test = if p.check(&TokenKind::Semicolon) {
                None
            } else {
                Some(p.parse_expression()?)
            };
            p.expect(&TokenKind::Semicolon, "';'")?;
            let update = if p.check(&TokenKind::RightParen) {
                None
            } else {
                Some(p.parse_expression()?)
            };
            p.expect(&TokenKind::RightParen, "')'")?;
            Ok((init, test, update))
        })?;
        let body = self.parse_block()?;
        Ok(StmtKind::For {
            init,
            test,
            update,
            body,
        })
    }

    fn parse_try(&mut self) -> Result<StmtKind, ParseError> {
        self.advance(); // pruvamm
        let block = self.parse_block()?;

        self.skip_newlines();
        if !self.check(&TokenKind::Catch) {
            let span = self.peek_span();
            return Err(ParseError {
                kind: ParseErrorKind::MissingCatch,
                span,
            });
        }
        let catch_keyword = self.peek_span();
        self.advance();

        let catch_param = if self.eat(&TokenKind::LeftParen) {
            Some(self.nested(|p| {
                let param = p.expect_ident()?;
                p.expect(&TokenKind::RightParen, "')'")?;
                Ok(param)
            })?)
        } else {
            None
        };
        let handler = self.parse_block()?;

        Ok(StmtKind::Try {
            block,
            catch_keyword,
            catch_param,
            handler,
        })
    }

    fn parse_import(&mut self) -> Result<StmtKind, ParseError> {
        self.advance(); // chiamm
        let (names, is_default) = if self.eat(&TokenKind::LeftBrace) {
            let names = self.nested(|p| {
                let mut names = Vec::new();
                loop {
                    if p.eat(&TokenKind::RightBrace) {
                        break;
                    }
                    names.push(p.expect_ident()?);
                    if !p.eat(&TokenKind::Comma) {
                        p.expect(&TokenKind::RightBrace, "'}'")?;
                        break;
                    }
                }
                Ok(names)
            })?;
            (names, false)
        } else {
            (vec![self.expect_ident()?], true)
        };
        self.expect(&TokenKind::From, "'da'")?;
        let source = self.expect_string()?;
        self.expect_terminator()?;
        Ok(StmtKind::Import(Import {
            names,
            source,
            is_default,
        }))
    }

    fn parse_export(&mut self) -> Result<StmtKind, ParseError> {
        self.advance(); // mann for
        if self.eat(&TokenKind::Default) {
            let value = self.parse_expression()?;
            self.expect_terminator()?;
            return Ok(StmtKind::Export(Exported::Default(value)));
        }
        match self.peek_kind() {
            Some(
                TokenKind::Const
                | TokenKind::Let
                | TokenKind::Function
                | TokenKind::Async
                | TokenKind::Class,
            ) => {
                let declaration = self.parse_statement()?;
                Ok(StmtKind::Export(Exported::Declaration(Box::new(declaration))))
            }
            _ => Err(self.error_here("declaration or 'predefinit'")),
        }
    }

    fn parse_expression_statement(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek_index();
        let saved = std::mem::replace(&mut self.stmt_start, start);
        let expr = self.parse_expression()?;
        self.expect_terminator()?;
        self.stmt_start = saved;
        Ok(expr)
    }

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        self.skip_newlines();
        let open = self.expect(&TokenKind::LeftBrace, "'{'")?.span;
        self.enter(open)?;
        let saved_nesting = std::mem::replace(&mut self.nesting, 0);
        let saved_start = self.stmt_start.take();

        let mut body = Vec::new();
        loop {
            self.skip_separators();
            match self.peek_kind() {
                Some(TokenKind::RightBrace) => {
                    self.advance();
                    break;
                }
                None => return Err(self.error_here("'}'")),
                Some(_) => body.push(self.parse_statement()?),
            }
        }

        self.nesting = saved_nesting;
        self.stmt_start = saved_start;
        self.leave();
        Ok(Block {
            body,
            span: open.to(self.prev_span()),
        })
    }

    fn parse_condition(&mut self) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LeftParen, "'('")?;
        self.nested(|p| {
            let test = p.parse_expression()?;
            p.expect(&TokenKind::RightParen, "')'")?;
            Ok(test)
        })
    }

    fn at_terminator(&self) -> bool {
        matches!(
            self.peek_kind(),
            None | Some(TokenKind::Semicolon | TokenKind::Newline | TokenKind::RightBrace)
        )
    }

    /// Consume the end of a simple statement. A closing brace or the end
    /// of input also ends a statement but is left for the caller.
    fn expect_terminator(&mut self) -> Result<(), ParseError> {
        match self.peek_index() {
            None => Ok(()),
            Some(i) => match self.tokens[i].kind {
                TokenKind::Semicolon | TokenKind::Newline => {
                    self.pos = i + 1;
                    Ok(())
                }
                TokenKind::RightBrace => Ok(()),
                _ => Err(self.error_here("end of statement")),
            },
        }
    }

    // Expressions

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let span = self.peek_span();
        self.enter(span)?;
        let expr = self.parse_assignment_inner();
        self.leave();
        expr
    }

    fn parse_assignment_inner(&mut self) -> Result<Expr, ParseError> {
        if self.check(&TokenKind::Yield) {
            return self.parse_yield();
        }
        if self.is_arrow_start() {
            return self.parse_arrow();
        }

        let target = self.parse_conditional()?;
        let Some(op) = self.peek_kind().and_then(assign_op) else {
            return Ok(target);
        };
        if !target.kind.is_assignable() {
            return Err(ParseError {
                kind: ParseErrorKind::InvalidAssignmentTarget,
                span: target.span,
            });
        }
        let op_span = self.peek_span();
        self.advance();
        self.skip_newlines();
        let value = self.parse_assignment()?;
        let span = target.span.to(value.span);
        Ok(Expr {
            kind: ExprKind::Assignment {
                op,
                op_span,
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        })
    }

    fn parse_yield(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek_span();
        self.advance();
        match self.scopes.last_mut() {
            Some(Scope::Function { yields }) => *yields = true,
            Some(Scope::Arrow) | None => {
                return Err(ParseError {
                    kind: ParseErrorKind::YieldOutsideFunction,
                    span: start,
                });
            }
        }
        let argument = if self.at_expression_end() {
            None
        } else {
            Some(Box::new(self.parse_assignment()?))
        };
        Ok(Expr {
            kind: ExprKind::Yield(argument),
            span: start.to(self.prev_span()),
        })
    }

    fn at_expression_end(&self) -> bool {
        matches!(
            self.peek_kind(),
            None | Some(
                TokenKind::Newline
                    | TokenKind::Semicolon
                    | TokenKind::RightBrace
                    | TokenKind::RightParen
                    | TokenKind::RightBracket
                    | TokenKind::Comma
                    | TokenKind::Colon
            )
        )
    }

    /// `x =>` or `( ... ) =>` ahead of the cursor.
    fn is_arrow_start(&self) -> bool {
        let Some(i) = self.peek_index() else {
            return false;
        };
        let arrow_after = |j: usize| {
            self.next_non_comment(j)
                .is_some_and(|k| self.tokens[k].kind == TokenKind::Arrow)
        };
        match self.tokens[i].kind {
            TokenKind::Identifier => arrow_after(i + 1),
            TokenKind::LeftParen => {
                let mut depth = 0usize;
                for (j, token) in self.tokens.iter().enumerate().skip(i) {
                    match token.kind {
                        TokenKind::LeftParen => depth += 1,
                        TokenKind::RightParen => {
                            depth -= 1;
                            if depth == 0 {
                                return arrow_after(j + 1);
                            }
                        }
                        _ => {}
                    }
                }
                false
            }
            _ => false,
        }
    }

    fn parse_arrow(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek_span();
        let params = if self.check(&TokenKind::LeftParen) {
            self.parse_params()?
        } else {
            vec![self.expect_ident()?]
        };
        self.expect(&TokenKind::Arrow, "'=>'")?;
        self.skip_newlines();

        self.scopes.push(Scope::Arrow);
        let body = if self.check(&TokenKind::LeftBrace) {
            self.parse_block().map(ArrowBody::Block)
        } else {
            self.parse_assignment()
                .map(|e| ArrowBody::Expression(Box::new(e)))
        };
        self.scopes.pop();

        Ok(Expr {
            kind: ExprKind::Arrow {
                params,
                body: body?,
            },
            span: start.to(self.prev_span()),
        })
    }

    fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        let test = self.parse_or()?;
        if !self.eat(&TokenKind::Question) {
            return Ok(test);
        }
        self.skip_newlines();
        let consequent = self.parse_assignment()?;
        self.skip_newlines();
        self.expect(&TokenKind::Colon, "':'")?;
        self.skip_newlines();
        let alternate = self.parse_assignment()?;
        let span = test.span.to(alternate.span);
        Ok(Expr {
            kind: ExprKind::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
            span,
        })
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        self.chain(|p| {
            let mut left = p.parse_and()?;
            while p.check(&TokenKind::Or) {
                let op_span = p.enter_link()?;
                let right = p.parse_and()?;
                left = logical(LogicalOp::Or, op_span, left, right);
            }
            Ok(left)
        })
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        self.chain(|p| {
            let mut left = p.parse_equality()?;
            while p.check(&TokenKind::And) {
                let op_span = p.enter_link()?;
                let right = p.parse_equality()?;
                left = logical(LogicalOp::And, op_span, left, right);
            }
            Ok(left)
        })
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(equality_op, Self::parse_relational)
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(relational_op, Self::parse_additive)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(additive_op, Self::parse_multiplicative)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(multiplicative_op, Self::parse_exponent)
    }

    /// One left-associative precedence level.
    fn parse_binary_level(
        &mut self,
        op_for: fn(&TokenKind) -> Option<BinaryOp>,
        next: fn(&mut Self) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        self.chain(|p| {
            let mut left = next(p)?;
            while let Some(op) = p.peek_kind().and_then(op_for) {
                let op_span = p.enter_link()?;
                let right = next(p)?;
                left = binary(op, op_span, left, right);
            }
            Ok(left)
        })
    }

    /// `**` is right-associative and binds its left operand after unary
    /// operators, so `-x ** 2` is `(-x) ** 2`.
    fn parse_exponent(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_unary()?;
        if !self.check(&TokenKind::StarStar) {
            return Ok(base);
        }
        let op_span = self.peek_span();
        self.advance();
        self.skip_newlines();
        let span = self.peek_span();
        self.enter(span)?;
        let exponent = self.parse_exponent();
        self.leave();
        Ok(binary(BinaryOp::Exp, op_span, base, exponent?))
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let Some(token) = self.peek() else {
            return Err(self.error_here("expression"));
        };
        let start = token.span;
        let prefix = match token.kind {
            TokenKind::Minus => Prefix::Unary(UnaryOp::Negate),
            TokenKind::Not => Prefix::Unary(UnaryOp::Not),
            TokenKind::TypeOf => Prefix::Unary(UnaryOp::TypeOf),
            TokenKind::PlusPlus => Prefix::Update(UpdateOp::Increment),
            TokenKind::MinusMinus => Prefix::Update(UpdateOp::Decrement),
            TokenKind::Delete => Prefix::Delete,
            TokenKind::Await => Prefix::Await,
            _ => return self.parse_postfix(),
        };
        self.advance();

        self.enter(start)?;
        let argument = self.parse_unary();
        self.leave();
        let argument = Box::new(argument?);
        let span = start.to(argument.span);

        let kind = match prefix {
            Prefix::Unary(op) => ExprKind::Unary { op, argument },
            Prefix::Update(op) => {
                if !argument.kind.is_assignable() {
                    return Err(ParseError {
                        kind: ParseErrorKind::InvalidAssignmentTarget,
                        span: argument.span,
                    });
                }
                ExprKind::Update {
                    op,
                    prefix: true,
                    argument,
                }
            }
            Prefix::Delete => ExprKind::Delete(argument),
            Prefix::Await => ExprKind::Await(argument),
        };
        Ok(Expr { kind, span })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_call_member()?;
        let op = match self.peek_kind() {
            Some(TokenKind::PlusPlus) => UpdateOp::Increment,
            Some(TokenKind::MinusMinus) => UpdateOp::Decrement,
            _ => return Ok(expr),
        };
        if !expr.kind.is_assignable() {
            return Err(ParseError {
                kind: ParseErrorKind::InvalidAssignmentTarget,
                span: expr.span,
            });
        }
        self.advance();
        let span = expr.span.to(self.prev_span());
        Ok(Expr {
            kind: ExprKind::Update {
                op,
                prefix: false,
                argument: Box::new(expr),
            },
            span,
        })
    }

    fn parse_call_member(&mut self) -> Result<Expr, ParseError> {
        self.chain(|p| {
            let mut expr = if p.check(&TokenKind::New) {
                p.parse_new()?
            } else {
                p.parse_primary()?
            };
            loop {
                // a chain may continue with `.name` on the next line
                if p.peek_kind() == Some(&TokenKind::Newline)
                    && p.peek_past_newlines() == Some(&TokenKind::Dot)
                {
                    p.skip_newlines();
                }
                match p.peek_kind() {
                    Some(TokenKind::LeftParen) => {
                        p.enter(p.peek_span())?;
                        let arguments = p.parse_arguments()?;
                        let span = expr.span.to(p.prev_span());
                        expr = Expr {
                            kind: ExprKind::Call {
                                callee: Box::new(expr),
                                arguments,
                            },
                            span,
                        };
                    }
                    Some(TokenKind::Dot | TokenKind::LeftBracket) => {
                        p.enter(p.peek_span())?;
                        expr = p.parse_member_suffix(expr)?;
                    }
                    _ => break,
                }
            }
            Ok(expr)
        })
    }

    fn parse_member_suffix(&mut self, object: Expr) -> Result<Expr, ParseError> {
        let property = if self.eat(&TokenKind::Dot) {
            MemberProperty::Named(self.expect_property_name()?)
        } else {
            self.expect(&TokenKind::LeftBracket, "'['")?;
            let index = self.nested(|p| {
                let index = p.parse_expression()?;
                p.expect(&TokenKind::RightBracket, "']'")?;
                Ok(index)
            })?;
            MemberProperty::Computed(Box::new(index))
        };
        let span = object.span.to(self.prev_span());
        Ok(Expr {
            kind: ExprKind::Member {
                object: Box::new(object),
                property,
            },
            span,
        })
    }

    fn parse_new(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek_span();
        self.advance(); // nu bell
        let callee = self.chain(|p| {
            let mut callee = p.parse_primary()?;
            while matches!(p.peek_kind(), Some(TokenKind::Dot | TokenKind::LeftBracket)) {
                p.enter(p.peek_span())?;
                callee = p.parse_member_suffix(callee)?;
            }
            Ok(callee)
        })?;
        let arguments = if self.check(&TokenKind::LeftParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Expr {
            kind: ExprKind::New {
                callee: Box::new(callee),
                arguments,
            },
            span: start.to(self.prev_span()),
        })
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(&TokenKind::LeftParen, "'('")?;
        self.nested(|p| {
            let mut arguments = Vec::new();
            loop {
                if p.eat(&TokenKind::RightParen) {
                    break;
                }
                arguments.push(p.parse_assignment()?);
                if !p.eat(&TokenKind::Comma) {
                    p.expect(&TokenKind::RightParen, "')'")?;
                    break;
                }
            }
            Ok(arguments)
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let Some(token) = self.peek() else {
            return Err(self.error_here("expression"));
        };
        let kind = match &token.kind {
            TokenKind::Number(n) => ExprKind::Literal(Literal::Number(*n)),
            TokenKind::String(s) => ExprKind::Literal(Literal::String(s.clone())),
            TokenKind::True => ExprKind::Literal(Literal::Bool(true)),
            TokenKind::False => ExprKind::Literal(Literal::Bool(false)),
            TokenKind::Null => ExprKind::Literal(Literal::Null),
            TokenKind::Undefined => ExprKind::Literal(Literal::Undefined),
            TokenKind::Identifier => ExprKind::Identifier(token.text.clone()),
            TokenKind::This => ExprKind::This,
            TokenKind::LeftParen => {
                self.advance();
                return self.nested(|p| {
                    let inner = p.parse_expression()?;
                    p.expect(&TokenKind::RightParen, "')'")?;
                    Ok(inner)
                });
            }
            TokenKind::LeftBracket => return self.parse_array(),
            TokenKind::LeftBrace => return self.parse_object(),
            TokenKind::Log | TokenKind::Warn | TokenKind::ErrorLog => {
                return self.parse_console();
            }
            _ => return Err(self.error_here("expression")),
        };
        self.advance();
        Ok(Expr {
            kind,
            span: token.span,
        })
    }

    fn parse_array(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek_span();
        self.advance(); // [
        let elements = self.nested(|p| {
            let mut elements = Vec::new();
            loop {
                if p.eat(&TokenKind::RightBracket) {
                    break;
                }
                elements.push(p.parse_assignment()?);
                if !p.eat(&TokenKind::Comma) {
                    p.expect(&TokenKind::RightBracket, "']'")?;
                    break;
                }
            }
            Ok(elements)
        })?;
        Ok(Expr {
            kind: ExprKind::Array(elements),
            span: start.to(self.prev_span()),
        })
    }

    fn parse_object(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek_span();
        self.advance(); // {
        let properties = self.nested(|p| {
            let mut properties = Vec::new();
            loop {
                if p.eat(&TokenKind::RightBrace) {
                    break;
                }
                properties.push(p.parse_property()?);
                if !p.eat(&TokenKind::Comma) {
                    p.expect(&TokenKind::RightBrace, "'}'")?;
                    break;
                }
            }
            Ok(properties)
        })?;
        Ok(Expr {
            kind: ExprKind::Object(properties),
            span: start.to(self.prev_span()),
        })
    }

    fn parse_property(&mut self) -> Result<Property, ParseError> {
        let key_span = self.peek_span();
        let key = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::String(s)) => {
                let key = PropertyKey::String(s.clone());
                self.advance();
                key
            }
            _ => PropertyKey::Identifier(self.expect_property_name()?.name),
        };
        self.expect(&TokenKind::Colon, "':'")?;
        let value = self.parse_assignment()?;
        let span = key_span.to(value.span);
        Ok(Property { key, value, span })
    }

    fn parse_console(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek_span();
        let method = match self.advance().map(|t| &t.kind) {
            Some(TokenKind::Warn) => ConsoleMethod::Warn,
            Some(TokenKind::ErrorLog) => ConsoleMethod::Error,
            _ => ConsoleMethod::Log,
        };
        let arguments = self.parse_arguments()?;
        Ok(Expr {
            kind: ExprKind::Console { method, arguments },
            span: start.to(self.prev_span()),
        })
    }

    // Token helpers

    /// Index of the next token the grammar should look at. Comments are
    /// always skipped; newlines only inside brackets.
    fn peek_index(&self) -> Option<usize> {
        let mut i = self.pos;
        while let Some(token) = self.tokens.get(i) {
            match token.kind {
                TokenKind::Comment => i += 1,
                TokenKind::Newline if self.nesting > 0 => i += 1,
                _ => return Some(i),
            }
        }
        None
    }

    fn peek(&self) -> Option<&'a Token> {
        let tokens = self.tokens;
        self.peek_index().map(|i| &tokens[i])
    }

    fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn peek_span(&self) -> Span {
        self.peek().map_or_else(|| self.eof_span(), |t| t.span)
    }

    /// Kind of the first token that is not a newline or comment.
    fn peek_past_newlines(&self) -> Option<&'a TokenKind> {
        self.tokens[self.pos.min(self.tokens.len())..]
            .iter()
            .map(|t| &t.kind)
            .find(|k| !k.is_trivia())
    }

    fn next_non_comment(&self, from: usize) -> Option<usize> {
        (from..self.tokens.len()).find(|&i| self.tokens[i].kind != TokenKind::Comment)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let i = self.peek_index()?;
        let tokens = self.tokens;
        self.pos = i + 1;
        self.last = Some(i);
        Some(&tokens[i])
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> Result<&'a Token, ParseError> {
        match self.peek() {
            Some(token) if &token.kind == kind => {
                self.advance();
                Ok(token)
            }
            _ => Err(self.error_here(expected)),
        }
    }

    fn expect_ident(&mut self) -> Result<Ident, ParseError> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Identifier => {
                self.advance();
                Ok(Ident {
                    name: token.text.clone(),
                    span: token.span,
                })
            }
            _ => Err(self.error_here("identifier")),
        }
    }

    /// Property names accept any single word, keywords included.
    fn expect_property_name(&mut self) -> Result<Ident, ParseError> {
        match self.peek() {
            Some(token)
                if token.kind == TokenKind::Identifier
                    || (token.kind.is_keyword() && !token.text.contains(char::is_whitespace)) =>
            {
                self.advance();
                Ok(Ident {
                    name: token.text.clone(),
                    span: token.span,
                })
            }
            _ => Err(self.error_here("property name")),
        }
    }

    fn expect_string(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::String(value),
                ..
            }) => {
                self.advance();
                Ok(value.clone())
            }
            _ => Err(self.error_here("module path string")),
        }
    }

    fn skip_newlines(&mut self) {
        while self
            .tokens
            .get(self.pos)
            .is_some_and(|t| t.kind.is_trivia())
        {
            self.pos += 1;
        }
    }

    /// Skip blank lines, comments and stray `;` between statements.
    fn skip_separators(&mut self) {
        while self
            .tokens
            .get(self.pos)
            .is_some_and(|t| t.kind.is_trivia() || t.kind == TokenKind::Semicolon)
        {
            self.pos += 1;
        }
    }

    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.nesting += 1;
        let result = f(self);
        self.nesting -= 1;
        result
    }

    fn enter(&mut self, span: Span) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError {
                kind: ParseErrorKind::TooDeeplyNested {
                    limit: self.max_depth,
                },
                span,
            });
        }
        Ok(())
    }

    const fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Consume the operator joining two links of a left-nested chain and
    /// count the new link against the depth limit. Returns the operator
    /// span.
    fn enter_link(&mut self) -> Result<Span, ParseError> {
        let op_span = self.peek_span();
        self.enter(op_span)?;
        self.advance();
        self.skip_newlines();
        Ok(op_span)
    }

    /// Run `f`, then release every level it entered. Chains enter once
    /// per link and leave all at once here.
    fn chain<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        let depth = self.depth;
        let result = f(self);
        self.depth = depth;
        result
    }

    fn prev_span(&self) -> Span {
        self.last
            .map_or_else(Span::default, |i| self.tokens[i].span)
    }

    fn eof_span(&self) -> Span {
        self.tokens
            .last()
            .map_or_else(Span::default, |last| last.span.end_point())
    }

    fn error_here(&self, expected: &str) -> ParseError {
        if let Some(err) = self.dangling_head() {
            return err;
        }
        match self.peek() {
            None => ParseError {
                kind: ParseErrorKind::UnexpectedEof {
                    expected: expected.to_string(),
                },
                span: self.eof_span(),
            },
            Some(token) => ParseError {
                kind: ParseErrorKind::UnexpectedToken {
                    expected: expected.to_string(),
                    found: describe(token),
                },
                span: token.span,
            },
        }
    }

    /// A compound head word (`chist`, `nu`, `stamm`, ...) read as a plain
    /// identifier just before the error, or at the start of a statement
    /// that is only words so far or stops at a block, like `mentre (x) {`.
    fn dangling_head(&self) -> Option<ParseError> {
        let at_block = self.check(&TokenKind::LeftBrace);
        let partial_statement = self.stmt_start.filter(|&start| {
            at_block
                || self.last.is_some_and(|last| {
                    last >= start
                        && self.tokens[start..=last]
                            .iter()
                            .all(|t| t.kind == TokenKind::Identifier || t.kind.is_trivia())
                })
        });
        [self.last, partial_statement]
            .into_iter()
            .flatten()
            .find_map(|i| {
                let token = &self.tokens[i];
                if token.kind != TokenKind::Identifier {
                    return None;
                }
                let keyword = keywords::completion_for(&token.text)?;
                let partner = keyword
                    .lexeme
                    .strip_prefix(keyword.first_word())?
                    .trim_start();
                Some(ParseError {
                    kind: ParseErrorKind::MissingCompoundPartner {
                        head: token.text.clone(),
                        partner,
                    },
                    span: token.span,
                })
            })
    }
}

fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::Newline => "end of line".to_string(),
        _ => format!("'{}'", token.text),
    }
}

fn binary(op: BinaryOp, op_span: Span, left: Expr, right: Expr) -> Expr {
    let span = left.span.to(right.span);
    Expr {
        kind: ExprKind::Binary {
            op,
            op_span,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    }
}

fn logical(op: LogicalOp, op_span: Span, left: Expr, right: Expr) -> Expr {
    let span = left.span.to(right.span);
    Expr {
        kind: ExprKind::Logical {
            op,
            op_span,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    }
}

const fn assign_op(kind: &TokenKind) -> Option<AssignOp> {
    match kind {
        TokenKind::Equal => Some(AssignOp::Assign),
        TokenKind::PlusEqual => Some(AssignOp::Add),
        TokenKind::MinusEqual => Some(AssignOp::Sub),
        TokenKind::StarEqual => Some(AssignOp::Mul),
        TokenKind::SlashEqual => Some(AssignOp::Div),
        TokenKind::PercentEqual => Some(AssignOp::Rem),
        _ => None,
    }
}

const fn equality_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::EqualEqual => Some(BinaryOp::Eq),
        TokenKind::EqualEqualEqual => Some(BinaryOp::StrictEq),
        TokenKind::BangEqual => Some(BinaryOp::NotEq),
        TokenKind::BangEqualEqual => Some(BinaryOp::StrictNotEq),
        _ => None,
    }
}

const fn relational_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Less => Some(BinaryOp::Lt),
        TokenKind::Greater => Some(BinaryOp::Gt),
        TokenKind::LessEqual => Some(BinaryOp::LtEq),
        TokenKind::GreaterEqual => Some(BinaryOp::GtEq),
        _ => None,
    }
}

const fn additive_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Sub),
        _ => None,
    }
}

const fn multiplicative_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Star => Some(BinaryOp::Mul),
        TokenKind::Slash => Some(BinaryOp::Div),
        TokenKind::Percent => Some(BinaryOp::Rem),
        _ => None,
    }
}
