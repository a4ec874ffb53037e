//! JavaScript code generation.
//!
//! A structural rewrite of the AST: every node becomes its JavaScript
//! counterpart, printed with two-space indentation and the fewest
//! parentheses that keep the original meaning. When a source map is
//! requested, every statement start, expression start, operator and
//! `else`/`catch` keyword is mapped back to its FratmScript span.

use std::borrow::Cow;
use std::fmt::Write as _;

use log::debug;

use crate::ast::{
    ArrowBody, BinaryOp, Block, Class, Else, Exported, Expr, ExprKind, ForInit, Function, Ident,
    IfBranch, Import, Literal, LogicalOp, MemberProperty, Program, PropertyKey, Stmt, StmtKind, UnaryOp,
    UpdateOp, VarDecl,
};
use crate::options::CompileOptions;
use crate::sourcemap::{SourceMap, SourceMapBuilder};
use crate::token::Span;

/// Generated JavaScript and, when requested, its source map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub code: String,
    pub source_map: Option<SourceMap>,
}

/// Generate JavaScript for `program`.
#[must_use]
pub fn generate(program: &Program, options: &CompileOptions) -> Output {
    Generator::new(options, None).run(program)
}

/// Like [`generate`], with the original text available for
/// [`CompileOptions::include_source_content`].
#[must_use]
pub fn generate_with_source(program: &Program, source: &str, options: &CompileOptions) -> Output {
    Generator::new(options, Some(source)).run(program)
}

// Binding strength of each expression form; higher binds tighter.
const PREC_ASSIGN: u8 = 2;
const PREC_CONDITIONAL: u8 = 3;
const PREC_OR: u8 = 4;
const PREC_AND: u8 = 5;
const PREC_EQUALITY: u8 = 9;
const PREC_RELATIONAL: u8 = 10;
const PREC_ADDITIVE: u8 = 12;
const PREC_MULTIPLICATIVE: u8 = 13;
const PREC_EXPONENT: u8 = 14;
const PREC_UNARY: u8 = 15;
const PREC_POSTFIX: u8 = 16;
const PREC_CALL: u8 = 17;
const PREC_PRIMARY: u8 = 20;

const JS_RESERVED: &[&str] = &[
    "await",
    "break",
    "case",
    "catch",
    "class",
    "const",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "else",
    "enum",
    "export",
    "extends",
    "false",
    "finally",
    "for",
    "function",
    "if",
    "implements",
    "import",
    "in",
    "instanceof",
    "interface",
    "let",
    "new",
    "null",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "static",
    "super",
    "switch",
    "this",
    "throw",
    "true",
    "try",
    "typeof",
    "var",
    "void",
    "while",
    "with",
    "yield",
];

struct Generator {
    out: String,
    indent: usize,
    /// Current output position, 0-indexed, columns in characters.
    line: u32,
    column: u32,
    map: Option<SourceMapBuilder>,
}

impl Generator {
    fn new(options: &CompileOptions, source: Option<&str>) -> Self {
        let map = options.source_map.then(|| {
            let mut builder =
                SourceMapBuilder::new(options.source_name()).file(options.output_name());
            if options.include_source_content {
                if let Some(text) = source {
                    builder = builder.source_content(text);
                }
            }
            builder
        });
        Self {
            out: String::new(),
            indent: 0,
            line: 0,
            column: 0,
            map,
        }
    }

    fn run(mut self, program: &Program) -> Output {
        for stmt in &program.body {
            self.stmt(stmt);
        }
        debug!(
            "generated {} bytes of JavaScript, {} mappings",
            self.out.len(),
            self.map.as_ref().map_or(0, SourceMapBuilder::len)
        );
        Output {
            code: self.out,
            source_map: self.map.map(SourceMapBuilder::build),
        }
    }

    fn write(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        }
        self.out.push_str(text);
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.write("  ");
        }
    }

    fn mark(&mut self, span: Span, name: Option<&str>) {
        if let Some(map) = &mut self.map {
            map.add_mapping(
                (self.line, self.column),
                (to_u32(span.line.saturating_sub(1)), to_u32(span.column.saturating_sub(1))),
                name,
            );
        }
    }

    // Statements

    fn stmt(&mut self, stmt: &Stmt) {
        self.write_indent();
        self.stmt_body(stmt);
        self.write("\n");
    }

    /// A statement without its indentation and trailing newline.
    fn stmt_body(&mut self, stmt: &Stmt) {
        self.mark(stmt.span, None);
        match &stmt.kind {
            StmtKind::VarDecl(decl) => {
                self.var_decl(decl);
                self.write(";");
            }
            StmtKind::FunctionDecl(function) => self.function(function),
            StmtKind::ClassDecl(class) => self.class(class),
            StmtKind::Return(argument) => {
                self.write("return");
                if let Some(argument) = argument {
                    self.write(" ");
                    self.expr(argument, 0);
                }
                self.write(";");
            }
            StmtKind::If {
                branches,
                alternate,
            } => self.if_chain(branches, alternate.as_ref()),
            StmtKind::While { test, body } => {
                self.write("while (");
                self.expr(test, 0);
                self.write(") ");
                self.block(body);
            }
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                self.write("for (");
                match init {
                    Some(ForInit::Declaration(decl)) => self.var_decl(decl),
                    Some(ForInit::Expression(expr)) => self.expr(expr, 0),
                    None => {}
                }
                self.write(";");
                if let Some(test) = test {
                    self.write(" ");
                    self.expr(test, 0);
                }
                self.write(";");
                if let Some(update) = update {
                    self.write(" ");
                    self.expr(update, 0);
                }
                self.write(") ");
                self.block(body);
            }
            StmtKind::Break => self.write("break;"),
            StmtKind::Continue => self.write("continue;"),
            StmtKind::Debugger => self.write("debugger;"),
            StmtKind::Try {
                block,
                catch_keyword,
                catch_param,
                handler,
            } => {
                self.write("try ");
                self.block(block);
                self.write(" ");
                self.mark(*catch_keyword, None);
                self.write("catch ");
                if let Some(param) = catch_param {
                    self.write("(");
                    self.ident(param);
                    self.write(") ");
                }
                self.block(handler);
            }
            StmtKind::Throw(argument) => {
                self.write("throw ");
                self.expr(argument, 0);
                self.write(";");
            }
            StmtKind::Import(import) => self.import(import),
            StmtKind::Export(Exported::Default(value)) => {
                self.write("export default ");
                self.expr(value, PREC_ASSIGN);
                self.write(";");
            }
            StmtKind::Export(Exported::Declaration(declaration)) => {
                self.write("export ");
                self.stmt_body(declaration);
            }
            StmtKind::Block(block) => self.block(block),
            StmtKind::Expression(expr) => {
                if starts_with_object(expr) {
                    self.write("(");
                    self.expr(expr, 0);
                    self.write(")");
                } else {
                    self.expr(expr, 0);
                }
                self.write(";");
            }
        }
    }

    fn var_decl(&mut self, decl: &VarDecl) {
        self.write(if decl.mutable { "let " } else { "const " });
        self.ident(&decl.name);
        if let Some(init) = &decl.init {
            self.write(" = ");
            self.expr(init, PREC_ASSIGN);
        }
    }

    fn function(&mut self, function: &Function) {
        if function.is_async {
            self.write("async ");
        }
        self.write(if function.is_generator {
            "function* "
        } else {
            "function "
        });
        self.ident(&function.name);
        self.params(&function.params);
        self.write(" ");
        self.block(&function.body);
    }

    fn params(&mut self, params: &[Ident]) {
        self.write("(");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.ident(param);
        }
        self.write(")");
    }

    fn class(&mut self, class: &Class) {
        self.write("class ");
        self.ident(&class.name);
        if class.constructor.is_none() && class.methods.is_empty() {
            self.write(" {}");
            return;
        }
        self.write(" {\n");
        self.indent += 1;
        if let Some(constructor) = &class.constructor {
            self.method(constructor, Some("constructor"));
        }
        for method in &class.methods {
            self.method(method, None);
        }
        self.indent -= 1;
        self.write_indent();
        self.write("}");
    }

    fn method(&mut self, method: &Function, rename: Option<&str>) {
        self.write_indent();
        self.mark(method.span, None);
        if method.is_async {
            self.write("async ");
        }
        if method.is_generator {
            self.write("*");
        }
        self.mark(method.name.span, Some(&method.name.name));
        self.write(rename.unwrap_or(&method.name.name));
        self.params(&method.params);
        self.write(" ");
        self.block(&method.body);
        self.write("\n");
    }

    fn if_chain(&mut self, branches: &[IfBranch], alternate: Option<&Else>) {
        for branch in branches {
            if let Some(keyword) = branch.else_keyword {
                self.write(" ");
                self.mark(keyword, None);
                self.write("else ");
            }
            self.mark(branch.keyword, None);
            self.write("if (");
            self.expr(&branch.test, 0);
            self.write(") ");
            self.block(&branch.consequent);
        }
        if let Some(alternate) = alternate {
            self.write(" ");
            self.mark(alternate.keyword, None);
            self.write("else ");
            self.block(&alternate.body);
        }
    }

    fn import(&mut self, import: &Import) {
        self.write("import ");
        if import.is_default {
            for name in &import.names {
                self.ident(name);
            }
        } else {
            self.write("{ ");
            for (i, name) in import.names.iter().enumerate() {
                if i > 0 {
                    self.write(", ");
                }
                self.ident(name);
            }
            self.write(" }");
        }
        self.write(" from ");
        self.write(&quote(&import.source));
        self.write(";");
    }

    fn block(&mut self, block: &Block) {
        if block.body.is_empty() {
            self.write("{}");
            return;
        }
        self.write("{\n");
        self.indent += 1;
        for stmt in &block.body {
            self.stmt(stmt);
        }
        self.indent -= 1;
        self.write_indent();
        self.write("}");
    }

    fn ident(&mut self, ident: &Ident) {
        self.mark(ident.span, Some(&ident.name));
        self.write(&safe_name(&ident.name));
    }

    // Expressions

    /// Print `expr`, parenthesized when it binds looser than `min`.
    fn expr(&mut self, expr: &Expr, min: u8) {
        let wrap = precedence(expr) < min;
        if wrap {
            self.write("(");
        }
        let name = match &expr.kind {
            ExprKind::Identifier(name) => Some(name.as_str()),
            _ => None,
        };
        self.mark(expr.span, name);
        self.expr_kind(&expr.kind);
        if wrap {
            self.write(")");
        }
    }

    fn expr_kind(&mut self, kind: &ExprKind) {
        match kind {
            ExprKind::Literal(literal) => self.literal(literal),
            ExprKind::Identifier(name) => self.write(&safe_name(name)),
            ExprKind::This => self.write("this"),
            ExprKind::Array(elements) => {
                self.write("[");
                self.list(elements);
                self.write("]");
            }
            ExprKind::Object(properties) => {
                if properties.is_empty() {
                    self.write("{}");
                    return;
                }
                self.write("{ ");
                for (i, property) in properties.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.mark(property.span, None);
                    match &property.key {
                        PropertyKey::Identifier(key) => self.write(key),
                        PropertyKey::String(key) => self.write(&quote(key)),
                    }
                    self.write(": ");
                    self.expr(&property.value, PREC_ASSIGN);
                }
                self.write(" }");
            }
            ExprKind::Binary {
                op,
                op_span,
                left,
                right,
            } => {
                let prec = binary_precedence(*op);
                let (left_min, right_min) = if *op == BinaryOp::Exp {
                    // `-x ** 2` is a syntax error in JavaScript
                    (PREC_POSTFIX, PREC_EXPONENT)
                } else {
                    (prec, prec + 1)
                };
                self.expr(left, left_min);
                self.write(" ");
                self.mark(*op_span, None);
                self.write(op.as_str());
                self.write(" ");
                self.expr(right, right_min);
            }
            ExprKind::Logical {
                op,
                op_span,
                left,
                right,
            } => {
                let prec = logical_precedence(*op);
                self.expr(left, prec);
                self.write(" ");
                self.mark(*op_span, None);
                self.write(op.as_str());
                self.write(" ");
                self.expr(right, prec + 1);
            }
            ExprKind::Unary { op, argument } => {
                self.write(op.as_str());
                if *op == UnaryOp::Negate && starts_with_minus(argument) {
                    self.write(" ");
                }
                self.expr(argument, PREC_UNARY);
            }
            ExprKind::Update {
                op,
                prefix,
                argument,
            } => {
                if *prefix {
                    self.write(op.as_str());
                    self.expr(argument, PREC_CALL);
                } else {
                    self.expr(argument, PREC_CALL);
                    self.write(op.as_str());
                }
            }
            ExprKind::Delete(argument) => {
                self.write("delete ");
                self.expr(argument, PREC_UNARY);
            }
            ExprKind::Await(argument) => {
                self.write("await ");
                self.expr(argument, PREC_UNARY);
            }
            ExprKind::Yield(argument) => {
                self.write("yield");
                if let Some(argument) = argument {
                    self.write(" ");
                    self.expr(argument, PREC_ASSIGN);
                }
            }
            ExprKind::Assignment {
                op,
                op_span,
                target,
                value,
            } => {
                self.expr(target, PREC_CALL);
                self.write(" ");
                self.mark(*op_span, None);
                self.write(op.as_str());
                self.write(" ");
                self.expr(value, PREC_ASSIGN);
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.expr(test, PREC_OR);
                self.write(" ? ");
                self.expr(consequent, PREC_ASSIGN);
                self.write(" : ");
                self.expr(alternate, PREC_ASSIGN);
            }
            ExprKind::Call { callee, arguments } => {
                self.expr(callee, PREC_CALL);
                self.write("(");
                self.list(arguments);
                self.write(")");
            }
            ExprKind::New { callee, arguments } => {
                self.write("new ");
                if contains_call(callee) {
                    self.write("(");
                    self.expr(callee, 0);
                    self.write(")");
                } else {
                    self.expr(callee, PREC_CALL);
                }
                self.write("(");
                self.list(arguments);
                self.write(")");
            }
            ExprKind::Member { object, property } => {
                let numeric = matches!(object.kind, ExprKind::Literal(Literal::Number(_)));
                if numeric {
                    self.write("(");
                    self.expr(object, 0);
                    self.write(")");
                } else {
                    self.expr(object, PREC_CALL);
                }
                match property {
                    MemberProperty::Named(name) => {
                        self.write(".");
                        self.mark(name.span, Some(&name.name));
                        self.write(&name.name);
                    }
                    MemberProperty::Computed(index) => {
                        self.write("[");
                        self.expr(index, 0);
                        self.write("]");
                    }
                }
            }
            ExprKind::Arrow { params, body } => {
                if let [param] = params.as_slice() {
                    self.ident(param);
                } else {
                    self.params(params);
                }
                self.write(" => ");
                match body {
                    ArrowBody::Block(block) => self.block(block),
                    ArrowBody::Expression(expr) if starts_with_object(expr) => {
                        self.write("(");
                        self.expr(expr, 0);
                        self.write(")");
                    }
                    ArrowBody::Expression(expr) => self.expr(expr, PREC_ASSIGN),
                }
            }
            ExprKind::Console { method, arguments } => {
                self.write("console.");
                self.write(method.as_str());
                self.write("(");
                self.list(arguments);
                self.write(")");
            }
        }
    }

    fn list(&mut self, items: &[Expr]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.expr(item, PREC_ASSIGN);
        }
    }

    fn literal(&mut self, literal: &Literal) {
        match literal {
            Literal::Number(value) => self.write(&format_number(*value)),
            Literal::String(value) => self.write(&quote(value)),
            Literal::Bool(true) => self.write("true"),
            Literal::Bool(false) => self.write("false"),
            Literal::Null => self.write("null"),
            Literal::Undefined => self.write("undefined"),
        }
    }
}

const fn binary_precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Eq | BinaryOp::StrictEq | BinaryOp::NotEq | BinaryOp::StrictNotEq => {
            PREC_EQUALITY
        }
        BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq => PREC_RELATIONAL,
        BinaryOp::Add | BinaryOp::Sub => PREC_ADDITIVE,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => PREC_MULTIPLICATIVE,
        BinaryOp::Exp => PREC_EXPONENT,
    }
}

const fn logical_precedence(op: LogicalOp) -> u8 {
    match op {
        LogicalOp::Or => PREC_OR,
        LogicalOp::And => PREC_AND,
    }
}

const fn precedence(expr: &Expr) -> u8 {
    match &expr.kind {
        ExprKind::Assignment { .. } | ExprKind::Arrow { .. } | ExprKind::Yield(_) => PREC_ASSIGN,
        ExprKind::Conditional { .. } => PREC_CONDITIONAL,
        ExprKind::Logical { op, .. } => logical_precedence(*op),
        ExprKind::Binary { op, .. } => binary_precedence(*op),
        ExprKind::Unary { .. }
        | ExprKind::Delete(_)
        | ExprKind::Await(_)
        | ExprKind::Update { prefix: true, .. } => PREC_UNARY,
        ExprKind::Update { prefix: false, .. } => PREC_POSTFIX,
        ExprKind::Call { .. }
        | ExprKind::New { .. }
        | ExprKind::Member { .. }
        | ExprKind::Console { .. } => PREC_CALL,
        ExprKind::Literal(_)
        | ExprKind::Identifier(_)
        | ExprKind::This
        | ExprKind::Array(_)
        | ExprKind::Object(_) => PREC_PRIMARY,
    }
}

/// Whether printing `expr` without parentheses would begin with `{`.
fn starts_with_object(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Object(_) => true,
        ExprKind::Binary { left, .. } | ExprKind::Logical { left, .. } => starts_with_object(left),
        ExprKind::Assignment { target, .. } => starts_with_object(target),
        ExprKind::Conditional { test, .. } => starts_with_object(test),
        ExprKind::Call { callee, .. } => starts_with_object(callee),
        ExprKind::Member { object, .. } => starts_with_object(object),
        ExprKind::Update {
            prefix: false,
            argument,
            ..
        } => starts_with_object(argument),
        _ => false,
    }
}

/// Whether the unparenthesized operand would begin with `-`.
const fn starts_with_minus(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Unary {
            op: UnaryOp::Negate,
            ..
        } | ExprKind::Update {
            op: UpdateOp::Decrement,
            prefix: true,
            ..
        }
    )
}

/// `new` binds to the first argument list, so a callee holding a call
/// must be parenthesized.
fn contains_call(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Call { .. } | ExprKind::Console { .. } => true,
        ExprKind::Member { object, .. } => contains_call(object),
        _ => false,
    }
}

fn safe_name(name: &str) -> Cow<'_, str> {
    if JS_RESERVED.contains(&name) {
        Cow::Owned(format!("{name}_"))
    } else {
        Cow::Borrowed(name)
    }
}

fn format_number(value: f64) -> String {
    if value.is_infinite() {
        "Infinity".to_string()
    } else {
        value.to_string()
    }
}

/// Double-quoted JavaScript string literal.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
