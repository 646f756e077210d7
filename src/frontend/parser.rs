//! Parser for letc
//!
//! Recursive descent parser with Pratt parsing for binary expressions.
//! Productions propagate a single [`Error`] with `?`; the declaration and
//! statement loops record it, skip to a synchronization point and keep
//! going, so one malformed statement yields one diagnostic.

use crate::frontend::ast::*;
use crate::frontend::lexer::Lexer;
use crate::frontend::token::{Token, TokenKind};
use crate::types::{IntType, Modifier, TypeArena, TypeId, TypeKind, TypedSymbol};
use crate::utils::{Diagnostics, Error, Result, Span};

/// The parser
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    types: TypeArena,
    diagnostics: Diagnostics,
}

impl Parser {
    /// Create a new parser from a lexer, taking over its diagnostics
    pub fn new(mut lexer: Lexer) -> Self {
        let tokens = lexer.tokenize();
        let diagnostics = lexer.take_diagnostics();
        Self {
            tokens,
            pos: 0,
            types: TypeArena::new(),
            diagnostics,
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    // ==================== Helper Methods ====================

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token> {
        if self.check(&expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected.to_string()))
        }
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: impl Into<String>) -> Error {
        Error::UnexpectedToken {
            expected: expected.into(),
            got: self.current_kind().to_string(),
            span: self.current().span,
        }
    }

    // ==================== Error Recovery ====================

    /// Record a syntax error. Errors raised at a token the lexer already
    /// rejected are dropped, the lexer has reported them.
    fn report(&mut self, error: Error) {
        let token = self.current();
        if token.kind == TokenKind::Error && token.span == error.span() {
            return;
        }
        self.diagnostics.report(error);
    }

    /// Skip tokens until `target`, a token on a different line, or end of file
    fn synchronize(&mut self, target: Option<&TokenKind>) {
        let line = self.current().span.line;
        let from = self.pos;
        while !self.is_at_end() {
            if target.is_some_and(|t| self.check(t)) || self.current().span.line != line {
                break;
            }
            self.advance();
        }
        log::debug!(
            "synchronized at {} after skipping {} token(s)",
            self.current().span,
            self.pos - from
        );
    }

    /// Resume after a failed production that started at token index `start`
    fn recover(&mut self, start: usize, target: Option<&TokenKind>) {
        // An error on the first token of a fresh line (typically a missing
        // `;`) means that token already starts the next construct
        let at_line_start =
            self.pos > start && self.current().span.line > self.previous().span.line;
        if !at_line_start {
            self.synchronize(target);
        }
        if self.pos == start && !self.is_at_end() && !target.is_some_and(|t| self.check(t)) {
            self.advance();
        }
    }

    /// Whether the current token is a declaration keyword opening a line
    fn at_decl_line_start(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Let | TokenKind::Const | TokenKind::Proto | TokenKind::Struct
        ) && self.current().span.line > self.previous().span.line
    }

    /// Skip the rest of a broken top-level declaration started at token
    /// index `start`: through the next `;` outside braces, or up to a
    /// declaration keyword that opens a later line
    fn synchronize_decl(&mut self, start: usize) {
        let from = self.pos;
        let mut depth = 0usize;
        while !self.is_at_end() {
            if depth == 0 && self.pos > start && self.at_decl_line_start() {
                break;
            }
            match self.current_kind() {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth = depth.saturating_sub(1),
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    break;
                }
                _ => {}
            }
            self.advance();
        }
        log::debug!(
            "synchronized at {} after skipping {} token(s)",
            self.current().span,
            self.pos - from
        );
    }

    // ==================== Parsing Methods ====================

    /// Parse a complete program. Syntax errors are collected, not returned.
    pub fn parse_program(&mut self) -> Program {
        let mut decls = Vec::new();

        if self.is_at_end() {
            let span = self.current().span;
            self.diagnostics.report(Error::BlankModule { span });
        }

        while !self.is_at_end() {
            let start = self.pos;
            match self.parse_decl() {
                Ok(decl) => {
                    log::debug!("parsed declaration `{}` at {}", decl.name(), decl.span);
                    decls.push(decl);
                }
                Err(err) => {
                    self.report(err);
                    self.synchronize_decl(start);
                }
            }
        }

        Program {
            decls,
            types: std::mem::take(&mut self.types),
        }
    }

    /// Parse `let|const|proto name: Type [= init];` or `struct Name { ... };`
    fn parse_decl(&mut self) -> Result<Decl> {
        let span = self.current().span;
        let modifier = match self.current_kind() {
            TokenKind::Let => Modifier::Default,
            TokenKind::Const => Modifier::Const,
            TokenKind::Proto => Modifier::Proto,
            TokenKind::Struct => return self.parse_struct_decl(),
            _ => return Err(self.unexpected("declaration")),
        };
        self.advance();

        let name = self.parse_ident()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        self.types.set_modifier(ty, modifier);

        let is_struct_def = matches!(
            self.types.kind(ty),
            TypeKind::Struct { name: None, .. }
        );

        if !is_struct_def && self.consume(&TokenKind::Semicolon) {
            return Ok(Decl {
                sym: TypedSymbol::new(name, ty),
                init: DeclInit::None,
                span,
            });
        }

        if !self.consume(&TokenKind::Eq) {
            return Err(Error::MissingEquals {
                name,
                span: self.current().span,
            });
        }

        let init = if is_struct_def {
            self.parse_struct_body(&name, ty)?;
            DeclInit::None
        } else if self.check(&TokenKind::LBrace) {
            DeclInit::Body(self.parse_block()?)
        } else if self.check(&TokenKind::LBracket) {
            DeclInit::Array(self.parse_list(TokenKind::LBracket, TokenKind::RBracket)?)
        } else {
            DeclInit::Expr(self.parse_expr()?)
        };

        self.expect(TokenKind::Semicolon)?;

        Ok(Decl {
            sym: TypedSymbol::new(name, ty),
            init,
            span,
        })
    }

    /// `struct Name { field: Type; ... };`
    fn parse_struct_decl(&mut self) -> Result<Decl> {
        let span = self.expect(TokenKind::Struct)?.span;
        let name = self.parse_ident()?;
        let ty = self.types.alloc(TypeKind::Struct {
            name: None,
            fields: None,
        });
        self.parse_struct_body(&name, ty)?;
        self.expect(TokenKind::Semicolon)?;

        Ok(Decl {
            sym: TypedSymbol::new(name, ty),
            init: DeclInit::None,
            span,
        })
    }

    /// `{ field: Type; ... }`, stored as the field list of `ty`
    fn parse_struct_body(&mut self, name: &str, ty: TypeId) -> Result<()> {
        let span = self.expect(TokenKind::LBrace)?.span;

        let mut fields = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            fields.push(self.parse_typed_symbol()?);
            self.expect(TokenKind::Semicolon)?;
        }
        self.expect(TokenKind::RBrace)?;

        if fields.is_empty() {
            return Err(Error::EmptyStruct {
                name: name.to_string(),
                span,
            });
        }

        if let TypeKind::Struct { fields: slot, .. } = self.types.kind_mut(ty) {
            *slot = Some(fields);
        }
        Ok(())
    }

    /// `name: Type`
    fn parse_typed_symbol(&mut self) -> Result<TypedSymbol> {
        let name = self.parse_ident()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        Ok(TypedSymbol::new(name, ty))
    }

    /// Take the identifier text out of the current token
    fn parse_ident(&mut self) -> Result<String> {
        let span = self.current().span;
        match &mut self.tokens[self.pos] {
            Token {
                kind: TokenKind::Ident(name),
                ..
            } => {
                let name = std::mem::take(name);
                self.advance();
                Ok(name)
            }
            token => Err(Error::ExpectedIdent {
                got: token.kind.to_string(),
                span,
            }),
        }
    }

    // ==================== Type Parsing ====================

    fn parse_type(&mut self) -> Result<TypeId> {
        let token = self.current().clone();

        let mut ty = match token.kind {
            TokenKind::I32 => self.primitive(TypeKind::Int(IntType::I32)),
            TokenKind::I64 => self.primitive(TypeKind::Int(IntType::I64)),
            TokenKind::U32 => self.primitive(TypeKind::Int(IntType::U32)),
            TokenKind::U64 => self.primitive(TypeKind::Int(IntType::U64)),
            TokenKind::Char => self.primitive(TypeKind::Char),
            TokenKind::Bool => self.primitive(TypeKind::Bool),
            TokenKind::Void => self.primitive(TypeKind::Void),
            TokenKind::Struct => {
                self.advance();
                // `struct =` opens a definition, `struct Name` refers to one
                let name = if self.check(&TokenKind::Eq) {
                    None
                } else {
                    Some(self.parse_ident()?)
                };
                self.types.alloc(TypeKind::Struct { name, fields: None })
            }
            TokenKind::LParen => self.parse_function_type()?,
            _ => {
                return Err(Error::ExpectedType {
                    got: token.kind.to_string(),
                    span: token.span,
                })
            }
        };

        loop {
            if self.consume(&TokenKind::Star) {
                ty = self.types.pointer_to(ty, false);
            } else if self.consume(&TokenKind::At) {
                self.types.set_modifier(ty, Modifier::Const);
                ty = self.types.pointer_to(ty, true);
            } else {
                break;
            }
        }

        Ok(ty)
    }

    fn primitive(&mut self, kind: TypeKind) -> TypeId {
        self.advance();
        self.types.alloc(kind)
    }

    /// `(a: T, ...) -> R`
    fn parse_function_type(&mut self) -> Result<TypeId> {
        self.expect(TokenKind::LParen)?;

        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            params.push(self.parse_typed_symbol()?);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Arrow)?;

        let ret = self.parse_type()?;
        Ok(self.types.alloc(TypeKind::Function { params, ret }))
    }

    // ==================== Statement Parsing ====================

    fn parse_block(&mut self) -> Result<Block> {
        let span = self.expect(TokenKind::LBrace)?.span;

        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let start = self.pos;
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(err) => {
                    let err_span = err.span();
                    self.report(err);
                    self.recover(start, Some(&TokenKind::RBrace));
                    stmts.push(Stmt::new(StmtKind::Error, err_span));
                }
            }
        }

        self.expect(TokenKind::RBrace)?;
        Ok(Block::new(stmts, span))
    }

    fn parse_stmt(&mut self) -> Result<Stmt> {
        let span = self.current().span;

        let kind = match self.current_kind() {
            TokenKind::Let | TokenKind::Const | TokenKind::Struct => {
                StmtKind::Decl(Box::new(self.parse_decl()?))
            }
            TokenKind::LBrace => StmtKind::Block(self.parse_block()?),
            TokenKind::If => return self.parse_if(),
            TokenKind::While => {
                self.advance();
                let cond = self.parse_condition()?;
                let body = self.parse_block()?;
                StmtKind::While { cond, body }
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.check(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(TokenKind::Semicolon)?;
                StmtKind::Return(value)
            }
            TokenKind::Break => {
                self.advance();
                self.expect(TokenKind::Semicolon)?;
                StmtKind::Break
            }
            TokenKind::Continue => {
                self.advance();
                self.expect(TokenKind::Semicolon)?;
                StmtKind::Continue
            }
            TokenKind::Asm => StmtKind::Asm(self.parse_asm()?),
            _ => {
                let expr = self.parse_expr()?;
                self.expect(TokenKind::Semicolon)?;
                StmtKind::Expr(expr)
            }
        };

        Ok(Stmt::new(kind, span))
    }

    /// `( expr )`
    fn parse_condition(&mut self) -> Result<Expr> {
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        Ok(cond)
    }

    /// `if (cond) { ... } [else { ... } | else if ...]`
    fn parse_if(&mut self) -> Result<Stmt> {
        let span = self.expect(TokenKind::If)?.span;
        let cond = self.parse_condition()?;
        let then_block = self.parse_block()?;

        let else_block = if self.consume(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                let nested = self.parse_if()?;
                let nested_span = nested.span;
                Some(Block::new(vec![nested], nested_span))
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };

        Ok(Stmt::new(
            StmtKind::If {
                cond,
                then_block,
                else_block,
            },
            span,
        ))
    }

    /// `asm(code [, constraints [, [operands] [, [operands]]]]);`
    ///
    /// A single operand list holds inputs; with two, outputs come first.
    fn parse_asm(&mut self) -> Result<AsmStmt> {
        self.expect(TokenKind::Asm)?;
        self.expect(TokenKind::LParen)?;

        let code = self.parse_expr()?;
        let mut constraints = None;
        let mut lists = Vec::new();

        if self.consume(&TokenKind::Comma) {
            constraints = Some(self.parse_expr()?);
            while lists.len() < 2 && self.consume(&TokenKind::Comma) {
                lists.push(self.parse_list(TokenKind::LBracket, TokenKind::RBracket)?);
            }
        }

        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Semicolon)?;

        let mut lists = lists.into_iter();
        let (outputs, inputs) = match (lists.next(), lists.next()) {
            (Some(outputs), Some(inputs)) => (outputs, inputs),
            (Some(inputs), None) => (Vec::new(), inputs),
            _ => (Vec::new(), Vec::new()),
        };

        Ok(AsmStmt {
            code,
            constraints,
            outputs,
            inputs,
        })
    }

    /// Comma-separated expressions between `open` and `close`
    fn parse_list(&mut self, open: TokenKind, close: TokenKind) -> Result<Vec<Expr>> {
        self.expect(open)?;

        let mut items = Vec::new();
        while !self.check(&close) && !self.is_at_end() {
            items.push(self.parse_expr()?);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(close)?;
        Ok(items)
    }

    // ==================== Expression Parsing (Pratt) ====================

    pub(crate) fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let Some(bp) = self.current_kind().binary_precedence() else {
                break;
            };

            if bp < min_bp {
                break;
            }

            let op_token = self.advance();
            let span = left.span;

            // Assignment is right-associative
            if let Some(op) = Self::token_to_assign(&op_token.kind) {
                let value = self.parse_expr_bp(bp)?;
                left = Expr::new(
                    ExprKind::Assign {
                        op,
                        target: Box::new(left),
                        value: Box::new(value),
                    },
                    span,
                );
                continue;
            }

            let op = Self::token_to_binop(&op_token)?;
            let right = self.parse_expr_bp(bp + 1)?;

            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.current_kind() {
            TokenKind::Minus => UnOp::Neg,
            TokenKind::Not => UnOp::Not,
            TokenKind::Tilde => UnOp::BitNot,
            TokenKind::And => UnOp::AddrOf,
            TokenKind::Star => UnOp::Deref,
            TokenKind::Sizeof => UnOp::SizeOf,
            TokenKind::PlusPlus => UnOp::PreInc,
            TokenKind::MinusMinus => UnOp::PreDec,
            _ => return self.parse_postfix(),
        };
        let span = self.advance().span;
        let operand = self.parse_unary()?;

        // Negative literals are constants, not negations
        if op == UnOp::Neg {
            if let ExprKind::IntLit(value) = operand.kind {
                return Ok(self.int_literal(-value, span));
            }
        }

        let kind = ExprKind::Unary {
            op,
            operand: Box::new(operand),
        };
        Ok(if op == UnOp::Deref {
            Expr::lvalue(kind, span)
        } else {
            Expr::new(kind, span)
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            let span = expr.span;
            match self.current_kind() {
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expr::lvalue(
                        ExprKind::Index {
                            base: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                TokenKind::Dot => {
                    self.advance();
                    let field = self.parse_primary()?;
                    expr = Expr::lvalue(
                        ExprKind::Member {
                            base: Box::new(expr),
                            field: Box::new(field),
                        },
                        span,
                    );
                }
                TokenKind::Arrow => {
                    // p->f is (*p).f
                    self.advance();
                    let field = self.parse_primary()?;
                    let deref = Expr::lvalue(
                        ExprKind::Unary {
                            op: UnOp::Deref,
                            operand: Box::new(expr),
                        },
                        span,
                    );
                    let base = Expr::lvalue(ExprKind::Paren(Box::new(deref)), span);
                    expr = Expr::lvalue(
                        ExprKind::Member {
                            base: Box::new(base),
                            field: Box::new(field),
                        },
                        span,
                    );
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let op = if self.advance().kind == TokenKind::PlusPlus {
                        PostOp::Inc
                    } else {
                        PostOp::Dec
                    };
                    expr = Expr::new(
                        ExprKind::Postfix {
                            op,
                            operand: Box::new(expr),
                        },
                        span,
                    );
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let span = self.current().span;

        let expr = match &mut self.tokens[self.pos].kind {
            TokenKind::IntLit(value) => {
                let value = *value;
                self.advance();
                self.int_literal(value, span)
            }
            TokenKind::StringLit(text) => {
                let text = std::mem::take(text);
                self.advance();
                Expr::new(ExprKind::StrLit(text), span)
            }
            TokenKind::CharLit(c) => {
                let c = *c;
                self.advance();
                Expr::new(ExprKind::CharLit(c), span)
            }
            TokenKind::True | TokenKind::False => {
                let value = self.advance().kind == TokenKind::True;
                Expr::new(ExprKind::BoolLit(value), span)
            }
            TokenKind::Null => {
                self.advance();
                Expr::new(ExprKind::Null, span)
            }
            TokenKind::Ident(_) => {
                let name = self.parse_ident()?;
                if self.check(&TokenKind::LParen) {
                    let args = self.parse_list(TokenKind::LParen, TokenKind::RParen)?;
                    Expr::new(ExprKind::Call { name, args }, span)
                } else {
                    Expr::lvalue(ExprKind::Ident(name), span)
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                let is_lvalue = inner.is_lvalue;
                let mut expr = Expr::new(ExprKind::Paren(Box::new(inner)), span);
                expr.is_lvalue = is_lvalue;
                expr
            }
            TokenKind::Cast => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let inner = self.parse_expr()?;
                self.expect(TokenKind::Comma)?;
                let target = self.parse_type()?;
                self.expect(TokenKind::RParen)?;
                Expr::new(
                    ExprKind::Cast {
                        expr: Box::new(inner),
                        target,
                        implicit: false,
                    },
                    span,
                )
            }
            kind => {
                return Err(Error::ExpectedExpr {
                    got: kind.to_string(),
                    span,
                })
            }
        };

        Ok(expr)
    }

    /// Integer literal typed with the smallest integer type that fits
    fn int_literal(&mut self, value: i64, span: Span) -> Expr {
        let ty = self.types.int(IntType::smallest_fit(value));
        Expr::new(ExprKind::IntLit(value), span).with_type(ty)
    }

    fn token_to_assign(kind: &TokenKind) -> Option<Option<BinOp>> {
        match kind {
            TokenKind::Eq => Some(None),
            TokenKind::PlusEq => Some(Some(BinOp::Add)),
            TokenKind::MinusEq => Some(Some(BinOp::Sub)),
            TokenKind::StarEq => Some(Some(BinOp::Mul)),
            TokenKind::SlashEq => Some(Some(BinOp::Div)),
            TokenKind::PercentEq => Some(Some(BinOp::Mod)),
            TokenKind::AndEq => Some(Some(BinOp::BitAnd)),
            TokenKind::OrEq => Some(Some(BinOp::BitOr)),
            TokenKind::CaretEq => Some(Some(BinOp::BitXor)),
            _ => None,
        }
    }

    fn token_to_binop(token: &Token) -> Result<BinOp> {
        let op = match token.kind {
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Star => BinOp::Mul,
            TokenKind::Slash => BinOp::Div,
            TokenKind::Percent => BinOp::Mod,
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::Ne => BinOp::Ne,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::Le => BinOp::Le,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::Ge => BinOp::Ge,
            TokenKind::AndAnd => BinOp::And,
            TokenKind::OrOr => BinOp::Or,
            TokenKind::And => BinOp::BitAnd,
            TokenKind::Or => BinOp::BitOr,
            TokenKind::Caret => BinOp::BitXor,
            TokenKind::Shl => BinOp::Shl,
            TokenKind::Shr => BinOp::Shr,
            _ => {
                return Err(Error::UnexpectedToken {
                    expected: "binary operator".to_string(),
                    got: token.kind.to_string(),
                    span: token.span,
                })
            }
        };
        Ok(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> (Program, Diagnostics) {
        let mut parser = Parser::new(Lexer::new(source));
        let program = parser.parse_program();
        (program, parser.take_diagnostics())
    }

    fn parse_ok(source: &str) -> Program {
        let (program, diags) = parse(source);
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags.errors());
        program
    }

    fn global_expr(program: &Program, index: usize) -> &Expr {
        match &program.decls[index].init {
            DeclInit::Expr(expr) => expr,
            other => panic!("expected expression initializer, got {:?}", other),
        }
    }

    #[test]
    fn test_simple_global() {
        let program = parse_ok("let x: i32 = 5;");

        assert_eq!(program.decls.len(), 1);
        assert_eq!(program.decls[0].name(), "x");
        let expr = global_expr(&program, 0);
        assert!(matches!(expr.kind, ExprKind::IntLit(5)));
        assert_eq!(expr.ty.map(|t| program.types.display(t)).as_deref(), Some("i32"));
    }

    #[test]
    fn test_large_literal_is_i64() {
        let program = parse_ok("let x: i64 = 5000000000;");
        let expr = global_expr(&program, 0);
        assert_eq!(expr.ty.map(|t| program.types.display(t)).as_deref(), Some("i64"));
    }

    #[test]
    fn test_negative_literal_is_folded() {
        let program = parse_ok("let x: i32 = -7;");
        assert!(matches!(global_expr(&program, 0).kind, ExprKind::IntLit(-7)));
    }

    #[test]
    fn test_precedence() {
        let program = parse_ok("let f: () -> void = { x = 1 + 2 * 3 == 7 && y; };");
        let DeclInit::Body(body) = &program.decls[0].init else {
            panic!("expected body");
        };
        let StmtKind::Expr(expr) = &body.stmts[0].kind else {
            panic!("expected expression statement");
        };

        // x = (((1 + (2 * 3)) == 7) && y)
        let ExprKind::Assign { op: None, value, .. } = &expr.kind else {
            panic!("expected assignment");
        };
        let ExprKind::Binary { op: BinOp::And, left, .. } = &value.kind else {
            panic!("expected &&");
        };
        let ExprKind::Binary { op: BinOp::Eq, left, .. } = &left.kind else {
            panic!("expected ==");
        };
        let ExprKind::Binary { op: BinOp::Add, right, .. } = &left.kind else {
            panic!("expected +");
        };
        assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let program = parse_ok("let f: () -> void = { a = b = c; };");
        let DeclInit::Body(body) = &program.decls[0].init else {
            panic!("expected body");
        };
        let StmtKind::Expr(expr) = &body.stmts[0].kind else {
            panic!("expected expression statement");
        };
        let ExprKind::Assign { target, value, .. } = &expr.kind else {
            panic!("expected assignment");
        };
        assert_eq!(target.as_ident(), Some("a"));
        assert!(matches!(value.kind, ExprKind::Assign { .. }));
    }

    #[test]
    fn test_lvalue_flags() {
        let program = parse_ok("let f: () -> void = { *p = a[1]; (x) = s.f; g() = 1; };");
        let DeclInit::Body(body) = &program.decls[0].init else {
            panic!("expected body");
        };
        let targets: Vec<(bool, bool)> = body
            .stmts
            .iter()
            .map(|stmt| match &stmt.kind {
                StmtKind::Expr(Expr {
                    kind: ExprKind::Assign { target, value, .. },
                    ..
                }) => (target.is_lvalue, value.is_lvalue),
                other => panic!("unexpected statement {:?}", other),
            })
            .collect();

        assert_eq!(targets, vec![(true, true), (true, true), (false, false)]);
    }

    #[test]
    fn test_arrow_desugars_to_deref_member() {
        let program = parse_ok("let f: () -> void = { p->next = null; };");
        let DeclInit::Body(body) = &program.decls[0].init else {
            panic!("expected body");
        };
        let StmtKind::Expr(expr) = &body.stmts[0].kind else {
            panic!("expected expression statement");
        };
        let ExprKind::Assign { target, .. } = &expr.kind else {
            panic!("expected assignment");
        };
        let ExprKind::Member { base, field } = &target.kind else {
            panic!("expected member access");
        };
        assert_eq!(field.as_ident(), Some("next"));
        let ExprKind::Paren(inner) = &base.kind else {
            panic!("expected parenthesized deref");
        };
        assert!(matches!(inner.kind, ExprKind::Unary { op: UnOp::Deref, .. }));
    }

    #[test]
    fn test_types() {
        let program = parse_ok(
            "proto f: (s: char@, n: usize) -> i32**;\n\
             let p: struct node* = null;",
        );

        assert_eq!(
            program.types.display(program.decls[0].ty()),
            "(s: char@, n: u64) -> i32**"
        );
        assert_eq!(program.types.modifier(program.decls[0].ty()), Modifier::Proto);
        assert_eq!(program.types.display(program.decls[1].ty()), "struct node*");
    }

    #[test]
    fn test_const_pointer_marks_pointee_const() {
        let program = parse_ok("let s: char@ = null;");
        let pointee = program.types.pointee(program.decls[0].ty()).unwrap();
        assert_eq!(program.types.modifier(pointee), Modifier::Const);
    }

    #[test]
    fn test_struct_definitions() {
        let program = parse_ok(
            "let s: struct = { a: i32; b: bool; };\n\
             struct t { x: u64; };",
        );

        for decl in &program.decls {
            assert!(program.types.is_struct_definition(decl.ty()));
        }
        let TypeKind::Struct { fields: Some(fields), .. } = program.types.kind(program.decls[0].ty())
        else {
            panic!("expected struct definition");
        };
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_struct_is_rejected() {
        let (_, diags) = parse("let s: struct = { };");
        assert!(matches!(diags.errors()[0], Error::EmptyStruct { .. }));
    }

    #[test]
    fn test_array_initializer() {
        let program = parse_ok("let f: () -> void = { let p: i32* = [1, 2, 3]; };");
        let DeclInit::Body(body) = &program.decls[0].init else {
            panic!("expected body");
        };
        let StmtKind::Decl(decl) = &body.stmts[0].kind else {
            panic!("expected declaration");
        };
        assert!(matches!(&decl.init, DeclInit::Array(items) if items.len() == 3));
    }

    #[test]
    fn test_statements() {
        let program = parse_ok(
            "let f: (n: i32) -> i32 = {\n\
                 while (n > 0) { n = n - 1; if (n == 5) { break; } else if (n == 6) { continue; } }\n\
                 asm(\"nop\", \"=r,r\", [n], [n]);\n\
                 return n;\n\
             };",
        );
        let DeclInit::Body(body) = &program.decls[0].init else {
            panic!("expected body");
        };

        assert!(matches!(body.stmts[0].kind, StmtKind::While { .. }));
        let StmtKind::Asm(asm) = &body.stmts[1].kind else {
            panic!("expected asm");
        };
        assert_eq!((asm.outputs.len(), asm.inputs.len()), (1, 1));
        assert!(matches!(body.stmts[2].kind, StmtKind::Return(Some(_))));
    }

    #[test]
    fn test_asm_single_list_is_inputs() {
        let program = parse_ok("let f: () -> void = { asm(\"int $0x80\", \"r\", [a]); };");
        let DeclInit::Body(body) = &program.decls[0].init else {
            panic!("expected body");
        };
        let StmtKind::Asm(asm) = &body.stmts[0].kind else {
            panic!("expected asm");
        };
        assert!(asm.outputs.is_empty());
        assert_eq!(asm.inputs.len(), 1);
    }

    #[test]
    fn test_missing_equals() {
        let (program, diags) = parse("let x: i32 5;\nlet y: i32 = 2;");

        assert_eq!(diags.len(), 1);
        assert!(matches!(diags.errors()[0], Error::MissingEquals { .. }));
        assert_eq!(program.decls.len(), 1);
        assert_eq!(program.decls[0].name(), "y");
    }

    #[test]
    fn test_missing_semicolon_keeps_next_line() {
        let (program, diags) = parse("let x: i32 = 5\nlet y: i32 = 2;");

        assert_eq!(diags.len(), 1);
        assert_eq!(diags.errors()[0].span().line, 2);
        assert_eq!(program.decls.len(), 1);
        assert_eq!(program.decls[0].name(), "y");
    }

    #[test]
    fn test_broken_signature_skips_whole_definition() {
        let (program, diags) = parse(
            "let f: (a: i32 -> i32 = {\n\
                 let x: i32 = a;\n\
                 return x;\n\
             };\n\
             let g: i32 = 1;",
        );

        assert_eq!(diags.len(), 1);
        assert_eq!(diags.errors()[0].span().line, 1);
        assert_eq!(program.decls.len(), 1);
        assert_eq!(program.decls[0].name(), "g");
    }

    #[test]
    fn test_one_diagnostic_per_bad_statement() {
        let (program, diags) = parse(
            "let f: () -> void = {\n\
                 let a: i32 = ;\n\
                 a = 1;\n\
                 let b: = 2;\n\
             };",
        );

        assert_eq!(diags.len(), 2);
        assert_eq!(diags.errors()[0].span().line, 2);
        assert_eq!(diags.errors()[1].span().line, 4);
        let DeclInit::Body(body) = &program.decls[0].init else {
            panic!("expected body");
        };
        assert_eq!(body.stmts.len(), 3);
        assert!(matches!(body.stmts[1].kind, StmtKind::Expr(_)));
    }

    #[test]
    fn test_blank_module() {
        let (_, diags) = parse("   // nothing here\n");
        assert!(matches!(diags.errors()[0], Error::BlankModule { .. }));
    }

    #[test]
    fn test_lexer_errors_are_not_duplicated() {
        let (_, diags) = parse("let x: i32 = $;");
        assert_eq!(diags.len(), 1);
        assert!(matches!(diags.errors()[0], Error::UnexpectedChar { .. }));
    }
}
