//! Semantic analysis for letc
//!
//! Walks the parsed program with a scope stack, assigns a type to every
//! expression and rewrites the tree so that the code generator sees only
//! explicit operations:
//! - implicit integer widening and `void*` conversions become cast nodes
//! - `a op= b` becomes `a = a op b`
//! - `let s: char* = "..."` becomes a char array initializer
//! - void functions that can fall off their end get a trailing `return;`
//!
//! Every failure is recorded and checking continues with the next sibling.
//! An expression whose type could not be derived yields `None`; callers
//! treat that as already reported and stay silent.

use crate::frontend::ast::*;
use crate::frontend::printer;
use crate::frontend::symbols::SymbolTable;
use crate::types::{IntType, Modifier, TypeArena, TypeId, TypeKind};
use crate::utils::{Diagnostics, Error, Span};

/// Type-check a program in place, returning the diagnostics it produced
pub fn check_program(program: &mut Program) -> Diagnostics {
    let Program { decls, types } = program;
    let mut analyzer = SemanticAnalyzer::new(types);
    analyzer.analyze(decls);
    analyzer.into_diagnostics()
}

/// Checker state threaded through the traversal
pub struct SemanticAnalyzer<'a> {
    types: &'a mut TypeArena,
    symbols: SymbolTable,
    diagnostics: Diagnostics,
    /// Inside the body of a `while`
    in_loop: bool,
}

impl<'a> SemanticAnalyzer<'a> {
    pub fn new(types: &'a mut TypeArena) -> Self {
        Self {
            types,
            symbols: SymbolTable::new(),
            diagnostics: Diagnostics::new(),
            in_loop: false,
        }
    }

    /// Check every top-level declaration in source order
    pub fn analyze(&mut self, decls: &mut [Decl]) {
        for decl in decls.iter_mut() {
            self.check_decl(decl, true);
        }
        log::debug!(
            "checked {} declaration(s), {} diagnostic(s)",
            decls.len(),
            self.diagnostics.len()
        );
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    // ==================== Helpers ====================

    fn error(&mut self, error: Error) {
        self.diagnostics.report(error);
    }

    fn show(&self, ty: TypeId) -> String {
        self.types.display(ty)
    }

    fn show_expr(&self, expr: &Expr) -> String {
        printer::print_expr(self.types, expr)
    }

    fn bool_type(&mut self) -> TypeId {
        self.types.alloc(TypeKind::Bool)
    }

    /// Run `f` inside a fresh nested scope
    fn scoped<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.symbols.enter_scope();
        let result = f(self);
        self.symbols.exit_scope();
        result
    }

    /// Make an expression of type `got` fit a location of type `expected`,
    /// wrapping it in a cast when an implicit conversion applies
    fn coerce(&mut self, expected: TypeId, expr: &mut Expr) -> bool {
        let Some(got) = expr.ty else {
            return true;
        };
        if self.types.loose_eq(expected, got) {
            return true;
        }
        if self.types.can_cast_implicitly(expected, got) {
            log::trace!(
                "inserting cast from `{}` to `{}` at {}",
                self.show(got),
                self.show(expected),
                expr.span
            );
            expr.wrap_in_cast(expected);
            return true;
        }
        false
    }

    /// Whether `ty` may be the type of a declared name. `pointing` is set
    /// while looking through a pointer.
    fn valid_decl_type(&self, ty: TypeId, pointing: bool) -> bool {
        match self.types.kind(ty) {
            TypeKind::Bool | TypeKind::Char | TypeKind::Int(_) => true,
            TypeKind::Void => pointing,
            TypeKind::Pointer { pointee, .. } => self.valid_decl_type(*pointee, true),
            TypeKind::Function { params, ret } => {
                !pointing
                    && params.iter().all(|p| self.valid_decl_type(p.ty, false))
                    && (self.types.is_void(*ret) || self.valid_decl_type(*ret, false))
            }
            TypeKind::Struct { name: None, fields } => !pointing && fields.is_some(),
            TypeKind::Struct { name: Some(name), .. } => self
                .symbols
                .lookup(name)
                .is_some_and(|def| self.types.is_struct_definition(def)),
        }
    }

    // ==================== Declarations ====================

    fn check_decl(&mut self, decl: &mut Decl, global: bool) {
        let name = decl.sym.name.clone();
        let ty = decl.sym.ty;
        let span = decl.span;
        let modifier = self.types.modifier(ty);
        log::debug!("checking declaration `{}` at {}", name, span);

        let mut matched_proto = false;
        if let Some(existing) = self.symbols.lookup_local(&name) {
            if self.types.modifier(existing) != Modifier::Proto {
                self.error(Error::DuplicateDeclaration { name, span });
                return;
            }
            if modifier != Modifier::Default {
                self.error(Error::PrototypeKeyword { name, span });
                return;
            }
            if !self.types.strict_eq(existing, ty) {
                self.error(Error::PrototypeMismatch {
                    name,
                    expected: self.show(existing),
                    got: self.show(ty),
                    span,
                });
                return;
            }
            self.types.set_modifier(existing, Modifier::ProtoDefined);
            matched_proto = true;
            log::debug!("definition of `{}` matches its prototype", name);
        }

        if modifier == Modifier::Proto {
            self.check_prototype(decl);
            return;
        }

        if !matched_proto {
            self.symbols.bind(&name, ty);
        }

        if !self.valid_decl_type(ty, false) {
            self.symbols.poison(&name);
            self.error(Error::InvalidDeclType {
                ty: self.show(ty),
                name,
                span,
            });
            return;
        }

        if self.types.is_struct_definition(ty) {
            self.check_struct_fields(&name, ty, span);
            return;
        }

        if self.types.is_function(ty) {
            match &mut decl.init {
                DeclInit::Body(body) => self.check_function(ty, &name, body),
                _ => self.error(Error::MissingFunctionBody { name, span }),
            }
            return;
        }

        match &mut decl.init {
            DeclInit::Body(_) => self.error(Error::UnexpectedBody {
                ty: self.show(ty),
                name,
                span,
            }),
            DeclInit::Array(items) => self.check_array_init(&name, ty, items, global, span),
            init if global => self.check_global_init(&name, ty, init, span),
            init => self.check_local_init(ty, init),
        }
    }

    fn check_prototype(&mut self, decl: &Decl) {
        let name = decl.name().to_string();
        let ty = decl.ty();
        let span = decl.span;

        if !self.types.is_function(ty) {
            self.error(Error::InvalidPrototype {
                ty: self.show(ty),
                name,
                span,
            });
            return;
        }
        if !matches!(decl.init, DeclInit::None) {
            self.error(Error::PrototypeWithBody { name, span });
            return;
        }

        self.symbols.bind(&name, ty);
        if !self.valid_decl_type(ty, false) {
            self.symbols.poison(&name);
            self.error(Error::InvalidDeclType {
                ty: self.show(ty),
                name,
                span,
            });
        }
    }

    fn check_struct_fields(&mut self, name: &str, ty: TypeId, span: Span) {
        let TypeKind::Struct {
            fields: Some(fields),
            ..
        } = self.types.kind(ty).clone()
        else {
            return;
        };

        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                self.error(Error::DuplicateField {
                    name: name.to_string(),
                    field: field.name.clone(),
                    span,
                });
            } else if !self.valid_decl_type(field.ty, false) {
                self.error(Error::InvalidDeclType {
                    name: format!("{}.{}", name, field.name),
                    ty: self.show(field.ty),
                    span,
                });
            }
        }
    }

    fn check_array_init(
        &mut self,
        name: &str,
        ty: TypeId,
        items: &mut [Expr],
        global: bool,
        span: Span,
    ) {
        if global {
            self.error(Error::GlobalArrayInitializer {
                name: name.to_string(),
                span,
            });
            return;
        }
        let Some(elem) = self.types.pointee(ty) else {
            self.error(Error::ArrayInitializerType {
                name: name.to_string(),
                ty: self.show(ty),
                span,
            });
            return;
        };

        for (position, item) in items.iter_mut().enumerate() {
            let Some(got) = self.derive(item) else {
                continue;
            };
            if !self.coerce(elem, item) {
                self.error(Error::ArrayElementMismatch {
                    position,
                    expected: self.show(elem),
                    got: self.show(got),
                    span: item.span,
                });
            }
        }
    }

    /// Globals take a literal of the matching kind
    fn check_global_init(&mut self, name: &str, ty: TypeId, init: &mut DeclInit, span: Span) {
        let expected = match self.types.kind(ty) {
            TypeKind::Int(_) => "an integer literal",
            TypeKind::Char => "a char literal",
            TypeKind::Bool => "`true` or `false`",
            TypeKind::Pointer { .. } => "`null`",
            _ => {
                self.error(Error::GlobalInvalidType {
                    name: name.to_string(),
                    ty: self.show(ty),
                    span,
                });
                return;
            }
        };

        let DeclInit::Expr(expr) = init else {
            self.error(Error::GlobalMissingInitializer {
                name: name.to_string(),
                span,
            });
            return;
        };

        // A literal already widened by an earlier check still counts
        let mut literal = &*expr;
        while let ExprKind::Cast { expr: inner, .. } = &literal.kind {
            literal = &**inner;
        }

        let literal_matches = match (self.types.kind(ty), &literal.kind) {
            (TypeKind::Int(_), ExprKind::IntLit(_))
            | (TypeKind::Char, ExprKind::CharLit(_))
            | (TypeKind::Bool, ExprKind::BoolLit(_))
            | (TypeKind::Pointer { .. }, ExprKind::Null) => true,
            _ => false,
        };
        if !literal_matches {
            self.error(Error::GlobalNotConstant {
                name: name.to_string(),
                expected: expected.to_string(),
                span: expr.span,
            });
            return;
        }

        self.check_initializer(ty, expr);
    }

    fn check_local_init(&mut self, ty: TypeId, init: &mut DeclInit) {
        let is_char_ptr = match self.types.kind(ty) {
            TypeKind::Pointer {
                pointee,
                is_const: false,
            } => self.types.is_char(*pointee),
            _ => false,
        };

        if is_char_ptr {
            if let DeclInit::Expr(Expr {
                kind: ExprKind::StrLit(text),
                span,
                ..
            }) = init
            {
                let span = *span;
                let items = text
                    .chars()
                    .map(|c| {
                        let char_ty = self.types.alloc(TypeKind::Char);
                        Expr::new(ExprKind::CharLit(c), span).with_type(char_ty)
                    })
                    .collect::<Vec<_>>();
                log::debug!("string initializer at {} expanded to {} chars", span, items.len());
                *init = DeclInit::Array(items);
                return;
            }
        }

        if let DeclInit::Expr(expr) = init {
            self.check_initializer(ty, expr);
        }
    }

    fn check_initializer(&mut self, ty: TypeId, expr: &mut Expr) {
        let Some(got) = self.derive(expr) else {
            return;
        };
        if !self.coerce(ty, expr) {
            self.error(Error::AssignMismatch {
                expr: self.show_expr(expr),
                expected: self.show(ty),
                got: self.show(got),
                span: expr.span,
            });
        }
    }

    // ==================== Functions ====================

    fn check_function(&mut self, ty: TypeId, name: &str, body: &mut Block) {
        let TypeKind::Function { params, ret } = self.types.kind(ty).clone() else {
            return;
        };

        self.symbols.enter_scope();
        self.symbols.bind_return_type(ret);
        for param in &params {
            if self.symbols.bind(&param.name, param.ty).is_some() {
                self.error(Error::DuplicateParameter {
                    name: param.name.clone(),
                    span: body.span,
                });
            }
        }

        let returns_void = self.types.is_void(ret);
        if returns_void && !Self::ends_in_return(&mut body.stmts) {
            log::debug!("appending implicit `return;` to `{}`", name);
            let span = body.stmts.last().map_or(body.span, |s| s.span);
            body.stmts.push(Stmt::new(StmtKind::Return(None), span));
        }

        let outer_loop = std::mem::replace(&mut self.in_loop, false);
        self.check_stmts(&mut body.stmts);
        self.in_loop = outer_loop;

        if !returns_void && !Self::ends_in_return(&mut body.stmts) {
            let span = body.stmts.last().map_or(body.span, |s| s.span);
            self.error(Error::MissingReturn {
                name: name.to_string(),
                span,
            });
        }

        self.symbols.exit_scope();
    }

    /// Whether the last statement of a block guarantees a return
    fn ends_in_return(stmts: &mut [Stmt]) -> bool {
        stmts.last_mut().is_some_and(Self::is_return_worthy)
    }

    /// A `return`, or an `if`/`else` whose branches both end in one.
    /// The answer is memoized on the statement.
    fn is_return_worthy(stmt: &mut Stmt) -> bool {
        match stmt.return_worthy {
            ReturnWorthy::Yes => return true,
            ReturnWorthy::No => return false,
            ReturnWorthy::Unchecked => {}
        }

        let worthy = match &mut stmt.kind {
            StmtKind::Return(_) => true,
            StmtKind::If {
                then_block,
                else_block: Some(else_block),
                ..
            } => Self::ends_in_return(&mut then_block.stmts) && Self::ends_in_return(&mut else_block.stmts),
            _ => false,
        };

        stmt.return_worthy = if worthy {
            ReturnWorthy::Yes
        } else {
            ReturnWorthy::No
        };
        worthy
    }

    // ==================== Statements ====================

    fn check_stmts(&mut self, stmts: &mut [Stmt]) {
        let count = stmts.len();
        let mut reported_unreachable = false;

        for (i, stmt) in stmts.iter_mut().enumerate() {
            let is_last = i + 1 == count;
            if !is_last && !reported_unreachable && Self::is_return_worthy(stmt) {
                self.error(Error::StatementsAfterReturn { span: stmt.span });
                reported_unreachable = true;
            }
            self.check_stmt(stmt, is_last);
        }
    }

    fn check_stmt(&mut self, stmt: &mut Stmt, is_last: bool) {
        let span = stmt.span;

        match &mut stmt.kind {
            StmtKind::Block(block) => self.scoped(|this| this.check_stmts(&mut block.stmts)),
            StmtKind::Decl(decl) => self.check_decl(decl, false),
            StmtKind::Expr(expr) => {
                self.derive(expr);
            }
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                self.check_condition(cond);
                self.scoped(|this| this.check_stmts(&mut then_block.stmts));
                if let Some(else_block) = else_block {
                    self.scoped(|this| this.check_stmts(&mut else_block.stmts));
                }
            }
            StmtKind::While { cond, body } => {
                self.check_condition(cond);
                let outer_loop = std::mem::replace(&mut self.in_loop, true);
                self.scoped(|this| this.check_stmts(&mut body.stmts));
                self.in_loop = outer_loop;
            }
            StmtKind::Return(value) => self.check_return(value.as_mut(), span),
            StmtKind::Break => self.check_jump("break", span, is_last),
            StmtKind::Continue => self.check_jump("continue", span, is_last),
            StmtKind::Asm(asm) => self.check_asm(asm, span),
            StmtKind::Error => {}
        }
    }

    /// `break`/`continue` must sit inside a loop, as the last statement of
    /// their block
    fn check_jump(&mut self, keyword: &str, span: Span, is_last: bool) {
        if !self.in_loop {
            self.error(Error::JumpOutsideLoop {
                keyword: keyword.to_string(),
                span,
            });
        } else if !is_last {
            self.error(Error::JumpNotLast {
                keyword: keyword.to_string(),
                span,
            });
        }
    }

    fn check_condition(&mut self, cond: &mut Expr) {
        if let Some(ty) = self.derive(cond) {
            if !self.types.is_bool(ty) {
                self.error(Error::NonBoolCondition {
                    got: self.show(ty),
                    span: cond.span,
                });
            }
        }
    }

    fn check_return(&mut self, value: Option<&mut Expr>, span: Span) {
        let Some(ret) = self.symbols.return_type() else {
            self.error(Error::ReturnOutsideFunction { span });
            return;
        };

        let Some(expr) = value else {
            if !self.types.is_void(ret) {
                self.error(Error::EmptyReturn {
                    expected: self.show(ret),
                    span,
                });
            }
            return;
        };

        let Some(got) = self.derive(expr) else {
            return;
        };
        if !self.coerce(ret, expr) {
            self.error(Error::TypeMismatch {
                expected: self.show(ret),
                got: self.show(got),
                span: expr.span,
            });
        }
    }

    fn check_asm(&mut self, asm: &mut AsmStmt, span: Span) {
        if !matches!(asm.code.kind, ExprKind::StrLit(_)) {
            self.error(Error::InvalidAsm {
                message: "code must be a string literal".to_string(),
                span: asm.code.span,
            });
        }
        self.derive(&mut asm.code);

        if let Some(constraints) = &mut asm.constraints {
            if !matches!(constraints.kind, ExprKind::StrLit(_)) {
                self.error(Error::InvalidAsm {
                    message: "constraints must be a string literal".to_string(),
                    span: constraints.span,
                });
            }
            self.derive(constraints);
        }

        for output in &mut asm.outputs {
            if output.as_ident().is_none() {
                self.error(Error::InvalidAsm {
                    message: format!("output operand `{}` must be an identifier", self.show_expr(output)),
                    span,
                });
            }
            self.derive(output);
        }

        for input in &mut asm.inputs {
            self.derive(input);
        }
    }

    // ==================== Expressions ====================

    /// Derive and record the type of an expression
    fn derive(&mut self, expr: &mut Expr) -> Option<TypeId> {
        if matches!(expr.kind, ExprKind::Assign { op: Some(_), .. }) {
            Self::desugar_compound(expr);
        }
        let ty = self.derive_kind(expr);
        expr.ty = ty;
        ty
    }

    /// `a op= b` becomes `a = a op b`; the target expression is evaluated
    /// twice
    fn desugar_compound(expr: &mut Expr) {
        let ExprKind::Assign { op, target, value } = &mut expr.kind else {
            return;
        };
        let Some(op) = op.take() else {
            return;
        };

        let span = target.span;
        let left = Box::new((**target).clone());
        let right = Box::new(std::mem::replace(
            value.as_mut(),
            Expr::new(ExprKind::Null, span),
        ));
        **value = Expr::new(ExprKind::Binary { op, left, right }, span);
    }

    fn derive_kind(&mut self, expr: &mut Expr) -> Option<TypeId> {
        let span = expr.span;

        match &mut expr.kind {
            ExprKind::IntLit(value) => Some(match expr.ty {
                Some(ty) => ty,
                None => self.types.int(IntType::smallest_fit(*value)),
            }),
            ExprKind::CharLit(_) => Some(self.types.alloc(TypeKind::Char)),
            ExprKind::StrLit(_) => {
                let c = self.types.alloc_with(TypeKind::Char, Modifier::Const);
                Some(self.types.pointer_to(c, true))
            }
            ExprKind::BoolLit(_) => Some(self.bool_type()),
            ExprKind::Null => {
                let void = self.types.alloc(TypeKind::Void);
                Some(self.types.pointer_to(void, false))
            }
            ExprKind::Ident(name) => self.derive_ident(name, span),
            ExprKind::Paren(inner) => self.derive(inner),
            ExprKind::Binary { op, left, right } => self.derive_binary(*op, left, right),
            ExprKind::Assign { target, value, .. } => self.derive_assign(target, value),
            ExprKind::Unary { op, operand } => self.derive_unary(*op, operand, span),
            ExprKind::Postfix { op, operand } => {
                let ty = self.derive(operand)?;
                self.check_inc_dec(op.symbol(), operand, ty)
            }
            ExprKind::Index { base, index } => self.derive_index(base, index),
            ExprKind::Member { base, field } => self.derive_member(base, field, span),
            ExprKind::Call { name, args } => self.derive_call(name, args, span),
            ExprKind::Cast { expr: inner, target, .. } => {
                let target = *target;
                self.derive(inner);
                if self.types.is_struct(target) {
                    self.error(Error::StructCast {
                        ty: self.show(target),
                        span,
                    });
                    return None;
                }
                Some(target)
            }
        }
    }

    fn derive_ident(&mut self, name: &str, span: Span) -> Option<TypeId> {
        let Some(ty) = self.symbols.lookup(name) else {
            self.error(Error::UndeclaredIdentifier {
                name: name.to_string(),
                span,
            });
            return None;
        };
        if self.symbols.is_poisoned(name) {
            return None;
        }
        if self.types.is_struct_definition(ty) {
            self.error(Error::StructTypeAsValue {
                name: name.to_string(),
                span,
            });
            return None;
        }
        Some(ty)
    }

    /// Widen the narrower of two integer operands to the wider width. The
    /// widened operand keeps its own signedness.
    fn cast_up(&mut self, left: &mut Expr, left_ty: &mut TypeId, right: &mut Expr, right_ty: &mut TypeId) {
        let (Some(l), Some(r)) = (self.types.int_type(*left_ty), self.types.int_type(*right_ty)) else {
            return;
        };
        if l.width < r.width {
            let widened = self.types.int(l.widened_to(r));
            log::trace!("widening left operand at {} to `{}`", left.span, self.show(widened));
            left.wrap_in_cast(widened);
            *left_ty = widened;
        } else if r.width < l.width {
            let widened = self.types.int(r.widened_to(l));
            log::trace!("widening right operand at {} to `{}`", right.span, self.show(widened));
            right.wrap_in_cast(widened);
            *right_ty = widened;
        }
    }

    fn derive_binary(&mut self, op: BinOp, left: &mut Expr, right: &mut Expr) -> Option<TypeId> {
        let left_ty = self.derive(left);
        let right_ty = self.derive(right);
        let (Some(mut l), Some(mut r)) = (left_ty, right_ty) else {
            return None;
        };

        if op.is_logical() {
            let mut ok = true;
            for (ty, side) in [(l, &*left), (r, &*right)] {
                if !self.types.is_bool(ty) {
                    self.error(Error::InvalidOperand {
                        op: op.symbol().to_string(),
                        expected: "`bool` operands".to_string(),
                        got: self.show(ty),
                        span: side.span,
                    });
                    ok = false;
                }
            }
            return ok.then(|| self.bool_type());
        }

        self.cast_up(left, &mut l, right, &mut r);

        let comparison = op.is_comparison();
        let expected = if comparison {
            "integer or `char` operands"
        } else {
            "integer operands"
        };

        let mut ok = true;
        for (ty, side) in [(l, &*left), (r, &*right)] {
            let accepted = self.types.is_int(ty) || (comparison && self.types.is_char(ty));
            if !accepted {
                self.error(Error::InvalidOperand {
                    op: op.symbol().to_string(),
                    expected: expected.to_string(),
                    got: self.show(ty),
                    span: side.span,
                });
                ok = false;
            }
        }
        if !ok {
            return None;
        }

        if !self.types.loose_eq(l, r) {
            self.error(Error::OperandMismatch {
                op: op.symbol().to_string(),
                left: self.show(l),
                right: self.show(r),
                span: left.span,
            });
            return None;
        }

        if op.is_comparison() {
            Some(self.bool_type())
        } else {
            Some(l)
        }
    }

    fn derive_assign(&mut self, target: &mut Expr, value: &mut Expr) -> Option<TypeId> {
        let target_ty = self.derive(target);
        let value_ty = self.derive(value);

        if !target.is_lvalue {
            self.error(Error::NotAnLvalue {
                expr: self.show_expr(target),
                span: target.span,
            });
            return None;
        }
        let (Some(t), Some(v)) = (target_ty, value_ty) else {
            return None;
        };

        if self.types.modifier(t) != Modifier::Default {
            self.error(Error::AssignToConst {
                expr: self.show_expr(target),
                span: target.span,
            });
            return None;
        }

        if !self.coerce(t, value) {
            self.error(Error::AssignMismatch {
                expr: self.show_expr(value),
                expected: self.show(t),
                got: self.show(v),
                span: value.span,
            });
            return None;
        }
        Some(t)
    }

    fn derive_unary(&mut self, op: UnOp, operand: &mut Expr, span: Span) -> Option<TypeId> {
        let ty = self.derive(operand)?;

        let invalid = |this: &mut Self, expected: &str, got: String| -> Option<TypeId> {
            this.error(Error::InvalidOperand {
                op: op.symbol().trim().to_string(),
                expected: expected.to_string(),
                got,
                span,
            });
            None
        };

        match op {
            UnOp::AddrOf => {
                if !operand.is_lvalue {
                    self.error(Error::NotAnLvalue {
                        expr: self.show_expr(operand),
                        span: operand.span,
                    });
                    return None;
                }
                let is_const = self.types.modifier(ty) == Modifier::Const;
                Some(self.types.pointer_to(ty, is_const))
            }
            UnOp::Deref => match self.types.pointee(ty) {
                Some(pointee) => Some(pointee),
                None => {
                    let got = self.show(ty);
                    invalid(self, "a pointer", got)
                }
            },
            UnOp::Neg | UnOp::BitNot => {
                if self.types.is_int(ty) {
                    Some(ty)
                } else {
                    let got = self.show(ty);
                    invalid(self, "an integer", got)
                }
            }
            UnOp::Not => {
                if self.types.is_bool(ty) {
                    Some(ty)
                } else {
                    let got = self.show(ty);
                    invalid(self, "a `bool`", got)
                }
            }
            UnOp::SizeOf => Some(self.types.int(IntType::U64)),
            UnOp::PreInc | UnOp::PreDec => self.check_inc_dec(op.symbol(), operand, ty),
        }
    }

    /// `++`/`--` need a mutable integer lvalue
    fn check_inc_dec(&mut self, symbol: &str, operand: &Expr, ty: TypeId) -> Option<TypeId> {
        if !operand.is_lvalue {
            self.error(Error::NotAnLvalue {
                expr: self.show_expr(operand),
                span: operand.span,
            });
            return None;
        }
        if !self.types.is_int(ty) {
            self.error(Error::InvalidOperand {
                op: symbol.to_string(),
                expected: "an integer".to_string(),
                got: self.show(ty),
                span: operand.span,
            });
            return None;
        }
        if self.types.modifier(ty) != Modifier::Default {
            self.error(Error::AssignToConst {
                expr: self.show_expr(operand),
                span: operand.span,
            });
            return None;
        }
        Some(ty)
    }

    fn derive_index(&mut self, base: &mut Expr, index: &mut Expr) -> Option<TypeId> {
        let base_ty = self.derive(base);
        let index_ty = self.derive(index);
        let (Some(b), Some(i)) = (base_ty, index_ty) else {
            return None;
        };

        let Some(elem) = self.types.pointee(b) else {
            self.error(Error::InvalidOperand {
                op: "[]".to_string(),
                expected: "a pointer".to_string(),
                got: self.show(b),
                span: base.span,
            });
            return None;
        };
        if self.types.int_type(i) != Some(IntType::I32) {
            self.error(Error::InvalidOperand {
                op: "[]".to_string(),
                expected: "an `i32` index".to_string(),
                got: self.show(i),
                span: index.span,
            });
            return None;
        }
        Some(elem)
    }

    fn derive_member(&mut self, base: &mut Expr, field: &mut Expr, span: Span) -> Option<TypeId> {
        let base_ty = self.derive(base)?;

        let Some(field_name) = field.as_ident().map(str::to_string) else {
            self.error(Error::MemberNotIdentifier {
                expr: self.show_expr(field),
                span: field.span,
            });
            return None;
        };

        let TypeKind::Struct {
            name: Some(struct_name),
            ..
        } = self.types.kind(base_ty)
        else {
            self.error(Error::NotAStruct {
                ty: self.show(base_ty),
                span: base.span,
            });
            return None;
        };
        let struct_name = struct_name.clone();

        let definition = self
            .symbols
            .lookup(&struct_name)
            .filter(|&def| self.types.is_struct_definition(def));
        let Some(definition) = definition else {
            self.error(Error::UnknownStruct {
                name: struct_name,
                span,
            });
            return None;
        };

        let found = match self.types.kind(definition) {
            TypeKind::Struct {
                fields: Some(fields),
                ..
            } => fields.iter().find(|f| f.name == field_name).map(|f| f.ty),
            _ => None,
        };
        match found {
            Some(ty) => {
                field.ty = Some(ty);
                Some(ty)
            }
            None => {
                self.error(Error::UnknownField {
                    name: struct_name,
                    field: field_name,
                    span: field.span,
                });
                None
            }
        }
    }

    fn derive_call(&mut self, name: &str, args: &mut [Expr], span: Span) -> Option<TypeId> {
        for arg in args.iter_mut() {
            self.derive(arg);
        }

        let Some(callee) = self.symbols.lookup(name) else {
            self.error(Error::UndeclaredFunction {
                name: name.to_string(),
                span,
            });
            return None;
        };
        if self.symbols.is_poisoned(name) {
            return None;
        }
        let TypeKind::Function { params, ret } = self.types.kind(callee).clone() else {
            self.error(Error::NotAFunction {
                name: name.to_string(),
                span,
            });
            return None;
        };

        if params.len() != args.len() {
            self.error(Error::ArgCountMismatch {
                name: name.to_string(),
                expected: params.len(),
                got: args.len(),
                span,
            });
            return Some(ret);
        }

        for (position, (param, arg)) in params.iter().zip(args.iter_mut()).enumerate() {
            let Some(got) = arg.ty else {
                continue;
            };
            if !self.coerce(param.ty, arg) {
                self.error(Error::ArgTypeMismatch {
                    name: name.to_string(),
                    position: position + 1,
                    expected: self.show(param.ty),
                    got: self.show(got),
                    span: arg.span,
                });
            }
        }

        Some(ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::check_source;
    use crate::frontend::printer::print_program;
    use pretty_assertions::assert_eq;

    fn diagnostics(source: &str) -> Vec<Error> {
        let compilation = check_source(source);
        assert!(compilation.checked, "parse failed: {:?}", compilation.diagnostics);
        compilation.diagnostics.into_vec()
    }

    fn assert_clean(source: &str) -> Program {
        let compilation = check_source(source);
        assert!(
            compilation.diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            compilation.diagnostics
        );
        compilation.program
    }

    fn body(program: &Program, index: usize) -> &Block {
        match &program.decls[index].init {
            DeclInit::Body(block) => block,
            other => panic!("expected function body, got {:?}", other),
        }
    }

    fn local_init(stmt: &Stmt) -> &DeclInit {
        match &stmt.kind {
            StmtKind::Decl(decl) => &decl.init,
            other => panic!("expected declaration, got {:?}", other),
        }
    }

    fn fn_wrap(stmts: &str) -> String {
        format!("let main: () -> void = {{\n{}\n}};", stmts)
    }

    // ==================== Scenarios ====================

    #[test]
    fn test_global_literal_binding() {
        let program = assert_clean("let x: i32 = 5;");
        assert_eq!(program.types.display(program.decls[0].ty()), "i32");
    }

    #[test]
    fn test_return_type_mismatch_is_single_diagnostic() {
        let errors = diagnostics(
            "let f: () -> i32 = { let x: i64 = 1; return x; };\n\
             let g: () -> i32 = { return 2; };\n\
             let h: i32 = true;",
        );

        assert_eq!(errors.len(), 2);
        assert!(matches!(&errors[0], Error::TypeMismatch { expected, got, .. } if expected == "i32" && got == "i64"));
        // Checking went on to the later declarations
        assert!(matches!(errors[1], Error::GlobalNotConstant { .. }));
    }

    #[test]
    fn test_struct_field_lookup() {
        let program = assert_clean(
            "let s: struct = { a: i32; b: bool; };\n\
             let main: () -> void = {\n\
                 let v: struct s;\n\
                 let y: i32 = v.a;\n\
                 let z: bool = v.b;\n\
             };",
        );

        let DeclInit::Expr(init) = local_init(&body(&program, 1).stmts[1]) else {
            panic!("expected initializer");
        };
        assert_eq!(init.ty.map(|t| program.types.display(t)).as_deref(), Some("i32"));
    }

    #[test]
    fn test_struct_field_lookup_at_global_scope() {
        // Struct instances and non-literal initializers are not allowed as
        // globals, so the same declarations at top level are rejected
        let errors = diagnostics(
            "let s: struct = { a: i32; b: bool; };\n\
             let v: struct s;\n\
             let y: i32 = v.a;",
        );

        assert_eq!(errors.len(), 2);
        assert!(matches!(&errors[0], Error::GlobalInvalidType { name, .. } if name == "v"));
        assert!(matches!(&errors[1], Error::GlobalNotConstant { name, .. } if name == "y"));
    }

    #[test]
    fn test_break_outside_loop() {
        let compilation = check_source(&fn_wrap("break;"));

        assert!(!compilation.is_ok());
        let errors = compilation.diagnostics.into_vec();
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], Error::JumpOutsideLoop { keyword, .. } if keyword == "break"));
    }

    // ==================== Widening ====================

    #[test]
    fn test_local_widening_inserts_cast() {
        let program = assert_clean(&fn_wrap("let x: i32 = 5;\nlet y: i64 = x;"));

        let DeclInit::Expr(init) = local_init(&body(&program, 0).stmts[1]) else {
            panic!("expected initializer");
        };
        let ExprKind::Cast { expr, target, implicit } = &init.kind else {
            panic!("expected cast, got {:?}", init.kind);
        };
        assert!(*implicit);
        assert_eq!(program.types.display(*target), "i64");
        assert_eq!(expr.as_ident(), Some("x"));
    }

    #[test]
    fn test_every_widening_pair_gets_a_cast() {
        for (wide, narrow) in [("i64", "i32"), ("u64", "i32"), ("i64", "u32"), ("u64", "u32")] {
            let source = fn_wrap(&format!("let a: {} = 1;\nlet b: {} = 2;\nb = a;", narrow, wide));
            let program = assert_clean(&source);
            let StmtKind::Expr(assign) = &body(&program, 0).stmts[2].kind else {
                panic!("expected assignment");
            };
            let ExprKind::Assign { value, .. } = &assign.kind else {
                panic!("expected assignment");
            };
            assert!(
                matches!(value.kind, ExprKind::Cast { implicit: true, .. }),
                "{} <- {} should widen",
                wide,
                narrow
            );
        }
    }

    #[test]
    fn test_narrowing_is_rejected() {
        let errors = diagnostics(&fn_wrap("let a: i64 = 1;\nlet b: i32 = a;"));
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], Error::AssignMismatch { .. }));
    }

    #[test]
    fn test_signedness_is_ignored_for_equal_widths() {
        let program = assert_clean(&fn_wrap("let a: u32 = 1;\nlet b: i32 = a;"));
        let DeclInit::Expr(init) = local_init(&body(&program, 0).stmts[1]) else {
            panic!("expected initializer");
        };
        assert!(init.as_ident().is_some());
    }

    #[test]
    fn test_binary_widening_keeps_narrow_signedness() {
        let program = assert_clean(&fn_wrap(
            "let a: u32 = 1;\nlet b: i64 = 2;\nlet c: i64 = a + b;",
        ));

        let DeclInit::Expr(init) = local_init(&body(&program, 0).stmts[2]) else {
            panic!("expected initializer");
        };
        let ExprKind::Binary { left, .. } = &init.kind else {
            panic!("expected binary");
        };
        assert!(matches!(left.kind, ExprKind::Cast { implicit: true, .. }));
        // The widened u32 stays unsigned and the result takes its type
        assert_eq!(left.ty.map(|t| program.types.display(t)).as_deref(), Some("u64"));
        assert_eq!(init.ty.map(|t| program.types.display(t)).as_deref(), Some("u64"));
    }

    #[test]
    fn test_null_converts_to_any_pointer() {
        let program = assert_clean("let p: i32* = null;");
        let DeclInit::Expr(init) = &program.decls[0].init else {
            panic!("expected initializer");
        };
        assert!(matches!(init.kind, ExprKind::Cast { .. }));
    }

    #[test]
    fn test_call_arguments_are_widened() {
        let program = assert_clean(
            "proto put: (v: u64) -> void;\n\
             let main: () -> void = { put(7); };",
        );
        let StmtKind::Expr(call) = &body(&program, 1).stmts[0].kind else {
            panic!("expected call");
        };
        let ExprKind::Call { args, .. } = &call.kind else {
            panic!("expected call");
        };
        assert!(matches!(args[0].kind, ExprKind::Cast { .. }));
    }

    // ==================== Scopes ====================

    #[test]
    fn test_shadowing_restores_outer_binding() {
        let program = assert_clean(&fn_wrap(
            "let x: i32 = 1;\n\
             { let x: bool = true; let b: bool = x; }\n\
             let y: i32 = x;",
        ));

        let DeclInit::Expr(init) = local_init(&body(&program, 0).stmts[2]) else {
            panic!("expected initializer");
        };
        assert_eq!(init.ty.map(|t| program.types.display(t)).as_deref(), Some("i32"));
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        let errors = diagnostics(&fn_wrap("let x: i32 = 1;\nlet x: i32 = 2;"));
        assert!(matches!(&errors[..], [Error::DuplicateDeclaration { name, .. }] if name == "x"));
    }

    #[test]
    fn test_block_locals_do_not_escape() {
        let errors = diagnostics(&fn_wrap("{ let x: i32 = 1; }\nx = 2;"));
        assert!(matches!(&errors[..], [Error::UndeclaredIdentifier { name, .. }] if name == "x"));
    }

    #[test]
    fn test_recursion_sees_own_binding() {
        assert_clean(
            "let fib: (n: i32) -> i32 = {\n\
                 if (n < 2) { return n; }\n\
                 return fib(n - 1) + fib(n - 2);\n\
             };",
        );
    }

    // ==================== Return analysis ====================

    #[test]
    fn test_void_function_gets_implicit_return() {
        let program = assert_clean(&fn_wrap("let x: i32 = 1;"));
        let stmts = &body(&program, 0).stmts;
        assert_eq!(stmts.len(), 2);
        assert!(matches!(stmts[1].kind, StmtKind::Return(None)));
    }

    #[test]
    fn test_if_else_both_returning_is_return_worthy() {
        let program = assert_clean(
            "let abs: (n: i32) -> i32 = {\n\
                 if (n < 0) { return -n; } else { return n; }\n\
             };",
        );
        assert_eq!(body(&program, 0).stmts[0].return_worthy, ReturnWorthy::Yes);
    }

    #[test]
    fn test_if_without_else_is_not_return_worthy() {
        let errors = diagnostics(
            "let f: (n: i32) -> i32 = {\n\
                 if (n < 0) { return 0; }\n\
             };",
        );
        assert!(matches!(&errors[..], [Error::MissingReturn { name, .. }] if name == "f"));
    }

    #[test]
    fn test_statements_after_return() {
        let errors = diagnostics(
            "let f: () -> i32 = {\n\
                 return 1;\n\
                 return 2;\n\
             };",
        );
        assert!(matches!(&errors[..], [Error::StatementsAfterReturn { span }] if span.line == 2));
    }

    #[test]
    fn test_empty_return_in_non_void_function() {
        let errors = diagnostics("let f: () -> i32 = { return; };");
        assert!(matches!(&errors[..], [Error::EmptyReturn { .. }]));
    }

    #[test]
    fn test_loop_control_placement() {
        assert_clean(&fn_wrap(
            "let i: i32 = 0;\nwhile (i < 10) { i++; if (i == 5) { continue; } }",
        ));

        let errors = diagnostics(&fn_wrap("while (true) { break; let x: i32 = 1; }"));
        assert!(matches!(&errors[..], [Error::JumpNotLast { .. }]));
    }

    #[test]
    fn test_conditions_must_be_bool() {
        let errors = diagnostics(&fn_wrap("let i: i32 = 0;\nwhile (i) { i = i - 1; }"));
        assert!(matches!(&errors[..], [Error::NonBoolCondition { got, .. }] if got == "i32"));
    }

    // ==================== Prototypes ====================

    #[test]
    fn test_prototype_then_definition() {
        let program = assert_clean(
            "proto add: (a: i32, b: i32) -> i32;\n\
             let main: () -> void = { let x: i32 = add(1, 2); };\n\
             let add: (x: i32, y: i32) -> i32 = { return x + y; };",
        );
        assert_eq!(program.types.modifier(program.decls[0].ty()), Modifier::ProtoDefined);
    }

    #[test]
    fn test_prototype_requires_strict_match() {
        let errors = diagnostics(
            "proto f: (a: i32) -> i32;\n\
             let f: (a: u32) -> i32 = { return 0; };",
        );
        assert!(matches!(&errors[..], [Error::PrototypeMismatch { .. }]));
    }

    #[test]
    fn test_prototype_rules() {
        let errors = diagnostics(
            "proto x: i32;\n\
             proto f: () -> void;\n\
             const f: () -> void = { return; };\n\
             proto g: () -> void;\n\
             let g: () -> void = { return; };\n\
             let g: () -> void = { return; };",
        );

        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], Error::InvalidPrototype { .. }));
        assert!(matches!(errors[1], Error::PrototypeKeyword { .. }));
        assert!(matches!(errors[2], Error::DuplicateDeclaration { .. }));
    }

    #[test]
    fn test_function_needs_body() {
        let errors = diagnostics("let f: () -> void;");
        assert!(matches!(&errors[..], [Error::MissingFunctionBody { .. }]));
    }

    // ==================== Expressions ====================

    #[test]
    fn test_call_errors() {
        let errors = diagnostics(&fn_wrap(
            "let v: i32 = 0;\n\
             nope();\n\
             v(1);\n\
             main(1);",
        ));

        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], Error::UndeclaredFunction { .. }));
        assert!(matches!(errors[1], Error::NotAFunction { .. }));
        assert!(matches!(errors[2], Error::ArgCountMismatch { expected: 0, got: 1, .. }));
    }

    #[test]
    fn test_argument_type_mismatch() {
        let errors = diagnostics(
            "proto take: (flag: bool, n: i32) -> void;\n\
             let main: () -> void = { take(true, 'c'); };",
        );
        assert!(matches!(&errors[..], [Error::ArgTypeMismatch { position: 2, .. }]));
    }

    #[test]
    fn test_lvalues_and_constness() {
        let errors = diagnostics(&fn_wrap(
            "const k: i32 = 1;\n\
             let s: char@ = \"abc\";\n\
             k = 2;\n\
             s[0] = 'x';\n\
             1 = 2;",
        ));

        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], Error::AssignToConst { .. }));
        assert!(matches!(errors[1], Error::AssignToConst { .. }));
        assert!(matches!(errors[2], Error::NotAnLvalue { .. }));
    }

    #[test]
    fn test_address_of_const_yields_const_pointer() {
        let errors = diagnostics(&fn_wrap(
            "const k: i32 = 1;\n\
             let ok: i32@ = &k;\n\
             let bad: i32* = &k;",
        ));
        assert!(matches!(&errors[..], [Error::AssignMismatch { expected, got, .. }] if expected == "i32*" && got == "i32@"));
    }

    #[test]
    fn test_pointer_operations() {
        assert_clean(&fn_wrap(
            "let x: i32 = 1;\n\
             let p: i32* = &x;\n\
             *p = *p + 1;\n\
             p[0] = 3;\n\
             let n: u64 = sizeof x;",
        ));

        let errors = diagnostics(&fn_wrap("let x: i32 = 1;\nlet y: i32 = *x;"));
        assert!(matches!(&errors[..], [Error::InvalidOperand { expected, .. }] if expected == "a pointer"));
    }

    #[test]
    fn test_index_must_be_i32() {
        let errors = diagnostics(&fn_wrap("let p: i32* = null;\nlet i: u64 = 0;\nlet v: i32 = p[i];"));
        assert!(matches!(&errors[..], [Error::InvalidOperand { op, .. }] if op == "[]"));
    }

    #[test]
    fn test_arrow_member_access() {
        assert_clean(
            "struct node { value: i32; next: struct node*; };\n\
             let sum: (n: struct node*) -> i32 = {\n\
                 return n->value + n->next->value;\n\
             };",
        );
    }

    #[test]
    fn test_member_errors() {
        let errors = diagnostics(
            "struct s { a: i32; };\n\
             let main: () -> void = {\n\
                 let v: struct s;\n\
                 let x: i32 = v.missing;\n\
                 let y: i32 = 0;\n\
                 let z: i32 = y.a;\n\
             };",
        );

        assert_eq!(errors.len(), 2);
        assert!(matches!(&errors[0], Error::UnknownField { field, .. } if field == "missing"));
        assert!(matches!(errors[1], Error::NotAStruct { .. }));
    }

    #[test]
    fn test_struct_type_names_are_not_values() {
        let errors = diagnostics(
            "struct s { a: i32; };\n\
             let main: () -> void = { let x: i32 = s; };",
        );
        assert!(matches!(&errors[..], [Error::StructTypeAsValue { .. }]));
    }

    #[test]
    fn test_struct_validation() {
        let errors = diagnostics(
            "struct pair { a: i32; a: bool; };\n\
             let main: () -> void = { let v: struct missing; };",
        );

        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], Error::DuplicateField { .. }));
        assert!(matches!(errors[1], Error::InvalidDeclType { .. }));
    }

    #[test]
    fn test_invalid_declaration_types() {
        let errors = diagnostics(&fn_wrap("let v: void = 1;"));
        assert!(matches!(&errors[..], [Error::InvalidDeclType { .. }]));
    }

    #[test]
    fn test_invalid_declaration_is_reported_once() {
        let errors = diagnostics(&fn_wrap("let v: void;\nlet x: i32 = v;\nv = 3;"));
        assert!(matches!(&errors[..], [Error::InvalidDeclType { name, .. }] if name == "v"));

        let errors = diagnostics(&fn_wrap("let v: struct missing;\nlet x: i32 = v.a;"));
        assert!(matches!(&errors[..], [Error::InvalidDeclType { name, .. }] if name == "v"));

        // Still occupies its name in the scope
        let errors = diagnostics(&fn_wrap("let v: void;\nlet v: i32 = 1;"));
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[1], Error::DuplicateDeclaration { .. }));

        let errors = diagnostics(
            "proto f: (s: struct missing) -> i32;\n\
             let main: () -> i32 = { return f(1); };",
        );
        assert!(matches!(&errors[..], [Error::InvalidDeclType { name, .. }] if name == "f"));
    }

    #[test]
    fn test_cast_to_struct_is_rejected() {
        let errors = diagnostics(
            "struct s { a: i32; };\n\
             let main: () -> void = { let x: i64 = cast(1, i64); let y: i32 = cast(x, struct s); };",
        );
        assert!(matches!(&errors[..], [Error::StructCast { .. }]));
    }

    #[test]
    fn test_operator_rules() {
        assert_clean(&fn_wrap(
            "let a: i32 = 1;\n\
             let c: char = 'c';\n\
             let t: bool = a < 2 && c == 'd' || !(a != 3);\n\
             a = ~a << 2 | a & 1 ^ -a % 3;",
        ));

        let errors = diagnostics(&fn_wrap("let t: bool = true + 1;\nlet u: bool = 1 && true;"));
        assert_eq!(errors.len(), 2);
        assert!(matches!(&errors[0], Error::InvalidOperand { op, .. } if op == "+"));
        assert!(matches!(&errors[1], Error::InvalidOperand { op, .. } if op == "&&"));
    }

    #[test]
    fn test_errors_are_not_cascaded() {
        let errors = diagnostics(&fn_wrap("let x: i32 = (missing + 1) * 2;"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_compound_assignment_is_desugared() {
        let program = assert_clean(&fn_wrap("let x: i64 = 0;\nx += 1;"));

        let printed = print_program(&program);
        assert!(printed.contains("x = x + cast(1, i64);"), "{}", printed);
    }

    #[test]
    fn test_increment_rules() {
        let errors = diagnostics(&fn_wrap("const k: i32 = 0;\nk++;\nlet b: bool = true;\nb--;"));
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], Error::AssignToConst { .. }));
        assert!(matches!(errors[1], Error::InvalidOperand { .. }));
    }

    // ==================== Initializers ====================

    #[test]
    fn test_string_initializer_becomes_char_array() {
        let program = assert_clean(&fn_wrap("let s: char* = \"hi\";"));

        let DeclInit::Array(items) = local_init(&body(&program, 0).stmts[0]) else {
            panic!("expected array initializer");
        };
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0].kind, ExprKind::CharLit('h')));
        assert!(matches!(items[1].kind, ExprKind::CharLit('i')));
    }

    #[test]
    fn test_array_initializers() {
        assert_clean(&fn_wrap("let p: i64* = [1, 2, 3];"));

        let errors = diagnostics(&fn_wrap("let p: i32* = [1, true];\nlet q: i32 = [1];"));
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], Error::ArrayElementMismatch { position: 1, .. }));
        assert!(matches!(errors[1], Error::ArrayInitializerType { .. }));

        let errors = diagnostics("let g: i32* = [1];");
        assert!(matches!(&errors[..], [Error::GlobalArrayInitializer { .. }]));
    }

    #[test]
    fn test_global_initializers_must_be_literals() {
        assert_clean(
            "let a: i64 = -3;\n\
             let b: char = 'x';\n\
             let c: bool = false;\n\
             let d: void* = null;",
        );

        let errors = diagnostics(
            "let a: i32 = 1;\n\
             let b: i32 = a;\n\
             let c: bool;\n\
             struct s { f: i32; };\n\
             let d: struct s;",
        );
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], Error::GlobalNotConstant { .. }));
        assert!(matches!(errors[1], Error::GlobalMissingInitializer { .. }));
        assert!(matches!(errors[2], Error::GlobalInvalidType { .. }));
    }

    #[test]
    fn test_block_initializer_needs_function_type() {
        let errors = diagnostics("let x: i32 = { return 1; };");
        assert!(matches!(&errors[..], [Error::UnexpectedBody { .. }]));
    }

    #[test]
    fn test_asm_operands() {
        assert_clean(&fn_wrap(
            "let r: i64 = 0;\nlet n: i64 = 60;\nasm(\"syscall\", \"=r,r\", [r], [n]);",
        ));

        let errors = diagnostics(&fn_wrap("let r: i64 = 0;\nasm(\"nop\", \"=r\", [r + 1], [r]);"));
        assert!(matches!(&errors[..], [Error::InvalidAsm { .. }]));
    }

    #[test]
    fn test_checked_tree_round_trips() {
        let source = "let limit: i64 = 10;\n\
                      let origin: i32* = null;\n\
                      struct point { x: i32; y: i64; };\n\
                      let norm: (p: struct point*) -> i64 = {\n\
                          let s: char* = \"ok\";\n\
                          if (p->x > 0) { return p->x + p->y; } else { return p->y; }\n\
                      };\n\
                      let main: () -> void = {\n\
                          let total: u64 = 0;\n\
                          total += 2;\n\
                      };";

        let once = print_program(&assert_clean(source));
        let twice = print_program(&assert_clean(&once));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_checked_program_prints_casts_and_returns() {
        let program = assert_clean(&fn_wrap("let a: i32 = 1;\nlet b: i64 = a;"));

        assert_eq!(
            print_program(&program),
            "let main: () -> void = {\n\
             \x20   let a: i32 = 1;\n\
             \x20   let b: i64 = cast(a, i64);\n\
             \x20   return;\n\
             };\n"
        );
    }
}
