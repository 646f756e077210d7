//! AST Printer - render a program back into source syntax
//!
//! Output re-parses to the same tree. Checked programs print inserted
//! conversions as `cast(e, T)` and synthesized returns as `return;`.

use std::fmt::Write;

use crate::frontend::ast::*;
use crate::types::{Modifier, TypeArena, TypeKind};

const INDENT: &str = "    ";

/// Binding strength used to decide where parentheses are needed
const PREC_UNARY: u8 = 12;
const PREC_POSTFIX: u8 = 13;

/// Pretty printer for the letc AST
pub struct AstPrinter<'a> {
    types: &'a TypeArena,
    output: String,
    indent: usize,
}

impl<'a> AstPrinter<'a> {
    pub fn new(types: &'a TypeArena) -> Self {
        Self {
            types,
            output: String::new(),
            indent: 0,
        }
    }

    /// Print a whole program to string
    pub fn print_program(mut self, program: &Program) -> String {
        for decl in &program.decls {
            self.print_decl(decl);
            self.output.push('\n');
        }
        self.output
    }

    /// Print a single expression to string
    pub fn print_expr(mut self, expr: &Expr) -> String {
        self.write_expr(expr, 0);
        self.output
    }

    fn pad(&mut self) {
        for _ in 0..self.indent {
            self.output.push_str(INDENT);
        }
    }

    // ==================== Declarations ====================

    fn print_decl(&mut self, decl: &Decl) {
        let ty = decl.ty();
        let keyword = match self.types.modifier(ty) {
            Modifier::Default => "let",
            Modifier::Const => "const",
            Modifier::Proto | Modifier::ProtoDefined => "proto",
        };
        write!(self.output, "{} {}: ", keyword, decl.name()).unwrap();
        self.types.write_type(&mut self.output, ty);

        if let TypeKind::Struct {
            name: None,
            fields: Some(fields),
        } = self.types.kind(ty)
        {
            self.output.push_str(" = {\n");
            self.indent += 1;
            for field in fields {
                self.pad();
                write!(self.output, "{}: ", field.name).unwrap();
                self.types.write_type(&mut self.output, field.ty);
                self.output.push_str(";\n");
            }
            self.indent -= 1;
            self.pad();
            self.output.push_str("};");
            return;
        }

        match &decl.init {
            DeclInit::None => {}
            DeclInit::Expr(expr) => {
                self.output.push_str(" = ");
                self.write_expr(expr, 0);
            }
            DeclInit::Body(block) => {
                self.output.push_str(" = ");
                self.print_block(block);
            }
            DeclInit::Array(items) => {
                self.output.push_str(" = ");
                self.write_list(items);
            }
        }
        self.output.push(';');
    }

    // ==================== Statements ====================

    fn print_block(&mut self, block: &Block) {
        self.output.push_str("{\n");
        self.indent += 1;
        for stmt in &block.stmts {
            self.pad();
            self.print_stmt(stmt);
            self.output.push('\n');
        }
        self.indent -= 1;
        self.pad();
        self.output.push('}');
    }

    fn print_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Block(block) => self.print_block(block),
            StmtKind::Decl(decl) => self.print_decl(decl),
            StmtKind::Expr(expr) => {
                self.write_expr(expr, 0);
                self.output.push(';');
            }
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                self.output.push_str("if (");
                self.write_expr(cond, 0);
                self.output.push_str(") ");
                self.print_block(then_block);
                if let Some(else_block) = else_block {
                    self.output.push_str(" else ");
                    match else_block.stmts.as_slice() {
                        [nested @ Stmt {
                            kind: StmtKind::If { .. },
                            ..
                        }] => self.print_stmt(nested),
                        _ => self.print_block(else_block),
                    }
                }
            }
            StmtKind::While { cond, body } => {
                self.output.push_str("while (");
                self.write_expr(cond, 0);
                self.output.push_str(") ");
                self.print_block(body);
            }
            StmtKind::Return(value) => {
                self.output.push_str("return");
                if let Some(value) = value {
                    self.output.push(' ');
                    self.write_expr(value, 0);
                }
                self.output.push(';');
            }
            StmtKind::Break => self.output.push_str("break;"),
            StmtKind::Continue => self.output.push_str("continue;"),
            StmtKind::Asm(asm) => self.print_asm(asm),
            StmtKind::Error => self.output.push_str("<error>;"),
        }
    }

    fn print_asm(&mut self, asm: &AsmStmt) {
        self.output.push_str("asm(");
        self.write_expr(&asm.code, 0);
        if let Some(constraints) = &asm.constraints {
            self.output.push_str(", ");
            self.write_expr(constraints, 0);
            if !asm.outputs.is_empty() {
                self.output.push_str(", ");
                self.write_list(&asm.outputs);
                self.output.push_str(", ");
                self.write_list(&asm.inputs);
            } else if !asm.inputs.is_empty() {
                self.output.push_str(", ");
                self.write_list(&asm.inputs);
            }
        }
        self.output.push_str(");");
    }

    // ==================== Expressions ====================

    fn write_list(&mut self, items: &[Expr]) {
        self.output.push('[');
        self.write_args(items);
        self.output.push(']');
    }

    fn write_args(&mut self, items: &[Expr]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.output.push_str(", ");
            }
            self.write_expr(item, 0);
        }
    }

    fn precedence(expr: &Expr) -> u8 {
        match &expr.kind {
            ExprKind::Assign { .. } => 1,
            ExprKind::Binary { op, .. } => match op {
                BinOp::Or => 2,
                BinOp::And => 3,
                BinOp::BitOr => 4,
                BinOp::BitXor => 5,
                BinOp::BitAnd => 6,
                BinOp::Eq | BinOp::Ne => 7,
                BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => 8,
                BinOp::Shl | BinOp::Shr => 9,
                BinOp::Add | BinOp::Sub => 10,
                BinOp::Mul | BinOp::Div | BinOp::Mod => 11,
            },
            ExprKind::Unary { .. } => PREC_UNARY,
            ExprKind::IntLit(n) if *n < 0 => PREC_UNARY,
            _ => PREC_POSTFIX,
        }
    }

    /// Write `expr`, parenthesized if it binds looser than `min_prec`
    fn write_expr(&mut self, expr: &Expr, min_prec: u8) {
        let wrap = Self::precedence(expr) < min_prec;
        if wrap {
            self.output.push('(');
        }

        match &expr.kind {
            ExprKind::IntLit(n) => write!(self.output, "{}", n).unwrap(),
            ExprKind::CharLit(c) => {
                self.output.push('\'');
                self.write_escaped(*c, '\'');
                self.output.push('\'');
            }
            ExprKind::StrLit(s) => {
                self.output.push('"');
                for c in s.chars() {
                    self.write_escaped(c, '"');
                }
                self.output.push('"');
            }
            ExprKind::BoolLit(b) => write!(self.output, "{}", b).unwrap(),
            ExprKind::Null => self.output.push_str("null"),
            ExprKind::Ident(name) => self.output.push_str(name),
            ExprKind::Paren(inner) => {
                self.output.push('(');
                self.write_expr(inner, 0);
                self.output.push(')');
            }
            ExprKind::Binary { op, left, right } => {
                let prec = Self::precedence(expr);
                self.write_expr(left, prec);
                write!(self.output, " {} ", op.symbol()).unwrap();
                self.write_expr(right, prec + 1);
            }
            ExprKind::Assign { op, target, value } => {
                self.write_expr(target, 2);
                match op {
                    Some(op) => write!(self.output, " {}= ", op.symbol()).unwrap(),
                    None => self.output.push_str(" = "),
                }
                self.write_expr(value, 1);
            }
            ExprKind::Unary { op, operand } => {
                self.output.push_str(op.symbol());
                // Keep `- -x` and `& &x` from gluing into `--x` / `&&x`
                if Self::precedence(operand) == PREC_UNARY {
                    self.output.push('(');
                    self.write_expr(operand, 0);
                    self.output.push(')');
                } else {
                    self.write_expr(operand, PREC_UNARY);
                }
            }
            ExprKind::Postfix { op, operand } => {
                self.write_expr(operand, PREC_POSTFIX);
                self.output.push_str(op.symbol());
            }
            ExprKind::Index { base, index } => {
                self.write_expr(base, PREC_POSTFIX);
                self.output.push('[');
                self.write_expr(index, 0);
                self.output.push(']');
            }
            ExprKind::Member { base, field } => {
                self.write_expr(base, PREC_POSTFIX);
                self.output.push('.');
                self.write_expr(field, PREC_POSTFIX);
            }
            ExprKind::Call { name, args } => {
                write!(self.output, "{}(", name).unwrap();
                self.write_args(args);
                self.output.push(')');
            }
            ExprKind::Cast { expr: inner, target, .. } => {
                self.output.push_str("cast(");
                self.write_expr(inner, 0);
                self.output.push_str(", ");
                self.types.write_type(&mut self.output, *target);
                self.output.push(')');
            }
        }

        if wrap {
            self.output.push(')');
        }
    }

    fn write_escaped(&mut self, c: char, quote: char) {
        match c {
            '\n' => self.output.push_str("\\n"),
            '\r' => self.output.push_str("\\r"),
            '\t' => self.output.push_str("\\t"),
            '\0' => self.output.push_str("\\0"),
            '\\' => self.output.push_str("\\\\"),
            c if c == quote => {
                self.output.push('\\');
                self.output.push(c);
            }
            c => self.output.push(c),
        }
    }
}

/// Render a program in source syntax
pub fn print_program(program: &Program) -> String {
    AstPrinter::new(&program.types).print_program(program)
}

/// Render one expression in source syntax
pub fn print_expr(types: &TypeArena, expr: &Expr) -> String {
    AstPrinter::new(types).print_expr(expr)
}
