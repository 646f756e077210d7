//! Abstract Syntax Tree definitions for letc
//!
//! The tree is produced by the parser and then rewritten in place by the
//! checker: expression types are filled in, implicit conversions become
//! explicit [`ExprKind::Cast`] nodes, and void functions gain a trailing
//! `return;`.

use crate::types::{TypeArena, TypeId, TypedSymbol};
use crate::utils::Span;

/// A complete program (compilation unit)
#[derive(Debug, Clone)]
pub struct Program {
    pub decls: Vec<Decl>,
    /// Owner of every type referenced from the tree
    pub types: TypeArena,
}

/// A declaration: variable, constant, prototype, function or struct
#[derive(Debug, Clone)]
pub struct Decl {
    pub sym: TypedSymbol,
    pub init: DeclInit,
    pub span: Span,
}

impl Decl {
    pub fn name(&self) -> &str {
        &self.sym.name
    }

    pub fn ty(&self) -> TypeId {
        self.sym.ty
    }
}

/// What follows the `=` of a declaration
#[derive(Debug, Clone, Default)]
pub enum DeclInit {
    /// `let x: T;`, prototypes and struct definitions
    #[default]
    None,
    /// `let x: T = expr;`
    Expr(Expr),
    /// `let f: (..) -> R = { ... };`
    Body(Block),
    /// `let p: T* = [a, b, c];`
    Array(Vec<Expr>),
}

/// Block of statements
#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>, span: Span) -> Self {
        Self { stmts, span }
    }
}

/// Memoized answer to "does this statement guarantee a return?"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnWorthy {
    #[default]
    Unchecked,
    No,
    Yes,
}

/// Statement
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
    pub return_worthy: ReturnWorthy,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self {
            kind,
            span,
            return_worthy: ReturnWorthy::Unchecked,
        }
    }
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    /// Nested `{ ... }`
    Block(Block),
    /// let / const declaration
    Decl(Box<Decl>),
    /// Expression statement
    Expr(Expr),
    /// if (cond) { ... } [else { ... }]
    If {
        cond: Expr,
        then_block: Block,
        else_block: Option<Block>,
    },
    /// while (cond) { ... }
    While { cond: Expr, body: Block },
    /// return [expr]
    Return(Option<Expr>),
    Break,
    Continue,
    /// asm("code", "constraints", [outputs], [inputs])
    Asm(AsmStmt),
    /// Placeholder left behind by a statement that failed to parse
    Error,
}

/// Inline assembly
#[derive(Debug, Clone)]
pub struct AsmStmt {
    pub code: Expr,
    pub constraints: Option<Expr>,
    pub outputs: Vec<Expr>,
    pub inputs: Vec<Expr>,
}

/// Expression
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    /// Filled in by the checker
    pub ty: Option<TypeId>,
    pub is_lvalue: bool,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            ty: None,
            is_lvalue: false,
            span,
        }
    }

    pub fn lvalue(kind: ExprKind, span: Span) -> Self {
        Self {
            is_lvalue: true,
            ..Self::new(kind, span)
        }
    }

    pub fn with_type(mut self, ty: TypeId) -> Self {
        self.ty = Some(ty);
        self
    }

    /// Wrap this expression in a cast to `target`
    pub fn into_cast(self, target: TypeId, implicit: bool) -> Expr {
        let span = self.span;
        Expr::new(
            ExprKind::Cast {
                expr: Box::new(self),
                target,
                implicit,
            },
            span,
        )
        .with_type(target)
    }

    /// Replace this expression in place with a cast of itself
    pub fn wrap_in_cast(&mut self, target: TypeId) {
        let span = self.span;
        let inner = std::mem::replace(self, Expr::new(ExprKind::Null, span));
        *self = inner.into_cast(target, true);
    }

    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IntLit(i64),
    CharLit(char),
    StrLit(String),
    BoolLit(bool),
    /// null
    Null,
    Ident(String),
    /// ( expr )
    Paren(Box<Expr>),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `target = value`, or `target op= value` before the checker rewrites it
    Assign {
        op: Option<BinOp>,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// Prefix operator
    Unary { op: UnOp, operand: Box<Expr> },
    /// Postfix `++` / `--`
    Postfix { op: PostOp, operand: Box<Expr> },
    /// base[index]
    Index { base: Box<Expr>, index: Box<Expr> },
    /// base.field
    Member { base: Box<Expr>, field: Box<Expr> },
    /// name(args)
    Call { name: String, args: Vec<Expr> },
    /// cast(expr, T), explicit or inserted by the checker
    Cast {
        expr: Box<Expr>,
        target: TypeId,
        implicit: bool,
    },
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
        }
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }

    /// Equality and relational operators
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }
}

/// Prefix operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    /// Negation (-)
    Neg,
    /// Logical not (!)
    Not,
    /// Bitwise not (~)
    BitNot,
    /// Address-of (&)
    AddrOf,
    /// Dereference (*)
    Deref,
    /// sizeof
    SizeOf,
    /// ++x
    PreInc,
    /// --x
    PreDec,
}

impl UnOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Not => "!",
            UnOp::BitNot => "~",
            UnOp::AddrOf => "&",
            UnOp::Deref => "*",
            UnOp::SizeOf => "sizeof ",
            UnOp::PreInc => "++",
            UnOp::PreDec => "--",
        }
    }
}

/// Postfix operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOp {
    /// x++
    Inc,
    /// x--
    Dec,
}

impl PostOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            PostOp::Inc => "++",
            PostOp::Dec => "--",
        }
    }
}
