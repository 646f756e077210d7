//! Token definitions for letc

use std::fmt;

use crate::utils::Span;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn eof(span: Span) -> Self {
        Self { kind: TokenKind::Eof, span }
    }
}

/// Token kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ============ Keywords ============
    /// let
    Let,
    /// const
    Const,
    /// proto
    Proto,
    /// struct
    Struct,
    /// if
    If,
    /// else
    Else,
    /// while
    While,
    /// return
    Return,
    /// break
    Break,
    /// continue
    Continue,
    /// true
    True,
    /// false
    False,
    /// null
    Null,
    /// cast
    Cast,
    /// sizeof
    Sizeof,
    /// asm
    Asm,

    // ============ Type Keywords ============
    /// i32
    I32,
    /// i64
    I64,
    /// u32
    U32,
    /// u64 (also spelled usize)
    U64,
    /// char
    Char,
    /// bool
    Bool,
    /// void
    Void,

    // ============ Identifiers and Literals ============
    /// Identifier (variable name, function name, etc.)
    Ident(String),
    /// Integer literal
    IntLit(i64),
    /// String literal
    StringLit(String),
    /// Character literal
    CharLit(char),

    // ============ Operators ============
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,
    /// ++
    PlusPlus,
    /// --
    MinusMinus,
    /// =
    Eq,
    /// ==
    EqEq,
    /// !=
    Ne,
    /// <
    Lt,
    /// <=
    Le,
    /// >
    Gt,
    /// >=
    Ge,
    /// &&
    AndAnd,
    /// ||
    OrOr,
    /// !
    Not,
    /// &
    And,
    /// |
    Or,
    /// ^
    Caret,
    /// ~
    Tilde,
    /// <<
    Shl,
    /// >>
    Shr,
    /// +=
    PlusEq,
    /// -=
    MinusEq,
    /// *=
    StarEq,
    /// /=
    SlashEq,
    /// %=
    PercentEq,
    /// &=
    AndEq,
    /// |=
    OrEq,
    /// ^=
    CaretEq,
    /// ->
    Arrow,
    /// .
    Dot,

    // ============ Delimiters ============
    /// (
    LParen,
    /// )
    RParen,
    /// {
    LBrace,
    /// }
    RBrace,
    /// [
    LBracket,
    /// ]
    RBracket,
    /// ,
    Comma,
    /// :
    Colon,
    /// ;
    Semicolon,
    /// @ (const pointer marker)
    At,

    // ============ Special ============
    /// End of file
    Eof,
    /// A token the lexer could not scan; the diagnostic is already recorded
    Error,
}

impl TokenKind {
    /// Try to convert an identifier to a keyword
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "let" => Some(TokenKind::Let),
            "const" => Some(TokenKind::Const),
            "proto" => Some(TokenKind::Proto),
            "struct" => Some(TokenKind::Struct),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "while" => Some(TokenKind::While),
            "return" => Some(TokenKind::Return),
            "break" => Some(TokenKind::Break),
            "continue" => Some(TokenKind::Continue),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            "null" => Some(TokenKind::Null),
            "cast" => Some(TokenKind::Cast),
            "sizeof" => Some(TokenKind::Sizeof),
            "asm" => Some(TokenKind::Asm),
            "i32" => Some(TokenKind::I32),
            "i64" => Some(TokenKind::I64),
            "u32" => Some(TokenKind::U32),
            "u64" | "usize" => Some(TokenKind::U64),
            "char" => Some(TokenKind::Char),
            "bool" => Some(TokenKind::Bool),
            "void" => Some(TokenKind::Void),
            _ => None,
        }
    }

    /// Get the precedence of a binary operator (for Pratt parsing)
    /// Returns None if not a binary operator
    pub fn binary_precedence(&self) -> Option<u8> {
        match self {
            // Assignment (lowest, right-associative)
            TokenKind::Eq
            | TokenKind::PlusEq
            | TokenKind::MinusEq
            | TokenKind::StarEq
            | TokenKind::SlashEq
            | TokenKind::PercentEq
            | TokenKind::AndEq
            | TokenKind::OrEq
            | TokenKind::CaretEq => Some(1),

            // Logical OR
            TokenKind::OrOr => Some(2),

            // Logical AND
            TokenKind::AndAnd => Some(3),

            // Bitwise OR
            TokenKind::Or => Some(4),

            // Bitwise XOR
            TokenKind::Caret => Some(5),

            // Bitwise AND
            TokenKind::And => Some(6),

            // Equality
            TokenKind::EqEq | TokenKind::Ne => Some(7),

            // Comparison
            TokenKind::Lt | TokenKind::Le | TokenKind::Gt | TokenKind::Ge => Some(8),

            // Shift
            TokenKind::Shl | TokenKind::Shr => Some(9),

            // Additive
            TokenKind::Plus | TokenKind::Minus => Some(10),

            // Multiplicative (highest for binary)
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some(11),

            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Ident(name) => return write!(f, "identifier `{}`", name),
            TokenKind::IntLit(n) => return write!(f, "integer `{}`", n),
            TokenKind::StringLit(s) => return write!(f, "string {:?}", s),
            TokenKind::CharLit(c) => return write!(f, "char {:?}", c),
            TokenKind::Let => "let",
            TokenKind::Const => "const",
            TokenKind::Proto => "proto",
            TokenKind::Struct => "struct",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::Return => "return",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::Cast => "cast",
            TokenKind::Sizeof => "sizeof",
            TokenKind::Asm => "asm",
            TokenKind::I32 => "i32",
            TokenKind::I64 => "i64",
            TokenKind::U32 => "u32",
            TokenKind::U64 => "u64",
            TokenKind::Char => "char",
            TokenKind::Bool => "bool",
            TokenKind::Void => "void",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            TokenKind::Eq => "=",
            TokenKind::EqEq => "==",
            TokenKind::Ne => "!=",
            TokenKind::Lt => "<",
            TokenKind::Le => "<=",
            TokenKind::Gt => ">",
            TokenKind::Ge => ">=",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::Not => "!",
            TokenKind::And => "&",
            TokenKind::Or => "|",
            TokenKind::Caret => "^",
            TokenKind::Tilde => "~",
            TokenKind::Shl => "<<",
            TokenKind::Shr => ">>",
            TokenKind::PlusEq => "+=",
            TokenKind::MinusEq => "-=",
            TokenKind::StarEq => "*=",
            TokenKind::SlashEq => "/=",
            TokenKind::PercentEq => "%=",
            TokenKind::AndEq => "&=",
            TokenKind::OrEq => "|=",
            TokenKind::CaretEq => "^=",
            TokenKind::Arrow => "->",
            TokenKind::Dot => ".",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            TokenKind::At => "@",
            TokenKind::Eof => return write!(f, "end of file"),
            TokenKind::Error => return write!(f, "invalid token"),
        };
        write!(f, "`{}`", text)
    }
}
