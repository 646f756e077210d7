//! Diagnostics for the letc front end

use crate::utils::Span;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// The compiler phase that produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Lexical,
    Syntax,
    Semantic,
}

/// Compiler error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ==================== Lexer Errors ====================

    #[error("Unrecognized character `{ch}`")]
    UnexpectedChar { ch: char, span: Span },

    #[error("Unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("Malformed character literal")]
    InvalidCharLiteral { span: Span },

    #[error("Unsupported escape sequence `\\{ch}`")]
    InvalidEscape { ch: char, span: Span },

    #[error("Could not parse int literal `{text}`")]
    InvalidIntLiteral { text: String, span: Span },

    #[error("Non-ASCII character `{ch}` in literal")]
    NonAsciiLiteral { ch: char, span: Span },

    // ==================== Parser Errors ====================

    #[error("Unexpected token: expected {expected}, got {got}")]
    UnexpectedToken {
        expected: String,
        got: String,
        span: Span,
    },

    #[error("Expected identifier, got {got}")]
    ExpectedIdent { got: String, span: Span },

    #[error("Expected type, got {got}")]
    ExpectedType { got: String, span: Span },

    #[error("Expected expression, got {got}")]
    ExpectedExpr { got: String, span: Span },

    #[error("Missing `=` in declaration of `{name}`")]
    MissingEquals { name: String, span: Span },

    #[error("Struct `{name}` must declare at least one field")]
    EmptyStruct { name: String, span: Span },

    #[error("Blank modules are not allowed")]
    BlankModule { span: Span },

    // ==================== Declaration Errors ====================

    #[error("Duplicate declaration of `{name}`")]
    DuplicateDeclaration { name: String, span: Span },

    #[error("Duplicate field `{field}` in struct `{name}`")]
    DuplicateField {
        name: String,
        field: String,
        span: Span,
    },

    #[error("Duplicate parameter `{name}`")]
    DuplicateParameter { name: String, span: Span },

    #[error("Definition of prototyped function `{name}` must use the `let` keyword")]
    PrototypeKeyword { name: String, span: Span },

    #[error("Definition of `{name}` does not match its prototype: expected `{expected}`, got `{got}`")]
    PrototypeMismatch {
        name: String,
        expected: String,
        got: String,
        span: Span,
    },

    #[error("Only functions can be prototypes, `{name}` is `{ty}`")]
    InvalidPrototype {
        name: String,
        ty: String,
        span: Span,
    },

    #[error("Prototype `{name}` cannot have a body or value")]
    PrototypeWithBody { name: String, span: Span },

    #[error("Invalid type `{ty}` for declaration `{name}`")]
    InvalidDeclType {
        name: String,
        ty: String,
        span: Span,
    },

    #[error("Must provide a function body to non-prototype declaration `{name}`")]
    MissingFunctionBody { name: String, span: Span },

    #[error("Only functions can be initialized with a statement block, `{name}` is `{ty}`")]
    UnexpectedBody {
        name: String,
        ty: String,
        span: Span,
    },

    #[error("Global declaration `{name}` is missing an initializer")]
    GlobalMissingInitializer { name: String, span: Span },

    #[error("Global `{name}` must be initialized with {expected}")]
    GlobalNotConstant {
        name: String,
        expected: String,
        span: Span,
    },

    #[error("Cannot declare global `{name}` of type `{ty}`")]
    GlobalInvalidType {
        name: String,
        ty: String,
        span: Span,
    },

    #[error("Can't use array initializers at global level yet")]
    GlobalArrayInitializer { name: String, span: Span },

    #[error("Array initializer requires a pointer type, `{name}` is `{ty}`")]
    ArrayInitializerType {
        name: String,
        ty: String,
        span: Span,
    },

    #[error("Type mismatch at position {position} of array initializer: expected `{expected}`, got `{got}`")]
    ArrayElementMismatch {
        position: usize,
        expected: String,
        got: String,
        span: Span,
    },

    // ==================== Expression Errors ====================

    #[error("Use of undeclared identifier `{name}`")]
    UndeclaredIdentifier { name: String, span: Span },

    #[error("Call to undeclared function `{name}`")]
    UndeclaredFunction { name: String, span: Span },

    #[error("`{name}` is not a function")]
    NotAFunction { name: String, span: Span },

    #[error("Can't use struct type `{name}` in expression")]
    StructTypeAsValue { name: String, span: Span },

    #[error("Type mismatch: expected `{expected}`, got `{got}`")]
    TypeMismatch {
        expected: String,
        got: String,
        span: Span,
    },

    #[error("Tried to assign `{expr}` of type `{got}` to a `{expected}`")]
    AssignMismatch {
        expr: String,
        expected: String,
        got: String,
        span: Span,
    },

    #[error("Call to `{name}` expects {expected} argument(s), got {got}")]
    ArgCountMismatch {
        name: String,
        expected: usize,
        got: usize,
        span: Span,
    },

    #[error("Argument {position} of call to `{name}`: expected `{expected}`, got `{got}`")]
    ArgTypeMismatch {
        name: String,
        position: usize,
        expected: String,
        got: String,
        span: Span,
    },

    #[error("Cannot assign to non-lvalue `{expr}`")]
    NotAnLvalue { expr: String, span: Span },

    #[error("Cannot assign to const/proto value `{expr}`")]
    AssignToConst { expr: String, span: Span },

    #[error("Operator `{op}` expects {expected}, got `{got}`")]
    InvalidOperand {
        op: String,
        expected: String,
        got: String,
        span: Span,
    },

    #[error("Mismatched operand types for `{op}`: `{left}` and `{right}`")]
    OperandMismatch {
        op: String,
        left: String,
        right: String,
        span: Span,
    },

    #[error("Cannot access member of non-struct type `{ty}`")]
    NotAStruct { ty: String, span: Span },

    #[error("Member access requires a field name, got `{expr}`")]
    MemberNotIdentifier { expr: String, span: Span },

    #[error("No such member `{field}` in struct `{name}`")]
    UnknownField {
        name: String,
        field: String,
        span: Span,
    },

    #[error("Unknown struct `{name}`")]
    UnknownStruct { name: String, span: Span },

    #[error("Casting to struct type `{ty}` is not allowed")]
    StructCast { ty: String, span: Span },

    // ==================== Statement Errors ====================

    #[error("Condition must be `bool`, got `{got}`")]
    NonBoolCondition { got: String, span: Span },

    #[error("`{keyword}` outside of a loop")]
    JumpOutsideLoop { keyword: String, span: Span },

    #[error("`{keyword}` must be the last statement of its block")]
    JumpNotLast { keyword: String, span: Span },

    #[error("Return-worthy statements must appear at the end of statement blocks")]
    StatementsAfterReturn { span: Span },

    #[error("Non-void function `{name}` must end in a valid return statement")]
    MissingReturn { name: String, span: Span },

    #[error("Return statement outside of a function")]
    ReturnOutsideFunction { span: Span },

    #[error("Empty return in function returning `{expected}`")]
    EmptyReturn { expected: String, span: Span },

    #[error("Invalid inline assembly: {message}")]
    InvalidAsm { message: String, span: Span },
}

impl Error {
    /// Get the span associated with this error
    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedChar { span, .. }
            | Self::UnterminatedString { span }
            | Self::InvalidCharLiteral { span }
            | Self::InvalidEscape { span, .. }
            | Self::InvalidIntLiteral { span, .. }
            | Self::NonAsciiLiteral { span, .. }
            | Self::UnexpectedToken { span, .. }
            | Self::ExpectedIdent { span, .. }
            | Self::ExpectedType { span, .. }
            | Self::ExpectedExpr { span, .. }
            | Self::MissingEquals { span, .. }
            | Self::EmptyStruct { span, .. }
            | Self::BlankModule { span }
            | Self::DuplicateDeclaration { span, .. }
            | Self::DuplicateField { span, .. }
            | Self::DuplicateParameter { span, .. }
            | Self::PrototypeKeyword { span, .. }
            | Self::PrototypeMismatch { span, .. }
            | Self::InvalidPrototype { span, .. }
            | Self::PrototypeWithBody { span, .. }
            | Self::InvalidDeclType { span, .. }
            | Self::MissingFunctionBody { span, .. }
            | Self::UnexpectedBody { span, .. }
            | Self::GlobalMissingInitializer { span, .. }
            | Self::GlobalNotConstant { span, .. }
            | Self::GlobalInvalidType { span, .. }
            | Self::GlobalArrayInitializer { span, .. }
            | Self::ArrayInitializerType { span, .. }
            | Self::ArrayElementMismatch { span, .. }
            | Self::UndeclaredIdentifier { span, .. }
            | Self::UndeclaredFunction { span, .. }
            | Self::NotAFunction { span, .. }
            | Self::StructTypeAsValue { span, .. }
            | Self::TypeMismatch { span, .. }
            | Self::AssignMismatch { span, .. }
            | Self::ArgCountMismatch { span, .. }
            | Self::ArgTypeMismatch { span, .. }
            | Self::NotAnLvalue { span, .. }
            | Self::AssignToConst { span, .. }
            | Self::InvalidOperand { span, .. }
            | Self::OperandMismatch { span, .. }
            | Self::NotAStruct { span, .. }
            | Self::MemberNotIdentifier { span, .. }
            | Self::UnknownField { span, .. }
            | Self::UnknownStruct { span, .. }
            | Self::StructCast { span, .. }
            | Self::NonBoolCondition { span, .. }
            | Self::JumpOutsideLoop { span, .. }
            | Self::JumpNotLast { span, .. }
            | Self::StatementsAfterReturn { span }
            | Self::MissingReturn { span, .. }
            | Self::ReturnOutsideFunction { span }
            | Self::EmptyReturn { span, .. }
            | Self::InvalidAsm { span, .. } => *span,
        }
    }

    /// The phase this diagnostic belongs to
    pub fn phase(&self) -> Phase {
        match self {
            Self::UnexpectedChar { .. }
            | Self::UnterminatedString { .. }
            | Self::InvalidCharLiteral { .. }
            | Self::InvalidEscape { .. }
            | Self::InvalidIntLiteral { .. }
            | Self::NonAsciiLiteral { .. } => Phase::Lexical,
            Self::UnexpectedToken { .. }
            | Self::ExpectedIdent { .. }
            | Self::ExpectedType { .. }
            | Self::ExpectedExpr { .. }
            | Self::MissingEquals { .. }
            | Self::EmptyStruct { .. }
            | Self::BlankModule { .. } => Phase::Syntax,
            _ => Phase::Semantic,
        }
    }

    /// Render as `[line L col C] message`
    pub fn render(&self) -> String {
        let span = self.span();
        format!("[line {} col {}] {}", span.line, span.col, self)
    }
}

/// An ordered collection of diagnostics, owned by whichever phase is running
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    errors: Vec<Error>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic
    pub fn report(&mut self, error: Error) {
        log::debug!("diagnostic: {}", error.render());
        self.errors.push(error);
    }

    /// Append every diagnostic of another phase
    pub fn extend(&mut self, other: Diagnostics) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn into_vec(self) -> Vec<Error> {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_location() {
        let err = Error::UndeclaredIdentifier {
            name: "x".to_string(),
            span: Span::new(3, 7),
        };
        assert_eq!(err.render(), "[line 3 col 7] Use of undeclared identifier `x`");
        assert_eq!(err.phase(), Phase::Semantic);
    }

    #[test]
    fn test_diagnostics_preserve_order() {
        let mut diags = Diagnostics::new();
        diags.report(Error::BlankModule { span: Span::new(1, 1) });
        diags.report(Error::UnterminatedString { span: Span::new(2, 4) });
        assert_eq!(diags.len(), 2);
        assert_eq!(diags.errors()[0].phase(), Phase::Syntax);
        assert_eq!(diags.errors()[1].span(), Span::new(2, 4));
    }
}
