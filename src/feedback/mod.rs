//! Structured Feedback Module
//!
//! Machine-readable output for editors and scripts:
//! - JSON diagnostic reports with stable error codes
//! - Compilation statistics

use serde::{Deserialize, Serialize};

use crate::frontend::ast::DeclInit;
use crate::frontend::Compilation;
use crate::utils::{Error, Phase};

// ==================== Structured Error Report ====================

/// One diagnostic in machine-readable form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Stable error code (e.g., "E0201")
    pub code: String,

    /// Phase that produced the diagnostic
    pub phase: Phase,

    /// Human-readable message
    pub message: String,

    pub location: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

// ==================== Compilation Report ====================

/// Everything a tool needs to know about one run of the front end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationReport {
    pub success: bool,

    pub source_file: String,

    pub diagnostics: Vec<ErrorReport>,

    pub stats: CompilationStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilationStats {
    /// Top-level declarations parsed
    pub declaration_count: usize,

    /// Function definitions among them
    pub function_count: usize,

    pub diagnostic_count: usize,

    /// Whether type checking ran
    pub checked: bool,
}

// ==================== Error Conversion ====================

impl ErrorReport {
    pub fn from_error(error: &Error) -> Self {
        let span = error.span();
        Self {
            code: error_code(error).to_string(),
            phase: error.phase(),
            message: error.to_string(),
            location: Location {
                line: span.line,
                column: span.col,
            },
        }
    }
}

/// Error codes group by phase: E00xx lexical, E01xx syntax, E02xx
/// declarations, E03xx expressions, E04xx statements
fn error_code(error: &Error) -> &'static str {
    match error {
        Error::UnexpectedChar { .. } => "E0001",
        Error::UnterminatedString { .. } => "E0002",
        Error::InvalidCharLiteral { .. } => "E0003",
        Error::InvalidEscape { .. } => "E0004",
        Error::InvalidIntLiteral { .. } => "E0005",
        Error::NonAsciiLiteral { .. } => "E0006",

        Error::UnexpectedToken { .. } => "E0101",
        Error::ExpectedIdent { .. } => "E0102",
        Error::ExpectedType { .. } => "E0103",
        Error::ExpectedExpr { .. } => "E0104",
        Error::MissingEquals { .. } => "E0105",
        Error::EmptyStruct { .. } => "E0106",
        Error::BlankModule { .. } => "E0107",

        Error::DuplicateDeclaration { .. } => "E0201",
        Error::DuplicateField { .. } => "E0202",
        Error::DuplicateParameter { .. } => "E0203",
        Error::PrototypeKeyword { .. } => "E0204",
        Error::PrototypeMismatch { .. } => "E0205",
        Error::InvalidPrototype { .. } => "E0206",
        Error::PrototypeWithBody { .. } => "E0207",
        Error::InvalidDeclType { .. } => "E0208",
        Error::MissingFunctionBody { .. } => "E0209",
        Error::UnexpectedBody { .. } => "E0210",
        Error::GlobalMissingInitializer { .. } => "E0211",
        Error::GlobalNotConstant { .. } => "E0212",
        Error::GlobalInvalidType { .. } => "E0213",
        Error::GlobalArrayInitializer { .. } => "E0214",
        Error::ArrayInitializerType { .. } => "E0215",
        Error::ArrayElementMismatch { .. } => "E0216",

        Error::UndeclaredIdentifier { .. } => "E0301",
        Error::UndeclaredFunction { .. } => "E0302",
        Error::NotAFunction { .. } => "E0303",
        Error::StructTypeAsValue { .. } => "E0304",
        Error::TypeMismatch { .. } => "E0305",
        Error::AssignMismatch { .. } => "E0306",
        Error::ArgCountMismatch { .. } => "E0307",
        Error::ArgTypeMismatch { .. } => "E0308",
        Error::NotAnLvalue { .. } => "E0309",
        Error::AssignToConst { .. } => "E0310",
        Error::InvalidOperand { .. } => "E0311",
        Error::OperandMismatch { .. } => "E0312",
        Error::NotAStruct { .. } => "E0313",
        Error::MemberNotIdentifier { .. } => "E0314",
        Error::UnknownField { .. } => "E0315",
        Error::UnknownStruct { .. } => "E0316",
        Error::StructCast { .. } => "E0317",

        Error::NonBoolCondition { .. } => "E0401",
        Error::JumpOutsideLoop { .. } => "E0402",
        Error::JumpNotLast { .. } => "E0403",
        Error::StatementsAfterReturn { .. } => "E0404",
        Error::MissingReturn { .. } => "E0405",
        Error::ReturnOutsideFunction { .. } => "E0406",
        Error::EmptyReturn { .. } => "E0407",
        Error::InvalidAsm { .. } => "E0408",
    }
}

impl CompilationReport {
    pub fn new(source_file: impl Into<String>, compilation: &Compilation) -> Self {
        let program = &compilation.program;
        let diagnostics: Vec<ErrorReport> = compilation
            .diagnostics
            .errors()
            .iter()
            .map(ErrorReport::from_error)
            .collect();

        let stats = CompilationStats {
            declaration_count: program.decls.len(),
            function_count: program
                .decls
                .iter()
                .filter(|decl| program.types.is_function(decl.ty()))
                .filter(|decl| matches!(decl.init, DeclInit::Body(_)))
                .count(),
            diagnostic_count: diagnostics.len(),
            checked: compilation.checked,
        };

        Self {
            success: compilation.is_ok(),
            source_file: source_file.into(),
            diagnostics,
            stats,
        }
    }

    /// Output as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Output as compact JSON (for programmatic use)
    pub fn to_json_compact(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
