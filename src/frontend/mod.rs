//! Frontend module - Lexer, Parser, Semantic Analysis

pub mod token;
pub mod lexer;
pub mod ast;
pub mod parser;
pub mod printer;
pub mod symbols;
pub mod semantic;

use crate::frontend::ast::Program;
use crate::frontend::lexer::Lexer;
use crate::frontend::parser::Parser;
use crate::utils::Diagnostics;

/// Result of running the front end over one source file
#[derive(Debug)]
pub struct Compilation {
    pub program: Program,
    pub diagnostics: Diagnostics,
    /// Whether the type checker ran. It is skipped after syntax errors.
    pub checked: bool,
}

impl Compilation {
    /// True when the program checked without a single diagnostic, the
    /// condition for handing it to a code generator
    pub fn is_ok(&self) -> bool {
        self.checked && self.diagnostics.is_empty()
    }
}

/// Scan and parse a source file
pub fn parse_source(source: &str) -> (Program, Diagnostics) {
    let mut parser = Parser::new(Lexer::new(source));
    let program = parser.parse_program();
    log::debug!(
        "parsed {} declaration(s) with {} diagnostic(s)",
        program.decls.len(),
        parser.diagnostics().len()
    );
    (program, parser.take_diagnostics())
}

/// Scan, parse and type-check a source file
pub fn check_source(source: &str) -> Compilation {
    let (mut program, mut diagnostics) = parse_source(source);

    if !diagnostics.is_empty() {
        log::info!(
            "skipping type checking after {} syntax error(s)",
            diagnostics.len()
        );
        return Compilation {
            program,
            diagnostics,
            checked: false,
        };
    }

    diagnostics.extend(semantic::check_program(&mut program));
    Compilation {
        program,
        diagnostics,
        checked: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Error;

    #[test]
    fn test_clean_program_is_ok() {
        let compilation = check_source(
            "let counter: i32 = 0;\n\
             let main: () -> i32 = { counter = counter + 1; return counter; };",
        );
        assert!(compilation.is_ok());
        assert_eq!(compilation.program.decls.len(), 2);
    }

    #[test]
    fn test_syntax_errors_skip_checking() {
        let compilation = check_source("let x: i32 = ;\nlet y: i32 = undefined_name;");

        assert!(!compilation.checked);
        assert!(!compilation.is_ok());
        // Only the syntax error; the undeclared name is never looked at
        let errors = compilation.diagnostics.errors();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], Error::ExpectedExpr { .. }));
    }

    #[test]
    fn test_semantic_errors_fail_compilation() {
        let compilation = check_source("let x: i32 = y;");
        assert!(compilation.checked);
        assert!(!compilation.is_ok());
    }
}
