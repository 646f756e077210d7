//! letc Compiler
//!
//! Command line driver for the letc front end.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use letc::feedback::CompilationReport;
use letc::frontend::{self, printer, Compilation};
use letc::utils::Diagnostics;

/// letc Compiler
#[derive(Parser, Debug)]
#[command(name = "letc")]
#[command(version = "0.1.0")]
#[command(about = "letc compiler front end - parse and type-check a small C-like language")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input source file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file for --emit-ast
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the type-checked tree after a clean check
    #[arg(long)]
    emit_ast: bool,

    /// Report diagnostics as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a source file for errors
    Check {
        /// Input source file
        input: PathBuf,
    },
    /// Parse a source file and print the tree
    Parse {
        /// Input source file
        input: PathBuf,
    },
    /// Print version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Some(Commands::Check { input }) => check_file(input, &cli),
        Some(Commands::Parse { input }) => parse_file(input, &cli),
        Some(Commands::Version) => {
            println!("letc 0.1.0");
            println!("letc compiler front end");
            Ok(true)
        }
        None => match &cli.input {
            Some(input) => check_file(input, &cli),
            None => {
                eprintln!("Error: No input file specified");
                eprintln!("Usage: letc <FILE> or letc check <FILE>");
                process::exit(1);
            }
        },
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn read_source(input: &Path) -> Result<String> {
    fs::read_to_string(input).with_context(|| format!("could not read `{}`", input.display()))
}

/// Print diagnostics as `[line L col C] message` lines
fn print_diagnostics(diagnostics: &Diagnostics) {
    for error in diagnostics.errors() {
        eprintln!("{}", error.render());
    }
}

/// Status line for the parse step, shown only when parsing was clean
fn parse_status(compilation: &Compilation) -> Option<String> {
    compilation
        .checked
        .then(|| format!("  [✓] Parsed {} declarations", compilation.program.decls.len()))
}

/// Check a source file. Returns whether it was free of diagnostics.
fn check_file(input: &Path, cli: &Cli) -> Result<bool> {
    let source = read_source(input)?;
    let compilation = frontend::check_source(&source);

    if cli.json {
        let report = CompilationReport::new(input.display().to_string(), &compilation);
        println!("{}", report.to_json());
        return Ok(compilation.is_ok());
    }

    println!("Checking: {}", input.display());
    if let Some(line) = parse_status(&compilation) {
        println!("{}", line);
    }

    if !compilation.is_ok() {
        print_diagnostics(&compilation.diagnostics);
        eprintln!("❌ {} error(s) found", compilation.diagnostics.len());
        return Ok(false);
    }
    println!("  [✓] Semantic analysis passed");

    if cli.emit_ast {
        let tree = printer::print_program(&compilation.program);
        match &cli.output {
            Some(path) => {
                fs::write(path, &tree)
                    .with_context(|| format!("could not write `{}`", path.display()))?;
                println!("  [✓] Wrote checked tree to {}", path.display());
            }
            None => println!("\n{}", tree),
        }
    }

    println!("✅ No errors found");
    Ok(true)
}

/// Parse a source file and print it back in source form
fn parse_file(input: &Path, cli: &Cli) -> Result<bool> {
    let source = read_source(input)?;
    let (program, diagnostics) = frontend::parse_source(&source);

    if !diagnostics.is_empty() {
        print_diagnostics(&diagnostics);
        return Ok(false);
    }

    let tree = printer::print_program(&program);
    match &cli.output {
        Some(path) => fs::write(path, &tree)
            .with_context(|| format!("could not write `{}`", path.display()))?,
        None => print!("{}", tree),
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_only_after_clean_parse() {
        let clean = frontend::check_source("let x: i32 = 1;\nlet y: i32 = x;");
        assert_eq!(
            parse_status(&clean).as_deref(),
            Some("  [✓] Parsed 2 declarations")
        );

        let broken = frontend::check_source("let x: i32 = ;\nlet y: i32 = 2;");
        assert_eq!(parse_status(&broken), None);
    }
}
