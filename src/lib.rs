//! # tiel
//!
//! A tree-walking interpreter for TiEL, a small imperative scripting
//! language with variables, closures, conditionals, loops and a single
//! built-in `print`.
//!
//! Source text goes through three phases, each of which stops at its first
//! error:
//!
//! 1. [`scanner::Scanner`] turns text into tokens.
//! 2. [`parser::Parser`] turns tokens into statements.
//! 3. [`evaluator::Evaluator`] executes the statements, writing `print`
//!    output to a caller-supplied [`evaluator::Output`].

pub mod ast;
pub mod environment;
pub mod errors;
pub mod evaluator;
pub mod parser;
pub mod printer;
pub mod scanner;
mod stack;
pub mod value;

use crate::ast::Stmt;
use crate::errors::{ScanError, TielError};
use crate::evaluator::{Evaluator, Output};
use crate::parser::Parser;
use crate::scanner::{Scanner, Token};

/// Scans `source` into tokens ending with an `Eof` token.
pub fn scan(source: &str) -> Result<Vec<Token>, ScanError> {
    Scanner::new(source).scan_tokens()
}

/// Scans and parses `source` into its top-level statements.
pub fn parse(source: &str) -> Result<Vec<Stmt>, TielError> {
    let tokens = scan(source)?;
    Ok(Parser::new(tokens).parse()?)
}

/// Runs a whole program, sending `print` output to `output`.
///
/// # Errors
/// Returns the first scan, parse or runtime error. Output written before a
/// runtime error stays written.
///
/// # Examples
/// ```
/// let mut out: Vec<u8> = Vec::new();
/// tiel::run("print(1 + 2);", &mut out).unwrap();
/// assert_eq!(String::from_utf8(out).unwrap(), "3\n");
///
/// let err = tiel::run("var x = 1 + \"A\";", &mut Vec::<u8>::new()).unwrap_err();
/// assert_eq!(err.message(), "Operands to '+' must be numbers.");
/// ```
pub fn run(source: &str, output: &mut dyn Output) -> Result<(), TielError> {
    let statements = parse(source)?;
    Evaluator::new(output).interpret(&statements)?;
    Ok(())
}
