//! Front end of a compiler for a small fragment shading language: lexer,
//! parser, scoped syntax tree, symbol tables and semantic checker.

pub mod ast;
pub mod context;
pub mod errors;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod symbols;
pub mod typechecker;

pub use context::{Context, Program};
pub use errors::FrontendError;
pub use typechecker::{Diagnostic, TypeChecker, Verdict};

/// Parse `source` and run the semantic checker over it.
pub fn check_source(source: &str) -> Result<(Program, Verdict), FrontendError> {
    let mut program = parser::parse(source)?;
    let verdict = TypeChecker::new().check_program(&mut program);
    Ok((program, verdict))
}
