//! Arbor - branch-free ARB fragment program backend for glint
//!
//! Arbor turns a glint shader that passed semantic checking into an
//! `!!ARBfp1.0` program. The target has no jumps, so `if` statements are
//! lowered to predicates and conditional writes.

#![warn(missing_docs)]

pub mod codegen;
pub mod ir;

use glint::{FrontendError, TypeChecker, Verdict};

/// Arbor compiler version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Main compiler interface
#[derive(Debug, Clone, Copy, Default)]
pub struct Compiler {
    /// Emit `# line N` comments ahead of the code for each source line
    pub annotate: bool,
}

impl Compiler {
    /// Create a new compiler with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// The same compiler with line annotations switched on or off
    pub fn with_annotations(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    /// Parse, check and compile shader source text.
    pub fn compile_source(&self, source: &str) -> Result<ir::Program, CompileError> {
        let mut program = glint::parser::parse(source)?;
        self.compile_program(&mut program)
    }

    /// Check and compile a parsed program. Nothing is generated unless the
    /// semantic check passes.
    pub fn compile_program(&self, program: &mut glint::Program) -> Result<ir::Program, CompileError> {
        let verdict = TypeChecker::new().check_program(program);
        if !verdict.passed() {
            tracing::debug!(
                diagnostics = verdict.diagnostics.len(),
                "semantic check failed, skipping code generation"
            );
            return Err(CompileError::Rejected(verdict));
        }
        codegen::CodeGenerator::new(self.annotate).generate(program)
    }
}

/// Compilation errors
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Lex or parse error
    #[error(transparent)]
    Frontend(#[from] FrontendError),
    /// The program failed semantic checking
    #[error("semantic check failed with {} diagnostic(s)", .0.diagnostics.len())]
    Rejected(Verdict),
    /// A variable with no declaration reached code generation
    #[error("unresolved variable '{name}' at line {line}, column {column}")]
    UnresolvedVariable {
        /// Variable name
        name: String,
        /// Line of the use
        line: usize,
        /// Column of the use
        column: usize,
    },
    /// The tree was not in the shape the checker guarantees
    #[error("internal compiler error: {0}")]
    Internal(String),
}
