//! Code generation orchestration
//!
//! Checked tree -> register allocation -> predicated instruction stream

pub mod lowering;
pub mod regalloc;

use crate::ir::Program;
use crate::CompileError;

/// Main codegen entry point.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeGenerator {
    /// Precede the code of each source line with a `# line N` comment.
    pub annotate: bool,
}

impl CodeGenerator {
    /// Create a new code generator.
    pub fn new(annotate: bool) -> Self {
        Self { annotate }
    }

    /// Generate a fragment program from a program that passed semantic checking.
    pub fn generate(&self, program: &glint::Program) -> Result<Program, CompileError> {
        let alloc = regalloc::Allocation::build(program)?;
        let output = lowering::Lowering::new(program, &alloc, self.annotate).lower_program(program.root)?;
        tracing::debug!(
            instructions = output.instructions().count(),
            registers = output.declarations.len(),
            "generated fragment program"
        );
        Ok(output)
    }
}
