//! Helpers for assembling a program in output order

use super::*;

/// Collects declarations and instructions for one program
pub struct ProgramBuilder {
    program: Program,
}

impl ProgramBuilder {
    /// A builder with the fixed boolean and identity parameters and the scratch
    /// register already declared
    pub fn new() -> Self {
        let mut builder = Self {
            program: Program {
                declarations: Vec::new(),
                lines: Vec::new(),
            },
        };
        builder.param(FALSE, Literal::Int(0).splat());
        builder.param(TRUE, Literal::Int(-1).splat());
        builder.param(ONE, Literal::Int(1).splat());
        builder.temp(SCRATCH);
        builder
    }

    /// Declare a `TEMP` register
    pub fn temp(&mut self, name: impl Into<String>) {
        self.program.declarations.push(Declaration::Temp(name.into()));
    }

    /// Declare a `PARAM` register
    pub fn param(&mut self, name: impl Into<String>, value: [Literal; 4]) {
        self.program.declarations.push(Declaration::Param {
            name: name.into(),
            value,
        });
    }

    /// Append an instruction
    pub fn emit(&mut self, opcode: Opcode, dst: Dst, srcs: Vec<Operand>) {
        let instruction = Instruction::new(opcode, dst, srcs);
        tracing::trace!(%instruction, "emit");
        self.program.lines.push(Line::Instruction(instruction));
    }

    /// Append a comment line
    pub fn comment(&mut self, text: impl Into<String>) {
        self.program.lines.push(Line::Comment(text.into()));
    }

    /// Finish building and return the program
    pub fn build(self) -> Program {
        self.program
    }
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}
