//! Textual form of a fragment program

use super::*;
use std::fmt;

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(value) => write!(f, "{}", value),
            Literal::Float(value) if value.is_finite() && value.fract() == 0.0 => {
                write!(f, "{:.1}", value)
            }
            Literal::Float(value) => write!(f, "{}", value),
        }
    }
}

struct Vector<'a>(&'a [Literal; 4]);

impl fmt::Display for Vector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{{{}, {}, {}, {}}}", a, b, c, d)
    }
}

impl fmt::Display for Dst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reg)?;
        if let Some(lane) = self.mask {
            write!(f, ".{}", lane.letter())?;
        }
        Ok(())
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negate {
            write!(f, "-")?;
        }
        match &self.source {
            Source::Register(reg) => write!(f, "{}", reg)?,
            Source::Inline(value) => write!(f, "{}", Vector(value))?,
        }
        if let Some(lane) = self.swizzle {
            write!(f, ".{}", lane.letter())?;
        }
        Ok(())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.opcode.mnemonic(), self.dst)?;
        for src in &self.srcs {
            write!(f, ", {}", src)?;
        }
        write!(f, ";")
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Declaration::Temp(name) => write!(f, "TEMP {};", name),
            Declaration::Param { name, value } => {
                write!(f, "PARAM {} = {};", name, Vector(value))
            }
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Instruction(instruction) => write!(f, "{}", instruction),
            Line::Comment(text) => write!(f, "# {}", text),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", HEADER)?;
        for declaration in &self.declarations {
            writeln!(f, "{}", declaration)?;
        }
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        writeln!(f, "END")
    }
}
