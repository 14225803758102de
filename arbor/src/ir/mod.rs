//! Model of an ARB fragment program
//!
//! A program is a list of register declarations followed by straight-line
//! instructions. There are no jumps; the target executes every line.

pub mod builder;
pub mod printer;

/// Version line every program starts with.
pub const HEADER: &str = "!!ARBfp1.0";

/// Register holding intermediate values that are consumed by the next instruction.
pub const SCRATCH: &str = "__scratch";

/// Parameter with every lane false (0).
pub const FALSE: &str = "FALSE";
/// Parameter with every lane true (-1).
pub const TRUE: &str = "TRUE";
/// Parameter with every lane 1.
pub const ONE: &str = "ONE";

/// A complete fragment program
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Register declarations in output order
    pub declarations: Vec<Declaration>,
    /// Instructions and comments in execution order
    pub lines: Vec<Line>,
}

/// A register declaration
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// `TEMP name;`
    Temp(String),
    /// `PARAM name = {a, b, c, d};`
    Param {
        /// Register name
        name: String,
        /// Value of the four lanes
        value: [Literal; 4],
    },
}

/// One line of the program body
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    /// An instruction
    Instruction(Instruction),
    /// A `#` comment
    Comment(String),
}

/// A scalar written into the program text
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    /// Printed without a fraction
    Int(i32),
    /// Printed with at least one fractional digit
    Float(f32),
}

impl Literal {
    /// The boolean encoding: true is -1 in every lane, false is 0.
    pub fn bool(value: bool) -> Self {
        Literal::Int(if value { -1 } else { 0 })
    }

    /// `value` in all four lanes.
    pub fn splat(self) -> [Literal; 4] {
        [self; 4]
    }
}

/// Instruction mnemonic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// Copy
    Mov,
    /// Component-wise sum
    Add,
    /// Component-wise difference
    Sub,
    /// Component-wise product
    Mul,
    /// Component-wise maximum; logical AND on booleans
    Max,
    /// Component-wise minimum; logical OR on booleans
    Min,
    /// Select the second operand where the first is negative, else the third
    Cmp,
    /// 1 where less than, else 0
    Slt,
    /// 1 where greater or equal, else 0
    Sge,
    /// Scalar reciprocal
    Rcp,
    /// Scalar power
    Pow,
    /// Scalar reciprocal square root
    Rsq,
    /// Three-component dot product
    Dp3,
    /// Lighting coefficients
    Lit,
}

impl Opcode {
    /// Mnemonic as written in program text
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Mov => "MOV",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Max => "MAX",
            Opcode::Min => "MIN",
            Opcode::Cmp => "CMP",
            Opcode::Slt => "SLT",
            Opcode::Sge => "SGE",
            Opcode::Rcp => "RCP",
            Opcode::Pow => "POW",
            Opcode::Rsq => "RSQ",
            Opcode::Dp3 => "DP3",
            Opcode::Lit => "LIT",
        }
    }
}

/// One of the four lanes of a register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Lane 0
    X,
    /// Lane 1
    Y,
    /// Lane 2
    Z,
    /// Lane 3
    W,
}

impl Component {
    /// All lanes in order
    pub const ALL: [Component; 4] = [Component::X, Component::Y, Component::Z, Component::W];

    /// Lane for a vector index, if it is in range
    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    /// Suffix letter
    pub fn letter(self) -> char {
        match self {
            Component::X => 'x',
            Component::Y => 'y',
            Component::Z => 'z',
            Component::W => 'w',
        }
    }
}

/// Destination register, optionally restricted to one lane
#[derive(Debug, Clone, PartialEq)]
pub struct Dst {
    /// Register name
    pub reg: String,
    /// Write mask
    pub mask: Option<Component>,
}

impl Dst {
    /// Write every lane of `reg`
    pub fn reg(reg: impl Into<String>) -> Self {
        Self {
            reg: reg.into(),
            mask: None,
        }
    }

    /// Write a single lane of `reg`
    pub fn lane(reg: impl Into<String>, lane: Component) -> Self {
        Self {
            reg: reg.into(),
            mask: Some(lane),
        }
    }
}

/// Where a source operand reads from
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// A named register
    Register(String),
    /// An inline vector constant
    Inline([Literal; 4]),
}

/// Source operand
#[derive(Debug, Clone, PartialEq)]
pub struct Operand {
    /// What is read
    pub source: Source,
    /// Replicate a single lane to all four
    pub swizzle: Option<Component>,
    /// Negate before use
    pub negate: bool,
}

impl Operand {
    /// Read all lanes of `reg`
    pub fn reg(reg: impl Into<String>) -> Self {
        Self {
            source: Source::Register(reg.into()),
            swizzle: None,
            negate: false,
        }
    }

    /// An inline vector constant
    pub fn inline(value: [Literal; 4]) -> Self {
        Self {
            source: Source::Inline(value),
            swizzle: None,
            negate: false,
        }
    }

    /// The same operand, negated
    pub fn neg(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    /// Read a single lane replicated
    pub fn lane(mut self, lane: Component) -> Self {
        self.swizzle = Some(lane);
        self
    }

    /// A scalar view: the selected lane if there is one, otherwise `x`
    pub fn scalar(mut self) -> Self {
        if self.swizzle.is_none() {
            self.swizzle = Some(Component::X);
        }
        self
    }
}

/// A single instruction
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Mnemonic
    pub opcode: Opcode,
    /// Destination
    pub dst: Dst,
    /// Sources in order
    pub srcs: Vec<Operand>,
}

impl Instruction {
    /// Create an instruction
    pub fn new(opcode: Opcode, dst: Dst, srcs: Vec<Operand>) -> Self {
        Self { opcode, dst, srcs }
    }
}

impl Program {
    /// Instructions without comments
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.lines.iter().filter_map(|line| match line {
            Line::Instruction(instruction) => Some(instruction),
            Line::Comment(_) => None,
        })
    }

    /// Names of all `TEMP` registers in declaration order
    pub fn temps(&self) -> impl Iterator<Item = &str> {
        self.declarations.iter().filter_map(|decl| match decl {
            Declaration::Temp(name) => Some(name.as_str()),
            Declaration::Param { .. } => None,
        })
    }

    /// Value of a `PARAM` register
    pub fn param(&self, name: &str) -> Option<&[Literal; 4]> {
        self.declarations.iter().find_map(|decl| match decl {
            Declaration::Param { name: param, value } if param == name => Some(value),
            _ => None,
        })
    }
}
