//! Checked tree to fragment program lowering
//!
//! Every expression is evaluated unconditionally into its own register. An `if`
//! only decides which writes stick: its condition becomes a predicate, and each
//! assignment below it is a `CMP` that keeps the old value where the predicate
//! says the arm was not taken.

use glint::ast::{Arm, BinaryOp, Builtin, NodeId, NodeKind, Tree, UnaryOp, Visitor};
use glint::Program;

use super::regalloc::{literal_scalar, Allocation};
use crate::ir::builder::ProgramBuilder;
use crate::ir::{self, Component, Dst, Literal, Opcode, Operand, FALSE, SCRATCH, TRUE};
use crate::CompileError;

/// Lower a checked program using a finished register allocation.
pub struct Lowering<'a> {
    tree: &'a Tree,
    alloc: &'a Allocation,
    out: ProgramBuilder,
    annotate: bool,
    last_line: Option<usize>,
    error: Option<CompileError>,
}

impl<'a> Lowering<'a> {
    /// Create a lowering context over `program`.
    pub fn new(program: &'a Program, alloc: &'a Allocation, annotate: bool) -> Self {
        Self {
            tree: &program.tree,
            alloc,
            out: ProgramBuilder::new(),
            annotate,
            last_line: None,
            error: None,
        }
    }

    /// Declare every register and emit the body of the program rooted at `root`.
    pub fn lower_program(mut self, root: NodeId) -> Result<ir::Program, CompileError> {
        for register in self.alloc.variable_registers() {
            self.out.temp(register.as_str());
        }
        for register in self.alloc.temp_registers() {
            self.out.temp(register.as_str());
        }
        for (name, value) in self.alloc.constant_params() {
            self.out.param(name.as_str(), *value);
        }

        let tree = self.tree;
        tree.walk(root, &mut self);
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.out.build()),
        }
    }

    fn emit(&mut self, opcode: Opcode, dst: Dst, srcs: Vec<Operand>) {
        self.out.emit(opcode, dst, srcs);
    }

    fn annotate(&mut self, id: NodeId) {
        let line = self.tree.loc(id).line;
        if self.last_line != Some(line) {
            self.out.comment(format!("line {}", line));
            self.last_line = Some(line);
        }
    }

    fn lower(&mut self, id: NodeId) -> Result<(), CompileError> {
        let tree = self.tree;
        match tree.kind(id) {
            NodeKind::Declaration {
                init: Some(init), ..
            } => {
                let register = self.variable(id)?;
                let value = self.operand(*init)?;
                self.emit(Opcode::Mov, Dst::reg(register), vec![value]);
            }
            NodeKind::Assignment { target, value } => self.lower_assignment(id, *target, *value)?,
            NodeKind::Unary { op, operand } => self.lower_unary(id, *op, *operand)?,
            NodeKind::Binary { op, lhs, rhs } => self.lower_binary(id, *op, *lhs, *rhs)?,
            NodeKind::FunctionCall { func, args } => self.lower_call(id, *func, args)?,
            NodeKind::Constructor { ty, args } => self.lower_constructor(id, *ty, args)?,
            _ => {}
        }

        // The predicate is ready as soon as the condition has been computed.
        if let Some(parent) = tree.parent(id) {
            if let NodeKind::If { condition, .. } = tree.kind(parent) {
                if *condition == id {
                    self.lower_predicate(parent, id)?;
                }
            }
        }
        Ok(())
    }

    fn lower_unary(&mut self, id: NodeId, op: UnaryOp, operand: NodeId) -> Result<(), CompileError> {
        let t = self.temp(id)?;
        let a = self.operand(operand)?;
        match op {
            UnaryOp::Negate => self.emit(Opcode::Mov, Dst::reg(t), vec![a.neg()]),
            UnaryOp::Not => self.emit(
                Opcode::Cmp,
                Dst::reg(t),
                vec![a, Operand::reg(FALSE), Operand::reg(TRUE)],
            ),
        }
        Ok(())
    }

    fn lower_binary(
        &mut self,
        id: NodeId,
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
    ) -> Result<(), CompileError> {
        let t = self.temp(id)?;
        let a = self.operand(lhs)?;
        let b = self.operand(rhs)?;
        let dst = Dst::reg(t.as_str());
        let result = Operand::reg(t.as_str());
        let scratch = Operand::reg(SCRATCH);
        let lanes = self.tree.ty(lhs).dimension();

        match op {
            BinaryOp::Add => self.emit(Opcode::Add, dst, vec![a, b]),
            BinaryOp::Subtract => self.emit(Opcode::Sub, dst, vec![a, b]),
            BinaryOp::Multiply => self.emit(Opcode::Mul, dst, vec![a, b]),
            BinaryOp::And => self.emit(Opcode::Max, dst, vec![a, b]),
            BinaryOp::Or => self.emit(Opcode::Min, dst, vec![a, b]),
            BinaryOp::Divide => {
                self.emit(Opcode::Rcp, Dst::reg(SCRATCH), vec![b.scalar()]);
                self.emit(Opcode::Mul, dst, vec![a, scratch]);
            }
            BinaryOp::Power => self.emit(Opcode::Pow, dst, vec![a.scalar(), b.scalar()]),
            BinaryOp::Less => self.compare(&t, Opcode::Slt, a, b),
            BinaryOp::LessEqual => self.compare(&t, Opcode::Sge, b, a),
            BinaryOp::Greater => self.compare(&t, Opcode::Slt, b, a),
            BinaryOp::GreaterEqual => self.compare(&t, Opcode::Sge, a, b),
            BinaryOp::Equal => {
                self.emit(Opcode::Sge, dst.clone(), vec![a.clone(), b.clone()]);
                self.emit(Opcode::Sge, Dst::reg(SCRATCH), vec![b, a]);
                self.emit(Opcode::Mul, dst, vec![result, scratch.neg()]);
                self.reduce(&t, Opcode::Max, lanes);
            }
            BinaryOp::NotEqual => {
                self.emit(Opcode::Slt, dst.clone(), vec![a.clone(), b.clone()]);
                self.emit(Opcode::Slt, Dst::reg(SCRATCH), vec![b, a]);
                self.emit(Opcode::Add, dst, vec![result.neg(), scratch.neg()]);
                self.reduce(&t, Opcode::Min, lanes);
            }
        }
        Ok(())
    }

    /// `SLT`/`SGE` yield 1 for true; booleans are carried as -1.
    fn compare(&mut self, t: &str, opcode: Opcode, a: Operand, b: Operand) {
        self.emit(opcode, Dst::reg(t), vec![a, b]);
        self.emit(Opcode::Mov, Dst::reg(t), vec![Operand::reg(t).neg()]);
    }

    /// Fold the first `lanes` lanes of `t` into every lane.
    fn reduce(&mut self, t: &str, opcode: Opcode, lanes: usize) {
        if lanes < 2 {
            return;
        }
        self.emit(
            opcode,
            Dst::reg(t),
            vec![
                Operand::reg(t).lane(Component::X),
                Operand::reg(t).lane(Component::Y),
            ],
        );
        for lane in Component::ALL.iter().take(lanes).skip(2) {
            self.emit(
                opcode,
                Dst::reg(t),
                vec![Operand::reg(t), Operand::reg(t).lane(*lane)],
            );
        }
    }

    fn lower_call(&mut self, id: NodeId, func: Builtin, args: &[NodeId]) -> Result<(), CompileError> {
        let t = self.temp(id)?;
        let mut srcs = args
            .iter()
            .map(|arg| self.operand(*arg))
            .collect::<Result<Vec<_>, _>>()?;
        let arity = match func {
            Builtin::Dp3 => 2,
            Builtin::Rsq | Builtin::Lit => 1,
        };
        if srcs.len() != arity {
            return Err(CompileError::Internal(format!(
                "'{}' lowered with {} argument(s)",
                func.name(),
                srcs.len()
            )));
        }

        match func {
            Builtin::Dp3 => self.emit(Opcode::Dp3, Dst::reg(t), srcs),
            Builtin::Rsq => {
                let a = srcs.remove(0).scalar();
                self.emit(Opcode::Rsq, Dst::reg(t), vec![a]);
            }
            Builtin::Lit => self.emit(Opcode::Lit, Dst::reg(t), srcs),
        }
        Ok(())
    }

    fn lower_constructor(
        &mut self,
        id: NodeId,
        ty: NodeId,
        args: &[NodeId],
    ) -> Result<(), CompileError> {
        let t = self.temp(id)?;
        if args.is_empty() {
            return Err(CompileError::Internal(
                "constructor lowered without arguments".to_string(),
            ));
        }

        let literals = args
            .iter()
            .map(|arg| literal_scalar(self.tree.kind(self.argument_expr(*arg))))
            .collect::<Option<Vec<_>>>();
        if let Some(values) = literals {
            self.emit(Opcode::Mov, Dst::reg(t), vec![Operand::inline(pack(&values))]);
            return Ok(());
        }

        if self.tree.ty(ty).dimension() <= 1 {
            let src = self.constructor_arg(args[0])?;
            self.emit(Opcode::Mov, Dst::reg(t), vec![src]);
            return Ok(());
        }
        for (lane, arg) in Component::ALL.iter().zip(args) {
            let src = self.constructor_arg(*arg)?;
            self.emit(Opcode::Mov, Dst::lane(t.as_str(), *lane), vec![src]);
        }
        Ok(())
    }

    fn constructor_arg(&self, arg: NodeId) -> Result<Operand, CompileError> {
        let expr = self.argument_expr(arg);
        match literal_scalar(self.tree.kind(expr)) {
            Some(value) => Ok(Operand::inline(value.splat())),
            None => self.operand(expr),
        }
    }

    fn argument_expr(&self, arg: NodeId) -> NodeId {
        match self.tree.kind(arg) {
            NodeKind::Argument(expr) => *expr,
            _ => arg,
        }
    }

    fn lower_predicate(&mut self, if_node: NodeId, condition: NodeId) -> Result<(), CompileError> {
        let p = self.temp(if_node)?;
        let c = self.operand(condition)?;

        let Some((parent, arm)) = self.tree.enclosing_if(if_node) else {
            self.emit(Opcode::Mov, Dst::reg(p), vec![c]);
            return Ok(());
        };

        let chain = self.arm_predicate(parent, arm)?;
        self.emit(Opcode::Max, Dst::reg(p), vec![chain.clone(), c.clone()]);
        if let Some(e) = self.alloc.else_predicate(if_node) {
            let e = e.to_string();
            self.emit(
                Opcode::Cmp,
                Dst::reg(e.as_str()),
                vec![c, Operand::reg(FALSE), Operand::reg(TRUE)],
            );
            self.emit(
                Opcode::Max,
                Dst::reg(e.as_str()),
                vec![chain, Operand::reg(e.as_str())],
            );
        }
        Ok(())
    }

    /// Predicate that is true exactly where `arm` of `if_node` runs.
    fn arm_predicate(&mut self, if_node: NodeId, arm: Arm) -> Result<Operand, CompileError> {
        match arm {
            Arm::Then => Ok(Operand::reg(self.temp(if_node)?)),
            Arm::Else => {
                if let Some(e) = self.alloc.else_predicate(if_node) {
                    return Ok(Operand::reg(e));
                }
                let p = self.temp(if_node)?;
                self.emit(
                    Opcode::Cmp,
                    Dst::reg(SCRATCH),
                    vec![Operand::reg(p), Operand::reg(FALSE), Operand::reg(TRUE)],
                );
                Ok(Operand::reg(SCRATCH))
            }
            Arm::Condition => Err(CompileError::Internal(
                "an if statement cannot sit inside a condition".to_string(),
            )),
        }
    }

    fn lower_assignment(
        &mut self,
        id: NodeId,
        target: NodeId,
        value: NodeId,
    ) -> Result<(), CompileError> {
        let register = self.variable(target)?;
        let lane = self
            .tree
            .index_of(target)
            .and_then(Component::from_index);
        let (dst, old) = match lane {
            Some(lane) => (
                Dst::lane(register.as_str(), lane),
                Operand::reg(register.as_str()).lane(lane),
            ),
            None => (Dst::reg(register.as_str()), Operand::reg(register.as_str())),
        };
        let v = self.operand(value)?;

        match self.tree.enclosing_if(id) {
            None => self.emit(Opcode::Mov, dst, vec![v]),
            Some((if_node, Arm::Then)) => {
                let p = self.temp(if_node)?;
                self.emit(Opcode::Cmp, dst, vec![Operand::reg(p), v, old]);
            }
            Some((if_node, Arm::Else)) => match self.alloc.else_predicate(if_node).map(ToString::to_string) {
                Some(e) => self.emit(Opcode::Cmp, dst, vec![Operand::reg(e), v, old]),
                None => {
                    let p = self.temp(if_node)?;
                    self.emit(Opcode::Cmp, dst, vec![Operand::reg(p), old, v]);
                }
            },
            Some((_, Arm::Condition)) => {
                return Err(CompileError::Internal(
                    "an assignment cannot sit inside a condition".to_string(),
                ))
            }
        }
        Ok(())
    }

    /// The register or lane an expression node evaluates to.
    fn operand(&self, id: NodeId) -> Result<Operand, CompileError> {
        let kind = self.tree.kind(id);
        match kind {
            NodeKind::Argument(expr) => self.operand(*expr),
            NodeKind::Variable { .. } => {
                let operand = Operand::reg(self.variable(id)?);
                Ok(match self.tree.index_of(id).and_then(Component::from_index) {
                    Some(lane) => operand.lane(lane),
                    None => operand,
                })
            }
            _ if kind.is_literal() => self
                .alloc
                .constant(id)
                .map(Operand::reg)
                .ok_or_else(|| missing("constant", id)),
            _ if kind.is_compound() => Ok(Operand::reg(self.temp(id)?)),
            _ => Err(CompileError::Internal(format!(
                "node {} is not a value",
                id.index()
            ))),
        }
    }

    fn temp(&self, id: NodeId) -> Result<String, CompileError> {
        self.alloc
            .temp(id)
            .map(ToString::to_string)
            .ok_or_else(|| missing("temporary", id))
    }

    fn variable(&self, id: NodeId) -> Result<String, CompileError> {
        self.alloc
            .variable(id)
            .map(ToString::to_string)
            .ok_or_else(|| missing("register", id))
    }
}

impl Visitor for Lowering<'_> {
    fn pre(&mut self, tree: &Tree, id: NodeId) {
        if !self.annotate || self.error.is_some() {
            return;
        }
        match tree.kind(id) {
            NodeKind::Declaration { init: Some(_), .. }
            | NodeKind::Assignment { .. }
            | NodeKind::If { .. } => self.annotate(id),
            _ => {}
        }
    }

    fn post(&mut self, _tree: &Tree, id: NodeId) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.lower(id) {
            self.error = Some(err);
        }
    }
}

fn missing(what: &str, id: NodeId) -> CompileError {
    CompileError::Internal(format!("no {} allocated for node {}", what, id.index()))
}

/// One value fills every lane; several fill lanes in order and the rest are zero.
fn pack(values: &[Literal]) -> [Literal; 4] {
    if let [value] = values {
        return value.splat();
    }
    let zero = match values.last() {
        Some(Literal::Float(_)) => Literal::Float(0.0),
        _ => Literal::Int(0),
    };
    let mut out = [zero; 4];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = *value;
    }
    out
}
