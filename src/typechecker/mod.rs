pub mod rules;
pub mod types;

use std::fmt;

use crate::ast::{NodeId, NodeKind, Tree, UnaryOp, Visitor};
use crate::context::Program;
use crate::symbols::{is_pipeline_variable, Access, ScopeStack, SymbolTables};
use rules::{binary_type, constructor_type, function_return_type, unary_type, Typing};
use types::Type;

/// One semantic violation, located at the node that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Semantic Error (line {}, column {}): {}",
            self.line, self.column, self.message
        )
    }
}

/// Outcome of one checking pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Verdict {
    /// Empty when the checker runs quiet.
    pub diagnostics: Vec<Diagnostic>,
    pub failed: bool,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        !self.failed
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TypeChecker {
    report: bool,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeChecker {
    pub fn new() -> Self {
        Self { report: true }
    }

    /// Annotate types without collecting diagnostics.
    pub fn quiet() -> Self {
        Self { report: false }
    }

    /// Type every node of `program` and validate it. Never stops early: every
    /// reachable node is typed, `unknown` where no type can be given.
    pub fn check_program(&self, program: &mut Program) -> Verdict {
        let mut pass = Pass {
            symbols: &mut program.symbols,
            scopes: ScopeStack::new(),
            report: self.report,
            diagnostics: Vec::new(),
            failed: false,
        };
        program.tree.walk(program.root, &mut pass);

        let verdict = Verdict {
            diagnostics: pass.diagnostics,
            failed: pass.failed,
        };
        tracing::debug!(
            diagnostics = verdict.diagnostics.len(),
            passed = verdict.passed(),
            "checked program"
        );
        verdict
    }
}

struct Pass<'a> {
    symbols: &'a mut SymbolTables,
    scopes: ScopeStack,
    report: bool,
    diagnostics: Vec<Diagnostic>,
    failed: bool,
}

impl Visitor for Pass<'_> {
    fn pre(&mut self, tree: &Tree, id: NodeId) {
        if let NodeKind::Scope { id: scope, .. } = tree.kind(id) {
            self.scopes.push(*scope);
        }
    }

    fn post(&mut self, tree: &Tree, id: NodeId) {
        match tree.kind(id) {
            NodeKind::Scope { .. } => {
                self.scopes.pop();
            }
            NodeKind::Declaration { .. } => self.check_declaration(tree, id),
            NodeKind::Assignment { target, value } => {
                self.check_assignment(tree, id, *target, *value)
            }
            NodeKind::If { condition, .. } => {
                let ty = tree.ty(*condition);
                if ty.is_unknown() {
                    self.failed = true;
                } else if ty != Type::Bool {
                    self.report(
                        tree,
                        *condition,
                        format!("if condition must be bool, found {}", ty),
                    );
                }
            }
            NodeKind::Variable { ident, index } => {
                self.check_variable(tree, id, *ident, index.is_some())
            }
            NodeKind::Unary { op, operand } => {
                let typing = unary_type(*op, tree.ty(*operand));
                self.apply(tree, id, typing);
            }
            NodeKind::Binary { op, lhs, rhs } => {
                let typing = binary_type(*op, tree.ty(*lhs), tree.ty(*rhs));
                self.apply(tree, id, typing);
            }
            NodeKind::FunctionCall { func, args } => {
                let args = arg_types(tree, args);
                let typing = function_return_type(*func, &args);
                self.apply(tree, id, typing);
            }
            NodeKind::Constructor { ty, args } => {
                let args = arg_types(tree, args);
                let typing = constructor_type(tree.ty(*ty), &args);
                self.apply(tree, id, typing);
            }
            NodeKind::Argument(expr) => tree.set_ty(id, tree.ty(*expr)),
            _ => {}
        }
    }
}

impl Pass<'_> {
    fn report(&mut self, tree: &Tree, id: NodeId, message: String) {
        self.failed = true;
        if self.report {
            let loc = tree.loc(id);
            self.diagnostics
                .push(Diagnostic::new(loc.line, loc.column, message));
        }
    }

    fn apply(&mut self, tree: &Tree, id: NodeId, typing: Typing) {
        tree.set_ty(id, typing.ty);
        for violation in typing.violations {
            self.report(tree, id, violation);
        }
    }

    fn check_declaration(&mut self, tree: &Tree, id: NodeId) {
        let NodeKind::Declaration {
            constant,
            ty,
            ident,
            init,
            redeclared,
        } = *tree.kind(id)
        else {
            return;
        };
        let declared = tree.ty(ty);
        tree.set_ty(ident, declared);
        tree.set_ty(id, declared);
        let name = tree.name(ident).unwrap_or_default();

        if redeclared {
            self.report(
                tree,
                ident,
                format!("'{}' is already declared in this scope", name),
            );
        } else if is_pipeline_variable(name) {
            self.report(
                tree,
                ident,
                format!("cannot redeclare pipeline variable '{}'", name),
            );
        } else if is_reserved(name) {
            self.report(tree, ident, format!("identifier '{}' is reserved", name));
        }

        match init {
            Some(init) => {
                let init_ty = tree.ty(init);
                if !init_ty.is_unknown() && init_ty != declared {
                    self.report(
                        tree,
                        init,
                        format!(
                            "cannot initialize '{}' of type {} with a value of type {}",
                            name, declared, init_ty
                        ),
                    );
                }
                if constant && !self.is_constant_expression(tree, init) {
                    self.report(
                        tree,
                        init,
                        format!("const '{}' must be initialized with a constant expression", name),
                    );
                }
            }
            None if constant => {
                self.report(tree, id, format!("const '{}' requires an initializer", name));
            }
            None => {}
        }
        // Visible to later siblings only, not to its own initializer.
        self.scopes.declare(name);
    }

    fn check_assignment(&mut self, tree: &Tree, id: NodeId, target: NodeId, value: NodeId) {
        let target_ty = tree.ty(target);
        let value_ty = tree.ty(value);
        let name = tree.name(target).unwrap_or_default();

        if let Some((_, binding)) = self.scopes.lookup(self.symbols, name) {
            if binding.constant {
                self.report(tree, target, format!("cannot assign to constant '{}'", name));
            } else if binding.access == Access::ReadOnly {
                self.report(
                    tree,
                    target,
                    format!("cannot assign to read-only variable '{}'", name),
                );
            } else if binding.access == Access::WriteOnly && tree.enclosing_if(id).is_some() {
                self.report(
                    tree,
                    target,
                    format!(
                        "cannot assign to write-only variable '{}' inside an if statement",
                        name
                    ),
                );
            }
        }

        if !target_ty.is_unknown() && !value_ty.is_unknown() && target_ty != value_ty {
            self.report(
                tree,
                value,
                format!(
                    "cannot assign a value of type {} to '{}' of type {}",
                    value_ty, name, target_ty
                ),
            );
        }
        tree.set_ty(id, target_ty);
    }

    fn check_variable(&mut self, tree: &Tree, id: NodeId, ident: NodeId, indexed: bool) {
        let name = tree.name(ident).unwrap_or_default();
        let binding = self.scopes.resolve(self.symbols, name);
        tree.set_ty(ident, binding.ty);

        if binding.access == Access::WriteOnly && !tree.is_assignment_target(id) {
            self.report(
                tree,
                id,
                format!("cannot read from write-only variable '{}'", name),
            );
        }

        let ty = if indexed {
            self.index_type(tree, id, name, binding.ty)
        } else {
            binding.ty
        };
        tree.set_ty(id, ty);
    }

    fn index_type(&mut self, tree: &Tree, id: NodeId, name: &str, ty: Type) -> Type {
        if ty.is_unknown() {
            return Type::Unknown;
        }
        if !ty.is_vector() {
            self.report(
                tree,
                id,
                format!("cannot index '{}' of non-vector type {}", name, ty),
            );
            return Type::Unknown;
        }

        match tree.index_of(id) {
            Some(index) if index >= 0 && (index as usize) < ty.dimension() => ty.base(),
            Some(index) => {
                self.report(
                    tree,
                    id,
                    format!("index {} is out of range for '{}' of type {}", index, name, ty),
                );
                Type::Unknown
            }
            None => Type::Unknown,
        }
    }

    /// Literals, constructors of constants, and names bound as constants.
    fn is_constant_expression(&self, tree: &Tree, id: NodeId) -> bool {
        match tree.kind(id) {
            kind if kind.is_literal() => true,
            NodeKind::Unary {
                op: UnaryOp::Negate,
                operand,
            } => self.is_constant_expression(tree, *operand),
            NodeKind::Constructor { args, .. } => args
                .iter()
                .all(|arg| self.is_constant_expression(tree, *arg)),
            NodeKind::Argument(expr) => self.is_constant_expression(tree, *expr),
            NodeKind::Variable { .. } => tree
                .name(id)
                .and_then(|name| self.scopes.lookup(self.symbols, name))
                .is_some_and(|(_, binding)| binding.constant),
            _ => false,
        }
    }
}

fn arg_types(tree: &Tree, args: &[NodeId]) -> Vec<Type> {
    args.iter().map(|arg| tree.ty(*arg)).collect()
}

/// Identifiers the pipeline and the code generator keep for themselves.
pub fn is_reserved(name: &str) -> bool {
    name.starts_with("gl_") || name.contains("__")
}
