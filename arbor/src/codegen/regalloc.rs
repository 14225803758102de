//! Register allocation
//!
//! A single pass over the checked tree, run before any instruction is emitted.
//! It names a temporary for every compound expression and `if` predicate, a
//! constant parameter for every literal that cannot be written inline, and a
//! register for every declared variable. The result is read-only afterwards.

use std::collections::{HashMap, HashSet};

use glint::ast::{NodeId, NodeKind, ScopeId, Tree, Visitor};
use glint::symbols::{ScopeStack, SymbolTables};
use glint::Program;

use crate::ir::Literal;
use crate::CompileError;

/// ARB register bound to each pipeline variable.
pub fn pipeline_register(name: &str) -> Option<&'static str> {
    let register = match name {
        "gl_FragColor" => "result.color",
        "gl_FragDepth" => "result.depth",
        "gl_FragCoord" => "fragment.position",
        "gl_TexCoord" => "fragment.texcoord",
        "gl_Color" => "fragment.color",
        "gl_Secondary" => "fragment.color.secondary",
        "gl_FogFragCoord" => "fragment.fogcoord",
        "gl_Light_Half" => "state.light[0].half",
        "gl_Light_Ambient" => "state.lightmodel.ambient",
        "gl_Material_Shininess" => "state.material.shininess",
        "env1" => "program.env[1]",
        "env2" => "program.env[2]",
        "env3" => "program.env[3]",
        _ => return None,
    };
    Some(register)
}

/// Words the program text gives a meaning of its own.
const TARGET_KEYWORDS: &[&str] = &[
    "ABS", "ADD", "ALIAS", "ATTRIB", "CMP", "COS", "DP3", "DP4", "DPH", "DST", "END", "EX2",
    "FALSE", "FLR", "FRC", "KIL", "LG2", "LIT", "LRP", "MAD", "MAX", "MIN", "MOV", "MUL", "ONE",
    "OPTION", "OUTPUT", "PARAM", "POW", "RCP", "RSQ", "SCS", "SGE", "SIN", "SLT", "SUB", "SWZ",
    "TEMP", "TEX", "TRUE", "TXB", "TXP", "XPD", "fragment", "program", "result", "state",
    "texture",
];

/// Mnemonics also take a `_SAT` suffix.
fn is_target_keyword(name: &str) -> bool {
    let base = name.strip_suffix("_SAT").unwrap_or(name);
    TARGET_KEYWORDS.contains(&base)
}

/// Registers chosen for one compilation.
#[derive(Debug, Default)]
pub struct Allocation {
    temps: HashMap<NodeId, String>,
    else_predicates: HashMap<NodeId, String>,
    constants: HashMap<NodeId, String>,
    variables: HashMap<NodeId, String>,
    variable_registers: Vec<String>,
    temp_registers: Vec<String>,
    constant_params: Vec<(String, [Literal; 4])>,
}

impl Allocation {
    /// Allocate registers for a checked program.
    pub fn build(program: &Program) -> Result<Self, CompileError> {
        let mut allocator = Allocator {
            symbols: &program.symbols,
            scopes: ScopeStack::new(),
            registers: HashMap::new(),
            used_names: HashSet::new(),
            allocation: Allocation::default(),
            error: None,
        };
        program.tree.walk(program.root, &mut allocator);

        if let Some(err) = allocator.error {
            return Err(err);
        }
        let allocation = allocator.allocation;
        tracing::debug!(
            variables = allocation.variable_registers.len(),
            temps = allocation.temp_registers.len(),
            constants = allocation.constant_params.len(),
            "allocated registers"
        );
        Ok(allocation)
    }

    /// Temporary of a compound expression, or the predicate of an `if`.
    pub fn temp(&self, id: NodeId) -> Option<&str> {
        self.temps.get(&id).map(String::as_str)
    }

    /// Else-arm predicate of a nested `if` with an `else` branch.
    pub fn else_predicate(&self, id: NodeId) -> Option<&str> {
        self.else_predicates.get(&id).map(String::as_str)
    }

    /// Constant parameter holding a literal.
    pub fn constant(&self, id: NodeId) -> Option<&str> {
        self.constants.get(&id).map(String::as_str)
    }

    /// Register read or written by a variable node, or declared by a declaration.
    pub fn variable(&self, id: NodeId) -> Option<&str> {
        self.variables.get(&id).map(String::as_str)
    }

    /// Registers of declared variables in declaration order.
    pub fn variable_registers(&self) -> &[String] {
        &self.variable_registers
    }

    /// Generated temporaries in allocation order.
    pub fn temp_registers(&self) -> &[String] {
        &self.temp_registers
    }

    /// Constant parameters and their values in allocation order.
    pub fn constant_params(&self) -> &[(String, [Literal; 4])] {
        &self.constant_params
    }

    fn new_temp(&mut self) -> String {
        let temp = format!("__t{}", self.temp_registers.len());
        self.temp_registers.push(temp.clone());
        temp
    }

    fn new_constant(&mut self, value: [Literal; 4]) -> String {
        let name = format!("__c{}", self.constant_params.len());
        self.constant_params.push((name.clone(), value));
        name
    }
}

struct Allocator<'a> {
    symbols: &'a SymbolTables,
    scopes: ScopeStack,
    registers: HashMap<(ScopeId, String), String>,
    used_names: HashSet<String>,
    allocation: Allocation,
    error: Option<CompileError>,
}

impl Visitor for Allocator<'_> {
    fn pre(&mut self, tree: &Tree, id: NodeId) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.allocate(tree, id) {
            self.error = Some(err);
        }
    }

    fn post(&mut self, tree: &Tree, id: NodeId) {
        match tree.kind(id) {
            NodeKind::Scope { .. } => self.scopes.pop(),
            NodeKind::Declaration { .. } => {
                if let Some(name) = tree.name(id) {
                    self.scopes.declare(name);
                }
            }
            _ => {}
        }
    }
}

impl Allocator<'_> {
    fn allocate(&mut self, tree: &Tree, id: NodeId) -> Result<(), CompileError> {
        match tree.kind(id) {
            NodeKind::Scope { id: scope, .. } => self.scopes.push(*scope),
            NodeKind::Declaration { .. } => {
                let register = self.declare(tree, id);
                self.allocation.variables.insert(id, register);
            }
            NodeKind::If { else_branch, .. } => {
                let predicate = self.allocation.new_temp();
                self.allocation.temps.insert(id, predicate);
                if else_branch.is_some() && tree.enclosing_if(id).is_some() {
                    let predicate = self.allocation.new_temp();
                    self.allocation.else_predicates.insert(id, predicate);
                }
            }
            NodeKind::Variable { .. } => {
                let register = self.resolve(tree, id)?;
                self.allocation.variables.insert(id, register);
            }
            kind if kind.is_compound() => {
                let temp = self.allocation.new_temp();
                self.allocation.temps.insert(id, temp);
            }
            kind if kind.is_literal() => {
                if needs_constant(tree, id) {
                    let name = self.allocation.new_constant(literal_value(kind));
                    self.allocation.constants.insert(id, name);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// The first declaration of a name keeps it; later ones, and names the program
    /// text reserves, get the scope id appended. A redeclaration in the same scope
    /// shares the first one's register.
    fn declare(&mut self, tree: &Tree, decl: NodeId) -> String {
        let scope = self.scopes.innermost();
        let name = tree.name(decl).unwrap_or_default();
        let key = (scope, name.to_string());
        if let Some(register) = self.registers.get(&key) {
            return register.clone();
        }

        let register = if self.used_names.contains(name) || is_target_keyword(name) {
            format!("{}__{}", name, scope)
        } else {
            name.to_string()
        };
        self.used_names.insert(name.to_string());
        self.allocation.variable_registers.push(register.clone());
        self.registers.insert(key, register.clone());
        register
    }

    fn resolve(&self, tree: &Tree, id: NodeId) -> Result<String, CompileError> {
        let name = tree.name(id).unwrap_or_default();
        let unresolved = || {
            let loc = tree.loc(id);
            CompileError::UnresolvedVariable {
                name: name.to_string(),
                line: loc.line,
                column: loc.column,
            }
        };

        let (scope, binding) = self
            .scopes
            .lookup(self.symbols, name)
            .ok_or_else(unresolved)?;
        if binding.is_unresolved() {
            return Err(unresolved());
        }

        if scope == ScopeId::GLOBAL {
            return pipeline_register(name)
                .map(ToString::to_string)
                .ok_or_else(unresolved);
        }
        self.registers
            .get(&(scope, name.to_string()))
            .cloned()
            .ok_or_else(|| CompileError::Internal(format!("no register for variable '{}'", name)))
    }
}

/// Literals are written inline as constructor arguments and are not registers
/// when they index a variable.
fn needs_constant(tree: &Tree, id: NodeId) -> bool {
    let Some(parent) = tree.parent(id) else {
        return true;
    };
    match tree.kind(parent) {
        NodeKind::Variable { .. } => false,
        NodeKind::Argument(_) => !matches!(
            tree.parent(parent).map(|grandparent| tree.kind(grandparent)),
            Some(NodeKind::Constructor { .. })
        ),
        _ => true,
    }
}

/// The four-lane value of a literal node.
pub fn literal_value(kind: &NodeKind) -> [Literal; 4] {
    literal_scalar(kind).unwrap_or(Literal::Int(0)).splat()
}

/// The scalar value of a literal node.
pub fn literal_scalar(kind: &NodeKind) -> Option<Literal> {
    match kind {
        NodeKind::IntLiteral(value) => Some(Literal::Int(*value)),
        NodeKind::FloatLiteral(value) => Some(Literal::Float(*value)),
        NodeKind::BoolLiteral(value) => Some(Literal::bool(*value)),
        _ => None,
    }
}
